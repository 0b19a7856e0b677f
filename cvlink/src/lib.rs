//! # OpenCV ABI Bridge Primitives
//!
//! This library provides the machinery needed to expose OpenCV operations
//! across a C ABI: a total normalization table from OpenCV error codes to a
//! closed error enumeration, a per-context last-error store, and
//! generation-checked handles for heap objects shared with a foreign caller.
//!
//! None of the modules depend on OpenCV itself, so the translation layer can
//! be tested without a native library installation.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use cvlink::prelude::v1::*;
//! ```

pub mod error;
pub mod handle;
pub mod last_error;

pub mod prelude {
    pub mod v1 {
        pub use crate::error::{ErrorKind, Fault, Result};
        pub use crate::handle::{Handle, HandleStore};
        pub use crate::last_error::{
            clear_last_error, get_last_error, last_error_ptr, set_last_error,
        };
    }
}
