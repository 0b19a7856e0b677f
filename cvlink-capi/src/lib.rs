//! # C ABI surface over OpenCV
//!
//! Every exported function is one of three shapes:
//!
//! * **factory**: builds an OpenCV object, returns a packed handle, `0` on
//!   fault with the detail recorded in the last-error store.
//! * **destructor**: closes a handle; stale or already-closed handles are
//!   ignored.
//! * **invoker**: runs one OpenCV operation against caller-supplied handles
//!   and returns a [`CvStatus`]. Outputs always go into handles the caller
//!   owns; nothing an invoker returns has to be freed.
//!
//! No fault crosses the boundary as an unwind: OpenCV errors and panics alike
//! are caught here and turned into status codes plus recorded messages.

#![allow(non_snake_case)]

use std::any::Any;
use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use c_str_macro::c_str;
use libc::c_char;
use log::*;

use cvlink::prelude::v1::*;

pub mod asyncarray;
pub mod bgsegm;
pub mod core_api;
#[cfg(feature = "cuda")]
pub mod cuda;
pub mod error_api;
pub mod svd;
pub mod ximgproc;

/// Status returned by invoker-shaped wrappers.
///
/// `code` is the raw OpenCV error code, `0` on success. `message` is empty on
/// success; on fault it borrows the calling thread's last-error slot and
/// stays valid until the next fault recorded on the same thread.
#[repr(C)]
pub struct CvStatus {
    pub code: i32,
    pub message: *const c_char,
}

fn ok_status() -> CvStatus {
    CvStatus {
        code: 0,
        message: c_str!("").as_ptr(),
    }
}

/// Record a fault in the last-error store and render it as a status.
fn record(fault: &Fault) -> CvStatus {
    error!("{}", fault);
    set_last_error(Some(&fault.message));
    CvStatus {
        code: fault.code,
        message: last_error_ptr(),
    }
}

fn panic_fault(panic: Box<dyn Any + Send>) -> Fault {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic across the ABI boundary".to_owned());
    Fault::new(ErrorKind::Internal, message)
}

/// Run an invoker body, catching every fault.
fn invoke(body: impl FnOnce() -> Result<()>) -> CvStatus {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => ok_status(),
        Ok(Err(fault)) => record(&fault),
        Err(panic) => record(&panic_fault(panic)),
    }
}

/// Run a factory body, catching every fault; `0` signals failure.
fn create<T>(body: impl FnOnce() -> Result<Handle<T>>) -> u64 {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(handle)) => handle.raw(),
        Ok(Err(fault)) => {
            record(&fault);
            0
        }
        Err(panic) => {
            record(&panic_fault(panic));
            0
        }
    }
}

/// Translate an `opencv` crate error into a [`Fault`].
fn cv_fault(err: opencv::Error) -> Fault {
    Fault::from_code(err.code, err.message)
}

/// Resolve a raw handle against `store`, faulting on null or stale values.
fn resolve<T>(store: &HandleStore<T>, raw: u64) -> Result<Arc<Mutex<T>>> {
    Handle::from_raw(raw)
        .and_then(|handle| store.resolve(handle))
        .ok_or_else(|| {
            Fault::new(
                ErrorKind::BadArgument,
                format!("invalid or closed handle {:#x}", raw),
            )
        })
}

fn lock<T>(obj: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    obj.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reject one object passed for two distinct in/out parameters.
///
/// The wrapped objects sit behind a mutex each, so aliased parameters would
/// self-deadlock instead of aliasing memory the way raw pointers did.
fn distinct<T>(objects: &[&Arc<Mutex<T>>]) -> Result<()> {
    for (i, a) in objects.iter().enumerate() {
        for b in &objects[i + 1..] {
            if Arc::ptr_eq(a, b) {
                return Err(Fault::new(
                    ErrorKind::BadArgument,
                    "the same handle was passed for two parameters",
                ));
            }
        }
    }
    Ok(())
}

/// Read a required C string argument.
fn required_str(ptr: *const c_char, what: &str) -> Result<String> {
    if ptr.is_null() {
        return Err(Fault::new(
            ErrorKind::NullPointer,
            format!("{} is NULL", what),
        ));
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Read an optional C string argument, NULL mapping to empty.
fn optional_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn ok_status_is_empty() {
        let status = ok_status();
        assert_eq!(status.code, 0);
        assert_eq!(unsafe { CStr::from_ptr(status.message) }.to_bytes(), b"");
    }

    #[test]
    fn record_reports_raw_code_and_message() {
        let status = record(&Fault::from_code(-211, "value out of range"));
        assert_eq!(status.code, -211);
        assert_eq!(
            unsafe { CStr::from_ptr(status.message) }.to_bytes(),
            b"value out of range"
        );
        assert_eq!(get_last_error(), "value out of range");
        clear_last_error();
    }

    #[test]
    fn invoke_catches_faults_and_panics() {
        let status = invoke(|| Err(Fault::new(ErrorKind::BadSize, "empty input")));
        assert_eq!(status.code, ErrorKind::BadSize.as_abi());

        let status = invoke(|| panic!("unexpected"));
        assert_eq!(status.code, ErrorKind::Internal.as_abi());
        assert_eq!(get_last_error(), "unexpected");
        clear_last_error();
    }

    #[test]
    fn failed_factory_returns_null_and_records() {
        clear_last_error();
        let raw = create::<()>(|| Err(Fault::new(ErrorKind::FileNotFound, "no model")));
        assert_eq!(raw, 0);
        assert_eq!(get_last_error(), "no model");
        clear_last_error();
    }

    #[test]
    fn resolve_rejects_null_and_unknown() {
        static STORE: HandleStore<i32> = HandleStore::new();
        assert!(resolve(&STORE, 0).is_err());
        assert!(resolve(&STORE, 0xbad).is_err());

        let handle = STORE.insert(3);
        let obj = resolve(&STORE, handle.raw()).unwrap();
        assert_eq!(*lock(&obj), 3);
        STORE.remove(handle);
        assert!(resolve(&STORE, handle.raw()).is_err());
    }

    #[test]
    fn distinct_flags_aliases() {
        let a = Arc::new(Mutex::new(1));
        let b = Arc::new(Mutex::new(2));
        assert!(distinct(&[&a, &b]).is_ok());
        assert!(distinct(&[&a, &b, &a]).is_err());
    }

    #[test]
    fn string_helpers() {
        let owned = CString::new("model.onnx").unwrap();
        assert_eq!(
            required_str(owned.as_ptr(), "model path").unwrap(),
            "model.onnx"
        );
        let fault = required_str(std::ptr::null(), "model path").unwrap_err();
        assert_eq!(fault.kind, ErrorKind::NullPointer);

        assert_eq!(optional_str(std::ptr::null()), "");
        assert_eq!(optional_str(owned.as_ptr()), "model.onnx");
    }
}
