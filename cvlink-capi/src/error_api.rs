//! Error normalization and last-error entry points.
//!
//! `cv_error_from_opencv_code` and `cv_error_string` are pure lookups;
//! the `*_last_error_message` trio reads and writes the calling thread's
//! slot in the last-error store.

use std::ffi::CStr;

use c_str_macro::c_str;
use libc::{c_char, c_int};

use cvlink::error::ErrorKind;
use cvlink::last_error;

/// Normalize an OpenCV error code to its ABI error value.
///
/// Total: unrecognized codes come back as the "unknown" value, never a
/// failure.
#[no_mangle]
pub extern "C" fn cv_error_from_opencv_code(opencv_code: c_int) -> c_int {
    ErrorKind::from_code(opencv_code).as_abi()
}

/// Static description for an ABI error value.
#[no_mangle]
pub extern "C" fn cv_error_string(err: c_int) -> *const c_char {
    match ErrorKind::from_abi(err) {
        Some(kind) => kind.describe_c(),
        None => c_str!("Unknown error code").as_ptr(),
    }
}

/// Detailed message of the last fault observed by the calling thread.
///
/// Empty string if no fault occurred or after
/// [`cv_clear_last_error_message`].
#[no_mangle]
pub extern "C" fn cv_get_last_error_message() -> *const c_char {
    last_error::last_error_ptr()
}

/// Clear the calling thread's last-error message.
#[no_mangle]
pub extern "C" fn cv_clear_last_error_message() {
    last_error::clear_last_error();
}

/// Overwrite the calling thread's last-error message; NULL clears it.
#[no_mangle]
pub extern "C" fn cv_set_last_error_message(msg: *const c_char) {
    if msg.is_null() {
        last_error::clear_last_error();
        return;
    }
    let msg = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
    last_error::set_last_error(Some(&msg));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn text(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn code_normalization_round_trips_through_abi() {
        assert_eq!(cv_error_from_opencv_code(0), 0);
        assert_eq!(cv_error_from_opencv_code(-211), ErrorKind::BadRange.as_abi());
        assert_eq!(cv_error_from_opencv_code(-28), ErrorKind::AssertFailed.as_abi());
        assert_eq!(cv_error_from_opencv_code(999_999), ErrorKind::Unknown.as_abi());
    }

    #[test]
    fn error_strings_cover_every_kind() {
        for kind in ErrorKind::ALL {
            let rendered = text(cv_error_string(kind.as_abi()));
            assert_eq!(rendered, kind.describe());
            assert_ne!(rendered, "Unknown error code");
        }
        assert_eq!(text(cv_error_string(12345)), "Unknown error code");
    }

    #[test]
    fn last_error_round_trip() {
        cv_clear_last_error_message();
        assert_eq!(text(cv_get_last_error_message()), "");

        let msg = CString::new("forward pass failed").unwrap();
        cv_set_last_error_message(msg.as_ptr());
        assert_eq!(text(cv_get_last_error_message()), "forward pass failed");

        cv_set_last_error_message(std::ptr::null());
        assert_eq!(text(cv_get_last_error_message()), "");

        cv_clear_last_error_message();
        cv_clear_last_error_message();
        assert_eq!(text(cv_get_last_error_message()), "");
    }
}
