//! Mat containers and library version.

use std::ffi::CString;
use std::sync::OnceLock;

use libc::{c_char, c_int};
use opencv::core::{Mat, Scalar};
use opencv::prelude::*;

use cvlink::prelude::v1::*;

/// Every Mat a caller holds lives here; the other modules resolve their
/// in/out arguments against this store.
pub(crate) static MATS: HandleStore<Mat> = HandleStore::new();

/// Create a new empty Mat.
#[no_mangle]
pub extern "C" fn Mat_New() -> u64 {
    crate::create(|| Ok(MATS.insert(Mat::default())))
}

/// Create a zero-initialized Mat with the given dimensions and element type.
#[no_mangle]
pub extern "C" fn Mat_NewWithSize(rows: c_int, cols: c_int, typ: c_int) -> u64 {
    crate::create(|| {
        let mat = Mat::new_rows_cols_with_default(rows, cols, typ, Scalar::all(0.0))
            .map_err(crate::cv_fault)?;
        Ok(MATS.insert(mat))
    })
}

/// Close a Mat handle.
#[no_mangle]
pub extern "C" fn Mat_Close(mat: u64) {
    if let Some(handle) = Handle::from_raw(mat) {
        MATS.remove(handle);
    }
}

#[no_mangle]
pub extern "C" fn Mat_Rows(mat: u64) -> c_int {
    match crate::resolve(&MATS, mat) {
        Ok(mat) => crate::lock(&mat).rows(),
        Err(fault) => {
            crate::record(&fault);
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn Mat_Cols(mat: u64) -> c_int {
    match crate::resolve(&MATS, mat) {
        Ok(mat) => crate::lock(&mat).cols(),
        Err(fault) => {
            crate::record(&fault);
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn Mat_Empty(mat: u64) -> bool {
    match crate::resolve(&MATS, mat) {
        Ok(mat) => crate::lock(&mat).empty().unwrap_or(true),
        Err(fault) => {
            crate::record(&fault);
            true
        }
    }
}

/// Version of the underlying OpenCV library, constant for the process
/// lifetime.
#[no_mangle]
pub extern "C" fn openCVVersion() -> *const c_char {
    static VERSION: OnceLock<CString> = OnceLock::new();
    VERSION
        .get_or_init(|| CString::new(opencv::core::CV_VERSION).unwrap_or_default())
        .as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn mat_lifecycle() {
        let mat = Mat_New();
        assert_ne!(mat, 0);
        assert!(Mat_Empty(mat));
        Mat_Close(mat);

        // Closed handles fault instead of dereferencing freed memory.
        cvlink::last_error::clear_last_error();
        assert_eq!(Mat_Rows(mat), 0);
        assert!(!cvlink::last_error::get_last_error().is_empty());
        cvlink::last_error::clear_last_error();
    }

    #[test]
    fn sized_mat_reports_dimensions() {
        let mat = Mat_NewWithSize(4, 6, opencv::core::CV_8UC1);
        assert_ne!(mat, 0);
        assert_eq!(Mat_Rows(mat), 4);
        assert_eq!(Mat_Cols(mat), 6);
        assert!(!Mat_Empty(mat));
        Mat_Close(mat);
    }

    #[test]
    fn double_close_is_harmless() {
        let mat = Mat_New();
        Mat_Close(mat);
        Mat_Close(mat);
        Mat_Close(0);
    }

    #[test]
    fn version_is_static_and_nonempty() {
        let first = openCVVersion();
        let second = openCVVersion();
        assert_eq!(first, second);
        assert!(!unsafe { CStr::from_ptr(first) }.to_bytes().is_empty());
    }
}
