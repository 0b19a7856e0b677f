//! Background subtraction (contrib `bgsegm` module).

use opencv::bgsegm;
use opencv::core::Ptr;
use opencv::prelude::*;

use cvlink::prelude::v1::*;

use crate::core_api::MATS;
use crate::CvStatus;

type SubtractorCnt = Ptr<dyn bgsegm::BackgroundSubtractorCNT>;

pub(crate) static SUBTRACTORS: HandleStore<SubtractorCnt> = HandleStore::new();

/// Create a counting-based background subtractor with OpenCV's defaults.
#[no_mangle]
pub extern "C" fn BackgroundSubtractorCNT_Create() -> u64 {
    crate::create(|| {
        bgsegm::create_background_subtractor_cnt(15, true, 15 * 60, true)
            .map(|subtractor| SUBTRACTORS.insert(subtractor))
            .map_err(crate::cv_fault)
    })
}

/// Close a background subtractor handle.
#[no_mangle]
pub extern "C" fn BackgroundSubtractorCNT_Close(subtractor: u64) {
    if let Some(handle) = Handle::from_raw(subtractor) {
        SUBTRACTORS.remove(handle);
    }
}

/// Feed `src` into the background model and write the foreground mask into
/// `dst`.
#[no_mangle]
pub extern "C" fn BackgroundSubtractorCNT_Apply(subtractor: u64, src: u64, dst: u64) -> CvStatus {
    crate::invoke(|| {
        let subtractor = crate::resolve(&SUBTRACTORS, subtractor)?;
        let src = crate::resolve(&MATS, src)?;
        let dst = crate::resolve(&MATS, dst)?;
        crate::distinct(&[&src, &dst])?;

        let mut subtractor = crate::lock(&subtractor);
        let src = crate::lock(&src);
        let mut dst = crate::lock(&dst);
        subtractor
            .apply(&*src, &mut *dst, -1.0)
            .map_err(crate::cv_fault)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_api::{Mat_Close, Mat_Empty, Mat_NewWithSize};

    #[test]
    fn subtractor_lifecycle_and_apply() {
        let subtractor = BackgroundSubtractorCNT_Create();
        assert_ne!(subtractor, 0);

        let src = Mat_NewWithSize(16, 16, opencv::core::CV_8UC1);
        let dst = Mat_NewWithSize(0, 0, opencv::core::CV_8UC1);

        let status = BackgroundSubtractorCNT_Apply(subtractor, src, dst);
        assert_eq!(status.code, 0);
        assert!(!Mat_Empty(dst));

        Mat_Close(src);
        Mat_Close(dst);
        BackgroundSubtractorCNT_Close(subtractor);
        BackgroundSubtractorCNT_Close(subtractor);
    }

    #[test]
    fn apply_with_closed_subtractor_faults() {
        let subtractor = BackgroundSubtractorCNT_Create();
        BackgroundSubtractorCNT_Close(subtractor);

        let src = Mat_NewWithSize(8, 8, opencv::core::CV_8UC1);
        let dst = Mat_NewWithSize(0, 0, opencv::core::CV_8UC1);
        let status = BackgroundSubtractorCNT_Apply(subtractor, src, dst);
        assert_ne!(status.code, 0);

        Mat_Close(src);
        Mat_Close(dst);
        cvlink::last_error::clear_last_error();
    }

    #[test]
    fn aliased_src_and_dst_are_rejected() {
        let subtractor = BackgroundSubtractorCNT_Create();
        let src = Mat_NewWithSize(8, 8, opencv::core::CV_8UC1);

        let status = BackgroundSubtractorCNT_Apply(subtractor, src, src);
        assert_ne!(status.code, 0);

        Mat_Close(src);
        BackgroundSubtractorCNT_Close(subtractor);
        cvlink::last_error::clear_last_error();
    }
}
