//! Extended image processing (contrib `ximgproc` module).
//!
//! Straight invokers: each call runs one filter from `src` into the
//! caller-owned `dst`.

use libc::{c_float, c_int};
use opencv::ximgproc;

use crate::core_api::MATS;
use crate::CvStatus;

#[no_mangle]
pub extern "C" fn AnisotropicDiffusion(
    src: u64,
    dst: u64,
    alpha: c_float,
    k: c_float,
    niters: c_int,
) -> CvStatus {
    crate::invoke(|| {
        let src = crate::resolve(&MATS, src)?;
        let dst = crate::resolve(&MATS, dst)?;
        crate::distinct(&[&src, &dst])?;
        let src = crate::lock(&src);
        let mut dst = crate::lock(&dst);
        ximgproc::anisotropic_diffusion(&*src, &mut *dst, alpha, k, niters)
            .map_err(crate::cv_fault)
    })
}

#[no_mangle]
pub extern "C" fn EdgePreservingFilter(src: u64, dst: u64, d: c_int, threshold: c_float) -> CvStatus {
    crate::invoke(|| {
        let src = crate::resolve(&MATS, src)?;
        let dst = crate::resolve(&MATS, dst)?;
        crate::distinct(&[&src, &dst])?;
        let src = crate::lock(&src);
        let mut dst = crate::lock(&dst);
        ximgproc::edge_preserving_filter(&*src, &mut *dst, d, threshold).map_err(crate::cv_fault)
    })
}

#[no_mangle]
pub extern "C" fn NiBlackThreshold(
    src: u64,
    dst: u64,
    max_value: c_float,
    typ: c_int,
    block_size: c_int,
    k: c_float,
    binarization_method: c_int,
    r: c_float,
) -> CvStatus {
    crate::invoke(|| {
        let src = crate::resolve(&MATS, src)?;
        let dst = crate::resolve(&MATS, dst)?;
        crate::distinct(&[&src, &dst])?;
        let src = crate::lock(&src);
        let mut dst = crate::lock(&dst);
        ximgproc::ni_black_threshold(
            &*src,
            &mut *dst,
            max_value as f64,
            typ,
            block_size,
            k as f64,
            binarization_method,
            r as f64,
        )
        .map_err(crate::cv_fault)
    })
}

#[no_mangle]
pub extern "C" fn PeiLinNormalization(src: u64, dst: u64) -> CvStatus {
    crate::invoke(|| {
        let src = crate::resolve(&MATS, src)?;
        let dst = crate::resolve(&MATS, dst)?;
        crate::distinct(&[&src, &dst])?;
        let src = crate::lock(&src);
        let mut dst = crate::lock(&dst);
        ximgproc::pei_lin_normalization(&*src, &mut *dst).map_err(crate::cv_fault)
    })
}

#[no_mangle]
pub extern "C" fn Thinning(src: u64, dst: u64, typ: c_int) -> CvStatus {
    crate::invoke(|| {
        let src = crate::resolve(&MATS, src)?;
        let dst = crate::resolve(&MATS, dst)?;
        crate::distinct(&[&src, &dst])?;
        let src = crate::lock(&src);
        let mut dst = crate::lock(&dst);
        ximgproc::thinning(&*src, &mut *dst, typ).map_err(crate::cv_fault)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_api::{Mat_Close, Mat_Empty, Mat_NewWithSize};

    #[test]
    fn thinning_produces_output() {
        let src = Mat_NewWithSize(32, 32, opencv::core::CV_8UC1);
        let dst = Mat_NewWithSize(0, 0, opencv::core::CV_8UC1);

        let status = Thinning(src, dst, ximgproc::THINNING_ZHANGSUEN);
        assert_eq!(status.code, 0);
        assert!(!Mat_Empty(dst));

        Mat_Close(src);
        Mat_Close(dst);
    }

    #[test]
    fn faults_surface_the_raw_code_and_detail() {
        // An empty source violates the filter's input assertions; the wrapper
        // must hand back a non-zero code and record the message.
        cvlink::last_error::clear_last_error();
        let src = Mat_NewWithSize(0, 0, opencv::core::CV_8UC1);
        let dst = Mat_NewWithSize(0, 0, opencv::core::CV_8UC1);

        let status = EdgePreservingFilter(src, dst, 3, 20.0);
        assert_ne!(status.code, 0);
        assert!(!cvlink::last_error::get_last_error().is_empty());

        Mat_Close(src);
        Mat_Close(dst);
        cvlink::last_error::clear_last_error();
    }

    #[test]
    fn aliased_handles_are_rejected_across_the_module() {
        let src = Mat_NewWithSize(8, 8, opencv::core::CV_8UC1);
        assert_ne!(PeiLinNormalization(src, src).code, 0);
        assert_ne!(AnisotropicDiffusion(src, src, 1.0, 0.02, 3).code, 0);
        Mat_Close(src);
        cvlink::last_error::clear_last_error();
    }
}
