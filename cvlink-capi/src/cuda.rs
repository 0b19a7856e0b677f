//! CUDA-backed containers and sparse optical flow.
//!
//! Compiled only with the `cuda` feature, which needs an OpenCV build that
//! ships the `cudaoptflow` module.

use opencv::core::{self, GpuMat, Ptr, Size};
use opencv::cudaoptflow;
use opencv::prelude::*;

use cvlink::prelude::v1::*;

use crate::core_api::MATS;
use crate::CvStatus;

type SparsePyrLk = Ptr<dyn cudaoptflow::CUDA_SparsePyrLKOpticalFlow>;

pub(crate) static GPU_MATS: HandleStore<GpuMat> = HandleStore::new();
pub(crate) static FLOWS: HandleStore<SparsePyrLk> = HandleStore::new();

/// Create a new empty GpuMat.
#[no_mangle]
pub extern "C" fn GpuMat_New() -> u64 {
    crate::create(|| {
        GpuMat::default()
            .map(|mat| GPU_MATS.insert(mat))
            .map_err(crate::cv_fault)
    })
}

/// Close a GpuMat handle.
#[no_mangle]
pub extern "C" fn GpuMat_Close(gpu_mat: u64) {
    if let Some(handle) = Handle::from_raw(gpu_mat) {
        GPU_MATS.remove(handle);
    }
}

/// Copy a host Mat into device memory.
#[no_mangle]
pub extern "C" fn GpuMat_Upload(gpu_mat: u64, src: u64) -> CvStatus {
    crate::invoke(|| {
        let gpu_mat = crate::resolve(&GPU_MATS, gpu_mat)?;
        let src = crate::resolve(&MATS, src)?;
        let mut gpu_mat = crate::lock(&gpu_mat);
        let src = crate::lock(&src);
        gpu_mat.upload(&*src).map_err(crate::cv_fault)
    })
}

/// Copy device memory back into a host Mat.
#[no_mangle]
pub extern "C" fn GpuMat_Download(gpu_mat: u64, dst: u64) -> CvStatus {
    crate::invoke(|| {
        let gpu_mat = crate::resolve(&GPU_MATS, gpu_mat)?;
        let dst = crate::resolve(&MATS, dst)?;
        let gpu_mat = crate::lock(&gpu_mat);
        let mut dst = crate::lock(&dst);
        gpu_mat.download(&mut *dst).map_err(crate::cv_fault)
    })
}

/// Create a sparse pyramidal Lucas-Kanade optical flow with OpenCV's
/// defaults.
#[no_mangle]
pub extern "C" fn CudaSparsePyrLKOpticalFlow_Create() -> u64 {
    crate::create(|| {
        <dyn cudaoptflow::CUDA_SparsePyrLKOpticalFlow>::create(Size::new(21, 21), 3, 30, false)
            .map(|flow| FLOWS.insert(flow))
            .map_err(crate::cv_fault)
    })
}

/// Close an optical flow handle.
#[no_mangle]
pub extern "C" fn CudaSparsePyrLKOpticalFlow_Close(flow: u64) {
    if let Some(handle) = Handle::from_raw(flow) {
        FLOWS.remove(handle);
    }
}

/// Track `prev_pts` from `prev_img` into `next_img`, writing the tracked
/// points into `next_pts` and per-point success flags into `status`.
#[no_mangle]
pub extern "C" fn CudaSparsePyrLKOpticalFlow_Calc(
    flow: u64,
    prev_img: u64,
    next_img: u64,
    prev_pts: u64,
    next_pts: u64,
    status: u64,
) -> CvStatus {
    crate::invoke(|| {
        let flow = crate::resolve(&FLOWS, flow)?;
        let prev_img = crate::resolve(&GPU_MATS, prev_img)?;
        let next_img = crate::resolve(&GPU_MATS, next_img)?;
        let prev_pts = crate::resolve(&GPU_MATS, prev_pts)?;
        let next_pts = crate::resolve(&GPU_MATS, next_pts)?;
        let status = crate::resolve(&GPU_MATS, status)?;
        crate::distinct(&[&prev_img, &next_img, &prev_pts, &next_pts, &status])?;

        let mut flow = crate::lock(&flow);
        let prev_img = crate::lock(&prev_img);
        let next_img = crate::lock(&next_img);
        let prev_pts = crate::lock(&prev_pts);
        let mut next_pts = crate::lock(&next_pts);
        let mut status = crate::lock(&status);
        flow.calc(
            &*prev_img,
            &*next_img,
            &*prev_pts,
            &mut *next_pts,
            &mut *status,
            &mut core::no_array(),
            &mut core::Stream::default().map_err(crate::cv_fault)?,
        )
        .map_err(crate::cv_fault)
    })
}
