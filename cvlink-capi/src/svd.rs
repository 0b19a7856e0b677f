//! Singular value decomposition.

use opencv::core;

use crate::core_api::MATS;
use crate::CvStatus;

/// Decompose `src` into singular values `w` and the orthogonal matrices `u`
/// and `vt`, all caller-owned Mats.
#[no_mangle]
pub extern "C" fn SVD_Compute(src: u64, w: u64, u: u64, vt: u64) -> CvStatus {
    crate::invoke(|| {
        let src = crate::resolve(&MATS, src)?;
        let w = crate::resolve(&MATS, w)?;
        let u = crate::resolve(&MATS, u)?;
        let vt = crate::resolve(&MATS, vt)?;
        crate::distinct(&[&src, &w, &u, &vt])?;

        let src = crate::lock(&src);
        let mut w = crate::lock(&w);
        let mut u = crate::lock(&u);
        let mut vt = crate::lock(&vt);
        core::sv_decomp(&*src, &mut *w, &mut *u, &mut *vt, 0).map_err(crate::cv_fault)
    })
}
