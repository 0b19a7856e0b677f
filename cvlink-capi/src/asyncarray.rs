//! Asynchronous DNN inference results.
//!
//! An `AsyncArray` handle stands for a future value that OpenCV resolves on
//! its own; the only operation offered is a blocking await-and-extract into a
//! caller-owned Mat. No cancellation is exposed for the wait.

use std::path::Path;

use libc::c_char;
use log::*;
use opencv::core::{AsyncArray, Scalar};
use opencv::dnn::{self, Net};
use opencv::prelude::*;

use cvlink::prelude::v1::*;

use crate::core_api::MATS;
use crate::CvStatus;

pub(crate) static ASYNC_ARRAYS: HandleStore<AsyncArray> = HandleStore::new();
pub(crate) static NETS: HandleStore<Net> = HandleStore::new();

/// Create a new empty AsyncArray.
#[no_mangle]
pub extern "C" fn AsyncArray_New() -> u64 {
    crate::create(|| {
        AsyncArray::default()
            .map(|arr| ASYNC_ARRAYS.insert(arr))
            .map_err(crate::cv_fault)
    })
}

/// Close an AsyncArray handle.
#[no_mangle]
pub extern "C" fn AsyncArray_Close(async_array: u64) {
    if let Some(handle) = Handle::from_raw(async_array) {
        ASYNC_ARRAYS.remove(handle);
    }
}

/// Block until the async result resolves, then copy it into `out`.
///
/// Returns the fault message, or the empty string on success; this entry
/// point predates the [`CvStatus`] convention and callers check for an empty
/// string instead of a code.
#[no_mangle]
pub extern "C" fn AsyncArray_GetAsync(async_array: u64, out: u64) -> *const c_char {
    let status = crate::invoke(|| {
        let arr = crate::resolve(&ASYNC_ARRAYS, async_array)?;
        let out = crate::resolve(&MATS, out)?;
        let arr = crate::lock(&arr);
        let mut out = crate::lock(&out);
        arr.get(&mut *out).map_err(crate::cv_fault)
    });
    status.message
}

/// Load a network from a model file, plus an optional config file.
///
/// A missing path is reported as a file-not-found fault without touching
/// OpenCV.
#[no_mangle]
pub extern "C" fn Net_ReadNet(model: *const c_char, config: *const c_char) -> u64 {
    crate::create(|| {
        let model = crate::required_str(model, "model path")?;
        let config = crate::optional_str(config);

        for path in [model.as_str(), config.as_str()] {
            if !path.is_empty() && !Path::new(path).exists() {
                return Err(Fault::new(
                    ErrorKind::FileNotFound,
                    format!("file not found: {}", path),
                ));
            }
        }

        debug!("reading network from {}", model);
        let net = dnn::read_net(&model, &config, "").map_err(crate::cv_fault)?;
        Ok(NETS.insert(net))
    })
}

/// Close a Net handle.
#[no_mangle]
pub extern "C" fn Net_Close(net: u64) {
    if let Some(handle) = Handle::from_raw(net) {
        NETS.remove(handle);
    }
}

/// Set the network's input blob under the given name.
#[no_mangle]
pub extern "C" fn Net_SetInput(net: u64, blob: u64, name: *const c_char) -> CvStatus {
    crate::invoke(|| {
        let net = crate::resolve(&NETS, net)?;
        let blob = crate::resolve(&MATS, blob)?;
        let name = crate::optional_str(name);
        let mut net = crate::lock(&net);
        let blob = crate::lock(&blob);
        net.set_input(&*blob, &name, 1.0, Scalar::default())
            .map_err(crate::cv_fault)
    })
}

/// Start an asynchronous forward pass and wrap its future result.
#[no_mangle]
pub extern "C" fn Net_ForwardAsync(net: u64, output_name: *const c_char) -> u64 {
    crate::create(|| {
        let net = crate::resolve(&NETS, net)?;
        let output_name = crate::optional_str(output_name);
        let mut net = crate::lock(&net);
        let arr = net.forward_async(&output_name).map_err(crate::cv_fault)?;
        Ok(ASYNC_ARRAYS.insert(arr))
    })
}
