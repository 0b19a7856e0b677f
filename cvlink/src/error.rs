//! # Error normalization
//!
//! OpenCV reports faults with an `i32` code drawn from `cv::Error::Code` and
//! a free-form message. Foreign callers cannot consume either directly, so
//! this module maps every possible code onto the closed [`ErrorKind`]
//! enumeration and renders each kind as a static sentence. The mapping is
//! total: codes this table does not recognize become [`ErrorKind::Unknown`]
//! rather than an error of their own.

use std::fmt;
use std::os::raw::c_char;

/// Raw `cv::Error::Code` values, stable per OpenCV major version.
///
/// Kept here instead of pulling them out of the `opencv` crate so the
/// normalization table can be built and tested without a native OpenCV
/// installation.
pub mod codes {
    pub const STS_OK: i32 = 0;
    pub const STS_BACK_TRACE: i32 = -1;
    pub const STS_ERROR: i32 = -2;
    pub const STS_INTERNAL: i32 = -3;
    pub const STS_NO_MEM: i32 = -4;
    pub const STS_BAD_ARG: i32 = -5;
    pub const STS_BAD_FUNC: i32 = -6;
    pub const STS_NO_CONV: i32 = -7;
    pub const STS_AUTO_TRACE: i32 = -8;
    pub const HEADER_IS_NULL: i32 = -9;
    pub const BAD_IMAGE_SIZE: i32 = -10;
    pub const BAD_OFFSET: i32 = -11;
    pub const BAD_DATA_PTR: i32 = -12;
    pub const BAD_STEP: i32 = -13;
    pub const BAD_MODEL_OR_CH_SEQ: i32 = -14;
    pub const BAD_NUM_CHANNELS: i32 = -15;
    pub const BAD_NUM_CHANNEL_1U: i32 = -16;
    pub const BAD_DEPTH: i32 = -17;
    pub const BAD_ALPHA_CHANNEL: i32 = -18;
    pub const BAD_ORDER: i32 = -19;
    pub const BAD_ORIGIN: i32 = -20;
    pub const BAD_ALIGN: i32 = -21;
    pub const BAD_CALL_BACK: i32 = -22;
    pub const BAD_TILE_SIZE: i32 = -23;
    pub const BAD_COI: i32 = -24;
    pub const BAD_ROI_SIZE: i32 = -25;
    pub const MASK_IS_TILED: i32 = -26;
    pub const STS_NULL_PTR: i32 = -27;
    pub const STS_VEC_LENGTH_ERR: i32 = -28;
    pub const STS_FILTER_STRUCT_CONTENT_ERR: i32 = -29;
    pub const STS_KERNEL_STRUCT_CONTENT_ERR: i32 = -30;
    pub const STS_FILTER_OFFSET_ERR: i32 = -31;
    pub const STS_BAD_SIZE: i32 = -201;
    pub const STS_DIV_BY_ZERO: i32 = -202;
    pub const STS_INPLACE_NOT_SUPPORTED: i32 = -203;
    pub const STS_OBJECT_NOT_FOUND: i32 = -204;
    pub const STS_UNMATCHED_FORMATS: i32 = -205;
    pub const STS_BAD_FLAG: i32 = -206;
    pub const STS_BAD_POINT: i32 = -207;
    pub const STS_BAD_MASK: i32 = -208;
    pub const STS_UNMATCHED_SIZES: i32 = -209;
    pub const STS_UNSUPPORTED_FORMAT: i32 = -210;
    pub const STS_OUT_OF_RANGE: i32 = -211;
    pub const STS_PARSE_ERROR: i32 = -212;
    pub const STS_NOT_IMPLEMENTED: i32 = -213;
    pub const STS_BAD_MEM_BLOCK: i32 = -214;
    pub const STS_ASSERT: i32 = -215;
    pub const GPU_NOT_SUPPORTED: i32 = -216;
    pub const GPU_API_CALL_ERROR: i32 = -217;
    pub const OPEN_GL_NOT_SUPPORTED: i32 = -218;
    pub const OPEN_GL_API_CALL_ERROR: i32 = -219;
    pub const OPEN_CL_API_CALL_ERROR: i32 = -220;
    pub const OPEN_CL_DOUBLE_NOT_SUPPORTED: i32 = -221;
    pub const OPEN_CL_INIT_ERROR: i32 = -222;
    pub const OPEN_CL_NO_AMD_BLAS_FFT: i32 = -223;
}

/// Normalized fault category exposed across the ABI.
///
/// The discriminants are the stable values foreign callers receive; they must
/// never be renumbered. Several OpenCV codes collapse into one kind on
/// purpose: callers branch on coarse categories, not on every distinction
/// OpenCV makes internally.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Ok = 0,
    Generic = -1,
    Internal = -2,
    NoMemory = -3,
    BadArgument = -5,
    NotImplemented = -6,
    NoConvergence = -7,
    AutoTrace = -8,
    HeaderIsNull = -9,
    NullPointer = -27,
    BadSize = -201,
    BadDepth = -202,
    BadChannels = -203,
    BadType = -204,
    BadOffset = -205,
    BadRange = -211,
    AssertFailed = -215,
    GpuNotSupported = -217,
    GpuApiCall = -218,
    GpuDecode = -219,
    FileNotFound = -301,
    FileRead = -302,
    FileWrite = -303,
    Unknown = -999,
}

impl ErrorKind {
    /// Every member of the enumeration, for exhaustiveness sweeps.
    pub const ALL: [ErrorKind; 24] = [
        ErrorKind::Ok,
        ErrorKind::Generic,
        ErrorKind::Internal,
        ErrorKind::NoMemory,
        ErrorKind::BadArgument,
        ErrorKind::NotImplemented,
        ErrorKind::NoConvergence,
        ErrorKind::AutoTrace,
        ErrorKind::HeaderIsNull,
        ErrorKind::NullPointer,
        ErrorKind::BadSize,
        ErrorKind::BadDepth,
        ErrorKind::BadChannels,
        ErrorKind::BadType,
        ErrorKind::BadOffset,
        ErrorKind::BadRange,
        ErrorKind::AssertFailed,
        ErrorKind::GpuNotSupported,
        ErrorKind::GpuApiCall,
        ErrorKind::GpuDecode,
        ErrorKind::FileNotFound,
        ErrorKind::FileRead,
        ErrorKind::FileWrite,
        ErrorKind::Unknown,
    ];

    /// Normalize an OpenCV error code.
    ///
    /// Total over all of `i32`. Codes absent from the table yield
    /// [`ErrorKind::Unknown`], never a failure.
    pub fn from_code(code: i32) -> Self {
        use codes::*;

        match code {
            STS_OK => Self::Ok,
            STS_BACK_TRACE | STS_ERROR => Self::Generic,
            STS_INTERNAL => Self::Internal,
            STS_NO_MEM => Self::NoMemory,
            STS_BAD_ARG => Self::BadArgument,
            STS_BAD_FUNC => Self::NotImplemented,
            STS_NO_CONV => Self::NoConvergence,
            STS_AUTO_TRACE => Self::AutoTrace,
            HEADER_IS_NULL => Self::HeaderIsNull,
            BAD_IMAGE_SIZE | STS_BAD_SIZE => Self::BadSize,
            BAD_DEPTH => Self::BadDepth,
            BAD_NUM_CHANNELS | BAD_NUM_CHANNEL_1U => Self::BadChannels,
            BAD_COI | BAD_ORDER | BAD_STEP => Self::BadType,
            BAD_DATA_PTR | BAD_ALPHA_CHANNEL | BAD_OFFSET => Self::BadOffset,
            STS_OUT_OF_RANGE | BAD_ROI_SIZE => Self::BadRange,
            STS_NULL_PTR => Self::NullPointer,
            STS_ASSERT
            | STS_VEC_LENGTH_ERR
            | STS_FILTER_STRUCT_CONTENT_ERR
            | STS_KERNEL_STRUCT_CONTENT_ERR
            | STS_FILTER_OFFSET_ERR
            | STS_BAD_FLAG
            | STS_DIV_BY_ZERO
            | STS_UNSUPPORTED_FORMAT
            | STS_OBJECT_NOT_FOUND
            | BAD_TILE_SIZE
            | STS_UNMATCHED_FORMATS
            | STS_UNMATCHED_SIZES => Self::AssertFailed,
            GPU_NOT_SUPPORTED => Self::GpuNotSupported,
            GPU_API_CALL_ERROR
            | OPEN_GL_NOT_SUPPORTED
            | OPEN_GL_API_CALL_ERROR
            | OPEN_CL_API_CALL_ERROR
            | OPEN_CL_DOUBLE_NOT_SUPPORTED
            | OPEN_CL_INIT_ERROR
            | OPEN_CL_NO_AMD_BLAS_FFT => Self::GpuApiCall,
            _ => Self::Unknown,
        }
    }

    /// Recover a kind from its ABI discriminant.
    ///
    /// Returns `None` for values that are not a member, letting the C surface
    /// substitute its "unknown error code" fallback.
    pub fn from_abi(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| *kind as i32 == value)
    }

    /// The ABI discriminant of this kind.
    pub fn as_abi(self) -> i32 {
        self as i32
    }

    /// Static human-readable description.
    ///
    /// Defined for every member, including [`ErrorKind::Unknown`].
    pub fn describe(self) -> &'static str {
        let text = self.describe_nul();
        &text[..text.len() - 1]
    }

    /// Same as [`describe`](Self::describe), as a borrowed NUL-terminated C
    /// string. The terminator is baked into the literal so the C surface can
    /// hand the pointer out without allocating.
    pub fn describe_c(self) -> *const c_char {
        self.describe_nul().as_ptr() as *const c_char
    }

    fn describe_nul(self) -> &'static str {
        match self {
            Self::Ok => "Success\0",
            Self::Generic => "Generic OpenCV error\0",
            Self::Internal => "Internal OpenCV error (bad state)\0",
            Self::NoMemory => "Insufficient memory\0",
            Self::BadArgument => "Bad argument (incorrect range, value, or null pointer)\0",
            Self::NotImplemented => "Function not implemented\0",
            Self::NoConvergence => "Iteration did not converge\0",
            Self::AutoTrace => "Tracing\0",
            Self::HeaderIsNull => "Image header is NULL\0",
            Self::NullPointer => "Null pointer provided\0",
            Self::BadSize => "Incorrect size of input array\0",
            Self::BadDepth => "Input array depth is not supported by this function\0",
            Self::BadChannels => "Number of channels is not supported\0",
            Self::BadType => "Bad data type or unsupported combination of types\0",
            Self::BadOffset => "Offset is invalid\0",
            Self::BadRange => "Bad range of values\0",
            Self::AssertFailed => "Assertion failed\0",
            Self::GpuNotSupported => "GPU/CUDA operation not supported\0",
            Self::GpuApiCall => "GPU API call failed\0",
            Self::GpuDecode => "NVCUVID API call failed\0",
            Self::FileNotFound => "File not found\0",
            Self::FileRead => "File read error\0",
            Self::FileWrite => "File write error\0",
            Self::Unknown => "Unknown error\0",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A caught fault, carrying both the normalized kind and the raw OpenCV code
/// it was derived from.
///
/// Some ABI entry points report the raw code, others only the kind; keeping
/// both lets either surface be served from one value.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{}: {}", .kind, .message)]
pub struct Fault {
    pub kind: ErrorKind,
    pub code: i32,
    pub message: String,
}

impl Fault {
    /// Fault raised by this layer itself rather than by OpenCV.
    ///
    /// The raw code is the kind's own ABI value.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.as_abi(),
            message: message.into(),
        }
    }

    /// Fault derived from an OpenCV error code and message.
    pub fn from_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_code(code),
            code,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Fault>;
