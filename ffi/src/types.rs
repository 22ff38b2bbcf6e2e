//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Results cross the boundary as one envelope: an error code, an optional
//! message, and an optional JSON payload. Records and readiness reports are
//! handed over as JSON text so the host can decode them with its own JSON
//! support instead of walking C structs.

use std::ffi::CString;
use std::os::raw::c_char;

use bing_webmaster_core::{MemoryCache, ServiceError, UreqTransport, WebmasterService};

/// Opaque handle to a `WebmasterService`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiService {
    pub(crate) inner: WebmasterService<UreqTransport, MemoryCache>,
}

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NoKey = 1,
    NoUrl = 2,
    NotEnabled = 3,
    NotPublic = 4,
    Request = 5,
    Response = 6,
    Settings = 7,
    Panic = 8,
    NullArg = 9,
}

impl From<&ServiceError> for FfiErrorCode {
    fn from(err: &ServiceError) -> Self {
        match err {
            ServiceError::NoKey => FfiErrorCode::NoKey,
            ServiceError::NoUrl => FfiErrorCode::NoUrl,
            ServiceError::NotEnabled => FfiErrorCode::NotEnabled,
            ServiceError::NotPublic => FfiErrorCode::NotPublic,
            ServiceError::Request(_) => FfiErrorCode::Request,
            ServiceError::Response { .. } => FfiErrorCode::Response,
        }
    }
}

/// Result envelope for every service call.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data` holds
/// the JSON payload, or null when the call has nothing to return.
/// On failure `error_message` is the user-facing text, `help_url` points at
/// the upstream error-code reference for response errors, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub help_url: *mut c_char,
    pub data: *mut c_char,
}

/// Copy `s` into a heap C string. Interior NULs are dropped.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: Option<&str>,
        help_url: Option<&str>,
        data: Option<&str>,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: error_message.map_or(std::ptr::null_mut(), to_c_string),
            help_url: help_url.map_or(std::ptr::null_mut(), to_c_string),
            data: data.map_or(std::ptr::null_mut(), to_c_string),
        }))
    }

    /// Build a success result carrying `value` as JSON text.
    pub(crate) fn ok_json(value: &serde_json::Value) -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, None, Some(&value.to_string()))
    }

    /// Build a success result with no payload.
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, None, None)
    }

    pub(crate) fn from_error(err: &ServiceError) -> *mut Self {
        Self::boxed(
            err.into(),
            Some(&err.to_string()),
            err.help_url(),
            None,
        )
    }

    pub(crate) fn settings_error(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Settings, Some(msg), None, None)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            Some(&format!("null argument: {name}")),
            None,
            None,
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg), None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn error_codes_follow_service_errors() {
        assert_eq!(FfiErrorCode::from(&ServiceError::NoKey), FfiErrorCode::NoKey);
        assert_eq!(
            FfiErrorCode::from(&ServiceError::Request("x".into())),
            FfiErrorCode::Request
        );
    }

    #[test]
    fn interior_nul_is_dropped() {
        let ptr = to_c_string("a\0b");
        let s = unsafe { CString::from_raw(ptr) };
        assert_eq!(s.as_c_str(), CStr::from_bytes_with_nul(b"ab\0").unwrap());
    }
}
