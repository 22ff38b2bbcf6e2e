//! C-ABI wrapper around `bing-webmaster-core`.
//!
//! # Overview
//! Lets a host written in any language with a C FFI (a CMS plugin, typically)
//! drive the Webmaster service: look up cached URL traffic info, submit a URL
//! on publish, and ask what would happen on publish.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The service handle owns its transport and cache, so cached records live
//!   as long as the handle.
//! - A single `FfiResult` envelope conveys payloads (as JSON text) and errors
//!   uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `bing_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use bing_webmaster_core::{Post, PostStatus, Settings, WebmasterService};
use tracing::warn;

use types::*;

/// Borrow a C string as `&str`. Null and invalid UTF-8 both yield `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn opt_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn post_from_raw(post_id: u64, permalink: *const c_char, status: *const c_char) -> Post {
    let permalink = unsafe { opt_str(permalink) }.map(str::to_string);
    let status = unsafe { opt_str(status) }
        .map(PostStatus::from)
        .unwrap_or_else(|| PostStatus::Other(String::new()));
    Post {
        id: post_id,
        permalink,
        status,
    }
}

// ---------------------------------------------------------------------------
// Service lifecycle
// ---------------------------------------------------------------------------

/// Create a service from TOML settings text, reporting why it failed.
///
/// On success `*out_service` receives the handle and the result is `Ok`.
/// Otherwise `*out_service` is null and the result carries `Settings` with
/// the parse error, or `NullArg`. `BING_WEBMASTER_API_KEY`, when set,
/// overrides the key in the settings. Free the handle with
/// `bing_service_free` and the result with `bing_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn bing_service_open(
    settings_toml: *const c_char,
    out_service: *mut *mut FfiService,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if out_service.is_null() {
            return FfiResult::null_arg("out_service");
        }
        unsafe { *out_service = std::ptr::null_mut() };
        if settings_toml.is_null() {
            return FfiResult::null_arg("settings_toml");
        }
        let Ok(text) = unsafe { CStr::from_ptr(settings_toml) }.to_str() else {
            return FfiResult::settings_error("settings are not valid UTF-8");
        };
        match Settings::from_toml_str(text) {
            Ok(settings) => {
                let inner = WebmasterService::from_settings(settings.with_env());
                unsafe { *out_service = Box::into_raw(Box::new(FfiService { inner })) };
                FfiResult::ok_empty()
            }
            Err(e) => {
                warn!(error = %e, "rejected settings");
                FfiResult::settings_error(&e.to_string())
            }
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in bing_service_open"))
}

/// Create a service from TOML settings text.
///
/// Returns null if `settings_toml` is null, not UTF-8, or not valid settings;
/// use `bing_service_open` to learn why. The caller must free the returned
/// pointer with `bing_service_free`.
#[unsafe(no_mangle)]
pub extern "C" fn bing_service_new(settings_toml: *const c_char) -> *mut FfiService {
    let mut service = std::ptr::null_mut();
    bing_free_result(bing_service_open(settings_toml, &mut service));
    service
}

/// Free a service created by `bing_service_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn bing_service_free(service: *mut FfiService) {
    if !service.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(service) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Service operations
// ---------------------------------------------------------------------------

/// Merged URL info and traffic info for a post.
///
/// `permalink` may be null; `status` is the host's post status string
/// (`publish`, `draft`, ...). On success `data` is the record as a JSON
/// object with dates already formatted.
#[unsafe(no_mangle)]
pub extern "C" fn bing_fetch_info(
    service: *const FfiService,
    post_id: u64,
    permalink: *const c_char,
    status: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if service.is_null() {
            return FfiResult::null_arg("service");
        }
        let service = unsafe { &*service };
        let post = post_from_raw(post_id, permalink, status);
        match service.inner.fetch_info(&post) {
            Ok(record) => FfiResult::ok_json(&serde_json::Value::Object(record)),
            Err(e) => FfiResult::from_error(&e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in bing_fetch_info"))
}

/// Submit a post's permalink to Bing.
///
/// Succeeds with a null `data`.
#[unsafe(no_mangle)]
pub extern "C" fn bing_submit_url(
    service: *const FfiService,
    post_id: u64,
    permalink: *const c_char,
    status: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if service.is_null() {
            return FfiResult::null_arg("service");
        }
        let service = unsafe { &*service };
        let post = post_from_raw(post_id, permalink, status);
        match service.inner.submit_url(&post) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_error(&e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in bing_submit_url"))
}

/// Readiness report for a post that has not been published yet.
///
/// `data` is `{"status": bool, "reasons": [...]}`, or null when the status
/// does not call for a report.
#[unsafe(no_mangle)]
pub extern "C" fn bing_before_submit(
    service: *const FfiService,
    status: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if service.is_null() {
            return FfiResult::null_arg("service");
        }
        let Some(status) = (unsafe { opt_str(status) }) else {
            return FfiResult::null_arg("status");
        };
        let service = unsafe { &*service };
        match service.inner.before_submit(&PostStatus::from(status)) {
            Some(readiness) => FfiResult::ok_json(&serde_json::json!({
                "status": readiness.status,
                "reasons": readiness.reasons,
            })),
            None => FfiResult::ok_empty(),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in bing_before_submit"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiResult` returned by any service operation. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn bing_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        for ptr in [result.error_message, result.help_url, result.data] {
            if !ptr.is_null() {
                drop(unsafe { CString::from_raw(ptr) });
            }
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn bing_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { CString::from_raw(s) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
