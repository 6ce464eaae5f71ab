//! FFI interface for embedding hosts
//!
//! Provides C-compatible functions over the stateless pipeline stages.
//! All values cross the boundary as JSON; the host performs the network
//! request itself and hands the body to `honey_barrel_parse_search_response`.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::{Deserialize, Serialize};

use crate::extractors::Extractor;
use crate::matcher::{Matcher, DEFAULT_MATCH_THRESHOLD};
use crate::model::{Item, Listing};
use crate::search::{parse_search_response, DEFAULT_LISTING_URL_BASE, DEFAULT_PAGE_SIZE};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via honey_barrel_free_result
#[repr(C)]
pub struct HoneyBarrelResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Input of `honey_barrel_rank_listings`
#[derive(Debug, Deserialize)]
struct RankRequest {
    item: Item,
    listings: Vec<Listing>,
    #[serde(default)]
    threshold: Option<f64>,
}

/// Extract the product on a page using the built-in rule table.
///
/// Returns JSON `Item`, or `null` when the page has no detectable item.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `url` must be a valid null-terminated C string
/// - Caller must free the result via `honey_barrel_free_result`
#[no_mangle]
pub unsafe extern "C" fn honey_barrel_extract_item(
    html_ptr: *const c_char,
    html_len: usize,
    url: *const c_char,
) -> HoneyBarrelResultFFI {
    let html = match read_bytes(html_ptr, html_len) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };
    let url = match read_c_str(url) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };

    let extractor = match Extractor::builtin() {
        Ok(e) => e,
        Err(e) => return make_error_result(&e.to_string()),
    };
    make_json_result(&extractor.extract_html(html, url))
}

/// Rank listings against an item.
///
/// `request_json` is `{"item": Item, "listings": [Listing], "threshold"?: number}`;
/// returns a JSON array of comparisons.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `honey_barrel_free_result`
#[no_mangle]
pub unsafe extern "C" fn honey_barrel_rank_listings(
    request_json: *const c_char,
) -> HoneyBarrelResultFFI {
    let request_str = match read_c_str(request_json) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };

    let request: RankRequest = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => {
            return make_error_result(&format!("Failed to parse request JSON: {}", e));
        }
    };

    let matcher = Matcher::with_threshold(request.threshold.unwrap_or(DEFAULT_MATCH_THRESHOLD));
    make_json_result(&matcher.rank(&request.item, &request.listings))
}

/// Map a marketplace search response body into a JSON array of listings.
///
/// A body that cannot be mapped yields `[]`, matching the search client.
///
/// # Safety
/// - `body_ptr` must point to valid memory of at least `body_len` bytes
/// - Caller must free the result via `honey_barrel_free_result`
#[no_mangle]
pub unsafe extern "C" fn honey_barrel_parse_search_response(
    body_ptr: *const c_char,
    body_len: usize,
) -> HoneyBarrelResultFFI {
    let body = match read_bytes(body_ptr, body_len) {
        Ok(s) => s,
        Err(msg) => return make_error_result(msg),
    };

    let listings = parse_search_response(body, DEFAULT_LISTING_URL_BASE, DEFAULT_PAGE_SIZE)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unusable search response");
            Vec::new()
        });
    make_json_result(&listings)
}

/// Free a result returned by any `honey_barrel_*` function
///
/// # Safety
/// - `result` must have been returned by this library
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn honey_barrel_free_result(result: HoneyBarrelResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

// Borrow a UTF-8 buffer; null or empty reads as ""
unsafe fn read_bytes<'a>(ptr: *const c_char, len: usize) -> Result<&'a str, &'static str> {
    if ptr.is_null() || len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(ptr as *const u8, len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in input")
}

unsafe fn read_c_str<'a>(ptr: *const c_char) -> Result<&'a str, &'static str> {
    if ptr.is_null() {
        return Err("Argument is null");
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| "Invalid UTF-8 in argument")
}

fn make_json_result<T: Serialize>(value: &T) -> HoneyBarrelResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => HoneyBarrelResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> HoneyBarrelResultFFI {
    let error_ptr = CString::new(msg)
        .or_else(|_| CString::new("Unknown error"))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut());
    HoneyBarrelResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr,
    }
}
