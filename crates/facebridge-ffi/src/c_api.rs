//! C ABI entry points for hosts without UniFFI or JNI (e.g. iOS glue).
//!
//! Strings returned here are owned by Rust and must be handed back to
//! [`facebridge_string_free`].

use std::ffi::{CString, c_char};

use facebridge_kernel::SENTINEL_ERROR;
use tracing::warn;

use crate::global;

/// Call the routine. Returns a NUL-terminated UTF-8 string, `"Error"` on
/// failure. Never returns null.
#[unsafe(no_mangle)]
pub extern "C" fn facebridge_invoke() -> *mut c_char {
    to_c_string(global::invoke_guarded()).into_raw()
}

/// Release a string obtained from [`facebridge_invoke`].
///
/// # Safety
///
/// `ptr` must be null or a pointer returned by `facebridge_invoke` that has
/// not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn facebridge_string_free(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}

/// Text with an interior NUL cannot cross as a C string; it becomes the
/// sentinel.
fn to_c_string(text: String) -> CString {
    CString::new(text).unwrap_or_else(|err| {
        warn!(position = err.nul_position(), "result contains NUL, returning sentinel");
        CString::new(SENTINEL_ERROR).unwrap_or_default()
    })
}
