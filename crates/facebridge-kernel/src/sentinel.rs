//! Collapse of a typed call result into the drop-in string contract.

use crate::error::ForeignCallError;

/// The literal every failure turns into at the sentinel boundary.
///
/// A routine must never return this exact text as a success value; callers
/// treat it as the failure indicator.
pub const SENTINEL_ERROR: &str = "Error";

/// Success text passes through untouched, every error becomes
/// [`SENTINEL_ERROR`].
pub fn collapse(result: Result<String, ForeignCallError>) -> String {
    result.unwrap_or_else(|_| SENTINEL_ERROR.to_string())
}

pub fn is_sentinel(value: &str) -> bool {
    value == SENTINEL_ERROR
}
