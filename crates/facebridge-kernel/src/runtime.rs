//! The seam between the bridge and an embedded interpreter.

use std::fmt;

use crate::error::ForeignCallError;

/// A module name and the zero-argument attribute to call on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryPoint {
    pub module: String,
    pub function: String,
}

impl EntryPoint {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.function)
    }
}

/// An interpreter able to perform the bridge's one call shape.
///
/// Implementations resolve `entry.module`, fetch `entry.function`, check it
/// is callable, call it with no arguments and decode the result as UTF-8.
/// Every handle acquired along the way must be released before returning,
/// on success and on every error path.
///
/// Implementations need not be reentrant: [`crate::Bridge`] never calls
/// `call_entry` on the same runtime from two threads at once.
pub trait ForeignRuntime: Send + Sync + 'static {
    /// Short name used in diagnostics, e.g. `"cpython 3.11.9"`.
    fn name(&self) -> &str;

    fn call_entry(&self, entry: &EntryPoint) -> Result<String, ForeignCallError>;
}
