//! Crate-level error types for `facebridge-kernel`.
//!
//! [`ForeignCallError`] describes why one bridge call failed. It is the
//! error half of the `Result` every runtime returns, and it is what gets
//! logged before the sentinel is handed to a drop-in caller.
//!
//! [`BridgeError`] composes the setup-time errors (configuration, runtime
//! start-up) and is carried in an [`error_stack::Report`] so context can be
//! attached as it propagates.
//!
//! ```rust,ignore
//! use error_stack::ResultExt;
//! use facebridge_kernel::{BridgeConfig, BridgeResult};
//!
//! fn load() -> BridgeResult<BridgeConfig> {
//!     BridgeConfig::load("facebridge.toml").attach("loading bridge settings")
//! }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::report::ReportError;

/// Why a single foreign call did not produce text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ForeignCallError {
    /// The embedded interpreter could not be brought up or prepared.
    #[error("Interpreter initialization failed: {0}")]
    RuntimeInit(String),

    /// The module could not be imported.
    #[error("Module resolution failed: {0}")]
    ModuleResolution(String),

    /// The module has no attribute with the configured name.
    #[error("Attribute resolution failed: {0}")]
    AttributeResolution(String),

    /// The attribute exists but cannot be invoked.
    #[error("Attribute is not callable (found {type_name})")]
    NotCallable { type_name: String },

    /// The callable raised instead of returning.
    #[error("Invocation raised: {0}")]
    InvocationRaised(String),

    /// The callable returned something that is not UTF-8 text.
    #[error("Result is not decodable text ({type_name}): {detail}")]
    ResultNotDecodable { type_name: String, detail: String },

    /// The call did not finish before the configured deadline.
    #[error("Call did not complete within {0:?}")]
    Timeout(Duration),

    /// The thread running the call panicked, vanished or could not start.
    #[error("Bridge worker failed: {0}")]
    Worker(String),
}

impl ForeignCallError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ForeignCallError::RuntimeInit(_) => FailureKind::RuntimeInit,
            ForeignCallError::ModuleResolution(_) => FailureKind::ModuleResolution,
            ForeignCallError::AttributeResolution(_) => FailureKind::AttributeResolution,
            ForeignCallError::NotCallable { .. } => FailureKind::NotCallable,
            ForeignCallError::InvocationRaised(_) => FailureKind::InvocationRaised,
            ForeignCallError::ResultNotDecodable { .. } => FailureKind::ResultNotDecodable,
            ForeignCallError::Timeout(_) => FailureKind::Timeout,
            ForeignCallError::Worker(_) => FailureKind::Worker,
        }
    }
}

/// Stable, payload-free classification of a [`ForeignCallError`].
///
/// The caller of the sentinel entry point cannot tell failures apart; the
/// `kind` field in the diagnostic log can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    RuntimeInit,
    ModuleResolution,
    AttributeResolution,
    NotCallable,
    InvocationRaised,
    ResultNotDecodable,
    Timeout,
    Worker,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RuntimeInit => "runtime_init",
            FailureKind::ModuleResolution => "module_resolution",
            FailureKind::AttributeResolution => "attribute_resolution",
            FailureKind::NotCallable => "not_callable",
            FailureKind::InvocationRaised => "invocation_raised",
            FailureKind::ResultNotDecodable => "result_not_decodable",
            FailureKind::Timeout => "timeout",
            FailureKind::Worker => "worker",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crate-level error type for bridge setup and structured calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
    /// Loading or validating [`crate::BridgeConfig`] failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A foreign call (or runtime start-up) failed.
    #[error("Foreign call error: {0}")]
    Foreign(#[from] ForeignCallError),

    /// The routine's output could not be read as a recognition report.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// A process-wide bridge already exists and cannot be reconfigured.
    #[error("Bridge is already configured")]
    AlreadyConfigured,
}

/// Convenience result alias using [`error_stack::Report`].
pub type BridgeResult<T> = Result<T, error_stack::Report<BridgeError>>;
