//! UniFFI bindings implementation
//!
//! Kotlin and Swift see these as top-level functions of the `facebridge`
//! namespace. `run_python_script` keeps the sentinel contract; the other
//! calls raise `BridgeFfiError` instead.

use std::path::PathBuf;
use std::time::Duration;

use error_stack::Report;
use facebridge_kernel::{BridgeConfig, BridgeError, RecognitionReport};

use crate::global;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum BridgeFfiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Call error: {0}")]
    CallError(String),
    #[error("Report error: {0}")]
    ReportError(String),
}

impl From<Report<BridgeError>> for BridgeFfiError {
    fn from(report: Report<BridgeError>) -> Self {
        let message = report.current_context().to_string();
        match report.current_context() {
            BridgeError::Config(_) | BridgeError::AlreadyConfigured => {
                BridgeFfiError::ConfigError(message)
            }
            BridgeError::Report(_) => BridgeFfiError::ReportError(message),
            _ => BridgeFfiError::CallError(message),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Overrides applied on top of [`BridgeConfig::default`].
#[derive(Debug, Clone, uniffi::Record)]
pub struct BridgeSettings {
    pub module: Option<String>,
    pub function: Option<String>,
    pub python_paths: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub print_python_errors: Option<bool>,
    pub log_filter: Option<String>,
}

impl From<BridgeSettings> for BridgeConfig {
    fn from(settings: BridgeSettings) -> Self {
        let mut config = BridgeConfig::default();
        if let Some(module) = settings.module {
            config.module = module;
        }
        if let Some(function) = settings.function {
            config.function = function;
        }
        config.python_paths = settings.python_paths.into_iter().map(PathBuf::from).collect();
        if let Some(ms) = settings.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(print) = settings.print_python_errors {
            config = config.with_print_python_errors(print);
        }
        if settings.log_filter.is_some() {
            config.log_filter = settings.log_filter;
        }
        config
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct RecognitionRecord {
    pub status: String,
    pub message: Option<String>,
    pub name: Option<String>,
    pub emotion: Option<String>,
    pub time: Option<String>,
    /// Ready-to-display five line rendering.
    pub summary: String,
}

impl From<RecognitionReport> for RecognitionRecord {
    fn from(report: RecognitionReport) -> Self {
        let summary = report.summary();
        Self {
            status: report.status.as_str().to_string(),
            message: report.message,
            name: report.name,
            emotion: report.emotion,
            time: report.time,
            summary,
        }
    }
}

// =============================================================================
// Namespace functions
// =============================================================================

#[uniffi::export]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Call the routine; `"Error"` on any failure.
#[uniffi::export]
pub fn run_python_script() -> String {
    global::invoke()
}

#[uniffi::export]
pub fn try_run_python_script() -> Result<String, BridgeFfiError> {
    Ok(global::call()?)
}

#[uniffi::export]
pub fn recognize() -> Result<RecognitionRecord, BridgeFfiError> {
    Ok(global::recognize()?.into())
}

/// Must run before the first call; fails once the bridge exists.
#[uniffi::export]
pub fn configure_bridge(settings: BridgeSettings) -> Result<(), BridgeFfiError> {
    Ok(global::install(settings.into())?)
}

#[uniffi::export]
pub fn configure_bridge_from_file(path: String) -> Result<(), BridgeFfiError> {
    Ok(global::install_from_file(path)?)
}
