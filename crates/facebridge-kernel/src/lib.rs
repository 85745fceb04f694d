//! FaceBridge Kernel - the host-independent half of the bridge
//!
//! This crate owns everything about a foreign call that does not depend on a
//! particular interpreter:
//!
//! ```text
//! managed caller (Kotlin / Swift / C)
//!     |
//!     v
//! facebridge-ffi   (exports, global bridge, Python runtime)
//!     |
//!     v
//! facebridge-kernel
//!     +-- Bridge          serialization gate, deadline, diagnostics
//!     +-- ForeignRuntime  seam implemented by the embedded interpreter
//!     +-- sentinel        Result -> "Error" collapse for drop-in callers
//!     +-- config          BridgeConfig loading (file / env)
//!     +-- report          JSON recognition report parsing
//! ```
//!
//! The core contract is a single zero-argument call returning text. Rust
//! callers get `Result<String, ForeignCallError>`; only the outermost
//! boundary turns failures into the literal `"Error"`.

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod runtime;
pub mod sentinel;

pub use bridge::{Bridge, BridgeStats};
pub use crate::config::BridgeConfig;
pub use error::{BridgeError, BridgeResult, FailureKind, ForeignCallError};
pub use report::{RecognitionReport, RecognitionStatus, ReportError};
pub use runtime::{EntryPoint, ForeignRuntime};
pub use sentinel::SENTINEL_ERROR;
