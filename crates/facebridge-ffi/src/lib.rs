//! FaceBridge FFI - the embedded Python call, exported to managed runtimes
//!
//! # Architecture
//!
//! ```text
//! Kotlin / Swift ---- UniFFI bindings ----+
//! Kotlin (legacy) --- JNI export ---------+--> global bridge --> PythonRuntime
//! C / iOS glue ------ C ABI --------------+         |                |
//!                                                   v                v
//!                                          facebridge-kernel   InterpreterSession
//! ```
//!
//! # Features
//!
//! - `python` (default) - Embedded CPython via PyO3
//! - `uniffi` - UniFFI bindings (Kotlin, Swift, Python)
//! - `jni` - `Java_com_example_myapp_MainActivity_runPythonScript`
//! - `all` - Everything above
//!
//! # Usage
//!
//! ```bash
//! # Android library with Kotlin bindings
//! cargo build --release --features uniffi -p facebridge-ffi --target aarch64-linux-android
//!
//! # Drop-in replacement for an existing JNI library
//! cargo build --release --features jni -p facebridge-ffi --target aarch64-linux-android
//! ```

pub use facebridge_kernel::*;

// =============================================================================
// PyO3 runtime and the process-wide bridge (enabled with `python` feature)
// =============================================================================

#[cfg(feature = "python")]
pub mod python;

#[cfg(feature = "python")]
pub mod global;

#[cfg(feature = "python")]
pub mod c_api;

#[cfg(feature = "python")]
pub use python::{InterpreterSession, PythonRuntime};

// =============================================================================
// UniFFI bindings (enabled with `uniffi` feature)
// =============================================================================

#[cfg(feature = "uniffi")]
mod uniffi_bindings;

#[cfg(feature = "uniffi")]
pub use uniffi_bindings::*;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!("facebridge");

// =============================================================================
// JNI export (enabled with `jni` feature)
// =============================================================================

#[cfg(feature = "jni")]
mod jni_bindings;
