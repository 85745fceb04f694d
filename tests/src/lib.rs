//! FaceBridge Testing Framework
//!
//! Provides a scriptable stand-in for the embedded interpreter so bridge
//! behavior (serialization, deadlines, sentinel mapping, handle release)
//! can be tested without a Python installation.

pub mod runtime;

pub use facebridge_kernel::ForeignRuntime;
pub use runtime::{Behavior, MockRuntime};
