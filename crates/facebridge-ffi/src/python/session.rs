//! Process-wide interpreter session.
//!
//! CPython is initialized once, on first use, and stays up until the process
//! exits. Every call borrows it through [`InterpreterSession::attach`].

use std::path::PathBuf;
use std::sync::OnceLock;

use facebridge_kernel::ForeignCallError;
use pyo3::prelude::*;
use tracing::{debug, info};

static SESSION: OnceLock<InterpreterSession> = OnceLock::new();

#[derive(Debug)]
pub struct InterpreterSession {
    version: String,
}

impl InterpreterSession {
    /// The session, starting the interpreter if this is the first use.
    pub fn global() -> &'static InterpreterSession {
        SESSION.get_or_init(|| {
            Python::initialize();
            let version = Python::attach(|py| py.version().to_string());
            info!(version = %version, "python interpreter initialized");
            InterpreterSession { version }
        })
    }

    /// Full `sys.version` string of the embedded interpreter.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Run `f` with the interpreter attached to the current thread.
    pub fn attach<F, T>(&self, f: F) -> T
    where
        F: for<'py> FnOnce(Python<'py>) -> T,
    {
        Python::attach(f)
    }

    /// Put `paths` at the front of `sys.path`, in order, skipping entries
    /// already present.
    pub fn prepend_search_paths(&self, paths: &[PathBuf]) -> Result<(), ForeignCallError> {
        if paths.is_empty() {
            return Ok(());
        }

        self.attach(|py| {
            let sys_path = PyModule::import(py, "sys")
                .and_then(|sys| sys.getattr("path"))
                .map_err(|e| ForeignCallError::RuntimeInit(format!("sys.path unavailable: {e}")))?;

            for path in paths.iter().rev() {
                let entry = path.to_str().ok_or_else(|| {
                    ForeignCallError::RuntimeInit(format!(
                        "search path is not valid UTF-8: {}",
                        path.display()
                    ))
                })?;

                let present = sys_path
                    .contains(entry)
                    .map_err(|e| ForeignCallError::RuntimeInit(e.to_string()))?;
                if present {
                    continue;
                }
                sys_path
                    .call_method1("insert", (0, entry))
                    .map_err(|e| ForeignCallError::RuntimeInit(e.to_string()))?;
                debug!(path = entry, "added to sys.path");
            }
            Ok(())
        })
    }
}
