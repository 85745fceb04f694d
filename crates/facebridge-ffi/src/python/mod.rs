//! CPython implementation of [`ForeignRuntime`].
//!
//! Handles are PyO3 `Bound` smart pointers, so the module, the callable and
//! the returned value are released on every path out of
//! [`PythonRuntime::call_entry`], including early error returns.

mod session;

pub use session::InterpreterSession;

use facebridge_kernel::{BridgeConfig, EntryPoint, ForeignCallError, ForeignRuntime};
use pyo3::prelude::*;
use pyo3::types::{PyString, PyTracebackMethods};
use tracing::debug;

pub struct PythonRuntime {
    session: &'static InterpreterSession,
    name: String,
    print_errors: bool,
}

impl PythonRuntime {
    /// Borrow the process-wide interpreter (starting it if needed) and add
    /// the configured search paths.
    pub fn start(config: &BridgeConfig) -> Result<Self, ForeignCallError> {
        let session = InterpreterSession::global();
        session.prepend_search_paths(&config.python_paths)?;

        let release = session.version().split_whitespace().next().unwrap_or("unknown");
        Ok(Self {
            session,
            name: format!("cpython {release}"),
            print_errors: config.print_python_errors,
        })
    }

    pub fn session(&self) -> &'static InterpreterSession {
        self.session
    }

    /// Render `err` for the bridge's error value and emit the traceback.
    fn diagnose(&self, py: Python<'_>, err: &PyErr) -> String {
        let summary = err.to_string();
        if let Some(traceback) = err.traceback(py).and_then(|tb| tb.format().ok()) {
            debug!(%traceback, "python traceback");
        }
        if self.print_errors {
            err.print(py);
        }
        summary
    }

    fn decode(&self, py: Python<'_>, value: &Bound<'_, PyAny>) -> Result<String, ForeignCallError> {
        if !value.is_instance_of::<PyString>() {
            return Err(ForeignCallError::ResultNotDecodable {
                type_name: type_name(value),
                detail: "expected str".to_string(),
            });
        }
        value
            .extract::<String>()
            .map_err(|err| ForeignCallError::ResultNotDecodable {
                type_name: "str".to_string(),
                detail: self.diagnose(py, &err),
            })
    }
}

impl ForeignRuntime for PythonRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn call_entry(&self, entry: &EntryPoint) -> Result<String, ForeignCallError> {
        self.session.attach(|py| {
            let module = PyModule::import(py, entry.module.as_str())
                .map_err(|err| ForeignCallError::ModuleResolution(self.diagnose(py, &err)))?;

            let callable = module
                .getattr(entry.function.as_str())
                .map_err(|err| ForeignCallError::AttributeResolution(self.diagnose(py, &err)))?;
            if !callable.is_callable() {
                return Err(ForeignCallError::NotCallable {
                    type_name: type_name(&callable),
                });
            }

            let value = callable
                .call0()
                .map_err(|err| ForeignCallError::InvocationRaised(self.diagnose(py, &err)))?;

            self.decode(py, &value)
        })
    }
}

fn type_name(value: &Bound<'_, PyAny>) -> String {
    value
        .get_type()
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string())
}
