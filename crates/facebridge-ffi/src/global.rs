//! The process-wide bridge behind every exported entry point.
//!
//! All exports share one [`Bridge`], so they share one serialization gate.
//! It is built on first use from [`BridgeConfig::discover`], unless a host
//! installed a configuration earlier with [`install`].

use std::panic::catch_unwind;
use std::path::Path;
use std::sync::OnceLock;

use error_stack::{Report, ResultExt};
use facebridge_kernel::logging::init_logging;
use facebridge_kernel::{
    Bridge, BridgeConfig, BridgeError, BridgeResult, ForeignRuntime, RecognitionReport,
    SENTINEL_ERROR,
};
use parking_lot::{Mutex, const_mutex};
use tracing::{error, info};

use crate::python::PythonRuntime;

static BRIDGE: OnceLock<Bridge<PythonRuntime>> = OnceLock::new();
static INIT: Mutex<()> = const_mutex(());

/// The process-wide bridge, built from discovered configuration on first use.
pub fn bridge() -> BridgeResult<&'static Bridge<PythonRuntime>> {
    if let Some(bridge) = BRIDGE.get() {
        return Ok(bridge);
    }

    let _init = INIT.lock();
    if let Some(bridge) = BRIDGE.get() {
        return Ok(bridge);
    }

    let config = match BridgeConfig::discover() {
        Ok(config) => config,
        Err(report) => {
            init_logging(None);
            return Err(report.attach("configuring the process-wide bridge"));
        }
    };
    let bridge = build(&config)?;
    Ok(BRIDGE.get_or_init(|| bridge))
}

/// Configure the process-wide bridge before its first use.
pub fn install(config: BridgeConfig) -> BridgeResult<()> {
    let _init = INIT.lock();
    if BRIDGE.get().is_some() {
        return Err(Report::new(BridgeError::AlreadyConfigured));
    }

    config
        .validate()
        .map_err(|e| Report::new(BridgeError::from(e)))?;
    let bridge = build(&config)?;
    // Cannot already be set while INIT is held.
    let _ = BRIDGE.set(bridge);
    Ok(())
}

pub fn install_from_file(path: impl AsRef<Path>) -> BridgeResult<()> {
    install(BridgeConfig::load(path)?)
}

fn build(config: &BridgeConfig) -> BridgeResult<Bridge<PythonRuntime>> {
    init_logging(config.log_filter.as_deref());

    let runtime = PythonRuntime::start(config)
        .map_err(|e| Report::new(BridgeError::from(e)))
        .attach("starting the embedded interpreter")?;
    info!(
        entry = %config.entry_point(),
        runtime = runtime.name(),
        timeout_ms = ?config.timeout_ms,
        "bridge ready"
    );
    Ok(Bridge::from_config(runtime, config))
}

/// Typed call through the process-wide bridge.
pub fn call() -> BridgeResult<String> {
    let bridge = bridge()?;
    bridge
        .call()
        .map_err(|e| Report::new(BridgeError::from(e)))
}

pub fn recognize() -> BridgeResult<RecognitionReport> {
    let bridge = bridge()?;
    bridge
        .recognize()
        .map_err(|e| Report::new(BridgeError::from(e)))
}

/// Sentinel call through the process-wide bridge: the text, or `"Error"`.
pub fn invoke() -> String {
    match bridge() {
        Ok(bridge) => bridge.invoke(),
        Err(report) => {
            error!(error = ?report, "bridge unavailable");
            SENTINEL_ERROR.to_string()
        }
    }
}

/// [`invoke`] for callers that must never see an unwind.
pub fn invoke_guarded() -> String {
    catch_unwind(invoke).unwrap_or_else(|_| {
        error!("panic while invoking the bridge");
        SENTINEL_ERROR.to_string()
    })
}
