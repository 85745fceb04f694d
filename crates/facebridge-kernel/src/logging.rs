//! Diagnostic sink setup.
//!
//! The bridge reports through `tracing`. Hosts that do not install their
//! own subscriber can call [`init_logging`] to get a stderr fmt layer.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "facebridge_kernel=info,facebridge_ffi=info";

/// Install a global fmt subscriber writing to stderr.
///
/// The filter is `directive` when given, else `RUST_LOG`, else
/// [`DEFAULT_FILTER`]. Returns `false` when a global subscriber was already
/// installed, which is not an error.
pub fn init_logging(directive: Option<&str>) -> bool {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
