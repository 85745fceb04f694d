//! Bridge Configuration
//!
//! [`BridgeConfig`] names the module and function the bridge calls, plus the
//! handful of knobs around that call. Every field has a default, so an empty
//! file (or no file at all) reproduces the fixed `face_recognition.main()`
//! call shape.
//!
//! ## Sources
//!
//! - A file in any format the `config` crate reads, detected from the file
//!   extension (YAML, TOML, JSON, INI, RON, JSON5)
//! - Environment variable substitution inside the file (`${VAR}` and `$VAR`)
//! - `FACEBRIDGE_*` environment overrides, `__` for nesting

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use config::{Config as Cfg, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::runtime::EntryPoint;


/// Prefix for environment overrides, e.g. `FACEBRIDGE_MODULE`.
pub const ENV_PREFIX: &str = "FACEBRIDGE";

/// Environment variable naming a config file for the process-wide bridge.
pub const CONFIG_PATH_ENV: &str = "FACEBRIDGE_CONFIG";

pub const DEFAULT_MODULE: &str = "face_recognition";
pub const DEFAULT_FUNCTION: &str = "main";

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());
static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").unwrap());
static MODULE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for one bridge instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Dotted module name to import.
    pub module: String,
    /// Zero-argument attribute of `module` to call.
    pub function: String,
    /// Directories prepended to the interpreter's module search path.
    pub python_paths: Vec<PathBuf>,
    /// Deadline for one call. `None` blocks until the routine returns.
    pub timeout_ms: Option<u64>,
    /// Print interpreter errors (with traceback) to stderr in addition to
    /// the tracing diagnostics.
    pub print_python_errors: bool,
    /// Filter directive handed to [`crate::logging::init_logging`].
    pub log_filter: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module: DEFAULT_MODULE.to_string(),
            function: DEFAULT_FUNCTION.to_string(),
            python_paths: Vec::new(),
            timeout_ms: None,
            print_python_errors: true,
            log_filter: None,
        }
    }
}

impl BridgeConfig {
    /// Load from a file, apply `FACEBRIDGE_*` overrides, then validate.
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let config: Self = load_with_env(path, ENV_PREFIX)
            .map_err(|e| Report::new(BridgeError::from(e)))
            .attach(format!("loading bridge config from {}", path.display()))?;
        config.validate().map_err(|e| Report::new(BridgeError::from(e)))?;
        Ok(config)
    }

    /// Defaults overridden by `FACEBRIDGE_*` environment variables.
    ///
    /// `FACEBRIDGE_PYTHON_PATHS` is split on `:`.
    pub fn from_env() -> BridgeResult<Self> {
        let config: Self = Cfg::builder()
            .add_source(env_source(ENV_PREFIX))
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .and_then(|cfg| {
                cfg.try_deserialize()
                    .map_err(|e| ConfigError::Serialization(e.to_string()))
            })
            .map_err(|e| Report::new(BridgeError::from(e)))
            .attach("reading FACEBRIDGE_* environment overrides")?;
        config.validate().map_err(|e| Report::new(BridgeError::from(e)))?;
        Ok(config)
    }

    /// The file named by `FACEBRIDGE_CONFIG` when set, otherwise
    /// [`BridgeConfig::from_env`].
    pub fn discover() -> BridgeResult<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => Self::from_env(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !MODULE_NAME.is_match(&self.module) {
            return Err(ConfigError::Invalid {
                field: "module",
                reason: format!("`{}` is not a dotted module name", self.module),
            });
        }
        if !IDENTIFIER.is_match(&self.function) {
            return Err(ConfigError::Invalid {
                field: "function",
                reason: format!("`{}` is not an identifier", self.function),
            });
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn entry_point(&self) -> EntryPoint {
        EntryPoint::new(self.module.clone(), self.function.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn with_python_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.python_paths.push(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn with_print_python_errors(mut self, enabled: bool) -> Self {
        self.print_python_errors = enabled;
        self
    }
}

fn env_source(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(":")
        .with_list_parse_key("python_paths")
}

/// Detect configuration format from file extension
///
/// # Supported Extensions
///
/// - YAML: `.yaml`, `.yml`
/// - TOML: `.toml`
/// - JSON: `.json`
/// - INI: `.ini`
/// - RON: `.ron`
/// - JSON5: `.json5`
pub fn detect_format(path: impl AsRef<Path>) -> ConfigResult<FileFormat> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// Supports `${VAR_NAME}` and `$VAR_NAME`. Unset variables are left as
/// written.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Load configuration from a file
///
/// ```rust,ignore
/// use facebridge_kernel::config::load_config;
///
/// let config: BridgeConfig = load_config("facebridge.toml")?;
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(&path)?;
    let content = std::fs::read_to_string(path)?;
    from_str(&content, format)
}

/// Load configuration from a string with explicit format
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content);

    let config = Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration with environment variable overrides
///
/// Environment variables are prefixed with `env_prefix` and use `__` for
/// nesting; for `BridgeConfig` the module override is `FACEBRIDGE_MODULE`.
pub fn load_with_env<T>(path: impl AsRef<Path>, env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(&path)?;
    let content = std::fs::read_to_string(path)?;
    let substituted = substitute_env_vars(&content);

    let config = Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .add_source(env_source(env_prefix))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}
