//! Configuration and logging setup for the virtual-scope analysis.
//!
//! Every field has a default, so an empty TOML document (or no file at all) is a valid
//! configuration.

use std::path::Path;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

/// Descriptor of the universal root used when no configuration overrides it.
pub const DEFAULT_ROOT_DESCRIPTOR: &str = "Ljava/lang/Object;";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VscopeConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Type descriptor of the universal root of the class hierarchy.
    #[serde(default = "AnalysisConfig::default_root")]
    pub root: String,

    /// Assemble signature buckets on the rayon thread pool.
    ///
    /// Buckets are independent, so the result is identical to a sequential build.
    #[serde(default)]
    pub parallel: bool,
}

impl AnalysisConfig {
    fn default_root() -> String {
        DEFAULT_ROOT_DESCRIPTOR.to_owned()
    }

    /// Returns the configured root descriptor, falling back to [`DEFAULT_ROOT_DESCRIPTOR`]
    /// when the configured value is not a class type descriptor.
    pub fn root_descriptor(&self) -> &str {
        if vscope_classfile::is_class_descriptor(&self.root) {
            &self.root
        } else {
            tracing::warn!(
                target: "vscope.config",
                root = %self.root,
                "configured root is not a class type descriptor; using {DEFAULT_ROOT_DESCRIPTOR}"
            );
            DEFAULT_ROOT_DESCRIPTOR
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            parallel: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directives, e.g. `info` or `warn,vscope.graph=debug`.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr. When disabled, events are filtered but discarded.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// Build the filter for this config. `RUST_LOG` directives are appended to the configured
    /// ones so they can refine a target without replacing the baseline.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_filter = || {
            tracing_subscriber::EnvFilter::try_new(self.level.trim())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(Self::default_level()))
        };

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{},{env_directives}", self.level.trim());
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| config_filter())
            }
            None => config_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message only; the default `Display` embeds a source snippet.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl VscopeConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file from TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber described by `logging`.
///
/// Only the first call has an effect; later calls (and calls made after another subscriber was
/// installed elsewhere) are ignored.
pub fn init_tracing(logging: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = logging.env_filter();

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = match (logging.stderr, logging.json) {
            (false, _) => tracing_subscriber::layer::Identity::new().boxed(),
            (true, true) => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed(),
            (true, false) => tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed(),
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!(
                target: "vscope.config",
                level = %logging.level,
                json = logging.json,
                "tracing initialised"
            );
        }
    });
}
