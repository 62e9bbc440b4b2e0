//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `DC_*`
//! environment variables, and merging them with proper precedence rules.
//! Turning the merged values into a [`CheckConfig`](crate::CheckConfig) is
//! left to the caller, which also knows about command-line flags.

use crate::error::DoiCheckError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// concurrency = 10
/// timeout = "10s"
/// retries = 3
/// retry_delay = "2s"
///
/// [endpoints]
/// mailto = "metadata@example.org"
///
/// [output]
/// file = "resolved_urls_crossref.csv"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Registry / resolver endpoints and contact details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<EndpointsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default run settings that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Concurrent resolution checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-attempt timeout (e.g. "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Retries after a transport failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Pause between attempts (e.g. "2s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<String>,

    /// Rows per registry page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    /// Pause between registry pages (e.g. "1s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_delay: Option<String>,
}

/// Service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndpointsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver_url: Option<String>,

    /// Contact address for the Crossref polite pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Save the CSV report to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Pretty terminal output by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,

    /// Only list failed DOIs in terminal output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures_only: Option<bool>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DoiCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DoiCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DoiCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DoiCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;
        debug!(path = %path.display(), "loaded configuration file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory file, then a file in
    /// the current directory.
    pub fn discover_and_load(&self) -> Result<FileConfig, DoiCheckError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring configuration file");
                }
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            eprintln!("⚠️  Multiple config files found. Later files override earlier ones:");
            for path in &loaded_files {
                eprintln!("   {}", path.display());
            }
        }

        Ok(merged_config)
    }

    /// Config file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./doi-check.toml", "./.doi-check.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Config file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".doi-check.toml", "doi-check.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Config file under the XDG config directory.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("doi-check").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    concurrency: higher.concurrency.or(lower.concurrency),
                    timeout: higher.timeout.or(lower.timeout),
                    retries: higher.retries.or(lower.retries),
                    retry_delay: higher.retry_delay.or(lower.retry_delay),
                    page_size: higher.page_size.or(lower.page_size),
                    page_delay: higher.page_delay.or(lower.page_delay),
                }),
                (lower, higher) => higher.or(lower),
            },
            endpoints: match (lower.endpoints, higher.endpoints) {
                (Some(lower), Some(higher)) => Some(EndpointsConfig {
                    registry_url: higher.registry_url.or(lower.registry_url),
                    resolver_url: higher.resolver_url.or(lower.resolver_url),
                    mailto: higher.mailto.or(lower.mailto),
                }),
                (lower, higher) => higher.or(lower),
            },
            output: match (lower.output, higher.output) {
                (Some(lower), Some(higher)) => Some(OutputConfig {
                    file: higher.file.or(lower.file),
                    pretty: higher.pretty.or(lower.pretty),
                    failures_only: higher.failures_only.or(lower.failures_only),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DoiCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(DoiCheckError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            if defaults.page_size == Some(0) {
                return Err(DoiCheckError::config("page_size must be at least 1"));
            }

            for (name, value) in [
                ("timeout", &defaults.timeout),
                ("retry_delay", &defaults.retry_delay),
                ("page_delay", &defaults.page_delay),
            ] {
                if let Some(value) = value {
                    if parse_duration_string(value).is_none() {
                        return Err(DoiCheckError::config(format!(
                            "Invalid {} '{}'. Use a format like '500ms', '5s', '2m'",
                            name, value
                        )));
                    }
                }
            }
        }

        if let Some(endpoints) = &config.endpoints {
            for url in [&endpoints.registry_url, &endpoints.resolver_url]
                .into_iter()
                .flatten()
            {
                validate_endpoint_url(url)?;
            }
        }

        Ok(())
    }
}

/// Reject endpoint URLs that are not plain http(s).
pub fn validate_endpoint_url(url: &str) -> Result<(), DoiCheckError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(DoiCheckError::config(format!(
            "Endpoint '{}' must start with http:// or https://",
            url
        )))
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub mailto: Option<String>,
    pub registry_url: Option<String>,
    pub resolver_url: Option<String>,
    pub output: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from `DC_*` environment variables.
///
/// Invalid values are logged and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`] over an arbitrary variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(val) = non_empty("DC_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
                debug!(concurrency, "using DC_CONCURRENCY");
            }
            _ => warn!(value = %val, "invalid DC_CONCURRENCY, must be 1-100"),
        }
    }

    if let Some(val) = non_empty("DC_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => warn!(value = %val, "invalid DC_TIMEOUT, use a format like '10s'"),
        }
    }

    if let Some(val) = non_empty("DC_RETRIES") {
        match val.trim().parse::<u32>() {
            Ok(retries) => env_config.retries = Some(retries),
            Err(_) => warn!(value = %val, "invalid DC_RETRIES, must be a whole number"),
        }
    }

    if let Some(val) = non_empty("DC_RETRY_DELAY") {
        match parse_duration_string(&val) {
            Some(delay) => env_config.retry_delay = Some(delay),
            None => warn!(value = %val, "invalid DC_RETRY_DELAY, use a format like '2s'"),
        }
    }

    for (key, slot) in [
        ("DC_REGISTRY_URL", &mut env_config.registry_url),
        ("DC_RESOLVER_URL", &mut env_config.resolver_url),
    ] {
        if let Some(url) = non_empty(key) {
            match validate_endpoint_url(&url) {
                Ok(()) => *slot = Some(url),
                Err(e) => warn!(key, error = %e, "ignoring endpoint override"),
            }
        }
    }

    env_config.mailto = non_empty("DC_MAILTO");
    env_config.output = non_empty("DC_OUTPUT");
    env_config.config = non_empty("DC_CONFIG");

    env_config
}

/// Parse a duration like "500ms", "5s", "2m", or bare seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        // Assume seconds if no unit
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}
