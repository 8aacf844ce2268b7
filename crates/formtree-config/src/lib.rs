//! Formtree configuration
//!
//! Settings are read from `formtree.toml` and can be overridden with
//! `FORMTREE_*` environment variables.

use formtree_ir::{Breakpoint, Breakpoints};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Grid style used when a composite declares no layout of its own.
pub const DEFAULT_LAYOUT: &str = "grid-template-columns:1fr;grid-gap:5px 5px";

/// Name of the configuration file looked up by [`FormtreeConfig::load_or_default`].
pub const CONFIG_FILE: &str = "formtree.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FormtreeConfig {
    pub registry: RegistryConfig,
    pub layout: LayoutConfig,
    pub locale: LocaleConfig,
    pub fetch: FetchConfig,
}

/// Renderer library selection
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Library used when a form names none. Unset means the first library
    /// that was registered.
    pub default_library: Option<String>,
}

/// Responsive layout defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Thresholds applied where a composite's layout leaves a size unset.
    pub breakpoints: Breakpoints,
    pub default_grid: String,
}

/// Message catalog selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocaleConfig {
    pub language: String,
}

/// Remote document loading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Origins remote documents may be fetched from. Empty allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            breakpoints: Breakpoints::DEFAULT,
            default_grid: DEFAULT_LAYOUT.to_string(),
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            allowed_origins: Vec::new(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FormtreeConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `formtree.toml` from the current directory, or the defaults if
    /// it does not exist or cannot be parsed.
    pub fn load_or_default() -> Self {
        match Self::load_from_file(CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::default(),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid configuration");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn merge_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(library) = lookup("FORMTREE_LIBRARY") {
            self.registry.default_library = (!library.is_empty()).then_some(library);
        }
        if let Some(language) = lookup("FORMTREE_LOCALE") {
            self.locale.language = language;
        }
        if let Some(val) = lookup("FORMTREE_FETCH_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => self.fetch.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %val, "invalid FORMTREE_FETCH_TIMEOUT_SECS"),
            }
        }
        if let Some(origins) = lookup("FORMTREE_ALLOWED_ORIGINS") {
            self.fetch.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        for breakpoint in Breakpoint::SUPPORTED {
            let key = format!("FORMTREE_BREAKPOINT_{}", breakpoint.label().to_uppercase());
            if let Some(val) = lookup(&key) {
                match val.parse::<f64>() {
                    Ok(threshold) => self.layout.breakpoints.set(breakpoint, threshold),
                    Err(_) => tracing::warn!(key = %key, value = %val, "invalid breakpoint"),
                }
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from formtree.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FormtreeConfig::default();
        assert_eq!(config.registry.default_library, None);
        assert_eq!(config.layout.breakpoints, Breakpoints::DEFAULT);
        assert_eq!(config.layout.default_grid, DEFAULT_LAYOUT);
        assert_eq!(config.locale.language, "en");
        assert_eq!(config.fetch.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_toml_serialization() {
        let config = FormtreeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: FormtreeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[registry]\ndefault_library = \"material\"\n\n[layout.breakpoints]\ns = 600.0\n"
        )
        .unwrap();
        let config = FormtreeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.registry.default_library.as_deref(), Some("material"));
        assert_eq!(config.layout.breakpoints.s, Some(600.0));
        assert_eq!(config.layout.breakpoints.xs, None);
        assert_eq!(config.layout.default_grid, DEFAULT_LAYOUT);
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[registry\n").unwrap();
        let err = FormtreeConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn test_missing_file() {
        let err = FormtreeConfig::load_from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_merge_with_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FORMTREE_LIBRARY", "vaadin"),
            ("FORMTREE_LOCALE", "de"),
            ("FORMTREE_FETCH_TIMEOUT_SECS", "3"),
            ("FORMTREE_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("FORMTREE_BREAKPOINT_M", "800"),
            ("FORMTREE_BREAKPOINT_L", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = FormtreeConfig::default();
        config.merge_with(|key| vars.get(key).map(|val| val.to_string()));

        assert_eq!(config.registry.default_library.as_deref(), Some("vaadin"));
        assert_eq!(config.locale.language, "de");
        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.fetch.allowed_origins.len(), 2);
        assert_eq!(config.layout.breakpoints.m, Some(800.0));
        assert_eq!(config.layout.breakpoints.l, Some(1024.0));
    }

    #[test]
    fn test_load_or_default() {
        let config = FormtreeConfig::load_or_default();
        assert!(!config.layout.default_grid.is_empty());
    }
}
