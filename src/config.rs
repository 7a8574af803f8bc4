//! Dashboard configuration.
//!
//! Values come from, in increasing priority: built-in defaults, a TOML file
//! (`--config FILE`, or `sales-dash.toml` in the working directory), and
//! `SALES_DASH_*` environment variables. The data path given on the command
//! line is applied last by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::LoadOptions;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "sales-dash.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Sales table opened at startup.
    pub data_path: PathBuf,
    pub loader: LoaderConfig,
    pub window: WindowConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Extra chrono formats for the `Date` column.
    pub date_formats: Vec<String>,
    /// CSV field separator (single ASCII character).
    pub csv_delimiter: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_symbol: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("sales_data.csv"),
            loader: LoaderConfig::default(),
            window: WindowConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            date_formats: Vec::new(),
            csv_delimiter: ',',
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 860.0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve configuration from every source.
    ///
    /// An explicit path must exist; the implicit `sales-dash.toml` is
    /// optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.exists() {
                    Self::load_from_file(implicit)?
                } else {
                    Self::default()
                }
            }
        };
        config.merge_env_with_reader(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `SALES_DASH_*` overrides read through `env_reader`.
    pub fn merge_env_with_reader<F>(&mut self, env_reader: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // SALES_DASH_DATA
        if let Some(val) = env_reader("SALES_DASH_DATA") {
            if !val.trim().is_empty() {
                self.data_path = PathBuf::from(val);
            }
        }

        // SALES_DASH_DATE_FORMATS
        if let Some(val) = env_reader("SALES_DASH_DATE_FORMATS") {
            self.loader.date_formats = val
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.loader.csv_delimiter.is_ascii() {
            return Err(ConfigError::Invalid {
                key: "loader.csv_delimiter",
                message: format!("{:?} is not an ASCII character", self.loader.csv_delimiter),
            });
        }
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "window",
                message: "width and height must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            date_formats: self.loader.date_formats.clone(),
            csv_delimiter: self.loader.csv_delimiter as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.data_path, PathBuf::from("sales_data.csv"));
        assert_eq!(config.loader.csv_delimiter, ',');
        assert_eq!(config.display.currency_symbol, "$");
        assert_eq!(config.load_options(), LoadOptions::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.toml");
        fs::write(
            &path,
            r#"
data_path = "exports/q1.csv"

[loader]
csv_delimiter = ";"
date_formats = ["%d/%m/%Y"]
"#,
        )
        .unwrap();

        let config = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.data_path, PathBuf::from("exports/q1.csv"));
        assert_eq!(config.load_options().csv_delimiter, b';');
        assert_eq!(config.loader.date_formats, vec!["%d/%m/%Y"]);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardConfig::load(Some(&dir.path().join("none.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn bad_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.toml");
        fs::write(&path, "data_path = [").unwrap();
        assert!(matches!(
            DashboardConfig::load_from_file(&path),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SALES_DASH_DATA", "/srv/sales.parquet"),
            ("SALES_DASH_DATE_FORMATS", "%d.%m.%Y, %m/%d/%Y"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        config.merge_env_with_reader(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.data_path, PathBuf::from("/srv/sales.parquet"));
        assert_eq!(config.loader.date_formats, vec!["%d.%m.%Y", "%m/%d/%Y"]);
    }

    #[test]
    fn non_ascii_delimiter_rejected() {
        let mut config = DashboardConfig::default();
        config.loader.csv_delimiter = '§';
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "loader.csv_delimiter", .. })
        ));
    }
}
