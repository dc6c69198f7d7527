use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Units Typst accepts for an absolute or font-relative length.
const LENGTH_UNITS: [&str; 5] = ["pt", "mm", "cm", "in", "em"];

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
    pub code: CodeConfig,
    pub page: PageConfig,
    pub separator: SeparatorConfig,
}

/// Where backing documents live and how they are named.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Directory for documents opened by name. Falls back to `~/Desktop`.
    pub directory: Option<PathBuf>,
    pub default_name: String,
    pub extension: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            directory: None,
            default_name: "notes".to_string(),
            extension: "typ".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub font: String,
    pub size: String,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            font: "Courier New".to_string(),
            size: "10pt".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PageConfig {
    pub numbers: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SeparatorConfig {
    pub enabled: bool,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// The configuration bundled at build time.
    pub fn compiled_default() -> Self {
        // build.rs rejects an invalid bundled file, so this only falls back
        // if the struct and the file drift apart.
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return the bundled defaults if the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::compiled_default());
            }
            Err(source) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|reason| Error::InvalidConfig {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Check values that are written into Typst source verbatim.
    fn validate(&self) -> std::result::Result<(), String> {
        if !is_typst_length(&self.code.size) {
            return Err(format!(
                "code.size must be a Typst length such as \"10pt\", got {:?}",
                self.code.size
            ));
        }
        Ok(())
    }
}

/// A number followed by one of [`LENGTH_UNITS`], e.g. `10pt` or `0.8em`.
fn is_typst_length(value: &str) -> bool {
    LENGTH_UNITS.iter().any(|unit| {
        value.strip_suffix(unit).is_some_and(|number| {
            number.chars().all(|c| c.is_ascii_digit() || c == '.') && number.parse::<f64>().is_ok()
        })
    })
}
