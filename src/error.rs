use std::path::PathBuf;

/// Failures outside the converter itself, which never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file at {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error("Typst compilation failed: {0}")]
    Compile(String),

    #[error("PDF generation failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, Error>;
