use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser;
use crate::typst;

/// Whether opening a document found an existing file or created one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Created,
    Existing,
}

/// What one append wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReport {
    pub path: PathBuf,
    /// Blocks segmented from the appended content, separator excluded.
    pub blocks: usize,
    pub separator: bool,
}

/// The backing Typst document that converted content is appended to.
///
/// A session is an explicit value rather than process-wide state, so
/// independent sessions never interfere. Appends to one file assume a single
/// writer at a time.
#[derive(Debug, Clone)]
pub struct DocumentSession {
    path: PathBuf,
    settings: DocumentSettings,
}

/// The parts of [`Config`] a session needs after it is opened.
#[derive(Debug, Clone)]
struct DocumentSettings {
    preamble: String,
    separator: bool,
}

impl DocumentSession {
    /// Open the document `name` in `dir`, creating it if needed.
    ///
    /// The configured extension is appended unless `name` already ends with
    /// it. Without `dir` the configured directory is used, then `~/Desktop`.
    pub fn set_document(
        name: &str,
        dir: Option<&Path>,
        config: &Config,
    ) -> Result<(Self, DocumentStatus)> {
        let path = resolve_path(name, dir, config)?;
        Self::open(path, config)
    }

    /// Open the configured default document.
    pub fn open_default(config: &Config) -> Result<(Self, DocumentStatus)> {
        Self::set_document(&config.document.default_name, None, config)
    }

    /// Open the document at exactly `path`, creating it if needed.
    pub fn open(path: PathBuf, config: &Config) -> Result<(Self, DocumentStatus)> {
        let session = Self {
            path,
            settings: DocumentSettings {
                preamble: typst::preamble(config),
                separator: config.separator.enabled,
            },
        };

        if let Some(parent) = session.path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }

        let status = if session.path.exists() {
            tracing::debug!(path = %session.path.display(), "found document");
            DocumentStatus::Existing
        } else {
            fs::write(&session.path, &session.settings.preamble)
                .map_err(|source| io_error(&session.path, source))?;
            tracing::info!(path = %session.path.display(), "created document");
            DocumentStatus::Created
        };

        Ok((session, status))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Segment `content`, render it and append it to the document.
    ///
    /// A separator goes first when the document already has body content.
    /// Content with no blocks leaves the document untouched.
    pub fn load_content(&self, content: &str) -> Result<AppendReport> {
        let (existing, recreate) = match fs::read_to_string(&self.path) {
            Ok(existing) => (existing, false),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "document disappeared, recreating");
                (self.settings.preamble.clone(), true)
            }
            Err(source) => return Err(io_error(&self.path, source)),
        };

        let blocks = parser::segment(content);
        if blocks.is_empty() {
            tracing::debug!(path = %self.path.display(), "nothing to append");
            return Ok(AppendReport {
                path: self.path.clone(),
                blocks: 0,
                separator: false,
            });
        }

        let separator = self.settings.separator && has_body(&existing);
        let mut rendered = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            rendered.push('\n');
        }
        if separator {
            rendered.push_str(&typst::blocks_to_typst(&[Block::Separator]));
        }
        rendered.push_str(&typst::blocks_to_typst(&blocks));

        if recreate {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
            }
            fs::write(&self.path, existing + &rendered)
                .map_err(|source| io_error(&self.path, source))?;
        } else {
            append(&self.path, &rendered)?;
        }

        tracing::info!(
            path = %self.path.display(),
            blocks = blocks.len(),
            separator,
            "appended content"
        );

        Ok(AppendReport {
            path: self.path.clone(),
            blocks: blocks.len(),
            separator,
        })
    }

    /// Compile the whole document to PDF, by default next to the document.
    pub fn export_pdf(&self, output: Option<&Path>) -> Result<PathBuf> {
        let source =
            fs::read_to_string(&self.path).map_err(|source| io_error(&self.path, source))?;
        let pdf = crate::typst_to_pdf(source)?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.path.with_extension("pdf"));
        fs::write(&output, pdf).map_err(|source| io_error(&output, source))?;

        tracing::info!(path = %output.display(), "exported pdf");
        Ok(output)
    }
}

fn resolve_path(name: &str, dir: Option<&Path>, config: &Config) -> Result<PathBuf> {
    let suffix = format!(".{}", config.document.extension);
    let file_name = if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    };

    let dir = match dir.or(config.document.directory.as_deref()) {
        Some(dir) => dir.to_path_buf(),
        None => dirs::home_dir().ok_or(Error::NoHomeDir)?.join("Desktop"),
    };

    Ok(dir.join(file_name))
}

/// Whether the document holds anything besides blank lines and header rules.
fn has_body(document: &str) -> bool {
    document.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("#set ") && !line.starts_with("#show ")
    })
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| io_error(path, source))?;
    file.write_all(text.as_bytes())
        .map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}
