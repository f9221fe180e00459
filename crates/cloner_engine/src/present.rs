use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Filename used when the caller does not pick one.
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "cloned-website.html";

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("clipboard write failed: {0}")]
    Clipboard(String),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PresentError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PresentError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PresentError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PresentError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Saves clone output into a directory by writing a temp file then renaming.
///
/// Exactly one temp handle exists per call, scoped to the call: the rename
/// consumes it on success, the drop removes it on every failure path.
pub struct HtmlDownload {
    dir: PathBuf,
}

impl HtmlDownload {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn save_default(&self, html: &str) -> Result<PathBuf, PresentError> {
        self.save(html, DEFAULT_DOWNLOAD_FILENAME)
    }

    pub fn save(&self, html: &str, filename: &str) -> Result<PathBuf, PresentError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(html.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PresentError::Io(e.error))?;
        Ok(target)
    }
}

/// Destination for clipboard text.
pub trait ClipboardSink: Send {
    /// Copies the exact string; failures surface to the caller.
    fn set_text(&mut self, text: &str) -> Result<(), PresentError>;
}

/// OSC 52 clipboard writer: emits the escape sequence on a terminal stream
/// and leaves the actual clipboard update to the terminal host.
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl Osc52Clipboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ClipboardSink for Osc52Clipboard<W> {
    fn set_text(&mut self, text: &str) -> Result<(), PresentError> {
        let payload = STANDARD.encode(text.as_bytes());
        let sequence = format!("\x1b]52;c;{payload}\x07");
        self.out
            .write_all(sequence.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|err| PresentError::Clipboard(err.to_string()))
    }
}
