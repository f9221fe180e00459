use std::fs;
use std::io::{self, Write};

use cloner_engine::{
    ensure_output_dir, ClipboardSink, HtmlDownload, Osc52Clipboard, PresentError,
    DEFAULT_DOWNLOAD_FILENAME,
};
use pretty_assertions::assert_eq;

#[test]
fn save_writes_file_and_leaves_no_temp_residue() {
    let temp = tempfile::TempDir::new().unwrap();
    let download = HtmlDownload::new(temp.path().to_path_buf());

    let path = download.save("<html>one</html>", "clone.html").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "<html>one</html>");
    let entries = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn save_default_uses_standard_filename() {
    let temp = tempfile::TempDir::new().unwrap();
    let download = HtmlDownload::new(temp.path().to_path_buf());

    let path = download.save_default("<html></html>").unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(DEFAULT_DOWNLOAD_FILENAME)
    );
}

#[test]
fn repeated_saves_overwrite_deterministically() {
    let temp = tempfile::TempDir::new().unwrap();
    let download = HtmlDownload::new(temp.path().to_path_buf());

    download.save("<html>one</html>", "clone.html").unwrap();
    let path = download.save("<html>two</html>", "clone.html").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "<html>two</html>");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn save_creates_missing_output_dir() {
    let temp = tempfile::TempDir::new().unwrap();
    let missing = temp.path().join("missing_output");
    let download = HtmlDownload::new(missing.clone());

    let path = download.save("<html></html>", "clone.html").unwrap();
    assert!(path.starts_with(&missing));
    assert!(path.exists());
}

#[test]
fn output_path_must_be_a_directory() {
    let temp = tempfile::TempDir::new().unwrap();
    let file_path = temp.path().join("occupied");
    fs::write(&file_path, "not a dir").unwrap();

    let err = ensure_output_dir(&file_path).unwrap_err();
    assert!(matches!(err, PresentError::OutputDir(_)), "got {err:?}");
}

#[test]
fn failed_save_releases_its_temp_handle() {
    let temp = tempfile::TempDir::new().unwrap();
    // Occupy the target name with a directory so the save cannot land.
    fs::create_dir(temp.path().join("clone.html")).unwrap();
    let download = HtmlDownload::new(temp.path().to_path_buf());

    for _ in 0..2 {
        let err = download.save("<html></html>", "clone.html").unwrap_err();
        assert!(matches!(err, PresentError::Io(_)), "got {err:?}");
        // Only the blocking directory remains; the temp file was cleaned up.
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }
}

#[test]
fn osc52_clipboard_emits_one_wrapped_sequence() {
    let mut clipboard = Osc52Clipboard::new(Vec::new());
    clipboard.set_text("hello world").unwrap();

    let written = clipboard.into_inner();
    assert_eq!(
        String::from_utf8(written).unwrap(),
        "\x1b]52;c;aGVsbG8gd29ybGQ=\x07"
    );
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn clipboard_failure_surfaces_to_the_caller() {
    let mut clipboard = Osc52Clipboard::new(BrokenPipe);
    let err = clipboard.set_text("payload").unwrap_err();
    assert!(matches!(err, PresentError::Clipboard(_)), "got {err:?}");
    assert!(err.to_string().contains("pipe closed"));
}
