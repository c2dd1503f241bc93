//! Locating an export on disk and deciding what layout it has.

use crate::error::{Result, SetupError};
use crate::schema::{self, REQUIRED_KEYS, VERSION_MARKERS};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Known export layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    ChatWise,
    Unknown,
}

impl ExportFormat {
    /// Inspect the top level of `root` and name the layout found there.
    pub fn detect(root: &Path) -> Self {
        if VERSION_MARKERS.iter().any(|m| root.join(m).is_file()) {
            return Self::ChatWise;
        }

        let Ok(files) = list_chat_files(root) else {
            return Self::Unknown;
        };
        match files.first() {
            Some(first) if has_chat_shape(first) => Self::ChatWise,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChatWise => write!(f, "ChatWise"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

fn has_chat_shape(path: &Path) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };
    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(map)) => REQUIRED_KEYS.iter().all(|k| map.contains_key(*k)),
        _ => false,
    }
}

/// Conversation documents directly under `root`, sorted by file name.
pub fn list_chat_files(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|source| SetupError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| schema::is_chat_file_name(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    files.sort();
    Ok(files)
}

/// An export opened for reading. When the input was an archive, the extracted
/// copy lives as long as this value.
#[derive(Debug)]
pub struct ExportSource {
    root: PathBuf,
    format: ExportFormat,
    extracted: Option<TempDir>,
}

impl ExportSource {
    /// Resolve `path` (archive or directory) to an export root and check that
    /// its layout is one we can read.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SetupError::PathNotFound(path.to_path_buf()).into());
        }

        let (root, extracted) = if path.is_dir() {
            (path.to_path_buf(), None)
        } else if is_zip(path) {
            info!(archive = %path.display(), "extracting export archive");
            let dir = extract_archive(path)?;
            (export_root(dir.path()), Some(dir))
        } else {
            return Err(SetupError::NotAnExport(path.to_path_buf()).into());
        };

        let format = ExportFormat::detect(&root);
        debug!(root = %root.display(), %format, "detected export format");
        match format {
            ExportFormat::ChatWise => Ok(Self {
                root,
                format,
                extracted,
            }),
            ExportFormat::Unknown => Err(SetupError::UnsupportedFormat(path.to_path_buf()).into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted.is_some()
    }

    pub fn chat_files(&self) -> Result<Vec<PathBuf>> {
        list_chat_files(&self.root)
    }
}

fn is_zip(path: &Path) -> bool {
    let mut head = [0u8; 8];
    let sniffed = File::open(path)
        .and_then(|mut f| f.read(&mut head))
        .map(|n| infer::archive::is_zip(&head[..n]))
        .unwrap_or(false);
    sniffed
        || path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn extract_archive(path: &Path) -> Result<TempDir> {
    let archive_err = |reason: String| SetupError::Archive {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|source| SetupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;

    // Nothing is written unless every entry stays inside the extraction root.
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| archive_err(e.to_string()))?;
        if entry.enclosed_name().is_none() {
            return Err(archive_err(format!(
                "entry escapes the extraction root: {}",
                entry.name()
            ))
            .into());
        }
    }

    let dir = tempfile::Builder::new()
        .prefix("chatwise-export-")
        .tempdir()
        .map_err(|e| archive_err(e.to_string()))?;
    archive
        .extract(dir.path())
        .map_err(|e| archive_err(e.to_string()))?;
    Ok(dir)
}

// Archives usually wrap the export in a single folder. Descend into it unless
// the conversations already sit at the top level.
fn export_root(extracted: &Path) -> PathBuf {
    if list_chat_files(extracted).is_ok_and(|f| !f.is_empty()) {
        return extracted.to_path_buf();
    }
    let subdirs: Vec<PathBuf> = fs::read_dir(extracted)
        .map(|d| {
            d.flatten()
                .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .filter(|e| e.file_name() != "__MACOSX")
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default();
    match subdirs.as_slice() {
        [only] => only.clone(),
        _ => extracted.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    const CHAT: &str = r#"{"id":"a1","title":"Hello","messages":[{"role":"user","content":"hi"}]}"#;

    #[test]
    fn detects_marker_file_in_either_spelling() {
        for marker in VERSION_MARKERS {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(marker), "1").unwrap();
            assert_eq!(ExportFormat::detect(dir.path()), ExportFormat::ChatWise);
        }
    }

    #[test]
    fn detects_chat_files_without_marker() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("chat-a1.json"), CHAT).unwrap();
        assert_eq!(ExportFormat::detect(dir.path()), ExportFormat::ChatWise);
    }

    #[test]
    fn rejects_chat_files_with_wrong_shape() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("chat-a1.json"), r#"{"id":"a1","body":"x"}"#).unwrap();
        assert_eq!(ExportFormat::detect(dir.path()), ExportFormat::Unknown);

        fs::write(dir.path().join("chat-a1.json"), "not json").unwrap();
        assert_eq!(ExportFormat::detect(dir.path()), ExportFormat::Unknown);
    }

    #[test]
    fn unrelated_directory_is_unsupported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        assert_eq!(ExportFormat::detect(dir.path()), ExportFormat::Unknown);

        let err = ExportSource::open(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Setup(SetupError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_path_is_a_setup_error() {
        let dir = tempdir().unwrap();
        let err = ExportSource::open(&dir.path().join("nope.zip")).unwrap_err();
        assert!(matches!(err, ImportError::Setup(SetupError::PathNotFound(_))));
    }

    #[test]
    fn plain_file_is_not_an_export() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("export.txt");
        fs::write(&file, "hello").unwrap();
        let err = ExportSource::open(&file).unwrap_err();
        assert!(matches!(err, ImportError::Setup(SetupError::NotAnExport(_))));
    }

    #[test]
    fn opens_zip_with_single_wrapping_folder() {
        let dir = tempdir().unwrap();
        // No .zip extension: detection goes by content.
        let archive = dir.path().join("export.bin");
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        let opts = SimpleFileOptions::default();
        zip.add_directory("ChatWise Export/", opts).unwrap();
        zip.start_file("ChatWise Export/chat-a1.json", opts).unwrap();
        zip.write_all(CHAT.as_bytes()).unwrap();
        zip.finish().unwrap();

        let source = ExportSource::open(&archive).unwrap();
        assert!(source.is_extracted());
        assert_eq!(source.format(), ExportFormat::ChatWise);
        assert!(source.root().ends_with("ChatWise Export"));
        assert_eq!(source.chat_files().unwrap().len(), 1);
    }

    #[test]
    fn archive_entries_outside_the_root_are_rejected() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("export.zip");
        let escaped = format!("escape-{}.json", std::process::id());
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        let opts = SimpleFileOptions::default();
        zip.start_file("chat-a1.json", opts).unwrap();
        zip.write_all(CHAT.as_bytes()).unwrap();
        zip.start_file(format!("../{escaped}"), opts).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.finish().unwrap();

        let err = ExportSource::open(&archive).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Setup(SetupError::Archive { .. })
        ));
        assert!(!std::env::temp_dir().join(&escaped).exists());
        assert!(!dir.path().join(&escaped).exists());
    }

    #[test]
    fn extracted_copy_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("export.zip");
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        zip.start_file("chat-a1.json", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(CHAT.as_bytes()).unwrap();
        zip.finish().unwrap();

        let source = ExportSource::open(&archive).unwrap();
        let root = source.root().to_path_buf();
        assert!(root.join("chat-a1.json").exists());
        drop(source);
        assert!(!root.exists());
    }
}
