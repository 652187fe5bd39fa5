//! Document loading.
//!
//! Plain text and markdown are read as-is; anything else is a configuration
//! error surfaced before chunking starts. Richer extraction (PDF and
//! friends) belongs to an external collaborator, not this crate.

use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};

const SUPPORTED_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Read a document's text content from disk.
pub fn load_document(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension) {
        return Err(RagError::UnsupportedFormat(path.display().to_string()));
    }

    Ok(std::fs::read_to_string(path)?)
}

/// Collect the ingestable files in a folder, in name order.
pub fn list_corpus_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| SUPPORTED_EXTENSIONS.contains(&e))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_text_and_markdown() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("a.txt");
        let md = dir.path().join("b.md");
        fs::write(&txt, "plain content").unwrap();
        fs::write(&md, "# heading\nbody").unwrap();

        assert_eq!(load_document(&txt).unwrap(), "plain content");
        assert_eq!(load_document(&md).unwrap(), "# heading\nbody");
    }

    #[test]
    fn test_unsupported_format_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("c.pdf");
        fs::write(&pdf, "%PDF-").unwrap();

        let result = load_document(&pdf);
        assert!(matches!(result, Err(RagError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_list_corpus_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.md"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("skip.pdf"), "x").unwrap();

        let files = list_corpus_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.md"]);
    }
}
