//! Expands file and directory arguments into candidate documents.

use super::filter::DocumentFilter;
use crate::error::IntakeError;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Configuration for the document scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Scanner implementation using the walkdir crate
pub struct DocumentScanner {
    config: ScanConfig,
    filter: DocumentFilter,
}

impl DocumentScanner {
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = DocumentFilter::new().with_hidden(config.include_hidden);
        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }
        Self { config, filter }
    }

    /// Files are kept when they pass the filter; directories are walked.
    ///
    /// Unreadable directory entries are logged and skipped. Missing inputs
    /// are passed through so the scheduler's normalization can drop them.
    pub fn expand(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>, IntakeError> {
        let mut files = Vec::new();

        for input in inputs {
            if !input.is_dir() {
                if !input.exists() || self.filter.should_include(input) {
                    files.push(input.clone());
                }
                continue;
            }

            let mut walker = WalkDir::new(input).follow_links(self.config.follow_symlinks);
            if let Some(depth) = self.config.max_depth {
                walker = walker.max_depth(depth);
            }

            let include_hidden = self.config.include_hidden;
            let entries = walker.into_iter().filter_entry(|entry| {
                include_hidden
                    || entry.depth() == 0
                    || !entry.file_name().to_string_lossy().starts_with('.')
            });

            for entry in entries {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        if self.filter.should_include(entry.path()) {
                            files.push(entry.into_path());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            path = %e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                            error = %e,
                            "Skipping unreadable directory entry"
                        );
                    }
                }
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    #[test]
    fn expands_directories_recursively() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("a.pdf")).unwrap();
        File::create(dir.path().join("sub/b.docx")).unwrap();
        File::create(dir.path().join("sub/c.jpg")).unwrap();

        let scanner = DocumentScanner::new(ScanConfig::default());
        let mut files = scanner.expand(&[dir.path().to_path_buf()]).unwrap();
        files.sort();

        assert_eq!(files, vec![dir.path().join("a.pdf"), dir.path().join("sub/b.docx")]);
    }

    #[test]
    fn skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".trash")).unwrap();
        File::create(dir.path().join(".trash/old.pdf")).unwrap();

        let scanner = DocumentScanner::new(ScanConfig::default());
        assert!(scanner.expand(&[dir.path().to_path_buf()]).unwrap().is_empty());
    }

    #[test]
    fn explicit_files_pass_the_filter() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("a.pdf");
        let jpg = dir.path().join("b.jpg");
        File::create(&pdf).unwrap();
        File::create(&jpg).unwrap();

        let scanner = DocumentScanner::new(ScanConfig::default());
        assert_eq!(scanner.expand(&[pdf.clone(), jpg]).unwrap(), vec![pdf]);
    }
}
