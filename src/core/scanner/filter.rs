//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Extensions accepted by default
pub const DEFAULT_EXTENSIONS: [&str; 7] = ["pdf", "doc", "docx", "ppt", "pptx", "txt", "md"];

/// Decides whether a file is a document the pipeline accepts
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    /// Lowercase extensions without the dot
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl DocumentFilter {
    /// Accepts `.pdf .doc .docx .ppt .pptx .txt .md`
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the accepted extensions; a leading dot is ignored
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                return false;
            }
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_documents() {
        let filter = DocumentFilter::new();
        assert!(filter.should_include(Path::new("/lib/paper.pdf")));
        assert!(filter.should_include(Path::new("/lib/Report.DOCX")));
        assert!(filter.should_include(Path::new("/lib/slides.pptx")));
        assert!(filter.should_include(Path::new("/lib/notes.md")));
    }

    #[test]
    fn filter_excludes_other_files() {
        let filter = DocumentFilter::new();
        assert!(!filter.should_include(Path::new("/lib/photo.jpg")));
        assert!(!filter.should_include(Path::new("/lib/archive.zip")));
        assert!(!filter.should_include(Path::new("/lib/no_extension")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = DocumentFilter::new();
        assert!(!filter.should_include(Path::new("/lib/.~lock.paper.pdf")));
        assert!(filter.with_hidden(true).should_include(Path::new("/lib/.hidden.pdf")));
    }

    #[test]
    fn custom_extensions_ignore_leading_dot() {
        let filter = DocumentFilter::new().with_extensions([".PDF", "epub"]);
        assert!(filter.should_include(Path::new("/lib/a.pdf")));
        assert!(filter.should_include(Path::new("/lib/b.epub")));
        assert!(!filter.should_include(Path::new("/lib/c.docx")));
    }
}
