//! Filename and header based metadata extraction.
//!
//! Library files are commonly named `Smith et al - 2020 - Title.pdf`;
//! this extractor reads that convention back, then peeks at the start of
//! the file for a DOI or PMID.

use super::MetadataExtractor;
use crate::core::model::ExtractedMeta;
use crate::error::ExtractError;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

const HEADER_BYTES: u64 = 64 * 1024;

struct Patterns {
    author_year_title: Regex,
    year_title: Regex,
    doi: Regex,
    pmid: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        author_year_title: Regex::new(
            r"^(?P<author>[^-]+?)(?P<etal>\s+et\s+al\.?)?\s+-\s+(?P<year>\d{4})\s+-\s+(?P<title>.+)$",
        )
        .expect("valid author pattern"),
        year_title: Regex::new(r"^(?P<year>\d{4})\s+-\s+(?P<title>.+)$")
            .expect("valid year pattern"),
        doi: Regex::new(r"(?i)\b(10\.\d{4,9}/[^\s<>\x22\)\]]+)").expect("valid DOI pattern"),
        pmid: Regex::new(r"(?i)PMID:?\s*(\d{4,9})").expect("valid PMID pattern"),
    })
}

/// Extracts metadata from the file name and the first 64 KiB of content.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameExtractor;

impl FilenameExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_stem(stem: &str, meta: &mut ExtractedMeta) {
        let stem = stem.replace('_', " ");
        let stem = stem.trim();
        let p = patterns();

        if let Some(caps) = p.year_title.captures(stem) {
            meta.year = caps["year"].parse().ok();
            meta.title = Some(caps["title"].trim().to_string());
        } else if let Some(caps) = p.author_year_title.captures(stem) {
            meta.authors = vec![caps["author"].trim().to_string()];
            meta.year = caps["year"].parse().ok();
            meta.title = Some(caps["title"].trim().to_string());
        } else if !stem.is_empty() {
            meta.title = Some(stem.to_string());
        }
    }

    fn read_header(path: &Path) -> Result<String, ExtractError> {
        let file = File::open(path).map_err(|e| ExtractError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut bytes = Vec::new();
        file.take(HEADER_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| ExtractError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl MetadataExtractor for FilenameExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedMeta, ExtractError> {
        let mut meta = ExtractedMeta::default();
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            Self::parse_stem(stem, &mut meta);
        }

        let header = Self::read_header(path)?;
        let p = patterns();

        if let Some(caps) = p.doi.captures(&header) {
            meta.doi = Some(caps[1].trim_end_matches(['.', ',', ';']).to_string());
        }
        if let Some(caps) = p.pmid.captures(&header) {
            meta.pmid = Some(caps[1].to_string());
        }

        let is_markdown = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if is_markdown {
            if let Some(heading) = header
                .lines()
                .find_map(|line| line.strip_prefix("# "))
                .map(str::trim)
                .filter(|h| !h.is_empty())
            {
                meta.title = Some(heading.to_string());
            }
        }

        Ok(meta)
    }
}
