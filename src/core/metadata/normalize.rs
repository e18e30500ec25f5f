//! Identifier normalizers.

use super::IdentifierNormalizer;
use regex::Regex;
use std::sync::OnceLock;

fn trimmed(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Pass-through normalizer: trims whitespace, treats empty as absent.
///
/// Used when no normalizer is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimNormalizer;

impl IdentifierNormalizer for TrimNormalizer {
    fn normalize_doi(&self, raw: &str) -> Option<String> {
        trimmed(raw)
    }

    fn normalize_pmid(&self, raw: &str) -> Option<String> {
        trimmed(raw)
    }
}

fn doi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^10\.\d{4,9}/\S+$").expect("valid DOI regex"))
}

/// Canonical DOI / PMID forms.
///
/// - DOI: strips resolver URLs and `doi:` prefixes, lowercases, requires `10.NNNN/suffix`
/// - PMID: strips a `PMID:` prefix, requires digits only
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormalizer;

impl IdentifierNormalizer for StandardNormalizer {
    fn normalize_doi(&self, raw: &str) -> Option<String> {
        let lowered = raw.trim().to_lowercase();
        let mut value = lowered.as_str();
        for prefix in [
            "https://doi.org/",
            "http://doi.org/",
            "https://dx.doi.org/",
            "http://dx.doi.org/",
            "doi.org/",
            "doi:",
        ] {
            if let Some(rest) = value.strip_prefix(prefix) {
                value = rest.trim_start();
                break;
            }
        }
        let value = value.trim_end_matches(['.', ',', ';', ')']);
        doi_pattern().is_match(value).then(|| value.to_string())
    }

    fn normalize_pmid(&self, raw: &str) -> Option<String> {
        let value = raw.trim();
        let value = value
            .strip_prefix("PMID:")
            .or_else(|| value.strip_prefix("pmid:"))
            .unwrap_or(value)
            .trim();
        (!value.is_empty() && value.chars().all(|c| c.is_ascii_digit())).then(|| value.to_string())
    }
}
