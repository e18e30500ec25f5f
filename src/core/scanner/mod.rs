//! # Scanner Module
//!
//! Turns command-line arguments (files or folders) into candidate
//! document paths.
//!
//! ## Supported Formats
//! - PDF (.pdf)
//! - Word (.doc, .docx)
//! - PowerPoint (.ppt, .pptx)
//! - Plain text and Markdown (.txt, .md)

mod filter;
mod walker;

pub use filter::{DocumentFilter, DEFAULT_EXTENSIONS};
pub use walker::{DocumentScanner, ScanConfig};
