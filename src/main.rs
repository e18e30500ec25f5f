//! # doc-intake CLI
//!
//! Command-line interface for the document intake pipeline.
//!
//! ## Usage
//! ```bash
//! doc-intake stage ~/Downloads/papers
//! doc-intake import ~/Downloads/papers --library ~/Library/Papers
//! doc-intake import paper.pdf --output json --dry-run
//! ```

mod cli;

use document_intake::Result;

fn main() -> Result<()> {
    cli::run()
}
