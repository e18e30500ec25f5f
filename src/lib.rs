//! # Document Intake
//!
//! Content-addressed document intake with explainable deduplication.
//!
//! ## Core Philosophy
//! - **Stage before writing** - staging never touches the library
//! - **Explain every match** - hash, identifier or similarity score
//! - **One bad file never sinks a batch** - only cancellation stops a run
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Fingerprinting, staging and commit
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{IntakeError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides `default_level`. Logs go to stderr so stdout stays clean
/// for JSON output.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
