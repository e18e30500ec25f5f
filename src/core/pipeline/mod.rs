//! # Pipeline Module
//!
//! Stages incoming documents and commits accepted ones.
//!
//! ## Stages
//! 1. **Resolve** - hash, identifier and content-similarity fingerprinting
//! 2. **Assemble** - staging item with a suggested action and display name
//! 3. **Schedule** - bounded parallel staging, published in path order
//! 4. **Commit** - create pass, then attach pass
//!
//! ## Parallelism
//! Staging uses a rayon pool of at most four threads. Commit is sequential.

mod assembler;
mod cancel;
mod committer;
mod config;
mod executor;
mod resolver;
mod scheduler;
mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use assembler::{display_name, last_name, StagingAssembler};
pub use cancel::CancellationToken;
pub use committer::TwoPhaseCommitter;
pub use config::{default_library_root, default_parallelism, IntakeConfig, MAX_STAGING_WINDOW};
pub use executor::{IntakePipeline, IntakePipelineBuilder};
pub use resolver::FingerprintResolver;
pub use scheduler::{normalize_inputs, stage_file, StagedBatch, StagedBatches, StagingScheduler};
pub use services::Services;
