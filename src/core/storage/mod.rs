//! # Storage Module
//!
//! Copies accepted files into the library's content-addressed storage.
//!
//! ## Layout
//! ```text
//! <root>/library/<sha256><ext>       main files
//! <root>/attachments/<sha256><ext>   attachments
//! ```

mod local;
mod traits;

pub use local::LocalBlobStorage;
pub use traits::{BlobStorage, StorageArea};
