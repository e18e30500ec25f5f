//! # Store Module
//!
//! Durable library records queried during staging and written at commit.
//!
//! ## Backends
//! - `SqliteEntryStore` - persistent storage using SQLite
//! - `InMemoryEntryStore` - for tests and dry runs

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryEntryStore;
pub use sqlite::SqliteEntryStore;
pub use traits::{EntryIter, EntryStore};
