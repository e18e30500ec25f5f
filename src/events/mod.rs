//! # Events Module
//!
//! Progress reporting for staging and commit.
//!
//! The core emits events through a channel so any front end (CLI, GUI,
//! tests) can follow along without the pipeline knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Stage(StageEvent::FileStaged { path, action, .. }) = event {
//!             println!("{} -> {}", path.display(), action);
//!         }
//!     }
//! });
//!
//! let pipeline = IntakePipeline::builder().events(sender)/* ... */.build()?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
