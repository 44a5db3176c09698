//! Ready-made storage collaborators.
//!
//! - [`MemoryStore`], [`MemoryStorage`] - in-memory file store and durable storage
//! - [`DirStore`] - file store over a directory

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::{MemoryStorage, MemoryStore};
