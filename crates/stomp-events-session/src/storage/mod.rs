//! Batch-file and report capability implementations.

#[cfg(feature = "fs")]
pub mod fs;
pub mod memory;

#[cfg(feature = "fs")]
pub use fs::FsStore;
pub use memory::MemoryStore;
