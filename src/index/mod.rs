pub mod build;
pub mod stats;
pub mod store;
pub mod types;

pub use build::{IndexOptions, IndexOutcome, Indexer};
pub use store::{IndexStore, StoreLock, remove_store, store_path};
pub use types::*;
