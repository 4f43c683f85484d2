//! Embedding storage system

pub mod memory;
pub mod sidecar;

pub use memory::MemoryStore;
pub use sidecar::SidecarStore;

use crate::core::{EmbeddingRecord, ImageId};
use crate::error::StorageError;

/// Cache of embeddings keyed by image id
///
/// At most one record exists per id; `upsert` replaces any previous one.
pub trait EmbeddingStore {
	fn lookup(&self, id: ImageId) -> Result<Option<EmbeddingRecord>, StorageError>;

	fn upsert(&mut self, record: EmbeddingRecord) -> Result<(), StorageError>;
}

impl<S: EmbeddingStore + ?Sized> EmbeddingStore for &mut S {
	fn lookup(&self, id: ImageId) -> Result<Option<EmbeddingRecord>, StorageError> {
		(**self).lookup(id)
	}

	fn upsert(&mut self, record: EmbeddingRecord) -> Result<(), StorageError> {
		(**self).upsert(record)
	}
}
