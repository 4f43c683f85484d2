//! In-memory store

use std::cell::Cell;
use std::collections::HashMap;

use super::EmbeddingStore;
use crate::core::{EmbeddingRecord, ImageId};
use crate::error::StorageError;

/// `HashMap`-backed store that counts how often it is touched
#[derive(Debug, Default)]
pub struct MemoryStore {
	records: HashMap<ImageId, EmbeddingRecord>,
	lookups: Cell<usize>,
	upserts: usize,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, id: ImageId) -> Option<&EmbeddingRecord> {
		self.records.get(&id)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn lookups(&self) -> usize {
		self.lookups.get()
	}

	pub fn upserts(&self) -> usize {
		self.upserts
	}
}

impl EmbeddingStore for MemoryStore {
	fn lookup(&self, id: ImageId) -> Result<Option<EmbeddingRecord>, StorageError> {
		self.lookups.set(self.lookups.get() + 1);
		Ok(self.records.get(&id).cloned())
	}

	fn upsert(&mut self, record: EmbeddingRecord) -> Result<(), StorageError> {
		self.upserts += 1;
		self.records.insert(record.id, record);
		Ok(())
	}
}
