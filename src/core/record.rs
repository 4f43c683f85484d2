//! Persisted embedding record

use chrono::{DateTime, Utc};

use super::{Embedding, ImageId};

/// One cached embedding, keyed by image id
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
	pub id: ImageId,
	pub last_modified: DateTime<Utc>,
	pub vector: Embedding,
}

impl EmbeddingRecord {
	pub fn new(id: ImageId, last_modified: DateTime<Utc>, vector: Embedding) -> Self {
		Self { id, last_modified, vector }
	}
}
