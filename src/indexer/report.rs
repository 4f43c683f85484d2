//! What an indexing run produced

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::core::{Embedding, ImageId};
use crate::error::ItemError;

/// Resolved images of one run, as two parallel sequences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexRunResult {
	pub ids: Vec<ImageId>,
	pub vectors: Vec<Embedding>,
}

impl IndexRunResult {
	pub(crate) fn push(&mut self, id: ImageId, vector: Embedding) {
		self.ids.push(id);
		self.vectors.push(vector);
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (ImageId, &Embedding)> {
		self.ids.iter().copied().zip(self.vectors.iter())
	}
}

/// An image the run gave up on, and why
#[derive(Debug)]
pub struct SkippedItem {
	pub id: ImageId,
	pub error: ItemError,
}

impl Serialize for SkippedItem {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut item = serializer.serialize_struct("SkippedItem", 3)?;
		item.serialize_field("id", &self.id)?;
		item.serialize_field("kind", &self.error.kind())?;
		item.serialize_field("error", &self.error.to_string())?;
		item.end()
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
	/// Descriptors reported by the media source
	pub total: usize,
	/// Served from the store without inference
	pub cached: usize,
	/// Freshly embedded and written
	pub embedded: usize,
	/// Dropped by the container filter
	pub excluded: usize,
	/// Repeated ids within the enumeration
	pub duplicates: usize,
	/// Recorded in `skipped`
	pub failed: usize,
}

impl RunStats {
	pub fn resolved(&self) -> usize {
		self.cached + self.embedded
	}
}

/// Outcome of one run; serializes without the vectors
#[derive(Debug, Default, Serialize)]
pub struct IndexReport {
	#[serde(skip)]
	pub result: IndexRunResult,
	pub skipped: Vec<SkippedItem>,
	pub stats: RunStats,
	/// The run stopped early on a cancel request
	pub cancelled: bool,
	/// Whether the inference engine had to be opened
	pub engine_opened: bool,
	pub elapsed_secs: f32,
}
