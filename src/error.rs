//! Per-item error taxonomy
//!
//! Setup failures (enumeration, model loading) travel as `anyhow::Error`.
//! Everything that can go wrong for a single image is an [`ItemError`]: the
//! indexer records it and moves on to the next image.

use serde::Serialize;

use crate::core::ImageId;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to encode record: {0}")]
	Encode(#[from] rmp_serde::encode::Error),

	#[error("failed to decode record: {0}")]
	Decode(#[from] rmp_serde::decode::Error),

	#[error("record file holds id {found}, expected {expected}")]
	IdMismatch { expected: ImageId, found: ImageId },
}

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
	#[error("failed to read image {id}: {reason}")]
	Fetch { id: ImageId, reason: String },

	#[error("failed to decode image: {0}")]
	Decode(#[from] image::ImageError),

	#[error("inference failed: {0}")]
	Inference(String),

	#[error("embedding has zero or non-finite norm")]
	DegenerateVector,

	#[error("failed to store embedding: {0}")]
	Storage(#[from] StorageError),
}

impl ItemError {
	/// Short machine-readable kind, used in reports
	pub fn kind(&self) -> ItemErrorKind {
		match self {
			ItemError::Fetch { .. } => ItemErrorKind::Fetch,
			ItemError::Decode(_) => ItemErrorKind::Decode,
			ItemError::Inference(_) => ItemErrorKind::Inference,
			ItemError::DegenerateVector => ItemErrorKind::DegenerateVector,
			ItemError::Storage(_) => ItemErrorKind::Storage,
		}
	}
}

impl From<ort::Error> for ItemError {
	fn from(e: ort::Error) -> Self {
		ItemError::Inference(e.to_string())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorKind {
	Fetch,
	Decode,
	Inference,
	DegenerateVector,
	Storage,
}
