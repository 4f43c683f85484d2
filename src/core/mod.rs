//! Core domain types

pub mod embedding;
pub mod id;
pub mod media;
pub mod record;

pub use embedding::Embedding;
pub use id::ImageId;
pub use media::{ImageDescriptor, MediaSource};
pub use record::EmbeddingRecord;
