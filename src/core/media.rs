//! Media descriptors and the source they come from

use chrono::{DateTime, Utc};
use std::path::Path;

use super::ImageId;
use crate::config::IMAGE_EXTENSIONS;
use crate::error::ItemError;

/// One enumerated image, as reported by a [`MediaSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
	pub id: ImageId,
	pub last_modified: DateTime<Utc>,
	/// Album or folder the image lives in, if the source knows it
	pub container_name: Option<String>,
}

/// Supplies images to index
pub trait MediaSource {
	/// List every image in a stable order. Failure here aborts the run.
	fn enumerate(&mut self) -> anyhow::Result<Vec<ImageDescriptor>>;

	/// Read the encoded bytes of one image
	fn fetch_bytes(&self, id: ImageId) -> Result<Vec<u8>, ItemError>;
}

/// Whether a path has a known image extension
pub fn is_image(path: &Path) -> bool {
	let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
		return false;
	};
	IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

impl<M: MediaSource + ?Sized> MediaSource for &mut M {
	fn enumerate(&mut self) -> anyhow::Result<Vec<ImageDescriptor>> {
		(**self).enumerate()
	}

	fn fetch_bytes(&self, id: ImageId) -> Result<Vec<u8>, ItemError> {
		(**self).fetch_bytes(id)
	}
}
