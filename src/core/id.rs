//! Stable image identity

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Identity of one image in a media source, stable across runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl ImageId {
	/// Derive an id from a library-relative key (e.g. a `/`-separated path)
	pub fn from_key(key: &str) -> Self {
		Self(xxh3_64(key.as_bytes()))
	}

	/// Fixed-width hex form, used for file names
	pub fn hex(self) -> String {
		format!("{:016x}", self.0)
	}

	pub fn from_hex(s: &str) -> Option<Self> {
		if s.len() != 16 {
			return None;
		}
		u64::from_str_radix(s, 16).ok().map(Self)
	}
}

impl std::fmt::Display for ImageId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}
