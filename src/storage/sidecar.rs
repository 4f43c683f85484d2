//! Sidecar file format and I/O
//!
//! One msgpack file per image under `<library>/.glimpse/<id>.msgpack`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::EmbeddingStore;
use crate::config::{STORE_DIR, STORE_EXT};
use crate::core::{Embedding, EmbeddingRecord, ImageId};
use crate::error::StorageError;
use crate::ui;

/// Bumped whenever the on-disk layout or the embedding model changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
	version: u32,
	id: ImageId,
	last_modified: DateTime<Utc>,
	embedding: Vec<f32>,
}

impl Sidecar {
	fn from_record(record: EmbeddingRecord) -> Self {
		Self {
			version: FORMAT_VERSION,
			id: record.id,
			last_modified: record.last_modified,
			embedding: record.vector.into_vec(),
		}
	}

	fn into_record(self) -> EmbeddingRecord {
		EmbeddingRecord::new(self.id, self.last_modified, Embedding::raw(self.embedding))
	}
}

/// Persistent store of msgpack sidecars
#[derive(Debug, Clone)]
pub struct SidecarStore {
	dir: PathBuf,
}

impl SidecarStore {
	/// Store living inside a library directory
	pub fn for_library(library_root: &Path) -> Self {
		Self::at(library_root.join(STORE_DIR))
	}

	/// Store rooted at an explicit directory
	pub fn at(dir: PathBuf) -> Self {
		Self { dir }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Build sidecar path from id
	pub fn path_for(&self, id: ImageId) -> PathBuf {
		self.dir.join(format!("{}.{}", id.hex(), STORE_EXT))
	}

	/// Every id that currently has a sidecar
	pub fn ids(&self) -> Result<Vec<ImageId>, StorageError> {
		let entries = match fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(e.into()),
		};

		let mut ids = Vec::new();
		for entry in entries {
			let path = entry?.path();
			if path.extension().and_then(|s| s.to_str()) != Some(STORE_EXT) {
				continue;
			}
			if let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(ImageId::from_hex) {
				ids.push(id);
			}
		}
		ids.sort();
		Ok(ids)
	}

	/// Delete one sidecar; returns whether it existed
	pub fn remove(&self, id: ImageId) -> Result<bool, StorageError> {
		match fs::remove_file(self.path_for(id)) {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
			Err(e) => Err(e.into()),
		}
	}
}

impl EmbeddingStore for SidecarStore {
	fn lookup(&self, id: ImageId) -> Result<Option<EmbeddingRecord>, StorageError> {
		let bytes = match fs::read(self.path_for(id)) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		let sidecar: Sidecar = rmp_serde::from_slice(&bytes)?;
		if sidecar.version != FORMAT_VERSION {
			ui::debug(&format!("Outdated sidecar v{} for {}", sidecar.version, id));
			return Ok(None);
		}
		if sidecar.id != id {
			return Err(StorageError::IdMismatch { expected: id, found: sidecar.id });
		}

		Ok(Some(sidecar.into_record()))
	}

	fn upsert(&mut self, record: EmbeddingRecord) -> Result<(), StorageError> {
		fs::create_dir_all(&self.dir)?;

		let path = self.path_for(record.id);
		let tmp = path.with_extension(format!("{}.tmp", STORE_EXT));
		let bytes = rmp_serde::to_vec(&Sidecar::from_record(record))?;

		fs::write(&tmp, bytes)?;
		fs::rename(&tmp, &path)?;
		Ok(())
	}
}
