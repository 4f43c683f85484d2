//! # Incremental Indexing
//!
//! Walks a media source, serves embeddings from the store when it can, and
//! computes the rest: fetch, decode, center crop, infer, normalize, persist.
//! A bad image costs only itself; the run continues with the next one.

pub mod progress;
pub mod report;

pub use progress::{CancelToken, Progress};
pub use report::{IndexReport, IndexRunResult, RunStats, SkippedItem};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Instant;

use crate::config::IndexConfig;
use crate::core::{Embedding, EmbeddingRecord, ImageDescriptor, MediaSource};
use crate::error::ItemError;
use crate::models::InferenceEngine;
use crate::processing::ImagePreprocessor;
use crate::storage::EmbeddingStore;
use crate::ui;

/// Opens the engine on first use and keeps it for the rest of the run.
/// Dropping it closes the session.
struct LazyEngine<E, F> {
	engine: Option<E>,
	open: Option<F>,
}

impl<E, F> LazyEngine<E, F>
where
	E: InferenceEngine,
	F: FnOnce() -> Result<E>,
{
	fn new(open: F) -> Self {
		Self { engine: None, open: Some(open) }
	}

	fn get(&mut self) -> Result<&mut E> {
		if let Some(open) = self.open.take() {
			ui::debug("Opening inference engine");
			self.engine = Some(open().context("Failed to open inference engine")?);
		}
		self.engine
			.as_mut()
			.context("Inference engine is unavailable after a failed open")
	}

	fn opened(&self) -> bool {
		self.open.is_none()
	}
}

/// Drives one indexing run at a time over a source and a store
pub struct Indexer<M, S> {
	source: M,
	store: S,
	config: IndexConfig,
	preprocessor: ImagePreprocessor,
	progress: Progress,
	cancel: CancelToken,
}

impl<M: MediaSource, S: EmbeddingStore> Indexer<M, S> {
	pub fn new(source: M, store: S, config: IndexConfig) -> Self {
		let preprocessor = ImagePreprocessor::new(config.input_size, config.normalization);
		Self {
			source,
			store,
			config,
			preprocessor,
			progress: Progress::new(),
			cancel: CancelToken::new(),
		}
	}

	pub fn with_progress(mut self, progress: Progress) -> Self {
		self.progress = progress;
		self
	}

	pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
		self.cancel = cancel;
		self
	}

	/// Handle to the progress slot of this indexer
	pub fn progress(&self) -> Progress {
		self.progress.clone()
	}

	pub fn cancel_token(&self) -> CancelToken {
		self.cancel.clone()
	}

	pub fn into_parts(self) -> (M, S) {
		(self.source, self.store)
	}

	/// Index everything the source currently lists
	///
	/// `open_engine` runs at most once, on the first cache miss. Only a failing
	/// enumeration or a failing engine open abort the run; every other problem
	/// is recorded in [`IndexReport::skipped`].
	pub fn run<E, F>(&mut self, open_engine: F) -> Result<IndexReport>
	where
		E: InferenceEngine,
		F: FnOnce() -> Result<E>,
	{
		let start = Instant::now();
		self.progress.reset();

		let descriptors = self
			.source
			.enumerate()
			.context("Failed to enumerate media source")?;
		let total = descriptors.len();

		let mut engine = LazyEngine::new(open_engine);
		let mut report = IndexReport::default();
		report.stats.total = total;
		let mut seen = HashSet::with_capacity(total);

		for (index, desc) in descriptors.iter().enumerate() {
			if self.cancel.is_cancelled() {
				ui::warn(&format!("Cancelled after {} of {} images", index, total));
				report.cancelled = true;
				break;
			}

			if !seen.insert(desc.id) {
				ui::debug(&format!("Duplicate id {}, skipping", desc.id));
				report.stats.duplicates += 1;
			} else if self.config.is_excluded(desc.container_name.as_deref()) {
				ui::debug(&format!("Excluded {} ({})", desc.id, desc.container_name.as_deref().unwrap_or("")));
				report.stats.excluded += 1;
			} else if let Some(vector) = self.cached(desc) {
				report.result.push(desc.id, vector);
				report.stats.cached += 1;
			} else {
				let item_start = Instant::now();
				match self.embed(desc, engine.get()?) {
					Ok(vector) => {
						ui::debug(&format!(
							"Embedded {} in {}ms",
							desc.id,
							item_start.elapsed().as_millis()
						));
						report.result.push(desc.id, vector);
						report.stats.embedded += 1;
					}
					Err(error) => {
						ui::warn(&format!("Skipping {}: {}", desc.id, error));
						report.stats.failed += 1;
						report.skipped.push(SkippedItem { id: desc.id, error });
					}
				}
			}

			self.progress.advance((index + 1) as f64 / total as f64);
		}

		self.progress.advance(1.0);

		report.engine_opened = engine.opened();
		report.elapsed_secs = start.elapsed().as_secs_f32();
		Ok(report)
	}

	/// Stored vector for this image, unless the config asks to recompute it
	fn cached(&self, desc: &ImageDescriptor) -> Option<Embedding> {
		if self.config.force {
			return None;
		}

		match self.store.lookup(desc.id) {
			Ok(Some(record)) if self.config.refresh_stale && record.last_modified != desc.last_modified => {
				ui::debug(&format!("Stale record for {}, re-embedding", desc.id));
				None
			}
			Ok(Some(record)) => Some(record.vector),
			Ok(None) => None,
			Err(e) => {
				ui::warn(&format!("Unreadable record for {}, re-embedding: {}", desc.id, e));
				None
			}
		}
	}

	fn embed<E: InferenceEngine>(&mut self, desc: &ImageDescriptor, engine: &mut E) -> Result<Embedding, ItemError> {
		let tensor = {
			let bytes = self.source.fetch_bytes(desc.id)?;
			self.preprocessor.preprocess(&bytes)?
		};
		let raw = engine.infer(&tensor)?;
		let vector = Embedding::normalize(raw)?;

		self.store
			.upsert(EmbeddingRecord::new(desc.id, desc.last_modified, vector.clone()))?;
		Ok(vector)
	}
}
