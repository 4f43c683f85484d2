//! Index command - embed new images

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

use crate::config::{self, IndexConfig};
use crate::indexer::{IndexReport, Indexer, Progress};
use crate::models::VisionModel;
use crate::processing::DirectorySource;
use crate::storage::SidecarStore;
use crate::ui;

pub fn run(dir: &Path, recursive: bool, config: IndexConfig, json: bool) -> Result<()> {
	ui::info(&format!("Indexing: {}", dir.display()));
	if !config.excluded_containers.is_empty() {
		ui::debug(&format!("Excluding folders: {}", config.excluded_containers.join(", ")));
	}

	let source = DirectorySource::new(dir, recursive)?;
	let store = SidecarStore::for_library(source.root());
	let progress = Progress::with_observer(ui::progress);

	let mut indexer = Indexer::new(source, store, config).with_progress(progress);
	let report = indexer.run(load_model)?;

	if json {
		println!("{}", serde_json::to_string_pretty(&report)?);
		return Ok(());
	}

	print_summary(&report);
	Ok(())
}

fn load_model() -> Result<VisionModel> {
	let path = config::get_vision_model_path().context(format!(
		"Vision model not found. Ensure {} exists or pass --model",
		config::VISION_MODEL
	))?;

	ui::info("Loading vision model...");
	let start = Instant::now();
	let model = VisionModel::load(&path)?;
	ui::success(&format!("Model ready in {:.2}s", start.elapsed().as_secs_f32()));
	Ok(model)
}

fn print_summary(report: &IndexReport) {
	let stats = &report.stats;

	if stats.total == 0 {
		ui::info("No images found");
		return;
	}

	ui::success(&format!(
		"Indexed {} of {} images in {:.1}s ({} new, {} cached)",
		stats.resolved(),
		stats.total,
		report.elapsed_secs,
		stats.embedded,
		stats.cached
	));

	if stats.excluded > 0 {
		ui::info(&format!("{} images in excluded folders", stats.excluded));
	}
	if stats.duplicates > 0 {
		ui::info(&format!("{} duplicate entries ignored", stats.duplicates));
	}
	if stats.failed > 0 {
		ui::warn(&format!("{} images skipped (--verbose for details)", stats.failed));
		for item in &report.skipped {
			ui::debug(&format!("{}: {}", item.id, item.error));
		}
	}
	if report.cancelled {
		ui::warn("Run was cancelled before finishing");
	}
}
