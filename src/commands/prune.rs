//! Prune command - remove records of images that are gone

use anyhow::Result;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::Path;

use crate::core::MediaSource;
use crate::processing::DirectorySource;
use crate::storage::SidecarStore;
use crate::ui;

pub fn run(dir: &Path, recursive: bool, auto_confirm: bool) -> Result<()> {
	ui::info(&format!("Scanning: {}", dir.display()));

	let mut source = DirectorySource::new(dir, recursive)?;
	let live: HashSet<_> = source.enumerate()?.into_iter().map(|d| d.id).collect();

	let store = SidecarStore::for_library(source.root());
	let orphaned: Vec<_> = store
		.ids()?
		.into_iter()
		.filter(|id| !live.contains(id))
		.collect();

	if orphaned.is_empty() {
		ui::success("No orphaned records found");
		return Ok(());
	}

	ui::warn(&format!("Found {} orphaned records", orphaned.len()));
	if !recursive {
		ui::info("Images in subdirectories count as missing without --recursive");
	}

	if !auto_confirm {
		print!("\nDelete these records? [y/N]: ");
		io::stdout().flush()?;

		let mut input = String::new();
		io::stdin().read_line(&mut input)?;

		if !input.trim().eq_ignore_ascii_case("y") {
			ui::info("Cancelled");
			return Ok(());
		}
	}

	let mut deleted = 0;
	let mut errors = 0;

	for id in orphaned {
		match store.remove(id) {
			Ok(_) => {
				deleted += 1;
				ui::debug(&format!("Deleted: {}", store.path_for(id).display()));
			}
			Err(e) => {
				ui::error(&format!("Failed to delete record {}: {}", id, e));
				errors += 1;
			}
		}
	}

	ui::success(&format!("Deleted {} orphaned records", deleted));
	if errors > 0 {
		ui::warn(&format!("{} errors", errors));
	}

	Ok(())
}
