//! Glimpse - incremental photo embedding index
//!
//! Walks a photo library, embeds new images with a local ONNX vision model
//! and caches the vectors next to the photos.

use anyhow::Result;
use clap::Parser;

use glimpse::cli::{Cli, Command};
use glimpse::config::{self, IndexConfig};
use glimpse::ui::{self, Log};
use glimpse::{commands, runtime};

fn main() {
	if let Err(e) = run() {
		ui::error(&format!("{:#}", e));
		std::process::exit(1);
	}
}

fn run() -> Result<()> {
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);
	runtime::set_provider(cli.provider);

	match cli.command {
		Command::Index {
			directory,
			recursive,
			force,
			refresh_stale,
			exclude,
			model,
			models_dir,
			json,
		} => {
			Log::set_quiet(json);
			if let Some(dir) = models_dir {
				config::set_model_dir(dir);
			}
			if let Some(path) = model {
				config::set_vision_model(path);
			}

			print_header();
			let index_config = IndexConfig {
				excluded_containers: exclude.into_iter().filter(|s| !s.trim().is_empty()).collect(),
				force,
				refresh_stale,
				..IndexConfig::default()
			};
			commands::index::run(&directory, recursive, index_config, json)
		}
		Command::Prune { directory, recursive, auto_confirm } => {
			print_header();
			commands::prune::run(&directory, recursive, auto_confirm)
		}
	}
}

fn print_header() {
	ui::header(&format!("─── Glimpse v{} ───", env!("CARGO_PKG_VERSION")));
}
