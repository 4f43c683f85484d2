use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::runtime::Provider;

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.usage(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.literal(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.placeholder(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
		.valid(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
}

#[derive(Parser, Debug)]
#[command(
	name = "glimpse",
	author,
	version,
	about = "Incremental visual embedding index for photo libraries",
	styles = styles(),
	after_help = format!(
		"{title}
  {glimpse} {index}  {index_args}            {index_desc}
  {glimpse} {index}  {exclude_args}  {exclude_desc}
  {glimpse} {prune}  {prune_args}               {prune_desc}",
		title = "Examples:".bright_blue().bold(),
		glimpse = "glimpse".bright_blue(),
		index = "index".yellow(),
		index_args = "-d ~/Pictures -r",
		index_desc = "Embed new photos recursively".dimmed(),
		exclude_args = "-d ~/Pictures --exclude Screenshots,Memes",
		exclude_desc = "Skip whole folders".dimmed(),
		prune = "prune".yellow(),
		prune_args = "-d ~/Pictures -r",
		prune_desc = "Drop records of deleted photos".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Execution provider: auto, cpu, cuda, tensorrt, coreml, xnnpack
	#[arg(short = 'p', long = "provider", global = true, default_value = "auto")]
	pub provider: Provider,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Embed new images and refresh the index
	Index {
		/// Library directory
		#[arg(short = 'd', long = "dir", default_value = ".")]
		directory: PathBuf,

		/// Descend into subdirectories
		#[arg(short = 'r', long = "recursive")]
		recursive: bool,

		/// Re-embed images that already have a record
		#[arg(short = 'f', long = "force")]
		force: bool,

		/// Re-embed images modified since their record was written
		#[arg(long = "refresh-stale")]
		refresh_stale: bool,

		/// Folder names to skip, case-insensitive (comma-separated)
		#[arg(long = "exclude", value_delimiter = ',', default_value = "Screenshots")]
		exclude: Vec<String>,

		/// Path to the vision model (.onnx)
		#[arg(short = 'm', long = "model", value_name = "PATH")]
		model: Option<PathBuf>,

		/// Directory holding the models (overrides GLIMPSE_MODELS_DIR)
		#[arg(long = "models-dir", value_name = "DIR")]
		models_dir: Option<PathBuf>,

		/// Print the run report as JSON
		#[arg(long = "json")]
		json: bool,
	},

	/// Remove records of images that no longer exist
	Prune {
		/// Library directory
		#[arg(short = 'd', long = "dir", default_value = ".")]
		directory: PathBuf,

		/// Descend into subdirectories
		#[arg(short = 'r', long = "recursive")]
		recursive: bool,

		/// Delete without asking
		#[arg(short = 'y', long = "yes")]
		auto_confirm: bool,
	},
}
