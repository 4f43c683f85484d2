//! Unified logging system

use colored::*;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);
static QUIET: AtomicBool = AtomicBool::new(false);

const BAR_WIDTH: usize = 30;

pub struct Log;

impl Log {
	pub fn set_verbose(enabled: bool) {
		VERBOSE.store(enabled, Ordering::Relaxed);
	}

	pub fn is_verbose() -> bool {
		VERBOSE.load(Ordering::Relaxed) && !Self::is_quiet()
	}

	/// Silence everything except errors (machine-readable output mode)
	pub fn set_quiet(enabled: bool) {
		QUIET.store(enabled, Ordering::Relaxed);
	}

	pub fn is_quiet() -> bool {
		QUIET.load(Ordering::Relaxed)
	}
}

pub fn info(msg: &str) {
	if Log::is_quiet() {
		return;
	}
	println!("{} {}", "ℹ".bright_blue().bold(), msg.bright_white());
}

pub fn success(msg: &str) {
	if Log::is_quiet() {
		return;
	}
	println!("{} {}", "✓".bright_green().bold(), msg.bright_white());
}

pub fn warn(msg: &str) {
	if Log::is_quiet() {
		return;
	}
	println!("{} {}", "⚠".bright_yellow().bold(), msg.bright_white());
}

pub fn error(msg: &str) {
	eprintln!("{} {}", "✗".bright_red().bold(), msg.bright_white());
}

pub fn debug(msg: &str) {
	if Log::is_verbose() {
		println!("{} {}", "⚙".bright_black().bold(), msg.dimmed());
	}
}

pub fn header(text: &str) {
	if Log::is_quiet() {
		return;
	}
	println!("\n{}", text.bright_blue().bold());
}

/// Text bar for a fraction in `[0.0, 1.0]`
pub fn bar(fraction: f64) -> String {
	let fraction = fraction.clamp(0.0, 1.0);
	let filled = (fraction * BAR_WIDTH as f64).round() as usize;
	format!(
		"{}{} {:>3.0}%",
		"█".repeat(filled).bright_blue(),
		"░".repeat(BAR_WIDTH - filled).dimmed(),
		fraction * 100.0
	)
}

/// Redraw the progress line in place. Skipped in verbose and quiet mode.
pub fn progress(fraction: f64) {
	if Log::is_verbose() || Log::is_quiet() {
		return;
	}
	print!("\r{}", bar(fraction));
	if fraction >= 1.0 {
		println!();
	}
	let _ = io::stdout().flush();
}
