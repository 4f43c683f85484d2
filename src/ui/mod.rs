//! # User Interface
//!
//! Colored terminal output and a single-line progress bar.

pub mod log;

pub use log::{bar, debug, error, header, info, progress, success, warn, Log};
