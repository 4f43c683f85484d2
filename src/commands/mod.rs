//! # Command Implementations
//!
//! Each submodule handles one CLI command.

pub mod index;
pub mod prune;
