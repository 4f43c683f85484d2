//! # Glimpse Library
//!
//! Incremental visual embedding index for photo libraries. Images are
//! center-cropped, embedded with a CLIP vision model through ONNX Runtime,
//! L2-normalized and cached per image id, so repeated runs only embed what
//! is new.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod indexer;
pub mod models;
pub mod processing;
pub mod runtime;
pub mod storage;
pub mod ui;

pub use crate::config::IndexConfig;
pub use crate::core::{Embedding, EmbeddingRecord, ImageDescriptor, ImageId, MediaSource};
pub use crate::error::{ItemError, ItemErrorKind, StorageError};
pub use crate::indexer::{CancelToken, IndexReport, IndexRunResult, Indexer, Progress};
pub use crate::models::InferenceEngine;
pub use crate::storage::EmbeddingStore;
