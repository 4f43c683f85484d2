//! Directory walking media source

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{IGNORE_FILE, STORE_DIR};
use crate::core::media::is_image;
use crate::core::{ImageDescriptor, ImageId, MediaSource};
use crate::error::ItemError;
use crate::ui;

fn load_ignore(dir: &Path) -> Vec<String> {
	let Ok(file) = File::open(dir.join(IGNORE_FILE)) else {
		return Vec::new();
	};

	BufReader::new(file)
		.lines()
		.map_while(|line| line.ok())
		.map(|line| line.trim().to_lowercase())
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.collect()
}

fn is_ignored(key: &str, patterns: &[String]) -> bool {
	let key = key.to_lowercase();
	patterns.iter().any(|pattern| key.contains(pattern.as_str()))
}

/// `/`-separated path relative to the library root
fn relative_key(root: &Path, path: &Path) -> Option<String> {
	let rel = path.strip_prefix(root).ok()?;
	let parts: Vec<_> = rel
		.components()
		.map(|c| c.as_os_str().to_string_lossy())
		.collect();
	Some(parts.join("/"))
}

/// Images under a directory, keyed by their library-relative path
pub struct DirectorySource {
	root: PathBuf,
	recursive: bool,
	paths: HashMap<ImageId, PathBuf>,
}

impl DirectorySource {
	pub fn new(root: &Path, recursive: bool) -> Result<Self> {
		let root = root
			.canonicalize()
			.with_context(|| format!("Library directory not found: {}", root.display()))?;
		Ok(Self {
			root,
			recursive,
			paths: HashMap::new(),
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}

impl MediaSource for DirectorySource {
	fn enumerate(&mut self) -> Result<Vec<ImageDescriptor>> {
		fs::read_dir(&self.root)
			.with_context(|| format!("Cannot read library directory: {}", self.root.display()))?;

		let ignore_patterns = load_ignore(&self.root);
		let max_depth = if self.recursive { usize::MAX } else { 1 };
		let walker = WalkDir::new(&self.root)
			.min_depth(1)
			.max_depth(max_depth)
			.into_iter()
			.filter_entry(|e| e.file_name() != STORE_DIR);

		let mut found = Vec::new();
		for entry in walker {
			let entry = match entry {
				Ok(entry) => entry,
				Err(e) => {
					ui::warn(&format!("Skipping unreadable entry: {}", e));
					continue;
				}
			};

			let path = entry.path();
			if !entry.file_type().is_file() || !is_image(path) {
				continue;
			}

			let Some(key) = relative_key(&self.root, path) else { continue };
			if is_ignored(&key, &ignore_patterns) {
				ui::debug(&format!("Ignored: {}", key));
				continue;
			}

			let last_modified = entry
				.metadata()
				.ok()
				.and_then(|m| m.modified().ok())
				.map(DateTime::<Utc>::from)
				.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

			let container_name = path
				.parent()
				.and_then(|p| p.file_name())
				.map(|n| n.to_string_lossy().into_owned());

			found.push((key, path.to_path_buf(), last_modified, container_name));
		}

		found.sort_by(|a, b| a.0.cmp(&b.0));

		self.paths.clear();
		let mut descriptors = Vec::with_capacity(found.len());
		for (key, path, last_modified, container_name) in found {
			let id = ImageId::from_key(&key);
			if self.paths.contains_key(&id) {
				ui::warn(&format!("Id collision, skipping: {}", key));
				continue;
			}
			self.paths.insert(id, path);
			descriptors.push(ImageDescriptor { id, last_modified, container_name });
		}

		ui::debug(&format!("Enumerated {} images in {}", descriptors.len(), self.root.display()));
		Ok(descriptors)
	}

	fn fetch_bytes(&self, id: ImageId) -> Result<Vec<u8>, ItemError> {
		let path = self.paths.get(&id).ok_or_else(|| ItemError::Fetch {
			id,
			reason: "not part of the last enumeration".to_string(),
		})?;

		fs::read(path).map_err(|e| ItemError::Fetch {
			id,
			reason: format!("{}: {}", path.display(), e),
		})
	}
}
