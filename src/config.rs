//! Application configuration and constants

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::processing::NormalizationParams;

static CUSTOM_MODEL_DIR: OnceLock<PathBuf> = OnceLock::new();
static CUSTOM_VISION: OnceLock<PathBuf> = OnceLock::new();

// === Model Files ===
pub const VISION_MODEL: &str = "visual_quant.onnx";
pub const MODELS_ENV: &str = "GLIMPSE_MODELS_DIR";

// === Model Parameters ===
pub const INPUT_SIZE: u32 = 224;
pub const INPUT_NAME: &str = "pixel_values";
/// Output names tried in order before falling back to the first output
pub const OUTPUT_NAMES: &[&str] = &["image_embeds", "pooler_output"];

/// CLIP preprocessing distribution
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_1];

// === Storage ===
pub const STORE_DIR: &str = ".glimpse";
pub const STORE_EXT: &str = "msgpack";
pub const IGNORE_FILE: &str = ".glimpseignore";

// === File Extensions ===
pub const IMAGE_EXTENSIONS: &[&str] = &[
	"jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico", "avif",
];

// === Indexing Defaults ===
pub const DEFAULT_EXCLUDED: &[&str] = &["Screenshots"];

/// Settings for a single indexing run
#[derive(Debug, Clone)]
pub struct IndexConfig {
	/// Container (bucket) names skipped entirely, compared case-insensitively
	pub excluded_containers: Vec<String>,
	/// Square side the model expects
	pub input_size: u32,
	pub normalization: NormalizationParams,
	/// Ignore cached records and embed everything again
	pub force: bool,
	/// Re-embed cached records whose modification time no longer matches
	pub refresh_stale: bool,
}

impl Default for IndexConfig {
	fn default() -> Self {
		Self {
			excluded_containers: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
			input_size: INPUT_SIZE,
			normalization: NormalizationParams::default(),
			force: false,
			refresh_stale: false,
		}
	}
}

impl IndexConfig {
	pub fn is_excluded(&self, container: Option<&str>) -> bool {
		let Some(name) = container else { return false };
		let name = name.to_lowercase();
		self.excluded_containers
			.iter()
			.any(|excluded| excluded.to_lowercase() == name)
	}
}

pub fn set_model_dir(path: PathBuf) {
	let _ = CUSTOM_MODEL_DIR.set(path);
}

pub fn set_vision_model(path: PathBuf) {
	let _ = CUSTOM_VISION.set(path);
}

/// Get models directory (custom dir, GLIMPSE_MODELS_DIR, or next to the executable)
pub fn models_dir() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_MODEL_DIR.get() {
		crate::ui::debug(&format!("Using custom model dir: {}", custom.display()));
		return Some(custom.clone());
	}

	if let Ok(env_path) = std::env::var(MODELS_ENV) {
		let path = PathBuf::from(&env_path);
		if path.is_dir() {
			crate::ui::debug(&format!("Using {}: {}", MODELS_ENV, env_path));
			return Some(path);
		}
	}

	if let Ok(exe) = std::env::current_exe() {
		if let Some(dir) = exe.parent() {
			let models = dir.join("models");
			if models.is_dir() {
				crate::ui::debug(&format!("Found models at: {}", models.display()));
				return Some(models);
			}
		}
	}

	None
}

pub fn get_vision_model_path() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_VISION.get() {
		return Some(custom.clone());
	}
	models_dir().map(|d| d.join(VISION_MODEL))
}
