//! Decode, center crop and tensorize images for the vision model

use image::{imageops::FilterType, DynamicImage, ImageReader};
use ndarray::Array4;
use std::io::Cursor;

use crate::config::{CLIP_MEAN, CLIP_STD};
use crate::error::ItemError;

/// `[batch=1, channels=3, height, width]`
pub type Tensor = Array4<f32>;

/// Per-channel input distribution the model was trained on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationParams {
	pub mean: [f32; 3],
	pub std: [f32; 3],
}

impl Default for NormalizationParams {
	fn default() -> Self {
		Self { mean: CLIP_MEAN, std: CLIP_STD }
	}
}

/// Square region cut out of the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
	pub x: u32,
	pub y: u32,
	pub side: u32,
}

impl CropRegion {
	/// Exclusive bottom-right corner
	pub fn end(&self) -> (u32, u32) {
		(self.x + self.side, self.y + self.side)
	}
}

/// Largest centered square; only the longer axis is trimmed
pub fn crop_region(width: u32, height: u32) -> CropRegion {
	let side = width.min(height);
	CropRegion {
		x: (width - side) / 2,
		y: (height - side) / 2,
		side,
	}
}

#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
	input_size: u32,
	normalization: NormalizationParams,
}

impl ImagePreprocessor {
	pub fn new(input_size: u32, normalization: NormalizationParams) -> Self {
		Self { input_size, normalization }
	}

	/// Decode raw bytes and turn them into a model input tensor
	pub fn preprocess(&self, bytes: &[u8]) -> Result<Tensor, ItemError> {
		let img = decode(bytes)?;
		Ok(self.preprocess_image(&img))
	}

	pub fn preprocess_image(&self, img: &DynamicImage) -> Tensor {
		let square = center_crop(img);
		let resized = square.resize_exact(self.input_size, self.input_size, FilterType::CatmullRom);
		self.to_tensor(&resized)
	}

	fn to_tensor(&self, img: &DynamicImage) -> Tensor {
		let rgb = img.to_rgb8();
		let size = self.input_size as usize;
		let NormalizationParams { mean, std } = self.normalization;

		let mut arr = Array4::zeros((1, 3, size, size));
		for (x, y, px) in rgb.enumerate_pixels() {
			let (x, y) = (x as usize, y as usize);
			for c in 0..3 {
				arr[[0, c, y, x]] = (px[c] as f32 / 255.0 - mean[c]) / std[c];
			}
		}
		arr
	}
}

impl Default for ImagePreprocessor {
	fn default() -> Self {
		Self::new(crate::config::INPUT_SIZE, NormalizationParams::default())
	}
}

/// Decode with content sniffing, so mislabeled files still work
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ItemError> {
	let img = ImageReader::new(Cursor::new(bytes))
		.with_guessed_format()
		.map_err(image::ImageError::IoError)?
		.decode()?;
	Ok(img)
}

pub fn center_crop(img: &DynamicImage) -> DynamicImage {
	let region = crop_region(img.width(), img.height());
	img.crop_imm(region.x, region.y, region.side, region.side)
}
