//! Image decoding, preprocessing and the filesystem media source

pub mod directory;
pub mod preprocess;

pub use directory::DirectorySource;
pub use preprocess::{crop_region, CropRegion, ImagePreprocessor, NormalizationParams, Tensor};
