//! # ONNX Model Management
//!
//! The inference boundary and its ONNX Runtime implementation.

pub mod vision;

pub use vision::VisionModel;

use crate::error::ItemError;
use crate::processing::Tensor;

/// One forward pass of a visual embedding model
pub trait InferenceEngine {
	/// Raw (not yet normalized) embedding for a `[1, 3, H, W]` tensor
	fn infer(&mut self, tensor: &Tensor) -> Result<Vec<f32>, ItemError>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
	fn infer(&mut self, tensor: &Tensor) -> Result<Vec<f32>, ItemError> {
		(**self).infer(tensor)
	}
}
