//! Vision model (CLIP) for image embeddings

use anyhow::{Context, Result};
use ort::session::{Session, SessionOutputs};
use ort::value::Value;
use std::path::Path;

use super::InferenceEngine;
use crate::config::{INPUT_NAME, OUTPUT_NAMES};
use crate::error::ItemError;
use crate::processing::Tensor;

/// ONNX session over the visual encoder; dropping it releases the session
pub struct VisionModel {
	session: Session,
}

impl VisionModel {
	pub fn load(model_path: &Path) -> Result<Self> {
		if !model_path.exists() {
			anyhow::bail!("Vision model file does not exist: {}", model_path.display());
		}
		let session = crate::runtime::create_session(model_path)
			.context("Failed to load vision model")?;
		Ok(Self { session })
	}

	/// Load from an in-memory model, e.g. one bundled with `include_bytes!`
	pub fn from_bytes(model: &[u8]) -> Result<Self> {
		let session = crate::runtime::create_session_from_memory(model)
			.context("Failed to load vision model")?;
		Ok(Self { session })
	}
}

impl InferenceEngine for VisionModel {
	fn infer(&mut self, tensor: &Tensor) -> Result<Vec<f32>, ItemError> {
		let shape = tensor.shape().to_vec();
		let data: Vec<f32> = tensor.iter().copied().collect();
		let input = Value::from_array((shape, data))?;

		let outputs = self.session.run(ort::inputs![INPUT_NAME => input])?;
		extract_embedding(&outputs)
	}
}

fn extract_embedding(outputs: &SessionOutputs) -> Result<Vec<f32>, ItemError> {
	let output = match OUTPUT_NAMES.iter().find_map(|name| outputs.get(*name)) {
		Some(value) => value,
		None => &outputs[0],
	};

	let (shape, data) = output.try_extract_tensor::<f32>()?;
	let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
	pool(&dims, data)
}

/// Collapse model output to a single vector
fn pool(dims: &[usize], data: &[f32]) -> Result<Vec<f32>, ItemError> {
	match dims {
		[1, dim] if *dim > 0 && data.len() >= *dim => Ok(data[..*dim].to_vec()),
		[1, n, dim] if *n > 0 && *dim > 0 && data.len() >= n * dim => {
			let mut pooled = vec![0.0; *dim];
			for token in data.chunks_exact(*dim).take(*n) {
				for (acc, v) in pooled.iter_mut().zip(token) {
					*acc += v;
				}
			}
			pooled.iter_mut().for_each(|v| *v /= *n as f32);
			Ok(pooled)
		}
		_ => Err(ItemError::Inference(format!("unexpected output shape {:?}", dims))),
	}
}
