//! Unit-norm embedding vectors

use crate::error::ItemError;

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
	/// Rescale a raw model output to unit L2 norm
	///
	/// Fails with [`ItemError::DegenerateVector`] when the vector is empty,
	/// holds a NaN or infinite component, or has a norm of exactly zero,
	/// instead of producing NaN components.
	pub fn normalize(data: Vec<f32>) -> Result<Self, ItemError> {
		if data.iter().any(|x| !x.is_finite()) {
			return Err(ItemError::DegenerateVector);
		}
		// Squares of finite f32 values neither overflow nor underflow in f64
		let norm = l2_norm_f64(&data);
		if norm == 0.0 {
			return Err(ItemError::DegenerateVector);
		}
		Ok(Self(data.into_iter().map(|x| (x as f64 / norm) as f32).collect()))
	}

	/// Create from pre-normalized data (deserialization)
	pub fn raw(data: Vec<f32>) -> Self {
		Self(data)
	}

	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn into_vec(self) -> Vec<f32> {
		self.0
	}

	pub fn norm(&self) -> f32 {
		l2_norm_f64(&self.0) as f32
	}
}

fn l2_norm_f64(v: &[f32]) -> f64 {
	v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}
