//! Progress reporting and cancellation handles shared with the caller

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type Observer = Box<dyn Fn(f64) + Send + Sync>;

#[derive(Default)]
struct ProgressInner {
	/// f64 bits; 0 is 0.0
	bits: AtomicU64,
	observer: Option<Observer>,
}

/// Fraction of the media source consumed, in `[0.0, 1.0]`
///
/// Cloning yields another handle to the same slot. Only the indexer writes;
/// within a run the value never decreases.
#[derive(Clone, Default)]
pub struct Progress {
	inner: Arc<ProgressInner>,
}

impl Progress {
	pub fn new() -> Self {
		Self::default()
	}

	/// Call `f` with every value the indexer publishes
	pub fn with_observer(f: impl Fn(f64) + Send + Sync + 'static) -> Self {
		Self {
			inner: Arc::new(ProgressInner {
				bits: AtomicU64::new(0),
				observer: Some(Box::new(f)),
			}),
		}
	}

	/// Latest published value
	pub fn get(&self) -> f64 {
		f64::from_bits(self.inner.bits.load(Ordering::Acquire))
	}

	pub fn is_done(&self) -> bool {
		self.get() >= 1.0
	}

	/// Start of a run
	pub(crate) fn reset(&self) {
		self.inner.bits.store(0.0f64.to_bits(), Ordering::Release);
		self.notify(0.0);
	}

	/// Raise the value; lower or NaN values leave it unchanged. The observer
	/// always receives the current value.
	pub(crate) fn advance(&self, value: f64) {
		let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
		let _ = self
			.inner
			.bits
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
				(value > f64::from_bits(bits)).then(|| value.to_bits())
			});
		self.notify(self.get());
	}

	fn notify(&self, value: f64) {
		if let Some(observer) = &self.inner.observer {
			observer(value);
		}
	}
}

impl fmt::Debug for Progress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Progress").field("value", &self.get()).finish()
	}
}

/// Cooperative stop request, checked between images
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Release);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}
