// Indexing pipeline tests against an in-memory library and a fake engine

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::cell::Cell;
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use glimpse::processing::Tensor;
use glimpse::storage::{MemoryStore, SidecarStore};
use glimpse::{
	CancelToken, EmbeddingRecord, EmbeddingStore, ImageDescriptor, ImageId, IndexConfig,
	InferenceEngine, Indexer, ItemError, ItemErrorKind, MediaSource, Progress, StorageError,
};

fn png(color: [u8; 3], width: u32, height: u32) -> Vec<u8> {
	let img = RgbImage::from_pixel(width, height, Rgb(color));
	let mut buf = Cursor::new(Vec::new());
	DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png).unwrap();
	buf.into_inner()
}

fn when(day: u32) -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2024, 1, day, 9, 30, 0).unwrap()
}

/// Library held in memory; `None` bytes make the fetch fail
#[derive(Default)]
struct FakeLibrary {
	items: Vec<ImageDescriptor>,
	bytes: HashMap<ImageId, Option<Vec<u8>>>,
	broken: bool,
}

impl FakeLibrary {
	fn add(&mut self, id: u64, container: Option<&str>, bytes: Option<Vec<u8>>) -> &mut Self {
		let id = ImageId(id);
		self.items.push(ImageDescriptor {
			id,
			last_modified: when(1),
			container_name: container.map(str::to_string),
		});
		self.bytes.insert(id, bytes);
		self
	}

	fn add_image(&mut self, id: u64, shade: u8) -> &mut Self {
		self.add(id, Some("Camera"), Some(png([shade, 255 - shade, 40], 48, 32)))
	}
}

impl MediaSource for FakeLibrary {
	fn enumerate(&mut self) -> Result<Vec<ImageDescriptor>> {
		if self.broken {
			anyhow::bail!("media store unavailable");
		}
		Ok(self.items.clone())
	}

	fn fetch_bytes(&self, id: ImageId) -> Result<Vec<u8>, ItemError> {
		match self.bytes.get(&id) {
			Some(Some(bytes)) => Ok(bytes.clone()),
			_ => Err(ItemError::Fetch { id, reason: "not found".to_string() }),
		}
	}
}

#[derive(Default)]
struct EngineLog {
	opens: Cell<usize>,
	closes: Cell<usize>,
	calls: Cell<usize>,
}

/// Embeds an image as its per-channel tensor means plus a constant
struct FakeEngine {
	log: Rc<EngineLog>,
	/// Raw output forced to zero for this call number (1-based)
	zero_on_call: Option<usize>,
	fail_on_call: Option<usize>,
	cancel_on_call: Option<(usize, CancelToken)>,
}

impl FakeEngine {
	fn new(log: &Rc<EngineLog>) -> Self {
		log.opens.set(log.opens.get() + 1);
		Self {
			log: Rc::clone(log),
			zero_on_call: None,
			fail_on_call: None,
			cancel_on_call: None,
		}
	}
}

impl InferenceEngine for FakeEngine {
	fn infer(&mut self, tensor: &Tensor) -> Result<Vec<f32>, ItemError> {
		assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
		let call = self.log.calls.get() + 1;
		self.log.calls.set(call);

		if let Some((at, token)) = &self.cancel_on_call {
			if *at == call {
				token.cancel();
			}
		}
		if self.fail_on_call == Some(call) {
			return Err(ItemError::Inference("session fault".to_string()));
		}
		if self.zero_on_call == Some(call) {
			return Ok(vec![0.0; 4]);
		}

		let plane = 224 * 224;
		let data: Vec<f32> = tensor.iter().copied().collect();
		let mut out: Vec<f32> = data
			.chunks(plane)
			.map(|c| c.iter().sum::<f32>() / plane as f32)
			.collect();
		out.push(3.0);
		Ok(out)
	}
}

impl Drop for FakeEngine {
	fn drop(&mut self) {
		self.log.closes.set(self.log.closes.get() + 1);
	}
}

/// Memory store whose lookup and upsert fail for chosen ids
struct FlakyStore {
	inner: MemoryStore,
	unreadable: ImageId,
	unwritable: ImageId,
}

impl EmbeddingStore for FlakyStore {
	fn lookup(&self, id: ImageId) -> Result<Option<EmbeddingRecord>, StorageError> {
		if id == self.unreadable {
			return Err(StorageError::Io(std::io::Error::other("truncated record")));
		}
		self.inner.lookup(id)
	}

	fn upsert(&mut self, record: EmbeddingRecord) -> Result<(), StorageError> {
		if record.id == self.unwritable {
			return Err(StorageError::Io(std::io::Error::other("disk full")));
		}
		self.inner.upsert(record)
	}
}

fn ten_images() -> FakeLibrary {
	let mut library = FakeLibrary::default();
	for i in 0..10 {
		library.add_image(100 + i, (i * 20) as u8);
	}
	library
}

#[test]
fn test_first_run_embeds_everything() {
	let mut library = ten_images();
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	let report = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(report.stats.embedded, 10);
	assert_eq!(report.stats.cached, 0);
	assert!(report.skipped.is_empty());
	assert!(report.engine_opened);
	assert_eq!(log.calls.get(), 10);
	assert_eq!(store.len(), 10);

	let expected: Vec<_> = (100..110).map(ImageId).collect();
	assert_eq!(report.result.ids, expected);
	for (id, vector) in report.result.iter() {
		assert!((vector.norm() - 1.0).abs() < 1e-5);
		assert_eq!(&store.get(id).unwrap().vector, vector);
		assert_eq!(store.get(id).unwrap().last_modified, when(1));
	}
}

#[test]
fn test_second_run_is_served_from_cache() {
	let mut library = ten_images();
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	let first = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();
	let calls_after_first = log.calls.get();
	let upserts_after_first = store.upserts();

	let second = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(second.result, first.result);
	assert_eq!(second.stats.cached, 10);
	assert_eq!(second.stats.embedded, 0);
	assert!(!second.engine_opened);
	assert_eq!(log.calls.get(), calls_after_first);
	assert_eq!(log.opens.get(), 1);
	assert_eq!(store.upserts(), upserts_after_first);
}

#[test]
fn test_only_new_images_are_embedded() {
	let mut library = ten_images();
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	library.add_image(500, 7);
	let report = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(report.stats.cached, 10);
	assert_eq!(report.stats.embedded, 1);
	assert_eq!(log.calls.get(), 11);
	assert_eq!(report.result.ids.last(), Some(&ImageId(500)));
}

#[test]
fn test_one_corrupt_image_does_not_stop_the_run() {
	let mut library = ten_images();
	library.add(999, Some("Camera"), Some(b"\x89PNG but not really".to_vec()));
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	let report = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(store.len(), 10);
	assert_eq!(report.result.len(), 10);
	assert_eq!(report.stats.failed, 1);
	assert_eq!(report.skipped.len(), 1);
	assert_eq!(report.skipped[0].id, ImageId(999));
	assert_eq!(report.skipped[0].error.kind(), ItemErrorKind::Decode);
	assert!(store.get(ImageId(999)).is_none());
}

#[test]
fn test_per_item_errors_are_typed_and_isolated() {
	let mut library = FakeLibrary::default();
	library
		.add_image(1, 10)
		.add(2, Some("Camera"), None)
		.add_image(3, 30)
		.add_image(4, 40)
		.add_image(5, 50);
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	// Engine calls: 1 -> id 1, 2 -> id 3, 3 -> id 4, 4 -> id 5
	let report = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| {
			let mut engine = FakeEngine::new(&log);
			engine.fail_on_call = Some(2);
			engine.zero_on_call = Some(3);
			Ok(engine)
		})
		.unwrap();

	let kinds: Vec<_> = report.skipped.iter().map(|s| (s.id, s.error.kind())).collect();
	assert_eq!(
		kinds,
		vec![
			(ImageId(2), ItemErrorKind::Fetch),
			(ImageId(3), ItemErrorKind::Inference),
			(ImageId(4), ItemErrorKind::DegenerateVector),
		]
	);
	assert_eq!(report.result.ids, vec![ImageId(1), ImageId(5)]);
	assert_eq!(store.len(), 2);
	assert!(report.result.vectors.iter().all(|v| v.as_slice().iter().all(|x| x.is_finite())));
}

#[test]
fn test_failed_items_are_retried_next_run() {
	let mut library = FakeLibrary::default();
	library.add_image(1, 10).add_image(2, 20);
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	let first = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| {
			let mut engine = FakeEngine::new(&log);
			engine.fail_on_call = Some(2);
			Ok(engine)
		})
		.unwrap();
	assert_eq!(first.stats.failed, 1);

	let second = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();
	assert_eq!(second.stats.cached, 1);
	assert_eq!(second.stats.embedded, 1);
	assert_eq!(store.len(), 2);
}

#[test]
fn test_screenshots_are_never_touched() {
	let mut library = FakeLibrary::default();
	library
		.add(1, Some("screenSHOTS"), Some(png([1, 2, 3], 10, 10)))
		.add(2, Some("Screenshots"), None);
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);

	let report = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.with_progress(Progress::with_observer(move |v| sink.lock().unwrap().push(v)))
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(report.stats.excluded, 2);
	assert!(report.result.is_empty());
	assert!(report.skipped.is_empty());
	assert_eq!(store.lookups(), 0);
	assert_eq!(store.upserts(), 0);
	assert_eq!(log.opens.get(), 0);
	assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.5, 1.0, 1.0]);
}

#[test]
fn test_custom_exclusions_replace_default() {
	let mut library = FakeLibrary::default();
	library
		.add(1, Some("Screenshots"), Some(png([1, 2, 3], 10, 10)))
		.add(2, Some("WhatsApp Images"), Some(png([4, 5, 6], 10, 10)))
		.add(3, None, Some(png([7, 8, 9], 10, 10)));
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());
	let config = IndexConfig {
		excluded_containers: vec!["whatsapp images".to_string()],
		..IndexConfig::default()
	};

	let report = Indexer::new(&mut library, &mut store, config)
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(report.result.ids, vec![ImageId(1), ImageId(3)]);
	assert_eq!(report.stats.excluded, 1);
}

#[test]
fn test_progress_is_monotonic_and_finishes_at_one() {
	let mut library = ten_images();
	library.add(77, Some("Camera"), None);
	library.add(78, Some("Screenshots"), None);
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	let progress = Progress::with_observer(move |v| sink.lock().unwrap().push(v));

	let mut indexer = Indexer::new(&mut library, &mut store, IndexConfig::default()).with_progress(progress.clone());
	indexer.run(|| Ok(FakeEngine::new(&log))).unwrap();

	let values = seen.lock().unwrap().clone();
	assert_eq!(values.first(), Some(&0.0));
	assert_eq!(values.last(), Some(&1.0));
	assert!(values.windows(2).all(|w| w[0] <= w[1]));
	assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
	// reset + one per descriptor + final
	assert_eq!(values.len(), 12 + 2);
	assert_eq!(progress.get(), 1.0);
}

#[test]
fn test_empty_source_still_reports_done() {
	let mut library = FakeLibrary::default();
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	let mut indexer = Indexer::new(&mut library, &mut store, IndexConfig::default());
	let report = indexer.run(|| Ok(FakeEngine::new(&log))).unwrap();

	assert!(report.result.is_empty());
	assert_eq!(report.stats.total, 0);
	assert_eq!(indexer.progress().get(), 1.0);
	assert_eq!(log.opens.get(), 0);
}

#[test]
fn test_enumeration_failure_is_fatal() {
	let mut library = ten_images();
	library.broken = true;
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	let err = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap_err();

	assert!(format!("{:#}", err).contains("media store unavailable"));
	assert_eq!(store.lookups(), 0);
}

#[test]
fn test_engine_open_failure_is_fatal() {
	let mut library = ten_images();
	let mut store = MemoryStore::new();

	let result = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| -> Result<FakeEngine> { anyhow::bail!("model file missing") });

	let err = result.unwrap_err();
	assert!(format!("{:#}", err).contains("model file missing"));
	assert!(store.is_empty());
}

#[test]
fn test_engine_is_closed_exactly_once() {
	let mut library = ten_images();
	library.add(50, Some("Camera"), Some(b"junk".to_vec()));
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(log.opens.get(), 1);
	assert_eq!(log.closes.get(), 1);
}

#[test]
fn test_cancellation_stops_between_images() {
	let mut library = ten_images();
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());
	let cancel = CancelToken::new();
	let engine_token = cancel.clone();

	let mut indexer = Indexer::new(&mut library, &mut store, IndexConfig::default()).with_cancel(cancel);
	let report = indexer
		.run(|| {
			let mut engine = FakeEngine::new(&log);
			engine.cancel_on_call = Some((3, engine_token));
			Ok(engine)
		})
		.unwrap();

	assert!(report.cancelled);
	assert_eq!(report.result.len(), 3);
	assert_eq!(indexer.progress().get(), 1.0);
	drop(indexer);

	assert_eq!(store.len(), 3);
	assert_eq!(log.closes.get(), 1);
}

#[test]
fn test_duplicate_ids_resolve_once() {
	let mut library = FakeLibrary::default();
	library.add_image(1, 10).add_image(2, 20).add_image(1, 10);
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	let report = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(report.result.ids, vec![ImageId(1), ImageId(2)]);
	assert_eq!(report.stats.duplicates, 1);
	assert_eq!(log.calls.get(), 2);
}

#[test]
fn test_force_and_stale_refresh() {
	let mut library = FakeLibrary::default();
	library.add_image(1, 10).add_image(2, 20);
	let mut store = MemoryStore::new();
	let log = Rc::new(EngineLog::default());

	// Record for id 2 written before the file changed
	let stale = EmbeddingRecord::new(ImageId(2), when(20), glimpse::Embedding::raw(vec![1.0, 0.0, 0.0, 0.0]));
	store.upsert(stale).unwrap();

	let plain = Indexer::new(&mut library, &mut store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();
	assert_eq!(plain.stats.cached, 1);
	assert_eq!(plain.stats.embedded, 1);

	let refresh = IndexConfig { refresh_stale: true, ..IndexConfig::default() };
	let refreshed = Indexer::new(&mut library, &mut store, refresh)
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();
	assert_eq!(refreshed.stats.cached, 1);
	assert_eq!(refreshed.stats.embedded, 1);
	assert_eq!(store.get(ImageId(2)).unwrap().last_modified, when(1));

	let force = IndexConfig { force: true, ..IndexConfig::default() };
	let forced = Indexer::new(&mut library, &mut store, force)
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();
	assert_eq!(forced.stats.embedded, 2);
	assert_eq!(log.calls.get(), 4);
}

#[test]
fn test_sidecar_cache_survives_restart() {
	let dir = tempfile::tempdir().unwrap();
	let mut library = ten_images();
	let log = Rc::new(EngineLog::default());

	let first = Indexer::new(&mut library, SidecarStore::for_library(dir.path()), IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	let (_, store) = Indexer::new(&mut library, SidecarStore::for_library(dir.path()), IndexConfig::default())
		.into_parts();
	assert_eq!(store.ids().unwrap().len(), 10);

	let second = Indexer::new(&mut library, store, IndexConfig::default())
		.run(|| Ok(FakeEngine::new(&log)))
		.unwrap();

	assert_eq!(second.result, first.result);
	assert_eq!(second.stats.cached, 10);
	assert_eq!(log.calls.get(), 10);
}

#[test]
fn test_storage_faults_are_per_item() {
	let mut library = FakeLibrary::default();
	library.add_image(1, 10).add_image(2, 20).add_image(3, 30);
	let mut store = FlakyStore {
		inner: MemoryStore::new(),
		unreadable: ImageId(2),
		unwritable: ImageId(3),
	};
	let old = glimpse::Embedding::raw(vec![1.0, 0.0, 0.0, 0.0]);
	store.inner.upsert(EmbeddingRecord::new(ImageId(2), when(1), old.clone())).unwrap();
	let log = Rc::new(EngineLog::default());

	let mut indexer = Indexer::new(&mut library, &mut store, IndexConfig::default());
	let report = indexer.run(|| Ok(FakeEngine::new(&log))).unwrap();
	let progress = indexer.progress().get();
	drop(indexer);

	// Unreadable record is recomputed, unwritable one is skipped
	assert_eq!(report.result.ids, vec![ImageId(1), ImageId(2)]);
	assert_eq!(report.skipped.len(), 1);
	assert_eq!(report.skipped[0].id, ImageId(3));
	assert_eq!(report.skipped[0].error.kind(), ItemErrorKind::Storage);
	assert_eq!(report.stats.embedded, 2);
	assert_eq!(report.stats.failed, 1);
	assert_eq!(log.calls.get(), 3);
	assert_eq!(progress, 1.0);

	assert_ne!(store.inner.get(ImageId(2)).unwrap().vector, old);
	assert!(store.inner.get(ImageId(3)).is_none());
}
