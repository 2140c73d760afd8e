//! In-memory engine used to drive the wrappers without the native library.
//!
//! A model is created from bytes `MODEL:<tag>` and translates `text` into
//! `<tag>(text)`. The tag `fail` makes every translation fail. Using a handle
//! that was never created or already destroyed panics.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use translatador::{
    Detection, Engine, Model, ModelData, RawHandle, Result, SharedEngine, TrlError,
};

pub const FAILING_TAG: &str = "fail";

#[derive(Default)]
pub struct StubEngine {
    next_handle: AtomicU64,
    models: Mutex<HashMap<RawHandle, String>>,
    batches: Mutex<HashMap<RawHandle, Vec<String>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    translate_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    call_delay: Mutex<Duration>,
}

impl StubEngine {
    pub fn new() -> Arc<Self> {
        let _ = env_logger::builder().is_test(true).try_init();
        Arc::new(Self {
            next_handle: AtomicU64::new(1),
            ..Self::default()
        })
    }

    /// Make translate and resolve calls take at least `delay`
    pub fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.lock() = delay;
    }

    pub fn live_models(&self) -> usize {
        self.models.lock().len()
    }

    pub fn live_batches(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    /// Highest number of translate calls observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn allocate(&self) -> RawHandle {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    fn tag(&self, model: RawHandle) -> String {
        match self.models.lock().get(&model) {
            Some(tag) => tag.clone(),
            None => panic!("use of unknown model handle {}", model),
        }
    }

    fn pause(&self) {
        let delay = *self.call_delay.lock();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    fn run_translation(&self, model: RawHandle, texts: Vec<String>) -> Result<RawHandle> {
        let tag = self.tag(model);
        self.translate_calls.fetch_add(1, Ordering::SeqCst);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.pause();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if tag == FAILING_TAG {
            return Err(TrlError::TranslationError(format!("model {} refused", tag)));
        }

        let translated = texts
            .iter()
            .map(|text| format!("{}({})", tag, text))
            .collect();
        let handle = self.allocate();
        self.batches.lock().insert(handle, translated);
        Ok(handle)
    }
}

impl Engine for StubEngine {
    fn create_model(&self, data: ModelData<'_>) -> Result<RawHandle> {
        let tag = data
            .model
            .strip_prefix(b"MODEL:")
            .and_then(|tag| std::str::from_utf8(tag).ok())
            .ok_or_else(|| TrlError::ModelLoadError("Malformed model data".to_string()))?;
        let handle = self.allocate();
        self.models.lock().insert(handle, tag.to_string());
        Ok(handle)
    }

    unsafe fn clone_model(&self, model: RawHandle) -> Result<RawHandle> {
        let tag = self.tag(model);
        let handle = self.allocate();
        self.models.lock().insert(handle, tag);
        Ok(handle)
    }

    unsafe fn destroy_model(&self, model: RawHandle) {
        if self.models.lock().remove(&model).is_none() {
            panic!("model handle {} destroyed twice", model);
        }
    }

    unsafe fn translate(&self, model: RawHandle, batch: RawHandle) -> Result<RawHandle> {
        let texts = match self.batches.lock().get(&batch) {
            Some(texts) => texts.clone(),
            None => panic!("use of unknown batch handle {}", batch),
        };
        self.run_translation(model, texts)
    }

    unsafe fn translate_plain(&self, model: RawHandle, texts: &[String]) -> Result<RawHandle> {
        self.run_translation(model, texts.to_vec())
    }

    unsafe fn batch_strings(&self, batch: RawHandle) -> Result<Vec<String>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        match self.batches.lock().get(&batch) {
            Some(texts) => Ok(texts.clone()),
            None => panic!("use of unknown batch handle {}", batch),
        }
    }

    unsafe fn destroy_batch(&self, batch: RawHandle) {
        if self.batches.lock().remove(&batch).is_none() {
            panic!("batch handle {} destroyed twice", batch);
        }
    }

    /// French for text starting with "Bonjour", otherwise an unsure English
    fn detect_language(&self, text: &str) -> Result<u64> {
        if text.starts_with("Bonjour") {
            Ok(Detection::pack(8, 0.97))
        } else {
            Ok(Detection::pack(1, 0.42))
        }
    }
}

pub fn shared(engine: &Arc<StubEngine>) -> SharedEngine {
    let engine: SharedEngine = Arc::clone(engine) as SharedEngine;
    engine
}

/// Load a stub model that wraps its input in `tag(...)`
pub fn load_model(engine: &Arc<StubEngine>, tag: &str) -> Model {
    Model::builder()
        .model(format!("MODEL:{}", tag).into_bytes())
        .vocab(b"vocab".to_vec())
        .engine(shared(engine))
        .load()
        .unwrap()
}
