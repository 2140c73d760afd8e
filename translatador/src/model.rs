//! Translation models
//!
//! Provides the safe wrapper around an engine model handle and the builder
//! that loads one from raw model data.

use crate::batch::{Batch, BatchSource};
use crate::engine::{ModelData, RawHandle, SharedEngine};
use crate::error::{ResourceKind, Result, TrlError};
use crate::handle::NativeHandle;
use crate::translator::Translator;
use std::fmt;
use std::sync::Arc;

/// Builder for a [`Model`]
///
/// # Example
/// ```no_run
/// use translatador::{Model, Translator};
///
/// let model = Model::builder()
///     .model(std::fs::read("model.enfr.intgemm.alphas.bin")?)
///     .vocab(std::fs::read("vocab.enfr.spm")?)
///     .short_list(std::fs::read("lex.50.50.enfr.s2t.bin")?)
///     .load()?;
/// println!("{}", model.translate("Hello world")?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Default)]
pub struct ModelBuilder {
    config: Option<String>,
    model: Option<Vec<u8>>,
    source_vocab: Option<Vec<u8>>,
    target_vocab: Option<Vec<u8>>,
    short_list: Option<Vec<u8>>,
    engine: Option<SharedEngine>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Optional engine configuration. Passed to the engine untouched; the engine
    /// falls back to its own defaults when none is given.
    pub fn config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// Required model binary
    pub fn model(mut self, model: impl Into<Vec<u8>>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Required vocabulary shared by the source and target language
    pub fn vocab(mut self, vocab: impl Into<Vec<u8>>) -> Self {
        self.source_vocab = Some(vocab.into());
        self.target_vocab = None;
        self
    }

    /// Required vocabularies, distinct for the source and target language
    pub fn vocabs(mut self, source: impl Into<Vec<u8>>, target: impl Into<Vec<u8>>) -> Self {
        self.source_vocab = Some(source.into());
        self.target_vocab = Some(target.into());
        self
    }

    /// Optional short list restricting the output vocabulary
    pub fn short_list(mut self, short_list: impl Into<Vec<u8>>) -> Self {
        self.short_list = Some(short_list.into());
        self
    }

    /// Engine to load into. Defaults to the process-wide native engine.
    pub fn engine(mut self, engine: SharedEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Load the model
    ///
    /// # Errors
    /// `ConfigurationError` if the model or vocabulary is missing, `ModelLoadError`
    /// if the engine rejects the data.
    pub fn load(self) -> Result<Model> {
        let model = self
            .model
            .ok_or_else(|| TrlError::ConfigurationError("Missing translation model binary".to_string()))?;
        let source_vocab = self.source_vocab.ok_or_else(|| {
            TrlError::ConfigurationError("Missing translation model vocabularies".to_string())
        })?;
        let target_vocab = self.target_vocab.filter(|target| *target != source_vocab);

        let engine = match self.engine {
            Some(engine) => engine,
            None => crate::loader::shared_engine()?,
        };

        let raw = engine.create_model(ModelData {
            config: self.config.as_deref(),
            model: &model,
            source_vocab: &source_vocab,
            target_vocab: target_vocab.as_deref(),
            short_list: self.short_list.as_deref(),
        })?;

        log::info!(
            "Loaded translation model ({} bytes, {} vocabulary)",
            model.len(),
            if target_vocab.is_some() { "split" } else { "shared" }
        );

        Ok(Model::from_raw(engine, raw))
    }
}

/// A loaded translation model.
///
/// Calls on one instance are serialized; [`Translator::fork`] creates an
/// independent instance for parallel use. The engine model is freed by
/// [`Model::close`] or on drop, whichever comes first.
pub struct Model {
    handle: NativeHandle,
    engine: SharedEngine,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub(crate) fn from_raw(engine: SharedEngine, raw: RawHandle) -> Self {
        Self {
            handle: NativeHandle::new(ResourceKind::Model, raw),
            engine,
        }
    }

    /// Free the engine model. Waits for an in-flight call; idempotent.
    pub fn close(&self) {
        // SAFETY: close runs `destroy` once, under the exclusive lock, so no
        // translation is using the model
        if self.handle.close(|raw| unsafe { self.engine.destroy_model(raw) }) {
            log::debug!("Destroyed translation model");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl Translator for Model {
    type Fork = Model;

    fn translate_batch(&self, batch: &Batch) -> Result<Batch> {
        self.handle.with_exclusive(|model, _| {
            // SAFETY: the model is held under its exclusive lock and a native
            // source under its shared lock; `with_source` only hands out native
            // handles created by `self.engine`
            let raw = batch.with_source(&self.engine, |source| match source {
                BatchSource::Native(source) => unsafe { self.engine.translate(model, source) },
                BatchSource::Plain(texts) => unsafe { self.engine.translate_plain(model, texts) },
            })?;
            Ok(Batch::native(Arc::clone(&self.engine), raw))
        })
    }

    fn fork(&self) -> Result<Model> {
        self.handle.with_exclusive(|model, _| {
            // SAFETY: live model held under its exclusive lock
            let raw = unsafe { self.engine.clone_model(model) }?;
            log::debug!("Forked translation model");
            Ok(Model::from_raw(Arc::clone(&self.engine), raw))
        })
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("closed", &self.is_closed())
            .finish()
    }
}
