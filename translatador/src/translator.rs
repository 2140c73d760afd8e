//! The common interface of models and model compositions

use crate::batch::Batch;
use crate::compose::ComposedModel;
use crate::error::{Result, TrlError};
use std::sync::Arc;

/// Something that translates batches from one language to another.
///
/// Implementations are thread-safe but may serialize calls internally; use
/// [`Translator::fork`] to get an instance that runs in parallel with this one.
pub trait Translator: Send + Sync {
    /// What [`Translator::fork`] produces
    type Fork: Translator;

    /// Translate every string of `batch`, returning a new batch owned by the caller
    fn translate_batch(&self, batch: &Batch) -> Result<Batch>;

    /// An independent copy that can be used concurrently with this one.
    ///
    /// The fork has its own lifetime: closing either side does not affect the other.
    fn fork(&self) -> Result<Self::Fork>;

    fn translate(&self, text: &str) -> Result<String> {
        self.translate_texts(&[text])?
            .pop()
            .ok_or_else(|| TrlError::TranslationError("Engine returned no translation".to_string()))
    }

    /// Translate plain strings; the intermediate batches are released before returning
    fn translate_texts<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<String>> {
        let source = Batch::plain(texts.iter().map(|text| text.as_ref().to_string()));
        let target = self.translate_batch(&source)?;
        let translated = target.get()?.to_vec();
        Ok(translated)
    }

    /// Pipeline that feeds the output of `self` into `next`
    fn then<N: Translator>(self, next: N) -> ComposedModel<Self, N>
    where
        Self: Sized,
    {
        ComposedModel::new(self, next)
    }
}

impl<T: Translator + ?Sized> Translator for &T {
    type Fork = T::Fork;

    fn translate_batch(&self, batch: &Batch) -> Result<Batch> {
        (**self).translate_batch(batch)
    }

    fn fork(&self) -> Result<Self::Fork> {
        (**self).fork()
    }
}

impl<T: Translator + ?Sized> Translator for Arc<T> {
    type Fork = T::Fork;

    fn translate_batch(&self, batch: &Batch) -> Result<Batch> {
        (**self).translate_batch(batch)
    }

    fn fork(&self) -> Result<Self::Fork> {
        (**self).fork()
    }
}
