//! Many-to-many translation through a common pivot language
//!
//! A [`PivotedModel`] holds a set of encoders (source language -> pivot) and a
//! set of decoders (pivot -> target language). One input is encoded once and the
//! pivot batch is then decoded by every decoder.

use crate::batch::Batch;
use crate::error::{Result, TrlError};
use crate::translator::Translator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// What to do when one decoder of a fan-out fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutPolicy {
    /// Abort the whole fan-out with the first decoder error
    #[default]
    FailFast,
    /// Skip targets whose decoder fails to translate and keep the rest.
    /// Closed models still abort the fan-out.
    BestEffort,
}

/// Translates from any known source language into every known target language.
///
/// Like [`crate::ComposedModel`], a pivoted model built over `&Model` borrows its
/// models and never closes them. Calls may serialize on the underlying models;
/// use [`PivotedModel::fork`] for an instance that runs in parallel.
///
/// To translate from or into the pivot language itself, use [`crate::Stage`]
/// as `T` and map the pivot language to [`crate::Stage::Identity`].
pub struct PivotedModel<A, B, T> {
    encoders: HashMap<A, T>,
    decoders: HashMap<B, T>,
    fan_out: FanOutPolicy,
}

impl<A, B, T> PivotedModel<A, B, T>
where
    A: Eq + Hash,
    B: Eq + Hash + Clone,
    T: Translator,
{
    pub fn new(encoders: HashMap<A, T>, decoders: HashMap<B, T>) -> Self {
        Self {
            encoders,
            decoders,
            fan_out: FanOutPolicy::default(),
        }
    }

    pub fn with_fan_out(mut self, fan_out: FanOutPolicy) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn fan_out(&self) -> FanOutPolicy {
        self.fan_out
    }

    /// Languages that can be translated from
    pub fn sources(&self) -> impl Iterator<Item = &A> {
        self.encoders.keys()
    }

    /// Languages every translation is produced in
    pub fn targets(&self) -> impl Iterator<Item = &B> {
        self.decoders.keys()
    }

    /// Translate `text` from `source` into every target language.
    ///
    /// An unknown `source` yields an empty map, not an error.
    pub fn translate(&self, source: &A, text: &str) -> Result<HashMap<B, String>> {
        let Some(encoder) = self.encoders.get(source) else {
            return Ok(HashMap::new());
        };

        let input = Batch::plain([text]);
        let pivot = encoder.translate_batch(&input)?;
        input.close();

        let results = self.decode_all(|decoder| {
            let target = decoder.translate_batch(&pivot)?;
            let text = target.get()?.first().cloned();
            text.ok_or_else(|| TrlError::TranslationError("Engine returned no translation".to_string()))
        });

        // Every decoder is done with the pivot by now, including on early errors
        pivot.close();
        results
    }

    /// Translate `batch` from `source` into every target language, keeping each
    /// result in batch form.
    ///
    /// An unknown `source` yields an empty map, not an error.
    pub fn translate_batch(&self, source: &A, batch: &Batch) -> Result<HashMap<B, Batch>> {
        let Some(encoder) = self.encoders.get(source) else {
            return Ok(HashMap::new());
        };

        let pivot = encoder.translate_batch(batch)?;
        let results = self.decode_all(|decoder| decoder.translate_batch(&pivot));
        pivot.close();
        results
    }

    /// Fork every encoder and decoder into an independent pivoted model
    pub fn fork(&self) -> Result<PivotedModel<A, B, T::Fork>>
    where
        A: Clone,
    {
        let encoders = self
            .encoders
            .iter()
            .map(|(lang, model)| Ok((lang.clone(), model.fork()?)))
            .collect::<Result<HashMap<_, _>>>()?;
        let decoders = self
            .decoders
            .iter()
            .map(|(lang, model)| Ok((lang.clone(), model.fork()?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(PivotedModel::new(encoders, decoders).with_fan_out(self.fan_out))
    }

    fn decode_all<R>(&self, decode: impl Fn(&T) -> Result<R>) -> Result<HashMap<B, R>> {
        let mut results = HashMap::with_capacity(self.decoders.len());
        for (target, decoder) in &self.decoders {
            match decode(decoder) {
                Ok(result) => {
                    results.insert(target.clone(), result);
                }
                Err(TrlError::TranslationError(message)) if self.fan_out == FanOutPolicy::BestEffort => {
                    log::warn!("Skipping pivot target after decoder failure: {}", message);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }
}
