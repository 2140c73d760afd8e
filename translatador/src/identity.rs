//! Pass-through translation
//!
//! Lets the pivot language itself take part in a [`crate::PivotedModel`],
//! next to real models in the same encoder or decoder map.

use crate::batch::Batch;
use crate::error::Result;
use crate::translator::Translator;

/// Returns its input unchanged, as a new plain batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl Translator for Identity {
    type Fork = Identity;

    fn translate_batch(&self, batch: &Batch) -> Result<Batch> {
        Ok(Batch::plain(batch.get()?.iter().cloned()))
    }

    fn fork(&self) -> Result<Identity> {
        Ok(Identity)
    }
}

/// Either a translator or the identity, so both fit in one map
#[derive(Debug, Clone)]
pub enum Stage<T> {
    Identity,
    Translator(T),
}

impl<T> From<T> for Stage<T> {
    fn from(translator: T) -> Self {
        Self::Translator(translator)
    }
}

impl<T: Translator> Translator for Stage<T> {
    type Fork = Stage<T::Fork>;

    fn translate_batch(&self, batch: &Batch) -> Result<Batch> {
        match self {
            Self::Identity => Identity.translate_batch(batch),
            Self::Translator(translator) => translator.translate_batch(batch),
        }
    }

    fn fork(&self) -> Result<Self::Fork> {
        match self {
            Self::Identity => Ok(Stage::Identity),
            Self::Translator(translator) => Ok(Stage::Translator(translator.fork()?)),
        }
    }
}
