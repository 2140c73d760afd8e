//! Two-model pipelines through a pivot language

use crate::batch::Batch;
use crate::error::Result;
use crate::translator::Translator;

/// Applies `first`, then `second`.
///
/// Useful to translate between two languages without a model that maps
/// directly between them. The intermediate batch is passed on in engine form,
/// so annotations from `first` survive into `second`.
///
/// Built over references (`compose(&a, &b)`), the pipeline borrows its models
/// and cannot outlive them; it never closes them. A forked pipeline owns the
/// forked models and frees them when dropped.
#[derive(Debug, Clone)]
pub struct ComposedModel<F, S> {
    first: F,
    second: S,
}

/// Pipeline that applies `first`, then `second`
pub fn compose<F: Translator, S: Translator>(first: F, second: S) -> ComposedModel<F, S> {
    ComposedModel::new(first, second)
}

impl<F, S> ComposedModel<F, S> {
    pub fn new(first: F, second: S) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &F {
        &self.first
    }

    pub fn second(&self) -> &S {
        &self.second
    }

    pub fn into_parts(self) -> (F, S) {
        (self.first, self.second)
    }
}

impl<F: Translator, S: Translator> Translator for ComposedModel<F, S> {
    type Fork = ComposedModel<F::Fork, S::Fork>;

    fn translate_batch(&self, batch: &Batch) -> Result<Batch> {
        let pivot = self.first.translate_batch(batch)?;
        let target = self.second.translate_batch(&pivot);
        pivot.close();
        target
    }

    /// Forks both stages; a pipeline never mixes forked and shared stages
    fn fork(&self) -> Result<Self::Fork> {
        let first = self.first.fork()?;
        let second = self.second.fork()?;
        Ok(ComposedModel::new(first, second))
    }
}
