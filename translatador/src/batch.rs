//! Translation batches
//!
//! A batch is either plain strings supplied by the caller, or the engine-owned
//! result of a translation. Engine results keep the engine's annotations, so
//! text passed through several models should stay in batch form for as long
//! as possible and only be resolved at the end.

use crate::engine::{same_engine, RawHandle, SharedEngine};
use crate::error::{ResourceKind, Result, TrlError};
use crate::handle::NativeHandle;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Strings resolved from a native batch, filled at most once
type Resolved = OnceCell<Arc<[String]>>;

enum Contents {
    Native {
        handle: NativeHandle<Resolved>,
        engine: SharedEngine,
    },
    Plain(RwLock<Option<Arc<[String]>>>),
}

/// Source strings as seen by a model while it translates a batch
pub(crate) enum BatchSource<'a> {
    Native(RawHandle),
    Plain(&'a [String]),
}

/// A set of strings to translate, or the result of a translation.
///
/// Native batches hold engine memory until [`Batch::close`] is called or the
/// batch is dropped.
pub struct Batch {
    contents: Contents,
}

impl Batch {
    /// Wrap plain strings. No engine resource is involved.
    pub fn plain<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        Self {
            contents: Contents::Plain(RwLock::new(Some(Arc::from(texts)))),
        }
    }

    /// Take ownership of a batch handle returned by `engine`
    pub(crate) fn native(engine: SharedEngine, raw: RawHandle) -> Self {
        Self {
            contents: Contents::Native {
                handle: NativeHandle::new(ResourceKind::Batch, raw),
                engine,
            },
        }
    }

    /// The strings of this batch.
    ///
    /// For a native batch the first call resolves the strings through the engine;
    /// every later call, concurrent or not, returns the same cached strings.
    pub fn get(&self) -> Result<Arc<[String]>> {
        match &self.contents {
            Contents::Native { handle, engine } => handle.with_shared(|raw, resolved| {
                resolve(engine, raw, resolved).map(Arc::clone)
            }),
            Contents::Plain(texts) => texts
                .read()
                .clone()
                .ok_or(TrlError::ResourceClosedError(ResourceKind::Batch)),
        }
    }

    /// Number of strings in the batch
    pub fn len(&self) -> Result<usize> {
        Ok(self.get()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the batch is backed by an engine resource
    pub fn is_native(&self) -> bool {
        matches!(self.contents, Contents::Native { .. })
    }

    /// Release the batch. Waits for in-flight reads; idempotent.
    pub fn close(&self) {
        match &self.contents {
            Contents::Native { handle, engine } => {
                // SAFETY: close runs `destroy` once, under the exclusive lock,
                // with the handle this engine returned
                if handle.close(|raw| unsafe { engine.destroy_batch(raw) }) {
                    log::debug!("Destroyed native batch");
                }
            }
            Contents::Plain(texts) => {
                texts.write().take();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        match &self.contents {
            Contents::Native { handle, .. } => handle.is_closed(),
            Contents::Plain(texts) => texts.read().is_none(),
        }
    }

    /// Run `f` over the source strings as `engine` should see them.
    ///
    /// The batch stays under a shared lock for the whole call, so it cannot be
    /// closed while `f` runs. A native batch from another engine instance is
    /// handed over as resolved strings.
    pub(crate) fn with_source<R>(
        &self,
        engine: &SharedEngine,
        f: impl FnOnce(BatchSource<'_>) -> Result<R>,
    ) -> Result<R> {
        match &self.contents {
            Contents::Native {
                handle,
                engine: owner,
            } => handle.with_shared(|raw, resolved| {
                if same_engine(engine, owner) {
                    f(BatchSource::Native(raw))
                } else {
                    let texts = resolve(owner, raw, resolved)?;
                    f(BatchSource::Plain(&texts[..]))
                }
            }),
            Contents::Plain(texts) => {
                let texts = texts.read();
                match texts.as_deref() {
                    Some(texts) => f(BatchSource::Plain(texts)),
                    None => Err(TrlError::ResourceClosedError(ResourceKind::Batch)),
                }
            }
        }
    }
}

fn resolve<'a>(engine: &SharedEngine, raw: RawHandle, resolved: &'a Resolved) -> Result<&'a Arc<[String]>> {
    // SAFETY: callers hold the shared lock of the handle `engine` returned, so
    // it cannot be destroyed during the call
    resolved.get_or_try_init(|| unsafe { engine.batch_strings(raw) }.map(Arc::from))
}

impl Drop for Batch {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("native", &self.is_native())
            .field("closed", &self.is_closed())
            .finish()
    }
}
