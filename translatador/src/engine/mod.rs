//! The translation engine contract
//!
//! Everything above this layer talks to the engine through integer handles.
//! A handle of [`INVALID_HANDLE`] never refers to a live resource; every other
//! value stays live until it is destroyed exactly once.

mod native;

pub use native::NativeEngine;

use crate::error::Result;
use std::sync::Arc;

/// Opaque identifier of an engine-owned resource
pub type RawHandle = u64;

/// Sentinel for "no resource / already destroyed"
pub const INVALID_HANDLE: RawHandle = 0;

/// Raw model data handed to [`Engine::create_model`]
#[derive(Debug, Clone, Copy)]
pub struct ModelData<'a> {
    /// Opaque engine configuration, passed through untouched
    pub config: Option<&'a str>,
    pub model: &'a [u8],
    pub source_vocab: &'a [u8],
    /// `None` when source and target share one vocabulary
    pub target_vocab: Option<&'a [u8]>,
    pub short_list: Option<&'a [u8]>,
}

/// Blocking call contract of the translation engine.
///
/// Implementations must be callable from any thread. They are not required to
/// synchronize calls against the same handle; the wrappers in this crate do that.
///
/// Every method that takes a handle is `unsafe`: an engine is free to treat a
/// handle as a pointer, so only the owning [`crate::Model`] or [`crate::Batch`]
/// may pass one in.
///
/// ```compile_fail
/// fn free_behind_the_owner(engine: &translatador::SharedEngine) {
///     engine.destroy_model(1);
/// }
/// ```
pub trait Engine: Send + Sync {
    /// Load a model. Malformed data fails with `ModelLoadError`.
    fn create_model(&self, data: ModelData<'_>) -> Result<RawHandle>;

    /// Clone the state of a live model into a new, independent handle
    ///
    /// # Safety
    /// `model` was returned by this engine and has not been destroyed.
    unsafe fn clone_model(&self, model: RawHandle) -> Result<RawHandle>;

    /// # Safety
    /// `model` was returned by this engine, is destroyed at most once, and is
    /// not used by any other call while or after it is destroyed.
    unsafe fn destroy_model(&self, model: RawHandle);

    /// Translate a batch produced by an earlier call, keeping its annotations
    ///
    /// # Safety
    /// `model` and `batch` were returned by this engine and stay live for the
    /// duration of the call. No other call uses `model` at the same time.
    unsafe fn translate(&self, model: RawHandle, batch: RawHandle) -> Result<RawHandle>;

    /// Translate plain strings
    ///
    /// # Safety
    /// As for [`Engine::translate`], for `model`.
    unsafe fn translate_plain(&self, model: RawHandle, texts: &[String]) -> Result<RawHandle>;

    /// # Safety
    /// `batch` was returned by this engine and stays live for the duration of the call.
    unsafe fn batch_strings(&self, batch: RawHandle) -> Result<Vec<String>>;

    /// # Safety
    /// `batch` was returned by this engine, is destroyed at most once, and is
    /// not used by any other call while or after it is destroyed.
    unsafe fn destroy_batch(&self, batch: RawHandle);

    /// Detect the language of `text`, packed as described in [`crate::detect::Detection::unpack`]
    fn detect_language(&self, text: &str) -> Result<u64>;
}

/// Shared, type-erased engine reference
pub type SharedEngine = Arc<dyn Engine>;

/// Whether two engine references point at the same engine instance
pub(crate) fn same_engine(a: &SharedEngine, b: &SharedEngine) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
