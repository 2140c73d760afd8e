//! Lock discipline for engine handles
//!
//! A [`NativeHandle`] owns one raw handle. Uses run under a shared or exclusive
//! lock and always observe a live handle; closing takes the exclusive lock, so it
//! waits for in-flight uses and no use ever sees the handle change mid-call.

use crate::engine::{RawHandle, INVALID_HANDLE};
use crate::error::{ResourceKind, Result, TrlError};
use parking_lot::RwLock;

struct HandleState<T> {
    raw: RawHandle,
    attached: T,
}

/// A raw handle plus per-handle state `T` that is reset when the handle closes
pub(crate) struct NativeHandle<T = ()> {
    kind: ResourceKind,
    state: RwLock<HandleState<T>>,
}

impl<T: Default> NativeHandle<T> {
    pub(crate) fn new(kind: ResourceKind, raw: RawHandle) -> Self {
        Self {
            kind,
            state: RwLock::new(HandleState {
                raw,
                attached: T::default(),
            }),
        }
    }

    /// Run `f` with the live handle under a shared lock
    pub(crate) fn with_shared<R>(&self, f: impl FnOnce(RawHandle, &T) -> Result<R>) -> Result<R> {
        let state = self.state.read();
        if state.raw == INVALID_HANDLE {
            return Err(TrlError::ResourceClosedError(self.kind));
        }
        f(state.raw, &state.attached)
    }

    /// Run `f` with the live handle under the exclusive lock
    pub(crate) fn with_exclusive<R>(
        &self,
        f: impl FnOnce(RawHandle, &mut T) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.state.write();
        if state.raw == INVALID_HANDLE {
            return Err(TrlError::ResourceClosedError(self.kind));
        }
        let HandleState { raw, attached } = &mut *state;
        f(*raw, attached)
    }

    /// Destroy the handle on the first call; later calls do nothing.
    ///
    /// Returns whether this call destroyed it.
    pub(crate) fn close(&self, destroy: impl FnOnce(RawHandle)) -> bool {
        let mut state = self.state.write();
        if state.raw == INVALID_HANDLE {
            return false;
        }
        destroy(state.raw);
        state.raw = INVALID_HANDLE;
        state.attached = T::default();
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.read().raw == INVALID_HANDLE
    }
}
