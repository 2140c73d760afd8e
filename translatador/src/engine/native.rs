//! Engine implementation backed by the native translatador library

use super::{Engine, ModelData, RawHandle};
use crate::detect::Detection;
use crate::error::{Result, TrlError};
use crate::ffi::{TrlDetectedLangInfo, TrlFunctions, TrlModel, TrlString, TRL_OK};
use libloading::Library;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::fmt;
use std::path::Path;
use std::ptr;

/// Strings of one translated (or to-be-translated) batch.
///
/// Handed out to callers as a `RawHandle` through `Box::into_raw`.
struct NativeBatch {
    strings: Vec<*const TrlString>,
}

/// A loaded translatador library
pub struct NativeEngine {
    functions: TrlFunctions,
    // Dropped after `functions`; the table points into this library
    _library: Library,
}

impl NativeEngine {
    /// Open the library at `path` and resolve all of its symbols
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: Library::new runs the library's initializers. The path points
        // at an artifact built for the detected platform, and the library is only
        // used through the typed table resolved below.
        let library = unsafe {
            Library::new(path).map_err(|e| {
                TrlError::LibraryLoadError(format!("Failed to load {}: {}", path.display(), e))
            })?
        };
        let functions = TrlFunctions::load(&library)?;

        log::info!("Loaded translatador library from {}", path.display());

        Ok(Self {
            functions,
            _library: library,
        })
    }

    /// Take the thread-local error message left by the last failed call
    fn last_error(&self) -> String {
        // SAFETY: trl_get_last_error returns either null or a malloc'd string
        // that the caller owns and must free().
        unsafe {
            let message = (self.functions.trl_get_last_error)();
            if message.is_null() {
                return "unknown engine error".to_string();
            }
            let text = CStr::from_ptr(message).to_string_lossy().into_owned();
            libc::free(message as *mut c_void);
            text
        }
    }

    fn model_ptr(handle: RawHandle) -> *const TrlModel {
        handle as usize as *const TrlModel
    }

    fn into_handle(batch: NativeBatch) -> RawHandle {
        Box::into_raw(Box::new(batch)) as usize as RawHandle
    }

    /// # Safety
    /// `handle` must come from `into_handle` and not have been destroyed yet.
    unsafe fn batch_ref<'a>(handle: RawHandle) -> &'a NativeBatch {
        &*(handle as usize as *const NativeBatch)
    }

    fn destroy_strings(&self, strings: &[*const TrlString]) {
        for &string in strings {
            if !string.is_null() {
                // SAFETY: every non-null entry was produced by trl_create_string or
                // trl_translate and is destroyed exactly once here.
                unsafe { (self.functions.trl_destroy_string)(string) };
            }
        }
    }

    fn translate_strings(&self, model: RawHandle, source: &[*const TrlString]) -> Result<RawHandle> {
        let mut target: Vec<*const TrlString> = vec![ptr::null(); source.len()];

        // SAFETY: trl_translate reads `count` source strings and, on success only,
        // writes `count` new strings into `target`.
        // 1. model is a live handle held under the caller's model lock
        // 2. source and target both hold exactly `count` entries
        let status = unsafe {
            (self.functions.trl_translate)(
                Self::model_ptr(model),
                source.as_ptr(),
                target.as_mut_ptr(),
                source.len(),
            )
        };

        if status != TRL_OK {
            return Err(TrlError::TranslationError(self.last_error()));
        }

        Ok(Self::into_handle(NativeBatch { strings: target }))
    }
}

impl fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeEngine").finish_non_exhaustive()
    }
}

/// Create one engine string per text. If any creation fails, the strings
/// created so far are handed to `destroy` and nothing is returned.
fn create_strings(
    texts: &[String],
    create: impl Fn(&CStr) -> *const TrlString,
    destroy: impl FnOnce(&[*const TrlString]),
) -> Result<Vec<*const TrlString>> {
    let mut strings = Vec::with_capacity(texts.len());
    for text in texts {
        let created = match CString::new(text.as_str()) {
            Ok(text) => create(&text),
            Err(_) => {
                destroy(&strings);
                return Err(TrlError::TranslationError(
                    "Text contains an interior NUL byte".to_string(),
                ));
            }
        };
        if created.is_null() {
            destroy(&strings);
            return Err(TrlError::FfiError("trl_create_string returned null".to_string()));
        }
        strings.push(created);
    }
    Ok(strings)
}

/// Copy an engine-owned string, rejecting text that is not UTF-8
fn utf8_string(text: &CStr) -> Result<String> {
    text.to_str()
        .map(str::to_owned)
        .map_err(|e| TrlError::FfiError(format!("Engine returned invalid UTF-8: {}", e)))
}

fn optional_buffer(buffer: Option<&[u8]>) -> (*const c_char, usize) {
    match buffer {
        Some(bytes) if !bytes.is_empty() => (bytes.as_ptr() as *const c_char, bytes.len()),
        _ => (ptr::null(), 0),
    }
}

impl Engine for NativeEngine {
    fn create_model(&self, data: ModelData<'_>) -> Result<RawHandle> {
        let config = data
            .config
            .map(CString::new)
            .transpose()
            .map_err(|e| TrlError::ConfigurationError(format!("Invalid model configuration: {}", e)))?;
        let config_ptr = config.as_ref().map_or(ptr::null(), |c| c.as_ptr());
        let (target_ptr, target_size) = optional_buffer(data.target_vocab);
        let (short_list_ptr, short_list_size) = optional_buffer(data.short_list);

        // SAFETY: trl_create_model copies every buffer it is given and does not
        // keep the pointers. Optional buffers are passed as (null, 0).
        let model = unsafe {
            (self.functions.trl_create_model)(
                config_ptr,
                data.model.as_ptr() as *const c_char,
                data.model.len(),
                data.source_vocab.as_ptr() as *const c_char,
                data.source_vocab.len(),
                target_ptr,
                target_size,
                short_list_ptr,
                short_list_size,
            )
        };

        if model.is_null() {
            return Err(TrlError::ModelLoadError(self.last_error()));
        }
        Ok(model as usize as RawHandle)
    }

    unsafe fn clone_model(&self, model: RawHandle) -> Result<RawHandle> {
        // SAFETY: model is a live handle per the trait contract; the clone shares
        // only immutable model data
        let clone = unsafe { (self.functions.trl_clone_model)(Self::model_ptr(model)) };
        if clone.is_null() {
            return Err(TrlError::ModelLoadError(self.last_error()));
        }
        Ok(clone as usize as RawHandle)
    }

    unsafe fn destroy_model(&self, model: RawHandle) {
        // SAFETY: called exactly once per live handle, per the trait contract
        unsafe { (self.functions.trl_destroy_model)(Self::model_ptr(model)) };
    }

    unsafe fn translate(&self, model: RawHandle, batch: RawHandle) -> Result<RawHandle> {
        // SAFETY: the batch came from `into_handle` and stays live for the call,
        // per the trait contract
        let source = unsafe { Self::batch_ref(batch) };
        self.translate_strings(model, &source.strings)
    }

    unsafe fn translate_plain(&self, model: RawHandle, texts: &[String]) -> Result<RawHandle> {
        let source = create_strings(
            texts,
            // SAFETY: trl_create_string copies the null-terminated input
            |text| unsafe { (self.functions.trl_create_string)(text.as_ptr()) },
            |created| self.destroy_strings(created),
        )?;

        let result = self.translate_strings(model, &source);
        self.destroy_strings(&source);
        result
    }

    unsafe fn batch_strings(&self, batch: RawHandle) -> Result<Vec<String>> {
        // SAFETY: as in `translate`, the batch stays live for the call
        let batch = unsafe { Self::batch_ref(batch) };
        batch
            .strings
            .iter()
            .map(|&string| {
                // SAFETY: trl_get_string_utf returns a pointer into `string`,
                // which stays alive for the duration of this copy.
                unsafe {
                    let utf = (self.functions.trl_get_string_utf)(string);
                    if utf.is_null() {
                        return Err(TrlError::FfiError("trl_get_string_utf returned null".to_string()));
                    }
                    utf8_string(CStr::from_ptr(utf))
                }
            })
            .collect()
    }

    unsafe fn destroy_batch(&self, batch: RawHandle) {
        // SAFETY: called exactly once per live handle from `into_handle`, per
        // the trait contract
        let batch = unsafe { Box::from_raw(batch as usize as *mut NativeBatch) };
        self.destroy_strings(&batch.strings);
    }

    fn detect_language(&self, text: &str) -> Result<u64> {
        let text = CString::new(text)
            .map_err(|e| TrlError::TranslationError(format!("Invalid text: {}", e)))?;
        let mut info = TrlDetectedLangInfo::default();

        // SAFETY: text is null-terminated and info is a valid out-pointer
        let status = unsafe { (self.functions.trl_detect_language)(text.as_ptr(), &mut info) };
        if status != TRL_OK {
            return Err(TrlError::TranslationError(self.last_error()));
        }

        Ok(Detection::pack(info.lang as u8, info.confidence))
    }
}
