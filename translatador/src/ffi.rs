//! Low-level FFI bindings to the translatador C API
//!
//! All function signatures match `translatador.h` exactly. The symbols are
//! resolved at runtime from the extracted platform library.

use crate::error::{Result, TrlError};
use libloading::Library;
use std::os::raw::{c_char, c_float, c_int};

/// Opaque pointer to TrlModel
#[repr(C)]
pub struct TrlModel {
    _private: [u8; 0],
}

/// Opaque pointer to TrlString
#[repr(C)]
pub struct TrlString {
    _private: [u8; 0],
}

/// `TRL_OK` return value of fallible calls
pub const TRL_OK: c_int = 0;

/// Detected language + confidence pair (matches TrlDetectedLangInfo in C)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TrlDetectedLangInfo {
    pub lang: c_int,
    pub confidence: c_float,
}

/// FFI function signatures for the translatador library
pub struct TrlFunctions {
    pub trl_get_last_error: unsafe extern "C" fn() -> *mut c_char,

    pub trl_create_model: unsafe extern "C" fn(
        yaml_config: *const c_char,
        model: *const c_char,
        model_size: usize,
        source_vocab: *const c_char,
        source_vocab_size: usize,
        target_vocab: *const c_char,
        target_vocab_size: usize,
        short_list: *const c_char,
        short_list_size: usize,
    ) -> *const TrlModel,
    pub trl_clone_model: unsafe extern "C" fn(model: *const TrlModel) -> *const TrlModel,
    pub trl_destroy_model: unsafe extern "C" fn(model: *const TrlModel),

    pub trl_create_string: unsafe extern "C" fn(utf: *const c_char) -> *const TrlString,
    pub trl_get_string_utf: unsafe extern "C" fn(string: *const TrlString) -> *const c_char,
    pub trl_destroy_string: unsafe extern "C" fn(string: *const TrlString),

    pub trl_translate: unsafe extern "C" fn(
        model: *const TrlModel,
        source: *const *const TrlString,
        target: *mut *const TrlString,
        count: usize,
    ) -> c_int,

    pub trl_detect_language:
        unsafe extern "C" fn(string: *const c_char, result: *mut TrlDetectedLangInfo) -> c_int,
}

macro_rules! symbol {
    ($library:expr, $name:literal) => {
        *$library
            .get(concat!($name, "\0").as_bytes())
            .map_err(|e| TrlError::FfiError(format!("Missing {}: {}", $name, e)))?
    };
}

impl TrlFunctions {
    /// Load all required function symbols from the library
    pub fn load(library: &Library) -> Result<Self> {
        // SAFETY: Symbols are looked up in a library built from translatador.h.
        // 1. Every symbol name is null-terminated by the macro
        // 2. Missing symbols surface as FfiError instead of dangling pointers
        // 3. The caller keeps `library` alive for as long as the table is used
        unsafe {
            Ok(Self {
                trl_get_last_error: symbol!(library, "trl_get_last_error"),
                trl_create_model: symbol!(library, "trl_create_model"),
                trl_clone_model: symbol!(library, "trl_clone_model"),
                trl_destroy_model: symbol!(library, "trl_destroy_model"),
                trl_create_string: symbol!(library, "trl_create_string"),
                trl_get_string_utf: symbol!(library, "trl_get_string_utf"),
                trl_destroy_string: symbol!(library, "trl_destroy_string"),
                trl_translate: symbol!(library, "trl_translate"),
                trl_detect_language: symbol!(library, "trl_detect_language"),
            })
        }
    }
}
