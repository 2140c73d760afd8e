//! Translatador - thread-safe bindings to the translatador translation engine
//!
//! This crate loads the native engine once per process and wraps its model and
//! batch handles so they can be shared between threads, composed into pipelines
//! and fanned out through a pivot language.
//!
//! # Resources
//!
//! ```text
//! Model  ──translate_batch──▶  Batch (engine result, resolved lazily)
//!   │                            ▲
//!   └──fork──▶ Model             └── Batch::plain(strings)
//! ```
//!
//! `Model` and `Batch` free their engine resource on `close()` or on drop,
//! whichever comes first. Calls on a closed resource fail with
//! [`TrlError::ResourceClosedError`].
//!
//! # Example
//!
//! ```no_run
//! use translatador::{compose, Model, Translator};
//!
//! let load = |pair: &str| {
//!     Model::builder()
//!         .model(std::fs::read(format!("model.{pair}.intgemm.alphas.bin"))?)
//!         .vocab(std::fs::read(format!("vocab.{pair}.spm"))?)
//!         .load()
//! };
//! let de_en = load("deen")?;
//! let en_fr = load("enfr")?;
//!
//! let de_fr = compose(&de_en, &en_fr);
//! println!("{}", de_fr.translate("Guten Morgen")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod compose;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod ffi;
mod handle;
pub mod identity;
pub mod loader;
pub mod model;
pub mod pivot;
pub mod translator;

pub use batch::Batch;
pub use compose::{compose, ComposedModel};
pub use config::LoaderConfig;
pub use detect::{DetectedLanguage, Detection, LanguageDetector};
pub use engine::{Engine, ModelData, NativeEngine, RawHandle, SharedEngine, INVALID_HANDLE};
pub use error::{ResourceKind, Result, TrlError};
pub use identity::{Identity, Stage};
pub use model::{Model, ModelBuilder};
pub use pivot::{FanOutPolicy, PivotedModel};
pub use translator::Translator;

pub use translatador_platform::{is_supported_platform, Arch, Os, Platform, PlatformError};
