//! Native library loader configuration

use crate::error::{Result, TrlError};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

pub const NATIVES_DIR_VAR: &str = "TRANSLATADOR_NATIVES_DIR";
pub const SCRATCH_DIR_VAR: &str = "TRANSLATADOR_SCRATCH_DIR";
pub const LIBRARY_NAME_VAR: &str = "TRANSLATADOR_LIBRARY_NAME";

/// Where the native library comes from and where it is unpacked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Base name of the artifact, without platform prefix, classifier or extension
    pub library_name: String,

    /// Directory holding one artifact per platform
    pub natives_dir: PathBuf,

    /// Private directory the artifact is copied into before loading
    pub scratch_dir: PathBuf,

    /// Artifact bytes bundled into the binary (`include_bytes!`).
    /// Takes precedence over `natives_dir`.
    #[serde(skip)]
    pub embedded: Option<&'static [u8]>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            library_name: "translatador".to_string(),
            natives_dir: exe_dir.join("natives"),
            scratch_dir: env::temp_dir().join("translatador-natives"),
            embedded: None,
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by `TRANSLATADOR_*` environment variables
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| env::var_os(name))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TrlError::ConfigurationError(format!("Invalid loader configuration: {}", e)))
    }

    /// Bundle the artifact bytes instead of reading them from `natives_dir`
    pub fn with_embedded(mut self, artifact: &'static [u8]) -> Self {
        self.embedded = Some(artifact);
        self
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<OsString>) -> Self {
        if let Some(dir) = var(NATIVES_DIR_VAR) {
            self.natives_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var(SCRATCH_DIR_VAR) {
            self.scratch_dir = PathBuf::from(dir);
        }
        if let Some(name) = var(LIBRARY_NAME_VAR).and_then(|name| name.into_string().ok()) {
            if !name.is_empty() {
                self.library_name = name;
            }
        }
        self
    }
}
