//! Process-wide loading of the native engine library
//!
//! The dynamic loader needs a real file, so the artifact for the detected
//! platform is first copied into a private scratch directory, then loaded, and
//! the copy is deleted again. On platforms that lock loaded libraries the
//! delete fails; the stale copy is purged by the next process that loads.

use crate::config::LoaderConfig;
use crate::engine::{NativeEngine, SharedEngine};
use crate::error::{Result, TrlError};
use once_cell::sync::OnceCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use translatador_platform::Platform;

static ENGINE: OnceCell<Arc<NativeEngine>> = OnceCell::new();

/// Load the native engine once per process.
///
/// The first successful call extracts and loads the library using `config`;
/// every later call returns the same engine and ignores its argument. A failed
/// load leaves nothing behind, so it can be retried.
pub fn load(config: &LoaderConfig) -> Result<Arc<NativeEngine>> {
    ENGINE
        .get_or_try_init(|| {
            let platform = Platform::detect()?;
            load_for(config, platform).map(Arc::new)
        })
        .map(Arc::clone)
}

/// The engine, if it has been loaded
pub fn loaded() -> Option<Arc<NativeEngine>> {
    ENGINE.get().cloned()
}

pub fn is_loaded() -> bool {
    ENGINE.get().is_some()
}

/// The loaded engine, loading it from the environment's configuration if needed
pub fn shared_engine() -> Result<SharedEngine> {
    let engine = match ENGINE.get() {
        Some(engine) => Arc::clone(engine),
        None => load(&LoaderConfig::from_env())?,
    };
    let engine: SharedEngine = engine;
    Ok(engine)
}

fn load_for(config: &LoaderConfig, platform: Platform) -> Result<NativeEngine> {
    prepare_scratch_dir(&config.scratch_dir, &config.library_name);

    let artifact = extract_artifact(config, platform)?;
    let engine = NativeEngine::open(&artifact);

    match fs::remove_file(&artifact) {
        Ok(()) => log::debug!("Removed scratch copy {}", artifact.display()),
        Err(e) => log::warn!(
            "Could not remove scratch copy {} ({}); it will be purged on next start",
            artifact.display(),
            e
        ),
    }

    engine
}

/// Purge copies left in the scratch directory by earlier processes
fn prepare_scratch_dir(dir: &Path, library_name: &str) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let stale = path.is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(library_name));
        if stale {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("Purged stale scratch copy {}", path.display()),
                // Still loaded by another process
                Err(e) => log::debug!("Skipping scratch copy {}: {}", path.display(), e),
            }
        }
    }
}

/// Copy the artifact for `platform` to a uniquely named file in the scratch dir
fn extract_artifact(config: &LoaderConfig, platform: Platform) -> Result<PathBuf> {
    let mut source: Box<dyn io::Read> = match config.embedded {
        Some(bytes) => Box::new(bytes),
        None => {
            let bundled = config.natives_dir.join(platform.library_file_name(&config.library_name));
            let file = File::open(&bundled).map_err(|e| {
                TrlError::LibraryLoadError(format!(
                    "Missing native library at {} for platform {}: {}",
                    bundled.display(),
                    platform,
                    e
                ))
            })?;
            Box::new(file)
        }
    };

    fs::create_dir_all(&config.scratch_dir)?;
    let mut artifact = tempfile::Builder::new()
        .prefix(&format!("{}-", config.library_name))
        .suffix(platform.os().library_extension())
        .tempfile_in(&config.scratch_dir)?;

    let size = io::copy(&mut source, &mut artifact)?;
    artifact.flush()?;

    let (_, path) = artifact.keep().map_err(|e| TrlError::IoError(e.error))?;
    log::debug!("Extracted {} bytes for {} to {}", size, platform, path.display());
    Ok(path)
}
