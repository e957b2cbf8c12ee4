//! Trace persistence
//!
//! One binary `.trace` file per session under a configurable directory.
//! Legacy `.json` containers are still read but never newly written.

pub mod encoding;

pub use encoding::{TraceContainer, TraceError, TRACE_MAGIC, TRACE_VERSION};

use parking_lot::RwLock;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Extension of the binary container format.
const TRACE_EXT: &str = "trace";

/// Extension of the legacy JSON container format.
const LEGACY_EXT: &str = "json";

/// Suffix appended by the stats exporter to session file base names.
const STATS_BASENAME_SUFFIX: &str = " Stats";

/// Stores per-session trace containers on disk.
pub struct TraceStore {
    base_dir: RwLock<PathBuf>,
}

impl TraceStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: RwLock::new(base_dir.into()),
        }
    }

    /// Point the store at a different directory (e.g. after a settings
    /// change). Existing records can be re-checked with
    /// [`crate::watcher::ScenarioWatcher::reload_traces`].
    pub fn set_base_dir(&self, dir: impl Into<PathBuf>) {
        *self.base_dir.write() = dir.into();
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.read().clone()
    }

    /// Identity key for persistence: the session file's base name with its
    /// extension and the exporter's ` Stats` suffix stripped.
    pub fn trace_base_name(original: &str) -> String {
        let safe = Path::new(original)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| original.to_string());
        let stem = match safe.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
            _ => safe,
        };
        stem.strip_suffix(STATS_BASENAME_SUFFIX)
            .map(str::to_string)
            .unwrap_or(stem)
    }

    fn ensure_dir(&self) -> Result<PathBuf, TraceError> {
        let dir = self.base_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn container_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
        dir.join(format!("{base}.{ext}"))
    }

    /// Whether a persisted trace exists for the given session file name,
    /// in either the binary or the legacy format.
    pub fn exists(&self, original_file_name: &str) -> bool {
        let Ok(dir) = self.ensure_dir() else {
            return false;
        };
        let base = Self::trace_base_name(original_file_name);
        Self::container_path(&dir, &base, TRACE_EXT).is_file()
            || Self::container_path(&dir, &base, LEGACY_EXT).is_file()
    }

    /// Write a container in the binary format. Degenerate file names are
    /// ignored rather than treated as errors.
    pub fn save(&self, data: &TraceContainer) -> Result<(), TraceError> {
        if data.file_name == "." || data.file_name == "/" {
            return Ok(());
        }
        let dir = self.ensure_dir()?;
        let base = Self::trace_base_name(&data.file_name);
        let path = Self::container_path(&dir, &base, TRACE_EXT);

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        encoding::write_binary(&mut writer, data)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), samples = data.samples.len(), "trace saved");
        Ok(())
    }

    /// Load the trace for a session file name, preferring the binary format
    /// and falling back to the legacy JSON container.
    pub fn load(&self, original_file_name: &str) -> Result<TraceContainer, TraceError> {
        let dir = self.ensure_dir()?;
        let base = Self::trace_base_name(original_file_name);

        let binary_path = Self::container_path(&dir, &base, TRACE_EXT);
        if binary_path.is_file() {
            let mut reader = BufReader::new(File::open(&binary_path)?);
            return encoding::read_binary(&mut reader);
        }

        let legacy_path = Self::container_path(&dir, &base, LEGACY_EXT);
        if legacy_path.is_file() {
            let bytes = std::fs::read(&legacy_path)?;
            return encoding::read_legacy_json(&bytes);
        }

        Err(TraceError::NotFound(original_file_name.to_string()))
    }
}
