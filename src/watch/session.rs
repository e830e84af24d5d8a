//! Per-session state and target resolution.

use crate::error::{EcceError, Result};
use crate::pattern::Fingerprint;
use crate::splice::SpliceMode;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything one `ecce homo` run remembers.
///
/// Owned by exactly one [`WatchLoop`](super::WatchLoop); nothing here is
/// shared between sessions or persisted.
#[derive(Debug, Clone)]
pub struct WatchSession {
    pub file_path: PathBuf,
    pub agent_name: String,
    pub task_name: Option<String>,
    pub poll_interval: Duration,
    pub mode: SpliceMode,
    /// Fingerprints spliced successfully in this session.
    pub processed: HashSet<Fingerprint>,
    /// File content as last seen (or last written by the loop).
    pub last_snapshot: String,
    pub running: bool,
}

impl WatchSession {
    pub fn new(
        file_path: impl Into<PathBuf>,
        agent_name: impl Into<String>,
        task_name: Option<String>,
        poll_interval: Duration,
        mode: SpliceMode,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            agent_name: agent_name.into(),
            task_name,
            poll_interval,
            mode,
            processed: HashSet::new(),
            last_snapshot: String::new(),
            running: false,
        }
    }
}

/// Turn the command-line target into the file to watch.
///
/// A directory means `<dir>/<default_file_name>`. The result must be an
/// existing regular file.
pub fn resolve_target(target: &Path, default_file_name: &str) -> Result<PathBuf> {
    let candidate = if target.is_dir() {
        target.join(default_file_name)
    } else {
        target.to_path_buf()
    };

    if !candidate.is_file() {
        return Err(EcceError::FileNotFound(candidate.display().to_string()));
    }
    Ok(candidate)
}
