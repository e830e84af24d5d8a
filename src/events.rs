//! Session journal for ecce.
//!
//! Watch sessions append what they do to an NDJSON file (one JSON object per
//! line), by default `events.ndjson` next to the config file. The journal is
//! an audit trail only: nothing reads it back, and a failed append is logged
//! as a warning without affecting the session.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: What happened (`watch_start`, `agent_invoke`, `splice`, ...)
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `file`: The watched file, when the event belongs to a session
//! - `details`: Freeform object with action-specific details
//!
//! ```no_run
//! use ecce::events::{Event, EventAction, EventLog};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let log = EventLog::beside_config(Path::new("/home/me/.config/ecce/config.json"));
//! let event = Event::new(EventAction::WatchStart)
//!     .with_file("slides.md")
//!     .with_details(json!({"agent": "writer"}));
//! log.append(&event)?;
//! # Ok::<(), ecce::error::EcceError>(())
//! ```

use crate::error::{EcceError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name of the journal.
pub const EVENTS_FILE_NAME: &str = "events.ndjson";

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A watch session started.
    WatchStart,
    /// A prompt was sent to the agent.
    AgentInvoke,
    /// The agent answered.
    AgentComplete,
    /// The agent failed; the prompt will be retried after the next change.
    AgentFailed,
    /// An answer was written into the file.
    Splice,
    /// The file changed around the prompt; the answer was discarded.
    SpliceConflict,
    /// The session ended.
    WatchStop,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::WatchStart => write!(f, "watch_start"),
            EventAction::AgentInvoke => write!(f, "agent_invoke"),
            EventAction::AgentComplete => write!(f, "agent_complete"),
            EventAction::AgentFailed => write!(f, "agent_failed"),
            EventAction::Splice => write!(f, "splice"),
            EventAction::SpliceConflict => write!(f, "splice_conflict"),
            EventAction::WatchStop => write!(f, "watch_stop"),
        }
    }
}

/// An event record for the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Watched file for session events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            file: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().display().to_string());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| EcceError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Where events go, if anywhere.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that drops every event.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// `events.ndjson` in the directory holding `config_path`.
    pub fn beside_config(config_path: &Path) -> Self {
        let dir = match config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        Self::new(dir.join(EVENTS_FILE_NAME))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an event as one line, creating the file and its directory.
    pub fn append(&self, event: &Event) -> Result<()> {
        let Some(events_file) = &self.path else {
            return Ok(());
        };

        let json_line = event.to_ndjson_line()?;

        if let Some(dir) = events_file.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    EcceError::UserError(format!(
                        "failed to create events directory '{}': {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(events_file)
            .map_err(|e| {
                EcceError::UserError(format!(
                    "failed to open events file '{}': {}",
                    events_file.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            EcceError::UserError(format!(
                "failed to write event to '{}': {}",
                events_file.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Append, downgrading failure to a warning.
    pub fn record(&self, event: Event) {
        if let Err(e) = self.append(&event) {
            warn!(action = %event.action, "journal: {}", e);
        }
    }
}
