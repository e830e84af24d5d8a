//! Config struct definition and default implementation.

use super::types::*;
use crate::splice::SpliceMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Agents and tasks
    // =========================================================================
    /// Agents by name.
    pub agents: BTreeMap<String, Agent>,

    /// Tasks by name.
    pub tasks: BTreeMap<String, Task>,

    /// Agent used by `ecce homo` when `--agent` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_agent: Option<String>,

    // =========================================================================
    // Agent invocation
    // =========================================================================
    /// Command line used to run an agent, e.g. `claude -p --model {model}`.
    ///
    /// Placeholders: `{prompt}`, `{prompt_file}`, `{agent}`, `{model}`. When
    /// neither prompt placeholder appears, the prompt is written to stdin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_command: Option<String>,

    /// Legacy: path of the `claude` executable. Used with `-p` when
    /// `agent_command` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_executable: Option<String>,

    /// Seconds before a running agent is killed.
    #[serde(default = "default_invocation_timeout_secs")]
    pub invocation_timeout_secs: u64,

    // =========================================================================
    // Watching
    // =========================================================================
    /// Poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Word delimiting prompts (`ecce ... ecce`, ```` ```ecce ````).
    #[serde(default = "default_marker")]
    pub marker: String,

    /// File watched when the target is a directory.
    #[serde(default = "default_file_name")]
    pub default_file_name: String,

    /// Splice mode used when neither `--mode` nor the task sets one.
    pub splice_mode: SpliceMode,

    /// Send the session's earlier answered prompts along with each new one.
    pub conversation_history: bool,

    /// Whether to append session events to the journal.
    #[serde(default = "default_true")]
    pub journal: bool,

    /// Unknown fields, preserved on save.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents: BTreeMap::new(),
            tasks: BTreeMap::new(),
            default_agent: None,
            agent_command: None,
            claude_executable: None,
            invocation_timeout_secs: default_invocation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            marker: default_marker(),
            default_file_name: default_file_name(),
            splice_mode: SpliceMode::default(),
            conversation_history: false,
            journal: default_true(),
            extra: BTreeMap::new(),
        }
    }
}
