//! Agent and task definitions, and default values for config fields.

use crate::splice::SpliceMode;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// A named agent: the persona every prompt of a session is sent with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Agent name. Filled from the map key when absent in the file.
    #[serde(default)]
    pub name: String,

    /// One-line summary shown in lists and menus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Text placed first in every composed prompt.
    #[serde(default)]
    pub system_prompt: String,

    /// Files whose current content is appended to every prompt.
    #[serde(default)]
    pub context_files: Vec<PathBuf>,

    /// Tool names, unique, in the order given.
    #[serde(
        default,
        deserialize_with = "deserialize_tools",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tools: Vec<String>,

    /// Model hint (`sonnet`, `opus`, ...), passed to the agent command as `{model}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Agent {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            system_prompt: system_prompt.into(),
            context_files: Vec::new(),
            tools: Vec::new(),
            model: None,
        }
    }
}

/// A named prompt template applied to every prompt of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub name: String,

    /// Either plain instructions placed before the prompt, or a template
    /// containing `{prompt}`.
    pub template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Splice mode for sessions using this task, unless `--mode` overrides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SpliceMode>,
}

impl Task {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            description: None,
            mode: None,
        }
    }
}

/// Keep the first occurrence of each tool name.
pub fn dedup_tools<I, S>(tools: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tool in tools {
        let tool = tool.as_ref().trim();
        if !tool.is_empty() && !out.iter().any(|t| t == tool) {
            out.push(tool.to_string());
        }
    }
    out
}

/// Accept `null`, a list, or a comma-separated string.
pub(super) fn deserialize_tools<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tools {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Tools>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Tools::List(list)) => dedup_tools(list),
        Some(Tools::Joined(joined)) => dedup_tools(joined.split(',')),
    })
}

pub const DEFAULT_AGENT_COMMAND: &str = "claude -p";

pub fn default_invocation_timeout_secs() -> u64 {
    600
}

pub fn default_poll_interval_ms() -> u64 {
    100
}

pub fn default_marker() -> String {
    "ecce".to_string()
}

pub fn default_file_name() -> String {
    "slides.md".to_string()
}

pub fn default_true() -> bool {
    true
}
