//! Agent definitions as markdown files with YAML frontmatter.
//!
//! This is the `.claude/agents/<name>.md` layout:
//!
//! ```text
//! ---
//! name: reviewer
//! description: Reviews slides for clarity
//! tools: Read, Grep
//! model: sonnet
//! ---
//!
//! You are a careful technical reviewer.
//! ```
//!
//! The body after the closing delimiter is the system prompt.

use super::types::{Agent, deserialize_tools};
use crate::error::{EcceError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct AgentFrontmatter {
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_tools",
        serialize_with = "serialize_tools",
        skip_serializing_if = "Vec::is_empty"
    )]
    tools: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    context_files: Vec<PathBuf>,
}

fn serialize_tools<S>(tools: &[String], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&tools.join(", "))
}

/// Parse an agent from markdown with frontmatter.
pub fn agent_from_markdown(content: &str) -> Result<Agent> {
    let normalized = content.replace("\r\n", "\n");

    let rest = normalized.strip_prefix("---\n").ok_or_else(|| {
        EcceError::UserError("agent file must start with '---' frontmatter delimiter".to_string())
    })?;

    let (yaml, body) = match rest.find("\n---") {
        Some(pos) => (&rest[..pos], &rest[pos + 4..]),
        None if rest.starts_with("---") => ("", &rest[3..]),
        None => {
            return Err(EcceError::UserError(
                "agent file missing closing '---' frontmatter delimiter".to_string(),
            ));
        }
    };

    let frontmatter: AgentFrontmatter = serde_yaml::from_str(yaml)
        .map_err(|e| EcceError::UserError(format!("failed to parse agent frontmatter: {}", e)))?;

    if frontmatter.name.trim().is_empty() {
        return Err(EcceError::UserError(
            "agent frontmatter requires a 'name'".to_string(),
        ));
    }

    Ok(Agent {
        name: frontmatter.name.trim().to_string(),
        description: frontmatter.description,
        system_prompt: body.trim().to_string(),
        context_files: frontmatter.context_files,
        tools: frontmatter.tools,
        model: frontmatter.model,
    })
}

/// Render an agent as markdown with frontmatter.
pub fn agent_to_markdown(agent: &Agent) -> Result<String> {
    let frontmatter = AgentFrontmatter {
        name: agent.name.clone(),
        description: agent.description.clone(),
        tools: agent.tools.clone(),
        model: agent.model.clone(),
        context_files: agent.context_files.clone(),
    };
    let yaml = serde_yaml::to_string(&frontmatter).map_err(|e| {
        EcceError::UserError(format!("failed to serialize agent frontmatter: {}", e))
    })?;

    let mut output = String::new();
    output.push_str("---\n");
    output.push_str(&yaml);
    output.push_str("---\n\n");
    output.push_str(agent.system_prompt.trim_end());
    output.push('\n');
    Ok(output)
}
