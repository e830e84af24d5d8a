//! Building the final prompt text sent to an agent.

use super::template::{TemplateError, referenced_variables, render_template, vars};
use crate::agent::InvocationError;
use crate::config::{Agent, Task};
use std::fs;

/// How a task (if any) combines with the user's prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStrategy {
    /// No task: system prompt, then the prompt.
    Direct,
    /// The task template is placed between the system prompt and the prompt.
    Appended(Task),
    /// The task template references `{prompt}` and is rendered around it.
    Templated(Task),
}

impl PromptStrategy {
    /// Pick the strategy for an optional task.
    ///
    /// A template that references `{prompt}` is rendered; any other template,
    /// including one that does not parse as a template, is used verbatim.
    pub fn for_task(task: Option<&Task>) -> Self {
        match task {
            None => PromptStrategy::Direct,
            Some(task) => {
                let templated = referenced_variables(&task.template)
                    .map(|names| names.iter().any(|n| n == "prompt"))
                    .unwrap_or(false);
                if templated {
                    PromptStrategy::Templated(task.clone())
                } else {
                    PromptStrategy::Appended(task.clone())
                }
            }
        }
    }

    pub fn task(&self) -> Option<&Task> {
        match self {
            PromptStrategy::Direct => None,
            PromptStrategy::Appended(task) | PromptStrategy::Templated(task) => Some(task),
        }
    }

    /// Check that a templated task only uses known variables.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if let PromptStrategy::Templated(task) = self {
            let sample = vars([("prompt", ""), ("agent", ""), ("model", "")]);
            render_template(&task.template, &sample)?;
        }
        Ok(())
    }
}

/// One answered prompt from earlier in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub prompt: String,
    pub answer: String,
}

impl Exchange {
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
        }
    }
}

/// Join the system prompt, earlier exchanges, task, prompt and context files.
///
/// Context files are read now, so edits made during a session are picked up
/// by the next invocation.
pub fn compose_prompt(
    agent: &Agent,
    strategy: &PromptStrategy,
    prompt: &str,
    history: &[Exchange],
) -> Result<String, InvocationError> {
    let mut parts: Vec<String> = Vec::new();

    if !agent.system_prompt.trim().is_empty() {
        parts.push(agent.system_prompt.trim_end().to_string());
    }

    if !history.is_empty() {
        parts.push(previous_conversation(history));
    }

    match strategy {
        PromptStrategy::Direct => parts.push(prompt.to_string()),
        PromptStrategy::Appended(task) => {
            parts.push(task.template.trim_end().to_string());
            parts.push(prompt.to_string());
        }
        PromptStrategy::Templated(task) => {
            let values = vars([
                ("prompt", prompt),
                ("agent", agent.name.as_str()),
                ("model", agent.model.as_deref().unwrap_or_default()),
            ]);
            let rendered = render_template(&task.template, &values).map_err(|e| {
                InvocationError::MalformedOutput {
                    reason: format!("task '{}' template: {}", task.name, e),
                }
            })?;
            parts.push(rendered.trim_end().to_string());
        }
    }

    for path in &agent.context_files {
        let content = fs::read_to_string(path).map_err(|source| InvocationError::ContextFile {
            path: path.clone(),
            source,
        })?;
        parts.push(format!(
            "--- Context from {} ---\n{}",
            path.display(),
            content.trim_end()
        ));
    }

    Ok(parts.join("\n\n"))
}

fn previous_conversation(history: &[Exchange]) -> String {
    let mut out = String::from("## Previous Conversation:");
    for exchange in history {
        out.push_str("\n\nUser: ");
        out.push_str(exchange.prompt.trim_end());
        out.push_str("\n\nAssistant: ");
        out.push_str(exchange.answer.trim_end());
    }
    out.push_str("\n\n---");
    out
}
