//! Agent invocation for ecce.
//!
//! - **Prompt**: composes system prompt, task, user prompt and context files
//! - **Dispatch**: the [`Generator`] seam and the subprocess implementation
//! - **Invoker**: [`AgentInvoker`] ties one agent and strategy to a generator
//!   and normalizes what comes back
//!
//! Agents are external CLI programs (by default `claude -p`); ecce never
//! runs a model in-process.

pub mod dispatch;
mod error;
pub mod prompt;

pub use dispatch::{CommandGenerator, Generator, InvocationRequest};
pub use error::InvocationError;
pub use prompt::{Exchange, PromptStrategy};

use prompt::compose_prompt;

use crate::config::{Agent, Task};
use crate::error::{EcceError, Result};
use tracing::debug;

/// Sends prompts for one agent (and optional task) to a generator.
#[derive(Debug)]
pub struct AgentInvoker<G> {
    agent: Agent,
    strategy: PromptStrategy,
    generator: G,
    /// Earlier answered prompts, when conversation history is on.
    history: Option<Vec<Exchange>>,
}

impl<G: Generator> AgentInvoker<G> {
    /// Fails when a templated task uses variables other than `{prompt}`,
    /// `{agent}` and `{model}`.
    pub fn new(agent: Agent, strategy: PromptStrategy, generator: G) -> Result<Self> {
        strategy.validate().map_err(|e| {
            let task = strategy.task().map(|t| t.name.as_str()).unwrap_or_default();
            EcceError::ConfigError(format!("task '{}' template: {}", task, e))
        })?;
        Ok(Self {
            agent,
            strategy,
            generator,
            history: None,
        })
    }

    /// Prefix every prompt with the exchanges passed to [`Self::remember`].
    pub fn with_history(mut self) -> Self {
        self.history = Some(Vec::new());
        self
    }

    /// Keep an answer that made it into the file. Does nothing unless
    /// history is on.
    pub fn remember(&mut self, prompt: &str, answer: &str) {
        if let Some(history) = &mut self.history {
            history.push(Exchange::new(prompt, answer));
        }
    }

    pub fn history(&self) -> &[Exchange] {
        self.history.as_deref().unwrap_or_default()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn task(&self) -> Option<&Task> {
        self.strategy.task()
    }

    /// Build the request for `prompt` without running anything.
    pub fn request(&self, prompt: &str) -> std::result::Result<InvocationRequest, InvocationError> {
        Ok(InvocationRequest {
            agent: self.agent.name.clone(),
            model: self.agent.model.clone(),
            composed_prompt: compose_prompt(&self.agent, &self.strategy, prompt, self.history())?,
        })
    }

    /// Answer one prompt.
    pub fn invoke(&self, prompt: &str) -> std::result::Result<String, InvocationError> {
        let request = self.request(prompt)?;
        debug!(
            agent = %request.agent,
            prompt_bytes = request.composed_prompt.len(),
            "invoking agent"
        );
        let raw = self.generator.generate(&request)?;
        normalize_output(&raw)
    }
}

/// Strip trailing whitespace and leading blank lines.
///
/// Indentation of the first non-blank line is kept. Nothing left over is an
/// error, so an empty answer never erases a prompt.
pub fn normalize_output(raw: &str) -> std::result::Result<String, InvocationError> {
    let trimmed = raw.trim_end();
    let mut start = 0;
    for line in trimmed.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }

    let text = &trimmed[start..];
    if text.is_empty() {
        return Err(InvocationError::MalformedOutput {
            reason: "agent returned no text".to_string(),
        });
    }
    Ok(text.to_string())
}
