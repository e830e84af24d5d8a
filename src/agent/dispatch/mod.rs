//! Handing a composed prompt to something that produces text.
//!
//! The watch engine only depends on the [`Generator`] trait. The production
//! implementation, [`CommandGenerator`], runs an external CLI agent:
//!
//! - Command template variable substitution per argument
//! - Prompt delivery by argument, temp file, or stdin
//! - Configurable timeout with process termination
//! - stdout/stderr capture to anonymous temp files

mod executor;

pub use executor::CommandGenerator;

use super::InvocationError;

/// Everything a generator needs for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Agent name, available to command templates as `{agent}`.
    pub agent: String,
    /// Model hint, available as `{model}` (empty when unset).
    pub model: Option<String>,
    /// Final prompt text.
    pub composed_prompt: String,
}

/// Produces raw text for a prompt. Blocking; one call at a time.
pub trait Generator {
    fn generate(&self, request: &InvocationRequest) -> Result<String, InvocationError>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, request: &InvocationRequest) -> Result<String, InvocationError> {
        (**self).generate(request)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, request: &InvocationRequest) -> Result<String, InvocationError> {
        (**self).generate(request)
    }
}
