//! Prompt composition for agent invocations.
//!
//! - **Template**: `{variable}` substitution shared by task templates and the
//!   agent command line
//! - **Compose**: joins system prompt, earlier exchanges, task, user prompt
//!   and context files
//!
//! # Task templates
//!
//! A task whose template mentions `{prompt}` is rendered around the prompt:
//!
//! ```text
//! Rewrite the following as a slide title, max 8 words:
//! {prompt}
//! ```
//!
//! Any other template is placed before the prompt unchanged. Use `{{` to
//! render a literal `{`.

mod compose;
mod template;

pub use compose::{Exchange, PromptStrategy, compose_prompt};
pub use template::{TemplateError, referenced_variables, render_template, vars};
