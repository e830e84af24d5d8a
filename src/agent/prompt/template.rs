//! `{variable}` substitution for task templates and agent command lines.
//!
//! # Syntax
//!
//! - `{name}` - Substitutes the value of variable `name` (surrounding
//!   whitespace inside the braces is ignored)
//! - `{{` - Renders as literal `{`
//! - `}}` - Renders as literal `}`
//!
//! A lone `}` is kept as-is. Referencing a variable that was not supplied is
//! an error rather than an empty substitution, so a typo in a config file is
//! reported instead of silently producing a different prompt.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("undefined variable '{name}' at position {position} in template")]
    UndefinedVariable { name: String, position: usize },

    #[error("unmatched '{{' at position {position} in template")]
    UnmatchedBrace { position: usize },

    #[error("empty variable name '{{}}' at position {position} in template")]
    EmptyVariableName { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(String),
    Variable { name: &'a str, position: usize },
}

/// Split a template into literal text and variable references.
fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let close = template[pos + 1..]
                    .find('}')
                    .map(|i| pos + 1 + i)
                    .ok_or(TemplateError::UnmatchedBrace { position: pos })?;
                let raw = &template[pos + 1..close];
                if raw.is_empty() {
                    return Err(TemplateError::EmptyVariableName { position: pos });
                }
                while chars.peek().is_some_and(|(i, _)| *i <= close) {
                    chars.next();
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable {
                    name: raw.trim(),
                    position: pos,
                });
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Render a template string by substituting variables.
///
/// ```
/// use ecce::agent::prompt::{render_template, vars};
///
/// let vars = vars([("prompt", "What is 2+2?"), ("agent", "tutor")]);
/// let out = render_template("[{agent}] {prompt} Use {{braces}}.", &vars).unwrap();
/// assert_eq!(out, "[tutor] What is 2+2? Use {braces}.");
/// ```
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Variable { name, position } => match variables.get(name) {
                Some(value) => result.push_str(value),
                None => {
                    return Err(TemplateError::UndefinedVariable {
                        name: name.to_string(),
                        position,
                    });
                }
            },
        }
    }
    Ok(result)
}

/// Names of the variables a template references, in order of first use.
pub fn referenced_variables(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names: Vec<String> = Vec::new();
    for segment in parse(template)? {
        if let Segment::Variable { name, .. } = segment {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Build a variables map from key-value pairs.
pub fn vars<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
