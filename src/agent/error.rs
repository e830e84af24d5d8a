//! Agent invocation failures.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Lines kept from the end of an agent's stderr.
const EXCERPT_MAX_LINES: usize = 20;
/// Characters kept from the end of an agent's stderr.
const EXCERPT_MAX_CHARS: usize = 2000;

/// Why a single prompt could not be answered.
///
/// All variants are recoverable for a watch session: the prompt is skipped
/// for the current pass and retried after the next change.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("failed to start agent command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("agent exited with {}{}", describe_status(*exit_code), describe_stderr(stderr_excerpt))]
    NonZeroExit {
        exit_code: Option<i32>,
        stderr_excerpt: String,
    },

    #[error("agent timed out after {}s{}", timeout.as_secs_f64(), describe_stderr(stderr_excerpt))]
    TimedOut {
        timeout: Duration,
        stderr_excerpt: String,
    },

    #[error("agent produced unusable output: {reason}")]
    MalformedOutput { reason: String },

    #[error("failed to read context file '{}': {source}", path.display())]
    ContextFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("agent I/O failed while trying to {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl InvocationError {
    /// Exit code of the agent process, when it exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            InvocationError::NonZeroExit { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Tail of the agent's stderr, when the process ran.
    pub fn stderr_excerpt(&self) -> Option<&str> {
        match self {
            InvocationError::NonZeroExit { stderr_excerpt, .. }
            | InvocationError::TimedOut { stderr_excerpt, .. } => Some(stderr_excerpt),
            _ => None,
        }
    }

    pub(crate) fn io(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| InvocationError::Io { op, source }
    }
}

fn describe_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}

fn describe_stderr(excerpt: &str) -> String {
    if excerpt.is_empty() {
        String::new()
    } else {
        format!(": {}", excerpt)
    }
}

/// The last lines of `stderr`, bounded in lines and characters.
pub(crate) fn excerpt(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let tail = lines[lines.len().saturating_sub(EXCERPT_MAX_LINES)..].join("\n");

    let count = tail.chars().count();
    if count > EXCERPT_MAX_CHARS {
        tail.chars().skip(count - EXCERPT_MAX_CHARS).collect()
    } else {
        tail
    }
}
