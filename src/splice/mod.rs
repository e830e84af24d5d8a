//! Writing generated text back into the watched file.
//!
//! A splice is a single read-modify-write. The file is re-read, the
//! pattern's anchor is verified against the fresh content, the edit is
//! applied in memory and the result is written with [`atomic_write_file`].
//! If the neighborhood of the span changed while the agent was running, the
//! file is left untouched and [`SpliceError::ConcurrentModification`] is
//! returned.


use crate::fs::atomic_write_file;
use crate::pattern::{Pattern, Span, line_end};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// How generated text is placed relative to the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpliceMode {
    /// The span, markers included, becomes the generated text.
    #[default]
    Replace,
    /// The span stays; the text goes after the line that ends it.
    Append,
}

impl SpliceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpliceMode::Replace => "replace",
            SpliceMode::Append => "append",
        }
    }
}

impl fmt::Display for SpliceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpliceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(SpliceMode::Replace),
            "append" => Ok(SpliceMode::Append),
            _ => Err(format!(
                "invalid splice mode '{}': expected 'replace' or 'append'",
                s
            )),
        }
    }
}

#[derive(Error, Debug)]
pub enum SpliceError {
    /// The text around the span no longer matches what was scanned.
    #[error("'{}' changed around the prompt while the agent was running", path.display())]
    ConcurrentModification { path: PathBuf },

    /// The file could not be read back before writing; nothing was written.
    #[error("could not re-read '{}' before writing: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to {op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SpliceError {
    /// Failures worth retrying on a later pass.
    ///
    /// A failed re-read always is: editors that save by rename leave the
    /// file missing for a moment, and the file is untouched either way.
    pub fn is_transient(&self) -> bool {
        match self {
            SpliceError::ConcurrentModification { .. } => false,
            SpliceError::Unreadable { .. } => true,
            SpliceError::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
        }
    }
}

/// Outcome of a successful splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    /// Where the pattern was found in the file at write time.
    pub span: Span,
    /// True when edits elsewhere moved the pattern.
    pub relocated: bool,
    /// Complete file content as written.
    pub content: String,
}

/// Apply `text` for `pattern` to the file at `path`.
pub fn splice(
    path: &Path,
    pattern: &Pattern,
    text: &str,
    mode: SpliceMode,
) -> Result<Spliced, SpliceError> {
    let current = fs::read_to_string(path).map_err(|source| SpliceError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let located = pattern
        .anchor
        .locate(pattern.span, &current)
        .ok_or_else(|| SpliceError::ConcurrentModification {
            path: path.to_path_buf(),
        })?;

    if located.relocated {
        debug!(
            from = pattern.span.start,
            to = located.span.start,
            "prompt moved since scan"
        );
    }

    let content = apply(&current, located.span, text, mode);

    atomic_write_file(path, &content).map_err(|source| SpliceError::Io {
        op: "write",
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Spliced {
        span: located.span,
        relocated: located.relocated,
        content,
    })
}

/// Pure edit of `buffer`; `span` must be valid for it.
pub fn apply(buffer: &str, span: Span, text: &str, mode: SpliceMode) -> String {
    match mode {
        SpliceMode::Replace => {
            let mut out = String::with_capacity(buffer.len() + text.len());
            out.push_str(&buffer[..span.start]);
            out.push_str(text);
            out.push_str(&buffer[span.end..]);
            out
        }
        SpliceMode::Append => {
            let eol = line_end(buffer, span.end);
            let mut out = String::with_capacity(buffer.len() + text.len() + 2);
            if eol < buffer.len() {
                out.push_str(&buffer[..=eol]);
                out.push('\n');
                out.push_str(text);
                out.push('\n');
                out.push_str(&buffer[eol + 1..]);
            } else {
                out.push_str(buffer);
                out.push_str("\n\n");
                out.push_str(text);
            }
            out
        }
    }
}
