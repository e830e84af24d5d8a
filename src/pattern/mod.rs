//! Prompt pattern detection.
//!
//! A pattern is a prompt the user typed into the watched file, delimited by
//! the configured marker (default `ecce`). Two syntaxes are recognized:
//!
//! ````text
//! ecce what is 2+2? ecce
//!
//! ```ecce
//! Explain the slide above
//! in two bullet points.
//! ```
//! ````
//!
//! Patterns are transient: each scan of a buffer produces fresh values whose
//! spans are only valid for that buffer. Identity across scans is the
//! [`Fingerprint`], which depends on the prompt text and kind but never on
//! the offset.

mod scanner;


pub use scanner::{PatternScanner, Patterns};

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Marker syntax a pattern was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// `ecce ... ecce` on a single line.
    Inline,
    /// A fenced block tagged with the marker.
    Block,
}

impl PatternKind {
    fn tag(self) -> &'static str {
        match self {
            PatternKind::Inline => "inline",
            PatternKind::Block => "block",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Byte range `[start, end)` of a pattern in the buffer it was scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Shift both ends by the signed displacement `delta`.
    fn shifted(self, delta: isize) -> Self {
        Self {
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
        }
    }
}

/// Offset-independent identity of a pattern (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(kind: PatternKind, prompt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.tag().as_bytes());
        hasher.update(b"\n");
        hasher.update(prompt.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The text surrounding a span at scan time.
///
/// The window covers every line the span touches plus one line on either
/// side. The splicer compares it against the file on disk to detect edits
/// made while the agent was running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Byte offset of the window in the scanned buffer.
    pub window_start: usize,
    /// Exact window text.
    pub window: String,
}

/// Where an anchored span sits in a newer buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub span: Span,
    /// True when the window was found somewhere other than its original offset.
    pub relocated: bool,
}

impl Anchor {
    pub fn capture(buffer: &str, span: Span) -> Self {
        let mut start = line_start(buffer, span.start);
        if start > 0 {
            start = line_start(buffer, start - 1);
        }
        let mut end = line_end(buffer, span.end);
        if end < buffer.len() {
            end = line_end(buffer, end + 1);
        }
        Self {
            window_start: start,
            window: buffer[start..end].to_string(),
        }
    }

    /// Find `span` (as scanned) inside `current`.
    ///
    /// The window must either still sit at its original offset, or occur
    /// exactly once elsewhere in `current`. Anything else means the
    /// neighborhood was edited and there is no trustworthy target.
    pub fn locate(&self, span: Span, current: &str) -> Option<Located> {
        let window_end = self.window_start + self.window.len();
        if current.get(self.window_start..window_end) == Some(self.window.as_str()) {
            return Some(Located {
                span,
                relocated: false,
            });
        }

        // Overlapping occurrences count too, so search again one char on.
        let found = current.find(self.window.as_str())?;
        let step = self.window.chars().next().map_or(1, char::len_utf8);
        if current[found + step..].contains(self.window.as_str()) {
            return None;
        }

        let delta = found as isize - self.window_start as isize;
        Some(Located {
            span: span.shifted(delta),
            relocated: true,
        })
    }
}

/// One detected prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
    pub prompt: String,
    pub fingerprint: Fingerprint,
    pub anchor: Anchor,
}

impl Pattern {
    pub(crate) fn new(kind: PatternKind, span: Span, prompt: String, buffer: &str) -> Self {
        let fingerprint = Fingerprint::of(kind, &prompt);
        let anchor = Anchor::capture(buffer, span);
        Self {
            kind,
            span,
            prompt,
            fingerprint,
            anchor,
        }
    }

    /// First line of the prompt, clipped for display.
    pub fn preview(&self, max_chars: usize) -> String {
        let first = self.prompt.lines().next().unwrap_or_default();
        let mut preview: String = first.chars().take(max_chars).collect();
        if first.chars().count() > max_chars || self.prompt.lines().nth(1).is_some() {
            preview.push('…');
        }
        preview
    }
}

/// Byte offset where the line containing `idx` starts.
pub(crate) fn line_start(buffer: &str, idx: usize) -> usize {
    buffer[..idx].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Byte offset of the line break ending the line containing `idx`, or the
/// buffer length when that line is the last one.
pub(crate) fn line_end(buffer: &str, idx: usize) -> usize {
    buffer[idx..]
        .find('\n')
        .map(|i| idx + i)
        .unwrap_or(buffer.len())
}
