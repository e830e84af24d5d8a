//! Compiled marker regexes and the lazy scan iterator.

use super::{Fingerprint, Pattern, PatternKind, Span};
use crate::error::{EcceError, Result};
use regex::{CaptureMatches, Captures, Regex};
use std::collections::HashSet;
use std::iter::Peekable;

/// Finds prompt patterns for one marker.
///
/// Create once per session; scanning is read-only and can be repeated on any
/// buffer.
pub struct PatternScanner {
    marker: String,
    inline: Regex,
    block: Regex,
}

impl std::fmt::Debug for PatternScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternScanner")
            .field("marker", &self.marker)
            .finish()
    }
}

impl PatternScanner {
    /// Compile the inline and block regexes for `marker`.
    ///
    /// The marker must be a non-empty run of ASCII letters, digits or `_`, so
    /// that both occurrences can be matched as whole words.
    pub fn new(marker: &str) -> Result<Self> {
        if marker.is_empty() {
            return Err(EcceError::ConfigError(
                "marker must not be empty".to_string(),
            ));
        }
        if !marker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(EcceError::ConfigError(format!(
                "marker '{}' may only contain ASCII letters, digits and '_'",
                marker
            )));
        }

        let m = regex::escape(marker);
        let inline = Regex::new(&format!(r"\b{m}\b([^\r\n]*?)\b{m}\b"))
            .map_err(|e| EcceError::ConfigError(format!("invalid inline marker regex: {}", e)))?;
        let block = Regex::new(&format!(
            r"(?ms)^```[ \t]*{m}[ \t]*\r?\n(.*?)^```[ \t]*\r?$"
        ))
        .map_err(|e| EcceError::ConfigError(format!("invalid block marker regex: {}", e)))?;

        Ok(Self {
            marker: marker.to_string(),
            inline,
            block,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Lazily yield unprocessed patterns of `buffer` in ascending start order.
    ///
    /// Patterns whose fingerprint is in `processed` are skipped. Calling this
    /// twice on the same inputs yields the same sequence.
    pub fn scan<'s, 'b>(
        &'s self,
        buffer: &'b str,
        processed: &'s HashSet<Fingerprint>,
    ) -> Patterns<'s, 'b> {
        let mut block_spans = Vec::new();
        let mut blocks = Vec::new();
        for caps in self.block.captures_iter(buffer) {
            let Some(whole) = caps.get(0) else { continue };
            let span = Span::new(whole.start(), trim_cr(buffer, whole.end()));
            block_spans.push(span);
            if let Some(pattern) = block_pattern(buffer, span, &caps) {
                blocks.push(pattern);
            }
        }

        Patterns {
            buffer,
            processed,
            blocks: blocks.into_iter().peekable(),
            block_spans,
            inline: self.inline.captures_iter(buffer),
            next_inline: None,
        }
    }

    /// Collect [`scan`](Self::scan) into a vector.
    pub fn scan_all(&self, buffer: &str, processed: &HashSet<Fingerprint>) -> Vec<Pattern> {
        self.scan(buffer, processed).collect()
    }
}

/// Iterator returned by [`PatternScanner::scan`].
///
/// Blocks are located up front (inline markers inside a block belong to the
/// block); inline matches are pulled from the regex on demand and merged by
/// start offset.
pub struct Patterns<'s, 'b> {
    buffer: &'b str,
    processed: &'s HashSet<Fingerprint>,
    blocks: Peekable<std::vec::IntoIter<Pattern>>,
    block_spans: Vec<Span>,
    inline: CaptureMatches<'s, 'b>,
    next_inline: Option<Pattern>,
}

impl Patterns<'_, '_> {
    fn pull_inline(&mut self) -> Option<Pattern> {
        for caps in self.inline.by_ref() {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let span = Span::new(whole.start(), whole.end());
            if self.block_spans.iter().any(|b| b.overlaps(&span)) {
                continue;
            }
            let prompt = inner.as_str().trim();
            if prompt.is_empty() {
                continue;
            }
            return Some(Pattern::new(
                PatternKind::Inline,
                span,
                prompt.to_string(),
                self.buffer,
            ));
        }
        None
    }
}

impl Iterator for Patterns<'_, '_> {
    type Item = Pattern;

    fn next(&mut self) -> Option<Pattern> {
        loop {
            if self.next_inline.is_none() {
                self.next_inline = self.pull_inline();
            }

            let take_block = match (self.blocks.peek(), &self.next_inline) {
                (Some(block), Some(inline)) => block.span.start < inline.span.start,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => return None,
            };

            let candidate = if take_block {
                self.blocks.next()
            } else {
                self.next_inline.take()
            }?;

            if !self.processed.contains(&candidate.fingerprint) {
                return Some(candidate);
            }
        }
    }
}

/// Build a block pattern from a fence match.
///
/// The prompt is the interior verbatim, minus one leading and one trailing
/// blank line. A blank interior is not a prompt.
fn block_pattern(buffer: &str, span: Span, caps: &Captures<'_>) -> Option<Pattern> {
    let raw = caps.get(1)?.as_str();
    let body = raw.strip_suffix('\n').unwrap_or(raw);
    let body = body.strip_suffix('\r').unwrap_or(body);
    if body.trim().is_empty() {
        return None;
    }

    let mut lines: Vec<&str> = body.split('\n').collect();
    if lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    Some(Pattern::new(
        PatternKind::Block,
        span,
        lines.join("\n"),
        buffer,
    ))
}

/// Exclude a trailing `\r` from a span end so CRLF files keep their line breaks.
fn trim_cr(buffer: &str, end: usize) -> usize {
    if buffer[..end].ends_with('\r') {
        end - 1
    } else {
        end
    }
}
