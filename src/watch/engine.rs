//! The poll → scan → invoke → splice loop.

use super::{CancelFlag, WatchSession, WatchState};
use crate::agent::{AgentInvoker, Generator};
use crate::error::{EcceError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::pattern::{Fingerprint, Pattern, PatternScanner};
use crate::splice::{SpliceError, splice};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Characters of a prompt shown in log lines.
const PREVIEW_CHARS: usize = 60;

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Agent calls started.
    pub invocations: u64,
    /// Answers written into the file.
    pub spliced: u64,
    /// Agent calls that failed.
    pub failures: u64,
    /// Answers discarded because the file changed around the prompt.
    pub conflicts: u64,
}

type Observer = Box<dyn FnMut(WatchState)>;

/// Drives one [`WatchSession`] until cancelled.
pub struct WatchLoop<G> {
    session: WatchSession,
    scanner: PatternScanner,
    invoker: AgentInvoker<G>,
    cancel: CancelFlag,
    journal: EventLog,
    state: WatchState,
    summary: SessionSummary,
    /// A splice was refused last pass; scan again even if nothing changed.
    retry_pending: bool,
    observer: Option<Observer>,
}

impl<G: Generator> WatchLoop<G> {
    pub fn new(
        session: WatchSession,
        scanner: PatternScanner,
        invoker: AgentInvoker<G>,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            session,
            scanner,
            invoker,
            cancel,
            journal: EventLog::disabled(),
            state: WatchState::Idle,
            summary: SessionSummary::default(),
            retry_pending: false,
            observer: None,
        }
    }

    pub fn with_journal(mut self, journal: EventLog) -> Self {
        self.journal = journal;
        self
    }

    /// Call `observer` on every state change.
    pub fn with_observer(mut self, observer: impl FnMut(WatchState) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn session(&self) -> &WatchSession {
        &self.session
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Watch until cancelled or a fatal error occurs.
    pub fn run(mut self) -> Result<SessionSummary> {
        let result = self.watch();
        self.stop();
        result.map(|()| self.summary)
    }

    fn watch(&mut self) -> Result<()> {
        self.start()?;

        while !self.cancel.is_cancelled() {
            self.transition(WatchState::Polling);
            if !self.cancel.sleep(self.session.poll_interval) {
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    /// Resolving: take the initial snapshot.
    ///
    /// Prompts already in the file are left alone until it first changes.
    pub(super) fn start(&mut self) -> Result<()> {
        self.transition(WatchState::Resolving);

        let path = &self.session.file_path;
        let content = fs::read_to_string(path).map_err(|e| {
            EcceError::FileNotFound(format!("{} ({})", path.display(), e))
        })?;
        self.session.last_snapshot = content;
        self.session.processed.clear();
        self.session.running = true;

        info!(
            file = %self.session.file_path.display(),
            agent = %self.session.agent_name,
            "watching"
        );
        self.journal.record(
            Event::new(EventAction::WatchStart)
                .with_file(&self.session.file_path)
                .with_details(json!({
                    "agent": self.session.agent_name,
                    "task": self.session.task_name,
                    "mode": self.session.mode,
                    "poll_interval_ms": self.session.poll_interval.as_millis() as u64,
                })),
        );

        self.transition(WatchState::Polling);
        Ok(())
    }

    /// One poll: re-read, and run a pass if the content changed or a
    /// refused splice is waiting to be retried.
    pub(super) fn tick(&mut self) -> Result<()> {
        let current = match fs::read_to_string(&self.session.file_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    file = %self.session.file_path.display(),
                    "could not read watched file, will retry: {}",
                    e
                );
                return Ok(());
            }
        };

        if current == self.session.last_snapshot && !self.retry_pending {
            return Ok(());
        }

        trace!(retry = self.retry_pending, "scanning again");
        self.retry_pending = false;
        self.session.last_snapshot = current.clone();
        self.pass(current)
    }

    /// Handle every unprocessed prompt in `buffer`, first to last.
    ///
    /// After each splice the file is read again, so offsets always come from
    /// the latest content. Prompts that fail or conflict are skipped for the
    /// rest of the pass. A conflicted or unwritable prompt is retried on the
    /// next tick; a failed invocation waits for the next change.
    fn pass(&mut self, mut buffer: String) -> Result<()> {
        let mut skipped: HashSet<Fingerprint> = HashSet::new();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            self.transition(WatchState::Scanning);

            let next = self
                .scanner
                .scan(&buffer, &self.session.processed)
                .find(|p| !skipped.contains(&p.fingerprint));
            let Some(pattern) = next else {
                self.transition(WatchState::Polling);
                return Ok(());
            };

            if self.cancel.is_cancelled() {
                return Ok(());
            }
            self.transition(WatchState::Invoking);
            let answer = self.invoke(&pattern);

            if self.cancel.is_cancelled() {
                info!(
                    fingerprint = pattern.fingerprint.short(),
                    "interrupted while the agent was running; discarding its answer"
                );
                return Ok(());
            }

            let text = match answer {
                Some(text) => text,
                None => {
                    skipped.insert(pattern.fingerprint.clone());
                    continue;
                }
            };

            self.transition(WatchState::Splicing);
            match splice(&self.session.file_path, &pattern, &text, self.session.mode) {
                Ok(spliced) => {
                    self.summary.spliced += 1;
                    self.session.processed.insert(pattern.fingerprint.clone());
                    self.invoker.remember(&pattern.prompt, &text);
                    info!(
                        fingerprint = pattern.fingerprint.short(),
                        mode = %self.session.mode,
                        relocated = spliced.relocated,
                        "answer written"
                    );
                    self.journal.record(
                        self.event(EventAction::Splice).with_details(json!({
                            "fingerprint": pattern.fingerprint.as_str(),
                            "mode": self.session.mode,
                            "relocated": spliced.relocated,
                            "bytes": text.len(),
                        })),
                    );
                    buffer = self.reread().unwrap_or(spliced.content);
                    self.session.last_snapshot = buffer.clone();
                }
                Err(SpliceError::ConcurrentModification { .. }) => {
                    self.summary.conflicts += 1;
                    warn!(
                        fingerprint = pattern.fingerprint.short(),
                        "file changed around the prompt while the agent was running; \
                         answer discarded, will retry on the next poll"
                    );
                    self.journal.record(
                        self.event(EventAction::SpliceConflict).with_details(json!({
                            "fingerprint": pattern.fingerprint.as_str(),
                        })),
                    );
                    skipped.insert(pattern.fingerprint.clone());
                    self.retry_pending = true;
                    match self.reread() {
                        Some(fresh) => {
                            self.session.last_snapshot = fresh.clone();
                            buffer = fresh;
                        }
                        None => {
                            self.transition(WatchState::Scanning);
                            self.transition(WatchState::Polling);
                            return Ok(());
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        fingerprint = pattern.fingerprint.short(),
                        "transient splice failure, will retry on the next poll: {}",
                        e
                    );
                    skipped.insert(pattern.fingerprint.clone());
                    self.retry_pending = true;
                    match self.reread() {
                        Some(fresh) => {
                            self.session.last_snapshot = fresh.clone();
                            buffer = fresh;
                        }
                        None => {
                            self.transition(WatchState::Scanning);
                            self.transition(WatchState::Polling);
                            return Ok(());
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Run the agent for one pattern. `None` means it failed (already logged).
    fn invoke(&mut self, pattern: &Pattern) -> Option<String> {
        self.summary.invocations += 1;
        info!(
            kind = %pattern.kind,
            fingerprint = pattern.fingerprint.short(),
            "asking agent: {}",
            pattern.preview(PREVIEW_CHARS)
        );
        self.journal.record(
            self.event(EventAction::AgentInvoke).with_details(json!({
                "fingerprint": pattern.fingerprint.as_str(),
                "kind": pattern.kind,
                "prompt": pattern.prompt,
            })),
        );

        let started = Instant::now();
        let result = self.invoker.invoke(&pattern.prompt);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(text) => {
                debug!(elapsed_ms, bytes = text.len(), "agent answered");
                self.journal.record(
                    self.event(EventAction::AgentComplete).with_details(json!({
                        "fingerprint": pattern.fingerprint.as_str(),
                        "elapsed_ms": elapsed_ms,
                    })),
                );
                Some(text)
            }
            Err(e) => {
                self.summary.failures += 1;
                warn!(
                    fingerprint = pattern.fingerprint.short(),
                    elapsed_ms,
                    "agent failed, will retry after the next change: {}",
                    e
                );
                self.journal.record(
                    self.event(EventAction::AgentFailed).with_details(json!({
                        "fingerprint": pattern.fingerprint.as_str(),
                        "error": e.to_string(),
                        "exit_code": e.exit_code(),
                    })),
                );
                None
            }
        }
    }

    fn reread(&self) -> Option<String> {
        match fs::read_to_string(&self.session.file_path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(
                    file = %self.session.file_path.display(),
                    "could not re-read watched file: {}",
                    e
                );
                None
            }
        }
    }

    fn stop(&mut self) {
        let was_running = self.session.running;
        self.session.running = false;
        self.transition(WatchState::Stopped);

        if was_running {
            info!(
                invocations = self.summary.invocations,
                spliced = self.summary.spliced,
                failures = self.summary.failures,
                conflicts = self.summary.conflicts,
                "stopped watching"
            );
            self.journal.record(
                self.event(EventAction::WatchStop)
                    .with_details(json!({ "summary": self.summary })),
            );
        }
    }

    fn event(&self, action: EventAction) -> Event {
        Event::new(action).with_file(&self.session.file_path)
    }

    fn transition(&mut self, next: WatchState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid watch transition {} -> {}",
            self.state,
            next
        );
        trace!(from = %self.state, to = %next, "state");
        self.state = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(next);
        }
    }
}
