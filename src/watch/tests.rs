use super::*;
use crate::agent::{AgentInvoker, Generator, InvocationError, InvocationRequest, PromptStrategy};
use crate::config::Agent;
use crate::error::EcceError;
use crate::events::EventLog;
use crate::pattern::PatternScanner;
use crate::splice::SpliceMode;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

type Reply = Box<dyn Fn(&InvocationRequest) -> Result<String, InvocationError>>;

/// Answers with scripted replies, then with the prompt in upper case.
#[derive(Default)]
struct Scripted {
    replies: RefCell<VecDeque<Reply>>,
    prompts: RefCell<Vec<String>>,
}

impl Scripted {
    fn then(self, reply: impl Fn(&InvocationRequest) -> Result<String, InvocationError> + 'static) -> Self {
        self.replies.borrow_mut().push_back(Box::new(reply));
        self
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Generator for Scripted {
    fn generate(&self, request: &InvocationRequest) -> Result<String, InvocationError> {
        self.prompts.borrow_mut().push(request.composed_prompt.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(reply) => reply(request),
            None => Ok(request.composed_prompt.to_uppercase()),
        }
    }
}

fn setup(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("slides.md");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

fn watcher<'g>(
    path: &Path,
    generator: &'g Scripted,
    mode: SpliceMode,
    cancel: CancelFlag,
) -> WatchLoop<&'g Scripted> {
    watcher_every(path, generator, mode, cancel, Duration::from_millis(10))
}

fn watcher_every<'g>(
    path: &Path,
    generator: &'g Scripted,
    mode: SpliceMode,
    cancel: CancelFlag,
    poll_interval: Duration,
) -> WatchLoop<&'g Scripted> {
    let session = WatchSession::new(path, "tester", None, poll_interval, mode);
    let scanner = PatternScanner::new("ecce").unwrap();
    let invoker =
        AgentInvoker::new(Agent::new("tester", ""), PromptStrategy::Direct, generator).unwrap();
    WatchLoop::new(session, scanner, invoker, cancel)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_prompts_present_at_start_wait_for_first_change() {
    let (_dir, path) = setup("ecce a ecce\n");
    let generator = Scripted::default();
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());

    lp.start().unwrap();
    lp.tick().unwrap();
    assert!(generator.prompts().is_empty());
    assert_eq!(read(&path), "ecce a ecce\n");

    fs::write(&path, "ecce a ecce\n\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(generator.prompts(), vec!["a"]);
    assert_eq!(read(&path), "A\n\n");
}

#[test]
fn test_prompts_answered_in_file_order() {
    let (_dir, path) = setup("");
    let generator = Scripted::default();
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "ecce one ecce\n```ecce\ntwo\n```\necce three ecce\nend\n").unwrap();
    lp.tick().unwrap();

    assert_eq!(generator.prompts(), vec!["one", "two", "three"]);
    assert_eq!(read(&path), "ONE\nTWO\nTHREE\nend\n");
    assert_eq!(lp.summary().spliced, 3);
    assert_eq!(lp.session().last_snapshot, read(&path));

    // Our own write is not a change.
    lp.tick().unwrap();
    assert_eq!(generator.prompts().len(), 3);
}

#[test]
fn test_appended_prompt_is_not_answered_twice() {
    let (_dir, path) = setup("");
    let generator = Scripted::default();
    let mut lp = watcher(&path, &generator, SpliceMode::Append, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "ecce q ecce\nx\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(read(&path), "ecce q ecce\n\nQ\nx\n");

    fs::write(&path, "ecce q ecce\n\nQ\nx\ny\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(generator.prompts(), vec!["q"]);
    assert_eq!(lp.session().processed.len(), 1);
}

#[test]
fn test_failed_prompt_is_skipped_then_retried_after_next_change() {
    let (_dir, path) = setup("");
    let generator = Scripted::default().then(|_| {
        Err(InvocationError::NonZeroExit {
            exit_code: Some(1),
            stderr_excerpt: "rate limited".to_string(),
        })
    });
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "ecce a ecce\necce b ecce\n!").unwrap();
    lp.tick().unwrap();
    assert_eq!(generator.prompts(), vec!["a", "b"]);
    assert_eq!(read(&path), "ecce a ecce\nB\n!");
    assert_eq!(
        lp.summary(),
        SessionSummary {
            invocations: 2,
            spliced: 1,
            failures: 1,
            conflicts: 0,
        }
    );

    lp.tick().unwrap();
    assert_eq!(generator.prompts().len(), 2);

    fs::write(&path, "ecce a ecce\nB\n!?").unwrap();
    lp.tick().unwrap();
    assert_eq!(generator.prompts(), vec!["a", "b", "a"]);
    assert_eq!(read(&path), "A\nB\n!?");
}

#[test]
fn test_edit_around_prompt_during_invocation_is_retried_next_poll() {
    let (_dir, path) = setup("intro\necce a ecce\noutro\n");
    let edited = "intro changed\necce a ecce\noutro\n!\n";
    let hook_path = path.clone();
    let generator = Scripted::default().then(move |_| {
        fs::write(&hook_path, edited).unwrap();
        Ok("A".to_string())
    });
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "intro\necce a ecce\noutro\n!\n").unwrap();
    lp.tick().unwrap();

    assert_eq!(read(&path), edited);
    assert_eq!(lp.summary().conflicts, 1);
    assert_eq!(lp.summary().spliced, 0);
    assert!(lp.session().processed.is_empty());

    // No further edit: the next poll asks again.
    lp.tick().unwrap();
    assert_eq!(generator.prompts(), vec!["a", "a"]);
    assert_eq!(read(&path), "intro changed\nA\noutro\n!\n");
    assert_eq!(lp.summary().spliced, 1);

    for _ in 0..3 {
        lp.tick().unwrap();
    }
    assert_eq!(generator.prompts().len(), 2);
}

#[test]
fn test_file_missing_at_splice_time_is_retried() {
    let (_dir, path) = setup("");
    let hook_path = path.clone();
    let generator = Scripted::default().then(move |_| {
        fs::remove_file(&hook_path).unwrap();
        Ok("A".to_string())
    });
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "ecce a ecce\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(lp.state(), WatchState::Polling);
    assert_eq!(lp.summary().spliced, 0);
    assert!(!path.exists());

    // The editor finishes its save with the same content.
    fs::write(&path, "ecce a ecce\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(generator.prompts(), vec!["a", "a"]);
    assert_eq!(read(&path), "A\n");
}

#[test]
fn test_prompt_moved_during_invocation_is_relocated() {
    let (_dir, path) = setup("");
    let hook_path = path.clone();
    let generator = Scripted::default().then(move |_| {
        let current = fs::read_to_string(&hook_path).unwrap();
        fs::write(&hook_path, format!("# header\n{}", current)).unwrap();
        Ok("A".to_string())
    });
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "intro\necce a ecce\noutro\n").unwrap();
    lp.tick().unwrap();

    assert_eq!(read(&path), "# header\nintro\nA\noutro\n");
    assert_eq!(lp.summary().spliced, 1);
    assert_eq!(lp.summary().conflicts, 0);
}

#[test]
fn test_answer_containing_a_prompt_is_answered_too() {
    let (_dir, path) = setup("");
    let generator = Scripted::default().then(|_| Ok("see ecce b ecce".to_string()));
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "ecce a ecce\n").unwrap();
    lp.tick().unwrap();

    assert_eq!(generator.prompts(), vec!["a", "b"]);
    assert_eq!(read(&path), "see B\n");
}

#[test]
fn test_history_holds_only_answers_that_were_written() {
    let (_dir, path) = setup("");
    let generator = Scripted::default()
        .then(|_| {
            Err(InvocationError::NonZeroExit {
                exit_code: Some(1),
                stderr_excerpt: String::new(),
            })
        })
        .then(|_| Ok("B".to_string()))
        .then(|_| Ok("A".to_string()))
        .then(|_| Ok("C".to_string()));
    let session = WatchSession::new(
        &path,
        "tester",
        None,
        Duration::from_millis(10),
        SpliceMode::Replace,
    );
    let invoker = AgentInvoker::new(Agent::new("tester", ""), PromptStrategy::Direct, &generator)
        .unwrap()
        .with_history();
    let scanner = PatternScanner::new("ecce").unwrap();
    let mut lp = WatchLoop::new(session, scanner, invoker, CancelFlag::new());
    lp.start().unwrap();

    fs::write(&path, "ecce a ecce\necce b ecce\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(read(&path), "ecce a ecce\nB\n");

    fs::write(&path, "ecce a ecce\nB\necce c ecce\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(read(&path), "A\nB\nC\n");
    assert_eq!(
        generator.prompts(),
        vec![
            "a",
            "b",
            "## Previous Conversation:\n\nUser: b\n\nAssistant: B\n\n---\n\na",
            "## Previous Conversation:\n\nUser: b\n\nAssistant: B\n\n\
             User: a\n\nAssistant: A\n\n---\n\nc",
        ]
    );
}

#[test]
fn test_unreadable_file_while_polling_is_not_fatal() {
    let (_dir, path) = setup("start\n");
    let generator = Scripted::default();
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new());
    lp.start().unwrap();

    fs::remove_file(&path).unwrap();
    lp.tick().unwrap();
    assert_eq!(lp.state(), WatchState::Polling);

    fs::write(&path, "ecce back ecce\n").unwrap();
    lp.tick().unwrap();
    assert_eq!(read(&path), "BACK\n");
}

#[test]
fn test_state_sequence_for_one_prompt() {
    let (_dir, path) = setup("");
    let generator = Scripted::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new())
        .with_observer(move |state| sink.borrow_mut().push(state));

    lp.start().unwrap();
    fs::write(&path, "ecce a ecce\n").unwrap();
    lp.tick().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            WatchState::Resolving,
            WatchState::Polling,
            WatchState::Scanning,
            WatchState::Invoking,
            WatchState::Splicing,
            WatchState::Scanning,
            WatchState::Polling,
        ]
    );
}

#[test]
fn test_cancelled_before_run_returns_empty_summary() {
    let (_dir, path) = setup("ecce a ecce\n");
    let generator = Scripted::default();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let summary = watcher(&path, &generator, SpliceMode::Replace, cancel)
        .with_observer(move |state| sink.borrow_mut().push(state))
        .run()
        .unwrap();

    assert_eq!(summary, SessionSummary::default());
    assert_eq!(
        *seen.borrow(),
        vec![WatchState::Resolving, WatchState::Polling, WatchState::Stopped]
    );
    assert!(generator.prompts().is_empty());
}

#[test]
fn test_interrupt_while_polling_leaves_new_prompt_alone() {
    let (_dir, path) = setup("start\n");
    let cancel = CancelFlag::new();
    let remote = cancel.clone();
    let generator = Scripted::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        fs::write(&writer_path, "start\necce a ecce\n").unwrap();
        thread::sleep(Duration::from_millis(50));
        remote.cancel();
    });

    let started = std::time::Instant::now();
    let summary = watcher_every(
        &path,
        &generator,
        SpliceMode::Replace,
        cancel,
        Duration::from_secs(30),
    )
    .with_observer(move |state| sink.borrow_mut().push(state))
    .run()
    .unwrap();
    writer.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(summary, SessionSummary::default());
    assert!(generator.prompts().is_empty());
    assert_eq!(read(&path), "start\necce a ecce\n");
    assert_eq!(seen.borrow().last(), Some(&WatchState::Stopped));
}

#[test]
fn test_interrupt_during_invocation_discards_answer() {
    let (_dir, path) = setup("start\n");
    let cancel = CancelFlag::new();
    let remote = cancel.clone();
    let generator = Scripted::default().then(move |_| {
        remote.cancel();
        Ok("too late".to_string())
    });

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        fs::write(&writer_path, "start\necce a ecce\n").unwrap();
    });

    let summary = watcher(&path, &generator, SpliceMode::Replace, cancel)
        .run()
        .unwrap();
    writer.join().unwrap();

    assert_eq!(summary.invocations, 1);
    assert_eq!(summary.spliced, 0);
    assert_eq!(read(&path), "start\necce a ecce\n");
}

#[test]
fn test_missing_file_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let generator = Scripted::default();
    let err = watcher(
        &temp_dir.path().join("gone.md"),
        &generator,
        SpliceMode::Replace,
        CancelFlag::new(),
    )
    .run()
    .unwrap_err();

    assert!(matches!(err, EcceError::FileNotFound(_)));
}

#[test]
fn test_journal_records_session_events() {
    let (dir, path) = setup("");
    let log_path = dir.path().join("events.ndjson");
    let generator = Scripted::default();
    let mut lp = watcher(&path, &generator, SpliceMode::Replace, CancelFlag::new())
        .with_journal(EventLog::new(&log_path));

    lp.start().unwrap();
    fs::write(&path, "ecce a ecce\n").unwrap();
    lp.tick().unwrap();

    let actions: Vec<String> = read(&log_path)
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["action"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        actions,
        vec!["watch_start", "agent_invoke", "agent_complete", "splice"]
    );
}
