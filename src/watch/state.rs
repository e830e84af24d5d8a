//! Watch loop states.

use serde::Serialize;
use std::fmt;

/// Where a [`WatchLoop`](super::WatchLoop) is in its cycle.
///
/// ```text
/// Idle -> Resolving -> Polling -> Scanning -> Invoking -> Splicing
///                         ^          |  ^                    |
///                         +----------+  +--------------------+
/// any state -> Stopped (on cancellation or fatal error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    /// Created, not started.
    #[default]
    Idle,
    /// Locating the file and taking the first snapshot.
    Resolving,
    /// Waiting for the file to change.
    Polling,
    /// Looking for the next unprocessed prompt.
    Scanning,
    /// Waiting for the agent.
    Invoking,
    /// Writing the answer into the file.
    Splicing,
    /// Finished.
    Stopped,
}

impl WatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchState::Idle => "idle",
            WatchState::Resolving => "resolving",
            WatchState::Polling => "polling",
            WatchState::Scanning => "scanning",
            WatchState::Invoking => "invoking",
            WatchState::Splicing => "splicing",
            WatchState::Stopped => "stopped",
        }
    }

    /// Whether `next` may follow `self`.
    pub fn can_transition_to(&self, next: WatchState) -> bool {
        use WatchState::*;
        match (self, next) {
            (_, Stopped) => true,
            (Idle, Resolving) => true,
            (Resolving, Polling) => true,
            (Polling, Polling) | (Polling, Scanning) => true,
            (Scanning, Invoking) | (Scanning, Polling) => true,
            (Invoking, Splicing) | (Invoking, Scanning) => true,
            (Splicing, Scanning) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            WatchState::Idle,
            WatchState::Resolving,
            WatchState::Polling,
            WatchState::Scanning,
            WatchState::Invoking,
            WatchState::Splicing,
            WatchState::Scanning,
            WatchState::Polling,
            WatchState::Stopped,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!WatchState::Idle.can_transition_to(WatchState::Scanning));
        assert!(!WatchState::Polling.can_transition_to(WatchState::Invoking));
        assert!(!WatchState::Invoking.can_transition_to(WatchState::Polling));
        assert!(!WatchState::Stopped.can_transition_to(WatchState::Polling));
    }

    #[test]
    fn test_any_state_can_stop() {
        for state in [
            WatchState::Idle,
            WatchState::Resolving,
            WatchState::Polling,
            WatchState::Scanning,
            WatchState::Invoking,
            WatchState::Splicing,
        ] {
            assert!(state.can_transition_to(WatchState::Stopped));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(WatchState::Splicing.to_string(), "splicing");
        assert_eq!(WatchState::default(), WatchState::Idle);
    }
}
