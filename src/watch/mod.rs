//! File watching for `ecce homo`.
//!
//! A [`WatchLoop`] polls one file. When the content changes it scans for
//! prompts nobody has answered yet, asks the agent about each one in file
//! order, and splices every answer back before looking for the next prompt.
//!
//! Everything runs on the calling thread. The only concurrency is the
//! [`CancelFlag`], which a Ctrl-C handler sets and the loop checks between
//! steps; an agent that is already running is allowed to finish.

mod cancel;
mod engine;
mod session;
mod state;

#[cfg(test)]
mod tests;

pub use cancel::CancelFlag;
pub use engine::{SessionSummary, WatchLoop};
pub use session::{WatchSession, resolve_target};
pub use state::WatchState;
