//! Exit code constants for the ecce CLI.
//!
//! - 0: Success (including a watch session stopped by Ctrl+C)
//! - 1: User error (bad arguments, invalid input)
//! - 2: Watch target not found
//! - 3: Configuration missing or invalid (unknown agent/task, bad config file)
//! - 4: Agent invocation failure surfaced outside a watch session
//! - 5: The watched file could no longer be written or read reliably

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid input.
pub const USER_ERROR: i32 = 1;

/// The watch target (file or directory) could not be resolved.
pub const FILE_NOT_FOUND: i32 = 2;

/// An agent or task name did not resolve, or the config file is invalid.
pub const CONFIG_FAILURE: i32 = 3;

/// The external agent could not be run to completion.
pub const INVOCATION_FAILURE: i32 = 4;

/// A splice hit an I/O error that is not worth retrying.
pub const SPLICE_FAILURE: i32 = 5;
