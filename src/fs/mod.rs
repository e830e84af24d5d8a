//! Filesystem utilities for ecce.
//!
//! Every write to the watched file or the config file goes through
//! [`atomic_write`], so a reader never observes a truncated file.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
