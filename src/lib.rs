//! ecce: watch a text file and let an external agent answer the prompts
//! written into it.
//!
//! A prompt is either inline, `ecce what is 2+2? ecce`, or a fenced block
//! opened with ```` ```ecce ````. While `ecce homo` runs, every new prompt is
//! sent to the configured agent command and the answer is spliced back into
//! the file in place of the prompt (or below it).
//!
//! The pieces, bottom up:
//!
//! - [`pattern`] finds prompts and fingerprints them
//! - [`agent`] composes the full prompt and runs the agent command
//! - [`splice`] writes an answer back, refusing when the user edited around it
//! - [`watch`] drives poll, scan, invoke and splice for one file
//! - [`config`] holds agents, tasks and settings in `config.json`

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod pattern;
pub mod splice;
pub mod watch;
