//! Configuration model for ecce.
//!
//! The configuration is a JSON document, by default at
//! `~/.config/ecce/config.json`. It holds the named agents and tasks plus the
//! engine settings for `ecce homo`. Every field is optional; a missing file
//! means all defaults. Fields ecce does not know about (for example the
//! `profiles` and `mcp_servers` written by older releases) are kept as-is and
//! written back on save.

mod frontmatter;
mod model;
mod operations;
mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use frontmatter::{agent_from_markdown, agent_to_markdown};
pub use model::Config;
pub use operations::{agents_dir, default_path};
pub use store::ConfigStore;
pub use types::{Agent, Task};
