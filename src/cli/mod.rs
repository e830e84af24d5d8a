//! CLI argument parsing for ecce.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::splice::SpliceMode;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ecce: write a prompt between two `ecce` markers, save, and an agent
/// answers in place.
///
/// Inline prompts look like `ecce what is 2+2? ecce`. Longer prompts go in a
/// fenced block opened with ```ecce and closed with ```.
#[derive(Parser, Debug)]
#[command(name = "ecce")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/ecce/config.json).
    #[arg(long, global = true, env = "ECCE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More logging; repeat for more detail (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for ecce.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch a file and answer ecce prompts as they appear.
    ///
    /// Runs until interrupted with Ctrl-C. A directory target watches the
    /// configured default file inside it (slides.md unless changed).
    Homo(HomoArgs),

    /// Manage configured agents.
    Agent(AgentCommand),

    /// Manage configured tasks.
    Task(TaskCommand),
}

/// Arguments for the `homo` command.
#[derive(Parser, Debug)]
pub struct HomoArgs {
    /// File to watch, or a directory containing the default file.
    pub target: PathBuf,

    /// Agent to use (defaults to the configured default agent).
    #[arg(short, long)]
    pub agent: Option<String>,

    /// Task to wrap every prompt in.
    #[arg(short, long)]
    pub task: Option<String>,

    /// Poll interval in milliseconds (defaults to the configured value).
    #[arg(long, value_name = "MS")]
    pub watch_interval: Option<u64>,

    /// Replace the prompt with the answer, or append the answer below it.
    #[arg(long)]
    pub mode: Option<SpliceMode>,

    /// Seconds before a running agent is killed.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Agent subcommands.
#[derive(Parser, Debug)]
pub struct AgentCommand {
    #[command(subcommand)]
    pub action: AgentAction,
}

/// Available agent actions.
#[derive(Subcommand, Debug)]
pub enum AgentAction {
    /// List configured agents.
    List,

    /// Show one agent in full.
    Show(AgentNameArgs),

    /// Add an agent, replacing any agent with the same name.
    Add(AgentAddArgs),

    /// Remove an agent.
    Remove(AgentNameArgs),

    /// Make an agent the default for `ecce homo`.
    Default(AgentNameArgs),

    /// Import agents from markdown files with YAML frontmatter.
    Import(AgentImportArgs),

    /// Export agents as markdown files with YAML frontmatter.
    Export(AgentExportArgs),

    /// Copy every agent between the config and an agents directory.
    Sync(AgentSyncArgs),
}

/// An agent name.
#[derive(Parser, Debug)]
pub struct AgentNameArgs {
    pub name: String,
}

/// Arguments for the `agent add` command.
#[derive(Parser, Debug)]
pub struct AgentAddArgs {
    /// Agent name.
    pub name: String,

    /// Instructions sent ahead of every prompt.
    #[arg(short, long)]
    pub system_prompt: String,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Model hint passed to the agent command as {model}.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Tool the agent may use (repeatable, or comma separated).
    #[arg(long = "tool", value_delimiter = ',')]
    pub tools: Vec<String>,

    /// File whose content is appended to every prompt (repeatable).
    #[arg(long = "context-file", value_name = "PATH")]
    pub context_files: Vec<PathBuf>,
}

/// Which agents directory to read or write.
///
/// Defaults to `.claude/agents` in the current directory.
#[derive(Args, Debug, Default)]
pub struct AgentDirArgs {
    /// Use the user-level `~/.claude/agents`.
    #[arg(short, long, conflicts_with = "dir")]
    pub user: bool,

    /// Use this directory.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

/// Arguments for the `agent import` command.
#[derive(Parser, Debug)]
pub struct AgentImportArgs {
    /// Markdown file, or directory of `*.md` files. Defaults to the agents
    /// directory.
    #[arg(conflicts_with_all = ["user", "dir"])]
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub location: AgentDirArgs,
}

/// Arguments for the `agent export` command.
#[derive(Parser, Debug)]
pub struct AgentExportArgs {
    /// Agent to export; every agent when omitted.
    pub name: Option<String>,

    #[command(flatten)]
    pub location: AgentDirArgs,
}

/// Arguments for the `agent sync` command.
#[derive(Parser, Debug)]
pub struct AgentSyncArgs {
    #[arg(short, long, value_enum, default_value_t = SyncDirection::Import)]
    pub direction: SyncDirection,

    #[command(flatten)]
    pub location: AgentDirArgs,
}

/// Direction of `agent sync`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncDirection {
    /// Agents directory into the config.
    Import,
    /// Config into the agents directory.
    Export,
}

/// Task subcommands.
#[derive(Parser, Debug)]
pub struct TaskCommand {
    #[command(subcommand)]
    pub action: TaskAction,
}

/// Available task actions.
#[derive(Subcommand, Debug)]
pub enum TaskAction {
    /// List configured tasks.
    List,

    /// Add a task, replacing any task with the same name.
    Add(TaskAddArgs),

    /// Remove a task.
    Remove(TaskNameArgs),
}

/// Arguments for the `task add` command.
#[derive(Parser, Debug)]
pub struct TaskAddArgs {
    /// Task name.
    pub name: String,

    /// Prompt template. `{prompt}` is replaced by the prompt; without it the
    /// template is sent ahead of the prompt.
    #[arg(short, long)]
    pub template: String,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Splice mode used when this task is selected.
    #[arg(long)]
    pub mode: Option<SpliceMode>,
}

/// A task name.
#[derive(Parser, Debug)]
pub struct TaskNameArgs {
    pub name: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
