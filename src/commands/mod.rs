//! Command implementations for ecce.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations and resolves the configuration file they share.

mod agent;
mod homo;
mod select;
mod task;

use crate::cli::{AgentAction, Cli, Command, TaskAction};
use crate::config::default_path;
use crate::error::Result;
use std::path::PathBuf;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_path()?,
    };

    match cli.command {
        Command::Homo(args) => homo::cmd_homo(&config_path, args),
        Command::Agent(cmd) => dispatch_agent(config_path, cmd.action),
        Command::Task(cmd) => dispatch_task(config_path, cmd.action),
    }
}

fn dispatch_agent(config_path: PathBuf, action: AgentAction) -> Result<()> {
    match action {
        AgentAction::List => agent::cmd_agent_list(&config_path),
        AgentAction::Show(args) => agent::cmd_agent_show(&config_path, &args.name),
        AgentAction::Add(args) => agent::cmd_agent_add(&config_path, args),
        AgentAction::Remove(args) => agent::cmd_agent_remove(&config_path, &args.name),
        AgentAction::Default(args) => agent::cmd_agent_default(&config_path, &args.name),
        AgentAction::Import(args) => agent::cmd_agent_import(&config_path, args),
        AgentAction::Export(args) => {
            agent::cmd_agent_export(&config_path, args.name.as_deref(), &args.location)
        }
        AgentAction::Sync(args) => {
            agent::cmd_agent_sync(&config_path, args.direction, &args.location)
        }
    }
}

fn dispatch_task(config_path: PathBuf, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::List => task::cmd_task_list(&config_path),
        TaskAction::Add(args) => task::cmd_task_add(&config_path, args),
        TaskAction::Remove(args) => task::cmd_task_remove(&config_path, &args.name),
    }
}
