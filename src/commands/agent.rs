//! Implementation of the `ecce agent` commands.

use crate::cli::{AgentAddArgs, AgentDirArgs, AgentImportArgs, SyncDirection};
use crate::config::types::dedup_tools;
use crate::config::{
    Agent, Config, ConfigStore, agent_from_markdown, agent_to_markdown, agents_dir,
};
use crate::error::{EcceError, Result};
use crate::fs::atomic_write_file;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Longest system prompt excerpt shown by `agent list`.
const LIST_PROMPT_CHARS: usize = 50;

pub fn cmd_agent_list(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let agents = config.list_agents();

    if agents.is_empty() {
        println!("No agents configured.");
        println!();
        println!("Add one with: ecce agent add <name> --system-prompt \"...\"");
        return Ok(());
    }

    println!("Configured agents ({}):", agents.len());
    println!();
    for agent in agents {
        let default_marker = if config.default_agent.as_deref() == Some(agent.name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!("  {}{}", agent.name, default_marker);
        if let Some(description) = &agent.description {
            println!("    Description: {}", description);
        }
        println!(
            "    Prompt:      {}",
            truncate(&agent.system_prompt, LIST_PROMPT_CHARS)
        );
        if let Some(model) = &agent.model {
            println!("    Model:       {}", model);
        }
        println!();
    }
    Ok(())
}

pub fn cmd_agent_show(config_path: &Path, name: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let agent = config.get_agent(name)?;

    println!("Agent: {}", agent.name);
    if config.default_agent.as_deref() == Some(agent.name.as_str()) {
        println!("Default: yes");
    }
    if let Some(description) = &agent.description {
        println!("Description: {}", description);
    }
    if let Some(model) = &agent.model {
        println!("Model: {}", model);
    }
    if !agent.tools.is_empty() {
        println!("Tools: {}", agent.tools.join(", "));
    }
    if !agent.context_files.is_empty() {
        println!("Context files:");
        for path in &agent.context_files {
            println!("  {}", path.display());
        }
    }
    println!();
    println!("{}", agent.system_prompt);
    Ok(())
}

pub fn cmd_agent_add(config_path: &Path, args: AgentAddArgs) -> Result<()> {
    let mut config = Config::load(config_path)?;

    let mut agent = Agent::new(args.name, args.system_prompt);
    agent.description = args.description;
    agent.model = args.model;
    agent.tools = dedup_tools(args.tools);
    agent.context_files = args.context_files;

    let name = agent.name.clone();
    let replaced = config.add_agent(agent)?;
    config.save(config_path)?;

    if replaced {
        println!("Updated agent '{}'.", name);
    } else {
        println!("Added agent '{}'.", name);
    }
    Ok(())
}

pub fn cmd_agent_remove(config_path: &Path, name: &str) -> Result<()> {
    let mut config = Config::load(config_path)?;
    config.remove_agent(name)?;
    config.save(config_path)?;
    println!("Removed agent '{}'.", name);
    Ok(())
}

pub fn cmd_agent_default(config_path: &Path, name: &str) -> Result<()> {
    let mut config = Config::load(config_path)?;
    config.set_default_agent(name)?;
    config.save(config_path)?;
    println!("Default agent is now '{}'.", name);
    Ok(())
}

pub fn cmd_agent_import(config_path: &Path, args: AgentImportArgs) -> Result<()> {
    let source = match args.path {
        Some(path) if !path.is_dir() => path,
        Some(dir) => return import_dir(config_path, &dir),
        None => return import_dir(config_path, &resolve_dir(&args.location)?),
    };

    let agent = read_agent_file(&source)?;
    let mut config = Config::load(config_path)?;
    let name = agent.name.clone();
    let replaced = config.add_agent(agent)?;
    config.save(config_path)?;

    let verb = if replaced { "Updated" } else { "Imported" };
    println!("{} agent '{}' from {}.", verb, name, source.display());
    Ok(())
}

pub fn cmd_agent_export(
    config_path: &Path,
    name: Option<&str>,
    location: &AgentDirArgs,
) -> Result<()> {
    let dir = resolve_dir(location)?;
    match name {
        Some(name) => {
            let config = Config::load(config_path)?;
            let agent = config.get_agent(name)?;
            let path = write_agent_file(&dir, agent)?;
            println!("Exported agent '{}' to {}.", agent.name, path.display());
            Ok(())
        }
        None => export_all(config_path, &dir),
    }
}

pub fn cmd_agent_sync(
    config_path: &Path,
    direction: SyncDirection,
    location: &AgentDirArgs,
) -> Result<()> {
    let dir = resolve_dir(location)?;
    match direction {
        SyncDirection::Import => import_dir(config_path, &dir),
        SyncDirection::Export => export_all(config_path, &dir),
    }
}

/// Import every `*.md` file in `dir`, in name order. Files that do not parse
/// are reported and skipped.
fn import_dir(config_path: &Path, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        println!("No agents directory at {}.", dir.display());
        return Ok(());
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        EcceError::UserError(format!("failed to read '{}': {}", dir.display(), e))
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();

    let mut config = Config::load(config_path)?;
    let mut imported = Vec::new();
    for path in &files {
        match read_agent_file(path) {
            Ok(agent) => {
                imported.push(agent.name.clone());
                config.add_agent(agent)?;
            }
            Err(e) => warn!(path = %path.display(), "skipping agent file: {}", e),
        }
    }

    if imported.is_empty() {
        println!("No agents imported from {}.", dir.display());
        return Ok(());
    }
    config.save(config_path)?;

    println!("Imported {} agent(s) from {}:", imported.len(), dir.display());
    for name in imported {
        println!("  {}", name);
    }
    Ok(())
}

fn export_all(config_path: &Path, dir: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let agents = config.list_agents();
    if agents.is_empty() {
        println!("No agents to export.");
        return Ok(());
    }

    for agent in &agents {
        write_agent_file(dir, agent)?;
    }
    println!("Exported {} agent(s) to {}:", agents.len(), dir.display());
    for agent in agents {
        println!("  {}", agent.name);
    }
    Ok(())
}

fn resolve_dir(location: &AgentDirArgs) -> Result<PathBuf> {
    match &location.dir {
        Some(dir) => Ok(dir.clone()),
        None => agents_dir(location.user),
    }
}

fn read_agent_file(path: &Path) -> Result<Agent> {
    let content = fs::read_to_string(path).map_err(|e| {
        EcceError::UserError(format!(
            "failed to read agent file '{}': {}",
            path.display(),
            e
        ))
    })?;
    agent_from_markdown(&content)
}

/// Write `<dir>/<name>.md`, creating `dir` first.
fn write_agent_file(dir: &Path, agent: &Agent) -> Result<PathBuf> {
    let path = export_path(dir, &agent.name);
    fs::create_dir_all(dir).map_err(|e| {
        EcceError::UserError(format!(
            "failed to create directory '{}': {}",
            dir.display(),
            e
        ))
    })?;
    atomic_write_file(&path, &agent_to_markdown(agent)?).map_err(|e| {
        EcceError::UserError(format!("failed to write '{}': {}", path.display(), e))
    })?;
    Ok(path)
}

fn export_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.md", name))
}

fn truncate(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max_chars && !text.trim_end().contains('\n') {
        return first_line.to_string();
    }
    let clipped: String = first_line.chars().take(max_chars).collect();
    format!("{}...", clipped)
}
