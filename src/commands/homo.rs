//! Implementation of the `ecce homo` command.
//!
//! Resolves the file, agent and task, wires the pattern scanner and agent
//! command into a [`WatchLoop`], and runs it until Ctrl-C.

use super::select;
use crate::agent::{AgentInvoker, CommandGenerator, PromptStrategy};
use crate::cli::HomoArgs;
use crate::config::{Agent, Config, ConfigStore, Task};
use crate::error::{EcceError, Result};
use crate::events::EventLog;
use crate::pattern::PatternScanner;
use crate::splice::SpliceMode;
use crate::watch::{CancelFlag, WatchLoop, WatchSession, resolve_target};
use std::path::Path;
use std::time::Duration;

const NO_TASK: &str = "(no task)";

pub fn cmd_homo(config_path: &Path, args: HomoArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let interactive = select::is_interactive();

    let file_path = resolve_target(&args.target, &config.default_file_name)?;
    let agent = resolve_agent(&config, args.agent.as_deref(), interactive)?.clone();
    let task = resolve_task(&config, args.task.as_deref(), interactive)?.cloned();

    let mode = resolve_mode(args.mode, task.as_ref(), &config);
    let poll_interval = match args.watch_interval {
        Some(0) => {
            return Err(EcceError::UserError(
                "--watch-interval must be greater than 0".to_string(),
            ));
        }
        Some(ms) => Duration::from_millis(ms),
        None => config.poll_interval(),
    };
    let timeout = match args.timeout {
        Some(0) => {
            return Err(EcceError::UserError(
                "--timeout must be greater than 0".to_string(),
            ));
        }
        Some(secs) => Duration::from_secs(secs),
        None => config.invocation_timeout(),
    };

    let generator = CommandGenerator::new(&config.agent_command(), timeout)?;
    let scanner = PatternScanner::new(&config.marker)?;
    let mut invoker = AgentInvoker::new(
        agent.clone(),
        PromptStrategy::for_task(task.as_ref()),
        generator,
    )?;
    if config.conversation_history {
        invoker = invoker.with_history();
    }

    let session = WatchSession::new(
        &file_path,
        &agent.name,
        task.as_ref().map(|t| t.name.clone()),
        poll_interval,
        mode,
    );

    let journal = if config.journal {
        EventLog::beside_config(config_path)
    } else {
        EventLog::disabled()
    };

    let cancel = CancelFlag::new();
    cancel.cancel_on_interrupt()?;

    eprintln!("ecce homo started");
    eprintln!("  file:     {}", file_path.display());
    eprintln!("  agent:    {}", agent.name);
    eprintln!(
        "  task:     {}",
        task.as_ref().map(|t| t.name.as_str()).unwrap_or("(none)")
    );
    eprintln!("  mode:     {}", mode);
    eprintln!("  command:  {}", config.agent_command());
    eprintln!("  patterns: {m} <prompt> {m}", m = scanner.marker());
    eprintln!("            ```{}\\n<prompt>\\n```", scanner.marker());
    eprintln!("  interval: {}ms", poll_interval.as_millis());
    if config.conversation_history {
        eprintln!("  history:  on");
    }
    eprintln!();
    eprintln!("Press Ctrl-C to stop.");

    let summary = WatchLoop::new(session, scanner, invoker, cancel)
        .with_journal(journal)
        .run()?;

    eprintln!();
    eprintln!(
        "ecce homo stopped: {} answered, {} failed, {} conflicted",
        summary.spliced, summary.failures, summary.conflicts
    );
    Ok(())
}

/// `--agent`, else the default agent, else the only agent, else ask.
fn resolve_agent<'c>(
    config: &'c Config,
    requested: Option<&str>,
    interactive: bool,
) -> Result<&'c Agent> {
    if let Some(name) = requested {
        return config.get_agent(name);
    }
    if let Some(agent) = config.default_agent() {
        return Ok(agent);
    }

    let agents = config.list_agents();
    match agents.as_slice() {
        [] => Err(EcceError::ConfigMissing(
            "no agents configured. Add one with 'ecce agent add <name> --system-prompt ...'"
                .to_string(),
        )),
        [only] => Ok(*only),
        _ if !interactive => Err(EcceError::ConfigMissing(
            "several agents are configured and there is no terminal to choose one. \
             Pass --agent or set a default with 'ecce agent default <name>'"
                .to_string(),
        )),
        _ => {
            let labels: Vec<String> = agents
                .iter()
                .map(|a| describe(&a.name, a.description.as_deref()))
                .collect();
            let index = select::choose("Select an agent", &labels)?;
            Ok(agents[index])
        }
    }
}

/// `--task`, else nothing when no tasks exist, else ask (with a "no task"
/// choice). Without a terminal no task is used.
fn resolve_task<'c>(
    config: &'c Config,
    requested: Option<&str>,
    interactive: bool,
) -> Result<Option<&'c Task>> {
    if let Some(name) = requested {
        return config.get_task(name).map(Some);
    }

    let tasks = config.list_tasks();
    if tasks.is_empty() || !interactive {
        return Ok(None);
    }

    let mut labels = vec![NO_TASK.to_string()];
    labels.extend(tasks.iter().map(|t| describe(&t.name, t.description.as_deref())));
    let index = select::choose("Select a task", &labels)?;
    Ok(index.checked_sub(1).map(|i| tasks[i]))
}

/// `--mode`, else the task's mode, else the configured mode.
fn resolve_mode(flag: Option<SpliceMode>, task: Option<&Task>, config: &Config) -> SpliceMode {
    flag.or_else(|| task.and_then(|t| t.mode))
        .unwrap_or(config.splice_mode)
}

fn describe(name: &str, description: Option<&str>) -> String {
    match description {
        Some(d) if !d.trim().is_empty() => format!("{} - {}", name, d.trim()),
        _ => name.to_string(),
    }
}
