//! Config loading, validation, persistence and editing.

use super::model::Config;
use super::types::{Agent, DEFAULT_AGENT_COMMAND, Task};
use crate::error::{EcceError, Result};
use crate::pattern::PatternScanner;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `~/.config/ecce/config.json`.
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        EcceError::ConfigError(
            "could not determine home directory; pass --config or set ECCE_CONFIG".to_string(),
        )
    })?;
    Ok(home.join(".config").join("ecce").join("config.json"))
}

/// `.claude/agents` in the current directory, or `~/.claude/agents` for
/// `user`.
pub fn agents_dir(user: bool) -> Result<PathBuf> {
    let project = Path::new(".claude").join("agents");
    if !user {
        return Ok(project);
    }
    let home = dirs::home_dir().ok_or_else(|| {
        EcceError::UserError(
            "could not determine home directory for --user; pass --dir instead".to_string(),
        )
    })?;
    Ok(home.join(project))
}

impl Config {
    /// Load config from a JSON file.
    ///
    /// A missing file yields the defaults. Unknown fields are kept in
    /// `extra` so a later save writes them back.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            EcceError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse config from a JSON string. Blank input means defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: Config = serde_json::from_str(json)
            .map_err(|e| EcceError::ConfigError(format!("failed to parse config JSON: {}", e)))?;

        for (key, agent) in config.agents.iter_mut() {
            if agent.name.is_empty() {
                agent.name = key.clone();
            }
        }
        for (key, task) in config.tasks.iter_mut() {
            if task.name.is_empty() {
                task.name = key.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            EcceError::ConfigError(format!("failed to serialize config to JSON: {}", e))
        })
    }

    /// Atomically write the config to `path`, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut content = self.to_json()?;
        content.push('\n');
        crate::fs::atomic_write_file(path, &content).map_err(|e| {
            EcceError::ConfigError(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `poll_interval_ms` and `invocation_timeout_secs` must be positive
    /// - `marker` must be usable as a prompt delimiter
    /// - `default_file_name` must be a bare file name
    /// - `agent_command`, when set, must not be blank
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(EcceError::ConfigError(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.invocation_timeout_secs == 0 {
            return Err(EcceError::ConfigError(
                "invocation_timeout_secs must be greater than 0".to_string(),
            ));
        }

        PatternScanner::new(&self.marker)?;

        if self.default_file_name.trim().is_empty()
            || self.default_file_name.contains('/')
            || self.default_file_name.contains('\\')
        {
            return Err(EcceError::ConfigError(format!(
                "default_file_name must be a plain file name (found '{}')",
                self.default_file_name
            )));
        }

        if self
            .agent_command
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(EcceError::ConfigError(
                "agent_command must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The command line used to run agents.
    pub fn agent_command(&self) -> String {
        if let Some(command) = &self.agent_command {
            return command.clone();
        }
        match &self.claude_executable {
            Some(exe) => format!("{} -p", shell_words::quote(exe)),
            None => DEFAULT_AGENT_COMMAND.to_string(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.invocation_timeout_secs)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Insert or replace an agent. Returns true when one was replaced.
    pub fn add_agent(&mut self, agent: Agent) -> Result<bool> {
        validate_name("agent", &agent.name)?;
        Ok(self.agents.insert(agent.name.clone(), agent).is_some())
    }

    /// Remove an agent, clearing `default_agent` if it pointed at it.
    pub fn remove_agent(&mut self, name: &str) -> Result<Agent> {
        let agent = self
            .agents
            .remove(name)
            .ok_or_else(|| EcceError::ConfigMissing(format!("agent '{}' not found", name)))?;
        if self.default_agent.as_deref() == Some(name) {
            self.default_agent = None;
        }
        Ok(agent)
    }

    pub fn set_default_agent(&mut self, name: &str) -> Result<()> {
        if !self.agents.contains_key(name) {
            return Err(EcceError::ConfigMissing(format!(
                "agent '{}' not found",
                name
            )));
        }
        self.default_agent = Some(name.to_string());
        Ok(())
    }

    /// The default agent, if one is set and still exists.
    pub fn default_agent(&self) -> Option<&Agent> {
        self.default_agent
            .as_deref()
            .and_then(|name| self.agents.get(name))
    }

    /// Insert or replace a task. Returns true when one was replaced.
    pub fn add_task(&mut self, task: Task) -> Result<bool> {
        validate_name("task", &task.name)?;
        if task.template.trim().is_empty() {
            return Err(EcceError::UserError(format!(
                "task '{}' needs a non-empty template",
                task.name
            )));
        }
        Ok(self.tasks.insert(task.name.clone(), task).is_some())
    }

    pub fn remove_task(&mut self, name: &str) -> Result<Task> {
        self.tasks
            .remove(name)
            .ok_or_else(|| EcceError::ConfigMissing(format!("task '{}' not found", name)))
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EcceError::UserError(format!("{} name must not be empty", kind)));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(EcceError::UserError(format!(
            "{} name '{}' must not contain path separators",
            kind, name
        )));
    }
    Ok(())
}
