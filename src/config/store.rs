//! Name lookup for agents and tasks.

use super::model::Config;
use super::types::{Agent, Task};
use crate::error::{EcceError, Result};

/// Read access to the named agents and tasks.
///
/// The watch engine only needs lookups; editing goes through [`Config`]
/// directly.
pub trait ConfigStore {
    fn get_agent(&self, name: &str) -> Result<&Agent>;
    fn get_task(&self, name: &str) -> Result<&Task>;

    /// Agents sorted by name.
    fn list_agents(&self) -> Vec<&Agent>;

    /// Tasks sorted by name.
    fn list_tasks(&self) -> Vec<&Task>;
}

impl ConfigStore for Config {
    fn get_agent(&self, name: &str) -> Result<&Agent> {
        self.agents.get(name).ok_or_else(|| {
            EcceError::ConfigMissing(format!(
                "agent '{}' not found. Run 'ecce agent list' to see configured agents",
                name
            ))
        })
    }

    fn get_task(&self, name: &str) -> Result<&Task> {
        self.tasks.get(name).ok_or_else(|| {
            EcceError::ConfigMissing(format!(
                "task '{}' not found. Run 'ecce task list' to see configured tasks",
                name
            ))
        })
    }

    fn list_agents(&self) -> Vec<&Agent> {
        self.agents.values().collect()
    }

    fn list_tasks(&self) -> Vec<&Task> {
        self.tasks.values().collect()
    }
}
