//! Implementation of the `ecce task` commands.

use crate::agent::PromptStrategy;
use crate::cli::TaskAddArgs;
use crate::config::{Config, ConfigStore, Task};
use crate::error::{EcceError, Result};
use std::path::Path;

pub fn cmd_task_list(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let tasks = config.list_tasks();

    if tasks.is_empty() {
        println!("No tasks configured.");
        println!();
        println!("Add one with: ecce task add <name> --template \"... {{prompt}} ...\"");
        return Ok(());
    }

    println!("Configured tasks ({}):", tasks.len());
    println!();
    for task in tasks {
        println!("  {}", task.name);
        if let Some(description) = &task.description {
            println!("    Description: {}", description);
        }
        println!("    Template:    {}", task.template.replace('\n', "\\n"));
        if let Some(mode) = task.mode {
            println!("    Mode:        {}", mode);
        }
        println!();
    }
    Ok(())
}

pub fn cmd_task_add(config_path: &Path, args: TaskAddArgs) -> Result<()> {
    let mut task = Task::new(args.name, args.template);
    task.description = args.description;
    task.mode = args.mode;

    // A template that uses `{prompt}` must render with the variables the
    // watch command provides.
    PromptStrategy::for_task(Some(&task))
        .validate()
        .map_err(|e| EcceError::UserError(format!("task '{}' template: {}", task.name, e)))?;

    let mut config = Config::load(config_path)?;
    let name = task.name.clone();
    let replaced = config.add_task(task)?;
    config.save(config_path)?;

    if replaced {
        println!("Updated task '{}'.", name);
    } else {
        println!("Added task '{}'.", name);
    }
    Ok(())
}

pub fn cmd_task_remove(config_path: &Path, name: &str) -> Result<()> {
    let mut config = Config::load(config_path)?;
    config.remove_task(name)?;
    config.save(config_path)?;
    println!("Removed task '{}'.", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splice::SpliceMode;
    use tempfile::TempDir;

    fn add_args(name: &str, template: &str) -> TaskAddArgs {
        TaskAddArgs {
            name: name.to_string(),
            template: template.to_string(),
            description: None,
            mode: Some(SpliceMode::Append),
        }
    }

    #[test]
    fn test_add_list_remove() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        cmd_task_add(&config_path, add_args("bullets", "Bullet points: {prompt}")).unwrap();
        let config = Config::load(&config_path).unwrap();
        let task = config.get_task("bullets").unwrap();
        assert_eq!(task.mode, Some(SpliceMode::Append));

        cmd_task_list(&config_path).unwrap();
        cmd_task_remove(&config_path, "bullets").unwrap();
        assert!(Config::load(&config_path).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_add_rejects_unknown_template_variable() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let err = cmd_task_add(&config_path, add_args("bad", "{prompt} in {language}")).unwrap_err();
        assert!(matches!(err, EcceError::UserError(_)));
        assert!(!config_path.exists());
    }

    #[test]
    fn test_add_rejects_empty_template() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        assert!(cmd_task_add(&config_path, add_args("empty", "  ")).is_err());
    }

    #[test]
    fn test_remove_missing_task() {
        let temp_dir = TempDir::new().unwrap();
        let err = cmd_task_remove(&temp_dir.path().join("config.json"), "ghost").unwrap_err();
        assert!(matches!(err, EcceError::ConfigMissing(_)));
    }
}
