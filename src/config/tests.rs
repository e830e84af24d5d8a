//! Tests for config functionality.

use crate::config::{Agent, Config, ConfigStore, Task, agent_from_markdown, agent_to_markdown};
use crate::error::EcceError;
use crate::splice::SpliceMode;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.agents.is_empty());
    assert!(config.tasks.is_empty());
    assert!(config.default_agent.is_none());
    assert_eq!(config.agent_command(), "claude -p");
    assert_eq!(config.invocation_timeout(), Duration::from_secs(600));
    assert_eq!(config.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.marker, "ecce");
    assert_eq!(config.default_file_name, "slides.md");
    assert_eq!(config.splice_mode, SpliceMode::Replace);
    assert!(!config.conversation_history);
    assert!(config.journal);
}

#[test]
fn test_parse_empty_json() {
    assert_eq!(Config::from_json("").unwrap(), Config::default());
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
}

#[test]
fn test_missing_file_is_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load(temp_dir.path().join("config.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_json() {
    let json = r#"{
        "poll_interval_ms": 250,
        "splice_mode": "append",
        "conversation_history": true,
        "agents": {
            "writer": { "system_prompt": "You write slides." }
        }
    }"#;
    let config = Config::from_json(json).unwrap();

    assert_eq!(config.poll_interval_ms, 250);
    assert_eq!(config.splice_mode, SpliceMode::Append);
    assert!(config.conversation_history);
    assert_eq!(config.agents["writer"].name, "writer");
    assert_eq!(config.invocation_timeout_secs, 600);
}

#[test]
fn test_legacy_config_is_accepted_and_preserved() {
    let json = r#"{
        "profiles": [{"name": "p", "url": "https://x", "key": "k", "service": "claude-code"}],
        "active_profile": "p",
        "agents": {
            "reviewer": {
                "name": "reviewer",
                "description": null,
                "system_prompt": "Review.",
                "context_files": ["notes.md"],
                "tools": null,
                "model": null
            }
        },
        "tasks": { "summarize": { "name": "summarize", "template": "Summarize:" } },
        "default_agent": "reviewer",
        "claude_executable": "/opt/claude/bin/claude",
        "mcp_servers": {}
    }"#;
    let config = Config::from_json(json).unwrap();

    assert_eq!(config.agent_command(), "/opt/claude/bin/claude -p");
    assert!(config.agents["reviewer"].tools.is_empty());
    assert_eq!(
        config.agents["reviewer"].context_files,
        vec![PathBuf::from("notes.md")]
    );
    assert!(config.extra.contains_key("profiles"));
    assert!(config.extra.contains_key("mcp_servers"));

    let reparsed = Config::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(reparsed, config);
    assert_eq!(reparsed.extra["active_profile"], "p");
}

#[test]
fn test_agent_command_wins_over_legacy_executable() {
    let json = r#"{"agent_command": "my-agent --model {model}", "claude_executable": "claude"}"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(config.agent_command(), "my-agent --model {model}");
}

#[test]
fn test_tools_are_deduplicated_in_order() {
    let json = r#"{"agents": {"a": {"system_prompt": "x", "tools": ["Read", "Grep", "Read"]}}}"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(config.agents["a"].tools, vec!["Read", "Grep"]);
}

#[test]
fn test_invalid_values_rejected() {
    for json in [
        r#"{"poll_interval_ms": 0}"#,
        r#"{"invocation_timeout_secs": 0}"#,
        r#"{"marker": "two words"}"#,
        r#"{"default_file_name": "dir/slides.md"}"#,
        r#"{"agent_command": "   "}"#,
        r#"{"splice_mode": "overwrite"}"#,
    ] {
        let err = Config::from_json(json).unwrap_err();
        assert!(
            matches!(err, EcceError::ConfigError(_)),
            "expected ConfigError for {}",
            json
        );
    }
}

#[test]
fn test_malformed_json_is_config_error() {
    let err = Config::from_json("{ not json").unwrap_err();
    assert_eq!(err.exit_code(), crate::exit_codes::CONFIG_FAILURE);
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ecce").join("config.json");

    let mut config = Config::default();
    config.add_agent(Agent::new("writer", "You write.")).unwrap();
    config.add_task(Task::new("bullets", "Answer in bullets.")).unwrap();
    config.set_default_agent("writer").unwrap();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
}

#[test]
fn test_remove_default_agent_clears_default() {
    let mut config = Config::default();
    config.add_agent(Agent::new("writer", "You write.")).unwrap();
    config.set_default_agent("writer").unwrap();

    let removed = config.remove_agent("writer").unwrap();

    assert_eq!(removed.name, "writer");
    assert!(config.default_agent.is_none());
    assert!(config.default_agent().is_none());
}

#[test]
fn test_set_default_requires_existing_agent() {
    let mut config = Config::default();
    let err = config.set_default_agent("ghost").unwrap_err();
    assert!(matches!(err, EcceError::ConfigMissing(_)));
}

#[test]
fn test_add_agent_reports_replacement() {
    let mut config = Config::default();
    assert!(!config.add_agent(Agent::new("a", "one")).unwrap());
    assert!(config.add_agent(Agent::new("a", "two")).unwrap());
    assert_eq!(config.agents["a"].system_prompt, "two");
}

#[test]
fn test_invalid_names_rejected() {
    let mut config = Config::default();
    assert!(config.add_agent(Agent::new("", "x")).is_err());
    assert!(config.add_agent(Agent::new("a/b", "x")).is_err());
    assert!(config.add_task(Task::new("t", "  ")).is_err());
}

#[test]
fn test_store_lookup() {
    let mut config = Config::default();
    config.add_agent(Agent::new("b", "x")).unwrap();
    config.add_agent(Agent::new("a", "y")).unwrap();
    config.add_task(Task::new("t", "tmpl")).unwrap();

    assert_eq!(config.get_agent("a").unwrap().system_prompt, "y");
    assert_eq!(config.get_task("t").unwrap().template, "tmpl");

    let names: Vec<_> = config.list_agents().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(config.list_tasks().len(), 1);

    let err = config.get_agent("missing").unwrap_err();
    assert!(matches!(err, EcceError::ConfigMissing(_)));
    assert!(err.to_string().contains("missing"));
    assert!(config.get_task("missing").is_err());
}

#[test]
fn test_frontmatter_import() {
    let content = "---\nname: reviewer\ndescription: Reviews slides\ntools: Read, Grep, Read\nmodel: sonnet\n---\n\nYou are a careful reviewer.\n\nBe brief.\n";
    let agent = agent_from_markdown(content).unwrap();

    assert_eq!(agent.name, "reviewer");
    assert_eq!(agent.description.as_deref(), Some("Reviews slides"));
    assert_eq!(agent.tools, vec!["Read", "Grep"]);
    assert_eq!(agent.model.as_deref(), Some("sonnet"));
    assert_eq!(agent.system_prompt, "You are a careful reviewer.\n\nBe brief.");
    assert!(agent.context_files.is_empty());
}

#[test]
fn test_frontmatter_import_crlf_and_unknown_keys() {
    let content = "---\r\nname: writer\r\ncolor: blue\r\n---\r\nWrite.\r\n";
    let agent = agent_from_markdown(content).unwrap();

    assert_eq!(agent.name, "writer");
    assert_eq!(agent.system_prompt, "Write.");
}

#[test]
fn test_frontmatter_import_errors() {
    assert!(agent_from_markdown("no frontmatter").is_err());
    assert!(agent_from_markdown("---\nname: x\n").is_err());
    assert!(agent_from_markdown("---\ndescription: nameless\n---\nbody\n").is_err());
}

#[test]
fn test_frontmatter_export_then_import() {
    let mut agent = Agent::new("writer", "You write slides.\n");
    agent.description = Some("Slide writer".to_string());
    agent.tools = vec!["Read".to_string(), "Edit".to_string()];

    let markdown = agent_to_markdown(&agent).unwrap();
    assert!(markdown.starts_with("---\nname: writer\n"));
    assert!(markdown.contains("tools: Read, Edit\n"));
    assert!(markdown.ends_with("\n\nYou write slides.\n"));

    let back = agent_from_markdown(&markdown).unwrap();
    assert_eq!(back.tools, agent.tools);
    assert_eq!(back.system_prompt, "You write slides.");
}
