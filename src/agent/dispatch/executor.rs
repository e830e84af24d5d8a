//! Agent subprocess executor.
//!
//! Runs the configured agent command once per prompt, with a timeout, and
//! returns its stdout.

use super::{Generator, InvocationRequest};
use crate::agent::InvocationError;
use crate::agent::error::excerpt;
use crate::agent::prompt::{TemplateError, referenced_variables, render_template, vars};
use crate::error::{EcceError, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Variables available in the agent command line.
const COMMAND_VARIABLES: [&str; 4] = ["prompt", "prompt_file", "agent", "model"];

/// How often a running child is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// [`Generator`] that runs an external command.
///
/// The command line is split with shell rules first and each argument is
/// rendered afterwards, so a substituted prompt is always exactly one
/// argument no matter what it contains.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    prompt_on_stdin: bool,
    uses_prompt_file: bool,
}

impl CommandGenerator {
    /// Parse and check an agent command line such as `claude -p`.
    pub fn new(command: &str, timeout: Duration) -> Result<Self> {
        let args = shell_words::split(command).map_err(|e| {
            EcceError::ConfigError(format!(
                "failed to parse agent command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                command, e
            ))
        })?;

        if args.is_empty() {
            return Err(EcceError::ConfigError(format!(
                "agent command is empty after parsing: '{}'",
                command
            )));
        }

        let mut referenced = Vec::new();
        for arg in &args {
            let names = referenced_variables(arg).map_err(|e| template_error(command, e))?;
            for name in names {
                if !COMMAND_VARIABLES.contains(&name.as_str()) {
                    return Err(template_error(
                        command,
                        TemplateError::UndefinedVariable { name, position: 0 },
                    ));
                }
                referenced.push(name);
            }
        }

        let program_is_placeholder = referenced_variables(&args[0])
            .map(|names| !names.is_empty())
            .unwrap_or(false);
        if program_is_placeholder {
            return Err(EcceError::ConfigError(format!(
                "agent command '{}' must start with a program name, not a placeholder",
                command
            )));
        }

        let uses_prompt = referenced.iter().any(|n| n == "prompt");
        let uses_prompt_file = referenced.iter().any(|n| n == "prompt_file");

        Ok(Self {
            command: command.to_string(),
            args,
            timeout,
            prompt_on_stdin: !uses_prompt && !uses_prompt_file,
            uses_prompt_file,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True when the prompt is written to the child's stdin.
    pub fn prompt_on_stdin(&self) -> bool {
        self.prompt_on_stdin
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, request: &InvocationRequest) -> std::result::Result<String, InvocationError> {
        let prompt_file = if self.uses_prompt_file {
            let mut file = tempfile::Builder::new()
                .prefix("ecce-prompt-")
                .suffix(".md")
                .tempfile()
                .map_err(InvocationError::io("create prompt file"))?;
            file.write_all(request.composed_prompt.as_bytes())
                .map_err(InvocationError::io("write prompt file"))?;
            Some(file)
        } else {
            None
        };

        let prompt_file_path = prompt_file
            .as_ref()
            .map(|f| f.path().display().to_string())
            .unwrap_or_default();
        let values = vars([
            ("prompt", request.composed_prompt.as_str()),
            ("prompt_file", prompt_file_path.as_str()),
            ("agent", request.agent.as_str()),
            ("model", request.model.as_deref().unwrap_or_default()),
        ]);

        let mut argv = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            let rendered = render_template(arg, &values).map_err(|e| InvocationError::Io {
                op: "render agent command",
                source: io::Error::new(io::ErrorKind::InvalidInput, e),
            })?;
            argv.push(rendered);
        }

        let mut stdout = tempfile::tempfile().map_err(InvocationError::io("capture stdout"))?;
        let mut stderr = tempfile::tempfile().map_err(InvocationError::io("capture stderr"))?;

        let program = &argv[0];
        let mut command = Command::new(program);
        command
            .args(&argv[1..])
            .stdin(if self.prompt_on_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::from(
                stdout.try_clone().map_err(InvocationError::io("capture stdout"))?,
            ))
            .stderr(Stdio::from(
                stderr.try_clone().map_err(InvocationError::io("capture stderr"))?,
            ));

        let start_time = Instant::now();
        let mut child = command.spawn().map_err(|source| InvocationError::Spawn {
            program: program.clone(),
            source,
        })?;

        // A child that never reads stdin must not block us, so feed it from a thread.
        let writer = if self.prompt_on_stdin {
            child.stdin.take().map(|mut stdin| {
                let prompt = request.composed_prompt.clone();
                thread::spawn(move || {
                    let _ = stdin.write_all(prompt.as_bytes());
                })
            })
        } else {
            None
        };

        let status = wait_with_timeout(&mut child, self.timeout)
            .map_err(InvocationError::io("wait for agent"))?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }
        drop(prompt_file);

        debug!(
            program = %program,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "agent process finished"
        );

        let stderr_text = read_captured(&mut stderr).map_err(InvocationError::io("read stderr"))?;
        let stderr_excerpt = excerpt(&String::from_utf8_lossy(&stderr_text));

        let status = match status {
            Some(status) => status,
            None => {
                return Err(InvocationError::TimedOut {
                    timeout: self.timeout,
                    stderr_excerpt,
                });
            }
        };

        if !status.success() {
            return Err(InvocationError::NonZeroExit {
                exit_code: status.code(),
                stderr_excerpt,
            });
        }

        let stdout_bytes = read_captured(&mut stdout).map_err(InvocationError::io("read stdout"))?;
        String::from_utf8(stdout_bytes).map_err(|e| InvocationError::MalformedOutput {
            reason: format!("output is not valid UTF-8: {}", e),
        })
    }
}

/// Wait for a child process with timeout.
///
/// Returns `None` when the timeout expired and the child was killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();

    loop {
        match child.try_wait()? {
            Some(status) => return Ok(Some(status)),
            None => {
                if start.elapsed() >= timeout {
                    kill_process(child);
                    return Ok(None);
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

/// Kill a process and reap it.
fn kill_process(child: &mut Child) {
    // On Unix this is SIGKILL; on Windows it is TerminateProcess.
    let _ = child.kill();
    let _ = child.wait();
}

fn read_captured(file: &mut File) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn template_error(command: &str, err: TemplateError) -> EcceError {
    let detail = match err {
        TemplateError::UndefinedVariable { name, .. } => format!(
            "references unknown variable '{}'\nAvailable variables: {}",
            name,
            COMMAND_VARIABLES.join(", ")
        ),
        other => other.to_string(),
    };
    EcceError::ConfigError(format!("agent command '{}' {}", command, detail))
}
