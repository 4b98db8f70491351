//! External command execution.
//!
//! Build, image-build, and orchestration commands all run through a single
//! shell invocation so user-supplied pipelines and operators behave as
//! typed. Failure is never an error here: spawn failures and nonzero exits
//! come back as an unsuccessful [`CommandResult`] the caller can display.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

/// Outcome of one external command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Captured output, stdout and stderr interleaved in emission order,
    /// split on newlines.
    pub lines: Vec<String>,
    /// Short human-readable outcome: exit status or spawn failure.
    pub outcome: String,
}

/// Run `command_line` through `sh -c` in `working_dir`, capturing combined
/// output.
///
/// The command is wrapped in a subshell with stderr redirected into stdout
/// (`( ... ) 2>&1`) so the two streams interleave in the order the process
/// emitted them. No timeout is enforced; the call blocks the current task
/// until the process exits.
pub async fn run(working_dir: &Path, command_line: &str) -> CommandResult {
    let wrapped = format!("( {} ) 2>&1", command_line);
    let spawned = Command::new("sh")
        .arg("-c")
        .arg(&wrapped)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match spawned {
        Ok(output) => output,
        Err(err) => {
            return CommandResult {
                success: false,
                lines: Vec::new(),
                outcome: format!("failed to start command: {}", err),
            };
        }
    };

    let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect();
    // The redirect keeps stderr on the stdout pipe; anything left on the
    // outer shell's stderr (e.g. a syntax error report) is appended.
    lines.extend(
        String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string),
    );

    let outcome = match output.status.code() {
        Some(0) => "exit status 0".to_string(),
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };

    CommandResult {
        success: output.status.success(),
        lines,
        outcome,
    }
}
