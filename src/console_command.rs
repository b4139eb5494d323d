use crate::error::RunError;
use crate::run_request::RunOutcome;
use crate::settings::RunnerSettings;

use async_channel::Sender;
use log::{debug, error, info};
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::thread;

const PROGRESS_MARKER: &str = "Progress";

/// Messages from the worker, in the order they were produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// Percentage reported by the script itself (`Progress 42%`).
    Progress(i32),
    /// Lines read so far against the assumed total, as a percentage.
    LineProgress(u32),
    Line(String),
    Finished(RunOutcome),
}

/// Extracts the percentage from a `Progress <n>%` line.
pub fn parse_progress(line: &str) -> Option<i32> {
    let after_marker = line.split(PROGRESS_MARKER).nth(1)?;
    let value = after_marker.trim().split('%').next()?;
    value.trim().parse::<i32>().ok()
}

pub fn line_progress(current_line: u32, total_lines: u32) -> u32 {
    if total_lines == 0 {
        return 0;
    }
    ((current_line as u64 * 100) / total_lines as u64) as u32
}

fn shell_command(command: &str, settings: &RunnerSettings) -> Command {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };
    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };
    if let Some(dir) = &settings.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// stdout followed by stderr
    pub combined: String,
}

/// Runs the command to completion on the calling thread.
pub fn run_blocking(command: &str, settings: &RunnerSettings) -> Result<CommandOutput, RunError> {
    info!("Executing: {}", command);
    let output = shell_command(command, settings)
        .output()
        .map_err(|source| RunError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    let result = CommandOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        combined,
    };
    if result.success {
        debug!("{}", result.combined.trim_end());
    } else {
        error!(
            "Command failed (exit code {:?}): {}",
            result.exit_code,
            result.combined.trim_end()
        );
    }
    Ok(result)
}

/// Worker body for the streaming policy. Always ends by sending
/// `RunnerEvent::Finished`, also when the process could not be launched.
pub fn run_streaming(
    command: &str,
    settings: &RunnerSettings,
    sender: &Sender<RunnerEvent>,
) -> RunOutcome {
    let success = match stream_output(command, settings, sender) {
        Ok(success) => success,
        Err(e) => {
            error!("{}", e);
            false
        }
    };
    let outcome = RunOutcome::new(success, settings);
    let _ = sender.send_blocking(RunnerEvent::Finished(outcome.clone()));
    outcome
}

fn stream_output(
    command: &str,
    settings: &RunnerSettings,
    sender: &Sender<RunnerEvent>,
) -> Result<bool, RunError> {
    info!("Executing: {}", command);
    let mut child = shell_command(command, settings)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RunError::Spawn {
            command: command.to_string(),
            source,
        })?;

    // Keep stderr flowing so the child never stalls on a full pipe
    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::StdoutUnavailable);
        }
    };

    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    let mut current_line: u32 = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        info!("{}", line);

        if line.contains(PROGRESS_MARKER) {
            if let Some(progress) = parse_progress(line) {
                let _ = sender.send_blocking(RunnerEvent::Progress(progress));
            }
        }
        current_line = current_line.saturating_add(1);
        let _ = sender.send_blocking(RunnerEvent::LineProgress(line_progress(
            current_line,
            settings.assumed_total_lines,
        )));
        let _ = sender.send_blocking(RunnerEvent::Line(line.to_string()));
    }
    drop(reader);

    let status = child.wait()?;
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if status.success() {
        debug!("Command finished after {} lines", current_line);
    } else {
        error!(
            "Command failed (exit code {:?}): {}",
            status.code(),
            stderr.trim_end()
        );
    }
    Ok(status.success())
}
