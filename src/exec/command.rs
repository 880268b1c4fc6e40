// src/exec/command.rs

//! Task bodies backed by shell commands, for graphs loaded from a flow file.
//!
//! A static command succeeds when it exits with status 0. A condition
//! command must also print its branch index as the last non-empty line on
//! stdout. Stderr is consumed and logged at debug level so pipes never fill.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::dag::Body;
use crate::types::TaskKind;

/// Build a body of the given kind that runs `cmd` through the platform shell.
pub fn command_body(name: &str, kind: TaskKind, cmd: &str) -> Body {
    let name = name.to_string();
    let cmd = cmd.to_string();

    match kind {
        TaskKind::Static => Body::from_static(move || run_command(&name, &cmd).map(|_| ())),
        TaskKind::Condition => Body::from_condition(move || {
            let last_line = run_command(&name, &cmd)?;
            parse_branch(&name, last_line.as_deref())
        }),
    }
}

/// Parse the branch index printed by a condition command.
pub fn parse_branch(name: &str, last_line: Option<&str>) -> Result<i64> {
    let line = last_line.with_context(|| {
        format!("condition task '{name}' printed nothing; expected a branch index on stdout")
    })?;
    line.trim().parse::<i64>().with_context(|| {
        format!("condition task '{name}' printed '{line}', expected an integer branch index")
    })
}

/// Run the command to completion from a blocking worker thread.
///
/// Returns the last non-empty stdout line.
fn run_command(name: &str, cmd: &str) -> Result<Option<String>> {
    let handle = Handle::try_current()
        .context("command bodies must be invoked from within a Tokio runtime")?;
    handle.block_on(run_command_async(name, cmd))
}

async fn run_command_async(name: &str, cmd: &str) -> Result<Option<String>> {
    info!(task = %name, cmd = %cmd, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{name}'"))?;

    // Always consume stderr so buffers don't fill; log at debug.
    let stderr_reader = child.stderr.take().map(|stderr| {
        let task_name = name.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stderr: {}", line);
            }
        })
    });

    let mut last_line = None;
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .with_context(|| format!("reading stdout of task '{name}'"))?
        {
            debug!(task = %name, "stdout: {}", line);
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{name}'"))?;

    if let Some(reader) = stderr_reader {
        let _ = reader.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        task = %name,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    if !status.success() {
        bail!("command `{cmd}` exited with code {code}");
    }

    Ok(last_line)
}
