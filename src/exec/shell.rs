// src/exec/shell.rs

//! Running shell commands from task bodies.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{error, info};

/// Run `cmd` in a subshell (`sh -c`, or `cmd /C` on Windows).
///
/// `env` is added to the inherited environment. Output (stdout, then stderr)
/// is logged when the command fails, or always if `log` is set.
///
/// Returns whether the command exited successfully. Failing to start the
/// shell at all is an error.
pub fn run(
    taskname: &str,
    cmd: &str,
    cwd: Option<&Path>,
    env: Option<&BTreeMap<String, String>>,
    log: bool,
) -> Result<bool> {
    info!(task = %taskname, "Running: {}", cmd);

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    if let Some(cwd) = cwd {
        info!(task = %taskname, "    in {}", cwd.display());
        command.current_dir(cwd);
    }
    if let Some(env) = env.filter(|env| !env.is_empty()) {
        info!(task = %taskname, "    with environment variables:");
        for (key, val) in env {
            info!(task = %taskname, "        {}={}", key, val);
        }
        command.envs(env);
    }

    let output = command
        .output()
        .with_context(|| format!("{taskname}: spawning shell for '{cmd}'"))?;

    let success = output.status.success();
    if !success {
        match output.status.code() {
            Some(code) => error!(task = %taskname, "    Failed with status: {}", code),
            None => error!(task = %taskname, "    Terminated by signal"),
        }
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let text = text.trim_end();

    if !text.is_empty() && (log || !success) {
        if success {
            info!(task = %taskname, "    Output:");
            for line in text.lines() {
                info!(task = %taskname, "        {}", line);
            }
        } else {
            error!(task = %taskname, "    Output:");
            for line in text.lines() {
                error!(task = %taskname, "        {}", line);
            }
        }
    }

    Ok(success)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn reports_exit_status() {
        assert!(run("t", "true", None, None, false).expect("spawns"));
        assert!(!run("t", "exit 3", None, None, false).expect("spawns"));
    }

    #[test]
    fn honours_cwd_and_env() {
        let dir = tempfile::tempdir().expect("tempdir");
        let env = BTreeMap::from([("STEPWISE_TEST_VALUE".to_string(), "42".to_string())]);

        let ok = run(
            "t",
            "printf %s \"$STEPWISE_TEST_VALUE\" > out.txt",
            Some(dir.path()),
            Some(&env),
            true,
        )
        .expect("spawns");

        assert!(ok);
        let written = std::fs::read_to_string(dir.path().join("out.txt")).expect("read");
        assert_eq!(written, "42");
    }
}
