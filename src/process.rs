//! External command invocation.
//!
//! Every stage of the pipeline ultimately shells out to a host tool (git,
//! make, fpm, ...). [`Cmd`] describes one invocation; [`ToolRunner`] is the
//! single "run this command" capability the stages depend on, so stage logic
//! can be exercised in tests without spawning processes.
//!
//! # Example
//!
//! ```rust,ignore
//! use pkgpipe::process::{Cmd, HostRunner, ToolRunner};
//!
//! let output = HostRunner.run(
//!     &Cmd::new("git")
//!         .args(["rev-parse", "--short", "HEAD"])
//!         .error_msg("git rev-parse failed. Is this a git checkout?"),
//! )?;
//! println!("{}", output.stdout);
//! ```

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Check if a command exists on the host system.
///
/// Uses `which` to locate the command in PATH.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Description of one external command invocation.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    envs: BTreeMap<String, String>,
    error_msg: Option<String>,
}

impl Cmd {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            current_dir: None,
            envs: BTreeMap::new(),
            error_msg: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument, converted lossily.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.insert(key.to_string(), value.to_string());
        self
    }

    /// Message used instead of the generic failure text when the command
    /// exits non-zero.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Shell-style rendering of the invocation, for diagnostics.
    pub fn rendered(&self) -> String {
        let mut parts: Vec<String> = self
            .envs
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Run on the host. Shorthand for `HostRunner.run(self)`.
    pub fn run(&self) -> Result<CmdOutput> {
        HostRunner.run(self)
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The one capability stages need from the outside world: run an external
/// command and report its output, failing on non-zero exit.
pub trait ToolRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput>;
}

/// [`ToolRunner`] that spawns real processes on the host.
pub struct HostRunner;

impl ToolRunner for HostRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput> {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &cmd.envs {
            command.env(key, value);
        }

        let output = command
            .output()
            .with_context(|| format!("spawning '{}'", cmd.rendered()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            match &cmd.error_msg {
                Some(msg) => bail!("{}\n{}", msg, stderr.trim_end()),
                None => bail!(
                    "command '{}' failed with {}\n{}",
                    cmd.rendered(),
                    output.status,
                    stderr.trim_end()
                ),
            }
        }

        Ok(CmdOutput { stdout, stderr })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;

    /// Scripted [`ToolRunner`] for stage tests.
    ///
    /// Rules are matched as substrings of the rendered invocation, first
    /// match wins; unmatched invocations succeed with empty output. Every
    /// invocation is recorded.
    pub(crate) struct ScriptedRunner {
        calls: RefCell<Vec<String>>,
        rules: Vec<(String, Result<String, String>)>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                rules: Vec::new(),
            }
        }

        /// Script an outcome: `Ok(stdout)` or `Err(message)`.
        pub fn on(mut self, needle: &str, outcome: Result<&str, &str>) -> Self {
            self.rules.push((
                needle.to_string(),
                outcome.map(str::to_string).map_err(str::to_string),
            ));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn invoked(&self, needle: &str) -> bool {
            self.calls.borrow().iter().any(|call| call.contains(needle))
        }
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&self, cmd: &Cmd) -> anyhow::Result<CmdOutput> {
            let rendered = cmd.rendered();
            self.calls.borrow_mut().push(rendered.clone());
            for (needle, outcome) in &self.rules {
                if rendered.contains(needle.as_str()) {
                    return match outcome {
                        Ok(stdout) => Ok(CmdOutput {
                            stdout: stdout.clone(),
                            stderr: String::new(),
                        }),
                        Err(msg) => Err(anyhow::anyhow!("{}", msg)),
                    };
                }
            }
            Ok(CmdOutput {
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        assert!(command_exists("ls"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_host_runner_captures_stdout() {
        let output = HostRunner
            .run(&Cmd::new("echo").arg("hello"))
            .expect("echo must succeed");
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_host_runner_nonzero_exit_uses_error_msg() {
        let err = HostRunner
            .run(&Cmd::new("false").error_msg("custom failure text"))
            .expect_err("false must fail");
        assert!(err.to_string().contains("custom failure text"));
    }

    #[test]
    fn test_host_runner_nonzero_exit_generic_message() {
        let err = HostRunner
            .run(&Cmd::new("false"))
            .expect_err("false must fail");
        assert!(err.to_string().contains("command 'false' failed"));
    }

    #[test]
    fn test_rendered_includes_envs_and_args() {
        let cmd = Cmd::new("make").arg("install").env("DESTDIR", "/tmp/staging");
        assert_eq!(cmd.rendered(), "DESTDIR=/tmp/staging make install");
    }

    #[test]
    fn test_scripted_runner_records_calls() {
        use super::test_support::ScriptedRunner;

        let runner = ScriptedRunner::new().on("rev-parse", Ok("a1b2c3d"));
        let output = runner
            .run(&Cmd::new("git").args(["rev-parse", "--short", "HEAD"]))
            .expect("scripted call must succeed");
        assert_eq!(output.stdout, "a1b2c3d");
        assert!(runner.invoked("git rev-parse"));
    }
}
