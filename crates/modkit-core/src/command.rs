use crate::CoreError;
use modkit_fs::is_executable;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use tracing::{debug, info};

/// An external program invocation. The environment is inherited and
/// extended with `env`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub stdin: Option<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Space-joined program and arguments, for reporting.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub cmd: String,
    pub stdout: String,
    pub stderr: String,
    pub rc: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.rc == 0
    }
}

/// Exit code, or the negated signal number when the child was killed.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(1)
}

/// Run `spec` to completion, capturing both output streams.
///
/// A non-zero exit is not an error; inspect `rc`. Only a failure to start or
/// wait for the child is reported as [`CoreError::Command`]. Input is fed by a
/// separate writer thread so a child that exits without reading cannot block
/// the caller.
pub fn run_command(spec: &CommandSpec) -> Result<CommandOutput, CoreError> {
    let cmd = spec.display();
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(&spec.env)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    debug!("running {cmd}");
    let mut child = command.spawn().map_err(|source| CoreError::Command {
        cmd: cmd.clone(),
        source,
    })?;

    let writer = match (child.stdin.take(), spec.stdin.clone()) {
        (Some(mut pipe), Some(data)) => Some(thread::spawn(move || {
            // Broken pipe just means the child stopped reading.
            if let Err(e) = pipe.write_all(data.as_bytes()) {
                debug!("stdin writer stopped early: {e}");
            }
        })),
        _ => None,
    };

    let output = child.wait_with_output().map_err(|source| CoreError::Command {
        cmd: cmd.clone(),
        source,
    })?;
    if let Some(handle) = writer {
        if handle.join().is_err() {
            debug!("stdin writer thread panicked");
        }
    }

    let rc = exit_code(output.status);
    info!("{cmd} exited with {rc}");
    Ok(CommandOutput {
        cmd,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        rc,
    })
}

fn executable_file(path: &Path) -> bool {
    path.is_file() && is_executable(path)
}

/// Locate `name` on `PATH`. A name containing `/` is checked as given.
///
/// Returns `Ok(None)` when the binary is absent and not `required`.
pub fn get_bin_path(name: &str, required: bool) -> Result<Option<PathBuf>, CoreError> {
    let found = if name.contains('/') {
        let path = PathBuf::from(name);
        executable_file(&path).then_some(path)
    } else {
        std::env::var_os("PATH").and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(name))
                .find(|candidate| executable_file(candidate))
        })
    };
    match found {
        Some(path) => Ok(Some(path)),
        None if required => Err(CoreError::BinaryNotFound(name.to_owned())),
        None => Ok(None),
    }
}
