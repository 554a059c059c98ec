use crate::util::{Error, Result};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The PostgreSQL client programs the reconciler drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Psql,
    Createdb,
    Dropdb,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Psql => "psql",
            Tool::Createdb => "createdb",
            Tool::Dropdb => "dropdb",
        }
    }
}

/// One command line to run: a tool plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(tool: Tool, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The SQL statement passed with `-c`, if any.
    pub fn sql(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == "-c")
            .and_then(|index| self.args.get(index + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool.name())?;
        for arg in &self.args {
            if is_shell_safe(arg) {
                write!(f, " {arg}")?;
            } else {
                write!(f, " '{}'", arg.replace('\'', "'\\''"))?;
            }
        }
        Ok(())
    }
}

/// Whether `arg` reads back as a single word when pasted into a POSIX shell unquoted.
fn is_shell_safe(arg: &str) -> bool {
    !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | ',' | '+' | '@' | '%')
        })
}

/// Runs PostgreSQL client commands on behalf of the reconciler.
///
/// Implementations return the captured standard output, or
/// [`Error::CommandFailure`] with whatever diagnostics they captured.
pub trait CommandExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<String>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn execute(&self, invocation: &Invocation) -> Result<String> {
        (**self).execute(invocation)
    }
}

/// Where the client programs live and which account they run as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub psql: PathBuf,
    pub createdb: PathBuf,
    pub dropdb: PathBuf,
    /// Run every command through `sudo -n -u <user>`. `None` runs as the current user.
    pub run_as: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            psql: PathBuf::from("/usr/bin/psql"),
            createdb: PathBuf::from("/usr/bin/createdb"),
            dropdb: PathBuf::from("/usr/bin/dropdb"),
            run_as: Some("postgres".to_string()),
        }
    }
}

impl ExecutorConfig {
    pub fn with_psql(mut self, path: impl Into<PathBuf>) -> Self {
        self.psql = path.into();
        self
    }

    pub fn with_createdb(mut self, path: impl Into<PathBuf>) -> Self {
        self.createdb = path.into();
        self
    }

    pub fn with_dropdb(mut self, path: impl Into<PathBuf>) -> Self {
        self.dropdb = path.into();
        self
    }

    pub fn with_run_as(mut self, user: Option<String>) -> Self {
        self.run_as = user;
        self
    }

    pub fn program(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Psql => &self.psql,
            Tool::Createdb => &self.createdb,
            Tool::Dropdb => &self.dropdb,
        }
    }

    /// Builds the process for `invocation` without spawning it.
    pub fn command(&self, invocation: &Invocation) -> Command {
        let program = self.program(invocation.tool);
        let mut command = match &self.run_as {
            Some(user) => {
                let mut sudo = Command::new("sudo");
                sudo.args(["-n", "-u", user.as_str(), "--"]).arg(program);
                sudo
            }
            None => Command::new(program),
        };
        command.args(&invocation.args);
        command
    }
}

/// Executes invocations as child processes and waits for them to finish.
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    config: ExecutorConfig,
}

impl SystemExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<String> {
        debug!("running {invocation}");
        let output = self
            .config
            .command(invocation)
            .output()
            .map_err(|e| {
                Error::command_failure(
                    invocation.to_string(),
                    format!(
                        "failed to start {}: {e}",
                        self.config.program(invocation.tool).display()
                    ),
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let mut combined = stdout;
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(Error::command_failure(
            invocation.to_string(),
            format!("{}: {}", output.status, combined.trim_end()),
        ))
    }
}
