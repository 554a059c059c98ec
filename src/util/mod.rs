use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid value: {message}")]
    Validation { message: String },

    #[error(
        "Changing {attribute} of an already existing database is currently not supported. \
         Please perform the necessary steps manually (database {database:?})"
    )]
    UnsupportedMutation {
        database: String,
        attribute: &'static str,
    },

    #[error("Command failed: {command}\n{output}")]
    CommandFailure { command: String, output: String },

    #[error("Manifest error: {message}")]
    Manifest { message: String },

    #[error("Dependency cycle detected at {resource}")]
    Cycle { resource: String },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }

    pub fn command_failure(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::CommandFailure {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Whether the error was raised while building desired state, before any command ran.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Manifest { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
