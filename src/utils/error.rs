use std::error::Error;
use std::fmt;
use std::io;

/// Common result type for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Error types for migration operations
#[derive(Debug)]
pub enum MigrateError {
    /// IO error wrapper
    Io(io::Error),
    /// The input document is not well-formed YAML
    Parse(String),
    /// The legacy subsection does not have the shape the rules expect
    Precondition(String),
    /// A migrated subsection could not be rendered back to YAML
    Serialize(String),
    /// File handling error
    File(String),
}

impl MigrateError {
    /// Shorthand for a precondition violation
    pub fn precondition(msg: impl Into<String>) -> Self {
        MigrateError::Precondition(msg.into())
    }
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrateError::Io(err) => write!(f, "IO error: {}", err),
            MigrateError::Parse(msg) => write!(f, "Parse error: {}", msg),
            MigrateError::Precondition(msg) => write!(f, "Precondition violation: {}", msg),
            MigrateError::Serialize(msg) => write!(f, "Serialization error: {}", msg),
            MigrateError::File(msg) => write!(f, "File error: {}", msg),
        }
    }
}

impl Error for MigrateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MigrateError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MigrateError {
    fn from(err: io::Error) -> Self {
        MigrateError::Io(err)
    }
}

impl From<serde_yaml::Error> for MigrateError {
    fn from(err: serde_yaml::Error) -> Self {
        MigrateError::Serialize(err.to_string())
    }
}
