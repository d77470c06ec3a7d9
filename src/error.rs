use std::fmt;
use std::io;

#[derive(Debug)]
pub enum DBError {
    Io(io::Error),
    Corruption(String),
    InvalidArgument(String),
    Compression(String),
    Config(config::ConfigError),
    /// storage is already locked by another holder
    Locked,
    NotFound(String),
}

impl fmt::Display for DBError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DBError::Io(e) => write!(f, "IO error: {e}"),
            DBError::Corruption(msg) => write!(f, "Corruption: {msg}"),
            DBError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            DBError::Compression(msg) => write!(f, "Compression error: {msg}"),
            DBError::Config(e) => write!(f, "Config error: {e}"),
            DBError::Locked => write!(f, "storage already locked"),
            DBError::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for DBError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DBError::Io(e) => Some(e),
            DBError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DBError {
    fn from(e: io::Error) -> Self {
        DBError::Io(e)
    }
}

impl From<config::ConfigError> for DBError {
    fn from(e: config::ConfigError) -> Self {
        DBError::Config(e)
    }
}
