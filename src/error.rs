use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `HepceError` and maps to other errors to
/// convert to a `HepceError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum HepceError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A numeric function was called outside of its mathematical domain.
    DomainError(String),
    ConfigError(String),
    /// A table or column could not be read, or a cell could not be parsed.
    DataError(String),
    HepceError(String),
}

impl From<io::Error> for HepceError {
    fn from(error: io::Error) -> Self {
        HepceError::IoError(error)
    }
}

impl From<serde_json::Error> for HepceError {
    fn from(error: serde_json::Error) -> Self {
        HepceError::JsonError(error)
    }
}

impl From<csv::Error> for HepceError {
    fn from(error: csv::Error) -> Self {
        HepceError::CsvError(error)
    }
}

impl From<String> for HepceError {
    fn from(error: String) -> Self {
        HepceError::HepceError(error)
    }
}

impl From<&str> for HepceError {
    fn from(error: &str) -> Self {
        HepceError::HepceError(error.to_string())
    }
}

impl std::error::Error for HepceError {}

impl Display for HepceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}
