use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeystoneError {
    #[error("Validation error: {field} '{value}' violates rule: {rule}")]
    Validation {
        field: &'static str,
        value: String,
        rule: &'static str,
    },
    #[error("Not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeystoneError {
    pub fn validation(field: &'static str, value: impl Into<String>, rule: &'static str) -> Self {
        Self::Validation { field, value: value.into(), rule }
    }
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, KeystoneError>;

// Helper conversions
impl From<rusqlite::Error> for KeystoneError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<config::ConfigError> for KeystoneError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for KeystoneError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(e.to_string())
    }
}
