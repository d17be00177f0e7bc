use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// The operation referenced an order key with nothing behind it.
    NotFound(String),
    /// The database is unconfigured, unreachable, or rejected a write.
    Persistence(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "order not found: {key}"),
            Self::Persistence(msg) => write!(f, "persistence error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
