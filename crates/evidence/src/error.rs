use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Filename extension names no known evidence format.
    UnsupportedFormat(String),
    /// Bytes could not be parsed as the declared format; carries the cause.
    Parse(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(ext) => write!(f, "unsupported file type: {ext}"),
            Self::Parse(msg) => write!(f, "cannot parse evidence file: {msg}"),
        }
    }
}

impl std::error::Error for ExtractError {}
