use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Header/column problem in the raw table. The source file must be fixed;
    /// retrying without changing it cannot succeed.
    Format(String),
    /// The ledger source collaborator failed to produce a table.
    Source(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(msg) => write!(f, "ledger format error: {msg}"),
            Self::Source(msg) => write!(f, "ledger source error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}
