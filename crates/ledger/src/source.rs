use crate::error::LedgerError;

/// Raw tabular data as fetched from the shared ledger: header candidate rows
/// first, then data rows, all as text cells.
pub type RawTable = Vec<Vec<String>>;

/// A tabular data source for the order ledger. The transport (spreadsheet
/// fetch, file read) lives outside this crate; implementors return rows or a
/// descriptive error.
pub trait LedgerSource {
    fn fetch(&mut self) -> Result<RawTable, LedgerError>;
}
