//! Ledger source backed by a local snapshot file.

use std::path::PathBuf;

use ordermatch_ledger::source::{LedgerSource, RawTable};
use ordermatch_ledger::LedgerError;

/// Reads the ledger from a spreadsheet file on disk (xlsx, xls, or csv). Each
/// fetch re-reads the file; freshness is the cache's concern.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LedgerSource for FileSource {
    fn fetch(&mut self) -> Result<RawTable, LedgerError> {
        let data = std::fs::read(&self.path)
            .map_err(|e| LedgerError::Source(format!("cannot read {}: {e}", self.path.display())))?;
        let filename = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("ledger.csv");
        ordermatch_evidence::read_table(&data, filename)
            .map_err(|e| LedgerError::Source(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetches_csv_table_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "INVOICE,MODEL,CAPACITY,GRADE,QTY\nINV100,IPHONE 12,64GB,A,3\n")
            .unwrap();

        let mut source = FileSource::new(path);
        let table = source.fetch().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1][0], "INV100");
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let mut source = FileSource::new(PathBuf::from("/nonexistent/ledger.csv"));
        assert!(matches!(source.fetch(), Err(LedgerError::Source(_))));
    }

    #[test]
    fn unsupported_extension_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.pdf");
        std::fs::write(&path, "%PDF").unwrap();

        let mut source = FileSource::new(path);
        assert!(matches!(source.fetch(), Err(LedgerError::Source(_))));
    }
}
