use std::path::Path;

use chrono::{DateTime, Utc};
use ordermatch_ledger::CanonicalOrderRow;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::record::{
    ArchivedOrder, FileAttachment, OrderStatistics, ReconciliationRecord, RecordPatch,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reconciliation (
    order_key TEXT PRIMARY KEY,
    reconciled INTEGER NOT NULL DEFAULT 0,
    reconciled_at TEXT,
    asn_filename TEXT,
    asn_bytes BLOB,
    asn_uploaded_at TEXT,
    identifier_filename TEXT,
    identifier_bytes BLOB,
    identifier_uploaded_at TEXT,
    identifier_count INTEGER,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS archived_orders (
    order_key TEXT PRIMARY KEY,
    order_data TEXT,
    total_quantity INTEGER,
    distinct_model_count INTEGER,
    asn_filename TEXT,
    asn_bytes BLOB,
    identifier_filename TEXT,
    identifier_bytes BLOB,
    notes TEXT,
    archived_at TEXT NOT NULL
);
"#;

const RECORD_COLUMNS: &str = "order_key, reconciled, reconciled_at, \
    asn_filename, asn_bytes, asn_uploaded_at, \
    identifier_filename, identifier_bytes, identifier_uploaded_at, identifier_count, \
    notes, created_at, updated_at";

const ARCHIVE_COLUMNS: &str = "order_key, order_data, total_quantity, distinct_model_count, \
    asn_filename, asn_bytes, identifier_filename, identifier_bytes, notes, archived_at";

/// Keyed store for reconciliation records and archived orders.
///
/// May run unconfigured (no database): reads then report emptiness and
/// patch-style writes no-op, so the rest of the system stays usable.
/// Operations whose entire purpose is a write (`archive`, the deletes) surface
/// `StoreError::Persistence` instead.
pub struct ReconStore {
    conn: Option<Connection>,
}

impl ReconStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Some(conn) })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Some(conn) })
    }

    /// A store with no backing database.
    pub fn unconfigured() -> Self {
        Self { conn: None }
    }

    pub fn is_configured(&self) -> bool {
        self.conn.is_some()
    }

    // -----------------------------------------------------------------------
    // Live records
    // -----------------------------------------------------------------------

    /// Create the record if absent, else apply the patch; `updated_at` is
    /// touched either way. Returns the stored record, or `None` when no
    /// database is configured.
    pub fn upsert(
        &mut self,
        order_key: &str,
        patch: RecordPatch,
    ) -> Result<Option<ReconciliationRecord>, StoreError> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(None);
        };
        let now = Utc::now();

        let mut record = match Self::fetch(conn, order_key)? {
            Some(existing) => existing,
            None => ReconciliationRecord {
                order_key: order_key.to_string(),
                reconciled: false,
                reconciled_at: None,
                asn: None,
                identifier_file: None,
                identifier_count: None,
                notes: None,
                created_at: now,
                updated_at: now,
            },
        };

        if let Some(asn) = patch.asn {
            record.asn = Some(asn);
        }
        if let Some(file) = patch.identifier_file {
            record.identifier_file = Some(file);
        }
        if let Some(count) = patch.identifier_count {
            record.identifier_count = Some(count);
        }
        if let Some(notes) = patch.notes {
            record.notes = Some(notes);
        }
        if let Some(reconciled) = patch.reconciled {
            // reconciled_at stamps on the false->true transition only.
            if reconciled && !record.reconciled {
                record.reconciled_at = Some(now);
            } else if !reconciled {
                record.reconciled_at = None;
            }
            record.reconciled = reconciled;
        }
        record.updated_at = now;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO reconciliation ({RECORD_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                record.order_key,
                record.reconciled,
                record.reconciled_at,
                record.asn.as_ref().map(|a| a.filename.as_str()),
                record.asn.as_ref().map(|a| a.bytes.as_slice()),
                record.asn.as_ref().map(|a| a.uploaded_at),
                record.identifier_file.as_ref().map(|a| a.filename.as_str()),
                record.identifier_file.as_ref().map(|a| a.bytes.as_slice()),
                record.identifier_file.as_ref().map(|a| a.uploaded_at),
                record.identifier_count,
                record.notes,
                record.created_at,
                record.updated_at,
            ],
        )?;

        Ok(Some(record))
    }

    pub fn get(&self, order_key: &str) -> Result<Option<ReconciliationRecord>, StoreError> {
        match &self.conn {
            Some(conn) => Self::fetch(conn, order_key),
            None => Ok(None),
        }
    }

    /// All live records, newest-first by creation time.
    pub fn list_all(&self) -> Result<Vec<ReconciliationRecord>, StoreError> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM reconciliation \
             ORDER BY created_at DESC, order_key DESC"
        ))?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Null the ASN triple and reset `reconciled` (reconciliation is keyed on
    /// ASN presence). Returns whether a record existed to clear.
    pub fn clear_asn(&mut self, order_key: &str) -> Result<bool, StoreError> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(false);
        };
        let changed = conn.execute(
            "UPDATE reconciliation SET \
                 asn_filename = NULL, asn_bytes = NULL, asn_uploaded_at = NULL, \
                 reconciled = 0, reconciled_at = NULL, updated_at = ?2 \
             WHERE order_key = ?1",
            params![order_key, Utc::now()],
        )?;
        Ok(changed > 0)
    }

    /// Null the identifier-file triple and the derived count. Returns whether
    /// a record existed to clear.
    pub fn clear_identifier_file(&mut self, order_key: &str) -> Result<bool, StoreError> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(false);
        };
        let changed = conn.execute(
            "UPDATE reconciliation SET \
                 identifier_filename = NULL, identifier_bytes = NULL, \
                 identifier_uploaded_at = NULL, identifier_count = NULL, updated_at = ?2 \
             WHERE order_key = ?1",
            params![order_key, Utc::now()],
        )?;
        Ok(changed > 0)
    }

    /// Clear ASN data on every record currently holding it; one statement, so
    /// the affected set clears atomically. Returns the count affected.
    pub fn clear_all_asn(&mut self) -> Result<usize, StoreError> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(0);
        };
        let changed = conn.execute(
            "UPDATE reconciliation SET \
                 asn_filename = NULL, asn_bytes = NULL, asn_uploaded_at = NULL, \
                 reconciled = 0, reconciled_at = NULL, updated_at = ?1 \
             WHERE asn_filename IS NOT NULL",
            params![Utc::now()],
        )?;
        Ok(changed)
    }

    /// Delete a live record outright. The record's evidence is gone with it;
    /// archive first to keep a snapshot.
    pub fn delete(&mut self, order_key: &str) -> Result<bool, StoreError> {
        let conn = self.require_conn()?;
        let changed = conn.execute(
            "DELETE FROM reconciliation WHERE order_key = ?1",
            params![order_key],
        )?;
        Ok(changed > 0)
    }

    /// Per-store counts for the dashboard row.
    pub fn order_statistics(&self) -> Result<OrderStatistics, StoreError> {
        let Some(conn) = &self.conn else {
            return Ok(OrderStatistics::default());
        };
        let (total, with_asn, with_id): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(asn_filename), COUNT(identifier_filename) \
             FROM reconciliation",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(OrderStatistics {
            total_orders: total as usize,
            with_asn: with_asn as usize,
            with_identifier_file: with_id as usize,
            pending: (total - with_asn) as usize,
        })
    }

    // -----------------------------------------------------------------------
    // Archive
    // -----------------------------------------------------------------------

    /// Freeze an order into an [`ArchivedOrder`] and remove its live record.
    /// The snapshot insert and the record delete commit in one transaction.
    ///
    /// Allowed with no live record as long as `snapshot_rows` is non-empty
    /// (the archive then has empty file fields); `NotFound` when there is
    /// neither. An existing archive for the key is never overwritten: the
    /// insert fails, the transaction rolls back, and the live record stays.
    pub fn archive(
        &mut self,
        order_key: &str,
        snapshot_rows: &[CanonicalOrderRow],
        total_quantity: u32,
        distinct_model_count: u32,
        notes: Option<&str>,
    ) -> Result<ArchivedOrder, StoreError> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| StoreError::Persistence("no database configured".into()))?;

        let record = Self::fetch(conn, order_key)?;
        if record.is_none() && snapshot_rows.is_empty() {
            return Err(StoreError::NotFound(order_key.to_string()));
        }

        let order_data = if snapshot_rows.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(snapshot_rows)
                    .map_err(|e| StoreError::Persistence(e.to_string()))?,
            )
        };

        let asn = record.as_ref().and_then(|r| r.asn.as_ref());
        let identifier = record.as_ref().and_then(|r| r.identifier_file.as_ref());
        let archived = ArchivedOrder {
            order_key: order_key.to_string(),
            order_data,
            total_quantity: Some(total_quantity),
            distinct_model_count: Some(distinct_model_count),
            asn_filename: asn.map(|a| a.filename.clone()),
            asn_bytes: asn.map(|a| a.bytes.clone()),
            identifier_filename: identifier.map(|a| a.filename.clone()),
            identifier_bytes: identifier.map(|a| a.bytes.clone()),
            notes: notes
                .map(str::to_string)
                .or_else(|| record.as_ref().and_then(|r| r.notes.clone())),
            archived_at: Utc::now(),
        };

        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO archived_orders ({ARCHIVE_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                archived.order_key,
                archived.order_data,
                archived.total_quantity,
                archived.distinct_model_count,
                archived.asn_filename,
                archived.asn_bytes,
                archived.identifier_filename,
                archived.identifier_bytes,
                archived.notes,
                archived.archived_at,
            ],
        )?;
        tx.execute(
            "DELETE FROM reconciliation WHERE order_key = ?1",
            params![order_key],
        )?;
        tx.commit()?;

        Ok(archived)
    }

    pub fn get_archived(&self, order_key: &str) -> Result<Option<ArchivedOrder>, StoreError> {
        let Some(conn) = &self.conn else {
            return Ok(None);
        };
        conn.query_row(
            &format!("SELECT {ARCHIVE_COLUMNS} FROM archived_orders WHERE order_key = ?1"),
            params![order_key],
            row_to_archived,
        )
        .optional()
        .map_err(Into::into)
    }

    /// All archives, newest-first by archive time.
    pub fn list_archived(&self) -> Result<Vec<ArchivedOrder>, StoreError> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM archived_orders \
             ORDER BY archived_at DESC, order_key DESC"
        ))?;
        let rows = stmt.query_map([], row_to_archived)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn delete_archived(&mut self, order_key: &str) -> Result<bool, StoreError> {
        let conn = self.require_conn()?;
        let changed = conn.execute(
            "DELETE FROM archived_orders WHERE order_key = ?1",
            params![order_key],
        )?;
        Ok(changed > 0)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require_conn(&self) -> Result<&Connection, StoreError> {
        self.conn
            .as_ref()
            .ok_or_else(|| StoreError::Persistence("no database configured".into()))
    }

    fn fetch(conn: &Connection, order_key: &str) -> Result<Option<ReconciliationRecord>, StoreError> {
        conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM reconciliation WHERE order_key = ?1"),
            params![order_key],
            row_to_record,
        )
        .optional()
        .map_err(Into::into)
    }
}

fn attachment(
    filename: Option<String>,
    bytes: Option<Vec<u8>>,
    uploaded_at: Option<DateTime<Utc>>,
) -> Option<FileAttachment> {
    match (filename, bytes, uploaded_at) {
        (Some(filename), Some(bytes), Some(uploaded_at)) => Some(FileAttachment {
            filename,
            bytes,
            uploaded_at,
        }),
        _ => None,
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReconciliationRecord> {
    Ok(ReconciliationRecord {
        order_key: row.get(0)?,
        reconciled: row.get(1)?,
        reconciled_at: row.get(2)?,
        asn: attachment(row.get(3)?, row.get(4)?, row.get(5)?),
        identifier_file: attachment(row.get(6)?, row.get(7)?, row.get(8)?),
        identifier_count: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn row_to_archived(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArchivedOrder> {
    Ok(ArchivedOrder {
        order_key: row.get(0)?,
        order_data: row.get(1)?,
        total_quantity: row.get(2)?,
        distinct_model_count: row.get(3)?,
        asn_filename: row.get(4)?,
        asn_bytes: row.get(5)?,
        identifier_filename: row.get(6)?,
        identifier_bytes: row.get(7)?,
        notes: row.get(8)?,
        archived_at: row.get(9)?,
    })
}
