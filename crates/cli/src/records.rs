//! `omatch` store commands — uploads, notes, reconcile, archive, stats.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ordermatch_store::{
    ArchivedOrder, FileAttachment, ReconStore, ReconciliationRecord, RecordPatch,
};

use crate::config::AppConfig;
use crate::exit_codes::{EXIT_STORE_NOT_FOUND, EXIT_STORE_PERSISTENCE};
use crate::report::{load_ledger, order_snapshot, to_json};
use crate::CliError;

pub fn open_store(config: &AppConfig) -> Result<ReconStore, CliError> {
    match &config.store.database {
        Some(path) => Ok(ReconStore::open(path)?),
        None => Ok(ReconStore::unconfigured()),
    }
}

/// Writes need a real database; `upsert` on an unconfigured store no-ops, and
/// silently dropping an upload would be worse than failing.
fn require_written(record: Option<ReconciliationRecord>) -> Result<ReconciliationRecord, CliError> {
    record.ok_or(CliError {
        code: EXIT_STORE_PERSISTENCE,
        message: "no database configured".into(),
        hint: Some("set [store].database in ordermatch.toml".into()),
    })
}

fn read_attachment(file: &Path) -> Result<FileAttachment, CliError> {
    let bytes = std::fs::read(file)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", file.display())))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(FileAttachment {
        filename,
        bytes,
        uploaded_at: Utc::now(),
    })
}

pub fn cmd_upload_asn(config: &AppConfig, order_key: &str, file: PathBuf) -> Result<(), CliError> {
    let attachment = read_attachment(&file)?;
    let filename = attachment.filename.clone();

    let mut store = open_store(config)?;
    let record = require_written(store.upsert(
        order_key,
        RecordPatch {
            asn: Some(attachment),
            ..Default::default()
        },
    )?)?;
    println!("attached {} to {} ({})", filename, order_key, record.status());
    Ok(())
}

/// Upload identifier evidence; the extractor runs at upload time and its
/// count is stored alongside the file.
pub fn cmd_upload_identifiers(
    config: &AppConfig,
    order_key: &str,
    file: PathBuf,
) -> Result<(), CliError> {
    let attachment = read_attachment(&file)?;
    let extraction = ordermatch_evidence::extract(&attachment.bytes, &attachment.filename)?;
    let filename = attachment.filename.clone();

    let mut store = open_store(config)?;
    let record = require_written(store.upsert(
        order_key,
        RecordPatch {
            identifier_file: Some(attachment),
            identifier_count: Some(extraction.count as u32),
            ..Default::default()
        },
    )?)?;
    println!(
        "attached {} to {}: {} identifier(s) ({})",
        filename,
        order_key,
        extraction.count,
        record.status()
    );
    Ok(())
}

pub fn cmd_notes(config: &AppConfig, order_key: &str, text: String) -> Result<(), CliError> {
    let mut store = open_store(config)?;
    require_written(store.upsert(
        order_key,
        RecordPatch {
            notes: Some(text),
            ..Default::default()
        },
    )?)?;
    println!("saved notes for {order_key}");
    Ok(())
}

pub fn cmd_reconcile(config: &AppConfig, order_key: &str, unset: bool) -> Result<(), CliError> {
    let mut store = open_store(config)?;
    let record = require_written(store.upsert(
        order_key,
        RecordPatch {
            reconciled: Some(!unset),
            ..Default::default()
        },
    )?)?;
    match record.reconciled_at {
        Some(at) => println!("{order_key} reconciled at {}", at.to_rfc3339()),
        None => println!("{order_key} marked unreconciled"),
    }
    Ok(())
}

pub fn cmd_clear_asn(
    config: &AppConfig,
    order_key: Option<String>,
    all: bool,
) -> Result<(), CliError> {
    let mut store = open_store(config)?;
    match (order_key, all) {
        (Some(key), false) => {
            if store.clear_asn(&key)? {
                println!("cleared ASN for {key}");
                Ok(())
            } else {
                Err(not_found(&key))
            }
        }
        (None, true) => {
            let n = store.clear_all_asn()?;
            println!("cleared ASN on {n} record(s)");
            Ok(())
        }
        _ => Err(CliError::args("pass an order key, or --all")),
    }
}

pub fn cmd_clear_identifiers(config: &AppConfig, order_key: &str) -> Result<(), CliError> {
    let mut store = open_store(config)?;
    if store.clear_identifier_file(order_key)? {
        println!("cleared identifier file for {order_key}");
        Ok(())
    } else {
        Err(not_found(order_key))
    }
}

pub fn cmd_delete(config: &AppConfig, order_key: &str) -> Result<(), CliError> {
    let mut store = open_store(config)?;
    if store.delete(order_key)? {
        println!("deleted record for {order_key}");
        Ok(())
    } else {
        Err(not_found(order_key))
    }
}

fn not_found(order_key: &str) -> CliError {
    CliError {
        code: EXIT_STORE_NOT_FOUND,
        message: format!("order not found: {order_key}"),
        hint: None,
    }
}

// ---------------------------------------------------------------------------
// Views for human/JSON output
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct RecordView {
    order_key: String,
    status: String,
    reconciled: bool,
    reconciled_at: Option<DateTime<Utc>>,
    asn_filename: Option<String>,
    identifier_filename: Option<String>,
    identifier_count: Option<u32>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&ReconciliationRecord> for RecordView {
    fn from(r: &ReconciliationRecord) -> Self {
        Self {
            order_key: r.order_key.clone(),
            status: r.status().to_string(),
            reconciled: r.reconciled,
            reconciled_at: r.reconciled_at,
            asn_filename: r.asn.as_ref().map(|a| a.filename.clone()),
            identifier_filename: r.identifier_file.as_ref().map(|a| a.filename.clone()),
            identifier_count: r.identifier_count,
            notes: r.notes.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(serde::Serialize)]
struct ArchiveView {
    order_key: String,
    total_quantity: Option<u32>,
    distinct_model_count: Option<u32>,
    asn_filename: Option<String>,
    identifier_filename: Option<String>,
    notes: Option<String>,
    archived_at: DateTime<Utc>,
}

impl From<&ArchivedOrder> for ArchiveView {
    fn from(a: &ArchivedOrder) -> Self {
        Self {
            order_key: a.order_key.clone(),
            total_quantity: a.total_quantity,
            distinct_model_count: a.distinct_model_count,
            asn_filename: a.asn_filename.clone(),
            identifier_filename: a.identifier_filename.clone(),
            notes: a.notes.clone(),
            archived_at: a.archived_at,
        }
    }
}

pub fn cmd_show(config: &AppConfig, order_key: &str, json: bool) -> Result<(), CliError> {
    let store = open_store(config)?;
    let Some(record) = store.get(order_key)? else {
        return Err(not_found(order_key));
    };
    let view = RecordView::from(&record);

    if json {
        println!("{}", to_json(&view)?);
        return Ok(());
    }
    println!("order:       {}", view.order_key);
    println!("status:      {}", view.status);
    println!(
        "reconciled:  {}",
        match view.reconciled_at {
            Some(at) => format!("yes ({})", at.to_rfc3339()),
            None => "no".to_string(),
        }
    );
    println!("asn:         {}", view.asn_filename.as_deref().unwrap_or("-"));
    match (&view.identifier_filename, view.identifier_count) {
        (Some(name), Some(count)) => println!("identifiers: {name} ({count})"),
        (Some(name), None) => println!("identifiers: {name}"),
        _ => println!("identifiers: -"),
    }
    println!("notes:       {}", view.notes.as_deref().unwrap_or("-"));
    println!("updated:     {}", view.updated_at.to_rfc3339());
    Ok(())
}

pub fn cmd_stats(config: &AppConfig, json: bool) -> Result<(), CliError> {
    let store = open_store(config)?;
    let stats = store.order_statistics()?;

    if json {
        #[derive(serde::Serialize)]
        struct StatsOut {
            total_orders: usize,
            with_asn: usize,
            with_identifier_file: usize,
            pending: usize,
        }
        println!(
            "{}",
            to_json(&StatsOut {
                total_orders: stats.total_orders,
                with_asn: stats.with_asn,
                with_identifier_file: stats.with_identifier_file,
                pending: stats.pending,
            })?
        );
        return Ok(());
    }
    println!("records:          {}", stats.total_orders);
    println!("with ASN:         {}", stats.with_asn);
    println!("with identifiers: {}", stats.with_identifier_file);
    println!("pending:          {}", stats.pending);
    Ok(())
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Freeze an order: snapshot its ledger rows and evidence, then drop the live
/// record. A missing ledger file is not fatal here — evidence-only orders can
/// still be archived.
pub fn cmd_archive(
    config: &AppConfig,
    order_key: &str,
    notes: Option<String>,
) -> Result<(), CliError> {
    let rows = match load_ledger(config) {
        Ok(rows) => rows,
        Err(e) => {
            if config.ledger.file.is_some() {
                eprintln!("warning: ledger unavailable, archiving evidence only ({})", e.message);
            }
            Vec::new()
        }
    };
    let (order_rows, total, models) = order_snapshot(&rows, order_key);

    let mut store = open_store(config)?;
    let archived = store.archive(order_key, &order_rows, total, models, notes.as_deref())?;
    println!(
        "archived {}: {} row(s), {} unit(s)",
        archived.order_key,
        order_rows.len(),
        total
    );
    Ok(())
}

pub fn cmd_archived(config: &AppConfig, json: bool) -> Result<(), CliError> {
    let store = open_store(config)?;
    let archives = store.list_archived()?;

    if json {
        let views: Vec<ArchiveView> = archives.iter().map(ArchiveView::from).collect();
        println!("{}", to_json(&views)?);
        return Ok(());
    }

    println!("{:<16} {:>6} {:>7}  {:<24} {}", "ORDER", "UNITS", "MODELS", "ARCHIVED", "ASN");
    for a in &archives {
        println!(
            "{:<16} {:>6} {:>7}  {:<24} {}",
            a.order_key,
            a.total_quantity.map_or("-".to_string(), |q| q.to_string()),
            a.distinct_model_count.map_or("-".to_string(), |m| m.to_string()),
            a.archived_at.to_rfc3339(),
            a.asn_filename.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub fn cmd_delete_archived(config: &AppConfig, order_key: &str) -> Result<(), CliError> {
    let mut store = open_store(config)?;
    if store.delete_archived(order_key)? {
        println!("deleted archive for {order_key}");
        Ok(())
    } else {
        Err(not_found(order_key))
    }
}
