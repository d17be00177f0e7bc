//! `omatch orders` / `omatch report` / `omatch extract` — ledger and evidence
//! read paths.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use ordermatch_ledger::{aggregate, CanonicalOrderRow, LedgerCache, OrderBreakdown};

use crate::config::AppConfig;
use crate::exit_codes::EXIT_USAGE;
use crate::records::open_store;
use crate::source::FileSource;
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportView {
    /// Cleaned model + capacity totals
    ModelCapacity,
    /// Cleaned model totals
    Model,
    /// Grade x model x capacity mix
    GradeMix,
    /// All three views
    All,
}

/// Pull canonical rows through the cache. One fetch per process, but the
/// freshness window still applies if a caller loops.
pub fn load_ledger(config: &AppConfig) -> Result<Vec<CanonicalOrderRow>, CliError> {
    let Some(file) = &config.ledger.file else {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "no ledger file configured".into(),
            hint: Some("set [ledger].file in ordermatch.toml".into()),
        });
    };
    let mut source = FileSource::new(file.clone());
    let mut cache = LedgerCache::new(Duration::from_secs(config.ledger.refresh_seconds));
    let rows = cache.rows(&mut source)?;
    Ok(rows.to_vec())
}

#[derive(serde::Serialize)]
struct OrderLine {
    order: String,
    units: u32,
    models: u32,
    status: String,
    reconciled: bool,
}

/// List every order in the ledger with its fulfillment status.
pub fn cmd_orders(config: &AppConfig, json: bool) -> Result<(), CliError> {
    let rows = load_ledger(config)?;
    let store = open_store(config)?;

    let mut lines = Vec::new();
    for key in aggregate::order_keys(&rows) {
        let order_rows = aggregate::rows_for_order(&rows, &key);
        let record = store.get(&key)?;
        let (status, reconciled) = match &record {
            Some(r) => (r.status().to_string(), r.reconciled),
            None => ("pending".to_string(), false),
        };
        lines.push(OrderLine {
            order: key,
            units: aggregate::total_quantity(order_rows.iter().copied()),
            models: aggregate::distinct_model_count(order_rows),
            status,
            reconciled,
        });
    }

    if json {
        println!("{}", to_json(&lines)?);
        return Ok(());
    }

    println!("{:<16} {:>6} {:>7}  {:<10} {}", "ORDER", "UNITS", "MODELS", "STATUS", "RECONCILED");
    for line in &lines {
        println!(
            "{:<16} {:>6} {:>7}  {:<10} {}",
            line.order,
            line.units,
            line.models,
            line.status,
            if line.reconciled { "yes" } else { "no" },
        );
    }
    Ok(())
}

/// Aggregated breakdown for the selected orders, as CSV or JSON.
pub fn cmd_report(
    config: &AppConfig,
    orders: Vec<String>,
    all: bool,
    view: ReportView,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    if orders.is_empty() && !all {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "no orders selected".into(),
            hint: Some("pass order keys, or --all for every order".into()),
        });
    }

    let rows = load_ledger(config)?;
    let selected = if all { aggregate::order_keys(&rows) } else { orders };

    let Some(breakdown) = aggregate::aggregate(&rows, &selected) else {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("no ledger rows match: {}", selected.join(", ")),
            hint: None,
        });
    };

    let rendered = if json {
        to_json(&breakdown)?
    } else {
        render_csv(&breakdown, view)?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn render_csv(breakdown: &OrderBreakdown, view: ReportView) -> Result<String, CliError> {
    let mut out = Vec::new();

    if matches!(view, ReportView::ModelCapacity | ReportView::All) {
        section(&mut out, view, "model-capacity");
        let mut w = csv::Writer::from_writer(&mut out);
        w.write_record(["MODEL_CAPACITY", "QTY"]).map_err(csv_err)?;
        for row in &breakdown.by_model_capacity {
            w.write_record([row.label.as_str(), &row.quantity.to_string()])
                .map_err(csv_err)?;
        }
        w.flush().map_err(|e| CliError::io(e.to_string()))?;
    }

    if matches!(view, ReportView::Model | ReportView::All) {
        section(&mut out, view, "model");
        let mut w = csv::Writer::from_writer(&mut out);
        w.write_record(["MODEL", "QTY"]).map_err(csv_err)?;
        for row in &breakdown.by_model {
            w.write_record([row.model.as_str(), &row.quantity.to_string()])
                .map_err(csv_err)?;
        }
        w.flush().map_err(|e| CliError::io(e.to_string()))?;
    }

    if matches!(view, ReportView::GradeMix | ReportView::All) {
        section(&mut out, view, "grade-mix");
        let mut w = csv::Writer::from_writer(&mut out);
        w.write_record(["GRADE", "MODEL", "CAPACITY", "QTY"]).map_err(csv_err)?;
        for row in &breakdown.by_grade_model_capacity {
            w.write_record([
                row.grade.as_str(),
                row.model.as_str(),
                row.capacity.as_str(),
                &row.quantity.to_string(),
            ])
            .map_err(csv_err)?;
        }
        w.flush().map_err(|e| CliError::io(e.to_string()))?;
    }

    String::from_utf8(out).map_err(|e| CliError::io(e.to_string()))
}

/// Section markers only appear in combined output; a single view stays pure
/// CSV for piping.
fn section(out: &mut Vec<u8>, view: ReportView, name: &str) {
    if view == ReportView::All {
        if !out.is_empty() {
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "# {name}");
    }
}

fn csv_err(e: csv::Error) -> CliError {
    CliError::io(e.to_string())
}

/// Run the identifier extractor over an evidence file and print what it finds.
pub fn cmd_extract(file: PathBuf, json: bool) -> Result<(), CliError> {
    let data = std::fs::read(&file)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", file.display())))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let extraction = ordermatch_evidence::extract(&data, filename)?;

    if json {
        #[derive(serde::Serialize)]
        struct ExtractionOut<'a> {
            identifiers: &'a [String],
            count: usize,
        }
        println!(
            "{}",
            to_json(&ExtractionOut {
                identifiers: &extraction.identifiers,
                count: extraction.count,
            })?
        );
        return Ok(());
    }

    for id in &extraction.identifiers {
        println!("{id}");
    }
    eprintln!("{} identifier(s)", extraction.count);
    Ok(())
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

/// Ledger rows for one order plus the derived archive metrics.
pub fn order_snapshot(
    rows: &[CanonicalOrderRow],
    order_key: &str,
) -> (Vec<CanonicalOrderRow>, u32, u32) {
    let order_rows: Vec<CanonicalOrderRow> = aggregate::rows_for_order(rows, order_key)
        .into_iter()
        .cloned()
        .collect();
    let total = aggregate::total_quantity(&order_rows);
    let models = aggregate::distinct_model_count(&order_rows);
    (order_rows, total, models)
}
