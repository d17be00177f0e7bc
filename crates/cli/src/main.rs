// omatch - order fulfillment tracking from the command line

mod config;
mod exit_codes;
mod records;
mod report;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use config::AppConfig;
use exit_codes::{
    extract_exit_code, ledger_exit_code, store_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE,
};
use report::ReportView;

#[derive(Parser)]
#[command(name = "omatch")]
#[command(about = "Track wholesale phone orders from ledger to fulfillment")]
#[command(version)]
struct Cli {
    /// Config file (default: ./ordermatch.toml, then the user config dir)
    #[arg(long, global = true, env = "OMATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List ledger orders with fulfillment status
    #[command(after_help = "\
Examples:
  omatch orders
  omatch orders --json")]
    Orders {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregated breakdown for selected orders
    #[command(after_help = "\
Examples:
  omatch report INV100 INV101
  omatch report --all
  omatch report INV100 --view model-capacity
  omatch report --all --json --output breakdown.json")]
    Report {
        /// Order keys to include
        orders: Vec<String>,

        /// Include every order in the ledger
        #[arg(long)]
        all: bool,

        /// Which view(s) to print
        #[arg(long, value_enum, default_value = "all")]
        view: ReportView,

        /// Output as JSON instead of CSV
        #[arg(long)]
        json: bool,

        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Extract device identifiers from an evidence file
    #[command(after_help = "\
Examples:
  omatch extract manifest.xlsx
  omatch extract scan.txt --json")]
    Extract {
        /// Evidence file (xlsx, xls, csv, or txt)
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the reconciliation record for one order
    Show {
        /// Order key
        order_key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Attach an ASN file to an order
    UploadAsn {
        /// Order key
        order_key: String,

        /// ASN file
        file: PathBuf,
    },

    /// Attach an identifier evidence file; identifiers are counted on upload
    UploadIdentifiers {
        /// Order key
        order_key: String,

        /// Evidence file (xlsx, xls, csv, or txt)
        file: PathBuf,
    },

    /// Save notes on an order (creates the record if needed)
    Notes {
        /// Order key
        order_key: String,

        /// Note text
        text: String,
    },

    /// Mark an order reconciled (or undo with --unset)
    Reconcile {
        /// Order key
        order_key: String,

        /// Clear the reconciled flag instead of setting it
        #[arg(long)]
        unset: bool,
    },

    /// Remove ASN data from one order, or every order with --all
    #[command(after_help = "\
Clearing an ASN also resets the reconciled flag: reconciliation is evidence
against that ASN.

Examples:
  omatch clear-asn INV100
  omatch clear-asn --all")]
    ClearAsn {
        /// Order key
        order_key: Option<String>,

        /// Clear ASN data on every record holding it
        #[arg(long)]
        all: bool,
    },

    /// Remove identifier evidence (and its count) from an order
    ClearIdentifiers {
        /// Order key
        order_key: String,
    },

    /// Freeze an order's ledger rows and evidence, then drop the live record
    #[command(after_help = "\
Examples:
  omatch archive INV100
  omatch archive INV100 --notes 'closed short 2 units'")]
    Archive {
        /// Order key
        order_key: String,

        /// Notes for the archive (defaults to the record's notes)
        #[arg(long)]
        notes: Option<String>,
    },

    /// List archived orders
    Archived {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an archived order snapshot
    DeleteArchived {
        /// Order key
        order_key: String,
    },

    /// Delete a live reconciliation record (archive first to keep a snapshot)
    Delete {
        /// Order key
        order_key: String,
    },

    /// Store-wide record counts
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = AppConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Orders { json } => report::cmd_orders(&config, json),
        Commands::Report { orders, all, view, json, output } => {
            report::cmd_report(&config, orders, all, view, json, output)
        }
        Commands::Extract { file, json } => report::cmd_extract(file, json),
        Commands::Show { order_key, json } => records::cmd_show(&config, &order_key, json),
        Commands::UploadAsn { order_key, file } => {
            records::cmd_upload_asn(&config, &order_key, file)
        }
        Commands::UploadIdentifiers { order_key, file } => {
            records::cmd_upload_identifiers(&config, &order_key, file)
        }
        Commands::Notes { order_key, text } => records::cmd_notes(&config, &order_key, text),
        Commands::Reconcile { order_key, unset } => {
            records::cmd_reconcile(&config, &order_key, unset)
        }
        Commands::ClearAsn { order_key, all } => records::cmd_clear_asn(&config, order_key, all),
        Commands::ClearIdentifiers { order_key } => {
            records::cmd_clear_identifiers(&config, &order_key)
        }
        Commands::Archive { order_key, notes } => records::cmd_archive(&config, &order_key, notes),
        Commands::Archived { json } => records::cmd_archived(&config, json),
        Commands::DeleteArchived { order_key } => {
            records::cmd_delete_archived(&config, &order_key)
        }
        Commands::Delete { order_key } => records::cmd_delete(&config, &order_key),
        Commands::Stats { json } => records::cmd_stats(&config, json),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }
}

impl From<ordermatch_ledger::LedgerError> for CliError {
    fn from(e: ordermatch_ledger::LedgerError) -> Self {
        Self { code: ledger_exit_code(&e), message: e.to_string(), hint: None }
    }
}

impl From<ordermatch_evidence::ExtractError> for CliError {
    fn from(e: ordermatch_evidence::ExtractError) -> Self {
        Self { code: extract_exit_code(&e), message: e.to_string(), hint: None }
    }
}

impl From<ordermatch_store::StoreError> for CliError {
    fn from(e: ordermatch_store::StoreError) -> Self {
        Self { code: store_exit_code(&e), message: e.to_string(), hint: None }
    }
}
