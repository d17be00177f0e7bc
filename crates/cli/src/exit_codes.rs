//! CLI exit code registry.
//!
//! Single source of truth for `omatch` exit codes. Exit codes are part of the
//! shell contract — scripts rely on them.
//!
//! | Range | Domain   | Description                                |
//! |-------|----------|--------------------------------------------|
//! | 0     | Universal| Success                                    |
//! | 1     | Universal| General error (unspecified)                |
//! | 2     | Universal| CLI usage error (bad args, missing file)   |
//! | 3-9   | ledger   | Ledger fetch/normalize codes               |
//! | 10-19 | evidence | Evidence extraction codes                  |
//! | 20-29 | store    | Reconciliation store codes                 |
//! | 30-39 | local    | Local file I/O                             |

use ordermatch_evidence::ExtractError;
use ordermatch_ledger::LedgerError;
use ordermatch_store::StoreError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Ledger (3-9)
// =============================================================================

/// Ledger data is malformed (missing header marker or required columns).
pub const EXIT_LEDGER_FORMAT: u8 = 3;

/// Ledger source unreachable or unreadable.
pub const EXIT_LEDGER_SOURCE: u8 = 4;

// =============================================================================
// Evidence (10-19)
// =============================================================================

/// Evidence file extension not in the supported set.
pub const EXIT_EXTRACT_UNSUPPORTED: u8 = 10;

/// Evidence file could not be parsed as its claimed format.
pub const EXIT_EXTRACT_PARSE: u8 = 11;

// =============================================================================
// Store (20-29)
// =============================================================================

/// Operation referenced an order key with nothing behind it.
pub const EXIT_STORE_NOT_FOUND: u8 = 20;

/// Database unconfigured, unreachable, or a write was rejected.
pub const EXIT_STORE_PERSISTENCE: u8 = 21;

// =============================================================================
// Local I/O (30-39)
// =============================================================================

/// Cannot read or write a local file named on the command line.
pub const EXIT_IO: u8 = 30;

pub fn ledger_exit_code(err: &LedgerError) -> u8 {
    match err {
        LedgerError::Format(_) => EXIT_LEDGER_FORMAT,
        LedgerError::Source(_) => EXIT_LEDGER_SOURCE,
    }
}

pub fn extract_exit_code(err: &ExtractError) -> u8 {
    match err {
        ExtractError::UnsupportedFormat(_) => EXIT_EXTRACT_UNSUPPORTED,
        ExtractError::Parse(_) => EXIT_EXTRACT_PARSE,
    }
}

pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::NotFound(_) => EXIT_STORE_NOT_FOUND,
        StoreError::Persistence(_) => EXIT_STORE_PERSISTENCE,
    }
}
