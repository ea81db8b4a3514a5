use solana_sdk::signature::Signature;
use thiserror::Error;

/// Top-level error type for the reclaimer
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Ledger RPC and submission errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Query failed ({operation}): {message}")]
    QueryFailed {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to build transaction: {0}")]
    BuildFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Transaction {signature} failed on-chain: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    #[error("Transaction {signature} expired: block height passed {last_valid_block_height}")]
    Expired {
        signature: Signature,
        last_valid_block_height: u64,
    },
}

/// Key file errors. Messages never carry key material.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Cannot read key file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed key on line {line}: {reason}")]
    MalformedKey { line: usize, reason: String },

    #[error("Key file {0} contains no keys")]
    Empty(String),
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
