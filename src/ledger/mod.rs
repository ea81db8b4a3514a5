pub mod models;
pub mod rpc;

pub use models::{Checkpoint, Resource, TOKEN_ACCOUNT_LEN};
pub use rpc::{LedgerClient, SolanaLedger};
