// Rent reclamation pipeline
//
// FleetRunner -> WalletProcessor -> ResourceScanner -> partition -> BatchSubmitter
//
// Everything runs sequentially on one task: wallets in file order, batches in
// scan order, attempts one after another.

pub mod batcher;
pub mod fleet;
pub mod pacing;
pub mod processor;
pub mod scanner;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use fleet::FleetRunner;
pub use pacing::TokioPause;
