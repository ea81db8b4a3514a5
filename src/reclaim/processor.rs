use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    error::AppResult,
    ledger::{LedgerClient, TOKEN_ACCOUNT_LEN},
    reclaim::{
        batcher::partition,
        scanner::ResourceScanner,
        submitter::{BatchOutcome, BatchSubmitter},
    },
    wallet::Identity,
};

/// What one wallet's pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletReport {
    pub wallet: Pubkey,
    pub eligible: usize,
    pub batches: Vec<BatchOutcome>,
    pub recovered: u64,
}

impl WalletReport {
    fn empty(wallet: Pubkey) -> Self {
        Self {
            wallet,
            eligible: 0,
            batches: Vec::new(),
            recovered: 0,
        }
    }

    pub fn closed_accounts(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_confirmed())
            .map(|b| b.size)
            .sum()
    }

    pub fn failed_batches(&self) -> usize {
        self.batches.iter().filter(|b| !b.is_confirmed()).count()
    }
}

/// Scans one wallet and closes its empty token accounts batch by batch.
pub struct WalletProcessor {
    ledger: Arc<dyn LedgerClient>,
    scanner: ResourceScanner,
    submitter: BatchSubmitter,
    batch_size: usize,
}

impl WalletProcessor {
    pub fn new(ledger: Arc<dyn LedgerClient>, submitter: BatchSubmitter, batch_size: usize) -> Self {
        Self {
            scanner: ResourceScanner::new(ledger.clone()),
            ledger,
            submitter,
            batch_size,
        }
    }

    #[instrument(skip(self, identity), fields(wallet = %identity, line = identity.line))]
    pub async fn process(&self, identity: &Identity) -> AppResult<WalletReport> {
        let wallet = identity.pubkey();
        let resources = self.scanner.scan(&wallet).await?;

        if resources.is_empty() {
            info!("✓ No closeable token accounts for {}", wallet);
            return Ok(WalletReport::empty(wallet));
        }

        // All token accounts share one size, so one threshold covers the wallet.
        let threshold = self
            .ledger
            .rent_exemption_threshold(TOKEN_ACCOUNT_LEN)
            .await?;
        let batches = partition(&resources, self.batch_size)?;

        info!(
            "📊 {} closeable accounts for {} in {} batches ({} lamports each)",
            resources.len(),
            wallet,
            batches.len(),
            threshold
        );

        let mut report = WalletReport {
            wallet,
            eligible: resources.len(),
            batches: Vec::with_capacity(batches.len()),
            recovered: 0,
        };

        for (index, batch) in batches.iter().enumerate() {
            info!("🔄 Batch {}/{}: closing {} accounts", index + 1, batches.len(), batch.len());

            let outcome = self.submitter.submit(batch, identity, threshold).await;
            if !outcome.is_confirmed() {
                warn!(
                    "⏭️ Batch {}/{} abandoned after {} attempts",
                    index + 1,
                    batches.len(),
                    outcome.attempts
                );
            }
            report.recovered = report.recovered.saturating_add(outcome.recovered);
            report.batches.push(outcome);
        }

        info!(
            "✓ {} recovered {} lamports from {}/{} accounts ({} batches failed)",
            wallet,
            report.recovered,
            report.closed_accounts(),
            report.eligible,
            report.failed_batches()
        );

        Ok(report)
    }
}
