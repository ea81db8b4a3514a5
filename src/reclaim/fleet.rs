use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    config::Config,
    error::AppResult,
    ledger::LedgerClient,
    reclaim::{
        pacing::{DelayRange, Pause},
        processor::WalletProcessor,
        submitter::{BatchSubmitter, RetryPolicy},
    },
    wallet::Identity,
};

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Totals across every wallet in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub wallets: usize,
    pub failed_wallets: usize,
    pub closed_accounts: usize,
    pub recovered: u64,
}

impl FleetSummary {
    pub fn recovered_sol(&self) -> Decimal {
        Decimal::from(self.recovered) / Decimal::from(LAMPORTS_PER_SOL)
    }
}

/// Runs every wallet in order, pacing between the ones that paid out.
pub struct FleetRunner {
    processor: WalletProcessor,
    pause: Arc<dyn Pause>,
    delay: DelayRange,
}

impl FleetRunner {
    pub fn new(processor: WalletProcessor, pause: Arc<dyn Pause>, delay: DelayRange) -> Self {
        Self {
            processor,
            pause,
            delay,
        }
    }

    /// Wire the full pipeline from configuration.
    pub fn from_config(
        config: &Config,
        ledger: Arc<dyn LedgerClient>,
        pause: Arc<dyn Pause>,
    ) -> AppResult<Self> {
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            delay: config.retry_delay,
        };
        let submitter = BatchSubmitter::new(ledger.clone(), pause.clone(), policy);
        let processor = WalletProcessor::new(ledger, submitter, config.batch_size);
        let delay = DelayRange::new(config.delay_from, config.delay_to)?;

        Ok(Self::new(processor, pause, delay))
    }

    pub async fn run(&self, identities: &[Identity]) -> FleetSummary {
        let mut summary = FleetSummary::default();

        for (index, identity) in identities.iter().enumerate() {
            info!(
                "🔄 Wallet {}/{}: {}",
                index + 1,
                identities.len(),
                identity
            );
            summary.wallets += 1;

            let recovered = match self.processor.process(identity).await {
                Ok(report) => {
                    summary.closed_accounts += report.closed_accounts();
                    report.recovered
                }
                Err(e) => {
                    error!("❌ Wallet {} (line {}) failed: {}", identity, identity.line, e);
                    summary.failed_wallets += 1;
                    0
                }
            };
            summary.recovered = summary.recovered.saturating_add(recovered);

            let is_last = index + 1 == identities.len();
            if recovered > 0 && !is_last {
                let delay = self.delay.draw();
                info!("⏰ Sleeping {:.1}s before next wallet", delay.as_secs_f64());
                self.pause.pause(delay).await;
            }
        }

        info!(
            "✅ Done: {} wallets ({} failed), {} accounts closed, {} lamports (~{} SOL) recovered",
            summary.wallets,
            summary.failed_wallets,
            summary.closed_accounts,
            summary.recovered,
            summary.recovered_sol().round_dp(6)
        );

        summary
    }
}
