use solana_sdk::{
    message::Message,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use spl_token::instruction::close_account;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, instrument, warn};

use crate::{
    error::LedgerError,
    ledger::{Checkpoint, LedgerClient, Resource},
    reclaim::pacing::Pause,
    wallet::Identity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed pause between attempts of the same batch
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Result of submitting one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub size: usize,
    /// Lamports returned to the wallet; zero when every attempt failed
    pub recovered: u64,
    pub attempts: u32,
    pub signature: Option<Signature>,
}

impl BatchOutcome {
    pub fn is_confirmed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Closes one batch of token accounts in a single transaction.
pub struct BatchSubmitter {
    ledger: Arc<dyn LedgerClient>,
    pause: Arc<dyn Pause>,
    policy: RetryPolicy,
}

impl BatchSubmitter {
    pub fn new(ledger: Arc<dyn LedgerClient>, pause: Arc<dyn Pause>, policy: RetryPolicy) -> Self {
        Self {
            ledger,
            pause,
            policy,
        }
    }

    /// Submit `batch` on behalf of `identity`, retrying with a fresh
    /// checkpoint each attempt.
    ///
    /// Never fails: exhausted retries resolve to zero recovered and the batch
    /// is abandoned for this run.
    #[instrument(skip(self, batch, identity, threshold), fields(wallet = %identity, size = batch.len()))]
    pub async fn submit(&self, batch: &[Resource], identity: &Identity, threshold: u64) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            size: batch.len(),
            recovered: 0,
            attempts: 0,
            signature: None,
        };

        if batch.is_empty() {
            return outcome;
        }

        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            outcome.attempts = attempt;

            match self.attempt(batch, identity.keypair()).await {
                Ok(signature) => {
                    outcome.recovered = threshold.saturating_mul(batch.len() as u64);
                    outcome.signature = Some(signature);
                    info!(
                        "✓ Closed {} accounts on attempt {}/{} (tx: {})",
                        batch.len(),
                        attempt,
                        max_attempts,
                        signature
                    );
                    return outcome;
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        "⚠️ Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, max_attempts, e, self.policy.delay
                    );
                    self.pause.pause(self.policy.delay).await;
                }
                Err(e) => {
                    error!(
                        "❌ Attempt {}/{} failed: {}. Abandoning batch of {}",
                        attempt,
                        max_attempts,
                        e,
                        batch.len()
                    );
                }
            }
        }

        outcome
    }

    async fn attempt(&self, batch: &[Resource], keypair: &Keypair) -> Result<Signature, LedgerError> {
        // Fresh on every attempt; an old blockhash is rejected once it ages out.
        let checkpoint = self.ledger.latest_checkpoint().await?;
        let transaction = build_close_transaction(batch, keypair, &checkpoint)?;
        let signature = self.ledger.send_transaction(&transaction).await?;

        info!("Transaction sent: {} (checkpoint {})", signature, checkpoint);

        self.ledger
            .confirm_transaction(&signature, &checkpoint)
            .await?;

        Ok(signature)
    }
}

/// One `CloseAccount` per resource, rent and authority both going to the
/// signer, which also pays the fee.
pub fn build_close_transaction(
    batch: &[Resource],
    keypair: &Keypair,
    checkpoint: &Checkpoint,
) -> Result<Transaction, LedgerError> {
    let owner = keypair.pubkey();

    let instructions = batch
        .iter()
        .map(|resource| {
            close_account(&spl_token::id(), &resource.address, &owner, &owner, &[])
                .map_err(|e| LedgerError::BuildFailed(format!("{}: {}", resource.address, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let message = Message::new(&instructions, Some(&owner));
    let mut transaction = Transaction::new_unsigned(message);
    transaction
        .try_sign(&[keypair], checkpoint.blockhash)
        .map_err(|e| LedgerError::BuildFailed(e.to_string()))?;

    Ok(transaction)
}
