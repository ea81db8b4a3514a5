use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::AppResult,
    ledger::{LedgerClient, Resource},
};

/// Finds token accounts a wallet can close.
pub struct ResourceScanner {
    ledger: Arc<dyn LedgerClient>,
}

impl ResourceScanner {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Empty token accounts owned by `owner`, in the order the node returned them.
    ///
    /// Entries that do not parse as spl-token accounts of `owner` are skipped.
    /// Query failures propagate; there is no retry at this layer.
    pub async fn scan(&self, owner: &Pubkey) -> AppResult<Vec<Resource>> {
        let raw_accounts = self.ledger.token_accounts_by_owner(owner).await?;
        let total = raw_accounts.len();

        let eligible: Vec<Resource> = raw_accounts
            .iter()
            .filter_map(|raw| match Resource::try_from(raw) {
                Ok(resource) if resource.owner != *owner => {
                    warn!(
                        "⚠️ Skipping {}: owned by {}, not {}",
                        resource.address, resource.owner, owner
                    );
                    None
                }
                Ok(resource) => Some(resource),
                Err(reason) => {
                    warn!("⚠️ Skipping malformed token account: {}", reason);
                    None
                }
            })
            .filter(Resource::is_closeable)
            .inspect(|resource| debug!("closeable {} (mint {})", resource.address, resource.mint))
            .collect();

        debug!(
            "{}: {} token accounts, {} closeable",
            owner,
            total,
            eligible.len()
        );

        Ok(eligible)
    }
}
