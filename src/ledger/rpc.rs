use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::CommitmentConfig,
    rpc_request::TokenAccountsFilter,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    error::LedgerError,
    ledger::models::{Checkpoint, RawTokenAccount},
};

/// Ledger operations the reclaimer depends on.
///
/// Every method is a single network round trip, except confirmation which
/// polls until the signature settles or the checkpoint expires.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// All SPL token accounts owned by `owner`, in `jsonParsed` form
    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<RawTokenAccount>, LedgerError>;

    /// Minimum lamports an account of `data_len` bytes must hold to be rent exempt
    async fn rent_exemption_threshold(&self, data_len: usize) -> Result<u64, LedgerError>;

    async fn latest_checkpoint(&self) -> Result<Checkpoint, LedgerError>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError>;

    /// Wait for `signature` to reach the client's commitment.
    ///
    /// `checkpoint` must be the one the transaction was built against; the
    /// wait fails with `Expired` once the chain passes its last valid height.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), LedgerError>;
}

/// Consecutive failed status or height queries tolerated while confirming.
const MAX_CONFIRM_QUERY_ERRORS: u32 = 10;

pub struct SolanaLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
    poll_interval: Duration,
}

impl SolanaLedger {
    pub fn new(rpc_url: String, commitment: CommitmentConfig, poll_interval: Duration) -> Self {
        let client = RpcClient::new_with_commitment(rpc_url, commitment);
        Self::with_client(client, commitment, poll_interval)
    }

    pub fn with_client(
        client: RpcClient,
        commitment: CommitmentConfig,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            commitment,
            poll_interval,
        }
    }

    /// `None` while the signature is unknown or below the target commitment.
    async fn signature_outcome(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), String>>, LedgerError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| query_failed("getSignatureStatuses", e))?;

        let outcome = match response.value.into_iter().next().flatten() {
            Some(status) => match status.err {
                Some(err) => Some(Err(format!("{:?}", err))),
                None if status.satisfies_commitment(self.commitment) => Some(Ok(())),
                None => None,
            },
            None => None,
        };

        Ok(outcome)
    }

    /// One status/height round. `None` while the signature is still pending
    /// and the checkpoint has not expired.
    async fn poll_confirmation(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<Option<Result<(), LedgerError>>, LedgerError> {
        let failed = |reason| LedgerError::TransactionFailed {
            signature: *signature,
            reason,
        };

        match self.signature_outcome(signature).await? {
            Some(Ok(())) => return Ok(Some(Ok(()))),
            Some(Err(reason)) => return Ok(Some(Err(failed(reason)))),
            None => {}
        }

        let block_height = self
            .client
            .get_block_height_with_commitment(self.commitment)
            .await
            .map_err(|e| query_failed("getBlockHeight", e))?;

        if block_height <= checkpoint.last_valid_block_height {
            debug!(
                "{} pending at height {} (valid until {})",
                signature, block_height, checkpoint.last_valid_block_height
            );
            return Ok(None);
        }

        // The transaction may have landed between the two queries.
        let result = match self.signature_outcome(signature).await? {
            Some(Ok(())) => Ok(()),
            Some(Err(reason)) => Err(failed(reason)),
            None => Err(LedgerError::Expired {
                signature: *signature,
                last_valid_block_height: checkpoint.last_valid_block_height,
            }),
        };
        Ok(Some(result))
    }
}

#[async_trait]
impl LedgerClient for SolanaLedger {
    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<RawTokenAccount>, LedgerError> {
        let accounts = self
            .client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(spl_token::id()))
            .await
            .map_err(|e| query_failed("getTokenAccountsByOwner", e))?;

        accounts
            .into_iter()
            .map(|keyed| {
                let data = serde_json::to_value(&keyed.account.data).map_err(|e| {
                    LedgerError::QueryFailed {
                        operation: "getTokenAccountsByOwner",
                        message: format!("unserializable account data: {}", e),
                    }
                })?;
                Ok(RawTokenAccount {
                    address: keyed.pubkey,
                    data,
                })
            })
            .collect()
    }

    async fn rent_exemption_threshold(&self, data_len: usize) -> Result<u64, LedgerError> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(|e| query_failed("getMinimumBalanceForRentExemption", e))
    }

    async fn latest_checkpoint(&self) -> Result<Checkpoint, LedgerError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| query_failed("getLatestBlockhash", e))?;

        Ok(Checkpoint {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        self.client
            .send_transaction(transaction)
            .await
            .map_err(|e| LedgerError::SendFailed(e.to_string()))
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), LedgerError> {
        let mut query_errors = 0;

        loop {
            // A failed query says nothing about the signature, which may still land.
            match self.poll_confirmation(signature, checkpoint).await {
                Ok(Some(result)) => return result,
                Ok(None) => query_errors = 0,
                Err(e) => {
                    query_errors += 1;
                    if query_errors >= MAX_CONFIRM_QUERY_ERRORS {
                        return Err(e);
                    }
                    warn!(
                        "⚠️ Confirmation query for {} failed ({}/{}): {}",
                        signature, query_errors, MAX_CONFIRM_QUERY_ERRORS, e
                    );
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn query_failed(operation: &'static str, error: impl std::fmt::Display) -> LedgerError {
    LedgerError::QueryFailed {
        operation,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_client::rpc_request::RpcRequest;
    use solana_sdk::hash::Hash;
    use std::collections::HashMap;

    // The mock node reports block height 1234 and, depending on the url, a
    // finalized success, an instruction error, or no status at all.
    const MOCK_BLOCK_HEIGHT: u64 = 1234;

    fn ledger(client: RpcClient) -> SolanaLedger {
        SolanaLedger::with_client(client, CommitmentConfig::confirmed(), Duration::from_millis(1))
    }

    fn checkpoint(last_valid_block_height: u64) -> Checkpoint {
        Checkpoint {
            blockhash: Hash::new_unique(),
            last_valid_block_height,
        }
    }

    #[tokio::test]
    async fn test_confirm_finalized_signature() {
        let ledger = ledger(RpcClient::new_mock("succeeds".to_string()));

        let result = ledger
            .confirm_transaction(&Signature::default(), &checkpoint(MOCK_BLOCK_HEIGHT + 150))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_confirm_reports_onchain_error() {
        let ledger = ledger(RpcClient::new_mock("instruction_error".to_string()));

        let result = ledger
            .confirm_transaction(&Signature::default(), &checkpoint(MOCK_BLOCK_HEIGHT + 150))
            .await;

        assert!(matches!(result, Err(LedgerError::TransactionFailed { .. })));
    }

    #[tokio::test]
    async fn test_confirm_expires_past_last_valid_height() {
        let ledger = ledger(RpcClient::new_mock("sig_not_found".to_string()));

        let result = ledger
            .confirm_transaction(&Signature::default(), &checkpoint(MOCK_BLOCK_HEIGHT - 1))
            .await;

        match result {
            Err(LedgerError::Expired {
                last_valid_block_height,
                ..
            }) => assert_eq!(last_valid_block_height, MOCK_BLOCK_HEIGHT - 1),
            other => panic!("expected Expired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_confirm_rechecks_status_at_expiry() {
        // First status query sees nothing; the re-check after the height
        // passes finds the signature finalized.
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetSignatureStatuses,
            json!({ "context": { "slot": 1 }, "value": [null] }),
        );
        let ledger = ledger(RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks));

        let result = ledger
            .confirm_transaction(&Signature::default(), &checkpoint(MOCK_BLOCK_HEIGHT - 1))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_confirm_survives_transient_query_error() {
        // An unparseable status response fails the first query only.
        let mut mocks = HashMap::new();
        mocks.insert(RpcRequest::GetSignatureStatuses, json!("unavailable"));
        let ledger = ledger(RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks));

        let result = ledger
            .confirm_transaction(&Signature::default(), &checkpoint(MOCK_BLOCK_HEIGHT + 150))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_confirm_gives_up_on_persistent_query_errors() {
        let ledger = ledger(RpcClient::new_mock("fails".to_string()));

        let result = ledger
            .confirm_transaction(&Signature::default(), &checkpoint(MOCK_BLOCK_HEIGHT + 150))
            .await;

        assert!(matches!(result, Err(LedgerError::QueryFailed { .. })));
    }
}
