// In-memory ledger and pause doubles shared by the reclaim tests

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
    time::Duration,
};

use crate::{
    error::LedgerError,
    ledger::{
        models::{parsed_token_account, RawTokenAccount},
        Checkpoint, LedgerClient, Resource,
    },
    reclaim::pacing::Pause,
};

/// How a single submission attempt ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Confirm,
    RejectSend,
    Expire,
    Fail,
}

pub struct MockLedger {
    threshold: u64,
    accounts: HashMap<Pubkey, Vec<RawTokenAccount>>,
    scan_failures: HashSet<Pubkey>,
    outcomes: Mutex<VecDeque<Outcome>>,
    next_height: Mutex<u64>,
    scans: Mutex<Vec<Pubkey>>,
    threshold_queries: Mutex<usize>,
    checkpoints: Mutex<Vec<Checkpoint>>,
    sent: Mutex<Vec<Hash>>,
    confirmations: Mutex<Vec<(Signature, Checkpoint)>>,
}

impl MockLedger {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            accounts: HashMap::new(),
            scan_failures: HashSet::new(),
            outcomes: Mutex::new(VecDeque::new()),
            next_height: Mutex::new(1_000),
            scans: Mutex::new(Vec::new()),
            threshold_queries: Mutex::new(0),
            checkpoints: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_accounts(mut self, owner: Pubkey, accounts: Vec<RawTokenAccount>) -> Self {
        self.accounts.entry(owner).or_default().extend(accounts);
        self
    }

    /// Give `owner` `count` empty token accounts.
    pub fn with_empty_accounts(self, owner: Pubkey, count: usize) -> Self {
        let mint = Pubkey::new_unique();
        let accounts = (0..count)
            .map(|_| parsed_token_account(&Pubkey::new_unique(), &owner, &mint, 0))
            .collect();
        self.with_accounts(owner, accounts)
    }

    pub fn with_scan_failure(mut self, owner: Pubkey) -> Self {
        self.scan_failures.insert(owner);
        self
    }

    /// Script attempt outcomes in call order; unscripted attempts confirm.
    pub fn with_outcomes(self, outcomes: Vec<Outcome>) -> Self {
        *self.outcomes.lock().unwrap() = outcomes.into();
        self
    }

    pub fn scan_count(&self) -> usize {
        self.scans.lock().unwrap().len()
    }

    pub fn threshold_queries(&self) -> usize {
        *self.threshold_queries.lock().unwrap()
    }

    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.checkpoints.lock().unwrap().clone()
    }

    /// Blockhash of every transaction that reached the network
    pub fn sent(&self) -> Vec<Hash> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn confirmations(&self) -> Vec<(Signature, Checkpoint)> {
        self.confirmations.lock().unwrap().clone()
    }

    fn next_outcome(&self) -> Outcome {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Confirm)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<RawTokenAccount>, LedgerError> {
        self.scans.lock().unwrap().push(*owner);

        if self.scan_failures.contains(owner) {
            return Err(LedgerError::QueryFailed {
                operation: "getTokenAccountsByOwner",
                message: "connection reset".to_string(),
            });
        }

        Ok(self.accounts.get(owner).cloned().unwrap_or_default())
    }

    async fn rent_exemption_threshold(&self, _data_len: usize) -> Result<u64, LedgerError> {
        *self.threshold_queries.lock().unwrap() += 1;
        Ok(self.threshold)
    }

    async fn latest_checkpoint(&self) -> Result<Checkpoint, LedgerError> {
        let mut height = self.next_height.lock().unwrap();
        *height += 1;

        let checkpoint = Checkpoint {
            blockhash: Hash::new_unique(),
            last_valid_block_height: *height + 150,
        };
        self.checkpoints.lock().unwrap().push(checkpoint);
        Ok(checkpoint)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        // Peek so a rejected send consumes the outcome here, not at confirmation.
        let rejected = {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.front() == Some(&Outcome::RejectSend) {
                outcomes.pop_front();
                true
            } else {
                false
            }
        };

        if rejected {
            return Err(LedgerError::SendFailed("blockhash not found".to_string()));
        }

        transaction
            .verify()
            .map_err(|e| LedgerError::SendFailed(e.to_string()))?;

        self.sent
            .lock()
            .unwrap()
            .push(transaction.message.recent_blockhash);
        Ok(transaction.signatures[0])
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), LedgerError> {
        self.confirmations
            .lock()
            .unwrap()
            .push((*signature, *checkpoint));

        match self.next_outcome() {
            Outcome::Confirm => Ok(()),
            Outcome::Expire => Err(LedgerError::Expired {
                signature: *signature,
                last_valid_block_height: checkpoint.last_valid_block_height,
            }),
            Outcome::Fail | Outcome::RejectSend => Err(LedgerError::TransactionFailed {
                signature: *signature,
                reason: "InstructionError(0, Custom(11))".to_string(),
            }),
        }
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn recorded(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

/// `count` empty token accounts owned by `owner`.
pub fn resources_for(owner: &Pubkey, count: usize) -> Vec<Resource> {
    let mint = Pubkey::new_unique();
    (0..count)
        .map(|_| Resource {
            address: Pubkey::new_unique(),
            owner: *owner,
            mint,
            balance: 0,
        })
        .collect()
}
