use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::fmt;

/// A wallet whose empty token accounts are reclaimed.
///
/// The keypair lives only in memory for the duration of the run.
pub struct Identity {
    /// 1-based line in the key file this identity was read from
    pub line: usize,
    keypair: Keypair,
}

impl Identity {
    pub fn new(line: usize, keypair: Keypair) -> Self {
        Self { line, keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("line", &self.line)
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pubkey())
    }
}
