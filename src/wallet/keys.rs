// Key file loading
//
// One private key per line, either:
// - base58 of the 64-byte secret key (Phantom / Solflare export)
// - JSON byte array as written by `solana-keygen`
// Blank lines are skipped, surrounding whitespace is trimmed.

use std::collections::HashSet;
use std::path::Path;

use solana_sdk::signature::Keypair;
use tracing::{info, warn};

use crate::error::InputError;
use crate::wallet::models::Identity;

const SECRET_KEY_LEN: usize = 64;

/// Read and parse the key file at `path`.
pub fn load_identities(path: impl AsRef<Path>) -> Result<Vec<Identity>, InputError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;

    let identities = parse_identities(&contents)?;

    if identities.is_empty() {
        return Err(InputError::Empty(path.display().to_string()));
    }

    info!("🔑 Loaded {} wallets from {}", identities.len(), path.display());
    Ok(identities)
}

/// Parse key file contents. Any malformed line fails the whole load.
pub fn parse_identities(contents: &str) -> Result<Vec<Identity>, InputError> {
    let mut seen = HashSet::new();
    let mut identities = Vec::new();

    for (index, raw) in contents.lines().enumerate() {
        let line = index + 1;
        let encoded = raw.trim();
        if encoded.is_empty() {
            continue;
        }

        let keypair = parse_keypair(encoded)
            .map_err(|reason| InputError::MalformedKey { line, reason })?;
        let identity = Identity::new(line, keypair);

        if !seen.insert(identity.pubkey()) {
            warn!("⚠️ Duplicate wallet {} on line {}, skipping", identity, line);
            continue;
        }

        identities.push(identity);
    }

    Ok(identities)
}

fn parse_keypair(encoded: &str) -> Result<Keypair, String> {
    let bytes = if encoded.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(encoded)
            .map_err(|_| "invalid JSON byte array".to_string())?
    } else {
        bs58::decode(encoded)
            .into_vec()
            .map_err(|_| "invalid base58".to_string())?
    };

    if bytes.len() != SECRET_KEY_LEN {
        return Err(format!(
            "expected {} secret key bytes, got {}",
            SECRET_KEY_LEN,
            bytes.len()
        ));
    }

    Keypair::try_from(bytes.as_slice()).map_err(|_| "not a valid ed25519 keypair".to_string())
}
