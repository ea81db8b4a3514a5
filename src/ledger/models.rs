use serde::Deserialize;
use solana_sdk::{hash::Hash, pubkey::Pubkey};
use std::{fmt, str::FromStr};

/// Byte size of an SPL token account; its rent deposit is what gets reclaimed.
pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// A token account as returned by the RPC node, before validation.
///
/// `data` is the `jsonParsed` account payload and has no guaranteed shape.
#[derive(Debug, Clone)]
pub struct RawTokenAccount {
    pub address: String,
    pub data: serde_json::Value,
}

/// A validated token account owned by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub address: Pubkey,
    pub owner: Pubkey,
    pub mint: Pubkey,
    /// Raw token amount in base units
    pub balance: u64,
}

impl Resource {
    /// Closing is only permitted for accounts holding no tokens.
    pub fn is_closeable(&self) -> bool {
        self.balance == 0
    }
}

impl TryFrom<&RawTokenAccount> for Resource {
    type Error = String;

    fn try_from(raw: &RawTokenAccount) -> Result<Self, Self::Error> {
        let address = Pubkey::from_str(&raw.address)
            .map_err(|e| format!("invalid account address '{}': {}", raw.address, e))?;

        let parsed: ParsedTokenAccount = serde_json::from_value(raw.data.clone())
            .map_err(|e| format!("unexpected account data for {}: {}", address, e))?;

        if parsed.parsed.kind != "account" {
            return Err(format!(
                "{} is a '{}' entry, not a token account",
                address, parsed.parsed.kind
            ));
        }

        let info = parsed.parsed.info;
        let owner = Pubkey::from_str(&info.owner)
            .map_err(|e| format!("invalid owner for {}: {}", address, e))?;
        let mint = Pubkey::from_str(&info.mint)
            .map_err(|e| format!("invalid mint for {}: {}", address, e))?;
        let balance = info
            .token_amount
            .amount
            .parse::<u64>()
            .map_err(|e| format!("invalid token amount for {}: {}", address, e))?;

        Ok(Self {
            address,
            owner,
            mint,
            balance,
        })
    }
}

// Shape of the `jsonParsed` spl-token account payload
#[derive(Debug, Deserialize)]
struct ParsedTokenAccount {
    parsed: ParsedPayload,
}

#[derive(Debug, Deserialize)]
struct ParsedPayload {
    #[serde(rename = "type")]
    kind: String,
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    owner: String,
    token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    amount: String,
}

/// Blockhash plus the last block height at which a transaction built
/// against it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.blockhash, self.last_valid_block_height)
    }
}

#[cfg(test)]
pub(crate) fn parsed_token_account(
    address: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    amount: u64,
) -> RawTokenAccount {
    RawTokenAccount {
        address: address.to_string(),
        data: serde_json::json!({
            "program": "spl-token",
            "parsed": {
                "type": "account",
                "info": {
                    "isNative": false,
                    "mint": mint.to_string(),
                    "owner": owner.to_string(),
                    "state": "initialized",
                    "tokenAmount": {
                        "amount": amount.to_string(),
                        "decimals": 6,
                        "uiAmount": amount as f64 / 1_000_000.0,
                        "uiAmountString": amount.to_string(),
                    }
                }
            },
            "space": TOKEN_ACCOUNT_LEN,
        }),
    }
}
