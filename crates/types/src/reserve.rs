//! An entity's on-chain-held per-token balance.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Reserve {
    pub amount: i128,
    pub symbol: String,
    pub decimals: u8,
}

impl Reserve {
    pub fn zero(symbol: impl Into<String>, decimals: u8) -> Self {
        Reserve {
            amount: 0,
            symbol: symbol.into(),
            decimals,
        }
    }
}
