//! Asset identifiers and swap paths

use crate::error::{FundError, Result};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// Identifier of a fungible token
pub type Asset = Pubkey;

/// Identifier of an account holding balances (callers, custody, venue pools)
pub type AccountId = Pubkey;

/// A direct swap from one asset into another. Multi-hop paths are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapPath {
    asset_in: Asset,
    asset_out: Asset,
}

impl SwapPath {
    /// Create a path, rejecting a swap of an asset into itself
    pub fn new(asset_in: Asset, asset_out: Asset) -> Result<Self> {
        if asset_in == asset_out {
            return Err(FundError::InvalidPath(format!(
                "input and output are both {}",
                asset_in
            )));
        }
        Ok(Self {
            asset_in,
            asset_out,
        })
    }

    pub fn asset_in(&self) -> &Asset {
        &self.asset_in
    }

    pub fn asset_out(&self) -> &Asset {
        &self.asset_out
    }

    /// Direction-independent key of the pool serving this path
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.asset_in, self.asset_out)
    }
}

impl fmt::Display for SwapPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.asset_in, self.asset_out)
    }
}

/// Unordered token pair, stored sorted so both directions map to the same pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: Asset,
    high: Asset,
}

impl PairKey {
    pub fn new(a: Asset, b: Asset) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn tokens(&self) -> (Asset, Asset) {
        (self.low, self.high)
    }
}
