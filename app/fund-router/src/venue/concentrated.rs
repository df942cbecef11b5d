//! Concentrated liquidity venue
//!
//! Each pool provides liquidity over a single price range. Inside the range the
//! pool trades like a constant product pool on virtual reserves (real balance
//! plus a fixed per-token offset), so small trades see much deeper liquidity
//! than the tokens actually held. Trades that would leave the range are not
//! quoted.

use crate::calculator::calculate_concentrated_amount_out;
use crate::clock::Clock;
use crate::error::Result;
use crate::ledger::TokenLedger;
use crate::types::{AccountId, Asset, PairKey, SwapParams, SwapPath};
use crate::venue::{VenueAdapter, VenueCore};
use std::collections::HashMap;
use std::sync::Arc;

/// Standard fee tiers in basis points
pub const FEE_TIER_LOW: u16 = 5;
pub const FEE_TIER_MEDIUM: u16 = 30;
pub const FEE_TIER_HIGH: u16 = 100;

pub struct ConcentratedLiquidityVenue {
    core: VenueCore,
    /// Virtual reserve offset per (pool, token), fixed by the range bounds
    offsets: HashMap<(PairKey, Asset), u64>,
}

impl ConcentratedLiquidityVenue {
    pub fn new(
        name: impl Into<String>,
        fee_bps: u16,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            core: VenueCore::new(name, fee_bps, ledger, clock),
            offsets: HashMap::new(),
        }
    }

    /// List a pair whose active range adds `offset_a` / `offset_b` of virtual
    /// depth on top of the real reserves
    pub fn with_pool(
        mut self,
        token_a: Asset,
        token_b: Asset,
        offset_a: u64,
        offset_b: u64,
    ) -> Self {
        self.core.add_pool(token_a, token_b);
        let key = PairKey::new(token_a, token_b);
        self.offsets.insert((key, token_a), offset_a);
        self.offsets.insert((key, token_b), offset_b);
        self
    }

    pub fn pool_account(&self, token_a: &Asset, token_b: &Asset) -> Option<AccountId> {
        self.core.pool_account(token_a, token_b)
    }

    fn offsets_for(&self, path: &SwapPath) -> (u64, u64) {
        let key = path.pair_key();
        let offset = |asset: &Asset| self.offsets.get(&(key, *asset)).copied().unwrap_or(0);
        (offset(path.asset_in()), offset(path.asset_out()))
    }
}

impl VenueAdapter for ConcentratedLiquidityVenue {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn router(&self) -> &AccountId {
        self.core.router()
    }

    fn quote(&self, amount_in: u64, path: &SwapPath) -> Result<u64> {
        let fee_bps = self.core.fee_bps();
        let (offset_in, offset_out) = self.offsets_for(path);
        self.core
            .quote_with(amount_in, path, |amount, reserve_in, reserve_out| {
                calculate_concentrated_amount_out(
                    amount,
                    reserve_in,
                    reserve_out,
                    offset_in,
                    offset_out,
                    fee_bps,
                )
            })
    }

    fn execute(&self, params: &SwapParams) -> Result<u64> {
        let fee_bps = self.core.fee_bps();
        let (offset_in, offset_out) = self.offsets_for(&params.path);
        self.core
            .execute_with(params, |amount, reserve_in, reserve_out| {
                calculate_concentrated_amount_out(
                    amount,
                    reserve_in,
                    reserve_out,
                    offset_in,
                    offset_out,
                    fee_bps,
                )
            })
    }
}
