//! Constant product (x * y = k) AMM venue

use crate::calculator::calculate_amount_out;
use crate::clock::Clock;
use crate::error::Result;
use crate::ledger::TokenLedger;
use crate::types::{AccountId, Asset, SwapParams, SwapPath};
use crate::venue::{VenueAdapter, VenueCore};
use std::sync::Arc;

/// Default pool fee, 0.3%
pub const DEFAULT_FEE_BPS: u16 = 30;

/// Venue pricing every pair with the constant product formula
pub struct ConstantProductVenue {
    core: VenueCore,
}

impl ConstantProductVenue {
    pub fn new(
        name: impl Into<String>,
        fee_bps: u16,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            core: VenueCore::new(name, fee_bps, ledger, clock),
        }
    }

    /// List a pair on this venue
    pub fn with_pool(mut self, token_a: Asset, token_b: Asset) -> Self {
        self.core.add_pool(token_a, token_b);
        self
    }

    pub fn pool_account(&self, token_a: &Asset, token_b: &Asset) -> Option<AccountId> {
        self.core.pool_account(token_a, token_b)
    }

    pub fn fee_bps(&self) -> u16 {
        self.core.fee_bps()
    }
}

impl VenueAdapter for ConstantProductVenue {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn router(&self) -> &AccountId {
        self.core.router()
    }

    fn quote(&self, amount_in: u64, path: &SwapPath) -> Result<u64> {
        let fee_bps = self.core.fee_bps();
        self.core
            .quote_with(amount_in, path, |amount, reserve_in, reserve_out| {
                calculate_amount_out(amount, reserve_in, reserve_out, fee_bps)
            })
    }

    fn execute(&self, params: &SwapParams) -> Result<u64> {
        let fee_bps = self.core.fee_bps();
        self.core
            .execute_with(params, |amount, reserve_in, reserve_out| {
                calculate_amount_out(amount, reserve_in, reserve_out, fee_bps)
            })
    }
}
