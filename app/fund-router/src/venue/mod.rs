//! Exchange venues behind a uniform quote/execute contract
//!
//! Every venue owns a router account (the spender payers approve) and one
//! pool account per listed token pair. Pool reserves are simply the pool
//! account's balances on the shared [`TokenLedger`], so a ledger transaction
//! also covers venue state.

pub mod concentrated;
pub mod constant_product;

pub use concentrated::ConcentratedLiquidityVenue;
pub use constant_product::ConstantProductVenue;

use crate::clock::Clock;
use crate::error::{FundError, Result};
use crate::ledger::TokenLedger;
use crate::types::{AccountId, Asset, PairKey, SwapParams, SwapPath};
use log::debug;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;

/// One exchange venue
pub trait VenueAdapter: Send + Sync {
    /// Human-readable venue name (e.g., "ConstantProduct")
    fn name(&self) -> &str;

    /// Account that spends the payer's input; payers approve it before `execute`
    fn router(&self) -> &AccountId;

    /// Expected output for spending `amount_in` along `path`. Never mutates state.
    fn quote(&self, amount_in: u64, path: &SwapPath) -> Result<u64>;

    /// Perform the swap and return the realized output
    fn execute(&self, params: &SwapParams) -> Result<u64>;
}

/// State and plumbing shared by all venue variants
pub struct VenueCore {
    name: String,
    router: AccountId,
    fee_bps: u16,
    pools: HashMap<PairKey, AccountId>,
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
}

impl VenueCore {
    pub fn new(
        name: impl Into<String>,
        fee_bps: u16,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            router: Pubkey::new_unique(),
            fee_bps,
            pools: HashMap::new(),
            ledger,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn router(&self) -> &AccountId {
        &self.router
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    /// List a pair, backed by a freshly created pool account
    pub fn add_pool(&mut self, token_a: Asset, token_b: Asset) -> AccountId {
        *self
            .pools
            .entry(PairKey::new(token_a, token_b))
            .or_insert_with(Pubkey::new_unique)
    }

    pub fn pool_account(&self, token_a: &Asset, token_b: &Asset) -> Option<AccountId> {
        self.pools.get(&PairKey::new(*token_a, *token_b)).copied()
    }

    /// Current (reserve_in, reserve_out) for a path
    pub fn reserves(&self, path: &SwapPath) -> Result<(AccountId, u64, u64)> {
        let pool = self
            .pools
            .get(&path.pair_key())
            .ok_or_else(|| self.unavailable("no pool for pair"))?;

        let reserve_in = self.ledger.balance_of(pool, path.asset_in());
        let reserve_out = self.ledger.balance_of(pool, path.asset_out());
        Ok((*pool, reserve_in, reserve_out))
    }

    /// Price a path with the variant's formula, mapping pricing failures to
    /// `QuoteUnavailable`
    pub fn quote_with<F>(&self, amount_in: u64, path: &SwapPath, price: F) -> Result<u64>
    where
        F: Fn(u64, u64, u64) -> Result<u64>,
    {
        if amount_in == 0 {
            return Err(FundError::InvalidAmount);
        }

        let (_, reserve_in, reserve_out) = self.reserves(path)?;
        let amount_out = price(amount_in, reserve_in, reserve_out).map_err(|e| match e {
            FundError::InvalidReserves => self.unavailable("insufficient pool liquidity"),
            other => other,
        })?;

        debug!(
            "{} quote: {} in -> {} out ({})",
            self.name, amount_in, amount_out, path
        );
        Ok(amount_out)
    }

    /// Deadline check, pricing, slippage check, settlement. The input is pulled
    /// with the router's allowance over the payer, which the payer must have
    /// granted beforehand.
    pub fn execute_with<F>(&self, params: &SwapParams, price: F) -> Result<u64>
    where
        F: Fn(u64, u64, u64) -> Result<u64>,
    {
        let now = self.clock.now();
        if now > params.deadline {
            return Err(FundError::Expired {
                deadline: params.deadline,
                now,
            });
        }

        let amount_out = self.quote_with(params.amount_in, &params.path, price)?;
        if amount_out < params.min_amount_out {
            return Err(FundError::SlippageExceeded {
                min_amount_out: params.min_amount_out,
                amount_out,
            });
        }

        let (pool, _, _) = self.reserves(&params.path)?;
        self.ledger.transact(Box::new(|| {
            self.ledger.transfer_from(
                &self.router,
                &params.payer,
                &pool,
                params.path.asset_in(),
                params.amount_in,
            )?;
            self.ledger.transfer(
                &pool,
                &params.recipient,
                params.path.asset_out(),
                amount_out,
            )
        }))?;

        Ok(amount_out)
    }

    fn unavailable(&self, reason: &str) -> FundError {
        FundError::QuoteUnavailable {
            venue: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}
