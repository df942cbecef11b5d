//! In-memory market: a ledger, one constant product venue, one concentrated
//! liquidity venue and a fund wired to route between them

use crate::calculator::range_offset;
use crate::clock::Clock;
use crate::config::{AssetBook, Config};
use crate::error::Result;
use crate::events::EventLog;
use crate::fund::FundService;
use crate::ledger::{InMemoryLedger, TokenLedger};
use crate::router::RoutingEngine;
use crate::types::{AccountId, Asset};
use crate::venue::{ConcentratedLiquidityVenue, ConstantProductVenue, VenueAdapter};
use log::info;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// The concentrated pools hold this fraction of the constant product reserves
/// and make up the rest through their range offsets
const CLMM_LIQUIDITY_DIVISOR: u64 = 4;

pub struct SimulatedMarket {
    pub ledger: Arc<InMemoryLedger>,
    pub events: Arc<EventLog>,
    pub assets: AssetBook,
    pub amm: Arc<ConstantProductVenue>,
    pub clmm: Arc<ConcentratedLiquidityVenue>,
    pub fund: FundService,
    /// Account pre-funded with both stable assets
    pub depositor: AccountId,
}

impl SimulatedMarket {
    /// Build the market described by `config`. Venue A is the constant product
    /// venue, venue B the concentrated liquidity venue.
    pub fn bootstrap(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let ledger = Arc::new(InMemoryLedger::new());
        let assets = config.assets;
        let stables = [assets.usdc, assets.dai];
        let risks = [
            (assets.link, config.market.link_reserve),
            (assets.weth, config.market.weth_reserve),
        ];

        let clmm_stable = config.market.stable_reserve / CLMM_LIQUIDITY_DIVISOR;
        let concentration = config.venues.clmm_concentration;

        let mut amm = ConstantProductVenue::new(
            "ConstantProduct",
            config.venues.amm_fee_bps,
            ledger.clone(),
            clock.clone(),
        );
        let mut clmm = ConcentratedLiquidityVenue::new(
            "ConcentratedLiquidity",
            config.venues.clmm_fee_bps,
            ledger.clone(),
            clock.clone(),
        );

        for stable in stables {
            for (risk, risk_reserve) in risks {
                let clmm_risk = risk_reserve / CLMM_LIQUIDITY_DIVISOR;
                amm = amm.with_pool(stable, risk);
                clmm = clmm.with_pool(
                    stable,
                    risk,
                    range_offset(clmm_stable, concentration)?,
                    range_offset(clmm_risk, concentration)?,
                );

                if let Some(pool) = amm.pool_account(&stable, &risk) {
                    ledger.mint(&pool, &stable, config.market.stable_reserve)?;
                    ledger.mint(&pool, &risk, risk_reserve)?;
                }
                if let Some(pool) = clmm.pool_account(&stable, &risk) {
                    ledger.mint(&pool, &stable, clmm_stable)?;
                    ledger.mint(&pool, &risk, clmm_risk)?;
                }
            }
        }

        let depositor = Pubkey::new_unique();
        for stable in stables {
            ledger.mint(&depositor, &stable, config.market.depositor_balance)?;
        }

        let amm = Arc::new(amm);
        let clmm = Arc::new(clmm);
        let engine = RoutingEngine::new(amm.clone(), clmm.clone(), config.slippage)?;

        let events = Arc::new(EventLog::new());
        let fund = FundService::new(
            config.fund_configuration(),
            engine,
            ledger.clone(),
            clock,
            events.clone(),
        )?;

        info!(
            "Simulated market ready: {} and {} with pools for USDC/DAI x LINK/WETH",
            amm.router(),
            clmm.router()
        );

        Ok(Self {
            ledger,
            events,
            assets,
            amm,
            clmm,
            fund,
            depositor,
        })
    }

    /// Authorise the fund's custody account to pull `amount` of `asset` from `owner`
    pub fn approve_fund(&self, owner: &AccountId, asset: &Asset, amount: u64) -> Result<()> {
        self.ledger
            .approve(owner, &self.fund.config().custody, asset, amount)
    }

    pub fn balance(&self, owner: &AccountId, asset: &Asset) -> u64 {
        self.ledger.balance_of(owner, asset)
    }

    /// A fresh account holding `amount` of `asset`
    pub fn new_account(&self, asset: &Asset, amount: u64) -> Result<AccountId> {
        let account = Pubkey::new_unique();
        self.ledger.mint(&account, asset, amount)?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_bootstrap_seeds_pools_and_depositor() {
        let config = Config::default_simulation();
        let market = SimulatedMarket::bootstrap(&config, Arc::new(ManualClock::new(0))).unwrap();
        let assets = market.assets;

        let amm_pool = market.amm.pool_account(&assets.usdc, &assets.weth).unwrap();
        assert_eq!(
            market.balance(&amm_pool, &assets.usdc),
            config.market.stable_reserve
        );
        assert_eq!(
            market.balance(&amm_pool, &assets.weth),
            config.market.weth_reserve
        );

        let clmm_pool = market.clmm.pool_account(&assets.dai, &assets.link).unwrap();
        assert_eq!(
            market.balance(&clmm_pool, &assets.link),
            config.market.link_reserve / 4
        );

        assert_eq!(
            market.balance(&market.depositor, &assets.dai),
            config.market.depositor_balance
        );
        assert!(market.amm.pool_account(&assets.usdc, &assets.dai).is_none());
    }
}
