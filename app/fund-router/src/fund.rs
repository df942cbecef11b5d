//! Custodial fund: deposit a stable asset into a 50/50 risk basket, withdraw back
//!
//! Every call runs as one atomic unit. The caller's funds are pulled into the
//! custody account, each leg is routed through the [`RoutingEngine`], and the
//! output is delivered straight to the caller. Any failure undoes the call's
//! ledger writes and no event is emitted.

use crate::calculator::split_amount;
use crate::clock::Clock;
use crate::error::{FundError, Result};
use crate::events::{EventSink, FundEvent};
use crate::ledger::TokenLedger;
use crate::router::{RouteSelection, RoutingEngine};
use crate::types::{AccountId, Asset, ExecutionResult, SwapPath};
use anyhow::anyhow;
use log::{debug, info, warn};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::sync::Arc;

/// Window between the start of a call and its swap deadline
pub const DEFAULT_DEADLINE_SECS: u64 = 600;

/// Whitelisted assets and the fund's own account. Fixed for the fund's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundConfiguration {
    pub stable_a: Asset,
    pub stable_b: Asset,
    pub risk_a: Asset,
    pub risk_b: Asset,
    /// Account that holds funds in transit and spends them at the venues
    pub custody: AccountId,
    pub deadline_secs: u64,
}

impl FundConfiguration {
    pub fn new(stable_a: Asset, stable_b: Asset, risk_a: Asset, risk_b: Asset) -> Self {
        Self {
            stable_a,
            stable_b,
            risk_a,
            risk_b,
            custody: Pubkey::new_unique(),
            deadline_secs: DEFAULT_DEADLINE_SECS,
        }
    }

    pub fn with_deadline_secs(mut self, deadline_secs: u64) -> Self {
        self.deadline_secs = deadline_secs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let distinct: HashSet<_> = [self.stable_a, self.stable_b, self.risk_a, self.risk_b]
            .into_iter()
            .collect();
        if distinct.len() != 4 {
            return Err(FundError::ConfigError(
                "stable and risk assets must be four distinct tokens".to_string(),
            ));
        }
        if distinct.contains(&self.custody) {
            return Err(FundError::ConfigError(
                "custody account cannot be an asset identifier".to_string(),
            ));
        }
        if self.deadline_secs == 0 {
            return Err(FundError::ConfigError(
                "deadline window must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_stable(&self, asset: &Asset) -> bool {
        *asset == self.stable_a || *asset == self.stable_b
    }

    pub fn is_risk(&self, asset: &Asset) -> bool {
        *asset == self.risk_a || *asset == self.risk_b
    }
}

/// Result of a deposit. A leg of size zero (deposit of 1 unit) is not routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    pub risk_a_amount: u64,
    pub risk_b_amount: u64,
    pub risk_a_leg: Option<ExecutionResult>,
    pub risk_b_leg: Option<ExecutionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub amount_out: u64,
    pub execution: ExecutionResult,
}

/// Read-only view of how a deposit would be routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPreview {
    pub risk_a_input: u64,
    pub risk_b_input: u64,
    pub risk_a_route: Option<RouteSelection>,
    pub risk_b_route: Option<RouteSelection>,
}

pub struct FundService {
    config: FundConfiguration,
    engine: RoutingEngine,
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl FundService {
    pub fn new(
        config: FundConfiguration,
        engine: RoutingEngine,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engine,
            ledger,
            clock,
            events,
        })
    }

    pub fn config(&self) -> &FundConfiguration {
        &self.config
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    /// Swap `amount` of a stable asset into the two risk assets, half each.
    ///
    /// The caller must have approved the custody account for `amount`.
    pub fn deposit(
        &self,
        caller: &AccountId,
        amount: u64,
        stable_asset: &Asset,
    ) -> Result<DepositOutcome> {
        if !self.config.is_stable(stable_asset) {
            return Err(FundError::InvalidAsset(*stable_asset));
        }
        if amount == 0 {
            return Err(FundError::InvalidAmount);
        }

        self.atomically("deposit", || {
            self.pull(caller, stable_asset, amount)?;
            let deadline = self.deadline()?;
            let (half, remaining) = split_amount(amount);

            let risk_a_leg =
                self.route_leg(half, stable_asset, &self.config.risk_a, caller, deadline)?;
            let risk_b_leg =
                self.route_leg(remaining, stable_asset, &self.config.risk_b, caller, deadline)?;

            let outcome = DepositOutcome {
                risk_a_amount: risk_a_leg.as_ref().map_or(0, |leg| leg.amount_out),
                risk_b_amount: risk_b_leg.as_ref().map_or(0, |leg| leg.amount_out),
                risk_a_leg,
                risk_b_leg,
            };

            info!(
                "Deposit of {} {} by {}: {} risk A, {} risk B",
                amount, stable_asset, caller, outcome.risk_a_amount, outcome.risk_b_amount
            );
            self.events.emit(FundEvent::Deposit {
                caller: *caller,
                stable_asset: *stable_asset,
                amount,
                risk_a_amount: outcome.risk_a_amount,
                risk_b_amount: outcome.risk_b_amount,
            });
            Ok(outcome)
        })
    }

    /// Swap `amount` of a risk asset back into a stable asset
    pub fn withdraw(
        &self,
        caller: &AccountId,
        amount: u64,
        risk_asset_in: &Asset,
        stable_asset_out: &Asset,
    ) -> Result<WithdrawOutcome> {
        if !self.config.is_risk(risk_asset_in) {
            return Err(FundError::InvalidAsset(*risk_asset_in));
        }
        if !self.config.is_stable(stable_asset_out) {
            return Err(FundError::InvalidAsset(*stable_asset_out));
        }
        if amount == 0 {
            return Err(FundError::InvalidAmount);
        }

        self.atomically("withdraw", || {
            self.pull(caller, risk_asset_in, amount)?;
            let deadline = self.deadline()?;
            let execution =
                self.swap_from_custody(amount, risk_asset_in, stable_asset_out, caller, deadline)?;

            info!(
                "Withdraw of {} {} by {}: {} {}",
                amount, risk_asset_in, caller, execution.amount_out, stable_asset_out
            );
            self.events.emit(FundEvent::Withdraw {
                caller: *caller,
                risk_asset_in: *risk_asset_in,
                stable_asset_out: *stable_asset_out,
                amount,
                amount_out: execution.amount_out,
            });
            Ok(WithdrawOutcome {
                amount_out: execution.amount_out,
                execution,
            })
        })
    }

    /// Quote both deposit legs without moving funds
    pub fn preview_deposit(&self, amount: u64, stable_asset: &Asset) -> Result<DepositPreview> {
        if !self.config.is_stable(stable_asset) {
            return Err(FundError::InvalidAsset(*stable_asset));
        }
        if amount == 0 {
            return Err(FundError::InvalidAmount);
        }

        let (half, remaining) = split_amount(amount);
        Ok(DepositPreview {
            risk_a_input: half,
            risk_b_input: remaining,
            risk_a_route: self.preview_leg(half, stable_asset, &self.config.risk_a)?,
            risk_b_route: self.preview_leg(remaining, stable_asset, &self.config.risk_b)?,
        })
    }

    /// Quote a withdrawal without moving funds
    pub fn preview_withdraw(
        &self,
        amount: u64,
        risk_asset_in: &Asset,
        stable_asset_out: &Asset,
    ) -> Result<RouteSelection> {
        if !self.config.is_risk(risk_asset_in) {
            return Err(FundError::InvalidAsset(*risk_asset_in));
        }
        if !self.config.is_stable(stable_asset_out) {
            return Err(FundError::InvalidAsset(*stable_asset_out));
        }

        let path = SwapPath::new(*risk_asset_in, *stable_asset_out)?;
        self.engine.best_quote(amount, &path)
    }

    /// Run `body` as one ledger transaction: other ledger writers wait, and a
    /// failure undoes only what `body` did
    fn atomically<T>(&self, operation: &str, body: impl FnOnce() -> Result<T>) -> Result<T> {
        let mut output = None;
        self.ledger
            .transact(Box::new(|| {
                output = Some(body()?);
                Ok(())
            }))
            .inspect_err(|e| warn!("{} failed, rolled back: {}", operation, e))?;

        output.ok_or_else(|| anyhow!("{} finished without a result", operation).into())
    }

    fn pull(&self, caller: &AccountId, asset: &Asset, amount: u64) -> Result<()> {
        self.ledger.transfer_from(
            &self.config.custody,
            caller,
            &self.config.custody,
            asset,
            amount,
        )
    }

    fn deadline(&self) -> Result<u64> {
        self.clock
            .now()
            .checked_add(self.config.deadline_secs)
            .ok_or(FundError::MathOverflow)
    }

    fn route_leg(
        &self,
        amount: u64,
        asset_in: &Asset,
        asset_out: &Asset,
        recipient: &AccountId,
        deadline: u64,
    ) -> Result<Option<ExecutionResult>> {
        if amount == 0 {
            return Ok(None);
        }
        self.swap_from_custody(amount, asset_in, asset_out, recipient, deadline)
            .map(Some)
    }

    /// Swap `amount` held in custody through the better venue, paying out to
    /// `recipient`
    fn swap_from_custody(
        &self,
        amount: u64,
        asset_in: &Asset,
        asset_out: &Asset,
        recipient: &AccountId,
        deadline: u64,
    ) -> Result<ExecutionResult> {
        let path = SwapPath::new(*asset_in, *asset_out)?;
        let selection = self.engine.best_quote(amount, &path)?;
        let spender = *self.engine.venue(selection.chosen.venue).router();

        self.grant_allowance(&spender, asset_in, amount)?;
        self.engine
            .execute_selection(selection, &path, &self.config.custody, recipient, deadline)
    }

    /// Top custody's allowance for `spender` up to `amount`. A sufficient
    /// allowance is left untouched.
    fn grant_allowance(&self, spender: &AccountId, asset: &Asset, amount: u64) -> Result<()> {
        let custody = &self.config.custody;
        let current = self.ledger.allowance(custody, spender, asset);
        if current >= amount {
            return Ok(());
        }

        let updated = self
            .ledger
            .increase_allowance(custody, spender, asset, amount - current)?;
        debug!(
            "Custody allowance for {} on {} raised from {} to {}",
            spender, asset, current, updated
        );
        Ok(())
    }

    fn preview_leg(
        &self,
        amount: u64,
        asset_in: &Asset,
        asset_out: &Asset,
    ) -> Result<Option<RouteSelection>> {
        if amount == 0 {
            return Ok(None);
        }
        let path = SwapPath::new(*asset_in, *asset_out)?;
        self.engine.best_quote(amount, &path).map(Some)
    }
}
