//! Value-transfer collaborator: balances, allowances and atomic transactions
//!
//! The fund and the venues never touch balances directly; every movement goes
//! through a [`TokenLedger`]. Callers grant allowances with `approve` and
//! spenders pull with `transfer_from`, mirroring fungible-token semantics.

use crate::error::{FundError, Result};
use crate::types::{AccountId, Asset};
use log::{debug, trace};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;

/// Fungible-token style value transfer
pub trait TokenLedger: Send + Sync {
    /// Balance of `asset` held by `owner`
    fn balance_of(&self, owner: &AccountId, asset: &Asset) -> u64;

    /// Amount of `asset` that `spender` may move out of `owner`
    fn allowance(&self, owner: &AccountId, spender: &AccountId, asset: &Asset) -> u64;

    /// Set the allowance of `spender` over `owner`'s `asset` to exactly `amount`
    fn approve(&self, owner: &AccountId, spender: &AccountId, asset: &Asset, amount: u64)
        -> Result<()>;

    /// Raise an allowance by `added`, returning the new allowance
    fn increase_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &Asset,
        added: u64,
    ) -> Result<u64>;

    /// Move `amount` of `asset` from `from` to `to`, authorised by `from` itself
    fn transfer(&self, from: &AccountId, to: &AccountId, asset: &Asset, amount: u64)
        -> Result<()>;

    /// Move `amount` of `asset` from `from` to `to` on behalf of `spender`,
    /// consuming `spender`'s allowance
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        asset: &Asset,
        amount: u64,
    ) -> Result<()>;

    /// Capture the full ledger state
    fn checkpoint(&self) -> LedgerCheckpoint;

    /// Run `body` as one all-or-nothing unit.
    ///
    /// Ledger calls made by `body` on the current thread go through; calls
    /// from other threads wait until `body` returns. If `body` fails, every
    /// change it made is undone and the error is returned.
    fn transact<'a>(&self, body: Box<dyn FnOnce() -> Result<()> + 'a>) -> Result<()>;
}

/// Plain balance and allowance tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    balances: HashMap<(AccountId, Asset), u64>,
    allowances: HashMap<(AccountId, AccountId, Asset), u64>,
}

impl LedgerState {
    pub fn balance(&self, owner: &AccountId, asset: &Asset) -> u64 {
        self.balances.get(&(*owner, *asset)).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId, asset: &Asset) -> u64 {
        self.allowances
            .get(&(*owner, *spender, *asset))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_allowance(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &Asset,
        amount: u64,
    ) {
        self.allowances.insert((*owner, *spender, *asset), amount);
    }

    pub fn credit(&mut self, owner: &AccountId, asset: &Asset, amount: u64) -> Result<()> {
        let entry = self.balances.entry((*owner, *asset)).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(FundError::MathOverflow)?;
        Ok(())
    }

    /// Move value between accounts; nothing changes if the sender is short
    pub fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        asset: &Asset,
        amount: u64,
    ) -> Result<()> {
        let available = self.balance(from, asset);
        if available < amount {
            return Err(FundError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        // Validate the credit before debiting so a failure leaves no trace
        self.balance(to, asset)
            .checked_add(amount)
            .ok_or(FundError::MathOverflow)?;

        self.balances.insert((*from, *asset), available - amount);
        self.credit(to, asset, amount)
    }
}

/// Opaque snapshot returned by [`TokenLedger::checkpoint`]
#[derive(Debug, Clone)]
pub struct LedgerCheckpoint(LedgerState);

impl LedgerCheckpoint {
    pub fn new(state: LedgerState) -> Self {
        Self(state)
    }

    pub fn into_state(self) -> LedgerState {
        self.0
    }
}

/// Ledger kept in process memory.
///
/// The state sits behind a reentrant lock so a transaction can keep other
/// threads out while its own venue calls still reach the ledger.
#[derive(Default)]
pub struct InMemoryLedger {
    state: ReentrantMutex<RefCell<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new units of `asset` in `owner`'s account
    pub fn mint(&self, owner: &AccountId, asset: &Asset, amount: u64) -> Result<()> {
        self.write(|state| state.credit(owner, asset, amount))
    }

    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> T {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut LedgerState) -> T) -> T {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.read(|state| f.debug_struct("InMemoryLedger").field("state", state).finish())
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, owner: &AccountId, asset: &Asset) -> u64 {
        self.read(|state| state.balance(owner, asset))
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId, asset: &Asset) -> u64 {
        self.read(|state| state.allowance(owner, spender, asset))
    }

    fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &Asset,
        amount: u64,
    ) -> Result<()> {
        trace!("approve {} -> {} for {} of {}", owner, spender, amount, asset);
        self.write(|state| state.set_allowance(owner, spender, asset, amount));
        Ok(())
    }

    fn increase_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &Asset,
        added: u64,
    ) -> Result<u64> {
        self.write(|state| {
            let updated = state
                .allowance(owner, spender, asset)
                .checked_add(added)
                .ok_or(FundError::MathOverflow)?;
            state.set_allowance(owner, spender, asset, updated);
            Ok(updated)
        })
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        asset: &Asset,
        amount: u64,
    ) -> Result<()> {
        trace!("transfer {} of {} from {} to {}", amount, asset, from, to);
        self.write(|state| state.move_balance(from, to, asset, amount))
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        asset: &Asset,
        amount: u64,
    ) -> Result<()> {
        trace!(
            "transfer_from by {}: {} of {} from {} to {}",
            spender, amount, asset, from, to
        );
        self.write(|state| {
            let allowed = state.allowance(from, spender, asset);
            if allowed < amount {
                return Err(FundError::InsufficientAllowance {
                    needed: amount,
                    available: allowed,
                });
            }

            state.move_balance(from, to, asset, amount)?;
            state.set_allowance(from, spender, asset, allowed - amount);
            Ok(())
        })
    }

    fn checkpoint(&self) -> LedgerCheckpoint {
        LedgerCheckpoint::new(self.read(LedgerState::clone))
    }

    fn transact<'a>(&self, body: Box<dyn FnOnce() -> Result<()> + 'a>) -> Result<()> {
        let guard = self.state.lock();
        let before = guard.borrow().clone();

        body().inspect_err(|e| {
            debug!("ledger transaction rolled back: {}", e);
            *guard.borrow_mut() = before;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    fn setup() -> (InMemoryLedger, AccountId, AccountId, Asset) {
        let ledger = InMemoryLedger::new();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let usdc = Pubkey::new_unique();
        ledger.mint(&alice, &usdc, 1_000).unwrap();
        (ledger, alice, bob, usdc)
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (ledger, alice, bob, usdc) = setup();

        ledger.transfer(&alice, &bob, &usdc, 400).unwrap();

        assert_eq!(ledger.balance_of(&alice, &usdc), 600);
        assert_eq!(ledger.balance_of(&bob, &usdc), 400);
    }

    #[test]
    fn test_transfer_insufficient_balance_leaves_state() {
        let (ledger, alice, bob, usdc) = setup();

        let result = ledger.transfer(&alice, &bob, &usdc, 1_001);

        assert!(matches!(
            result,
            Err(FundError::InsufficientBalance {
                needed: 1_001,
                available: 1_000
            })
        ));
        assert_eq!(ledger.balance_of(&alice, &usdc), 1_000);
        assert_eq!(ledger.balance_of(&bob, &usdc), 0);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (ledger, alice, bob, usdc) = setup();
        let spender = Pubkey::new_unique();

        ledger.approve(&alice, &spender, &usdc, 500).unwrap();
        ledger
            .transfer_from(&spender, &alice, &bob, &usdc, 300)
            .unwrap();

        assert_eq!(ledger.allowance(&alice, &spender, &usdc), 200);
        assert_eq!(ledger.balance_of(&bob, &usdc), 300);
    }

    #[test]
    fn test_transfer_from_without_allowance() {
        let (ledger, alice, bob, usdc) = setup();
        let spender = Pubkey::new_unique();

        let result = ledger.transfer_from(&spender, &alice, &bob, &usdc, 1);

        assert!(matches!(
            result,
            Err(FundError::InsufficientAllowance { needed: 1, available: 0 })
        ));
    }

    #[test]
    fn test_transfer_from_short_balance_keeps_allowance() {
        let (ledger, alice, bob, usdc) = setup();
        let spender = Pubkey::new_unique();

        ledger.approve(&alice, &spender, &usdc, 5_000).unwrap();
        let result = ledger.transfer_from(&spender, &alice, &bob, &usdc, 2_000);

        assert!(matches!(result, Err(FundError::InsufficientBalance { .. })));
        assert_eq!(ledger.allowance(&alice, &spender, &usdc), 5_000);
        assert_eq!(ledger.balance_of(&alice, &usdc), 1_000);
    }

    #[test]
    fn test_increase_allowance_accumulates() {
        let (ledger, alice, _, usdc) = setup();
        let spender = Pubkey::new_unique();

        assert_eq!(ledger.increase_allowance(&alice, &spender, &usdc, 10).unwrap(), 10);
        assert_eq!(ledger.increase_allowance(&alice, &spender, &usdc, 15).unwrap(), 25);
        assert_eq!(ledger.allowance(&alice, &spender, &usdc), 25);
    }

    #[test]
    fn test_failed_transaction_undoes_its_writes() {
        let (ledger, alice, bob, usdc) = setup();

        let result = ledger.transact(Box::new(|| {
            ledger.transfer(&alice, &bob, &usdc, 250)?;
            ledger.approve(&alice, &bob, &usdc, 99)?;
            ledger.transfer(&alice, &bob, &usdc, 5_000)
        }));

        assert!(matches!(result, Err(FundError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(&alice, &usdc), 1_000);
        assert_eq!(ledger.balance_of(&bob, &usdc), 0);
        assert_eq!(ledger.allowance(&alice, &bob, &usdc), 0);
    }

    #[test]
    fn test_successful_transaction_keeps_writes() {
        let (ledger, alice, bob, usdc) = setup();

        ledger
            .transact(Box::new(|| ledger.transfer(&alice, &bob, &usdc, 250)))
            .unwrap();

        assert_eq!(ledger.balance_of(&bob, &usdc), 250);
    }

    #[test]
    fn test_other_threads_wait_for_transaction() {
        let (ledger, alice, bob, usdc) = setup();
        let ledger = Arc::new(ledger);
        let bystander = Pubkey::new_unique();
        let barrier = Arc::new(Barrier::new(2));

        let minter = {
            let (ledger, barrier) = (ledger.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                ledger.mint(&bystander, &usdc, 777).unwrap();
            })
        };

        let result = ledger.transact(Box::new(|| {
            ledger.transfer(&alice, &bob, &usdc, 100)?;
            barrier.wait();
            // Give the minter time to hit the lock
            thread::sleep(Duration::from_millis(20));
            Err(FundError::NoRouteAvailable)
        }));
        minter.join().unwrap();

        assert!(result.is_err());
        assert_eq!(ledger.balance_of(&bob, &usdc), 0);
        assert_eq!(ledger.balance_of(&bystander, &usdc), 777);
    }

    #[test]
    fn test_mint_overflow() {
        let (ledger, alice, _, usdc) = setup();
        let result = ledger.mint(&alice, &usdc, u64::MAX);
        assert!(matches!(result, Err(FundError::MathOverflow)));
        assert_eq!(ledger.balance_of(&alice, &usdc), 1_000);
    }
}
