//! Allocation and accounting engine.
//!
//! `Vault` ties the vault ledger to its strategy registry. Every operation
//! leaves `total_idle + total_debt == total_assets` and
//! `sum(current_debt) == total_debt`; `check_invariants` asserts both after
//! each mutation.

use anchor_lang::prelude::*;

use crate::{
    errors::VaultError,
    math::checked_sub,
    state::{StrategyRegistry, VaultState},
};

pub mod debt;
pub mod flows;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use debt::*;
pub use flows::*;
pub use report::*;

pub struct Vault<'a> {
    pub state: &'a mut VaultState,
    pub registry: &'a mut StrategyRegistry,
}

impl<'a> Vault<'a> {
    pub fn new(state: &'a mut VaultState, registry: &'a mut StrategyRegistry) -> Self {
        Self { state, registry }
    }

    /// Run `f` with the reentrancy flag held. The flag is cleared on every
    /// exit path.
    pub(crate) fn non_reentrant<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        require!(!self.state.locked, VaultError::Reentrancy);
        self.state.locked = true;
        let result = f(self);
        self.state.locked = false;
        result
    }

    pub fn check_invariants(&self) -> Result<()> {
        require!(
            self.registry.total_debt()? == self.state.total_debt,
            VaultError::AccountingInvariantViolated
        );
        require!(
            self.registry.strategies.len() == self.registry.withdraw_queue.len(),
            VaultError::AccountingInvariantViolated
        );
        require!(
            self.state.profit_lock.locked_shares <= self.state.total_shares,
            VaultError::AccountingInvariantViolated
        );
        self.state.total_assets()?;
        Ok(())
    }

    pub fn add_strategy(&mut self, strategy: Pubkey, program: Pubkey, now: i64) -> Result<()> {
        self.registry.add(strategy, program, now)?;
        self.check_invariants()
    }

    /// Remove a strategy. Debt still outstanding is written off as a loss
    /// and returned.
    pub fn revoke_strategy(&mut self, strategy: &Pubkey) -> Result<u64> {
        let loss = self.registry.get(strategy)?.current_debt;
        let total_debt = checked_sub(self.state.total_debt, loss)?;

        self.registry.remove(strategy)?;
        self.state.total_debt = total_debt;

        self.check_invariants()?;
        Ok(loss)
    }

    pub fn update_max_debt(&mut self, strategy: &Pubkey, max_debt: u64) -> Result<()> {
        self.registry.get_mut(strategy)?.max_debt = max_debt;
        Ok(())
    }

    pub fn set_withdraw_queue(&mut self, entries: &[Option<Pubkey>]) -> Result<()> {
        self.registry.set_withdraw_queue(entries)?;
        self.check_invariants()
    }

    /// Change the nominal profit vesting period. Setting it to zero releases
    /// everything at once: returns the vault-held shares that must be burned.
    pub fn set_profit_max_unlock_time(&mut self, period: u64) -> Result<u64> {
        require!(
            period <= crate::constants::MAX_PROFIT_UNLOCK_PERIOD,
            VaultError::InvalidUnlockPeriod
        );

        let mut burned = 0;
        if period == 0 {
            burned = self.state.profit_lock.clear();
            self.state.total_shares = checked_sub(self.state.total_shares, burned)?;
        }
        self.state.profit_lock.max_unlock_period = period;

        self.check_invariants()?;
        Ok(burned)
    }
}
