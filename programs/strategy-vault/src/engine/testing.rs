use anchor_lang::prelude::*;

use crate::{
    adapters::{Accountant, StrategyAdapter},
    errors::VaultError,
    state::{StrategyRegistry, VaultConfig, VaultState},
};

pub const NOW: i64 = 1_700_000_000;

pub fn new_vault() -> (VaultState, StrategyRegistry) {
    let mut state = VaultState::default();
    state
        .apply_config(&VaultConfig {
            profit_max_unlock_time: 1_000,
            ..VaultConfig::default()
        })
        .unwrap();
    (state, StrategyRegistry::default())
}

/// Deterministic strategy: holds `value`, frees at most `liquidity`
pub struct FakeStrategy {
    pub key: Pubkey,
    pub value: u64,
    pub liquidity: u64,
    pub deposit_cap: u64,
    pub failing: bool,
    pub free_calls: Vec<u64>,
}

impl FakeStrategy {
    pub fn new(deposit_cap: u64) -> Self {
        Self {
            key: Pubkey::new_unique(),
            value: 0,
            liquidity: u64::MAX,
            deposit_cap,
            failing: false,
            free_calls: Vec::new(),
        }
    }
}

impl StrategyAdapter for FakeStrategy {
    fn strategy(&self) -> Pubkey {
        self.key
    }

    fn deposit_up_to(&mut self, amount: u64) -> Result<u64> {
        let accepted = amount.min(self.deposit_cap);
        self.value += accepted;
        Ok(accepted)
    }

    fn free_up_to(&mut self, amount: u64) -> Result<u64> {
        self.free_calls.push(amount);
        let freed = amount.min(self.liquidity).min(self.value);
        self.value -= freed;
        self.liquidity = self.liquidity.saturating_sub(freed);
        Ok(freed)
    }

    fn report_value(&mut self) -> Result<u64> {
        if self.failing {
            return err!(VaultError::InvalidStrategyResponse);
        }
        Ok(self.value)
    }

    fn max_deposit(&mut self) -> Result<u64> {
        Ok(self.deposit_cap)
    }

    fn max_withdraw(&mut self) -> Result<u64> {
        Ok(self.liquidity.min(self.value))
    }
}

/// Accountant with a balance and an allowance granted to the vault
#[derive(Default)]
pub struct FakeAccountant {
    pub balance: u64,
    pub allowance: u64,
    pub pulled: u64,
}

impl Accountant for FakeAccountant {
    fn available_refund(&mut self) -> Result<u64> {
        Ok(self.balance.min(self.allowance))
    }

    fn pull_refund(&mut self, amount: u64) -> Result<()> {
        require!(
            amount <= self.balance.min(self.allowance),
            VaultError::InsufficientLiquidity
        );
        self.balance -= amount;
        self.allowance -= amount;
        self.pulled += amount;
        Ok(())
    }
}
