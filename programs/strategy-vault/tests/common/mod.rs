#![allow(dead_code)]

use anchor_lang::prelude::*;
use strategy_vault::{
    adapters::{Accountant, StrategyAdapter},
    errors::VaultError,
    state::{StrategyRegistry, VaultConfig, VaultState},
};

pub const NOW: i64 = 1_700_000_000;
pub const UNLOCK_PERIOD: u64 = 1_000;

pub fn new_vault(config: VaultConfig) -> (VaultState, StrategyRegistry) {
    let mut state = VaultState::default();
    state.apply_config(&config).unwrap();
    (state, StrategyRegistry::default())
}

pub fn default_config() -> VaultConfig {
    VaultConfig {
        profit_max_unlock_time: UNLOCK_PERIOD,
        ..VaultConfig::default()
    }
}

/// In-memory strategy. `value` is what it reports, `liquidity` bounds what
/// it frees.
pub struct MockStrategy {
    pub key: Pubkey,
    pub value: u64,
    pub liquidity: u64,
    pub deposit_cap: u64,
    pub failing: bool,
}

impl MockStrategy {
    pub fn new() -> Self {
        Self {
            key: Pubkey::new_unique(),
            value: 0,
            liquidity: u64::MAX,
            deposit_cap: u64::MAX,
            failing: false,
        }
    }
}

impl StrategyAdapter for MockStrategy {
    fn strategy(&self) -> Pubkey {
        self.key
    }

    fn deposit_up_to(&mut self, amount: u64) -> Result<u64> {
        let accepted = amount.min(self.deposit_cap);
        self.value += accepted;
        Ok(accepted)
    }

    fn free_up_to(&mut self, amount: u64) -> Result<u64> {
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

#[derive(Default)]
pub struct MockAccountant {
    pub balance: u64,
    pub allowance: u64,
}

impl Accountant for MockAccountant {
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
        Ok(())
    }
}
