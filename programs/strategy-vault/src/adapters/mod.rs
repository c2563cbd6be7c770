//! Capabilities the vault consumes from its external collaborators.
//!
//! The engine only talks to strategies and the accountant through these
//! traits. On chain they are backed by CPI (`cpi`), in tests by fakes.

use anchor_lang::prelude::*;

pub mod cpi;

pub use cpi::*;

/// A yield source the vault lends assets to
pub trait StrategyAdapter {
    /// Identity of the strategy (its state account)
    fn strategy(&self) -> Pubkey;

    /// Offer up to `amount` assets, returns what the strategy actually took
    fn deposit_up_to(&mut self, amount: u64) -> Result<u64>;

    /// Ask for up to `amount` assets back, returns what was actually freed
    fn free_up_to(&mut self, amount: u64) -> Result<u64>;

    /// Current value the strategy holds on the vault's behalf
    fn report_value(&mut self) -> Result<u64>;

    fn max_deposit(&mut self) -> Result<u64>;

    fn max_withdraw(&mut self) -> Result<u64>;
}

/// Fee recipient and refund source for strategy losses
pub trait Accountant {
    /// Refund liquidity the vault may pull, bounded by balance and allowance
    fn available_refund(&mut self) -> Result<u64>;

    /// Move `amount` of refund into the vault's idle custody
    fn pull_refund(&mut self, amount: u64) -> Result<()>;
}

/// Adapter for `strategy` among the ones supplied to an instruction
pub fn find_adapter<'a, S: StrategyAdapter>(
    adapters: &'a mut [S],
    strategy: &Pubkey,
) -> Option<&'a mut S> {
    adapters.iter_mut().find(|a| a.strategy() == *strategy)
}
