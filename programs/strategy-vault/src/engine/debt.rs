use anchor_lang::prelude::*;

use crate::{
    adapters::StrategyAdapter,
    engine::Vault,
    errors::VaultError,
    math::{checked_add, checked_sub},
};

/// Outcome of a debt rebalance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebtUpdate {
    pub strategy: Pubkey,
    pub previous_debt: u64,
    pub new_debt: u64,
}

/// Outcome of an emergency withdrawal. `from_idle + freed` leaves the vault.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmergencyRelease {
    pub from_idle: u64,
    pub freed: u64,
    pub written_off: u64,
}

impl<'a> Vault<'a> {
    /// Move assets between idle and a strategy so its debt approaches
    /// `target`, respecting `minimum_total_idle` and the adapter's limits.
    pub fn update_debt<S: StrategyAdapter>(
        &mut self,
        adapter: &mut S,
        target: u64,
    ) -> Result<DebtUpdate> {
        self.non_reentrant(|vault| vault.update_debt_unguarded(adapter, target))
    }

    fn update_debt_unguarded<S: StrategyAdapter>(
        &mut self,
        adapter: &mut S,
        target: u64,
    ) -> Result<DebtUpdate> {
        let strategy = adapter.strategy();
        let record = self.registry.get(&strategy)?;
        let current = record.current_debt;
        let max_debt = record.max_debt;
        require!(target != current, VaultError::DebtUnchanged);

        let idle = self.state.total_idle;
        let minimum_idle = self.state.minimum_total_idle;

        let new_debt = if target < current {
            let mut to_free = current - target;
            // Refill the idle floor even if that means going below target
            if idle.saturating_add(to_free) < minimum_idle {
                to_free = (minimum_idle - idle).min(current);
            }
            to_free = to_free.min(adapter.max_withdraw()?);
            require!(to_free > 0, VaultError::NothingToWithdraw);

            let freed = adapter.free_up_to(to_free)?;
            let repaid = freed.min(current);
            self.state.total_idle = checked_add(self.state.total_idle, freed)?;
            self.state.total_debt = checked_sub(self.state.total_debt, repaid)?;
            current - repaid
        } else {
            require!(target <= max_debt, VaultError::DebtCapExceeded);

            let offered = (target - current)
                .min(adapter.max_deposit()?)
                .min(idle.saturating_sub(minimum_idle));
            if offered == 0 {
                return Ok(DebtUpdate {
                    strategy,
                    previous_debt: current,
                    new_debt: current,
                });
            }

            let accepted = adapter.deposit_up_to(offered)?;
            require!(accepted <= offered, VaultError::InvalidStrategyResponse);
            self.state.total_idle = checked_sub(self.state.total_idle, accepted)?;
            self.state.total_debt = checked_add(self.state.total_debt, accepted)?;
            checked_add(current, accepted)?
        };

        self.registry.get_mut(&strategy)?.current_debt = new_debt;
        self.check_invariants()?;

        Ok(DebtUpdate {
            strategy,
            previous_debt: current,
            new_debt,
        })
    }

    /// Release up to `idle_amount` of idle assets and write off up to
    /// `strategy_amount` of one strategy's debt.
    ///
    /// When an adapter is given it is asked to free the written-off amount
    /// first; whatever it frees leaves the vault with the idle release.
    /// Without an adapter the debt is written off blind.
    pub fn emergency_withdraw<S: StrategyAdapter>(
        &mut self,
        idle_amount: u64,
        strategy: Option<&Pubkey>,
        strategy_amount: u64,
        adapter: Option<&mut S>,
    ) -> Result<EmergencyRelease> {
        self.non_reentrant(|vault| {
            vault.emergency_withdraw_unguarded(idle_amount, strategy, strategy_amount, adapter)
        })
    }

    fn emergency_withdraw_unguarded<S: StrategyAdapter>(
        &mut self,
        idle_amount: u64,
        strategy: Option<&Pubkey>,
        strategy_amount: u64,
        adapter: Option<&mut S>,
    ) -> Result<EmergencyRelease> {
        let from_idle = idle_amount.min(self.state.total_idle);

        let (written_off, freed) = match strategy {
            Some(strategy) => {
                let current = self.registry.get(strategy)?.current_debt;
                let written_off = strategy_amount.min(current);

                let freed = match adapter {
                    Some(adapter) if written_off > 0 => {
                        require_keys_eq!(
                            adapter.strategy(),
                            *strategy,
                            VaultError::InvalidStrategyAccounts
                        );
                        adapter.free_up_to(written_off)?
                    }
                    _ => 0,
                };

                self.registry.get_mut(strategy)?.current_debt = current - written_off;
                self.state.total_debt = checked_sub(self.state.total_debt, written_off)?;
                (written_off, freed)
            }
            None => (0, 0),
        };

        require!(
            from_idle > 0 || written_off > 0,
            VaultError::ZeroAmount
        );
        self.state.total_idle -= from_idle;

        self.check_invariants()?;
        Ok(EmergencyRelease {
            from_idle,
            freed,
            written_off,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testing::*;
    use crate::engine::Vault;
    use crate::errors::VaultError;
    use anchor_lang::prelude::*;

    fn funded(
        state: &mut crate::state::VaultState,
        registry: &mut crate::state::StrategyRegistry,
        strategy: &FakeStrategy,
    ) {
        let mut vault = Vault::new(state, registry);
        vault.add_strategy(strategy.key, Pubkey::new_unique(), NOW).unwrap();
        vault.update_max_debt(&strategy.key, 1_000).unwrap();
        vault.deposit(1_000, NOW).unwrap();
    }

    #[test]
    fn test_increase_respects_minimum_idle() {
        let (mut state, mut registry) = new_vault();
        let mut strategy = FakeStrategy::new(u64::MAX);
        funded(&mut state, &mut registry, &strategy);
        state.minimum_total_idle = 300;

        let mut vault = Vault::new(&mut state, &mut registry);
        let update = vault.update_debt(&mut strategy, 1_000).unwrap();
        assert_eq!(update.previous_debt, 0);
        assert_eq!(update.new_debt, 700);
        assert_eq!(vault.state.total_idle, 300);
        assert_eq!(vault.state.total_debt, 700);
        assert_eq!(strategy.value, 700);

        // Floor already reached: no-op
        let update = vault.update_debt(&mut strategy, 1_000).unwrap();
        assert_eq!(update.new_debt, 700);
        assert!(!vault.state.locked);
    }

    #[test]
    fn test_increase_books_what_the_strategy_accepts() {
        let (mut state, mut registry) = new_vault();
        let mut strategy = FakeStrategy::new(250);
        funded(&mut state, &mut registry, &strategy);

        let mut vault = Vault::new(&mut state, &mut registry);
        let update = vault.update_debt(&mut strategy, 800).unwrap();
        assert_eq!(update.new_debt, 250);
        assert_eq!(vault.state.total_idle, 750);
    }

    #[test]
    fn test_increase_above_cap_fails() {
        let (mut state, mut registry) = new_vault();
        let mut strategy = FakeStrategy::new(u64::MAX);
        funded(&mut state, &mut registry, &strategy);

        let mut vault = Vault::new(&mut state, &mut registry);
        assert_eq!(
            vault.update_debt(&mut strategy, 1_001).unwrap_err(),
            error!(VaultError::DebtCapExceeded)
        );
        assert_eq!(
            vault.update_debt(&mut strategy, 0).unwrap_err(),
            error!(VaultError::DebtUnchanged)
        );
    }

    #[test]
    fn test_decrease_refills_minimum_idle() {
        let (mut state, mut registry) = new_vault();
        let mut strategy = FakeStrategy::new(u64::MAX);
        funded(&mut state, &mut registry, &strategy);

        let mut vault = Vault::new(&mut state, &mut registry);
        vault.update_debt(&mut strategy, 1_000).unwrap();
        vault.state.minimum_total_idle = 400;

        // Asked to free 100, frees 400 to restore the floor
        let update = vault.update_debt(&mut strategy, 900).unwrap();
        assert_eq!(update.new_debt, 600);
        assert_eq!(strategy.free_calls, vec![400]);
        assert_eq!(vault.state.total_idle, 400);
    }

    #[test]
    fn test_decrease_capped_by_liquidity() {
        let (mut state, mut registry) = new_vault();
        let mut strategy = FakeStrategy::new(u64::MAX);
        funded(&mut state, &mut registry, &strategy);

        let mut vault = Vault::new(&mut state, &mut registry);
        vault.update_debt(&mut strategy, 1_000).unwrap();
        strategy.liquidity = 200;
        let update = vault.update_debt(&mut strategy, 0).unwrap();
        assert_eq!(update.new_debt, 800);

        assert_eq!(
            vault.update_debt(&mut strategy, 0).unwrap_err(),
            error!(VaultError::NothingToWithdraw)
        );
        assert!(!vault.state.locked);
    }

    #[test]
    fn test_emergency_withdraw_with_unresponsive_strategy() {
        let (mut state, mut registry) = new_vault();
        let mut strategy = FakeStrategy::new(u64::MAX);
        funded(&mut state, &mut registry, &strategy);

        let mut vault = Vault::new(&mut state, &mut registry);
        vault.update_debt(&mut strategy, 600).unwrap();

        let release = vault
            .emergency_withdraw::<FakeStrategy>(1_000, Some(&strategy.key), 600, None)
            .unwrap();
        assert_eq!(
            release,
            crate::engine::EmergencyRelease {
                from_idle: 400,
                freed: 0,
                written_off: 600,
            }
        );
        assert_eq!(vault.state.total_idle, 0);
        assert_eq!(vault.state.total_debt, 0);
        assert!(strategy.free_calls.is_empty());
    }

    #[test]
    fn test_emergency_withdraw_forwards_freed_assets() {
        let (mut state, mut registry) = new_vault();
        let mut strategy = FakeStrategy::new(u64::MAX);
        funded(&mut state, &mut registry, &strategy);

        let mut vault = Vault::new(&mut state, &mut registry);
        vault.update_debt(&mut strategy, 600).unwrap();
        strategy.liquidity = 250;

        let key = strategy.key;
        let release = vault
            .emergency_withdraw(0, Some(&key), 300, Some(&mut strategy))
            .unwrap();
        assert_eq!(release.freed, 250);
        assert_eq!(release.written_off, 300);
        assert_eq!(vault.state.total_idle, 400);
        assert_eq!(vault.registry.get(&key).unwrap().current_debt, 300);
    }

    #[test]
    fn test_emergency_withdraw_with_nothing_to_release_fails() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        assert_eq!(
            vault
                .emergency_withdraw::<FakeStrategy>(100, None, 0, None)
                .unwrap_err(),
            error!(VaultError::ZeroAmount)
        );
    }
}
