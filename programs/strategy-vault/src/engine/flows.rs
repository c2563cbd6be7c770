use anchor_lang::prelude::*;

use crate::{
    adapters::{find_adapter, StrategyAdapter},
    engine::Vault,
    errors::VaultError,
    math::{checked_add, checked_sub, Rounding},
};

/// Result of a withdrawal
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Withdrawal {
    /// Shares to burn from the owner
    pub shares: u64,
    /// Assets freed per strategy while covering the shortfall
    pub pulled: Vec<(Pubkey, u64)>,
}

impl<'a> Vault<'a> {
    /// Book a deposit of `assets` and return the shares to mint.
    ///
    /// No strategy is touched: assets stay idle until debt is allocated.
    pub fn deposit(&mut self, assets: u64, now: i64) -> Result<u64> {
        require!(assets > 0, VaultError::ZeroAmount);
        require!(
            assets <= self.state.max_deposit()?,
            VaultError::ExceededMaxDeposit
        );

        let shares = self.state.convert_to_shares(assets, now, Rounding::Down)?;
        require!(shares > 0, VaultError::ZeroShares);

        self.state.total_idle = checked_add(self.state.total_idle, assets)?;
        self.state.total_shares = checked_add(self.state.total_shares, shares)?;

        self.check_invariants()?;
        Ok(shares)
    }

    /// Book a withdrawal of `assets` for an owner holding `owner_shares`.
    ///
    /// Idle assets are used first; any shortfall is freed from strategies in
    /// withdraw-queue order. Either the full amount becomes idle or the
    /// withdrawal fails.
    pub fn withdraw<S: StrategyAdapter>(
        &mut self,
        assets: u64,
        owner_shares: u64,
        adapters: &mut [S],
        now: i64,
    ) -> Result<Withdrawal> {
        self.non_reentrant(|vault| vault.withdraw_unguarded(assets, owner_shares, adapters, now))
    }

    fn withdraw_unguarded<S: StrategyAdapter>(
        &mut self,
        assets: u64,
        owner_shares: u64,
        adapters: &mut [S],
        now: i64,
    ) -> Result<Withdrawal> {
        require!(assets > 0, VaultError::ZeroAmount);
        require!(
            assets <= self.state.max_withdraw(owner_shares, now)?,
            VaultError::ExceededMaxWithdraw
        );

        // Priced before any strategy is touched
        let shares = self.state.convert_to_shares(assets, now, Rounding::Up)?;
        require!(shares > 0, VaultError::ZeroShares);
        require!(shares <= owner_shares, VaultError::ExceededMaxWithdraw);

        let mut pulled = Vec::new();
        if assets > self.state.total_idle {
            let mut shortfall = assets - self.state.total_idle;
            let queue = self.registry.drain_order().to_vec();

            for strategy in queue.iter() {
                if shortfall == 0 {
                    break;
                }
                let current_debt = self.registry.get(strategy)?.current_debt;
                let request = shortfall.min(current_debt);
                if request == 0 {
                    continue;
                }

                let adapter = find_adapter(adapters, strategy)
                    .ok_or(error!(VaultError::StrategyAccountsMissing))?;
                let freed = adapter.free_up_to(request)?;
                if freed == 0 {
                    // Illiquid for now, try the next one
                    continue;
                }

                let repaid = freed.min(current_debt);
                self.state.total_idle = checked_add(self.state.total_idle, freed)?;
                self.state.total_debt = checked_sub(self.state.total_debt, repaid)?;
                self.registry.get_mut(strategy)?.current_debt = current_debt - repaid;
                shortfall = shortfall.saturating_sub(freed);
                pulled.push((*strategy, freed));
            }
        }

        require!(
            self.state.total_idle >= assets,
            VaultError::InsufficientLiquidity
        );

        self.state.total_idle -= assets;
        self.state.total_shares = checked_sub(self.state.total_shares, shares)?;

        self.check_invariants()?;
        Ok(Withdrawal { shares, pulled })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testing::*;
    use crate::engine::Vault;
    use crate::errors::VaultError;
    use anchor_lang::prelude::*;

    #[test]
    fn test_deposit_mints_at_current_price() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);

        assert_eq!(vault.deposit(1_000, NOW).unwrap(), 1_000);
        // Simulate a realized gain: 1000 shares now back 2000 assets
        vault.state.total_idle = 2_000;
        assert_eq!(vault.deposit(500, NOW).unwrap(), 250);
        assert_eq!(vault.state.total_shares, 1_250);
        assert_eq!(vault.state.total_idle, 2_500);
    }

    #[test]
    fn test_deposit_limits() {
        let (mut state, mut registry) = new_vault();
        state.deposit_limit = 1_000;
        let mut vault = Vault::new(&mut state, &mut registry);

        assert_eq!(
            vault.deposit(0, NOW).unwrap_err(),
            error!(VaultError::ZeroAmount)
        );
        assert_eq!(
            vault.deposit(1_001, NOW).unwrap_err(),
            error!(VaultError::ExceededMaxDeposit)
        );
        vault.deposit(1_000, NOW).unwrap();
        assert_eq!(
            vault.deposit(1, NOW).unwrap_err(),
            error!(VaultError::ExceededMaxDeposit)
        );
    }

    #[test]
    fn test_withdraw_from_idle_only() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        let mut strategies: Vec<FakeStrategy> = Vec::new();

        vault.deposit(1_000, NOW).unwrap();
        let withdrawal = vault.withdraw(400, 1_000, &mut strategies, NOW).unwrap();
        assert_eq!(withdrawal.shares, 400);
        assert!(withdrawal.pulled.is_empty());
        assert_eq!(vault.state.total_idle, 600);
        assert_eq!(vault.state.total_shares, 600);
        assert!(!vault.state.locked);
    }

    #[test]
    fn test_withdraw_rejects_more_than_owner_holds() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        let mut strategies: Vec<FakeStrategy> = Vec::new();

        vault.deposit(1_000, NOW).unwrap();
        assert_eq!(
            vault
                .withdraw(101, 100, &mut strategies, NOW)
                .unwrap_err(),
            error!(VaultError::ExceededMaxWithdraw)
        );

        vault.state.withdraw_limit = 50;
        assert_eq!(
            vault.withdraw(60, 100, &mut strategies, NOW).unwrap_err(),
            error!(VaultError::ExceededMaxWithdraw)
        );
        assert_eq!(vault.state.total_idle, 1_000);
    }

    #[test]
    fn test_withdraw_skips_illiquid_strategy() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        let mut first = FakeStrategy::new(u64::MAX);
        let mut second = FakeStrategy::new(u64::MAX);
        for s in [&first, &second] {
            vault.add_strategy(s.key, Pubkey::new_unique(), NOW).unwrap();
            vault.update_max_debt(&s.key, 1_000).unwrap();
        }
        vault.deposit(1_000, NOW).unwrap();
        vault.update_debt(&mut first, 500).unwrap();
        vault.update_debt(&mut second, 500).unwrap();
        first.liquidity = 0;

        let mut strategies = vec![first, second];
        let withdrawal = vault.withdraw(300, 1_000, &mut strategies, NOW).unwrap();
        assert_eq!(withdrawal.pulled, vec![(strategies[1].key, 300)]);
        assert_eq!(vault.registry.get(&strategies[0].key).unwrap().current_debt, 500);
        assert_eq!(vault.registry.get(&strategies[1].key).unwrap().current_debt, 200);
        assert_eq!(vault.state.total_debt, 700);
    }

    #[test]
    fn test_withdraw_fails_without_enough_liquidity() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        let mut strategy = FakeStrategy::new(u64::MAX);
        vault.add_strategy(strategy.key, Pubkey::new_unique(), NOW).unwrap();
        vault.update_max_debt(&strategy.key, 1_000).unwrap();
        vault.deposit(1_000, NOW).unwrap();
        vault.update_debt(&mut strategy, 1_000).unwrap();
        strategy.liquidity = 100;

        let mut strategies = vec![strategy];
        assert_eq!(
            vault.withdraw(500, 1_000, &mut strategies, NOW).unwrap_err(),
            error!(VaultError::InsufficientLiquidity)
        );
        assert!(!vault.state.locked);
    }

    #[test]
    fn test_withdraw_requires_accounts_for_queued_strategy() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        let mut strategy = FakeStrategy::new(u64::MAX);
        vault.add_strategy(strategy.key, Pubkey::new_unique(), NOW).unwrap();
        vault.update_max_debt(&strategy.key, 1_000).unwrap();
        vault.deposit(1_000, NOW).unwrap();
        vault.update_debt(&mut strategy, 800).unwrap();

        let mut none: Vec<FakeStrategy> = Vec::new();
        assert_eq!(
            vault.withdraw(500, 1_000, &mut none, NOW).unwrap_err(),
            error!(VaultError::StrategyAccountsMissing)
        );
    }

    #[test]
    fn test_parked_strategies_are_not_drained() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        let mut strategy = FakeStrategy::new(u64::MAX);
        vault.add_strategy(strategy.key, Pubkey::new_unique(), NOW).unwrap();
        vault.update_max_debt(&strategy.key, 1_000).unwrap();
        vault.deposit(1_000, NOW).unwrap();
        vault.update_debt(&mut strategy, 800).unwrap();
        vault.set_withdraw_queue(&[None, Some(strategy.key)]).unwrap();

        let mut strategies = vec![strategy];
        assert_eq!(
            vault.withdraw(500, 1_000, &mut strategies, NOW).unwrap_err(),
            error!(VaultError::InsufficientLiquidity)
        );
        assert!(strategies[0].free_calls.is_empty());
    }
}
