use anchor_lang::prelude::*;

use crate::{
    adapters::{find_adapter, Accountant, StrategyAdapter},
    engine::Vault,
    errors::VaultError,
    math::{apply_bps, checked_add, checked_sub, mul_div, Rounding},
};

/// Profit/loss reconciliation of one strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyReport {
    pub strategy: Pubkey,
    pub gain: u64,
    pub loss: u64,
    /// Strategy debt after the report
    pub current_debt: u64,
    pub fee_assets: u64,
    /// Shares to mint to the accountant
    pub fee_shares: u64,
    /// Assets pulled from the accountant into idle
    pub refund: u64,
    /// Shares to mint to the vault share account
    pub shares_minted_to_vault: u64,
    /// Shares to burn from the vault share account
    pub shares_burned_from_vault: u64,
}

/// Outcome of a batch harvest
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub reports: Vec<StrategyReport>,
    pub skipped: Vec<Pubkey>,
}

impl<'a> Vault<'a> {
    /// Reconcile a strategy's reported value with its debt.
    ///
    /// Gains are locked as vault-held shares vesting over
    /// `max_unlock_period`; fees and losses are taken out of those shares
    /// first. Refunds from the accountant offset losses. The report is
    /// applied all at once: on error nothing changes.
    pub fn process_report<S: StrategyAdapter, A: Accountant>(
        &mut self,
        adapter: &mut S,
        accountant: Option<&mut A>,
        now: i64,
    ) -> Result<StrategyReport> {
        self.non_reentrant(|vault| vault.report_atomic(adapter, accountant, now))
    }

    /// Report every registered strategy in registry order. A strategy whose
    /// report fails, or whose accounts were not supplied, is skipped.
    pub fn harvest_all<S: StrategyAdapter, A: Accountant>(
        &mut self,
        adapters: &mut [S],
        mut accountant: Option<&mut A>,
        now: i64,
    ) -> Result<HarvestSummary> {
        self.non_reentrant(|vault| {
            let mut summary = HarvestSummary::default();
            let keys: Vec<Pubkey> = vault.registry.strategies.iter().map(|s| s.strategy).collect();

            for key in keys {
                let Some(adapter) = find_adapter(adapters, &key) else {
                    msg!("Harvest skipped {}: accounts not supplied", key);
                    summary.skipped.push(key);
                    continue;
                };

                match vault.report_atomic(adapter, accountant.as_deref_mut(), now) {
                    Ok(report) => summary.reports.push(report),
                    Err(e) => {
                        msg!("Harvest skipped {}: {}", key, e);
                        summary.skipped.push(key);
                    }
                }
            }
            Ok(summary)
        })
    }

    /// Run one report against copies of the ledger and commit them only if
    /// every step succeeded
    fn report_atomic<S: StrategyAdapter, A: Accountant>(
        &mut self,
        adapter: &mut S,
        mut accountant: Option<&mut A>,
        now: i64,
    ) -> Result<StrategyReport> {
        let mut state = self.state.clone();
        let mut registry = self.registry.clone();

        let report = {
            let mut draft = Vault::new(&mut state, &mut registry);
            let report = draft.report_unguarded(adapter, accountant.as_deref_mut(), now)?;
            draft.check_invariants()?;
            report
        };

        // Refund tokens move only once the draft is known to commit
        if report.refund > 0 {
            let accountant = accountant.ok_or(error!(VaultError::InvalidAccountant))?;
            accountant.pull_refund(report.refund)?;
        }

        *self.state = state;
        *self.registry = registry;
        Ok(report)
    }

    fn report_unguarded<S: StrategyAdapter, A: Accountant>(
        &mut self,
        adapter: &mut S,
        accountant: Option<&mut A>,
        now: i64,
    ) -> Result<StrategyReport> {
        let strategy = adapter.strategy();
        let current_debt = self.registry.get(&strategy)?.current_debt;

        let value = adapter.report_value()?;
        let (gain, loss) = if value >= current_debt {
            (value - current_debt, 0)
        } else {
            (0, current_debt - value)
        };

        let fee = if self.state.has_accountant() && accountant.is_some() {
            apply_bps(gain, self.state.protocol_fee_bps)?
        } else {
            0
        };
        let refund = match accountant {
            Some(accountant) if loss > 0 => loss.min(accountant.available_refund()?),
            _ => 0,
        };

        // Priced before the report touches assets
        let to_burn = checked_add(loss, fee)?;
        let shares_to_burn = self.state.convert_to_shares(to_burn, now, Rounding::Up)?;
        let fee_shares = if fee > 0 {
            mul_div(shares_to_burn, fee, to_burn, Rounding::Down)?
        } else {
            0
        };

        let locking = self.state.profit_lock.max_unlock_period > 0;
        let to_lock = checked_add(gain, refund)?;
        let mut shares_to_lock = if locking && to_lock > 0 {
            self.state.convert_to_shares(to_lock, now, Rounding::Down)?
        } else {
            0
        };

        let total_shares = self.state.total_shares as i128;
        let ending_supply = total_shares + shares_to_lock as i128
            - shares_to_burn as i128
            - self.state.unlocked_shares(now) as i128;

        let (mut minted, mut burned) = (0u64, 0u64);
        if ending_supply > total_shares {
            minted = u64::try_from(ending_supply - total_shares)
                .map_err(|_| error!(VaultError::MathOverflow))?;
            self.state.total_shares = checked_add(self.state.total_shares, minted)?;
            self.state.profit_lock.locked_shares =
                checked_add(self.state.profit_lock.locked_shares, minted)?;
        } else if ending_supply < total_shares {
            let excess = u64::try_from(total_shares - ending_supply)
                .map_err(|_| error!(VaultError::MathOverflow))?;
            burned = excess.min(self.state.profit_lock.locked_shares);
            self.state.total_shares = checked_sub(self.state.total_shares, burned)?;
            self.state.profit_lock.locked_shares -= burned;
        }

        // Fees and losses never vest
        shares_to_lock = shares_to_lock.saturating_sub(shares_to_burn);

        // Booked here, pulled by the caller after the ledger checks out
        self.state.total_idle = checked_add(self.state.total_idle, refund)?;

        let new_debt = if gain > 0 {
            self.state.total_debt = checked_add(self.state.total_debt, gain)?;
            checked_add(current_debt, gain)?
        } else {
            self.state.total_debt = checked_sub(self.state.total_debt, loss)?;
            current_debt - loss
        };
        let record = self.registry.get_mut(&strategy)?;
        record.current_debt = new_debt;
        record.last_report = now;

        self.state.total_shares = checked_add(self.state.total_shares, fee_shares)?;

        let fee_assets = if to_burn > gain.saturating_add(refund) || !locking {
            self.state.convert_to_assets(fee_shares, now, Rounding::Down)?
        } else {
            fee
        };

        self.state.profit_lock.lock_new_shares(shares_to_lock, now)?;

        Ok(StrategyReport {
            strategy,
            gain,
            loss,
            current_debt: new_debt,
            fee_assets,
            fee_shares,
            refund,
            shares_minted_to_vault: minted,
            shares_burned_from_vault: burned,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testing::*;
    use crate::engine::Vault;
    use crate::errors::VaultError;
    use crate::state::{StrategyRegistry, VaultState};
    use anchor_lang::prelude::*;

    /// 1000 deposited, all of it lent to `strategy`
    fn deployed(fee_bps: u16) -> (VaultState, StrategyRegistry, FakeStrategy) {
        let (mut state, mut registry) = new_vault();
        state.protocol_fee_bps = fee_bps;
        state.accountant = Pubkey::new_unique();
        let mut strategy = FakeStrategy::new(u64::MAX);
        {
            let mut vault = Vault::new(&mut state, &mut registry);
            vault.add_strategy(strategy.key, Pubkey::new_unique(), NOW).unwrap();
            vault.update_max_debt(&strategy.key, u64::MAX).unwrap();
            vault.deposit(1_000, NOW).unwrap();
            vault.update_debt(&mut strategy, 1_000).unwrap();
        }
        (state, registry, strategy)
    }

    #[test]
    fn test_profit_locks_shares_and_pays_fee() {
        let (mut state, mut registry, mut strategy) = deployed(1_000);
        let mut accountant = FakeAccountant::default();
        let mut vault = Vault::new(&mut state, &mut registry);
        strategy.value = 1_100;

        let report = vault
            .process_report(&mut strategy, Some(&mut accountant), NOW)
            .unwrap();
        assert_eq!(report.gain, 100);
        assert_eq!(report.fee_assets, 10);
        assert_eq!(report.fee_shares, 10);
        assert_eq!(report.shares_minted_to_vault, 90);
        assert_eq!(report.current_debt, 1_100);

        assert_eq!(vault.state.total_shares, 1_100);
        assert_eq!(vault.state.profit_lock.locked_shares, 90);
        assert_eq!(vault.state.total_assets().unwrap(), 1_100);
        // No jump at harvest time
        assert_eq!(vault.state.price_per_share(1_000, NOW).unwrap(), 1_000);
        // 90 shares released after the full period
        assert_eq!(vault.state.effective_supply(NOW + 1_000).unwrap(), 1_010);
    }

    #[test]
    fn test_loss_offset_by_refund() {
        let (mut state, mut registry, mut strategy) = deployed(0);
        let mut accountant = FakeAccountant {
            balance: 500,
            allowance: 150,
            ..FakeAccountant::default()
        };
        let mut vault = Vault::new(&mut state, &mut registry);
        strategy.value = 800;

        let report = vault
            .process_report(&mut strategy, Some(&mut accountant), NOW)
            .unwrap();
        assert_eq!(report.loss, 200);
        assert_eq!(report.refund, 150);
        assert_eq!(report.shares_burned_from_vault, 0);
        assert_eq!(accountant.pulled, 150);
        assert_eq!(vault.state.total_idle, 150);
        assert_eq!(vault.state.total_debt, 800);
        assert_eq!(vault.state.total_assets().unwrap(), 950);
        assert_eq!(vault.state.total_shares, 1_000);
        assert_eq!(vault.state.profit_lock.locked_shares, 0);
    }

    #[test]
    fn test_loss_absorbed_by_locked_profit() {
        let (mut state, mut registry, mut strategy) = deployed(0);
        let mut vault = Vault::new(&mut state, &mut registry);

        strategy.value = 1_100;
        vault
            .process_report::<_, FakeAccountant>(&mut strategy, None, NOW)
            .unwrap();
        assert_eq!(vault.state.profit_lock.locked_shares, 100);

        strategy.value = 1_050;
        let report = vault
            .process_report::<_, FakeAccountant>(&mut strategy, None, NOW)
            .unwrap();
        assert_eq!(report.loss, 50);
        assert_eq!(report.shares_burned_from_vault, 50);
        assert_eq!(vault.state.profit_lock.locked_shares, 50);
        // Depositors keep their price
        assert_eq!(vault.state.price_per_share(1_000, NOW).unwrap(), 1_000);
    }

    #[test]
    fn test_second_report_without_change_is_neutral() {
        let (mut state, mut registry, mut strategy) = deployed(500);
        let mut accountant = FakeAccountant::default();
        let mut vault = Vault::new(&mut state, &mut registry);
        strategy.value = 1_200;

        vault
            .process_report(&mut strategy, Some(&mut accountant), NOW)
            .unwrap();
        let shares = vault.state.total_shares;

        let report = vault
            .process_report(&mut strategy, Some(&mut accountant), NOW + 10)
            .unwrap();
        assert_eq!((report.gain, report.loss, report.fee_shares), (0, 0, 0));
        assert_eq!(report.current_debt, 1_200);
        // Released shares are burned, nothing new is minted
        assert_eq!(report.shares_minted_to_vault, 0);
        assert_eq!(
            vault.state.total_shares,
            shares - report.shares_burned_from_vault
        );
    }

    #[test]
    fn test_no_fee_without_accountant() {
        let (mut state, mut registry, mut strategy) = deployed(1_000);
        state.accountant = Pubkey::default();
        let mut accountant = FakeAccountant::default();
        let mut vault = Vault::new(&mut state, &mut registry);
        strategy.value = 1_100;

        let report = vault
            .process_report(&mut strategy, Some(&mut accountant), NOW)
            .unwrap();
        assert_eq!(report.fee_shares, 0);
        assert_eq!(vault.state.profit_lock.locked_shares, 100);
    }

    #[test]
    fn test_profit_without_locking_raises_price_at_once() {
        let (mut state, mut registry, mut strategy) = deployed(0);
        let mut vault = Vault::new(&mut state, &mut registry);
        vault.set_profit_max_unlock_time(0).unwrap();
        strategy.value = 1_100;

        let report = vault
            .process_report::<_, FakeAccountant>(&mut strategy, None, NOW)
            .unwrap();
        assert_eq!(report.shares_minted_to_vault, 0);
        assert_eq!(vault.state.total_shares, 1_000);
        assert_eq!(vault.state.price_per_share(1_000, NOW).unwrap(), 1_100);
    }

    #[test]
    fn test_failed_report_changes_nothing() {
        let (mut state, mut registry, mut strategy) = deployed(0);
        let before = (state.clone(), registry.clone());
        let mut vault = Vault::new(&mut state, &mut registry);
        strategy.failing = true;

        assert_eq!(
            vault
                .process_report::<_, FakeAccountant>(&mut strategy, None, NOW)
                .unwrap_err(),
            error!(VaultError::InvalidStrategyResponse)
        );
        assert_eq!(vault.state.total_debt, before.0.total_debt);
        assert_eq!(vault.registry.strategies, before.1.strategies);
        assert!(!vault.state.locked);
    }

    #[test]
    fn test_rejected_report_pulls_no_refund() {
        let (mut state, mut registry, mut strategy) = deployed(0);
        // Ledger out of step with the registry: the report cannot commit
        state.total_debt += 1;
        let mut accountant = FakeAccountant {
            balance: 500,
            allowance: 150,
            ..FakeAccountant::default()
        };
        let mut vault = Vault::new(&mut state, &mut registry);
        strategy.value = 800;

        assert_eq!(
            vault
                .process_report(&mut strategy, Some(&mut accountant), NOW)
                .unwrap_err(),
            error!(VaultError::AccountingInvariantViolated)
        );

        let summary = vault
            .harvest_all(std::slice::from_mut(&mut strategy), Some(&mut accountant), NOW)
            .unwrap();
        assert_eq!(summary.skipped, vec![strategy.key]);

        assert_eq!(accountant.pulled, 0);
        assert_eq!(accountant.balance, 500);
        assert_eq!(vault.state.total_idle, 0);
        assert_eq!(vault.state.total_debt, 1_001);
    }

    #[test]
    fn test_harvest_all_isolates_failures() {
        let (mut state, mut registry) = new_vault();
        let mut vault = Vault::new(&mut state, &mut registry);
        let mut strategies: Vec<FakeStrategy> =
            (0..3).map(|_| FakeStrategy::new(u64::MAX)).collect();
        for s in strategies.iter_mut() {
            vault.add_strategy(s.key, Pubkey::new_unique(), NOW).unwrap();
            vault.update_max_debt(&s.key, 1_000).unwrap();
        }
        vault.deposit(3_000, NOW).unwrap();
        for s in strategies.iter_mut() {
            vault.update_debt(s, 1_000).unwrap();
            s.value += 100;
        }
        strategies[1].failing = true;
        let missing = FakeStrategy::new(0);
        vault.add_strategy(missing.key, Pubkey::new_unique(), NOW).unwrap();

        let summary = vault
            .harvest_all::<_, FakeAccountant>(&mut strategies, None, NOW)
            .unwrap();
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.skipped, vec![strategies[1].key, missing.key]);
        assert_eq!(vault.state.total_debt, 3_200);
        assert_eq!(
            vault.registry.get(&strategies[1].key).unwrap().current_debt,
            1_000
        );
        assert!(!vault.state.locked);
    }
}
