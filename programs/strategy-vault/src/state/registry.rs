use anchor_lang::prelude::*;

use crate::{constants::MAX_STRATEGIES, errors::VaultError};

/// Strategy registry and withdraw queue for one vault
///
/// Every active strategy has exactly one record and appears exactly once in
/// `withdraw_queue`. Only the first `queue_stop` queue entries are drained by
/// withdrawals; the rest sit behind the stop marker.
#[account]
#[derive(Default)]
pub struct StrategyRegistry {
    /// Vault this registry belongs to
    pub vault: Pubkey,

    /// Active strategies, at most MAX_STRATEGIES
    pub strategies: Vec<StrategyRecord>,

    /// Drain order used when idle assets cannot cover a withdrawal
    pub withdraw_queue: Vec<Pubkey>,

    /// Number of leading queue entries drained before stopping
    pub queue_stop: u8,

    /// Bump seed for PDA
    pub bump: u8,
}

/// Debt ledger entry for one strategy
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StrategyRecord {
    /// Strategy state account, the strategy's identity
    pub strategy: Pubkey,

    /// Program implementing the strategy adapter interface
    pub program: Pubkey,

    /// Registration time
    pub activation: i64,

    /// Assets allocated to the strategy
    pub current_debt: u64,

    /// Ceiling for new allocations
    pub max_debt: u64,

    /// Last profit/loss reconciliation
    pub last_report: i64,
}

impl StrategyRegistry {
    pub fn is_active(&self, strategy: &Pubkey) -> bool {
        self.strategies.iter().any(|s| s.strategy == *strategy)
    }

    pub fn get(&self, strategy: &Pubkey) -> Result<&StrategyRecord> {
        self.strategies
            .iter()
            .find(|s| s.strategy == *strategy)
            .ok_or(error!(VaultError::StrategyNotActive))
    }

    pub fn get_mut(&mut self, strategy: &Pubkey) -> Result<&mut StrategyRecord> {
        self.strategies
            .iter_mut()
            .find(|s| s.strategy == *strategy)
            .ok_or(error!(VaultError::StrategyNotActive))
    }

    /// Queue entries that withdrawals may drain, in order
    pub fn drain_order(&self) -> &[Pubkey] {
        let stop = (self.queue_stop as usize).min(self.withdraw_queue.len());
        &self.withdraw_queue[..stop]
    }

    /// Sum of the per-strategy debt ledger
    pub fn total_debt(&self) -> Result<u64> {
        self.strategies.iter().try_fold(0u64, |total, s| {
            total
                .checked_add(s.current_debt)
                .ok_or(error!(VaultError::MathOverflow))
        })
    }

    /// Register a strategy with zero debt. It joins the drained part of the
    /// withdraw queue, right before the stop marker.
    pub fn add(&mut self, strategy: Pubkey, program: Pubkey, now: i64) -> Result<()> {
        require!(
            strategy != Pubkey::default(),
            VaultError::InvalidStrategyAccounts
        );
        require!(
            !self.is_active(&strategy),
            VaultError::StrategyAlreadyActive
        );
        require!(
            self.strategies.len() < MAX_STRATEGIES,
            VaultError::RegistryFull
        );

        self.strategies.push(StrategyRecord {
            strategy,
            program,
            activation: now,
            current_debt: 0,
            max_debt: 0,
            last_report: now,
        });

        let stop = (self.queue_stop as usize).min(self.withdraw_queue.len());
        self.withdraw_queue.insert(stop, strategy);
        self.queue_stop = (stop + 1) as u8;
        Ok(())
    }

    /// Remove a strategy from the registry (swap with last) and from the
    /// withdraw queue (remaining order kept)
    pub fn remove(&mut self, strategy: &Pubkey) -> Result<StrategyRecord> {
        let index = self
            .strategies
            .iter()
            .position(|s| s.strategy == *strategy)
            .ok_or(error!(VaultError::StrategyNotActive))?;
        let record = self.strategies.swap_remove(index);

        if let Some(position) = self.withdraw_queue.iter().position(|k| k == strategy) {
            self.withdraw_queue.remove(position);
            if position < self.queue_stop as usize {
                self.queue_stop -= 1;
            }
        }
        Ok(record)
    }

    /// Replace the withdraw queue.
    ///
    /// `Some` entries must be a permutation of the current queue; a single
    /// `None` marks where draining stops.
    pub fn set_withdraw_queue(&mut self, entries: &[Option<Pubkey>]) -> Result<()> {
        require!(
            entries.len() <= MAX_STRATEGIES + 1,
            VaultError::QueueInvariantViolation
        );

        let mut queue: Vec<Pubkey> = Vec::with_capacity(self.withdraw_queue.len());
        let mut stop = None;
        for entry in entries {
            match entry {
                Some(key) => {
                    require!(
                        self.withdraw_queue.contains(key) && !queue.contains(key),
                        VaultError::QueueInvariantViolation
                    );
                    queue.push(*key);
                }
                None => {
                    require!(stop.is_none(), VaultError::QueueInvariantViolation);
                    stop = Some(queue.len());
                }
            }
        }
        require!(
            queue.len() == self.withdraw_queue.len(),
            VaultError::QueueInvariantViolation
        );

        self.queue_stop = stop.unwrap_or(queue.len()) as u8;
        self.withdraw_queue = queue;
        Ok(())
    }
}
