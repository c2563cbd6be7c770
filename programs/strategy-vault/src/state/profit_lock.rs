use anchor_lang::prelude::*;

use crate::{constants::SCALE, errors::VaultError};

/// Time-weighted unlock schedule for profit recognized at harvest.
///
/// Profit is minted as shares held by the vault itself. Those shares keep
/// diluting the share price until they are released, so a harvest never
/// makes the price jump. Released shares stop counting towards the
/// effective supply and are burned at the next harvest.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProfitLock {
    /// Shares held by the vault, including released shares not yet burned
    pub locked_shares: u64,

    /// Shares released per second, scaled by SCALE
    pub unlock_rate: u128,

    /// Time at which every locked share is released (0 = nothing pending)
    pub full_unlock_at: i64,

    /// Anchor for elapsed-time release
    pub last_update: i64,

    /// Nominal vesting period for newly recognized profit, 0 disables locking
    pub max_unlock_period: u64,
}

impl ProfitLock {
    /// Shares released since the last harvest
    pub fn unlocked_shares(&self, now: i64) -> u64 {
        if self.full_unlock_at > now {
            let elapsed = now.saturating_sub(self.last_update).max(0) as u128;
            let released = self
                .unlock_rate
                .checked_mul(elapsed)
                .map(|scaled| scaled / SCALE)
                .unwrap_or(u128::MAX);
            released.min(self.locked_shares as u128) as u64
        } else if self.full_unlock_at != 0 {
            self.locked_shares
        } else {
            0
        }
    }

    /// Re-derive the schedule after a harvest.
    ///
    /// `locked_shares` must already hold the post-harvest vault balance.
    /// The new period is the share-weighted average of what was still
    /// vesting and `max_unlock_period` for `new_locked`.
    pub fn lock_new_shares(&mut self, new_locked: u64, now: i64) -> Result<()> {
        let total_locked = self.locked_shares as u128;
        if total_locked == 0 {
            self.full_unlock_at = 0;
            return Ok(());
        }

        let remaining_period = if self.full_unlock_at > now {
            (self.full_unlock_at - now) as u128
        } else {
            0
        };
        let previously_locked_time = total_locked
            .saturating_sub(new_locked as u128)
            .checked_mul(remaining_period)
            .ok_or(error!(VaultError::MathOverflow))?;
        let newly_locked_time = (new_locked as u128)
            .checked_mul(self.max_unlock_period as u128)
            .ok_or(error!(VaultError::MathOverflow))?;
        let new_period = previously_locked_time
            .checked_add(newly_locked_time)
            .ok_or(error!(VaultError::MathOverflow))?
            / total_locked;

        if new_period > 0 {
            self.unlock_rate = total_locked
                .checked_mul(SCALE)
                .ok_or(error!(VaultError::MathOverflow))?
                / new_period;
        }
        let new_period = i64::try_from(new_period).map_err(|_| error!(VaultError::MathOverflow))?;
        self.full_unlock_at = now
            .checked_add(new_period)
            .ok_or(error!(VaultError::MathOverflow))?;
        self.last_update = now;
        Ok(())
    }

    /// Drop every pending lock, returning the shares the vault must burn
    pub fn clear(&mut self) -> u64 {
        let held = self.locked_shares;
        self.locked_shares = 0;
        self.unlock_rate = 0;
        self.full_unlock_at = 0;
        self.last_update = 0;
        held
    }
}
