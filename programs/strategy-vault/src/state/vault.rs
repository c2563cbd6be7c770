use anchor_lang::prelude::*;

use crate::{
    constants::{MAX_BPS, MAX_PROFIT_UNLOCK_PERIOD},
    errors::VaultError,
    math::{checked_add, checked_sub, mul_div, Rounding},
    state::ProfitLock,
};

/// Global vault state: idle/debt ledger, share supply and profit lock
///
/// Security considerations:
/// - Authority stored in state (not instruction args)
/// - `total_idle + total_debt` is the only source of total assets
/// - `total_shares` mirrors the share mint supply, vault-held shares included
/// - Bumps stored for efficient PDA signing
#[account]
#[derive(Default)]
pub struct VaultState {
    /// Authority that manages strategies, debt and configuration
    pub authority: Pubkey,

    /// Mint of the underlying asset token
    pub asset_mint: Pubkey,

    /// Mint of the vault share token
    pub share_mint: Pubkey,

    /// Wallet receiving fee shares and providing refunds (default = none)
    pub accountant: Pubkey,

    /// Assets held directly by the vault
    pub total_idle: u64,

    /// Assets allocated to strategies
    pub total_debt: u64,

    /// Raw share supply, including shares locked in the vault
    pub total_shares: u64,

    /// Idle floor kept when allocating debt
    pub minimum_total_idle: u64,

    /// Fee on realized profit, in basis points
    pub protocol_fee_bps: u16,

    /// Cap on total assets accepted through deposits
    pub deposit_limit: u64,

    /// Cap on assets per withdrawal
    pub withdraw_limit: u64,

    /// Profit vesting schedule
    pub profit_lock: ProfitLock,

    /// Reentrancy flag held while strategies are being called
    pub locked: bool,

    /// Bump seed for vault state PDA
    pub bump: u8,

    /// Bump seed for share mint PDA
    pub share_bump: u8,

    /// Bump seed for vault authority PDA
    pub authority_bump: u8,

    // Padding for future upgrades
    pub _reserved: [u8; 32],
}

/// Runtime configuration supplied at initialization
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultConfig {
    pub deposit_limit: u64,
    pub withdraw_limit: u64,
    pub minimum_total_idle: u64,
    pub protocol_fee_bps: u16,
    pub profit_max_unlock_time: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            deposit_limit: u64::MAX,
            withdraw_limit: u64::MAX,
            minimum_total_idle: 0,
            protocol_fee_bps: 0,
            profit_max_unlock_time: 7 * 24 * 60 * 60,
        }
    }
}

impl VaultConfig {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.protocol_fee_bps as u64 <= MAX_BPS,
            VaultError::InvalidFeeRate
        );
        require!(
            self.profit_max_unlock_time <= MAX_PROFIT_UNLOCK_PERIOD,
            VaultError::InvalidUnlockPeriod
        );
        Ok(())
    }
}

impl VaultState {
    pub fn apply_config(&mut self, config: &VaultConfig) -> Result<()> {
        config.validate()?;
        self.deposit_limit = config.deposit_limit;
        self.withdraw_limit = config.withdraw_limit;
        self.minimum_total_idle = config.minimum_total_idle;
        self.protocol_fee_bps = config.protocol_fee_bps;
        self.profit_lock.max_unlock_period = config.profit_max_unlock_time;
        Ok(())
    }

    pub fn set_protocol_fee(&mut self, protocol_fee_bps: u16) -> Result<()> {
        require!(
            protocol_fee_bps as u64 <= MAX_BPS,
            VaultError::InvalidFeeRate
        );
        self.protocol_fee_bps = protocol_fee_bps;
        Ok(())
    }

    pub fn has_accountant(&self) -> bool {
        self.accountant != Pubkey::default()
    }

    /// idle + debt
    pub fn total_assets(&self) -> Result<u64> {
        checked_add(self.total_idle, self.total_debt)
    }

    pub fn unlocked_shares(&self, now: i64) -> u64 {
        self.profit_lock.unlocked_shares(now)
    }

    /// Share supply used for pricing: raw supply minus released profit shares
    pub fn effective_supply(&self, now: i64) -> Result<u64> {
        checked_sub(self.total_shares, self.unlocked_shares(now))
    }

    /// Convert assets to shares at the current price
    ///
    /// - Empty vault: shares = assets
    /// - Otherwise: shares = assets * effective_supply / total_assets
    pub fn convert_to_shares(&self, assets: u64, now: i64, rounding: Rounding) -> Result<u64> {
        let supply = self.effective_supply(now)?;
        if supply == 0 {
            return Ok(assets);
        }
        let total_assets = self.total_assets()?;
        // Shares outstanding but nothing backing them
        if total_assets == 0 {
            return Ok(0);
        }
        mul_div(assets, supply, total_assets, rounding)
    }

    /// Convert shares to assets at the current price
    pub fn convert_to_assets(&self, shares: u64, now: i64, rounding: Rounding) -> Result<u64> {
        let supply = self.effective_supply(now)?;
        if supply == 0 {
            return Ok(shares);
        }
        mul_div(shares, self.total_assets()?, supply, rounding)
    }

    /// Assets that can still be deposited under the deposit limit
    pub fn max_deposit(&self) -> Result<u64> {
        Ok(self.deposit_limit.saturating_sub(self.total_assets()?))
    }

    /// Assets an owner of `owner_shares` may withdraw
    pub fn max_withdraw(&self, owner_shares: u64, now: i64) -> Result<u64> {
        Ok(self
            .convert_to_assets(owner_shares, now, Rounding::Down)?
            .min(self.withdraw_limit))
    }

    /// Assets backing `one_share` base units of shares
    pub fn price_per_share(&self, one_share: u64, now: i64) -> Result<u64> {
        self.convert_to_assets(one_share, now, Rounding::Down)
    }
}
