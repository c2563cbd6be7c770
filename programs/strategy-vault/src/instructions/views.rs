use anchor_lang::prelude::*;
use anchor_spl::token::Mint;

use crate::{constants::*, errors::*, state::*};

/// Read-only access to the vault; results are returned through return data
#[derive(Accounts)]
pub struct ViewVault<'info> {
    #[account(
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    #[account(address = vault_state.share_mint)]
    pub share_mint: Account<'info, Mint>,
}

pub fn total_assets_handler(ctx: Context<ViewVault>) -> Result<u64> {
    ctx.accounts.vault_state.total_assets()
}

/// Share supply net of released profit shares
pub fn total_supply_handler(ctx: Context<ViewVault>) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.vault_state.effective_supply(now)
}

/// Assets backing one whole share (10^decimals base units)
pub fn price_per_share_handler(ctx: Context<ViewVault>) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let one_share = 10u64
        .checked_pow(ctx.accounts.share_mint.decimals as u32)
        .ok_or(VaultError::MathOverflow)?;
    ctx.accounts.vault_state.price_per_share(one_share, now)
}

pub fn unlocked_shares_handler(ctx: Context<ViewVault>) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    Ok(ctx.accounts.vault_state.unlocked_shares(now))
}

/// Share-denominated entry points. Shares only move through deposit and
/// withdraw.
#[derive(Accounts)]
pub struct DirectShareOperation<'info> {
    pub caller: Signer<'info>,

    #[account(
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,
}

pub fn mint_handler(_ctx: Context<DirectShareOperation>, _shares: u64) -> Result<()> {
    err!(VaultError::DirectShareOperationDisabled)
}

pub fn redeem_handler(_ctx: Context<DirectShareOperation>, _shares: u64) -> Result<()> {
    err!(VaultError::DirectShareOperationDisabled)
}
