use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    constants::*,
    engine::Vault,
    errors::*,
    events::*,
    state::*,
    utils::{burn_vault_shares, VaultSigner},
};

/// Authority-only runtime settings
#[derive(Accounts)]
pub struct Configure<'info> {
    /// Security: Must be signer and match vault_state.authority
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = authority @ VaultError::Unauthorized,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,
}

impl<'info> Configure<'info> {
    fn emit_config(&self) {
        let vault_state = &self.vault_state;
        emit!(ConfigUpdated {
            vault: vault_state.key(),
            deposit_limit: vault_state.deposit_limit,
            withdraw_limit: vault_state.withdraw_limit,
            minimum_total_idle: vault_state.minimum_total_idle,
            protocol_fee_bps: vault_state.protocol_fee_bps,
            profit_max_unlock_time: vault_state.profit_lock.max_unlock_period,
            accountant: vault_state.accountant,
        });
    }
}

pub fn set_deposit_limit_handler(ctx: Context<Configure>, deposit_limit: u64) -> Result<()> {
    ctx.accounts.vault_state.deposit_limit = deposit_limit;
    ctx.accounts.emit_config();
    Ok(())
}

pub fn set_withdraw_limit_handler(ctx: Context<Configure>, withdraw_limit: u64) -> Result<()> {
    ctx.accounts.vault_state.withdraw_limit = withdraw_limit;
    ctx.accounts.emit_config();
    Ok(())
}

pub fn set_minimum_total_idle_handler(
    ctx: Context<Configure>,
    minimum_total_idle: u64,
) -> Result<()> {
    ctx.accounts.vault_state.minimum_total_idle = minimum_total_idle;
    ctx.accounts.emit_config();
    Ok(())
}

pub fn set_protocol_fee_handler(ctx: Context<Configure>, protocol_fee_bps: u16) -> Result<()> {
    ctx.accounts.vault_state.set_protocol_fee(protocol_fee_bps)?;
    ctx.accounts.emit_config();
    Ok(())
}

/// Pass `Pubkey::default()` to run without an accountant
pub fn set_accountant_handler(ctx: Context<Configure>, accountant: Pubkey) -> Result<()> {
    ctx.accounts.vault_state.accountant = accountant;
    ctx.accounts.emit_config();
    Ok(())
}

/// Change the profit vesting period; zero burns every vault-held share
#[derive(Accounts)]
pub struct SetProfitMaxUnlockTime<'info> {
    /// Security: Must be signer and match vault_state.authority
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = authority @ VaultError::Unauthorized,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    #[account(
        seeds = [STRATEGY_REGISTRY_SEED, vault_state.key().as_ref()],
        bump = strategy_registry.bump,
    )]
    pub strategy_registry: Box<Account<'info, StrategyRegistry>>,

    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Account<'info, Mint>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        associated_token::mint = share_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_share_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn set_profit_max_unlock_time_handler(
    ctx: Context<SetProfitMaxUnlockTime>,
    profit_max_unlock_time: u64,
) -> Result<()> {
    let accounts = ctx.accounts;
    let burned = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .set_profit_max_unlock_time(profit_max_unlock_time)?;

    burn_vault_shares(
        &accounts.token_program.to_account_info(),
        &accounts.share_mint.to_account_info(),
        &accounts.vault_share_account.to_account_info(),
        &accounts.vault_authority.to_account_info(),
        &VaultSigner::new(&accounts.vault_state),
        burned,
    )?;

    let vault_state = &accounts.vault_state;
    emit!(ConfigUpdated {
        vault: vault_state.key(),
        deposit_limit: vault_state.deposit_limit,
        withdraw_limit: vault_state.withdraw_limit,
        minimum_total_idle: vault_state.minimum_total_idle,
        protocol_fee_bps: vault_state.protocol_fee_bps,
        profit_max_unlock_time: vault_state.profit_lock.max_unlock_period,
        accountant: vault_state.accountant,
    });

    Ok(())
}
