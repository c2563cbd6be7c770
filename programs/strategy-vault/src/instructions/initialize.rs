use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, events::*, state::*};

/// Initialize a new vault for a given asset token
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Vault authority - manages strategies, debt and configuration
    /// Security: Must be signer, stored in state
    #[account(mut)]
    pub authority: Signer<'info>,

    /// Vault state PDA
    /// Security: Initialized with proper space and padding for upgrades
    #[account(
        init,
        payer = authority,
        space = VAULT_STATE_SIZE,
        seeds = [VAULT_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    /// Strategy registry PDA, one per vault
    #[account(
        init,
        payer = authority,
        space = STRATEGY_REGISTRY_SIZE,
        seeds = [STRATEGY_REGISTRY_SEED, vault_state.key().as_ref()],
        bump
    )]
    pub strategy_registry: Box<Account<'info, StrategyRegistry>>,

    /// Asset token mint (the underlying token users deposit)
    /// Security: No constraints needed - any valid mint can have a vault
    pub asset_mint: Box<Account<'info, Mint>>,

    /// Share token mint PDA (vault shares)
    /// Security: Mint authority is vault_authority PDA
    #[account(
        init,
        payer = authority,
        seeds = [SHARE_MINT_SEED, asset_mint.key().as_ref()],
        bump,
        mint::decimals = asset_mint.decimals,
        mint::authority = vault_authority,
    )]
    pub share_mint: Box<Account<'info, Mint>>,

    /// Vault authority PDA - mint authority for shares, owner of vault accounts
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Vault's token account for holding idle assets
    /// Security: Owned by vault_authority PDA, correct mint
    #[account(
        init,
        payer = authority,
        associated_token::mint = asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Box<Account<'info, TokenAccount>>,

    /// Vault's own share account, holds shares locked for profit vesting
    #[account(
        init,
        payer = authority,
        associated_token::mint = share_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_share_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, config: VaultConfig) -> Result<()> {
    let vault_key = ctx.accounts.vault_state.key();
    let vault_state = &mut ctx.accounts.vault_state;

    // EFFECTS: Initialize vault state
    vault_state.authority = ctx.accounts.authority.key();
    vault_state.asset_mint = ctx.accounts.asset_mint.key();
    vault_state.share_mint = ctx.accounts.share_mint.key();
    vault_state.accountant = Pubkey::default();
    vault_state.total_idle = 0;
    vault_state.total_debt = 0;
    vault_state.total_shares = 0;
    vault_state.profit_lock = ProfitLock::default();
    vault_state.apply_config(&config)?;
    vault_state.locked = false;
    vault_state.bump = ctx.bumps.vault_state;
    vault_state.share_bump = ctx.bumps.share_mint;
    vault_state.authority_bump = ctx.bumps.vault_authority;
    vault_state._reserved = [0; 32];

    let registry = &mut ctx.accounts.strategy_registry;
    registry.vault = vault_key;
    registry.strategies = Vec::new();
    registry.withdraw_queue = Vec::new();
    registry.queue_stop = 0;
    registry.bump = ctx.bumps.strategy_registry;

    emit!(VaultInitialized {
        vault: vault_key,
        authority: vault_state.authority,
        asset_mint: vault_state.asset_mint,
        share_mint: vault_state.share_mint,
        deposit_limit: vault_state.deposit_limit,
        profit_max_unlock_time: vault_state.profit_lock.max_unlock_period,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
