use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    adapters::{load_strategies, VaultAccounts},
    constants::*,
    engine::Vault,
    errors::*,
    events::*,
    state::*,
};

/// Rebalance one strategy towards a target debt
///
/// Remaining accounts: exactly one `[strategy, strategy program,
/// strategy token account]` group.
#[derive(Accounts)]
pub struct UpdateDebt<'info> {
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
        mut,
        seeds = [STRATEGY_REGISTRY_SEED, vault_state.key().as_ref()],
        bump = strategy_registry.bump,
    )]
    pub strategy_registry: Box<Account<'info, StrategyRegistry>>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Vault idle custody, the canonical associated account
    #[account(
        mut,
        associated_token::mint = vault_state.asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, UpdateDebt<'info>>,
    target_debt: u64,
) -> Result<()> {
    require!(
        ctx.remaining_accounts.len() == STRATEGY_ACCOUNTS_LEN,
        VaultError::InvalidStrategyAccounts
    );
    let accounts = ctx.accounts;

    let vault_accounts = VaultAccounts::new(
        accounts.vault_authority.to_account_info(),
        accounts.vault_token_account.to_account_info(),
        accounts.token_program.to_account_info(),
        &accounts.vault_state,
    );
    let mut strategies = load_strategies(
        ctx.remaining_accounts,
        &accounts.strategy_registry,
        &accounts.vault_state,
        &vault_accounts,
    )?;
    let strategy = strategies
        .first_mut()
        .ok_or(error!(VaultError::StrategyAccountsMissing))?;

    let update = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .update_debt(strategy, target_debt)?;

    emit!(DebtUpdated {
        vault: accounts.vault_state.key(),
        strategy: update.strategy,
        previous_debt: update.previous_debt,
        new_debt: update.new_debt,
        total_idle: accounts.vault_state.total_idle,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
