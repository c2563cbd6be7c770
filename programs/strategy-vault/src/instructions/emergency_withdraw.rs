use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    adapters::{find_adapter, load_strategies, CpiStrategy, VaultAccounts},
    constants::*,
    engine::Vault,
    errors::*,
    events::*,
    state::*,
    utils::transfer_from_vault,
};

/// Authority escape hatch: pull idle assets out and write off strategy debt
///
/// Remaining accounts: the strategy's `[strategy, strategy program,
/// strategy token account]` group when `call_strategy` is set.
#[derive(Accounts)]
pub struct EmergencyWithdraw<'info> {
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

    /// Destination chosen by the authority
    #[account(
        mut,
        constraint = recipient_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub recipient_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, EmergencyWithdraw<'info>>,
    idle_amount: u64,
    strategy: Option<Pubkey>,
    strategy_amount: u64,
    call_strategy: bool,
) -> Result<()> {
    let accounts = ctx.accounts;

    let vault_accounts = VaultAccounts::new(
        accounts.vault_authority.to_account_info(),
        accounts.vault_token_account.to_account_info(),
        accounts.token_program.to_account_info(),
        &accounts.vault_state,
    );
    let mut strategies: Vec<CpiStrategy<'info>> = if call_strategy {
        require!(
            ctx.remaining_accounts.len() == STRATEGY_ACCOUNTS_LEN,
            VaultError::InvalidStrategyAccounts
        );
        load_strategies(
            ctx.remaining_accounts,
            &accounts.strategy_registry,
            &accounts.vault_state,
            &vault_accounts,
        )?
    } else {
        Vec::new()
    };
    let adapter = match (call_strategy, strategy.as_ref()) {
        (true, Some(key)) => Some(
            find_adapter(&mut strategies, key)
                .ok_or(error!(VaultError::StrategyAccountsMissing))?,
        ),
        _ => None,
    };

    let release = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .emergency_withdraw(idle_amount, strategy.as_ref(), strategy_amount, adapter)?;

    // Freed assets are forwarded, they never become idle
    let amount = release
        .from_idle
        .checked_add(release.freed)
        .ok_or(VaultError::MathOverflow)?;
    transfer_from_vault(
        &vault_accounts.token_program,
        &vault_accounts.vault_token_account,
        &accounts.recipient_token_account.to_account_info(),
        &vault_accounts.vault_authority,
        &vault_accounts.signer,
        amount,
    )?;

    msg!(
        "Emergency withdraw: {} idle, {} freed, {} debt written off",
        release.from_idle,
        release.freed,
        release.written_off
    );
    emit!(EmergencyWithdrawn {
        vault: accounts.vault_state.key(),
        recipient: accounts.recipient_token_account.key(),
        strategy,
        from_idle: release.from_idle,
        freed: release.freed,
        written_off: release.written_off,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
