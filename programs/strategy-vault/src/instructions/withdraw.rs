use anchor_lang::{prelude::*, solana_program::program_option::COption};
use anchor_spl::token::{self, Burn, Mint, Token, TokenAccount};

use crate::{
    adapters::{load_strategies, VaultAccounts},
    constants::*,
    engine::Vault,
    errors::*,
    events::*,
    state::*,
    utils::{delegated_allowance, transfer_from_vault},
};

/// Withdraw assets by burning shares
///
/// Remaining accounts: `[strategy, strategy program, strategy token account]`
/// for every queued strategy that may have to cover a shortfall.
#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Share owner or an approved delegate of the owner's share account
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    #[account(
        mut,
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

    /// Share account the shares are burned from
    #[account(
        mut,
        constraint = owner_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub owner_share_account: Account<'info, TokenAccount>,

    /// Asset account receiving the withdrawn assets
    #[account(
        mut,
        constraint = receiver_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub receiver_asset_account: Account<'info, TokenAccount>,

    /// Vault idle custody, the canonical associated account
    #[account(
        mut,
        associated_token::mint = vault_state.asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

/// Shares `caller` may spend from a share account: the whole balance for the
/// owner, the remaining allowance for a delegate
pub fn spendable_shares(
    owner: &Pubkey,
    amount: u64,
    delegate: COption<Pubkey>,
    delegated_amount: u64,
    caller: &Pubkey,
) -> Result<u64> {
    if owner == caller {
        return Ok(amount);
    }
    require!(
        delegate == COption::Some(*caller),
        VaultError::Unauthorized
    );
    Ok(delegated_allowance(delegate, delegated_amount, amount, caller))
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
    amount: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = ctx.accounts;
    let share_account = &accounts.owner_share_account;
    let owner_shares = spendable_shares(
        &share_account.owner,
        share_account.amount,
        share_account.delegate,
        share_account.delegated_amount,
        &accounts.caller.key(),
    )?;

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

    // Shortfall is freed from strategies into the vault token account
    let withdrawal = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .withdraw(amount, owner_shares, &mut strategies, now)?;

    // Burn with the caller's own authority (owner or delegate)
    let burn_ctx = CpiContext::new(
        accounts.token_program.to_account_info(),
        Burn {
            mint: accounts.share_mint.to_account_info(),
            from: accounts.owner_share_account.to_account_info(),
            authority: accounts.caller.to_account_info(),
        },
    );
    token::burn(burn_ctx, withdrawal.shares)?;

    transfer_from_vault(
        &vault_accounts.token_program,
        &vault_accounts.vault_token_account,
        &accounts.receiver_asset_account.to_account_info(),
        &vault_accounts.vault_authority,
        &vault_accounts.signer,
        amount,
    )?;

    for (strategy, freed) in withdrawal.pulled.iter() {
        msg!("Freed {} from strategy {}", freed, strategy);
    }

    let vault_state = &accounts.vault_state;
    emit!(Withdrawn {
        vault: vault_state.key(),
        caller: accounts.caller.key(),
        owner: accounts.owner_share_account.owner,
        receiver: accounts.receiver_asset_account.owner,
        asset_amount: amount,
        shares_burned: withdrawal.shares,
        total_assets: vault_state.total_assets()?,
        total_shares: vault_state.total_shares,
        timestamp: now,
    });

    Ok(())
}
