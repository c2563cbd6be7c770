use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    constants::*,
    engine::Vault,
    errors::*,
    events::*,
    state::*,
    utils::{mint_shares, VaultSigner},
};

/// Deposit assets into the vault and receive shares
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: User must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state and registry PDAs validated with seeds
/// ✅ 6. MATH SAFETY: Share price computed in u128 with checked operations
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Checks-effects-interactions pattern
/// ✅ 10. EVENTS: Emits Deposited event
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// User depositing assets
    /// Security: Must be signer
    #[account(mut)]
    pub user: Signer<'info>,

    /// Vault state PDA
    /// Security: Validated by seeds, contains authority and totals
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Box<Account<'info, VaultState>>,

    /// Strategy registry, read for the invariant check only
    #[account(
        seeds = [STRATEGY_REGISTRY_SEED, vault_state.key().as_ref()],
        bump = strategy_registry.bump,
    )]
    pub strategy_registry: Box<Account<'info, StrategyRegistry>>,

    /// Share mint
    /// Security: Must match vault_state.share_mint
    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault authority PDA
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// User's asset token account (source)
    /// Security: Must be owned by user and correct mint
    #[account(
        mut,
        constraint = user_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = user_asset_account.owner == user.key() @ VaultError::InvalidOwner,
    )]
    pub user_asset_account: Account<'info, TokenAccount>,

    /// Wallet receiving the shares
    /// CHECK: any wallet may receive shares, only used to derive its share account
    pub receiver: UncheckedAccount<'info>,

    /// Receiver's share token account (destination), created on first deposit
    /// Security: Associated account of receiver for the share mint
    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = share_mint,
        associated_token::authority = receiver,
    )]
    pub receiver_share_account: Account<'info, TokenAccount>,

    /// Vault's token account
    /// Security: The associated account of vault_authority for the asset mint
    #[account(
        mut,
        associated_token::mint = vault_state.asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = ctx.accounts;

    // CHECKS + EFFECTS: price the deposit and update the ledger
    let shares = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .deposit(amount, now)?;

    // INTERACTIONS: External calls after state updates
    let transfer_ctx = CpiContext::new(
        accounts.token_program.to_account_info(),
        Transfer {
            from: accounts.user_asset_account.to_account_info(),
            to: accounts.vault_token_account.to_account_info(),
            authority: accounts.user.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    mint_shares(
        &accounts.token_program.to_account_info(),
        &accounts.share_mint.to_account_info(),
        &accounts.receiver_share_account.to_account_info(),
        &accounts.vault_authority.to_account_info(),
        &VaultSigner::new(&accounts.vault_state),
        shares,
    )?;

    let vault_state = &accounts.vault_state;
    emit!(Deposited {
        vault: vault_state.key(),
        user: accounts.user.key(),
        receiver: accounts.receiver.key(),
        asset_amount: amount,
        shares_minted: shares,
        total_assets: vault_state.total_assets()?,
        total_shares: vault_state.total_shares,
        timestamp: now,
    });

    Ok(())
}
