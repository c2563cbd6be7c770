use anchor_lang::prelude::*;

use crate::{constants::*, engine::Vault, errors::*, events::*, state::*};

/// Register a strategy with zero debt and zero max debt
#[derive(Accounts)]
pub struct AddStrategy<'info> {
    /// Security: Must be signer and match vault_state.authority
    pub authority: Signer<'info>,

    #[account(
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

    /// Strategy state account, must belong to the strategy program
    /// CHECK: owner checked against strategy_program in handler
    pub strategy: UncheckedAccount<'info>,

    /// Program implementing the strategy interface
    /// CHECK: must be executable, checked in handler
    pub strategy_program: UncheckedAccount<'info>,
}

pub fn handler(ctx: Context<AddStrategy>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = ctx.accounts;

    require!(
        accounts.strategy_program.executable,
        VaultError::InvalidStrategyAccounts
    );
    require_keys_eq!(
        *accounts.strategy.owner,
        accounts.strategy_program.key(),
        VaultError::InvalidStrategyAccounts
    );

    let strategy = accounts.strategy.key();
    let program = accounts.strategy_program.key();
    Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .add_strategy(strategy, program, now)?;

    emit!(StrategyAdded {
        vault: accounts.vault_state.key(),
        strategy,
        program,
        timestamp: now,
    });

    Ok(())
}
