use anchor_lang::prelude::*;

use crate::{constants::*, engine::Vault, errors::*, events::*, state::*};

/// Authority-only registry maintenance: revoke, max debt, withdraw queue
#[derive(Accounts)]
pub struct ManageStrategy<'info> {
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
}

/// Remove a strategy; outstanding debt is realized as a loss
pub fn revoke_handler(ctx: Context<ManageStrategy>, strategy: Pubkey) -> Result<()> {
    let accounts = ctx.accounts;
    let loss = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .revoke_strategy(&strategy)?;

    if loss > 0 {
        msg!("Strategy {} revoked with {} debt written off", strategy, loss);
    }
    emit!(StrategyRevoked {
        vault: accounts.vault_state.key(),
        strategy,
        loss,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

pub fn update_max_debt_handler(
    ctx: Context<ManageStrategy>,
    strategy: Pubkey,
    max_debt: u64,
) -> Result<()> {
    let accounts = ctx.accounts;
    Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .update_max_debt(&strategy, max_debt)?;

    emit!(MaxDebtUpdated {
        vault: accounts.vault_state.key(),
        strategy,
        max_debt,
    });

    Ok(())
}

/// Replace the withdraw queue; `None` marks where draining stops
pub fn set_withdraw_queue_handler(
    ctx: Context<ManageStrategy>,
    queue: Vec<Option<Pubkey>>,
) -> Result<()> {
    let accounts = ctx.accounts;
    Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .set_withdraw_queue(&queue)?;

    emit!(WithdrawQueueUpdated {
        vault: accounts.vault_state.key(),
        queue: accounts.strategy_registry.withdraw_queue.clone(),
        queue_stop: accounts.strategy_registry.queue_stop,
    });

    Ok(())
}
