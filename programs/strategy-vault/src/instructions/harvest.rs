use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    adapters::{load_available_strategies, load_strategies, TokenAccountant, VaultAccounts},
    constants::*,
    engine::{StrategyReport, Vault},
    errors::*,
    events::*,
    state::*,
    utils::{burn_vault_shares, mint_shares},
};

/// Recognize strategy profit and loss
///
/// Remaining accounts: `[strategy, strategy program, strategy token account]`
/// groups for the strategies to report.
#[derive(Accounts)]
pub struct Harvest<'info> {
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

    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Box<Account<'info, Mint>>,

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
    pub vault_token_account: Box<Account<'info, TokenAccount>>,

    /// Holds shares locked for profit vesting
    #[account(
        mut,
        associated_token::mint = share_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_share_account: Box<Account<'info, TokenAccount>>,

    /// Accountant's asset account, refund source. Required when the vault
    /// has an accountant.
    #[account(mut)]
    pub accountant_token_account: Option<Box<Account<'info, TokenAccount>>>,

    /// Accountant's share account, fee destination. Required when the vault
    /// has an accountant.
    #[account(mut)]
    pub accountant_share_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Program<'info, Token>,
}

impl<'info> Harvest<'info> {
    fn vault_accounts(&self) -> VaultAccounts<'info> {
        VaultAccounts::new(
            self.vault_authority.to_account_info(),
            self.vault_token_account.to_account_info(),
            self.token_program.to_account_info(),
            &self.vault_state,
        )
    }

    /// Refund source for the configured accountant, if any
    fn accountant(&self) -> Result<Option<TokenAccountant<'info>>> {
        let holding = |account: &Option<Box<Account<'info, TokenAccount>>>| {
            account.as_ref().map(|a| (a.owner, a.mint))
        };
        let required = check_accountant_accounts(
            &self.vault_state,
            holding(&self.accountant_token_account),
            holding(&self.accountant_share_account),
        )?;

        match (required, self.accountant_token_account.as_ref()) {
            (true, Some(token_account)) => Ok(Some(TokenAccountant::new(
                token_account.to_account_info(),
                self.vault_accounts(),
            ))),
            _ => Ok(None),
        }
    }

    /// Mirror the reports on the share mint and emit them
    fn settle(&self, reports: &[StrategyReport], now: i64) -> Result<()> {
        let vault_accounts = self.vault_accounts();
        let token_program = self.token_program.to_account_info();
        let share_mint = self.share_mint.to_account_info();
        let vault_share_account = self.vault_share_account.to_account_info();

        for report in reports {
            if report.fee_shares > 0 {
                let fee_account = self
                    .accountant_share_account
                    .as_ref()
                    .ok_or(error!(VaultError::InvalidAccountant))?;
                mint_shares(
                    &token_program,
                    &share_mint,
                    &fee_account.to_account_info(),
                    &vault_accounts.vault_authority,
                    &vault_accounts.signer,
                    report.fee_shares,
                )?;
            }

            emit!(StrategyReported {
                vault: self.vault_state.key(),
                strategy: report.strategy,
                gain: report.gain,
                loss: report.loss,
                current_debt: report.current_debt,
                fee_assets: report.fee_assets,
                fee_shares: report.fee_shares,
                refund: report.refund,
                timestamp: now,
            });
        }

        // Only the net change of the vault's own balance hits the mint
        let (to_mint, to_burn) = net_vault_shares(reports)?;
        mint_shares(
            &token_program,
            &share_mint,
            &vault_share_account,
            &vault_accounts.vault_authority,
            &vault_accounts.signer,
            to_mint,
        )?;
        burn_vault_shares(
            &token_program,
            &share_mint,
            &vault_share_account,
            &vault_accounts.vault_authority,
            &vault_accounts.signer,
            to_burn,
        )
    }
}

/// Whether accountant accounts take part in a harvest.
///
/// Each account is given as `(owner, mint)`. With an accountant configured,
/// both must be supplied, owned by the accountant and hold the asset and the
/// share respectively.
pub fn check_accountant_accounts(
    vault_state: &VaultState,
    token_account: Option<(Pubkey, Pubkey)>,
    share_account: Option<(Pubkey, Pubkey)>,
) -> Result<bool> {
    if !vault_state.has_accountant() {
        return Ok(false);
    }

    let (Some(token_account), Some(share_account)) = (token_account, share_account) else {
        return err!(VaultError::InvalidAccountant);
    };
    require!(
        token_account == (vault_state.accountant, vault_state.asset_mint),
        VaultError::InvalidAccountant
    );
    require!(
        share_account == (vault_state.accountant, vault_state.share_mint),
        VaultError::InvalidAccountant
    );
    Ok(true)
}

/// Net vault share movement of a batch of reports as `(to_mint, to_burn)`,
/// at most one of them non-zero
pub fn net_vault_shares(reports: &[StrategyReport]) -> Result<(u64, u64)> {
    let mut minted: u64 = 0;
    let mut burned: u64 = 0;
    for report in reports {
        minted = minted
            .checked_add(report.shares_minted_to_vault)
            .ok_or(VaultError::MathOverflow)?;
        burned = burned
            .checked_add(report.shares_burned_from_vault)
            .ok_or(VaultError::MathOverflow)?;
    }
    Ok((minted.saturating_sub(burned), burned.saturating_sub(minted)))
}

/// Report a single strategy. Any failure aborts the instruction.
pub fn process_report_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, Harvest<'info>>,
) -> Result<()> {
    require!(
        ctx.remaining_accounts.len() == STRATEGY_ACCOUNTS_LEN,
        VaultError::InvalidStrategyAccounts
    );
    let now = Clock::get()?.unix_timestamp;
    let accounts = ctx.accounts;

    let mut accountant = accounts.accountant()?;
    let mut strategies = load_strategies(
        ctx.remaining_accounts,
        &accounts.strategy_registry,
        &accounts.vault_state,
        &accounts.vault_accounts(),
    )?;
    let strategy = strategies
        .first_mut()
        .ok_or(error!(VaultError::StrategyAccountsMissing))?;

    let report = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .process_report(strategy, accountant.as_mut(), now)?;

    accounts.settle(&[report], now)
}

/// Report every registered strategy, skipping the ones that fail
pub fn harvest_all_handler<'info>(ctx: Context<'_, '_, '_, 'info, Harvest<'info>>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = ctx.accounts;

    let mut accountant = accounts.accountant()?;
    let mut strategies = load_available_strategies(
        ctx.remaining_accounts,
        &accounts.strategy_registry,
        &accounts.vault_state,
        &accounts.vault_accounts(),
    )?;

    let summary = Vault::new(&mut accounts.vault_state, &mut accounts.strategy_registry)
        .harvest_all(&mut strategies, accountant.as_mut(), now)?;

    for strategy in summary.skipped.iter() {
        emit!(HarvestSkipped {
            vault: accounts.vault_state.key(),
            strategy: *strategy,
            timestamp: now,
        });
    }
    accounts.settle(&summary.reports, now)
}
