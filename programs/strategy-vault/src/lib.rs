// Strategy Vault - multi-strategy allocation vault on Solana
// Accounting: idle + debt ledger, profit locked as vault-held shares that vest over time
// Architecture: Registry + withdraw queue over CPI-backed strategy adapters

use anchor_lang::prelude::*;

pub mod adapters;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;
pub mod utils;

use instructions::*;
use state::VaultConfig;

declare_id!("7LHHF981ULUvqKJy55iVvvDHSMsH1A9msFWGTrnFw87y");

#[program]
pub mod strategy_vault {
    use super::*;

    /// Initialize a new vault for a given asset token
    ///
    /// Security considerations:
    /// - Validates authority is signer
    /// - Initializes vault state and strategy registry with proper PDAs
    /// - Creates share mint with vault authority PDA as mint authority
    /// - Rejects fee rates above 100% and unlock periods above one year
    pub fn initialize(ctx: Context<Initialize>, config: VaultConfig) -> Result<()> {
        instructions::initialize::handler(ctx, config)
    }

    /// Deposit assets into the vault and receive shares
    ///
    /// Security considerations:
    /// - Validates user token accounts (mint, owner)
    /// - Shares priced against effective supply, rounded down
    /// - Follows checks-effects-interactions pattern
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit::handler(ctx, amount)
    }

    /// Withdraw assets, burning shares from the owner's share account
    ///
    /// Security considerations:
    /// - Caller must own the share account or be its approved delegate
    /// - Shares priced before any strategy is touched, rounded up
    /// - Strategies drained in withdraw-queue order under the reentrancy guard
    /// - All or nothing: fails with InsufficientLiquidity on a shortfall
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::withdraw::handler(ctx, amount)
    }

    /// Always fails: shares are only issued through `deposit`
    pub fn mint(ctx: Context<DirectShareOperation>, shares: u64) -> Result<()> {
        instructions::views::mint_handler(ctx, shares)
    }

    /// Always fails: shares are only redeemed through `withdraw`
    pub fn redeem(ctx: Context<DirectShareOperation>, shares: u64) -> Result<()> {
        instructions::views::redeem_handler(ctx, shares)
    }

    /// Register a strategy program and its state account
    ///
    /// Security considerations:
    /// - Authority-only function (has_one constraint)
    /// - Strategy program must be executable and own the strategy account
    /// - Registry bounded by MAX_STRATEGIES
    pub fn add_strategy(ctx: Context<AddStrategy>) -> Result<()> {
        instructions::add_strategy::handler(ctx)
    }

    /// Remove a strategy, realizing its outstanding debt as a loss
    pub fn revoke_strategy(ctx: Context<ManageStrategy>, strategy: Pubkey) -> Result<()> {
        instructions::manage_strategy::revoke_handler(ctx, strategy)
    }

    /// Set the ceiling for new allocations to a strategy
    pub fn update_max_debt(
        ctx: Context<ManageStrategy>,
        strategy: Pubkey,
        max_debt: u64,
    ) -> Result<()> {
        instructions::manage_strategy::update_max_debt_handler(ctx, strategy, max_debt)
    }

    /// Reorder the withdraw queue. `None` marks where draining stops.
    pub fn set_withdraw_queue(
        ctx: Context<ManageStrategy>,
        queue: Vec<Option<Pubkey>>,
    ) -> Result<()> {
        instructions::manage_strategy::set_withdraw_queue_handler(ctx, queue)
    }

    /// Move assets between idle and one strategy towards `target_debt`
    ///
    /// Security considerations:
    /// - Authority-only function
    /// - Respects max debt, minimum idle and the strategy's own limits
    /// - Books the balance actually moved, not the strategy's claim
    pub fn update_debt<'info>(
        ctx: Context<'_, '_, '_, 'info, UpdateDebt<'info>>,
        target_debt: u64,
    ) -> Result<()> {
        instructions::update_debt::handler(ctx, target_debt)
    }

    /// Recognize one strategy's profit or loss
    ///
    /// Security considerations:
    /// - Authority-only function
    /// - Profit vests over time so the share price never jumps
    /// - Accountant accounts required when an accountant is configured
    pub fn process_report<'info>(ctx: Context<'_, '_, '_, 'info, Harvest<'info>>) -> Result<()> {
        instructions::harvest::process_report_handler(ctx)
    }

    /// Report every registered strategy; failing strategies are skipped
    pub fn harvest_all<'info>(ctx: Context<'_, '_, '_, 'info, Harvest<'info>>) -> Result<()> {
        instructions::harvest::harvest_all_handler(ctx)
    }

    /// Send idle assets to a recipient and write off strategy debt
    ///
    /// Security considerations:
    /// - Authority-only function
    /// - `call_strategy = false` writes debt off without calling the strategy
    pub fn emergency_withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, EmergencyWithdraw<'info>>,
        idle_amount: u64,
        strategy: Option<Pubkey>,
        strategy_amount: u64,
        call_strategy: bool,
    ) -> Result<()> {
        instructions::emergency_withdraw::handler(
            ctx,
            idle_amount,
            strategy,
            strategy_amount,
            call_strategy,
        )
    }

    pub fn set_deposit_limit(ctx: Context<Configure>, deposit_limit: u64) -> Result<()> {
        instructions::configure::set_deposit_limit_handler(ctx, deposit_limit)
    }

    pub fn set_withdraw_limit(ctx: Context<Configure>, withdraw_limit: u64) -> Result<()> {
        instructions::configure::set_withdraw_limit_handler(ctx, withdraw_limit)
    }

    pub fn set_minimum_total_idle(ctx: Context<Configure>, minimum_total_idle: u64) -> Result<()> {
        instructions::configure::set_minimum_total_idle_handler(ctx, minimum_total_idle)
    }

    pub fn set_protocol_fee(ctx: Context<Configure>, protocol_fee_bps: u16) -> Result<()> {
        instructions::configure::set_protocol_fee_handler(ctx, protocol_fee_bps)
    }

    pub fn set_accountant(ctx: Context<Configure>, accountant: Pubkey) -> Result<()> {
        instructions::configure::set_accountant_handler(ctx, accountant)
    }

    /// Change the profit vesting period; zero releases all locked profit
    pub fn set_profit_max_unlock_time(
        ctx: Context<SetProfitMaxUnlockTime>,
        profit_max_unlock_time: u64,
    ) -> Result<()> {
        instructions::configure::set_profit_max_unlock_time_handler(ctx, profit_max_unlock_time)
    }

    pub fn total_assets(ctx: Context<ViewVault>) -> Result<u64> {
        instructions::views::total_assets_handler(ctx)
    }

    pub fn total_supply(ctx: Context<ViewVault>) -> Result<u64> {
        instructions::views::total_supply_handler(ctx)
    }

    pub fn price_per_share(ctx: Context<ViewVault>) -> Result<u64> {
        instructions::views::price_per_share_handler(ctx)
    }

    pub fn unlocked_shares(ctx: Context<ViewVault>) -> Result<u64> {
        instructions::views::unlocked_shares_handler(ctx)
    }
}
