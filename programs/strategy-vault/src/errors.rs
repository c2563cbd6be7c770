use anchor_lang::prelude::*;

/// Custom error codes for the Strategy Vault program
///
/// Caller errors are raised before any state change and are safe to retry
/// with corrected input.
#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Amount converts to zero shares")]
    ZeroShares,

    #[msg("Deposit exceeds the maximum depositable amount")]
    ExceededMaxDeposit,

    #[msg("Withdraw exceeds the maximum withdrawable amount")]
    ExceededMaxWithdraw,

    #[msg("Not enough liquidity to fulfil the withdrawal")]
    InsufficientLiquidity,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Invalid token mint - does not match vault asset")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Unauthorized - only vault authority can perform this action")]
    Unauthorized,

    #[msg("Strategy is not active")]
    StrategyNotActive,

    #[msg("Strategy is already active")]
    StrategyAlreadyActive,

    #[msg("Strategy registry is full - maximum strategies reached")]
    RegistryFull,

    #[msg("Target debt exceeds the strategy max debt")]
    DebtCapExceeded,

    #[msg("Target debt equals current debt")]
    DebtUnchanged,

    #[msg("Strategy has nothing to withdraw")]
    NothingToWithdraw,

    #[msg("Withdraw queue must be a permutation of the active strategies")]
    QueueInvariantViolation,

    #[msg("Fee rate exceeds 10000 basis points")]
    InvalidFeeRate,

    #[msg("Profit unlock period exceeds one year")]
    InvalidUnlockPeriod,

    #[msg("Shares can only be minted or redeemed through deposit and withdraw")]
    DirectShareOperationDisabled,

    #[msg("Reentrant call into the vault")]
    Reentrancy,

    #[msg("Strategy returned an invalid response")]
    InvalidStrategyResponse,

    #[msg("Strategy accounts are malformed or do not match the registry")]
    InvalidStrategyAccounts,

    #[msg("Accounts for a queued strategy were not supplied")]
    StrategyAccountsMissing,

    #[msg("Accountant accounts do not match the vault accountant")]
    InvalidAccountant,

    #[msg("Vault accounting invariant violated")]
    AccountingInvariantViolated,
}
