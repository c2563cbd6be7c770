// Constants for the Strategy Vault program

/// Seed for vault state PDA
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed for share mint PDA
pub const SHARE_MINT_SEED: &[u8] = b"shares";

/// Seed for vault token account PDA
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Seed for the strategy registry PDA
pub const STRATEGY_REGISTRY_SEED: &[u8] = b"strategy_registry";

/// Maximum number of strategies live at once. Bounds every loop over strategies.
pub const MAX_STRATEGIES: usize = 5;

/// 100% in basis points
pub const MAX_BPS: u64 = 10_000;

/// Fixed-point scale of the profit unlock rate
pub const SCALE: u128 = 1_000_000_000_000;

/// Longest allowed profit unlock period (one year, in seconds)
pub const MAX_PROFIT_UNLOCK_PERIOD: u64 = 31_556_952;

/// Accounts passed per strategy in remaining accounts:
/// [strategy, strategy program, strategy token account]
pub const STRATEGY_ACCOUNTS_LEN: usize = 3;

// Strategy program instruction discriminators: sha256("global:<name>")[..8]
pub const DEPOSIT_UP_TO_DISCRIMINATOR: [u8; 8] = [100, 211, 206, 141, 201, 208, 87, 55];
pub const FREE_UP_TO_DISCRIMINATOR: [u8; 8] = [137, 146, 140, 97, 184, 146, 34, 170];
pub const REPORT_VALUE_DISCRIMINATOR: [u8; 8] = [174, 151, 171, 75, 154, 188, 28, 230];
pub const MAX_DEPOSIT_DISCRIMINATOR: [u8; 8] = [160, 113, 66, 36, 132, 127, 192, 252];
pub const MAX_WITHDRAW_DISCRIMINATOR: [u8; 8] = [120, 205, 134, 47, 124, 123, 74, 119];

/// Space for VaultState account (8 discriminator + 4 * 32 keys + 3 * 8 totals +
/// 8 minimum idle + 2 fee + 2 * 8 limits + ProfitLock (8 + 16 + 8 + 8 + 8) +
/// 1 locked + 3 bumps + 32 padding)
pub const VAULT_STATE_SIZE: usize =
    8 + (4 * 32) + (3 * 8) + 8 + 2 + (2 * 8) + (8 + 16 + 8 + 8 + 8) + 1 + 3 + 32;

/// Space for one StrategyRecord (strategy + program + activation + current_debt +
/// max_debt + last_report)
pub const STRATEGY_RECORD_SIZE: usize = 32 + 32 + 8 + 8 + 8 + 8;

/// Space for StrategyRegistry account (8 discriminator + 32 vault +
/// 4 + MAX_STRATEGIES records + 4 + MAX_STRATEGIES queue keys + 1 queue stop +
/// 1 bump + 64 padding)
pub const STRATEGY_REGISTRY_SIZE: usize = 8
    + 32
    + 4
    + (MAX_STRATEGIES * STRATEGY_RECORD_SIZE)
    + 4
    + (MAX_STRATEGIES * 32)
    + 1
    + 1
    + 64;
