use anchor_lang::prelude::*;

/// Event emitted when a new vault is initialized
#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,
    pub deposit_limit: u64,
    pub profit_max_unlock_time: u64,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub receiver: Pubkey,
    pub asset_amount: u64,
    pub shares_minted: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when assets are withdrawn
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub owner: Pubkey,
    pub receiver: Pubkey,
    pub asset_amount: u64,
    pub shares_burned: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when a strategy is added to the registry
#[event]
pub struct StrategyAdded {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub program: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when a strategy is revoked
#[event]
pub struct StrategyRevoked {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub loss: u64,
    pub timestamp: i64,
}

#[event]
pub struct MaxDebtUpdated {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub max_debt: u64,
}

#[event]
pub struct WithdrawQueueUpdated {
    pub vault: Pubkey,
    pub queue: Vec<Pubkey>,
    pub queue_stop: u8,
}

/// Event emitted when assets move between idle and a strategy
#[event]
pub struct DebtUpdated {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub previous_debt: u64,
    pub new_debt: u64,
    pub total_idle: u64,
    pub timestamp: i64,
}

/// Event emitted when a strategy's profit or loss is recognized
#[event]
pub struct StrategyReported {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub gain: u64,
    pub loss: u64,
    pub current_debt: u64,
    pub fee_assets: u64,
    pub fee_shares: u64,
    pub refund: u64,
    pub timestamp: i64,
}

/// Event emitted when a batch harvest leaves a strategy out
#[event]
pub struct HarvestSkipped {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when any runtime setting changes
#[event]
pub struct ConfigUpdated {
    pub vault: Pubkey,
    pub deposit_limit: u64,
    pub withdraw_limit: u64,
    pub minimum_total_idle: u64,
    pub protocol_fee_bps: u16,
    pub profit_max_unlock_time: u64,
    pub accountant: Pubkey,
}

/// Event emitted when the authority pulls assets out in an emergency
#[event]
pub struct EmergencyWithdrawn {
    pub vault: Pubkey,
    pub recipient: Pubkey,
    pub strategy: Option<Pubkey>,
    pub from_idle: u64,
    pub freed: u64,
    pub written_off: u64,
    pub timestamp: i64,
}
