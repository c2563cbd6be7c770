use anchor_lang::{prelude::*, solana_program::program_option::COption};
use anchor_spl::token::{self, Burn, MintTo, TokenAccount, Transfer};

use crate::{constants::VAULT_AUTHORITY_SEED, state::VaultState};

/// Amount `spender` may move out of a token account through its delegation
pub fn delegated_allowance(
    delegate: COption<Pubkey>,
    delegated_amount: u64,
    amount: u64,
    spender: &Pubkey,
) -> u64 {
    match delegate {
        COption::Some(delegate) if delegate == *spender => delegated_amount.min(amount),
        _ => 0,
    }
}

/// Current balance of an SPL token account, read straight from account data
pub fn token_balance(account: &AccountInfo) -> Result<u64> {
    let data = account.try_borrow_data()?;
    let token_account = TokenAccount::try_deserialize(&mut &data[..])?;
    Ok(token_account.amount)
}

/// Seeds of the vault authority PDA, kept by value so CPIs can borrow them
#[derive(Clone, Copy, Debug)]
pub struct VaultSigner {
    asset_mint: Pubkey,
    bump: [u8; 1],
}

impl VaultSigner {
    pub fn new(vault_state: &VaultState) -> Self {
        Self {
            asset_mint: vault_state.asset_mint,
            bump: [vault_state.authority_bump],
        }
    }

    pub fn seeds(&self) -> [&[u8]; 3] {
        [VAULT_AUTHORITY_SEED, self.asset_mint.as_ref(), &self.bump]
    }
}

/// Transfer assets out of the vault token account
pub fn transfer_from_vault<'info>(
    token_program: &AccountInfo<'info>,
    vault_token_account: &AccountInfo<'info>,
    destination: &AccountInfo<'info>,
    vault_authority: &AccountInfo<'info>,
    signer: &VaultSigner,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let seeds = signer.seeds();
    let signer_seeds = &[&seeds[..]];
    let transfer_ctx = CpiContext::new_with_signer(
        token_program.clone(),
        Transfer {
            from: vault_token_account.clone(),
            to: destination.clone(),
            authority: vault_authority.clone(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount)
}

/// Mint shares with the vault authority as mint authority
pub fn mint_shares<'info>(
    token_program: &AccountInfo<'info>,
    share_mint: &AccountInfo<'info>,
    destination: &AccountInfo<'info>,
    vault_authority: &AccountInfo<'info>,
    signer: &VaultSigner,
    shares: u64,
) -> Result<()> {
    if shares == 0 {
        return Ok(());
    }
    let seeds = signer.seeds();
    let signer_seeds = &[&seeds[..]];
    let mint_ctx = CpiContext::new_with_signer(
        token_program.clone(),
        MintTo {
            mint: share_mint.clone(),
            to: destination.clone(),
            authority: vault_authority.clone(),
        },
        signer_seeds,
    );
    token::mint_to(mint_ctx, shares)
}

/// Burn shares held by the vault itself
pub fn burn_vault_shares<'info>(
    token_program: &AccountInfo<'info>,
    share_mint: &AccountInfo<'info>,
    vault_share_account: &AccountInfo<'info>,
    vault_authority: &AccountInfo<'info>,
    signer: &VaultSigner,
    shares: u64,
) -> Result<()> {
    if shares == 0 {
        return Ok(());
    }
    let seeds = signer.seeds();
    let signer_seeds = &[&seeds[..]];
    let burn_ctx = CpiContext::new_with_signer(
        token_program.clone(),
        Burn {
            mint: share_mint.clone(),
            from: vault_share_account.clone(),
            authority: vault_authority.clone(),
        },
        signer_seeds,
    );
    token::burn(burn_ctx, shares)
}
