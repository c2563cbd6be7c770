use anchor_lang::{
    prelude::*,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program::{get_return_data, invoke_signed},
    },
};
use anchor_spl::token::{self, Approve, Revoke, TokenAccount, Transfer};

use crate::{
    adapters::{Accountant, StrategyAdapter},
    constants::*,
    errors::VaultError,
    state::{StrategyRegistry, VaultState},
    utils::{delegated_allowance, token_balance, VaultSigner},
};

/// Vault-side accounts every strategy or accountant CPI needs
#[derive(Clone)]
pub struct VaultAccounts<'info> {
    pub vault_authority: AccountInfo<'info>,
    pub vault_token_account: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub signer: VaultSigner,
}

impl<'info> VaultAccounts<'info> {
    pub fn new(
        vault_authority: AccountInfo<'info>,
        vault_token_account: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        vault_state: &VaultState,
    ) -> Self {
        Self {
            vault_authority,
            vault_token_account,
            token_program,
            signer: VaultSigner::new(vault_state),
        }
    }

    fn vault_balance(&self) -> Result<u64> {
        token_balance(&self.vault_token_account)
    }
}

/// Strategy program reached through CPI.
///
/// Interface: `deposit_up_to(u64)`, `free_up_to(u64)`, `report_value()`,
/// `max_deposit()`, `max_withdraw()`, each answering a little-endian u64
/// through return data. Asset movements are measured on the vault token
/// account rather than trusted from the response.
#[derive(Clone)]
pub struct CpiStrategy<'info> {
    strategy: AccountInfo<'info>,
    program: AccountInfo<'info>,
    strategy_token_account: AccountInfo<'info>,
    vault: VaultAccounts<'info>,
}

impl<'info> CpiStrategy<'info> {
    fn instruction(&self, discriminator: [u8; 8], amount: Option<u64>) -> Instruction {
        let mut data = discriminator.to_vec();
        if let Some(amount) = amount {
            data.extend_from_slice(&amount.to_le_bytes());
        }

        Instruction {
            program_id: self.program.key(),
            accounts: vec![
                AccountMeta::new(self.strategy.key(), false),
                AccountMeta::new_readonly(self.vault.vault_authority.key(), true),
                AccountMeta::new(self.vault.vault_token_account.key(), false),
                AccountMeta::new(self.strategy_token_account.key(), false),
                AccountMeta::new_readonly(self.vault.token_program.key(), false),
            ],
            data,
        }
    }

    fn invoke(&self, discriminator: [u8; 8], amount: Option<u64>) -> Result<()> {
        let instruction = self.instruction(discriminator, amount);
        let account_infos = [
            self.strategy.clone(),
            self.vault.vault_authority.clone(),
            self.vault.vault_token_account.clone(),
            self.strategy_token_account.clone(),
            self.vault.token_program.clone(),
            self.program.clone(),
        ];
        let seeds = self.vault.signer.seeds();
        invoke_signed(&instruction, &account_infos, &[&seeds[..]])?;
        Ok(())
    }

    fn query(&self, discriminator: [u8; 8]) -> Result<u64> {
        self.invoke(discriminator, None)?;
        decode_return_data(get_return_data(), &self.program.key())
    }

    fn approve_strategy(&self, amount: u64) -> Result<()> {
        let seeds = self.vault.signer.seeds();
        let signer_seeds = &[&seeds[..]];
        let approve_ctx = CpiContext::new_with_signer(
            self.vault.token_program.clone(),
            Approve {
                to: self.vault.vault_token_account.clone(),
                delegate: self.strategy.clone(),
                authority: self.vault.vault_authority.clone(),
            },
            signer_seeds,
        );
        token::approve(approve_ctx, amount)
    }

    fn revoke_strategy(&self) -> Result<()> {
        let seeds = self.vault.signer.seeds();
        let signer_seeds = &[&seeds[..]];
        let revoke_ctx = CpiContext::new_with_signer(
            self.vault.token_program.clone(),
            Revoke {
                source: self.vault.vault_token_account.clone(),
                authority: self.vault.vault_authority.clone(),
            },
            signer_seeds,
        );
        token::revoke(revoke_ctx)
    }
}

impl<'info> StrategyAdapter for CpiStrategy<'info> {
    fn strategy(&self) -> Pubkey {
        self.strategy.key()
    }

    fn deposit_up_to(&mut self, amount: u64) -> Result<u64> {
        let balance_before = self.vault.vault_balance()?;
        self.approve_strategy(amount)?;
        self.invoke(DEPOSIT_UP_TO_DISCRIMINATOR, Some(amount))?;
        self.revoke_strategy()?;
        let balance_after = self.vault.vault_balance()?;

        balance_before
            .checked_sub(balance_after)
            .ok_or(error!(VaultError::InvalidStrategyResponse))
    }

    fn free_up_to(&mut self, amount: u64) -> Result<u64> {
        let balance_before = self.vault.vault_balance()?;
        self.invoke(FREE_UP_TO_DISCRIMINATOR, Some(amount))?;
        let balance_after = self.vault.vault_balance()?;

        balance_after
            .checked_sub(balance_before)
            .ok_or(error!(VaultError::InvalidStrategyResponse))
    }

    fn report_value(&mut self) -> Result<u64> {
        self.query(REPORT_VALUE_DISCRIMINATOR)
    }

    fn max_deposit(&mut self) -> Result<u64> {
        self.query(MAX_DEPOSIT_DISCRIMINATOR)
    }

    fn max_withdraw(&mut self) -> Result<u64> {
        self.query(MAX_WITHDRAW_DISCRIMINATOR)
    }
}

/// Build CPI adapters from remaining accounts laid out as
/// `[strategy, strategy program, strategy token account]` triples.
///
/// Every strategy must be registered with a matching program id and its
/// token account must hold the vault asset.
pub fn load_strategies<'info>(
    remaining_accounts: &[AccountInfo<'info>],
    registry: &StrategyRegistry,
    vault_state: &VaultState,
    vault: &VaultAccounts<'info>,
) -> Result<Vec<CpiStrategy<'info>>> {
    check_layout(remaining_accounts.len())?;

    let mut strategies: Vec<CpiStrategy<'info>> =
        Vec::with_capacity(remaining_accounts.len() / STRATEGY_ACCOUNTS_LEN);
    for group in remaining_accounts.chunks_exact(STRATEGY_ACCOUNTS_LEN) {
        let strategy = load_strategy(group, registry, vault_state, vault)?;
        require!(
            !strategies.iter().any(|s| s.strategy.key == strategy.strategy.key),
            VaultError::InvalidStrategyAccounts
        );
        strategies.push(strategy);
    }
    Ok(strategies)
}

/// Like `load_strategies`, but groups that fail validation are logged and
/// left out instead of failing the whole batch
pub fn load_available_strategies<'info>(
    remaining_accounts: &[AccountInfo<'info>],
    registry: &StrategyRegistry,
    vault_state: &VaultState,
    vault: &VaultAccounts<'info>,
) -> Result<Vec<CpiStrategy<'info>>> {
    check_layout(remaining_accounts.len())?;

    let candidates = remaining_accounts
        .chunks_exact(STRATEGY_ACCOUNTS_LEN)
        .map(|group| (*group[0].key, load_strategy(group, registry, vault_state, vault)));
    Ok(select_available(candidates))
}

/// Keep the first successfully loaded entry per strategy key
pub(crate) fn select_available<T>(
    candidates: impl IntoIterator<Item = (Pubkey, Result<T>)>,
) -> Vec<T> {
    let mut keys: Vec<Pubkey> = Vec::with_capacity(MAX_STRATEGIES);
    let mut selected = Vec::with_capacity(MAX_STRATEGIES);
    for (key, loaded) in candidates {
        match loaded {
            Ok(_) if keys.contains(&key) => msg!("Duplicate accounts for strategy {}", key),
            Ok(item) => {
                keys.push(key);
                selected.push(item);
            }
            Err(e) => msg!("Invalid accounts for strategy {}: {}", key, e),
        }
    }
    selected
}

fn check_layout(accounts_len: usize) -> Result<()> {
    require!(
        accounts_len % STRATEGY_ACCOUNTS_LEN == 0
            && accounts_len / STRATEGY_ACCOUNTS_LEN <= MAX_STRATEGIES,
        VaultError::InvalidStrategyAccounts
    );
    Ok(())
}

/// Decode a strategy's `u64` answer. The runtime strips trailing zero bytes
/// from return data, so shorter payloads are zero-extended.
pub(crate) fn decode_return_data(
    return_data: Option<(Pubkey, Vec<u8>)>,
    program_id: &Pubkey,
) -> Result<u64> {
    let (returned_by, data) = return_data.ok_or(error!(VaultError::InvalidStrategyResponse))?;
    require_keys_eq!(returned_by, *program_id, VaultError::InvalidStrategyResponse);
    require!(data.len() <= 8, VaultError::InvalidStrategyResponse);

    let mut bytes = [0u8; 8];
    bytes[..data.len()].copy_from_slice(&data);
    Ok(u64::from_le_bytes(bytes))
}

fn load_strategy<'info>(
    group: &[AccountInfo<'info>],
    registry: &StrategyRegistry,
    vault_state: &VaultState,
    vault: &VaultAccounts<'info>,
) -> Result<CpiStrategy<'info>> {
    let (strategy, program, strategy_token_account) = (&group[0], &group[1], &group[2]);

    let record = registry.get(strategy.key)?;
    require_keys_eq!(
        program.key(),
        record.program,
        VaultError::InvalidStrategyAccounts
    );
    require!(program.executable, VaultError::InvalidStrategyAccounts);

    let token_account = {
        let data = strategy_token_account.try_borrow_data()?;
        TokenAccount::try_deserialize(&mut &data[..])?
    };
    require_keys_eq!(
        token_account.mint,
        vault_state.asset_mint,
        VaultError::InvalidMint
    );

    Ok(CpiStrategy {
        strategy: strategy.clone(),
        program: program.clone(),
        strategy_token_account: strategy_token_account.clone(),
        vault: vault.clone(),
    })
}

/// Accountant backed by an SPL token account that delegates an allowance to
/// the vault authority
pub struct TokenAccountant<'info> {
    source: AccountInfo<'info>,
    vault: VaultAccounts<'info>,
}

impl<'info> TokenAccountant<'info> {
    pub fn new(source: AccountInfo<'info>, vault: VaultAccounts<'info>) -> Self {
        Self { source, vault }
    }
}

impl<'info> Accountant for TokenAccountant<'info> {
    fn available_refund(&mut self) -> Result<u64> {
        let account = {
            let data = self.source.try_borrow_data()?;
            TokenAccount::try_deserialize(&mut &data[..])?
        };
        Ok(delegated_allowance(
            account.delegate,
            account.delegated_amount,
            account.amount,
            &self.vault.vault_authority.key(),
        ))
    }

    fn pull_refund(&mut self, amount: u64) -> Result<()> {
        let seeds = self.vault.signer.seeds();
        let signer_seeds = &[&seeds[..]];
        let transfer_ctx = CpiContext::new_with_signer(
            self.vault.token_program.clone(),
            Transfer {
                from: self.source.clone(),
                to: self.vault.vault_token_account.clone(),
                authority: self.vault.vault_authority.clone(),
            },
            signer_seeds,
        );
        token::transfer(transfer_ctx, amount)
    }
}
