use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    constants::*,
    engine::{self, PositionView, Request},
    error::StakeError,
    events::Staked,
    ledger::{AccountStore, Custody, LedgerTx, Mutation, PlannedTransfer},
    state::StakeInfo,
};

/// Stake tokens of a mint
/// Opens the staker's position and its vault on first use, then moves
/// tokens from the staker's wallet into the vault
#[derive(Accounts)]
pub struct Stake<'info> {
    /// The staker; signs the transfer and pays for new accounts
    #[account(mut)]
    pub staker: Signer<'info>,

    /// The mint being staked
    pub mint: Account<'info, Mint>,

    /// Staker's position for this mint
    /// PDA: ["stake_info", staker.key(), mint.key()]
    #[account(
        init_if_needed,
        payer = staker,
        space = DISCRIMINATOR_SIZE + StakeInfo::INIT_SPACE,
        seeds = [STAKE_INFO_SEED, staker.key().as_ref(), mint.key().as_ref()],
        bump,
    )]
    pub stake_info: Account<'info, StakeInfo>,

    /// Custody account for the staked tokens, owned by the position PDA
    #[account(
        init_if_needed,
        payer = staker,
        associated_token::mint = mint,
        associated_token::authority = stake_info,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// Staker's wallet for this mint
    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = staker,
    )]
    pub staker_token_account: Account<'info, TokenAccount>,

    /// Required system programs
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

impl<'info> Stake<'info> {
    /// Execute the staking operation
    pub fn stake(&mut self, amount: u64, bumps: &StakeBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;

        let request = Request {
            signer: self.staker.key(),
            staker: self.staker.key(),
            mint: self.mint.key(),
            amount,
            now,
        };

        // Plan against the accounts as they are before any transfer
        let tx = engine::plan_stake(&request, &self.position(bumps))?;
        self.commit(tx)?;

        // The vault must cover the ledger after every stake
        self.vault_token_account.reload()?;
        require_gte!(
            self.vault_token_account.amount,
            self.stake_info.amount,
            StakeError::VaultBalanceMismatch
        );

        msg!(
            "STAKE EVENT: staker={}, mint={}, amount={}, total_staked={}",
            self.staker.key(),
            self.mint.key(),
            amount,
            self.stake_info.amount
        );

        emit!(Staked {
            staker: self.staker.key(),
            mint: self.mint.key(),
            amount,
            total_staked: self.stake_info.amount,
            stake_at: now,
        });

        Ok(())
    }

    fn position(&self, bumps: &StakeBumps) -> PositionView {
        PositionView {
            stake_info: self.stake_info.key(),
            record: (*self.stake_info).clone(),
            bump: bumps.stake_info,
            vault: self.vault_token_account.key(),
            // init_if_needed opens the vault together with the record, so an
            // unopened record means the vault was created by this instruction
            vault_exists: self.stake_info.is_initialized(),
            vault_balance: self.vault_token_account.amount,
            staker_account: self.staker_token_account.key(),
            staker_balance: self.staker_token_account.amount,
        }
    }

    fn token_account(&self, key: &Pubkey) -> Result<AccountInfo<'info>> {
        if *key == self.staker_token_account.key() {
            Ok(self.staker_token_account.to_account_info())
        } else if *key == self.vault_token_account.key() {
            Ok(self.vault_token_account.to_account_info())
        } else {
            err!(StakeError::UnknownAccount)
        }
    }

    /// Transfer tokens from the staker's wallet into the vault
    fn transfer_tokens(&self, transfer: &PlannedTransfer) -> Result<()> {
        // Stake only ever debits the staker's own wallet
        let staker_signed = Custody::Staker {
            owner: self.staker.key(),
        };
        require!(
            transfer.custody == staker_signed,
            StakeError::InvalidAuthority
        );

        let transfer_ctx = CpiContext::new(
            self.token_program.to_account_info(),
            Transfer {
                from: self.token_account(&transfer.from)?,
                to: self.token_account(&transfer.to)?,
                authority: self.staker.to_account_info(),
            },
        );
        token::transfer(transfer_ctx, transfer.amount)?;

        msg!("Transferred {} tokens to stake vault", transfer.amount);

        Ok(())
    }
}

impl<'info> AccountStore for Stake<'info> {
    fn commit(&mut self, tx: LedgerTx) -> Result<()> {
        for mutation in tx.into_mutations() {
            match mutation {
                Mutation::OpenVault {
                    address,
                    owner,
                    mint,
                } => {
                    require_keys_eq!(
                        address,
                        self.vault_token_account.key(),
                        StakeError::UnknownAccount
                    );
                    require_keys_eq!(
                        owner,
                        self.vault_token_account.owner,
                        StakeError::InvalidAuthority
                    );
                    require_keys_eq!(mint, self.vault_token_account.mint, StakeError::InvalidMint);
                    msg!("Opened stake vault {} for {}", address, owner);
                }
                Mutation::Transfer(transfer) => self.transfer_tokens(&transfer)?,
                Mutation::WriteStakeInfo { address, record } => {
                    require_keys_eq!(
                        address,
                        self.stake_info.key(),
                        StakeError::UnknownAccount
                    );
                    self.stake_info.set_inner(record);
                }
            }
        }
        Ok(())
    }
}
