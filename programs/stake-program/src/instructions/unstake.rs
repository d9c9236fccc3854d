use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    constants::*,
    engine::{self, PositionView, Request, RewardView},
    error::StakeError,
    events::Unstaked,
    ledger::{AccountStore, Custody, LedgerTx, Mutation, PlannedTransfer},
    reward::{self, RewardPolicy},
    state::StakeInfo,
};

/// Unstake tokens of a mint
/// Returns the requested amount from the position's vault and pays a
/// reward out of the mint's reward vault
#[derive(Accounts)]
pub struct Unstake<'info> {
    /// The staker; must be the owner recorded in the position
    #[account(mut)]
    pub staker: Signer<'info>,

    /// The staked mint
    pub mint: Account<'info, Mint>,

    /// Staker's position for this mint
    /// PDA: ["stake_info", stake_info.staker, mint.key()]
    /// Seeds come from the record so a foreign signer gets InvalidAuthority
    #[account(
        mut,
        seeds = [STAKE_INFO_SEED, stake_info.staker.as_ref(), mint.key().as_ref()],
        bump = stake_info.bump,
        constraint = stake_info.staker == staker.key() @ StakeError::InvalidAuthority,
        constraint = stake_info.mint == mint.key() @ StakeError::InvalidMint,
    )]
    pub stake_info: Account<'info, StakeInfo>,

    /// Custody account holding the staked tokens
    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = stake_info,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// Reward vault for the mint
    /// PDA: ["reward", mint.key()]
    #[account(
        mut,
        seeds = [REWARD_SEED, mint.key().as_ref()],
        bump,
        token::mint = mint,
        token::authority = reward_vault,
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    /// Staker's wallet; receives the principal and the reward
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

impl<'info> Unstake<'info> {
    /// Execute the unstaking operation
    pub fn unstake(&mut self, amount: u64, bumps: &UnstakeBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;

        let request = Request {
            signer: self.staker.key(),
            staker: self.stake_info.staker,
            mint: self.mint.key(),
            amount,
            now,
        };

        let rewards = RewardView {
            address: self.reward_vault.key(),
            bump: bumps.reward_vault,
            balance: self.reward_vault.amount,
        };

        let policy = reward::active_policy();
        let plan = engine::plan_unstake(&request, &self.position(), &rewards, &policy)?;

        msg!(
            "Unstake planned: amount={}, reward={} ({}), remaining={}",
            amount,
            plan.reward,
            policy.name(),
            plan.remaining
        );

        self.commit(plan.tx)?;

        // The vault must still cover the ledger after the payout
        self.vault_token_account.reload()?;
        self.reward_vault.reload()?;
        require_gte!(
            self.vault_token_account.amount,
            self.stake_info.amount,
            StakeError::VaultBalanceMismatch
        );

        msg!(
            "UNSTAKE EVENT: staker={}, mint={}, amount={}, reward={}, remaining={}, reward_vault_balance={}",
            self.staker.key(),
            self.mint.key(),
            amount,
            plan.reward,
            self.stake_info.amount,
            self.reward_vault.amount
        );

        emit!(Unstaked {
            staker: self.staker.key(),
            mint: self.mint.key(),
            amount,
            reward: plan.reward,
            remaining: plan.remaining,
        });

        Ok(())
    }

    fn position(&self) -> PositionView {
        PositionView {
            stake_info: self.stake_info.key(),
            record: (*self.stake_info).clone(),
            bump: self.stake_info.bump,
            vault: self.vault_token_account.key(),
            vault_exists: true,
            vault_balance: self.vault_token_account.amount,
            staker_account: self.staker_token_account.key(),
            staker_balance: self.staker_token_account.amount,
        }
    }

    fn token_account(&self, key: &Pubkey) -> Result<AccountInfo<'info>> {
        if *key == self.vault_token_account.key() {
            Ok(self.vault_token_account.to_account_info())
        } else if *key == self.reward_vault.key() {
            Ok(self.reward_vault.to_account_info())
        } else if *key == self.staker_token_account.key() {
            Ok(self.staker_token_account.to_account_info())
        } else {
            err!(StakeError::UnknownAccount)
        }
    }

    /// Move tokens out of a program-owned vault, signing with its PDA seeds
    fn transfer_tokens(&self, transfer: &PlannedTransfer) -> Result<()> {
        let staker = self.stake_info.staker;
        let mint = self.mint.key();

        let bump_seed = match transfer.custody {
            Custody::StakeInfo { address, bump } => {
                require_keys_eq!(address, self.stake_info.key(), StakeError::InvalidAuthority);
                [bump]
            }
            Custody::RewardVault { bump } => [bump],
            // Unstake never pulls from the staker's wallet
            Custody::Staker { .. } => return err!(StakeError::InvalidAuthority),
        };
        let stake_info_seeds = [STAKE_INFO_SEED, staker.as_ref(), mint.as_ref(), &bump_seed[..]];
        let reward_seeds = [REWARD_SEED, mint.as_ref(), &bump_seed[..]];

        let (authority, seeds): (AccountInfo<'info>, &[&[u8]]) = match transfer.custody {
            Custody::StakeInfo { .. } => (self.stake_info.to_account_info(), &stake_info_seeds[..]),
            _ => (self.reward_vault.to_account_info(), &reward_seeds[..]),
        };
        let signer_seeds = &[seeds];

        let transfer_ctx = CpiContext::new_with_signer(
            self.token_program.to_account_info(),
            Transfer {
                from: self.token_account(&transfer.from)?,
                to: self.token_account(&transfer.to)?,
                authority,
            },
            signer_seeds,
        );
        token::transfer(transfer_ctx, transfer.amount)?;

        msg!(
            "Transferred {} tokens from {} to staker",
            transfer.amount,
            transfer.from
        );

        Ok(())
    }
}

impl<'info> AccountStore for Unstake<'info> {
    fn commit(&mut self, tx: LedgerTx) -> Result<()> {
        for mutation in tx.into_mutations() {
            match mutation {
                // The vault already exists: the position was funded by a stake
                Mutation::OpenVault { .. } => return err!(StakeError::UnknownAccount),
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
