use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{constants::*, events::RewardVaultInitialized};

/// Create the reward vault for a mint
/// The vault is a token account owned by its own PDA, so only this program
/// can move tokens out of it
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Pays for the vault account
    #[account(mut)]
    pub admin: Signer<'info>,

    /// Reward vault for `mint`
    /// PDA: ["reward", mint.key()]
    /// A second initialize for the same mint fails: the account is already in use
    #[account(
        init,
        payer = admin,
        seeds = [REWARD_SEED, mint.key().as_ref()],
        bump,
        token::mint = mint,
        token::authority = reward_vault,
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    /// The mint rewards are paid in (same as the staked mint)
    pub mint: Account<'info, Mint>,

    /// Required system programs
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

impl<'info> Initialize<'info> {
    pub fn initialize(&mut self, bumps: &InitializeBumps) -> Result<()> {
        msg!(
            "Reward vault initialized: mint={}, vault={}, bump={}, balance={}",
            self.mint.key(),
            self.reward_vault.key(),
            bumps.reward_vault,
            self.reward_vault.amount
        );

        emit!(RewardVaultInitialized {
            mint: self.mint.key(),
            reward_vault: self.reward_vault.key(),
        });

        Ok(())
    }
}
