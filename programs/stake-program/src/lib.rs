#![allow(unexpected_cfgs, deprecated)]
use anchor_lang::prelude::*;

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod pda;
pub mod reward;
pub mod state;
#[cfg(not(target_os = "solana"))]
pub mod store;
pub mod validation;

use instructions::*;

declare_id!("9aRvvULZXeWQrd7yFdJTgPS48RfCJSDhTAWft7Ve8yn2");

#[program]
pub mod stake_program {
    use super::*;

    /// Create the reward vault for a mint
    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        ctx.accounts.initialize(&ctx.bumps)
    }

    /// Stake tokens into the staker's position for a mint
    /// Opens the position and its vault on the first stake
    pub fn stake(ctx: Context<Stake>, amount: u64) -> Result<()> {
        ctx.accounts.stake(amount, &ctx.bumps)
    }

    /// Withdraw part or all of a position and collect a reward
    pub fn unstake(ctx: Context<Unstake>, amount: u64) -> Result<()> {
        ctx.accounts.unstake(amount, &ctx.bumps)
    }
}
