use anchor_lang::prelude::*;

use crate::error::{safe_add_u64, safe_sub_u64, StakeError};

/// Individual stake position - one per staker per mint
/// PDA: ["stake_info", staker.key(), mint.key()]
///
/// The recorded `amount` always equals the staked balance held by the
/// vault token account (the associated token account of this PDA).
#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct StakeInfo {
    /// The staker who owns this position
    pub staker: Pubkey,

    /// The staked mint
    pub mint: Pubkey,

    /// Amount currently staked, in the mint's smallest unit
    pub amount: u64,

    /// Whether the position holds any stake
    pub is_staked: bool,

    /// Unix timestamp of the most recent stake
    pub stake_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl StakeInfo {
    /// Fresh position for a staker, before any tokens move
    pub fn open(staker: Pubkey, mint: Pubkey, bump: u8) -> Self {
        Self {
            staker,
            mint,
            amount: 0,
            is_staked: false,
            stake_at: 0,
            bump,
        }
    }

    /// A zeroed account (created by `init_if_needed`) has no staker yet
    pub fn is_initialized(&self) -> bool {
        self.staker != Pubkey::default()
    }

    /// Add `amount` to the position and restart its stake clock
    pub fn record_stake(&mut self, amount: u64, now: i64) -> Result<()> {
        self.amount = safe_add_u64(self.amount, amount)?;
        self.is_staked = true;
        self.stake_at = now;
        Ok(())
    }

    /// Remove `amount` from the position; clears `is_staked` once empty
    pub fn record_unstake(&mut self, amount: u64) -> Result<()> {
        require!(amount <= self.amount, StakeError::InsufficientStake);
        self.amount = safe_sub_u64(self.amount, amount)?;
        if self.amount == 0 {
            self.is_staked = false;
        }
        Ok(())
    }
}
