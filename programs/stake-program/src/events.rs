use anchor_lang::prelude::*;

/// Emitted once per mint when its reward vault is created
#[event]
pub struct RewardVaultInitialized {
    pub mint: Pubkey,
    pub reward_vault: Pubkey,
}

#[event]
pub struct Staked {
    pub staker: Pubkey,
    pub mint: Pubkey,
    /// Amount moved into the vault by this stake
    pub amount: u64,
    /// Position size after the stake
    pub total_staked: u64,
    pub stake_at: i64,
}

#[event]
pub struct Unstaked {
    pub staker: Pubkey,
    pub mint: Pubkey,
    /// Principal returned to the staker
    pub amount: u64,
    /// Reward paid out of the reward vault
    pub reward: u64,
    /// Position size after the unstake
    pub remaining: u64,
}
