use anchor_lang::prelude::*;

use crate::{constants::*, error::StakeError};

/// Everything a policy may look at when pricing an unstake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardInput {
    /// Amount being unstaked in this transaction
    pub unstake_amount: u64,
    /// Position size before the unstake
    pub staked_amount: u64,
    /// When the position was last staked into
    pub stake_at: i64,
    /// Current unix timestamp
    pub now: i64,
    /// Reward vault balance available for payout
    pub available: u64,
}

/// Pricing rule for the reward released on unstake
///
/// Policies compute an unclamped reward; `release` caps it at the vault
/// balance, so a policy never has to know how well funded the vault is.
pub trait RewardPolicy {
    fn name(&self) -> &'static str;

    fn compute(&self, input: &RewardInput) -> Result<u64>;
}

/// Fixed share of the unstaked amount, in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRate {
    pub rate_bps: u16,
}

impl Default for FlatRate {
    fn default() -> Self {
        Self {
            rate_bps: DEFAULT_REWARD_RATE_BPS,
        }
    }
}

impl RewardPolicy for FlatRate {
    fn name(&self) -> &'static str {
        "flat-rate"
    }

    fn compute(&self, input: &RewardInput) -> Result<u64> {
        require!(is_valid_rate_bps(self.rate_bps), StakeError::InvalidRewardRate);

        // Formula: unstake_amount * rate_bps / 10_000
        let reward = (input.unstake_amount as u128)
            .checked_mul(self.rate_bps as u128)
            .and_then(|x| x.checked_div(BPS_DENOMINATOR as u128))
            .ok_or(StakeError::MathOverflow)?;

        u64::try_from(reward).map_err(|_| error!(StakeError::MathOverflow))
    }
}

/// Reward proportional to how long the unstaked tokens sat in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWeighted {
    /// Reward units per second per staked unit, scaled by RATE_PRECISION
    pub rate_per_second: u64,
}

impl Default for TimeWeighted {
    fn default() -> Self {
        Self {
            rate_per_second: DEFAULT_REWARD_RATE_PER_SECOND,
        }
    }
}

impl RewardPolicy for TimeWeighted {
    fn name(&self) -> &'static str {
        "time-weighted"
    }

    fn compute(&self, input: &RewardInput) -> Result<u64> {
        // Clock skew never produces a negative reward
        let elapsed = input.now.saturating_sub(input.stake_at).max(0) as u128;

        // Formula: (unstake_amount * rate_per_second * elapsed) / RATE_PRECISION
        let reward = (input.unstake_amount as u128)
            .checked_mul(self.rate_per_second as u128)
            .and_then(|x| x.checked_mul(elapsed))
            .and_then(|x| x.checked_div(RATE_PRECISION))
            .ok_or(StakeError::MathOverflow)?;

        // Anything past u64 is far beyond any vault balance
        Ok(u64::try_from(reward).unwrap_or(u64::MAX))
    }
}

/// Policy compiled into the program
#[cfg(not(feature = "time-weighted-rewards"))]
pub fn active_policy() -> FlatRate {
    FlatRate::default()
}

/// Policy compiled into the program
#[cfg(feature = "time-weighted-rewards")]
pub fn active_policy() -> TimeWeighted {
    TimeWeighted::default()
}

/// Reward actually paid out: the policy's figure, clamped to the vault balance
pub fn release(policy: &dyn RewardPolicy, input: &RewardInput) -> Result<u64> {
    let computed = policy.compute(input)?;
    let released = computed.min(input.available);

    if released < computed {
        msg!(
            "Reward clamped to vault balance: computed={}, available={}",
            computed,
            input.available
        );
    }

    Ok(released)
}
