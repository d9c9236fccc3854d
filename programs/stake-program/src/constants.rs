// PDA Seeds for deterministic address generation

/// Seed for RewardVault PDAs: ["reward", mint.key()]
/// One reward vault per mint, shared by every staker of that mint
pub const REWARD_SEED: &[u8] = b"reward";

/// Seed for StakeInfo PDAs: ["stake_info", staker.key(), mint.key()]
/// This ensures one stake position per staker per mint
pub const STAKE_INFO_SEED: &[u8] = b"stake_info";

// Reward Configuration

/// Basis point denominator (100% = 10_000 bps)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default flat reward paid on unstake, in basis points of the unstaked amount
pub const DEFAULT_REWARD_RATE_BPS: u16 = 100; // 1%

/// Precision multiplier for per-second reward rates (1e9)
/// Rates are stored as reward units per second per staked unit * 1e9
pub const RATE_PRECISION: u128 = 1_000_000_000;

/// Default time-weighted rate: ~10% per year on the unstaked amount
pub const DEFAULT_REWARD_RATE_PER_SECOND: u64 = 3;

// Account Space Constants

/// Anchor discriminator size (8 bytes)
pub const DISCRIMINATOR_SIZE: usize = 8;

/// Check if a basis point rate is within 0..=100%
pub fn is_valid_rate_bps(rate_bps: u16) -> bool {
    u64::from(rate_bps) <= BPS_DENOMINATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_bps_validation() {
        assert!(is_valid_rate_bps(DEFAULT_REWARD_RATE_BPS));
        assert!(is_valid_rate_bps(0));
        assert!(is_valid_rate_bps(10_000));
        assert!(!is_valid_rate_bps(10_001));
    }

    #[test]
    fn test_seeds_are_distinct() {
        assert_ne!(REWARD_SEED, STAKE_INFO_SEED);
    }
}
