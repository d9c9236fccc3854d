use anchor_lang::error::{Error, ERROR_CODE_OFFSET};
use anchor_lang::prelude::*;

/// Custom error types for the stake program
/// Every error is local to one transaction: nothing here is fatal to the caller
#[error_code]
pub enum StakeError {
    // Authorization Errors
    #[msg("Staker is not the owner of the stake information")]
    InvalidAuthority,

    // Amount Errors
    #[msg("Unstake amount is less than the staked amount")]
    InsufficientStake,

    #[msg("No tokens to stake")]
    ZeroAmount,

    #[msg("Insufficient token balance to stake")]
    InsufficientExternalBalance,

    // Position Errors
    #[msg("Tokens are not staked")]
    NotStaked,

    #[msg("Stake information belongs to a different mint")]
    InvalidMint,

    #[msg("Vault balance does not cover the recorded stake")]
    VaultBalanceMismatch,

    // Account Store Errors
    #[msg("Account already exists")]
    AlreadyExists,

    #[msg("Account was modified by a concurrent transaction, retry")]
    Contention,

    #[msg("No valid program address exists for these seeds")]
    AddressDerivationFailed,

    #[msg("Account is not part of this instruction")]
    UnknownAccount,

    // Reward Errors
    #[msg("Invalid reward rate provided")]
    InvalidRewardRate,

    // Math Errors
    #[msg("Mathematical overflow in calculations")]
    MathOverflow,
}

impl StakeError {
    /// On-chain error code (Anchor custom errors start at 6000)
    pub fn code(self) -> u32 {
        self as u32 + ERROR_CODE_OFFSET
    }

    /// Whether `err` was raised as this variant
    pub fn matches(self, err: &Error) -> bool {
        matches!(err, Error::AnchorError(e) if e.error_code_number == self.code())
    }

    /// Only write contention is worth resubmitting unchanged
    pub fn is_retryable(self) -> bool {
        matches!(self, StakeError::Contention)
    }

    /// Get human-readable error category
    pub fn category(self) -> &'static str {
        match self {
            StakeError::InvalidAuthority => "Authorization",
            StakeError::InsufficientStake
            | StakeError::ZeroAmount
            | StakeError::InsufficientExternalBalance => "Amount Validation",
            StakeError::NotStaked | StakeError::InvalidMint | StakeError::VaultBalanceMismatch => {
                "Stake Position"
            }
            StakeError::AlreadyExists
            | StakeError::Contention
            | StakeError::AddressDerivationFailed
            | StakeError::UnknownAccount => "Account Store",
            StakeError::InvalidRewardRate => "Reward Configuration",
            StakeError::MathOverflow => "Mathematical Operations",
        }
    }
}

/// Helper function to safely add two u64 values
pub fn safe_add_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| StakeError::MathOverflow.into())
}

/// Helper function to safely subtract two u64 values
pub fn safe_sub_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or_else(|| StakeError::MathOverflow.into())
}
