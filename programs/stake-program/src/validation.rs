//! Authorization and amount checks shared by every mutating instruction.

use anchor_lang::prelude::*;

use crate::error::StakeError;

/// Amounts must be strictly positive before any transfer is attempted
pub fn require_positive(amount: u64) -> Result<()> {
    require!(amount > 0, StakeError::ZeroAmount);
    Ok(())
}

/// The signer must be the identity recorded as owner of the target record
pub fn require_authority(expected: &Pubkey, signer: &Pubkey) -> Result<()> {
    if expected != signer {
        msg!("Authority mismatch: expected {}, signed by {}", expected, signer);
        return err!(StakeError::InvalidAuthority);
    }
    Ok(())
}

pub fn require_mint(expected: &Pubkey, actual: &Pubkey) -> Result<()> {
    require_keys_eq!(*expected, *actual, StakeError::InvalidMint);
    Ok(())
}

/// `balance` must cover `amount`, otherwise fail with `shortfall`
pub fn require_funds(balance: u64, amount: u64, shortfall: StakeError) -> Result<()> {
    if balance < amount {
        msg!("Insufficient balance: has {}, needs {}", balance, amount);
        return Err(shortfall.into());
    }
    Ok(())
}
