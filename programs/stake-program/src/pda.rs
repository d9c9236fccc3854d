use anchor_lang::prelude::*;
use anchor_spl::associated_token::get_associated_token_address;

use crate::{constants::*, error::StakeError};

/// A program derived address together with its bump
///
/// The address is off the ed25519 curve, so no keypair can sign for it:
/// only this program can, by re-supplying the seeds and bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    pub address: Pubkey,
    pub bump: u8,
}

impl Derived {
    /// Reward vault for a mint: ["reward", mint]
    pub fn reward_vault(program_id: &Pubkey, mint: &Pubkey) -> Result<Self> {
        Self::find(program_id, &[REWARD_SEED, mint.as_ref()])
    }

    /// Stake position for (staker, mint): ["stake_info", staker, mint]
    pub fn stake_info(program_id: &Pubkey, staker: &Pubkey, mint: &Pubkey) -> Result<Self> {
        Self::find(program_id, &[STAKE_INFO_SEED, staker.as_ref(), mint.as_ref()])
    }

    fn find(program_id: &Pubkey, seeds: &[&[u8]]) -> Result<Self> {
        match Pubkey::try_find_program_address(seeds, program_id) {
            Some((address, bump)) => Ok(Self { address, bump }),
            None => {
                msg!("Address derivation exhausted every bump for program {}", program_id);
                err!(StakeError::AddressDerivationFailed)
            }
        }
    }
}

/// Custody token account holding a position's stake (ATA owned by the StakeInfo PDA)
pub fn vault_token_account(stake_info: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(stake_info, mint)
}

/// The staker's own token account for a mint
pub fn staker_token_account(staker: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(staker, mint)
}
