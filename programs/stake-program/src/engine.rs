//! Stake ledger state machine.
//!
//! The engine never touches accounts. It reads a snapshot of the accounts an
//! instruction names, checks authorization and invariants, and answers with
//! the `LedgerTx` that the caller's `AccountStore` must commit.

use anchor_lang::prelude::*;

use crate::{
    error::StakeError,
    ledger::{Custody, LedgerTx},
    reward::{self, RewardInput, RewardPolicy},
    state::StakeInfo,
    validation::*,
};

/// Who asks for what
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Identity that authorized the transaction
    pub signer: Pubkey,
    /// Owner of the position being operated on
    pub staker: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub now: i64,
}

/// Snapshot of a position and the token accounts around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionView {
    pub stake_info: Pubkey,
    /// `StakeInfo::default()` when the position has never been opened
    pub record: StakeInfo,
    pub bump: u8,
    pub vault: Pubkey,
    pub vault_exists: bool,
    pub vault_balance: u64,
    pub staker_account: Pubkey,
    pub staker_balance: u64,
}

/// Snapshot of a mint's reward vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardView {
    pub address: Pubkey,
    pub bump: u8,
    pub balance: u64,
}

/// Outcome of planning an unstake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnstakePlan {
    pub tx: LedgerTx,
    pub reward: u64,
    pub remaining: u64,
}

/// Plan a stake: open the position if needed, pull `amount` into its vault
pub fn plan_stake(request: &Request, position: &PositionView) -> Result<LedgerTx> {
    require_positive(request.amount)?;
    require_authority(&request.staker, &request.signer)?;

    let mut record = if position.record.is_initialized() {
        require_authority(&position.record.staker, &request.signer)?;
        require_mint(&position.record.mint, &request.mint)?;
        position.record.clone()
    } else {
        StakeInfo::open(request.staker, request.mint, position.bump)
    };

    require_funds(
        position.staker_balance,
        request.amount,
        StakeError::InsufficientExternalBalance,
    )?;

    record.record_stake(request.amount, request.now)?;

    let mut builder = LedgerTx::builder();
    if !position.vault_exists {
        builder = builder.open_vault(position.vault, position.stake_info, request.mint);
    }

    Ok(builder
        .transfer(
            position.staker_account,
            position.vault,
            request.amount,
            Custody::Staker {
                owner: request.signer,
            },
        )
        .write_stake_info(position.stake_info, record)
        .build())
}

/// Plan an unstake: return `amount` from the vault and release a reward
pub fn plan_unstake(
    request: &Request,
    position: &PositionView,
    rewards: &RewardView,
    policy: &dyn RewardPolicy,
) -> Result<UnstakePlan> {
    require_positive(request.amount)?;
    require_authority(&request.staker, &request.signer)?;
    require!(position.record.is_initialized(), StakeError::NotStaked);
    require_authority(&position.record.staker, &request.signer)?;
    require_mint(&position.record.mint, &request.mint)?;

    if request.amount > position.record.amount {
        msg!(
            "Unstake of {} exceeds staked amount {}",
            request.amount,
            position.record.amount
        );
        return err!(StakeError::InsufficientStake);
    }

    // Donations to the vault are tolerated, a shortfall is not
    require_funds(
        position.vault_balance,
        position.record.amount,
        StakeError::VaultBalanceMismatch,
    )?;

    let reward = reward::release(
        policy,
        &RewardInput {
            unstake_amount: request.amount,
            staked_amount: position.record.amount,
            stake_at: position.record.stake_at,
            now: request.now,
            available: rewards.balance,
        },
    )?;

    let mut record = position.record.clone();
    record.record_unstake(request.amount)?;
    let remaining = record.amount;

    let tx = LedgerTx::builder()
        .transfer(
            position.vault,
            position.staker_account,
            request.amount,
            Custody::StakeInfo {
                address: position.stake_info,
                bump: position.record.bump,
            },
        )
        .transfer(
            rewards.address,
            position.staker_account,
            reward,
            Custody::RewardVault { bump: rewards.bump },
        )
        .write_stake_info(position.stake_info, record)
        .build();

    Ok(UnstakePlan {
        tx,
        reward,
        remaining,
    })
}
