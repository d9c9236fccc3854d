//! In-memory account store.
//!
//! Mirrors the contract the runtime gives the program: typed records, token
//! balances, all-or-nothing commits, and rejection (not interleaving) of two
//! writers on the same account. Used by tests and off-chain simulation.

use std::collections::{HashMap, HashSet};

use anchor_lang::prelude::*;

use crate::{
    engine::{self, PositionView, Request, RewardView},
    error::StakeError,
    ledger::{AccountStore, Custody, LedgerTx, Mutation},
    pda::{self, Derived},
    reward::{self, RewardPolicy},
    state::StakeInfo,
};

/// SPL token account fields the stake program cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

#[derive(Debug, Clone)]
struct Versioned<T> {
    value: T,
    version: u64,
}

impl<T> Versioned<T> {
    fn new(value: T) -> Self {
        Self { value, version: 1 }
    }
}

/// A planned transaction plus the account versions it was planned against
#[derive(Debug, Clone)]
pub struct Prepared {
    pub tx: LedgerTx,
    /// Released reward, for unstakes
    pub reward: u64,
    observed: Vec<(Pubkey, u64)>,
}

pub struct MemoryStore {
    program_id: Pubkey,
    clock: i64,
    policy: Box<dyn RewardPolicy>,
    tokens: HashMap<Pubkey, Versioned<TokenBalance>>,
    stake_infos: HashMap<Pubkey, Versioned<StakeInfo>>,
    /// Program addresses that own custody token accounts
    custodians: HashSet<Pubkey>,
}

impl MemoryStore {
    /// Store running the policy compiled into the program
    pub fn new(program_id: Pubkey) -> Self {
        Self::with_policy(program_id, reward::active_policy())
    }

    pub fn with_policy(program_id: Pubkey, policy: impl RewardPolicy + 'static) -> Self {
        Self {
            program_id,
            clock: 0,
            policy: Box::new(policy),
            tokens: HashMap::new(),
            stake_infos: HashMap::new(),
            custodians: HashSet::new(),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock
    }

    pub fn advance_clock(&mut self, seconds: i64) {
        self.clock = self.clock.saturating_add(seconds);
    }

    /// Associated token account for (owner, mint), created empty if absent
    pub fn open_token_account(&mut self, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
        let address = pda::staker_token_account(owner, mint);
        self.tokens.entry(address).or_insert_with(|| {
            Versioned::new(TokenBalance {
                mint: *mint,
                owner: *owner,
                amount: 0,
            })
        });
        address
    }

    /// External funding (mint authority or admin transfer)
    pub fn mint_to(&mut self, account: &Pubkey, amount: u64) -> Result<()> {
        let entry = self
            .tokens
            .get_mut(account)
            .ok_or(StakeError::UnknownAccount)?;
        entry.value.amount = entry
            .value
            .amount
            .checked_add(amount)
            .ok_or(StakeError::MathOverflow)?;
        entry.version += 1;
        Ok(())
    }

    pub fn balance(&self, account: &Pubkey) -> Option<u64> {
        self.tokens.get(account).map(|t| t.value.amount)
    }

    pub fn token_account(&self, account: &Pubkey) -> Option<&TokenBalance> {
        self.tokens.get(account).map(|t| &t.value)
    }

    pub fn stake_info(&self, address: &Pubkey) -> Option<&StakeInfo> {
        self.stake_infos.get(address).map(|s| &s.value)
    }

    /// Create the reward vault for `mint`; a second call fails with `AlreadyExists`
    pub fn initialize(&mut self, mint: &Pubkey) -> Result<Pubkey> {
        let vault = Derived::reward_vault(&self.program_id, mint)?;
        if self.tokens.contains_key(&vault.address) {
            msg!("Reward vault {} already exists", vault.address);
            return err!(StakeError::AlreadyExists);
        }

        self.tokens.insert(
            vault.address,
            Versioned::new(TokenBalance {
                mint: *mint,
                owner: vault.address,
                amount: 0,
            }),
        );
        self.custodians.insert(vault.address);
        Ok(vault.address)
    }

    pub fn prepare_stake(
        &self,
        signer: &Pubkey,
        staker: &Pubkey,
        mint: &Pubkey,
        amount: u64,
    ) -> Result<Prepared> {
        let request = self.request(signer, staker, mint, amount);
        let position = self.position(staker, mint)?;
        let tx = engine::plan_stake(&request, &position)?;
        Ok(self.observe(tx, 0))
    }

    pub fn prepare_unstake(
        &self,
        signer: &Pubkey,
        staker: &Pubkey,
        mint: &Pubkey,
        amount: u64,
    ) -> Result<Prepared> {
        let request = self.request(signer, staker, mint, amount);
        let position = self.position(staker, mint)?;
        let rewards = self.reward_view(mint)?;
        let plan = engine::plan_unstake(&request, &position, &rewards, self.policy.as_ref())?;
        Ok(self.observe(plan.tx, plan.reward))
    }

    /// Commit a prepared transaction unless one of its accounts moved underneath it
    pub fn submit(&mut self, prepared: Prepared) -> Result<u64> {
        for (key, version) in &prepared.observed {
            if self.version(key) != *version {
                msg!("Write conflict on {}", key);
                return err!(StakeError::Contention);
            }
        }
        self.commit(prepared.tx)?;
        Ok(prepared.reward)
    }

    pub fn stake(
        &mut self,
        signer: &Pubkey,
        staker: &Pubkey,
        mint: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let prepared = self.prepare_stake(signer, staker, mint, amount)?;
        self.submit(prepared).map(|_| ())
    }

    /// Returns the reward released to the staker
    pub fn unstake(
        &mut self,
        signer: &Pubkey,
        staker: &Pubkey,
        mint: &Pubkey,
        amount: u64,
    ) -> Result<u64> {
        let prepared = self.prepare_unstake(signer, staker, mint, amount)?;
        self.submit(prepared)
    }

    fn request(&self, signer: &Pubkey, staker: &Pubkey, mint: &Pubkey, amount: u64) -> Request {
        Request {
            signer: *signer,
            staker: *staker,
            mint: *mint,
            amount,
            now: self.clock,
        }
    }

    fn position(&self, staker: &Pubkey, mint: &Pubkey) -> Result<PositionView> {
        let derived = Derived::stake_info(&self.program_id, staker, mint)?;
        let vault = pda::vault_token_account(&derived.address, mint);
        let staker_account = pda::staker_token_account(staker, mint);

        Ok(PositionView {
            stake_info: derived.address,
            record: self.stake_info(&derived.address).cloned().unwrap_or_default(),
            bump: derived.bump,
            vault,
            vault_exists: self.tokens.contains_key(&vault),
            vault_balance: self.balance(&vault).unwrap_or(0),
            staker_account,
            staker_balance: self.balance(&staker_account).unwrap_or(0),
        })
    }

    fn reward_view(&self, mint: &Pubkey) -> Result<RewardView> {
        let derived = Derived::reward_vault(&self.program_id, mint)?;
        let balance = self
            .balance(&derived.address)
            .ok_or(StakeError::UnknownAccount)?;
        Ok(RewardView {
            address: derived.address,
            bump: derived.bump,
            balance,
        })
    }

    fn version(&self, key: &Pubkey) -> u64 {
        self.tokens
            .get(key)
            .map(|t| t.version)
            .or_else(|| self.stake_infos.get(key).map(|s| s.version))
            .unwrap_or(0)
    }

    fn observe(&self, tx: LedgerTx, reward: u64) -> Prepared {
        let observed = tx
            .writes()
            .into_iter()
            .map(|key| (key, self.version(&key)))
            .collect();
        Prepared {
            tx,
            reward,
            observed,
        }
    }
}

impl AccountStore for MemoryStore {
    /// Applies every mutation to a working copy, then swaps it in
    fn commit(&mut self, tx: LedgerTx) -> Result<()> {
        let mut tokens = self.tokens.clone();
        let mut stake_infos = self.stake_infos.clone();
        let mut custodians = self.custodians.clone();

        for mutation in tx.into_mutations() {
            match mutation {
                Mutation::OpenVault {
                    address,
                    owner,
                    mint,
                } => {
                    tokens.entry(address).or_insert_with(|| {
                        Versioned::new(TokenBalance {
                            mint,
                            owner,
                            amount: 0,
                        })
                    });
                    custodians.insert(owner);
                }
                Mutation::Transfer(transfer) => {
                    let source = tokens
                        .get(&transfer.from)
                        .ok_or(StakeError::UnknownAccount)?
                        .value;
                    let destination = tokens
                        .get(&transfer.to)
                        .ok_or(StakeError::UnknownAccount)?
                        .value;
                    require_keys_eq!(source.mint, destination.mint, StakeError::InvalidMint);

                    // Program custody is only released under the program's own signature
                    let authority = transfer.custody.authority(&transfer.from);
                    let signed_by_program = match transfer.custody {
                        Custody::Staker { .. } => false,
                        Custody::StakeInfo { .. } | Custody::RewardVault { .. } => true,
                    };
                    if source.owner != authority
                        || custodians.contains(&authority) != signed_by_program
                    {
                        msg!(
                            "Debit of {} not authorized: owner={}, authority={}",
                            transfer.from,
                            source.owner,
                            authority
                        );
                        return err!(StakeError::InvalidAuthority);
                    }

                    let shortfall = if signed_by_program {
                        StakeError::VaultBalanceMismatch
                    } else {
                        StakeError::InsufficientExternalBalance
                    };

                    let source = tokens
                        .get_mut(&transfer.from)
                        .ok_or(StakeError::UnknownAccount)?;
                    source.value.amount = source
                        .value
                        .amount
                        .checked_sub(transfer.amount)
                        .ok_or(shortfall)?;
                    source.version += 1;

                    let destination = tokens
                        .get_mut(&transfer.to)
                        .ok_or(StakeError::UnknownAccount)?;
                    destination.value.amount = destination
                        .value
                        .amount
                        .checked_add(transfer.amount)
                        .ok_or(StakeError::MathOverflow)?;
                    destination.version += 1;
                }
                Mutation::WriteStakeInfo { address, record } => {
                    match stake_infos.get_mut(&address) {
                        Some(existing) => {
                            existing.value = record;
                            existing.version += 1;
                        }
                        None => {
                            stake_infos.insert(address, Versioned::new(record));
                        }
                    }
                }
            }
        }

        self.tokens = tokens;
        self.stake_infos = stake_infos;
        self.custodians = custodians;
        Ok(())
    }
}
