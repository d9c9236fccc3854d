use anchor_lang::prelude::*;

use crate::state::StakeInfo;

/// Who authorizes a debit from a token account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Custody {
    /// The wallet owner's own signature (funding a vault from their wallet)
    Staker { owner: Pubkey },
    /// Program signs as the StakeInfo PDA (draining a stake vault)
    StakeInfo { address: Pubkey, bump: u8 },
    /// Program signs as the reward vault PDA (paying out rewards)
    RewardVault { bump: u8 },
}

impl Custody {
    /// Key that must own the debited token account
    pub fn authority(&self, from: &Pubkey) -> Pubkey {
        match self {
            Custody::Staker { owner } => *owner,
            Custody::StakeInfo { address, .. } => *address,
            // the reward vault is its own authority
            Custody::RewardVault { .. } => *from,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTransfer {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
    pub custody: Custody,
}

/// One typed change to the account store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Create a custody token account for `owner` if it does not exist yet
    OpenVault {
        address: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
    },
    Transfer(PlannedTransfer),
    /// Overwrite (or create) a stake position record
    WriteStakeInfo { address: Pubkey, record: StakeInfo },
}

/// An ordered batch of mutations that commits all together or not at all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerTx {
    mutations: Vec<Mutation>,
}

impl LedgerTx {
    pub fn builder() -> LedgerTxBuilder {
        LedgerTxBuilder::default()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    /// Every account the transaction writes to
    pub fn writes(&self) -> Vec<Pubkey> {
        let mut keys = Vec::new();
        for mutation in &self.mutations {
            match mutation {
                Mutation::OpenVault { address, .. } => keys.push(*address),
                Mutation::Transfer(t) => {
                    keys.push(t.from);
                    keys.push(t.to);
                }
                Mutation::WriteStakeInfo { address, .. } => keys.push(*address),
            }
        }
        keys.sort();
        keys.dedup();
        keys
    }

    /// Sum of transfers landing in `account`
    pub fn credited_to(&self, account: &Pubkey) -> u64 {
        self.mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::Transfer(t) if t.to == *account => Some(t.amount),
                _ => None,
            })
            .sum()
    }
}

#[derive(Debug, Default)]
pub struct LedgerTxBuilder {
    mutations: Vec<Mutation>,
}

impl LedgerTxBuilder {
    pub fn open_vault(mut self, address: Pubkey, owner: Pubkey, mint: Pubkey) -> Self {
        self.mutations.push(Mutation::OpenVault {
            address,
            owner,
            mint,
        });
        self
    }

    /// Zero-amount transfers are dropped
    pub fn transfer(mut self, from: Pubkey, to: Pubkey, amount: u64, custody: Custody) -> Self {
        if amount > 0 {
            self.mutations.push(Mutation::Transfer(PlannedTransfer {
                from,
                to,
                amount,
                custody,
            }));
        }
        self
    }

    pub fn write_stake_info(mut self, address: Pubkey, record: StakeInfo) -> Self {
        self.mutations
            .push(Mutation::WriteStakeInfo { address, record });
        self
    }

    pub fn build(self) -> LedgerTx {
        LedgerTx {
            mutations: self.mutations,
        }
    }
}

/// Anything that can apply a `LedgerTx` atomically
///
/// On-chain this is an instruction's account context (the runtime rolls the
/// whole transaction back on error); off-chain it is `store::MemoryStore`.
pub trait AccountStore {
    fn commit(&mut self, tx: LedgerTx) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order_and_drops_empty_transfers() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let info = Pubkey::new_unique();

        let tx = LedgerTx::builder()
            .transfer(a, b, 10, Custody::Staker { owner: a })
            .transfer(b, a, 0, Custody::RewardVault { bump: 1 })
            .write_stake_info(info, StakeInfo::default())
            .build();

        assert_eq!(tx.mutations().len(), 2);
        assert!(matches!(tx.mutations()[0], Mutation::Transfer(_)));
        assert!(matches!(tx.mutations()[1], Mutation::WriteStakeInfo { .. }));
    }

    #[test]
    fn test_write_set_is_deduplicated() {
        let wallet = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let reward = Pubkey::new_unique();
        let info = Pubkey::new_unique();

        let tx = LedgerTx::builder()
            .transfer(
                vault,
                wallet,
                5,
                Custody::StakeInfo {
                    address: info,
                    bump: 255,
                },
            )
            .transfer(reward, wallet, 1, Custody::RewardVault { bump: 254 })
            .build();

        assert_eq!(tx.writes().len(), 3);
        assert_eq!(tx.credited_to(&wallet), 6);
        assert_eq!(tx.credited_to(&vault), 0);
    }

    #[test]
    fn test_custody_names_the_debit_authority() {
        let wallet = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let info = Pubkey::new_unique();

        assert_eq!(Custody::Staker { owner }.authority(&wallet), owner);
        assert_eq!(
            Custody::StakeInfo {
                address: info,
                bump: 250
            }
            .authority(&wallet),
            info
        );
        assert_eq!(Custody::RewardVault { bump: 250 }.authority(&wallet), wallet);
    }
}
