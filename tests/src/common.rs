use std::path::PathBuf;

use anchor_lang::{prelude::Pubkey, AccountDeserialize, InstructionData, ToAccountMetas};
use anchor_spl::associated_token::get_associated_token_address;
use litesvm::LiteSVM;
use solana_account::Account;
use solana_instruction::{error::InstructionError, Instruction};
use solana_keypair::Keypair;
use solana_native_token::LAMPORTS_PER_SOL;
use solana_signer::Signer;
use solana_transaction::Transaction;
use solana_transaction_error::TransactionError;
use spl_token::{
    solana_program::{program_option::COption, program_pack::Pack},
    state::{Account as TokenAccount, AccountState, Mint},
};
use stake_program::{accounts, instruction, pda::Derived, state::StakeInfo};

pub const PROGRAM_ID: Pubkey = stake_program::ID;

pub fn read_program() -> Option<Vec<u8>> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../target/deploy/stake_program.so");
    std::fs::read(&path).ok()
}

pub struct Harness {
    pub svm: LiteSVM,
    pub admin: Keypair,
    pub mint: Pubkey,
}

impl Harness {
    /// `None` until the program has been built with `anchor build`
    pub fn new() -> Option<Self> {
        let Some(program) = read_program() else {
            eprintln!("stake_program.so not found, run `anchor build` to enable program tests");
            return None;
        };

        let mut svm = LiteSVM::new();
        svm.add_program(PROGRAM_ID, &program);

        let admin = Keypair::new();
        svm.airdrop(&admin.pubkey(), 10 * LAMPORTS_PER_SOL).unwrap();

        let mint = Pubkey::new_unique();
        let mut harness = Self { svm, admin, mint };
        harness.create_mint();
        Some(harness)
    }

    fn create_mint(&mut self) {
        let state = Mint {
            mint_authority: COption::Some(self.admin.pubkey()),
            supply: 0,
            decimals: 6,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(state, &mut data).unwrap();
        self.put_token_program_account(self.mint, data);
    }

    fn put_token_program_account(&mut self, address: Pubkey, data: Vec<u8>) {
        let lamports = self.svm.minimum_balance_for_rent_exemption(data.len());
        self.svm
            .set_account(
                address,
                Account {
                    lamports,
                    data,
                    owner: spl_token::ID,
                    executable: false,
                    rent_epoch: 0,
                },
            )
            .unwrap();
    }

    /// Funded keypair with an associated token account holding `amount`
    pub fn new_staker(&mut self, amount: u64) -> Keypair {
        let staker = Keypair::new();
        self.svm
            .airdrop(&staker.pubkey(), 10 * LAMPORTS_PER_SOL)
            .unwrap();

        let state = TokenAccount {
            mint: self.mint,
            owner: staker.pubkey(),
            amount,
            state: AccountState::Initialized,
            ..TokenAccount::default()
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(state, &mut data).unwrap();
        self.put_token_program_account(self.wallet(&staker.pubkey()), data);
        staker
    }

    /// Credit tokens to an existing token account, as a mint authority would
    pub fn mint_to(&mut self, address: &Pubkey, amount: u64) {
        let mut state = self.token_account(address).unwrap();
        state.amount += amount;
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(state, &mut data).unwrap();
        self.put_token_program_account(*address, data);
    }

    pub fn token_account(&self, address: &Pubkey) -> Option<TokenAccount> {
        let account = self.svm.get_account(address)?;
        TokenAccount::unpack(&account.data).ok()
    }

    pub fn balance(&self, address: &Pubkey) -> u64 {
        self.token_account(address).map_or(0, |t| t.amount)
    }

    pub fn stake_info(&self, staker: &Pubkey) -> Option<StakeInfo> {
        let account = self.svm.get_account(&self.stake_info_address(staker))?;
        StakeInfo::try_deserialize(&mut account.data.as_slice()).ok()
    }

    pub fn reward_vault(&self) -> Pubkey {
        Derived::reward_vault(&PROGRAM_ID, &self.mint)
            .unwrap()
            .address
    }

    pub fn stake_info_address(&self, staker: &Pubkey) -> Pubkey {
        Derived::stake_info(&PROGRAM_ID, staker, &self.mint)
            .unwrap()
            .address
    }

    pub fn wallet(&self, owner: &Pubkey) -> Pubkey {
        get_associated_token_address(owner, &self.mint)
    }

    pub fn vault(&self, staker: &Pubkey) -> Pubkey {
        get_associated_token_address(&self.stake_info_address(staker), &self.mint)
    }

    pub fn send(&mut self, ix: Instruction, signer: &Keypair) -> Result<(), TransactionError> {
        let blockhash = self.svm.latest_blockhash();
        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&signer.pubkey()),
            &[signer],
            blockhash,
        );

        let result = self
            .svm
            .send_transaction(tx)
            .map(|_| ())
            .map_err(|failed| failed.err);
        self.svm.expire_blockhash();
        result
    }

    pub fn initialize(&mut self) -> Result<(), TransactionError> {
        let accounts = accounts::Initialize {
            admin: self.admin.pubkey(),
            reward_vault: self.reward_vault(),
            mint: self.mint,
            system_program: anchor_lang::system_program::ID,
            token_program: spl_token::ID,
        };

        let ix = Instruction {
            program_id: PROGRAM_ID,
            accounts: accounts.to_account_metas(None),
            data: instruction::Initialize {}.data(),
        };

        let admin = self.admin.insecure_clone();
        self.send(ix, &admin)
    }

    pub fn stake(&mut self, staker: &Keypair, amount: u64) -> Result<(), TransactionError> {
        let accounts = accounts::Stake {
            staker: staker.pubkey(),
            mint: self.mint,
            stake_info: self.stake_info_address(&staker.pubkey()),
            vault_token_account: self.vault(&staker.pubkey()),
            staker_token_account: self.wallet(&staker.pubkey()),
            system_program: anchor_lang::system_program::ID,
            token_program: spl_token::ID,
            associated_token_program: anchor_spl::associated_token::ID,
        };

        let ix = Instruction {
            program_id: PROGRAM_ID,
            accounts: accounts.to_account_metas(None),
            data: instruction::Stake { amount }.data(),
        };

        self.send(ix, staker)
    }

    /// Unstake from `owner`'s position, signed by `signer`
    pub fn unstake(
        &mut self,
        signer: &Keypair,
        owner: &Pubkey,
        amount: u64,
    ) -> Result<(), TransactionError> {
        let accounts = accounts::Unstake {
            staker: signer.pubkey(),
            mint: self.mint,
            stake_info: self.stake_info_address(owner),
            vault_token_account: self.vault(owner),
            reward_vault: self.reward_vault(),
            staker_token_account: self.wallet(&signer.pubkey()),
            system_program: anchor_lang::system_program::ID,
            token_program: spl_token::ID,
            associated_token_program: anchor_spl::associated_token::ID,
        };

        let ix = Instruction {
            program_id: PROGRAM_ID,
            accounts: accounts.to_account_metas(None),
            data: instruction::Unstake { amount }.data(),
        };

        self.send(ix, signer)
    }
}

/// Program error code carried by a failed transaction
pub fn custom_code(err: &TransactionError) -> Option<u32> {
    match err {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}
