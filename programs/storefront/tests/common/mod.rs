#![allow(dead_code)]

//! In-memory ledger for driving `MarketplaceClient` in tests.
//!
//! Transactions are verified, then executed against a copy of the account
//! set and committed only if every instruction succeeds. The marketplace
//! program follows the deployed one: listing at `["listing", mint, seller]`,
//! the listing is made delegate of the seller's token account, a buy pays
//! seller, treasury and creators and moves the token through that
//! delegation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anchor_lang::prelude::*;
use anchor_spl::token::spl_token::instruction::TokenInstruction;
use anchor_spl::token::spl_token::state::Mint as SplMint;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::program_pack::Pack;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;

use storefront::constants::*;
use storefront::instructions::encoding::sighash;
use storefront::instructions::{BuyArgs, ListArgs, MintParams, SaleQuote};
use storefront::pda::{
    associated_token_address, listing_address, master_edition_address, metadata_address,
};
use storefront::state::*;
use storefront::{
    ClientConfig, Cluster, LedgerRpc, MarketplaceClient, MintResult, RetryPolicy,
    StorefrontError, TokenBalance,
};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Associated Token program selector for the idempotent create.
const ATA_CREATE_IDEMPOTENT: u8 = 1;
/// Token Metadata program selectors.
const CREATE_MASTER_EDITION_V3: u8 = 17;
const CREATE_METADATA_ACCOUNT_V3: u8 = 33;

/// Arguments of Token Metadata `CreateMetadataAccountV3`, read back from
/// instruction data.
#[derive(AnchorDeserialize)]
struct CreateMetadataArgs {
    name: String,
    symbol: String,
    uri: String,
    seller_fee_basis_points: u16,
    creators: Option<Vec<Creator>>,
    collection: Option<Collection>,
    // use method, remaining, total
    uses: Option<(u8, u64, u64)>,
    is_mutable: bool,
    // sized collection details
    collection_details: Option<(u8, u64)>,
}

/// How the ledger handles submitted transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Normal,
    /// Applied immediately, confirmation arrives after the delay.
    SlowLanding(Duration),
    /// Never applied, the call hangs for the delay and then fails.
    Lost(Duration),
}

#[derive(Clone, Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Account>,
    clock: i64,
}

#[derive(Clone)]
pub struct TestLedger {
    state: Arc<Mutex<LedgerState>>,
    write_mode: Arc<Mutex<WriteMode>>,
    failing_reads: Arc<AtomicU32>,
    reads: Arc<AtomicUsize>,
    transactions: Arc<AtomicUsize>,
    largest_holder: Arc<Mutex<Option<Pubkey>>>,
    send_overwrite: Arc<Mutex<Option<(Pubkey, Account)>>>,
    fee_bps: u16,
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedger {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                accounts: HashMap::new(),
                clock: 1_700_000_000,
            })),
            write_mode: Arc::new(Mutex::new(WriteMode::Normal)),
            failing_reads: Arc::new(AtomicU32::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
            transactions: Arc::new(AtomicUsize::new(0)),
            largest_holder: Arc::new(Mutex::new(None)),
            send_overwrite: Arc::new(Mutex::new(None)),
            fee_bps: DEFAULT_MARKETPLACE_FEE_BPS,
        }
    }

    pub fn airdrop(&self, address: &Pubkey, lamports: u64) {
        let mut state = self.state.lock().unwrap();
        state
            .accounts
            .entry(*address)
            .or_insert_with(|| system_account(0))
            .lamports += lamports;
    }

    pub fn balance(&self, address: &Pubkey) -> u64 {
        self.account(address).map_or(0, |account| account.lamports)
    }

    pub fn account(&self, address: &Pubkey) -> Option<Account> {
        self.state.lock().unwrap().accounts.get(address).cloned()
    }

    pub fn set_account(&self, address: &Pubkey, account: Account) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(*address, account);
    }

    pub fn token_amount(&self, wallet: &Pubkey, mint: &Pubkey) -> u64 {
        let address = associated_token_address(wallet, mint).unwrap();
        self.account(&address)
            .map_or(0, |account| TokenAccount::decode(&account.data).unwrap().amount)
    }

    pub fn listing(&self, address: &Pubkey) -> Option<Listing> {
        self.account(address)
            .map(|account| Listing::decode(&account.data).unwrap())
    }

    /// Report `address` as the largest holder of every mint, whatever it
    /// holds.
    pub fn report_largest_holder(&self, address: Pubkey) {
        *self.largest_holder.lock().unwrap() = Some(address);
    }

    /// Overwrite `address` with `account` when the next transaction is
    /// submitted, before it is handled.
    pub fn overwrite_on_next_send(&self, address: Pubkey, account: Account) {
        *self.send_overwrite.lock().unwrap() = Some((address, account));
    }

    pub fn fail_next_reads(&self, count: u32) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    pub fn set_write_mode(&self, mode: WriteMode) {
        *self.write_mode.lock().unwrap() = mode;
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }

    fn take_failing_read(&self) -> bool {
        self.failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn apply(&self, transaction: &Transaction) -> Result<()> {
        if let Err(e) = transaction.verify() {
            println!("ledger: signature verification failed: {}", e);
            return err!(StorefrontError::TransactionRejected);
        }

        let message = &transaction.message;
        let signers: Vec<Pubkey> = message
            .account_keys
            .iter()
            .enumerate()
            .filter(|(i, _)| message.is_signer(*i))
            .map(|(_, key)| *key)
            .collect();

        let mut state = self.state.lock().unwrap();
        let mut working = state.clone();
        working.clock += 1;

        for compiled in &message.instructions {
            let program_id = message.account_keys[compiled.program_id_index as usize];
            let keys: Vec<Pubkey> = compiled
                .accounts
                .iter()
                .map(|index| message.account_keys[*index as usize])
                .collect();

            let mut bank = Bank {
                state: &mut working,
                signers: &signers,
                fee_bps: self.fee_bps,
            };
            if let Err(e) = bank.execute(&program_id, &keys, &compiled.data) {
                println!("ledger: instruction for {} failed: {}", program_id, e);
                return err!(StorefrontError::TransactionRejected);
            }
        }

        *state = working;
        self.transactions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl LedgerRpc for TestLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        // Lets concurrent callers interleave.
        tokio::task::yield_now().await;
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.take_failing_read() {
            return err!(StorefrontError::RpcFailure);
        }
        Ok(self.account(address))
    }

    async fn get_token_largest_accounts(&self, mint: &Pubkey) -> Result<Vec<TokenBalance>> {
        tokio::task::yield_now().await;
        if self.take_failing_read() {
            return err!(StorefrontError::RpcFailure);
        }
        if let Some(address) = *self.largest_holder.lock().unwrap() {
            return Ok(vec![TokenBalance { address, amount: 1 }]);
        }

        let state = self.state.lock().unwrap();
        let mut balances: Vec<TokenBalance> = state
            .accounts
            .iter()
            .filter(|(_, account)| {
                account.owner == TOKEN_PROGRAM_ID && account.data.len() == TokenAccount::LEN
            })
            .filter_map(|(address, account)| {
                let token = TokenAccount::decode(&account.data).ok()?;
                (token.mint == *mint).then_some(TokenBalance {
                    address: *address,
                    amount: token.amount,
                })
            })
            .collect();
        balances.sort_by(|a, b| b.amount.cmp(&a.amount));
        Ok(balances)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        Ok(rent_exempt_minimum(data_len))
    }

    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let overwrite = self.send_overwrite.lock().unwrap().take();
        if let Some((address, account)) = overwrite {
            self.set_account(&address, account);
        }
        let mode = *self.write_mode.lock().unwrap();
        match mode {
            WriteMode::Normal => self.apply(transaction)?,
            WriteMode::SlowLanding(delay) => {
                self.apply(transaction)?;
                tokio::time::sleep(delay).await;
            }
            WriteMode::Lost(delay) => {
                tokio::time::sleep(delay).await;
                return err!(StorefrontError::RpcFailure);
            }
        }
        Ok(transaction.signatures[0])
    }
}

pub fn rent_exempt_minimum(data_len: usize) -> u64 {
    (128 + data_len as u64) * 6_960
}

fn system_account(lamports: u64) -> Account {
    Account {
        lamports,
        data: Vec::new(),
        owner: SYSTEM_PROGRAM_ID,
        executable: false,
        rent_epoch: 0,
    }
}

fn reject<T>(why: &str) -> Result<T> {
    println!("ledger: {}", why);
    err!(StorefrontError::TransactionRejected)
}

/// Executes one instruction against the working copy of the ledger.
struct Bank<'a> {
    state: &'a mut LedgerState,
    signers: &'a [Pubkey],
    fee_bps: u16,
}

impl Bank<'_> {
    fn execute(&mut self, program_id: &Pubkey, keys: &[Pubkey], data: &[u8]) -> Result<()> {
        if *program_id == SYSTEM_PROGRAM_ID {
            self.system(keys, data)
        } else if *program_id == TOKEN_PROGRAM_ID {
            self.token(keys, data)
        } else if *program_id == ASSOCIATED_TOKEN_PROGRAM_ID {
            self.associated_token(keys, data)
        } else if *program_id == METADATA_PROGRAM_ID {
            self.metadata(keys, data)
        } else if *program_id == storefront::ID {
            self.marketplace(keys, data)
        } else {
            reject("unknown program")
        }
    }

    // Account helpers

    fn key(keys: &[Pubkey], index: usize) -> Result<Pubkey> {
        match keys.get(index) {
            Some(key) => Ok(*key),
            None => reject("missing account"),
        }
    }

    fn require_signer(&self, key: &Pubkey) -> Result<()> {
        if self.signers.contains(key) {
            Ok(())
        } else {
            reject("missing signature")
        }
    }

    fn get(&self, key: &Pubkey) -> Result<&Account> {
        self.state
            .accounts
            .get(key)
            .ok_or_else(|| error!(StorefrontError::AccountNotFound))
    }

    fn exists(&self, key: &Pubkey) -> bool {
        self.state.accounts.contains_key(key)
    }

    fn debit(&mut self, key: &Pubkey, lamports: u64) -> Result<()> {
        let account = match self.state.accounts.get_mut(key) {
            Some(account) => account,
            None => return reject("debit from missing account"),
        };
        account.lamports = match account.lamports.checked_sub(lamports) {
            Some(rest) => rest,
            None => return reject("insufficient lamports"),
        };
        Ok(())
    }

    fn credit(&mut self, key: &Pubkey, lamports: u64) {
        self.state
            .accounts
            .entry(*key)
            .or_insert_with(|| system_account(0))
            .lamports += lamports;
    }

    fn create(&mut self, payer: &Pubkey, key: &Pubkey, data: Vec<u8>, owner: &Pubkey) -> Result<()> {
        if self.exists(key) {
            return reject("account already in use");
        }
        let lamports = rent_exempt_minimum(data.len());
        self.debit(payer, lamports)?;
        self.state.accounts.insert(
            *key,
            Account {
                lamports,
                data,
                owner: *owner,
                executable: false,
                rent_epoch: 0,
            },
        );
        Ok(())
    }

    fn write(&mut self, key: &Pubkey, data: Vec<u8>) -> Result<()> {
        match self.state.accounts.get_mut(key) {
            Some(account) => {
                account.data = data;
                Ok(())
            }
            None => reject("write to missing account"),
        }
    }

    fn token_account(&self, key: &Pubkey) -> Result<TokenAccount> {
        let account = self.get(key)?;
        if account.owner != TOKEN_PROGRAM_ID {
            return reject("not a token account");
        }
        TokenAccount::decode(&account.data)
    }

    fn mint_account(&self, key: &Pubkey) -> Result<Mint> {
        let account = self.get(key)?;
        if account.owner != TOKEN_PROGRAM_ID {
            return reject("not a mint");
        }
        Mint::decode(&account.data)
    }

    // System program

    #[allow(deprecated)]
    fn system(&mut self, keys: &[Pubkey], data: &[u8]) -> Result<()> {
        use solana_sdk::program_utils::limited_deserialize;
        use solana_sdk::system_instruction::SystemInstruction;

        let (lamports, space, owner) = match limited_deserialize(data) {
            Ok(SystemInstruction::CreateAccount {
                lamports,
                space,
                owner,
            }) => (lamports, space, owner),
            _ => return reject("unsupported system instruction"),
        };
        let payer = Self::key(keys, 0)?;
        let new_account = Self::key(keys, 1)?;
        self.require_signer(&payer)?;
        self.require_signer(&new_account)?;

        if self.exists(&new_account) {
            return reject("account already in use");
        }
        self.debit(&payer, lamports)?;
        self.state.accounts.insert(
            new_account,
            Account {
                lamports,
                data: vec![0; space as usize],
                owner,
                executable: false,
                rent_epoch: 0,
            },
        );
        Ok(())
    }

    // SPL Token program

    fn token(&mut self, keys: &[Pubkey], data: &[u8]) -> Result<()> {
        let instruction = match TokenInstruction::unpack(data) {
            Ok(instruction) => instruction,
            Err(_) => return reject("bad token instruction"),
        };
        match instruction {
            TokenInstruction::InitializeMint2 {
                decimals,
                mint_authority,
                freeze_authority,
            } => {
                let mint = Self::key(keys, 0)?;
                let account = self.get(&mint)?;
                if account.owner != TOKEN_PROGRAM_ID || account.data.len() != Mint::LEN {
                    return reject("mint account not allocated");
                }
                match SplMint::unpack_unchecked(&account.data) {
                    Ok(existing) if !existing.is_initialized => {}
                    Ok(_) => return reject("mint already initialized"),
                    Err(_) => return reject("mint account unreadable"),
                }
                let state = Mint {
                    mint_authority: Some(mint_authority),
                    supply: 0,
                    decimals,
                    freeze_authority: freeze_authority.into(),
                };
                self.write(&mint, state.encode()?)
            }
            TokenInstruction::MintTo { amount } => {
                let (mint_key, destination, authority) =
                    (Self::key(keys, 0)?, Self::key(keys, 1)?, Self::key(keys, 2)?);
                self.require_signer(&authority)?;

                let mut mint = self.mint_account(&mint_key)?;
                if mint.mint_authority != Some(authority) {
                    return reject("wrong mint authority");
                }
                let mut token = self.token_account(&destination)?;
                if token.mint != mint_key {
                    return reject("token account mint mismatch");
                }
                mint.supply += amount;
                token.amount += amount;
                self.write(&mint_key, mint.encode()?)?;
                self.write(&destination, token.encode()?)
            }
            TokenInstruction::Transfer { amount } => {
                let (source, destination, authority) =
                    (Self::key(keys, 0)?, Self::key(keys, 1)?, Self::key(keys, 2)?);
                self.require_signer(&authority)?;
                self.move_tokens(&source, &destination, &authority, amount)
            }
            _ => reject("unsupported token instruction"),
        }
    }

    fn move_tokens(
        &mut self,
        source: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let mut from = self.token_account(source)?;
        let mut to = self.token_account(destination)?;
        if from.mint != to.mint {
            return reject("mint mismatch");
        }
        if from.amount < amount {
            return reject("insufficient funds");
        }

        if from.owner != *authority {
            if from.delegate != Some(*authority) || from.delegated_amount < amount {
                return reject("owner does not match");
            }
            from.delegated_amount -= amount;
            if from.delegated_amount == 0 {
                from.delegate = None;
            }
        }

        from.amount -= amount;
        to.amount += amount;
        self.write(source, from.encode()?)?;
        self.write(destination, to.encode()?)
    }

    // Associated Token program

    fn associated_token(&mut self, keys: &[Pubkey], data: &[u8]) -> Result<()> {
        let payer = Self::key(keys, 0)?;
        let address = Self::key(keys, 1)?;
        let wallet = Self::key(keys, 2)?;
        let mint = Self::key(keys, 3)?;
        self.require_signer(&payer)?;

        if address != associated_token_address(&wallet, &mint)? {
            return reject("address is not the associated token account");
        }
        if self.exists(&address) {
            return match data.first() {
                Some(&ATA_CREATE_IDEMPOTENT) => Ok(()),
                _ => reject("associated token account already exists"),
            };
        }
        self.create_token_account(&payer, &address, &wallet, &mint)
    }

    fn create_token_account(
        &mut self,
        payer: &Pubkey,
        address: &Pubkey,
        wallet: &Pubkey,
        mint: &Pubkey,
    ) -> Result<()> {
        self.mint_account(mint)?;
        let token = TokenAccount {
            mint: *mint,
            owner: *wallet,
            amount: 0,
            delegate: None,
            is_frozen: false,
            is_native: None,
            delegated_amount: 0,
            close_authority: None,
        };
        self.create(payer, address, token.encode()?, &TOKEN_PROGRAM_ID)
    }

    // Token Metadata program

    fn metadata(&mut self, keys: &[Pubkey], data: &[u8]) -> Result<()> {
        match data.first() {
            Some(&CREATE_METADATA_ACCOUNT_V3) => {
                let metadata_key = Self::key(keys, 0)?;
                let mint_key = Self::key(keys, 1)?;
                let mint_authority = Self::key(keys, 2)?;
                let payer = Self::key(keys, 3)?;
                let update_authority = Self::key(keys, 4)?;
                self.require_signer(&mint_authority)?;

                if metadata_key != metadata_address(&mint_key, &METADATA_PROGRAM_ID)?.0 {
                    return reject("metadata address mismatch");
                }
                if self.mint_account(&mint_key)?.mint_authority != Some(mint_authority) {
                    return reject("wrong mint authority");
                }

                let args = match CreateMetadataArgs::try_from_slice(&data[1..]) {
                    Ok(args) => args,
                    Err(_) => return reject("bad metadata args"),
                };
                if args.uses.is_some() || args.collection_details.is_some() {
                    return reject("unsupported metadata args");
                }
                let data = Data {
                    name: args.name,
                    symbol: args.symbol,
                    uri: args.uri,
                    seller_fee_basis_points: args.seller_fee_basis_points,
                    creators: args.creators,
                };
                validate_data(&data)?;
                for creator in data.creators.as_deref().unwrap_or_default() {
                    if creator.verified {
                        self.require_signer(&creator.address)?;
                    }
                }

                let metadata = Metadata {
                    update_authority,
                    mint: mint_key,
                    data,
                    primary_sale_happened: false,
                    is_mutable: args.is_mutable,
                    edition_nonce: None,
                    token_standard: None,
                    collection: args.collection,
                };
                self.create(&payer, &metadata_key, metadata.encode()?, &METADATA_PROGRAM_ID)
            }
            Some(&CREATE_MASTER_EDITION_V3) => {
                let edition_key = Self::key(keys, 0)?;
                let mint_key = Self::key(keys, 1)?;
                let mint_authority = Self::key(keys, 3)?;
                let payer = Self::key(keys, 4)?;
                let metadata_key = Self::key(keys, 5)?;
                self.require_signer(&mint_authority)?;

                if edition_key != master_edition_address(&mint_key, &METADATA_PROGRAM_ID)?.0 {
                    return reject("edition address mismatch");
                }
                if !self.exists(&metadata_key) {
                    return reject("metadata missing");
                }
                let mut mint = self.mint_account(&mint_key)?;
                if mint.supply != 1 || mint.decimals != 0 {
                    return reject("master edition requires supply 1 and 0 decimals");
                }

                let max_supply = match Option::<u64>::try_from_slice(&data[1..]) {
                    Ok(max_supply) => max_supply,
                    Err(_) => return reject("bad master edition args"),
                };
                let edition = MasterEdition {
                    supply: 0,
                    max_supply,
                };
                self.create(&payer, &edition_key, edition.encode()?, &METADATA_PROGRAM_ID)?;

                mint.mint_authority = Some(edition_key);
                mint.freeze_authority = Some(edition_key);
                self.write(&mint_key, mint.encode()?)
            }
            _ => reject("unsupported metadata instruction"),
        }
    }

    // Marketplace program

    fn marketplace(&mut self, keys: &[Pubkey], data: &[u8]) -> Result<()> {
        if data.len() < 8 {
            return reject("missing instruction selector");
        }
        let (selector, args) = data.split_at(8);
        if selector == sighash("list") {
            let args = match ListArgs::try_from_slice(args) {
                Ok(args) => args,
                Err(_) => return reject("bad list args"),
            };
            self.list(keys, args.price)
        } else if selector == sighash("buy") {
            let args = match BuyArgs::try_from_slice(args) {
                Ok(args) => args,
                Err(_) => return reject("bad buy args"),
            };
            self.buy(keys, args.expected_price)
        } else if selector == sighash("cancel") {
            self.cancel(keys)
        } else {
            reject("unknown marketplace instruction")
        }
    }

    fn list(&mut self, keys: &[Pubkey], price: u64) -> Result<()> {
        let seller = Self::key(keys, 0)?;
        let mint = Self::key(keys, 1)?;
        let seller_token = Self::key(keys, 2)?;
        let listing_key = Self::key(keys, 4)?;
        self.require_signer(&seller)?;
        require!(price > 0, StorefrontError::InvalidPrice);

        let (expected, bump) = listing_address(&mint, &seller, &storefront::ID)?;
        if listing_key != expected {
            return reject("listing address mismatch");
        }

        let mut token = self.token_account(&seller_token)?;
        require!(token.holds(&seller, &mint), StorefrontError::NotOwner);

        let listing = Listing {
            seller,
            mint,
            price,
            status: ListingStatus::Active,
            buyer: None,
            created_at: self.state.clock,
            closed_at: None,
            bump,
        };
        if self.exists(&listing_key) {
            let existing = Listing::decode(&self.get(&listing_key)?.data)?;
            require!(!existing.is_active(), StorefrontError::AlreadyListed);
            self.write(&listing_key, listing.encode()?)?;
        } else {
            self.create(&seller, &listing_key, listing.encode()?, &storefront::ID)?;
        }

        token.delegate = Some(listing_key);
        token.delegated_amount = 1;
        self.write(&seller_token, token.encode()?)
    }

    fn buy(&mut self, keys: &[Pubkey], expected_price: u64) -> Result<()> {
        let buyer = Self::key(keys, 0)?;
        let seller = Self::key(keys, 1)?;
        let listing_key = Self::key(keys, 2)?;
        let mint = Self::key(keys, 3)?;
        let seller_token = Self::key(keys, 4)?;
        let buyer_token = Self::key(keys, 5)?;
        let treasury = Self::key(keys, 6)?;
        let metadata_key = Self::key(keys, 7)?;
        let creators = keys.get(11..).unwrap_or_default();
        self.require_signer(&buyer)?;

        let mut listing = Listing::decode(&self.get(&listing_key)?.data)?;
        require!(listing.is_active(), StorefrontError::ListingNotActive);
        require!(listing.price == expected_price, StorefrontError::PriceMismatch);
        require!(listing.seller == seller, StorefrontError::NotSeller);
        require!(listing.mint == mint, StorefrontError::UnknownAccountVariant);
        require!(buyer != seller, StorefrontError::SelfPurchase);

        let metadata = Metadata::decode(&self.get(&metadata_key)?.data)?;
        let expected_creators: Vec<Pubkey> =
            metadata.creators().iter().map(|c| c.address).collect();
        if creators != expected_creators.as_slice() {
            return reject("creator accounts do not match metadata");
        }
        let quote = SaleQuote::compute(
            listing.price,
            self.fee_bps,
            metadata.data.seller_fee_basis_points,
            metadata.creators(),
        )?;

        self.debit(&buyer, quote.price)?;
        self.credit(&seller, quote.seller_proceeds);
        self.credit(&treasury, quote.marketplace_fee);
        for (creator, payout) in &quote.creator_payouts {
            self.credit(creator, *payout);
        }

        if !self.exists(&buyer_token) {
            self.create_token_account(&buyer, &buyer_token, &buyer, &mint)?;
        }
        self.move_tokens(&seller_token, &buyer_token, &listing_key, 1)?;

        listing.status = listing.status.transition(storefront::ListingAction::Buy)?;
        listing.buyer = Some(buyer);
        listing.closed_at = Some(self.state.clock);
        self.write(&listing_key, listing.encode()?)
    }

    fn cancel(&mut self, keys: &[Pubkey]) -> Result<()> {
        let seller = Self::key(keys, 0)?;
        let listing_key = Self::key(keys, 1)?;
        let seller_token = Self::key(keys, 2)?;
        self.require_signer(&seller)?;

        let mut listing = Listing::decode(&self.get(&listing_key)?.data)?;
        require!(listing.seller == seller, StorefrontError::NotSeller);
        require!(listing.is_active(), StorefrontError::ListingNotActive);

        listing.status = listing.status.transition(storefront::ListingAction::Cancel)?;
        listing.closed_at = Some(self.state.clock);
        self.write(&listing_key, listing.encode()?)?;

        let mut token = self.token_account(&seller_token)?;
        if token.delegate == Some(listing_key) {
            token.delegate = None;
            token.delegated_amount = 0;
            self.write(&seller_token, token.encode()?)?;
        }
        Ok(())
    }
}

// Test fixtures

pub fn test_config(treasury: Pubkey) -> ClientConfig {
    ClientConfig {
        cluster: Cluster::Localnet,
        treasury,
        read_timeout: Duration::from_secs(1),
        write_timeout: Duration::from_secs(1),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        },
        ..ClientConfig::default()
    }
}

/// A funded wallet.
pub fn funded_wallet(ledger: &TestLedger, sol: u64) -> Arc<Keypair> {
    let wallet = Arc::new(Keypair::new());
    ledger.airdrop(&wallet.pubkey(), sol * LAMPORTS_PER_SOL);
    wallet
}

pub fn client_for(
    ledger: &TestLedger,
    wallet: &Arc<Keypair>,
    config: ClientConfig,
) -> MarketplaceClient<TestLedger> {
    MarketplaceClient::new(config, ledger.clone(), wallet.clone()).unwrap()
}

pub fn nft_params(creators: &[(Pubkey, u8)]) -> MintParams {
    creators.iter().fold(
        MintParams::new("Storefront #1", "SF", "https://example.com/1.json").with_royalty(500),
        |params, (address, share)| params.with_creator(*address, *share),
    )
}

pub async fn mint_one(
    client: &MarketplaceClient<TestLedger>,
    creators: &[(Pubkey, u8)],
) -> MintResult {
    client.mint(nft_params(creators)).await.unwrap()
}
