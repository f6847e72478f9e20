//! Marketplace client: typed reads through a read-through cache and signed
//! writes for mint, list, buy, cancel and transfer.
//!
//! Writes are checked against freshly read state before submission. When a
//! write fails or times out its outcome is unknown, so the client re-reads
//! the accounts it touched and reports what actually happened instead of
//! retrying.

use std::collections::HashMap;
use std::sync::Arc;

use anchor_lang::prelude::*;
use solana_sdk::account::Account;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::constants::*;
use crate::errors::StorefrontError;
use crate::instructions::{
    self, BuyAccounts, CancelAccounts, ListAccounts, ListParams, MintParams, SaleQuote,
    TransferParams,
};
use crate::lifecycle::ListingAction;
use crate::pda::{associated_token_address, listing_address, master_edition_address, metadata_address};
use crate::rpc::{with_retry, LedgerRpc};
use crate::state::*;

/// Wallet that signs every write. Only its public key and signatures are
/// ever used.
pub type WalletSigner = Arc<dyn Signer + Send + Sync>;

/// An account together with the address it was read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyed<T> {
    pub address: Pubkey,
    pub account: T,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintResult {
    pub signature: Signature,
    pub mint: Pubkey,
    pub metadata: Pubkey,
    pub master_edition: Pubkey,
    /// Wallet's associated token account holding the NFT.
    pub token_account: Pubkey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferResult {
    pub signature: Signature,
    /// Listing after the sale, status `Sold`.
    pub listing: Keyed<Listing>,
    pub quote: SaleQuote,
}

struct CachedAccount {
    account: Account,
    fetched_at: Instant,
}

pub struct MarketplaceClient<R> {
    config: ClientConfig,
    rpc: R,
    signer: WalletSigner,
    cache: RwLock<HashMap<Pubkey, CachedAccount>>,
}

impl<R: LedgerRpc> MarketplaceClient<R> {
    pub fn new(config: ClientConfig, rpc: R, signer: WalletSigner) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rpc,
            signer,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn wallet(&self) -> Pubkey {
        self.signer.pubkey()
    }

    // Reads

    pub async fn fetch_account(&self, address: &Pubkey) -> Result<TypedAccount> {
        let account = self
            .load_cached(address)
            .await?
            .ok_or(StorefrontError::AccountNotFound)?;
        self.decode(&account)
    }

    pub async fn fetch_mint(&self, mint: &Pubkey) -> Result<Mint> {
        self.fetch_account(mint).await?.try_into()
    }

    pub async fn fetch_metadata(&self, mint: &Pubkey) -> Result<Metadata> {
        let (address, _) = metadata_address(mint, &METADATA_PROGRAM_ID)?;
        self.fetch_account(&address).await?.try_into()
    }

    pub async fn fetch_master_edition(&self, mint: &Pubkey) -> Result<MasterEdition> {
        let (address, _) = master_edition_address(mint, &METADATA_PROGRAM_ID)?;
        self.fetch_account(&address).await?.try_into()
    }

    /// Listing created by the mint's current holder.
    ///
    /// Listings are keyed by seller, so once a sale settles the mint
    /// resolves to the buyer and this returns `NotListed`. Read a sold
    /// listing through [`Self::fetch_listing_at`] with its address.
    pub async fn fetch_listing(&self, mint: &Pubkey) -> Result<Keyed<Listing>> {
        let holder = self
            .current_holder(mint)
            .await?
            .ok_or(StorefrontError::NotListed)?;
        let (address, _) =
            listing_address(mint, &holder.owner, &self.config.marketplace_program_id)?;
        self.fetch_listing_at(&address).await
    }

    pub async fn fetch_listing_at(&self, address: &Pubkey) -> Result<Keyed<Listing>> {
        let account = self
            .load_cached(address)
            .await?
            .ok_or(StorefrontError::NotListed)?;
        let listing = Listing::try_from(self.decode(&account)?)?;
        Ok(Keyed {
            address: *address,
            account: listing,
        })
    }

    /// How the price of the mint's current listing would be split.
    pub async fn quote(&self, mint: &Pubkey) -> Result<SaleQuote> {
        let listing = self.fetch_listing(mint).await?;
        let metadata = self.fetch_metadata(mint).await?;
        SaleQuote::compute(
            listing.account.price,
            self.config.fee_bps,
            metadata.data.seller_fee_basis_points,
            metadata.creators(),
        )
    }

    // Writes

    /// Mint a one-of-one NFT to the wallet in a single transaction.
    pub async fn mint(&self, params: MintParams) -> Result<MintResult> {
        let authority = self.wallet();
        let mint_keypair = Keypair::new();

        let rpc = &self.rpc;
        let rent = with_retry(
            &self.config.retry,
            self.config.read_timeout,
            "get_minimum_balance_for_rent_exemption",
            move || rpc.get_minimum_balance_for_rent_exemption(MINT_SIZE),
        )
        .await?;

        let plan = instructions::mint_nft(&params, &authority, &mint_keypair.pubkey(), rent)?;
        let transaction = self.sign(&plan.instructions, &[&mint_keypair]).await?;
        let signature = first_signature(&transaction);

        msg!("Minting {} as {}", params.name, plan.mint);
        if let Err(err) = self.send(&transaction).await {
            msg!("Mint {} unconfirmed: {}", signature, err);
            // The mint is atomic: an existing master edition means it landed.
            if self.reconcile(&plan.master_edition).await.is_none() {
                return Err(err);
            }
            msg!("Mint {} landed", signature);
        }

        Ok(MintResult {
            signature,
            mint: plan.mint,
            metadata: plan.metadata,
            master_edition: plan.master_edition,
            token_account: plan.token_account,
        })
    }

    /// List a held NFT for `price` lamports.
    pub async fn list(&self, mint: &Pubkey, price: u64) -> Result<Keyed<Listing>> {
        let params = ListParams { mint: *mint, price };
        params.validate()?;

        let seller = self.wallet();
        let program = self.config.marketplace_program_id;
        let accounts = ListAccounts::resolve(&program, &seller, mint)?;

        self.require_holder(&accounts.seller_token_account, &seller, mint)
            .await?;
        if let Some(existing) = self.fresh_listing(&accounts.listing).await? {
            require!(!existing.is_active(), StorefrontError::AlreadyListed);
        }

        let instruction = instructions::list(&program, &accounts, &params)?;
        let transaction = self.sign(&[instruction], &[]).await?;
        let signature = first_signature(&transaction);

        msg!("Listing {} for {} lamports", mint, price);
        let outcome = self.send(&transaction).await;
        self.invalidate(&[accounts.listing, accounts.seller_token_account])
            .await;

        if let Err(err) = outcome {
            msg!("List {} unconfirmed: {}", signature, err);
            let landed = self
                .reconcile_listing(&accounts.listing)
                .await?
                .is_some_and(|listing| listing.is_active() && listing.price == price);
            if !landed {
                return Err(err);
            }
            msg!("List {} landed", signature);
        }

        self.fetch_listing_at(&accounts.listing).await
    }

    /// Buy the listing at `listing_address` at its current price.
    pub async fn buy(&self, listing_address: &Pubkey) -> Result<TransferResult> {
        let buyer = self.wallet();
        let listing = self
            .fresh_listing(listing_address)
            .await?
            .ok_or(StorefrontError::NotListed)?;

        listing
            .status
            .transition(ListingAction::Buy)
            .map_err(|_| error!(StorefrontError::ListingNotActive))?;
        require!(listing.seller != buyer, StorefrontError::SelfPurchase);

        let metadata = self.fetch_metadata(&listing.mint).await?;
        let quote = SaleQuote::compute(
            listing.price,
            self.config.fee_bps,
            metadata.data.seller_fee_basis_points,
            metadata.creators(),
        )?;

        let accounts = BuyAccounts::resolve(
            &buyer,
            listing_address,
            &listing,
            &self.config.treasury,
            metadata.creators(),
        )?;
        let instruction =
            instructions::buy(&self.config.marketplace_program_id, &accounts, listing.price)?;
        let transaction = self.sign(&[instruction], &[]).await?;
        let signature = first_signature(&transaction);

        msg!("Buying {} for {} lamports", listing.mint, listing.price);
        let outcome = self.send(&transaction).await;
        self.invalidate(&[
            *listing_address,
            accounts.seller_token_account,
            accounts.buyer_token_account,
        ])
        .await;

        if let Err(err) = outcome {
            msg!("Buy {} unconfirmed: {}", signature, err);
            return match self.reconcile_listing(listing_address).await? {
                Some(current)
                    if current.status == ListingStatus::Sold && current.buyer == Some(buyer) =>
                {
                    msg!("Buy {} landed", signature);
                    Ok(TransferResult {
                        signature,
                        listing: Keyed {
                            address: *listing_address,
                            account: current,
                        },
                        quote,
                    })
                }
                Some(current) if !current.is_active() => {
                    msg!("Listing {} is {:?}", listing_address, current.status);
                    err!(StorefrontError::ListingNotActive)
                }
                Some(current) if current.price != listing.price => {
                    err!(StorefrontError::PriceMismatch)
                }
                _ => Err(err),
            };
        }

        Ok(TransferResult {
            signature,
            listing: self.fetch_listing_at(listing_address).await?,
            quote,
        })
    }

    /// Cancel the wallet's own active listing.
    pub async fn cancel(&self, listing_address: &Pubkey) -> Result<()> {
        let seller = self.wallet();
        let listing = self
            .fresh_listing(listing_address)
            .await?
            .ok_or(StorefrontError::NotListed)?;

        require!(listing.seller == seller, StorefrontError::NotSeller);
        listing
            .status
            .transition(ListingAction::Cancel)
            .map_err(|_| error!(StorefrontError::ListingNotActive))?;

        let accounts = CancelAccounts::resolve(&seller, listing_address, &listing.mint)?;
        let instruction = instructions::cancel(&self.config.marketplace_program_id, &accounts);
        let transaction = self.sign(&[instruction], &[]).await?;
        let signature = first_signature(&transaction);

        msg!("Cancelling listing {}", listing_address);
        let outcome = self.send(&transaction).await;
        self.invalidate(&[*listing_address, accounts.seller_token_account])
            .await;

        if let Err(err) = outcome {
            msg!("Cancel {} unconfirmed: {}", signature, err);
            return match self.reconcile_listing(listing_address).await? {
                Some(current) if current.status == ListingStatus::Cancelled => Ok(()),
                Some(current) if !current.is_active() => err!(StorefrontError::ListingNotActive),
                _ => Err(err),
            };
        }
        Ok(())
    }

    /// Send a held, unlisted NFT to `recipient`.
    pub async fn transfer(&self, mint: &Pubkey, recipient: &Pubkey) -> Result<Signature> {
        let owner = self.wallet();
        let params = TransferParams {
            mint: *mint,
            recipient: *recipient,
        };

        let source = associated_token_address(&owner, mint)?;
        let destination = associated_token_address(recipient, mint)?;
        self.require_holder(&source, &owner, mint).await?;

        let (listing, _) = listing_address(mint, &owner, &self.config.marketplace_program_id)?;
        if let Some(existing) = self.fresh_listing(&listing).await? {
            require!(!existing.is_active(), StorefrontError::TokenListed);
        }

        let transaction = self
            .sign(&instructions::transfer(&owner, &params)?, &[])
            .await?;
        let signature = first_signature(&transaction);

        msg!("Transferring {} to {}", mint, recipient);
        let outcome = self.send(&transaction).await;
        self.invalidate(&[source, destination]).await;

        if let Err(err) = outcome {
            msg!("Transfer {} unconfirmed: {}", signature, err);
            let landed = self
                .reconcile(&destination)
                .await
                .and_then(|account| decode_token_account(&account).ok())
                .is_some_and(|token| token.holds(recipient, mint));
            if !landed {
                return Err(err);
            }
            msg!("Transfer {} landed", signature);
        }
        Ok(signature)
    }

    // Internals

    async fn load(&self, address: &Pubkey) -> Result<Option<Account>> {
        let rpc = &self.rpc;
        let account = with_retry(
            &self.config.retry,
            self.config.read_timeout,
            "get_account",
            move || rpc.get_account(address),
        )
        .await?;

        let mut cache = self.cache.write().await;
        match &account {
            Some(account) if !self.config.cache_ttl.is_zero() => {
                cache.insert(
                    *address,
                    CachedAccount {
                        account: account.clone(),
                        fetched_at: Instant::now(),
                    },
                );
            }
            _ => {
                cache.remove(address);
            }
        }
        Ok(account)
    }

    async fn load_cached(&self, address: &Pubkey) -> Result<Option<Account>> {
        if let Some(entry) = self.cache.read().await.get(address) {
            if entry.fetched_at.elapsed() < self.config.cache_ttl {
                return Ok(Some(entry.account.clone()));
            }
        }
        self.load(address).await
    }

    async fn invalidate(&self, addresses: &[Pubkey]) {
        let mut cache = self.cache.write().await;
        for address in addresses {
            if cache.remove(address).is_some() {
                msg!("Invalidated cached {}", address);
            }
        }
    }

    async fn fresh_listing(&self, address: &Pubkey) -> Result<Option<Listing>> {
        match self.load(address).await? {
            Some(account) => Ok(Some(Listing::try_from(self.decode(&account)?)?)),
            None => Ok(None),
        }
    }

    /// Authoritative re-read after an unconfirmed write. A failed read
    /// means the outcome stays unknown.
    async fn reconcile(&self, address: &Pubkey) -> Option<Account> {
        match self.load(address).await {
            Ok(account) => account,
            Err(err) => {
                msg!("Reconciliation read of {} failed: {}", address, err);
                None
            }
        }
    }

    /// `None` when the listing could not be read. A listing that reads but
    /// does not decode is an error of its own.
    async fn reconcile_listing(&self, address: &Pubkey) -> Result<Option<Listing>> {
        let Some(account) = self.reconcile(address).await else {
            return Ok(None);
        };
        match self.decode(&account).and_then(Listing::try_from) {
            Ok(listing) => Ok(Some(listing)),
            Err(err) => {
                msg!("Listing {} did not decode after write: {}", address, err);
                Err(err)
            }
        }
    }

    fn decode(&self, account: &Account) -> Result<TypedAccount> {
        TypedAccount::decode(
            &account.owner,
            &account.data,
            &self.config.marketplace_program_id,
        )
    }

    async fn current_holder(&self, mint: &Pubkey) -> Result<Option<TokenAccount>> {
        let rpc = &self.rpc;
        let balances = with_retry(
            &self.config.retry,
            self.config.read_timeout,
            "get_token_largest_accounts",
            move || rpc.get_token_largest_accounts(mint),
        )
        .await?;

        let Some(largest) = balances.into_iter().find(|balance| balance.amount > 0) else {
            return Ok(None);
        };
        match self.load(&largest.address).await? {
            Some(account) => Ok(Some(decode_token_account(&account)?)),
            None => Ok(None),
        }
    }

    async fn require_holder(&self, token_account: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Result<()> {
        let holds = match self.load(token_account).await? {
            Some(account) if account.owner == TOKEN_PROGRAM_ID => {
                decode_token_account(&account)?.holds(owner, mint)
            }
            _ => false,
        };
        require!(holds, StorefrontError::NotOwner);
        Ok(())
    }

    async fn sign(&self, instructions: &[Instruction], extra: &[&dyn Signer]) -> Result<Transaction> {
        let rpc = &self.rpc;
        let blockhash = with_retry(
            &self.config.retry,
            self.config.read_timeout,
            "get_latest_blockhash",
            move || rpc.get_latest_blockhash(),
        )
        .await?;

        let payer = self.wallet();
        let wallet: &dyn Signer = self.signer.as_ref();
        let mut signers = vec![wallet];
        signers.extend_from_slice(extra);

        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer));
        transaction.try_sign(&signers, blockhash).map_err(|e| {
            msg!("Signing failed: {}", e);
            error!(StorefrontError::SigningFailed)
        })?;
        Ok(transaction)
    }

    /// Submit once, bounded by the write timeout. Writes are never retried.
    async fn send(&self, transaction: &Transaction) -> Result<Signature> {
        match tokio::time::timeout(
            self.config.write_timeout,
            self.rpc.send_and_confirm_transaction(transaction),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => err!(StorefrontError::RpcTimeout),
        }
    }
}

fn first_signature(transaction: &Transaction) -> Signature {
    transaction.signatures.first().copied().unwrap_or_default()
}

/// Token accounts are owned by the SPL Token program; anything else at the
/// address is not one.
fn decode_token_account(account: &Account) -> Result<TokenAccount> {
    require!(
        account.owner == TOKEN_PROGRAM_ID,
        StorefrontError::UnknownAccountVariant
    );
    TokenAccount::decode(&account.data)
}
