use anchor_lang::prelude::*;
use anchor_spl::token::spl_token::state::{Account as SplAccount, AccountState, Mint as SplMint};
use solana_sdk::program_pack::{IsInitialized, Pack};

use crate::constants::{MINT_SIZE, TOKEN_ACCOUNT_SIZE};
use crate::errors::StorefrontError;

/// SPL Token accounts have one exact size per kind; a shorter buffer is
/// cut off, any other size is a different kind of account.
fn check_packed_len(data: &[u8], len: usize) -> Result<()> {
    require!(data.len() >= len, StorefrontError::TruncatedAccount);
    require!(data.len() == len, StorefrontError::UnknownAccountVariant);
    Ok(())
}

fn unpack<T: Pack + IsInitialized>(data: &[u8], what: &str) -> Result<T> {
    T::unpack(data).map_err(|e| {
        msg!("{} did not unpack: {}", what, e);
        error!(StorefrontError::MalformedAccount)
    })
}

/// SPL Token mint: identifies a token class. NFTs have zero decimals and a
/// supply of one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mint {
    pub mint_authority: Option<Pubkey>,
    pub supply: u64,
    pub decimals: u8,
    pub freeze_authority: Option<Pubkey>,
}

impl Mint {
    pub const LEN: usize = MINT_SIZE;

    pub fn decode(data: &[u8]) -> Result<Self> {
        check_packed_len(data, Self::LEN)?;
        let mint: SplMint = unpack(data, "Mint")?;
        Ok(Self {
            mint_authority: mint.mint_authority.into(),
            supply: mint.supply,
            decimals: mint.decimals,
            freeze_authority: mint.freeze_authority.into(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; Self::LEN];
        let mint = SplMint {
            mint_authority: self.mint_authority.into(),
            supply: self.supply,
            decimals: self.decimals,
            is_initialized: true,
            freeze_authority: self.freeze_authority.into(),
        };
        SplMint::pack(mint, &mut data)?;
        Ok(data)
    }

    pub fn is_nft(&self) -> bool {
        self.decimals == 0 && self.supply == 1
    }
}

/// SPL Token account: a wallet's balance of one mint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: Option<Pubkey>,
    pub is_frozen: bool,
    pub is_native: Option<u64>,
    pub delegated_amount: u64,
    pub close_authority: Option<Pubkey>,
}

impl TokenAccount {
    pub const LEN: usize = TOKEN_ACCOUNT_SIZE;

    pub fn decode(data: &[u8]) -> Result<Self> {
        check_packed_len(data, Self::LEN)?;
        let account: SplAccount = unpack(data, "Token account")?;
        Ok(Self {
            mint: account.mint,
            owner: account.owner,
            amount: account.amount,
            delegate: account.delegate.into(),
            is_frozen: account.state == AccountState::Frozen,
            is_native: account.is_native.into(),
            delegated_amount: account.delegated_amount,
            close_authority: account.close_authority.into(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; Self::LEN];
        let account = SplAccount {
            mint: self.mint,
            owner: self.owner,
            amount: self.amount,
            delegate: self.delegate.into(),
            state: if self.is_frozen {
                AccountState::Frozen
            } else {
                AccountState::Initialized
            },
            is_native: self.is_native.into(),
            delegated_amount: self.delegated_amount,
            close_authority: self.close_authority.into(),
        };
        SplAccount::pack(account, &mut data)?;
        Ok(data)
    }

    /// `owner` holds at least one unit of `mint` in this account.
    pub fn holds(&self, owner: &Pubkey, mint: &Pubkey) -> bool {
        self.owner == *owner && self.mint == *mint && self.amount > 0 && !self.is_frozen
    }
}
