use anchor_lang::prelude::*;
use solana_sdk::instruction::{AccountMeta, Instruction};

use crate::instructions::encoding::sighash;
use crate::pda::associated_token_address;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelAccounts {
    /// Seller who is cancelling the listing
    pub seller: Pubkey,
    /// Listing being cancelled
    pub listing: Pubkey,
    /// Delegation on this account is revoked
    pub seller_token_account: Pubkey,
}

impl CancelAccounts {
    pub fn resolve(seller: &Pubkey, listing: &Pubkey, mint: &Pubkey) -> Result<Self> {
        Ok(Self {
            seller: *seller,
            listing: *listing,
            seller_token_account: associated_token_address(seller, mint)?,
        })
    }

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.seller, true),
            AccountMeta::new(self.listing, false),
            AccountMeta::new(self.seller_token_account, false),
        ]
    }
}

/// Cancel an active listing. The listing stays readable as Cancelled.
pub fn cancel(marketplace_program: &Pubkey, accounts: &CancelAccounts) -> Instruction {
    Instruction {
        program_id: *marketplace_program,
        accounts: accounts.to_account_metas(),
        data: sighash("cancel").to_vec(),
    }
}
