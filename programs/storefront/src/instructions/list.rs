use anchor_lang::prelude::*;
use solana_sdk::instruction::{AccountMeta, Instruction};

use crate::constants::*;
use crate::errors::StorefrontError;
use crate::instructions::encoding::anchor_data;
use crate::pda::{associated_token_address, listing_address, metadata_address};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListParams {
    pub mint: Pubkey,
    /// Price in lamports
    pub price: u64,
}

impl ListParams {
    pub fn validate(&self) -> Result<()> {
        require!(self.price > 0, StorefrontError::InvalidPrice);
        Ok(())
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ListArgs {
    pub price: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListAccounts {
    /// Seller who is listing the NFT
    pub seller: Pubkey,
    pub mint: Pubkey,
    /// Seller's token account; the listing becomes its delegate
    pub seller_token_account: Pubkey,
    pub metadata: Pubkey,
    /// Listing account to be created
    pub listing: Pubkey,
}

impl ListAccounts {
    pub fn resolve(marketplace_program: &Pubkey, seller: &Pubkey, mint: &Pubkey) -> Result<Self> {
        Ok(Self {
            seller: *seller,
            mint: *mint,
            seller_token_account: associated_token_address(seller, mint)?,
            metadata: metadata_address(mint, &METADATA_PROGRAM_ID)?.0,
            listing: listing_address(mint, seller, marketplace_program)?.0,
        })
    }

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.seller, true),
            AccountMeta::new_readonly(self.mint, false),
            AccountMeta::new(self.seller_token_account, false),
            AccountMeta::new_readonly(self.metadata, false),
            AccountMeta::new(self.listing, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        ]
    }
}

/// Create a marketplace listing for an NFT the seller holds.
pub fn list(
    marketplace_program: &Pubkey,
    accounts: &ListAccounts,
    params: &ListParams,
) -> Result<Instruction> {
    params.validate()?;

    Ok(Instruction {
        program_id: *marketplace_program,
        accounts: accounts.to_account_metas(),
        data: anchor_data("list", &ListArgs { price: params.price })?,
    })
}
