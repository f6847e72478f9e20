use anchor_lang::prelude::*;
use solana_sdk::instruction::{AccountMeta, Instruction};

use crate::constants::*;
use crate::errors::StorefrontError;
use crate::instructions::encoding::anchor_data;
use crate::pda::{associated_token_address, metadata_address};
use crate::state::{Creator, Listing};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct BuyArgs {
    /// Price the buyer saw; the program rejects the buy if it changed.
    pub expected_price: u64,
}

/// Where the buyer's lamports go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleQuote {
    pub price: u64,
    pub marketplace_fee: u64,
    /// Sum of `creator_payouts`
    pub royalty: u64,
    pub creator_payouts: Vec<(Pubkey, u64)>,
    pub seller_proceeds: u64,
}

impl SaleQuote {
    pub fn compute(
        price: u64,
        marketplace_fee_bps: u16,
        seller_fee_basis_points: u16,
        creators: &[Creator],
    ) -> Result<Self> {
        let marketplace_fee = bps_of(price, marketplace_fee_bps)?;
        let royalty_pool = bps_of(price, seller_fee_basis_points)?;

        let mut creator_payouts = Vec::with_capacity(creators.len());
        for creator in creators {
            let payout = royalty_pool
                .checked_mul(creator.share as u64)
                .ok_or(StorefrontError::MathOverflow)?
                / CREATOR_SHARE_TOTAL as u64;
            creator_payouts.push((creator.address, payout));
        }

        let royalty = creator_payouts
            .iter()
            .try_fold(0u64, |total, (_, payout)| total.checked_add(*payout))
            .ok_or(StorefrontError::MathOverflow)?;

        let seller_proceeds = price
            .checked_sub(marketplace_fee)
            .ok_or(StorefrontError::MathOverflow)?
            .checked_sub(royalty)
            .ok_or(StorefrontError::MathOverflow)?;

        Ok(Self {
            price,
            marketplace_fee,
            royalty,
            creator_payouts,
            seller_proceeds,
        })
    }
}

fn bps_of(amount: u64, bps: u16) -> Result<u64> {
    let scaled = amount
        .checked_mul(bps as u64)
        .ok_or(StorefrontError::MathOverflow)?;
    Ok(scaled / BPS_DENOMINATOR)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuyAccounts {
    /// Buyer paying for the NFT
    pub buyer: Pubkey,
    /// Seller who receives payment
    pub seller: Pubkey,
    /// Listing being bought
    pub listing: Pubkey,
    pub mint: Pubkey,
    pub seller_token_account: Pubkey,
    /// Created by the program when missing
    pub buyer_token_account: Pubkey,
    pub treasury: Pubkey,
    pub metadata: Pubkey,
    /// Royalty recipients, in metadata order
    pub creators: Vec<Pubkey>,
}

impl BuyAccounts {
    pub fn resolve(
        buyer: &Pubkey,
        listing_address: &Pubkey,
        listing: &Listing,
        treasury: &Pubkey,
        creators: &[Creator],
    ) -> Result<Self> {
        Ok(Self {
            buyer: *buyer,
            seller: listing.seller,
            listing: *listing_address,
            mint: listing.mint,
            seller_token_account: associated_token_address(&listing.seller, &listing.mint)?,
            buyer_token_account: associated_token_address(buyer, &listing.mint)?,
            treasury: *treasury,
            metadata: metadata_address(&listing.mint, &METADATA_PROGRAM_ID)?.0,
            creators: creators.iter().map(|c| c.address).collect(),
        })
    }

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        let mut metas = vec![
            AccountMeta::new(self.buyer, true),
            AccountMeta::new(self.seller, false),
            AccountMeta::new(self.listing, false),
            AccountMeta::new_readonly(self.mint, false),
            AccountMeta::new(self.seller_token_account, false),
            AccountMeta::new(self.buyer_token_account, false),
            AccountMeta::new(self.treasury, false),
            AccountMeta::new_readonly(self.metadata, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
        ];
        metas.extend(self.creators.iter().map(|c| AccountMeta::new(*c, false)));
        metas
    }
}

/// Buy an active listing: pays seller, treasury and creators, moves the
/// NFT to the buyer and marks the listing Sold, all in one instruction.
pub fn buy(
    marketplace_program: &Pubkey,
    accounts: &BuyAccounts,
    expected_price: u64,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *marketplace_program,
        accounts: accounts.to_account_metas(),
        data: anchor_data("buy", &BuyArgs { expected_price })?,
    })
}
