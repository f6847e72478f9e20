use anchor_lang::prelude::*;
use anchor_lang::Discriminator;

use crate::errors::StorefrontError;
use crate::state::codec;

/// Marketplace listing of one NFT.
///
/// Lives at `["listing", mint, seller]` under the marketplace program.
/// Only the marketplace program writes it; the client proposes
/// transitions through signed instructions.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Listing {
    /// Seller who receives payment
    pub seller: Pubkey,

    /// The NFT being sold
    pub mint: Pubkey,

    /// Sale price in lamports
    pub price: u64,

    /// Current status of the listing
    pub status: ListingStatus,

    /// Set when the listing is bought
    pub buyer: Option<Pubkey>,

    /// When the listing was created
    pub created_at: i64,

    /// When the listing reached Sold or Cancelled
    pub closed_at: Option<i64>,

    /// PDA bump for listing address derivation
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ListingStatus {
    Active,    // For sale
    Sold,      // Bought, terminal
    Cancelled, // Seller cancelled, terminal
}

impl Default for ListingStatus {
    fn default() -> Self {
        ListingStatus::Active
    }
}

impl Listing {
    /// Layout with both options unset.
    pub const MIN_LEN: usize = 8 + 32 + 32 + 8 + 1 + 1 + 8 + 1 + 1;
    /// Allocated account size.
    pub const SPACE: usize = 8 + 32 + 32 + 8 + 1 + (1 + 32) + 8 + (1 + 8) + 1;

    pub fn decode(data: &[u8]) -> Result<Self> {
        let discriminator = Self::DISCRIMINATOR;
        require!(
            data.len() >= discriminator.len(),
            StorefrontError::TruncatedAccount
        );
        require!(
            data.starts_with(discriminator),
            StorefrontError::UnknownAccountVariant
        );
        require!(data.len() >= Self::MIN_LEN, StorefrontError::TruncatedAccount);

        codec::deserialize(&data[discriminator.len()..])
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(Self::SPACE);
        self.try_serialize(&mut data)?;
        Ok(data)
    }

    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }
}
