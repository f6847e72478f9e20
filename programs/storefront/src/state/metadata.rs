use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::StorefrontError;
use crate::state::codec;

/// Account key byte the Token Metadata program writes first.
pub const METADATA_V1_KEY: u8 = 4;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Creator {
    pub address: Pubkey,
    /// Only true when this address co-signed.
    pub verified: bool,
    /// Percentage of royalties, all shares sum to 100.
    pub share: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub verified: bool,
    /// Mint of the collection NFT.
    pub key: Pubkey,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Data {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<Creator>>,
}

/// Descriptive record bound 1:1 to a mint at
/// `["metadata", metadata_program, mint]`. Serialized after the
/// [`METADATA_V1_KEY`] byte.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub data: Data,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
    pub edition_nonce: Option<u8>,
    pub token_standard: Option<u8>,
    pub collection: Option<Collection>,
}

impl Metadata {
    // key + update_authority + mint + three string prefixes + seller fee
    // + creators tag + two flags + three option tags
    pub const MIN_LEN: usize = 1 + 32 + 32 + 4 * 3 + 2 + 1 + 1 + 1 + 1 + 1 + 1;

    pub fn decode(data: &[u8]) -> Result<Self> {
        require!(data.len() >= Self::MIN_LEN, StorefrontError::TruncatedAccount);
        require!(
            data[0] == METADATA_V1_KEY,
            StorefrontError::UnknownAccountVariant
        );
        codec::deserialize(&data[1..])
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::serialize(&[METADATA_V1_KEY], self)
    }

    pub fn name(&self) -> &str {
        self.data.name.trim_end_matches('\0')
    }

    pub fn symbol(&self) -> &str {
        self.data.symbol.trim_end_matches('\0')
    }

    pub fn uri(&self) -> &str {
        self.data.uri.trim_end_matches('\0')
    }

    pub fn creators(&self) -> &[Creator] {
        self.data.creators.as_deref().unwrap_or_default()
    }
}

/// Creator list rules applied before a mint is submitted.
pub fn validate_creators(creators: &[Creator]) -> Result<()> {
    require!(
        creators.len() <= MAX_CREATOR_LIMIT,
        StorefrontError::TooManyCreators
    );

    for (i, creator) in creators.iter().enumerate() {
        require!(
            !creators[..i].iter().any(|c| c.address == creator.address),
            StorefrontError::DuplicateCreator
        );
    }

    let total: u16 = creators.iter().map(|c| c.share as u16).sum();
    require!(
        total == CREATOR_SHARE_TOTAL,
        StorefrontError::InvalidCreatorShares
    );
    Ok(())
}

/// Length and royalty limits enforced by the Token Metadata program.
pub fn validate_data(data: &Data) -> Result<()> {
    require!(
        data.name.len() <= MAX_NAME_LENGTH
            && data.symbol.len() <= MAX_SYMBOL_LENGTH
            && data.uri.len() <= MAX_URI_LENGTH,
        StorefrontError::MetadataFieldTooLong
    );
    require!(
        data.seller_fee_basis_points <= MAX_SELLER_FEE_BPS,
        StorefrontError::InvalidSellerFee
    );
    validate_creators(data.creators.as_deref().unwrap_or_default())
}
