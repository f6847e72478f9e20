use anchor_lang::prelude::*;

use crate::errors::StorefrontError;
use crate::state::codec;

pub const MASTER_EDITION_V2_KEY: u8 = 6;

/// Caps the printable copies of a mint. Lives at
/// `["metadata", metadata_program, mint, "edition"]`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MasterEdition {
    pub supply: u64,
    /// `None` means prints are unbounded; `Some(0)` is a one-of-one.
    pub max_supply: Option<u64>,
}

impl MasterEdition {
    pub const MIN_LEN: usize = 1 + 8 + 1;

    pub fn decode(data: &[u8]) -> Result<Self> {
        require!(data.len() >= Self::MIN_LEN, StorefrontError::TruncatedAccount);
        require!(
            data[0] == MASTER_EDITION_V2_KEY,
            StorefrontError::UnknownAccountVariant
        );
        codec::deserialize(&data[1..])
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::serialize(&[MASTER_EDITION_V2_KEY], self)
    }

    pub fn is_within_cap(&self) -> bool {
        self.max_supply.map_or(true, |max| self.supply <= max)
    }

    pub fn can_print(&self) -> bool {
        self.max_supply.map_or(true, |max| self.supply < max)
    }
}
