use anchor_lang::error::Error;
use anchor_lang::prelude::*;

use crate::constants::{METADATA_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::errors::StorefrontError;
use crate::state::*;

/// Every account shape the storefront reads.
///
/// The variant is fixed by the owning program plus a tag in the data: the
/// SPL Token program owns mints, the Token Metadata program prefixes its
/// accounts with a key byte, and the marketplace program owns listings.
/// Accounts of any other owner are not part of the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedAccount {
    Mint(Mint),
    Metadata(Metadata),
    MasterEdition(MasterEdition),
    Listing(Listing),
}

impl TypedAccount {
    pub fn decode(owner: &Pubkey, data: &[u8], marketplace_program: &Pubkey) -> Result<Self> {
        if *owner == TOKEN_PROGRAM_ID {
            // Token accounts share the owner but differ in size.
            return Mint::decode(data).map(TypedAccount::Mint);
        }

        if *owner == METADATA_PROGRAM_ID {
            return match data.first() {
                None => err!(StorefrontError::TruncatedAccount),
                Some(&METADATA_V1_KEY) => Metadata::decode(data).map(TypedAccount::Metadata),
                Some(&MASTER_EDITION_V2_KEY) => {
                    MasterEdition::decode(data).map(TypedAccount::MasterEdition)
                }
                Some(_) => err!(StorefrontError::UnknownAccountVariant),
            };
        }

        if owner == marketplace_program {
            return Listing::decode(data).map(TypedAccount::Listing);
        }

        msg!("Account owned by {} is not a storefront account", owner);
        err!(StorefrontError::UnknownAccountVariant)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            TypedAccount::Mint(mint) => mint.encode(),
            TypedAccount::Metadata(metadata) => metadata.encode(),
            TypedAccount::MasterEdition(edition) => edition.encode(),
            TypedAccount::Listing(listing) => listing.encode(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TypedAccount::Mint(_) => "mint",
            TypedAccount::Metadata(_) => "metadata",
            TypedAccount::MasterEdition(_) => "master_edition",
            TypedAccount::Listing(_) => "listing",
        }
    }
}

macro_rules! impl_try_from_typed {
    ($($variant:ident),*) => {
        $(
            impl TryFrom<TypedAccount> for $variant {
                type Error = Error;

                fn try_from(account: TypedAccount) -> Result<Self> {
                    match account {
                        TypedAccount::$variant(inner) => Ok(inner),
                        other => {
                            msg!("Expected {} account, found {}", stringify!($variant), other.kind());
                            err!(StorefrontError::UnknownAccountVariant)
                        }
                    }
                }
            }
        )*
    };
}

impl_try_from_typed!(Mint, Metadata, MasterEdition, Listing);
