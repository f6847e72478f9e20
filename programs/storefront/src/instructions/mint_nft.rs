use anchor_lang::prelude::*;
use anchor_spl::associated_token::spl_associated_token_account::instruction::create_associated_token_account;
use anchor_spl::metadata::mpl_token_metadata::instructions::{
    CreateMasterEditionV3, CreateMasterEditionV3InstructionArgs, CreateMetadataAccountV3,
    CreateMetadataAccountV3InstructionArgs,
};
use anchor_spl::metadata::mpl_token_metadata::types;
use anchor_spl::token::spl_token;
use solana_sdk::instruction::Instruction;

use crate::constants::*;
use crate::offchain::check_metadata_uri;
use crate::pda::{associated_token_address, master_edition_address, metadata_address};
use crate::state::{validate_data, Creator, Data};

/// Royalty split requested for one creator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatorShare {
    pub address: Pubkey,
    pub share: u8,
}

/// Everything needed to mint a one-of-one NFT with metadata and a master
/// edition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintParams {
    pub name: String,
    pub symbol: String,
    /// Off-chain JSON with image, description and attributes.
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<CreatorShare>,
    /// Mint of the parent collection NFT. Starts unverified.
    pub collection: Option<Pubkey>,
    pub is_mutable: bool,
    /// Printable editions beyond the master; `Some(0)` for a one-of-one.
    pub max_supply: Option<u64>,
}

impl MintParams {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
            seller_fee_basis_points: 0,
            creators: Vec::new(),
            collection: None,
            is_mutable: true,
            max_supply: Some(0),
        }
    }

    pub fn with_creator(mut self, address: Pubkey, share: u8) -> Self {
        self.creators.push(CreatorShare { address, share });
        self
    }

    pub fn with_royalty(mut self, seller_fee_basis_points: u16) -> Self {
        self.seller_fee_basis_points = seller_fee_basis_points;
        self
    }

    pub fn with_collection(mut self, collection_mint: Pubkey) -> Self {
        self.collection = Some(collection_mint);
        self
    }

    /// Metadata record as the program will store it. A creator is verified
    /// only when it is the signing authority.
    pub fn to_data(&self, authority: &Pubkey) -> Data {
        Data {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            seller_fee_basis_points: self.seller_fee_basis_points,
            creators: Some(
                self.creators
                    .iter()
                    .map(|c| Creator {
                        address: c.address,
                        verified: c.address == *authority,
                        share: c.share,
                    })
                    .collect(),
            ),
        }
    }

    pub fn validate(&self, authority: &Pubkey) -> Result<()> {
        validate_data(&self.to_data(authority))?;
        check_metadata_uri(&self.uri)
    }
}

/// Addresses and instructions of one mint transaction.
#[derive(Clone, Debug)]
pub struct MintPlan {
    pub mint: Pubkey,
    pub metadata: Pubkey,
    pub master_edition: Pubkey,
    pub token_account: Pubkey,
    pub instructions: Vec<Instruction>,
}

/// Build the atomic mint transaction body.
///
/// # Operations
/// 1. Create and initialize the mint (0 decimals)
/// 2. Create the authority's associated token account and mint 1 token
/// 3. Create the metadata account
/// 4. Create the master edition (takes over mint and freeze authority)
pub fn mint_nft(
    params: &MintParams,
    authority: &Pubkey,
    mint: &Pubkey,
    mint_rent_lamports: u64,
) -> Result<MintPlan> {
    params.validate(authority)?;

    let (metadata, _) = metadata_address(mint, &METADATA_PROGRAM_ID)?;
    let (master_edition, _) = master_edition_address(mint, &METADATA_PROGRAM_ID)?;
    let token_account = associated_token_address(authority, mint)?;

    let data = params.to_data(authority);
    let metadata_args = CreateMetadataAccountV3InstructionArgs {
        data: types::DataV2 {
            name: data.name,
            symbol: data.symbol,
            uri: data.uri,
            seller_fee_basis_points: data.seller_fee_basis_points,
            creators: data.creators.map(|creators| {
                creators
                    .into_iter()
                    .map(|c| types::Creator {
                        address: c.address,
                        verified: c.verified,
                        share: c.share,
                    })
                    .collect()
            }),
            collection: params.collection.map(|key| types::Collection {
                verified: false,
                key,
            }),
            uses: None,
        },
        is_mutable: params.is_mutable,
        collection_details: None,
    };

    #[allow(deprecated)]
    let create_mint = solana_sdk::system_instruction::create_account(
        authority,
        mint,
        mint_rent_lamports,
        MINT_SIZE as u64,
        &TOKEN_PROGRAM_ID,
    );

    let instructions = vec![
        create_mint,
        spl_token::instruction::initialize_mint2(
            &TOKEN_PROGRAM_ID,
            mint,
            authority,
            Some(authority),
            0,
        )?,
        create_associated_token_account(authority, authority, mint, &TOKEN_PROGRAM_ID),
        spl_token::instruction::mint_to(&TOKEN_PROGRAM_ID, mint, &token_account, authority, &[], 1)?,
        CreateMetadataAccountV3 {
            metadata,
            mint: *mint,
            mint_authority: *authority,
            payer: *authority,
            update_authority: (*authority, true),
            system_program: SYSTEM_PROGRAM_ID,
            rent: None,
        }
        .instruction(metadata_args),
        CreateMasterEditionV3 {
            edition: master_edition,
            mint: *mint,
            update_authority: *authority,
            mint_authority: *authority,
            payer: *authority,
            metadata,
            token_program: TOKEN_PROGRAM_ID,
            system_program: SYSTEM_PROGRAM_ID,
            rent: None,
        }
        .instruction(CreateMasterEditionV3InstructionArgs {
            max_supply: params.max_supply,
        }),
    ];

    Ok(MintPlan {
        mint: *mint,
        metadata,
        master_edition,
        token_account,
        instructions,
    })
}
