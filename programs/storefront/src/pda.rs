//! Program-derived address derivation.
//!
//! Every address the storefront locates by convention (metadata, master
//! edition, listing, associated token account) goes through [`derive`].

use anchor_lang::prelude::*;
use anchor_lang::solana_program::pubkey::PubkeyError;

use crate::constants::*;
use crate::errors::StorefrontError;

/// Finds the first off-curve address for `seeds` under `program_id`,
/// trying bump seeds from 255 down to 0.
///
/// Same search as `Pubkey::try_find_program_address`, with running out of
/// bumps reported as `DerivationExhausted`.
pub fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    search_bump(seeds, program_id, Pubkey::create_program_address)
}

fn search_bump<F>(seeds: &[&[u8]], program_id: &Pubkey, create: F) -> Result<(Pubkey, u8)>
where
    F: Fn(&[&[u8]], &Pubkey) -> std::result::Result<Pubkey, PubkeyError>,
{
    // The bump occupies one seed slot.
    require!(seeds.len() < MAX_SEEDS, StorefrontError::InvalidSeeds);
    require!(
        seeds.iter().all(|seed| seed.len() <= MAX_SEED_LEN),
        StorefrontError::InvalidSeeds
    );

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut seeds_with_bump = seeds.to_vec();
        seeds_with_bump.push(&bump_seed);

        match create(&seeds_with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            // Landed on the curve, try the next bump.
            Err(PubkeyError::InvalidSeeds) => continue,
            Err(_) => return err!(StorefrontError::InvalidSeeds),
        }
    }

    msg!("Derivation exhausted for program {}", program_id);
    err!(StorefrontError::DerivationExhausted)
}

/// `["metadata", metadata_program, mint]`
pub fn metadata_address(mint: &Pubkey, metadata_program: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(
        &[METADATA_SEED, metadata_program.as_ref(), mint.as_ref()],
        metadata_program,
    )
}

/// `["metadata", metadata_program, mint, "edition"]`
pub fn master_edition_address(mint: &Pubkey, metadata_program: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(
        &[
            METADATA_SEED,
            metadata_program.as_ref(),
            mint.as_ref(),
            EDITION_SEED,
        ],
        metadata_program,
    )
}

/// `["listing", mint, seller]` under the marketplace program.
pub fn listing_address(
    mint: &Pubkey,
    seller: &Pubkey,
    marketplace_program: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive(
        &[LISTING_SEED, mint.as_ref(), seller.as_ref()],
        marketplace_program,
    )
}

/// The wallet's canonical token account for `mint`.
pub fn associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Result<Pubkey> {
    let (address, _) = derive(
        &[wallet.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )?;
    Ok(address)
}
