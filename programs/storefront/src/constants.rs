use std::time::Duration;

use anchor_lang::prelude::*;
use anchor_spl::associated_token::spl_associated_token_account;
use anchor_spl::metadata::mpl_token_metadata;
use anchor_spl::token::spl_token;
use solana_sdk::program_pack::Pack;

// Seeds
pub const METADATA_SEED: &[u8] = b"metadata";
pub const EDITION_SEED: &[u8] = b"edition";
pub const LISTING_SEED: &[u8] = b"listing";

// External programs
pub const METADATA_PROGRAM_ID: Pubkey = mpl_token_metadata::ID;
pub const TOKEN_PROGRAM_ID: Pubkey = spl_token::ID;
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = spl_associated_token_account::ID;
pub const SYSTEM_PROGRAM_ID: Pubkey = anchor_lang::system_program::ID;

// Runtime limits on program-derived addresses
pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

// SPL Token account layouts
pub const MINT_SIZE: usize = spl_token::state::Mint::LEN;
pub const TOKEN_ACCOUNT_SIZE: usize = spl_token::state::Account::LEN;

// Token Metadata field limits
pub const MAX_NAME_LENGTH: usize = 32;
pub const MAX_SYMBOL_LENGTH: usize = 10;
pub const MAX_URI_LENGTH: usize = 200;
pub const MAX_CREATOR_LIMIT: usize = 5;
pub const MAX_SELLER_FEE_BPS: u16 = 10_000;

/// Creator shares are percentages and must add up to exactly this.
pub const CREATOR_SHARE_TOTAL: u16 = 100;

// Marketplace economics
pub const BPS_DENOMINATOR: u64 = 10_000;
pub const MAX_MARKETPLACE_FEE_BPS: u16 = 1_000; // 10% max
pub const DEFAULT_MARKETPLACE_FEE_BPS: u16 = 250;

// Client defaults
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(250);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(4);
