use anchor_lang::prelude::*;

pub mod client;
pub mod config;
pub mod constants;
pub mod errors;
pub mod instructions;
pub mod lifecycle;
pub mod offchain;
pub mod pda;
pub mod rpc;
pub mod state;

pub use client::{Keyed, MarketplaceClient, MintResult, TransferResult, WalletSigner};
pub use config::{ClientConfig, Cluster, RetryPolicy};
pub use errors::StorefrontError;
pub use lifecycle::ListingAction;
pub use rpc::{LedgerRpc, TokenBalance};

// Marketplace program the listings belong to.
declare_id!("6wTM9wS7jU9qAZHEWkCZADzGtq2Aj8VT2rS6eMN97HbJ");
