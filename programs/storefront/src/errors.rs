use anchor_lang::error::Error;
use anchor_lang::prelude::*;

#[error_code]
pub enum StorefrontError {
    #[msg("No bump seed in [0, 255] produced an off-curve address")]
    DerivationExhausted,

    #[msg("Too many seeds or a seed longer than 32 bytes")]
    InvalidSeeds,

    #[msg("Account tag does not match any known account variant")]
    UnknownAccountVariant,

    #[msg("Account data is shorter than its layout requires")]
    TruncatedAccount,

    #[msg("Account data contains an invalid flag, option tag or string")]
    MalformedAccount,

    #[msg("Account does not exist")]
    AccountNotFound,

    #[msg("Creator shares must sum to exactly 100")]
    InvalidCreatorShares,

    #[msg("Too many creators (maximum 5)")]
    TooManyCreators,

    #[msg("Creator address appears more than once")]
    DuplicateCreator,

    #[msg("Name, symbol or URI exceeds its maximum length")]
    MetadataFieldTooLong,

    #[msg("Seller fee basis points exceed 10000")]
    InvalidSellerFee,

    #[msg("Marketplace fee exceeds the 10% cap")]
    InvalidFeeBps,

    #[msg("Retry policy must allow at least one attempt")]
    InvalidRetryPolicy,

    #[msg("Signer does not hold this token")]
    NotOwner,

    #[msg("Signer is not the seller of this listing")]
    NotSeller,

    #[msg("An active listing already exists for this mint")]
    AlreadyListed,

    #[msg("Mint is not listed")]
    NotListed,

    #[msg("Listing is not active")]
    ListingNotActive,

    #[msg("Listing cannot leave a terminal state")]
    IllegalTransition,

    #[msg("Price must be greater than zero")]
    InvalidPrice,

    #[msg("Listing price changed since it was read")]
    PriceMismatch,

    #[msg("Seller cannot buy their own listing")]
    SelfPurchase,

    #[msg("Token has an active listing and cannot be transferred")]
    TokenListed,

    #[msg("Recipient already holds this token")]
    InvalidRecipient,

    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Transaction could not be signed")]
    SigningFailed,

    #[msg("Remote ledger did not answer in time")]
    RpcTimeout,

    #[msg("Remote ledger request failed")]
    RpcFailure,

    #[msg("Transaction was rejected by the ledger")]
    TransactionRejected,

    #[msg("Metadata URI is empty or uses an unsupported scheme")]
    InvalidMetadataUri,

    #[msg("Off-chain metadata JSON could not be parsed")]
    InvalidOffChainMetadata,
}

/// Whether `err` is a network-level failure that may be retried with backoff.
pub fn is_transient(err: &Error) -> bool {
    is_error(err, StorefrontError::RpcTimeout) || is_error(err, StorefrontError::RpcFailure)
}

/// Whether `err` carries the error code of `expected`.
pub fn is_error(err: &Error, expected: StorefrontError) -> bool {
    match err {
        Error::AnchorError(anchor_error) => anchor_error.error_code_number == u32::from(expected),
        Error::ProgramError(_) => false,
    }
}
