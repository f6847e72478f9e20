use std::time::Duration;

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::StorefrontError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Cluster {
    Mainnet,
    #[default]
    Devnet,
    Localnet,
    Custom(String),
}

impl Cluster {
    pub fn url(&self) -> &str {
        match self {
            Cluster::Mainnet => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
            Cluster::Custom(url) => url,
        }
    }
}

/// Bounded exponential backoff for transient read failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub cluster: Cluster,
    pub marketplace_program_id: Pubkey,
    /// Receives the marketplace fee on every sale.
    pub treasury: Pubkey,
    pub fee_bps: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub retry: RetryPolicy,
    /// Zero disables caching.
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            marketplace_program_id: crate::ID,
            treasury: Pubkey::default(),
            fee_bps: DEFAULT_MARKETPLACE_FEE_BPS,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            retry: RetryPolicy::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl ClientConfig {
    pub fn new(cluster: Cluster, treasury: Pubkey) -> Self {
        Self {
            cluster,
            treasury,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require!(
            self.fee_bps <= MAX_MARKETPLACE_FEE_BPS,
            StorefrontError::InvalidFeeBps
        );
        require!(
            self.retry.max_attempts > 0,
            StorefrontError::InvalidRetryPolicy
        );
        Ok(())
    }
}
