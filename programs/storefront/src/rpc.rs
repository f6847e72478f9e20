//! Remote ledger access.
//!
//! `LedgerRpc` is the only way the client touches the network. The live
//! implementation for `solana-client` sits behind the `rpc-client` feature;
//! tests drive the client with an in-memory ledger.

use std::future::Future;
use std::time::Duration;

use anchor_lang::prelude::*;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::config::RetryPolicy;
use crate::errors::{is_transient, StorefrontError};

/// Balance of one token account holding a given mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenBalance {
    pub address: Pubkey,
    pub amount: u64,
}

#[allow(async_fn_in_trait)]
pub trait LedgerRpc {
    /// `None` when no account exists at `address`.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;

    /// Largest token accounts of `mint`, biggest first.
    async fn get_token_largest_accounts(&self, mint: &Pubkey) -> Result<Vec<TokenBalance>>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64>;

    /// Resolves once the transaction is confirmed. A rejected transaction
    /// is `TransactionRejected`; nothing it contains has been applied.
    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature>;
}

/// Run a read with a per-attempt timeout, retrying transient failures with
/// exponential backoff.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    what: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(timeout, op()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(error!(StorefrontError::RpcTimeout)),
        };

        match outcome {
            Err(err) if is_transient(&err) && attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                msg!(
                    "{} failed on attempt {}/{}, retrying in {:?}",
                    what,
                    attempt,
                    policy.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(feature = "rpc-client")]
mod client_impl {
    use std::str::FromStr;

    use anchor_lang::error::Error;
    use solana_client::client_error::ClientError;
    use solana_client::nonblocking::rpc_client::RpcClient;

    use super::*;

    fn rpc_error(err: ClientError) -> Error {
        match err.get_transaction_error() {
            Some(tx_err) => {
                msg!("Transaction rejected: {}", tx_err);
                error!(StorefrontError::TransactionRejected)
            }
            None => {
                msg!("RPC request failed: {}", err);
                error!(StorefrontError::RpcFailure)
            }
        }
    }

    impl LedgerRpc for RpcClient {
        async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
            self.get_account_with_commitment(address, self.commitment())
                .await
                .map(|response| response.value)
                .map_err(rpc_error)
        }

        async fn get_token_largest_accounts(&self, mint: &Pubkey) -> Result<Vec<TokenBalance>> {
            let balances = RpcClient::get_token_largest_accounts(self, mint)
                .await
                .map_err(rpc_error)?;

            balances
                .into_iter()
                .map(|balance| {
                    let address = Pubkey::from_str(&balance.address)
                        .map_err(|_| error!(StorefrontError::RpcFailure))?;
                    let amount = balance
                        .amount
                        .amount
                        .parse::<u64>()
                        .map_err(|_| error!(StorefrontError::RpcFailure))?;
                    Ok(TokenBalance { address, amount })
                })
                .collect()
        }

        async fn get_latest_blockhash(&self) -> Result<Hash> {
            RpcClient::get_latest_blockhash(self)
                .await
                .map_err(rpc_error)
        }

        async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
            RpcClient::get_minimum_balance_for_rent_exemption(self, data_len)
                .await
                .map_err(rpc_error)
        }

        async fn send_and_confirm_transaction(
            &self,
            transaction: &Transaction,
        ) -> Result<Signature> {
            RpcClient::send_and_confirm_transaction(self, transaction)
                .await
                .map_err(rpc_error)
        }
    }
}
