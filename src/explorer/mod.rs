mod error;
pub use error::ExplorerError;

mod retry;
pub use retry::RetryPolicy;

mod transport;
pub use transport::{
    Envelope,
    ExplorerQuery,
    ExplorerTransport,
    HttpExplorerTransport,
    SortOrder,
};

use crate::{
    abi::Abi,
    cache::{
        unix_now,
        CacheEntry,
        CacheRepository,
        CacheSession,
        UNKNOWN_CONTRACT,
    },
    primitives::{
        short_address,
        Address,
        U256,
    },
};

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{
    debug,
    error,
    instrument,
    warn,
};

/// Transaction history summary of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractActivity {
    pub transaction_count: usize,
    /// Unix timestamp of the most recent transaction.
    pub last_activity: Option<u64>,
}

/// Resolves contract metadata through the block explorer, consulting and
/// filling the facet cache.
///
/// Lookups never fail: explorer errors are logged and turned into `None` or a
/// synthesized fallback.
#[derive(Debug)]
pub struct ExplorerGateway<T> {
    transport: T,
    retry: RetryPolicy,
}

impl<T: ExplorerTransport> ExplorerGateway<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Sends `query`, retrying rate limited and transient failures with the
    /// configured backoff. Cancelling `token` aborts the in-flight request or delay.
    pub async fn request(
        &self,
        query: &ExplorerQuery,
        token: &CancellationToken,
    ) -> Result<Value, ExplorerError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;

        loop {
            let delay = self.retry.delay_for(attempt);
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ExplorerError::Cancelled),
                outcome = async {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    self.transport.get(query).await
                } => outcome,
            };

            match outcome.and_then(Envelope::into_result) {
                Ok(result) => return Ok(result),
                Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                    warn!(
                        target: "diamond-inspector::explorer",
                        action = query.action(),
                        address = ?query.address(),
                        attempt = attempt + 1,
                        attempts,
                        %err,
                        "Explorer request failed, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Returns the ABI of `address`, from the cache when it holds a fresh
    /// entry, otherwise from the explorer. Successful lookups are cached.
    #[instrument(skip(self, cache, token))]
    pub async fn fetch_abi<R: CacheRepository>(
        &self,
        address: Address,
        cache: &mut CacheSession<R>,
        token: &CancellationToken,
    ) -> Option<Abi> {
        let cached = cache.record().abis.get(&address).cloned();
        if let Some(entry) = &cached {
            if !entry.is_stale(cache.policy(), unix_now()) {
                debug!(target: "diamond-inspector::explorer", "ABI cache hit");
                return Some(entry.value.clone());
            }
        }

        let resolved = self
            .request(&ExplorerQuery::Abi { address }, token)
            .await
            .and_then(|result| {
                Abi::from_explorer_result(&result).map_err(|err| ExplorerError::Decode(err.to_string()))
            });

        match resolved {
            Ok(abi) => {
                cache.update(|record| {
                    record.abis.insert(address, CacheEntry::resolved(abi.clone()));
                });
                Some(abi)
            }
            Err(ExplorerError::Cancelled) => {
                debug!(target: "diamond-inspector::explorer", "ABI lookup cancelled");
                cached.map(|entry| entry.value)
            }
            Err(err) => {
                error!(target: "diamond-inspector::explorer", %err, "Failed to fetch ABI");
                // A stale entry beats none at all.
                cached.map(|entry| entry.value)
            }
        }
    }

    /// Returns the verified contract name of `address`.
    ///
    /// Cached names are reused unless the staleness policy rejects them. When
    /// the explorer has no name, a previously cached value is returned, or a
    /// short address is synthesized and cached as a fallback entry.
    #[instrument(skip(self, cache, token))]
    pub async fn fetch_contract_name<R: CacheRepository>(
        &self,
        address: Address,
        cache: &mut CacheSession<R>,
        token: &CancellationToken,
    ) -> CacheEntry<String> {
        let cached = cache.record().contract_names.get(&address).cloned();
        if let Some(entry) = &cached {
            if !entry.is_stale(cache.policy(), unix_now()) && entry.value != UNKNOWN_CONTRACT {
                debug!(target: "diamond-inspector::explorer", "Contract name cache hit");
                return entry.clone();
            }
        }

        match self
            .request(&ExplorerQuery::SourceCode { address }, token)
            .await
            .map(|result| contract_name_from_result(&result))
        {
            Ok(Some(name)) => {
                let entry = CacheEntry::resolved(name);
                cache.update(|record| {
                    record.contract_names.insert(address, entry.clone());
                });
                return entry;
            }
            // A verified response without a name is final, it is not retried.
            Ok(None) => {
                warn!(target: "diamond-inspector::explorer", "Explorer returned no contract name");
            }
            Err(ExplorerError::Cancelled) => {
                // Nothing was learned, so nothing is persisted.
                debug!(target: "diamond-inspector::explorer", "Contract name lookup cancelled");
                return cached.unwrap_or_else(|| CacheEntry::fallback(short_address(&address)));
            }
            Err(err) => {
                error!(target: "diamond-inspector::explorer", %err, "Failed to fetch contract name");
            }
        }

        if let Some(existing) = cached {
            return existing;
        }

        let entry = CacheEntry::fallback(short_address(&address));
        cache.update(|record| {
            record.contract_names.insert(address, entry.clone());
        });
        entry
    }

    /// Native balance of `address` in wei.
    pub async fn fetch_balance(&self, address: Address, token: &CancellationToken) -> Option<U256> {
        match self.request(&ExplorerQuery::Balance { address }, token).await {
            Ok(Value::String(wei)) => match wei.parse::<U256>() {
                Ok(balance) => Some(balance),
                Err(err) => {
                    error!(target: "diamond-inspector::explorer", ?address, %err, "Unparsable balance");
                    None
                }
            },
            Ok(other) => {
                error!(target: "diamond-inspector::explorer", ?address, %other, "Unexpected balance payload");
                None
            }
            Err(err) => {
                error!(target: "diamond-inspector::explorer", ?address, %err, "Failed to fetch balance");
                None
            }
        }
    }

    /// Transaction count and last activity of `address`.
    pub async fn fetch_activity(
        &self,
        address: Address,
        token: &CancellationToken,
    ) -> Option<ContractActivity> {
        let query = ExplorerQuery::TxList {
            address,
            sort: SortOrder::Asc,
        };
        self.activity(&query, token).await
    }

    /// Like [`Self::fetch_activity`], over the internal transactions (calls
    /// made by other contracts) of `address`.
    pub async fn fetch_internal_activity(
        &self,
        address: Address,
        token: &CancellationToken,
    ) -> Option<ContractActivity> {
        let query = ExplorerQuery::TxListInternal {
            address,
            sort: SortOrder::Asc,
        };
        self.activity(&query, token).await
    }

    async fn activity(&self, query: &ExplorerQuery, token: &CancellationToken) -> Option<ContractActivity> {
        let address = query.address();
        match self.request(query, token).await {
            Ok(Value::Array(transactions)) => {
                let last_activity = transactions
                    .last()
                    .and_then(|tx| tx.get("timeStamp"))
                    .and_then(Value::as_str)
                    .and_then(|timestamp| timestamp.parse().ok());
                Some(ContractActivity {
                    transaction_count: transactions.len(),
                    last_activity,
                })
            }
            Ok(other) => {
                error!(
                    target: "diamond-inspector::explorer",
                    ?address,
                    action = query.action(),
                    %other,
                    "Unexpected transaction list payload"
                );
                None
            }
            Err(ExplorerError::NotFound(_)) => Some(ContractActivity::default()),
            Err(err) => {
                error!(target: "diamond-inspector::explorer", ?address, %err, "Failed to fetch activity");
                None
            }
        }
    }
}

/// Extracts `result[0].ContractName` from a `getsourcecode` response.
fn contract_name_from_result(result: &Value) -> Option<String> {
    let name = result.get(0)?.get("ContractName")?.as_str()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}
