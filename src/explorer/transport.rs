use crate::{
    explorer::ExplorerError,
    primitives::{
        checksummed,
        Address,
    },
};

use reqwest::{
    header::ACCEPT,
    StatusCode,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::Value;
use std::{
    future::Future,
    time::Duration,
};
use tracing::trace;
use url::Url;

/// Order of a transaction listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// The explorer endpoints the inspector uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExplorerQuery {
    /// `module=contract&action=getabi`
    Abi { address: Address },
    /// `module=contract&action=getsourcecode`, carries the contract name.
    SourceCode { address: Address },
    /// `module=account&action=balance`
    Balance { address: Address },
    /// `module=account&action=txlist`
    TxList { address: Address, sort: SortOrder },
    /// `module=account&action=txlistinternal`
    TxListInternal { address: Address, sort: SortOrder },
}

impl ExplorerQuery {
    pub fn module(&self) -> &'static str {
        match self {
            Self::Abi { .. } | Self::SourceCode { .. } => "contract",
            Self::Balance { .. } | Self::TxList { .. } | Self::TxListInternal { .. } => "account",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Abi { .. } => "getabi",
            Self::SourceCode { .. } => "getsourcecode",
            Self::Balance { .. } => "balance",
            Self::TxList { .. } => "txlist",
            Self::TxListInternal { .. } => "txlistinternal",
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Self::Abi { address }
            | Self::SourceCode { address }
            | Self::Balance { address }
            | Self::TxList { address, .. }
            | Self::TxListInternal { address, .. } => *address,
        }
    }

    /// Query string parameters, without chain id and api key.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("module", self.module().to_string()),
            ("action", self.action().to_string()),
            ("address", checksummed(&self.address())),
        ];
        if let Self::TxList { sort, .. } | Self::TxListInternal { sort, .. } = self {
            params.push(("sort", sort.as_str().to_string()));
        }
        params
    }
}

/// Response envelope shared by every explorer endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl Envelope {
    pub fn ok(result: Value) -> Self {
        Self {
            status: "1".into(),
            message: "OK".into(),
            result,
        }
    }

    pub fn not_ok(message: &str, result: Value) -> Self {
        Self {
            status: "0".into(),
            message: message.into(),
            result,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// The `result` of a successful envelope, or the typed upstream error.
    pub fn into_result(self) -> Result<Value, ExplorerError> {
        if self.is_ok() {
            Ok(self.result)
        } else {
            Err(ExplorerError::from_upstream(&self.message, &self.result))
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Maps a non-success HTTP status to the error it stands for.
pub fn status_error(status: StatusCode) -> Option<ExplorerError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Some(ExplorerError::RateLimited(format!("Upstream error: {status}")))
    } else if !status.is_success() {
        Some(ExplorerError::Fatal(format!("Upstream error: {status}")))
    } else {
        None
    }
}

/// Sends one explorer request. Implementations do not retry.
pub trait ExplorerTransport: Send + Sync {
    fn get(
        &self,
        query: &ExplorerQuery,
    ) -> impl Future<Output = Result<Envelope, ExplorerError>> + Send;
}

/// Talks to an Etherscan-compatible REST API.
#[derive(Debug, Clone)]
pub struct HttpExplorerTransport {
    client: reqwest::Client,
    base_url: Url,
    chain_id: u64,
    api_key: Option<String>,
}

impl HttpExplorerTransport {
    pub fn new(
        base_url: Url,
        chain_id: u64,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ExplorerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            chain_id,
            api_key,
        })
    }

    /// Full request url for `query`. The api key is appended last.
    pub fn url_for(&self, query: &ExplorerQuery) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("chainid", &self.chain_id.to_string());
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
            if let Some(api_key) = &self.api_key {
                pairs.append_pair("apikey", api_key);
            }
        }
        url
    }
}

impl ExplorerTransport for HttpExplorerTransport {
    async fn get(&self, query: &ExplorerQuery) -> Result<Envelope, ExplorerError> {
        trace!(
            target: "diamond-inspector::explorer",
            module = query.module(),
            action = query.action(),
            address = ?query.address(),
            "Sending explorer request"
        );

        let response = self
            .client
            .get(self.url_for(query))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if let Some(err) = status_error(response.status()) {
            return Err(err);
        }

        Ok(response.json::<Envelope>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::address;
    use serde_json::json;

    const FACET: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

    fn transport(api_key: Option<&str>) -> HttpExplorerTransport {
        HttpExplorerTransport::new(
            Url::parse("https://api.etherscan.io/v2/api").unwrap(),
            8453,
            api_key.map(str::to_string),
            Duration::from_secs(15),
        )
        .unwrap()
    }

    #[test]
    fn test_url_for_abi() {
        let url = transport(Some("KEY")).url_for(&ExplorerQuery::Abi { address: FACET });
        assert_eq!(
            url.as_str(),
            "https://api.etherscan.io/v2/api?chainid=8453&module=contract&action=getabi\
             &address=0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045&apikey=KEY"
        );
    }

    #[test]
    fn test_url_for_txlist_without_key() {
        let url = transport(None).url_for(&ExplorerQuery::TxList {
            address: FACET,
            sort: SortOrder::Asc,
        });
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("module".into(), "account".into())));
        assert!(pairs.contains(&("action".into(), "txlist".into())));
        assert!(pairs.contains(&("sort".into(), "asc".into())));
        assert!(!pairs.iter().any(|(key, _)| key == "apikey"));
    }

    #[test]
    fn test_url_for_internal_txlist() {
        let url = transport(None).url_for(&ExplorerQuery::TxListInternal {
            address: FACET,
            sort: SortOrder::Desc,
        });
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("action".into(), "txlistinternal".into())));
        assert!(pairs.contains(&("sort".into(), "desc".into())));
    }

    #[test]
    fn test_status_error() {
        assert_eq!(status_error(StatusCode::OK), None);

        let rate_limited = status_error(StatusCode::TOO_MANY_REQUESTS).unwrap();
        assert!(matches!(rate_limited, ExplorerError::RateLimited(_)));
        assert!(rate_limited.is_retryable());

        for status in [StatusCode::BAD_GATEWAY, StatusCode::NOT_FOUND] {
            let err = status_error(status).unwrap();
            assert!(matches!(err, ExplorerError::Fatal(_)));
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_envelope_null_message() {
        let envelope: Envelope =
            serde_json::from_value(json!({ "status": "1", "message": null, "result": "42" }))
                .unwrap();
        assert_eq!(envelope.message, "");
        assert_eq!(envelope.into_result().unwrap(), json!("42"));
    }

    #[test]
    fn test_envelope_decoding() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }))
        .unwrap();
        assert!(!envelope.is_ok());
        assert!(matches!(
            envelope.into_result(),
            Err(ExplorerError::RateLimited(_))
        ));

        let envelope: Envelope =
            serde_json::from_value(json!({ "status": "1", "message": "OK", "result": "42" }))
                .unwrap();
        assert_eq!(envelope.into_result().unwrap(), json!("42"));
    }
}
