#![cfg(any(test, feature = "test"))]

use crate::{
    abi::AbiError,
    explorer::{
        Envelope,
        ExplorerError,
        ExplorerQuery,
        ExplorerTransport,
    },
    loupe::{
        DiamondLoupe,
        LoupeError,
    },
    primitives::{
        keccak256,
        Address,
        Bytes,
        Facet,
        Selector,
    },
};

use parking_lot::Mutex;
use serde_json::json;
use std::collections::{
    HashMap,
    VecDeque,
};

/// An ERC-20 flavoured ABI with one function of every mutability.
pub const SAMPLE_ABI: &str = r#"[
    {"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
    {"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
    {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
    {"type":"function","name":"mint","inputs":[{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"payable"},
    {"type":"function","name":"version","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"pure"},
    {"type":"event","name":"Transfer","anonymous":false,"inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"amount","type":"uint256","indexed":false}]},
    {"type":"error","name":"InsufficientBalance","inputs":[{"name":"needed","type":"uint256"}]}
]"#;

/// Selector of a canonical function signature such as `transfer(address,uint256)`.
pub fn selector_of(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature.as_bytes())[..4])
}

pub fn random_address() -> Address {
    Address::random()
}

/// Successful `getabi` response carrying `abi` as a JSON string.
pub fn abi_envelope(abi: &str) -> Envelope {
    Envelope::ok(json!(abi))
}

/// Successful `getsourcecode` response for a contract called `name`.
pub fn source_code_envelope(name: &str) -> Envelope {
    Envelope::ok(json!([{ "ContractName": name, "SourceCode": "" }]))
}

pub fn rate_limited() -> Envelope {
    Envelope::not_ok("NOTOK", json!("Max rate limit reached"))
}

/// Explorer transport answering from per-query scripts, in push order.
/// Queries without a scripted response fail with a fatal error.
#[derive(Debug, Default)]
pub struct ScriptedExplorer {
    responses: Mutex<HashMap<ExplorerQuery, VecDeque<Result<Envelope, ExplorerError>>>>,
    calls: Mutex<Vec<ExplorerQuery>>,
}

impl ScriptedExplorer {
    pub fn push(&self, query: ExplorerQuery, response: Result<Envelope, ExplorerError>) {
        self.responses
            .lock()
            .entry(query)
            .or_default()
            .push_back(response);
    }

    pub fn call_count(&self, query: &ExplorerQuery) -> usize {
        self.calls.lock().iter().filter(|call| *call == query).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }
}

impl ExplorerTransport for ScriptedExplorer {
    async fn get(&self, query: &ExplorerQuery) -> Result<Envelope, ExplorerError> {
        self.calls.lock().push(query.clone());
        self.responses
            .lock()
            .get_mut(query)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(ExplorerError::Fatal(format!(
                    "no scripted response for {}",
                    query.action()
                )))
            })
    }
}

/// Loupe returning a fixed facet table and canned call outputs keyed by
/// selector. Calls are recorded.
#[derive(Debug, Default)]
pub struct StaticLoupe {
    pub table: Vec<Facet>,
    outputs: HashMap<Selector, Bytes>,
    calls: Mutex<Vec<Bytes>>,
}

impl StaticLoupe {
    pub fn new(table: Vec<Facet>) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    pub fn with_output(mut self, selector: Selector, output: Bytes) -> Self {
        self.outputs.insert(selector, output);
        self
    }

    pub fn calls(&self) -> Vec<Bytes> {
        self.calls.lock().clone()
    }
}

impl DiamondLoupe for StaticLoupe {
    async fn facets(&self) -> Result<Vec<Facet>, LoupeError> {
        Ok(self.table.clone())
    }

    async fn call(&self, input: Bytes) -> Result<Bytes, LoupeError> {
        self.calls.lock().push(input.clone());
        let mut selector = Selector::ZERO;
        let len = input.len().min(4);
        selector[..len].copy_from_slice(&input[..len]);
        self.outputs
            .get(&selector)
            .cloned()
            .ok_or(LoupeError::CallError(AbiError::UnknownSelector(selector)))
    }
}
