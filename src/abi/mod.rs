mod call;
pub use call::{
    decode_output,
    encode_call,
    value_to_json,
};

mod classifier;
pub use classifier::classify;

mod item;
pub use item::{
    AbiItem,
    ConstructorDescriptor,
    ErrorDescriptor,
    EventDescriptor,
    FunctionDescriptor,
    Param,
    SpecialFunctionDescriptor,
    StateMutability,
};

use crate::primitives::Selector;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum AbiError {
    #[error("ABI is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("ABI must be a JSON array")]
    NotAnArray,
    #[error("Unexpected explorer payload for ABI")]
    UnexpectedPayload,
    #[error("No function in ABI for selector {0}")]
    UnknownSelector(Selector),
    #[error("No function named {0} in ABI")]
    UnknownFunction(String),
    #[error("Expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },
    #[error("Invalid Solidity value")]
    Type(#[from] alloy_dyn_abi::Error),
}

/// A contract ABI as published by the block explorer.
///
/// The raw JSON entries are kept as-is so the ABI can be cached and handed to
/// callers unchanged. Typed views are produced on demand by [`Abi::items`],
/// which tolerates entries it cannot understand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abi(Vec<Value>);

impl Abi {
    pub fn new(entries: Vec<Value>) -> Self {
        Self(entries)
    }

    /// Parses an ABI from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Array(entries) => Ok(Self(entries)),
            _ => Err(AbiError::NotAnArray),
        }
    }

    /// Parses the `result` field of a `getabi` response. The explorer returns
    /// the ABI as a JSON-encoded string, some proxies return the array itself.
    pub fn from_explorer_result(result: &Value) -> Result<Self, AbiError> {
        match result {
            Value::String(json) => Self::from_json(json),
            Value::Array(entries) => Ok(Self(entries.clone())),
            _ => Err(AbiError::UnexpectedPayload),
        }
    }

    pub fn entries(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Typed entries of the ABI. Malformed entries are logged and skipped.
    pub fn items(&self) -> Vec<AbiItem> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let mut entry = entry.clone();
                // `type` may be omitted, in which case it defaults to "function".
                if let Value::Object(fields) = &mut entry {
                    fields
                        .entry("type")
                        .or_insert_with(|| Value::String("function".into()));
                }
                match serde_json::from_value::<AbiItem>(entry) {
                    Ok(item) => Some(item),
                    Err(err) => {
                        warn!(
                            target: "diamond-inspector::abi",
                            index,
                            %err,
                            "Skipping malformed ABI entry"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    pub fn functions(&self) -> impl Iterator<Item = FunctionDescriptor> {
        self.items().into_iter().filter_map(|item| item.into_function().ok())
    }

    /// Returns the first function named `name`, e.g. to build a call form from
    /// its inputs.
    pub fn find_function(&self, name: &str) -> Option<FunctionDescriptor> {
        self.functions().find(|function| function.name == name)
    }

    pub fn function_by_selector(&self, selector: Selector) -> Result<FunctionDescriptor, AbiError> {
        self.functions()
            .find(|function| function.selector() == selector)
            .ok_or(AbiError::UnknownSelector(selector))
    }

    /// Looks `method` up by selector when it is `0x`-prefixed hex, by name
    /// otherwise.
    pub fn resolve_method(&self, method: &str) -> Result<FunctionDescriptor, AbiError> {
        if method.starts_with("0x") {
            if let Ok(selector) = method.parse::<Selector>() {
                return self.function_by_selector(selector);
            }
        }
        self.find_function(method)
            .ok_or_else(|| AbiError::UnknownFunction(method.to_string()))
    }
}
