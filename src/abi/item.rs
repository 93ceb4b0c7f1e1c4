use crate::primitives::{
    keccak256,
    Selector,
};

use enum_as_inner::EnumAsInner;
use serde::{
    Deserialize,
    Serialize,
};

/// Declared mutability of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// Whether calling a function with this mutability leaves state untouched.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Pure | Self::View)
    }
}

/// A function, event or error parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

impl Param {
    /// The parameter type as it appears in a canonical signature. Tuples are
    /// expanded from their components, array suffixes are preserved.
    pub fn canonical_type(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => format!("({}){suffix}", canonical_list(&self.components)),
            None => self.ty.clone(),
        }
    }
}

fn canonical_list(params: &[Param]) -> String {
    params
        .iter()
        .map(Param::canonical_type)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub outputs: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
    // Pre-0.4.16 compilers emit `constant`/`payable` instead of `stateMutability`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
}

impl FunctionDescriptor {
    pub fn mutability(&self) -> StateMutability {
        if let Some(mutability) = self.state_mutability {
            return mutability;
        }
        match (self.constant, self.payable) {
            (Some(true), _) => StateMutability::View,
            (_, Some(true)) => StateMutability::Payable,
            _ => StateMutability::NonPayable,
        }
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, canonical_list(&self.inputs))
    }

    pub fn selector(&self) -> Selector {
        Selector::from_slice(&keccak256(self.signature().as_bytes())[..4])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorDescriptor {
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialFunctionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
}

/// One entry of a JSON ABI, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumAsInner)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiItem {
    Function(FunctionDescriptor),
    Event(EventDescriptor),
    Error(ErrorDescriptor),
    Constructor(ConstructorDescriptor),
    Fallback(SpecialFunctionDescriptor),
    Receive(SpecialFunctionDescriptor),
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::fixed_bytes;
    use serde_json::json;

    fn function(value: serde_json::Value) -> FunctionDescriptor {
        serde_json::from_value::<AbiItem>(value)
            .unwrap()
            .into_function()
            .unwrap()
    }

    #[test]
    fn test_erc20_selectors() {
        let transfer = function(json!({
            "type": "function",
            "name": "transfer",
            "inputs": [
                { "name": "to", "type": "address" },
                { "name": "amount", "type": "uint256" }
            ],
            "outputs": [{ "name": "", "type": "bool" }],
            "stateMutability": "nonpayable"
        }));
        assert_eq!(transfer.signature(), "transfer(address,uint256)");
        assert_eq!(transfer.selector(), fixed_bytes!("a9059cbb"));
        assert_eq!(transfer.mutability(), StateMutability::NonPayable);

        let balance_of = function(json!({
            "type": "function",
            "name": "balanceOf",
            "inputs": [{ "name": "owner", "type": "address" }],
            "stateMutability": "view"
        }));
        assert_eq!(balance_of.selector(), fixed_bytes!("70a08231"));
        assert!(balance_of.mutability().is_read());
    }

    #[test]
    fn test_tuple_signature() {
        let f = function(json!({
            "type": "function",
            "name": "f",
            "inputs": [
                {
                    "name": "orders",
                    "type": "tuple[]",
                    "internalType": "struct Order[]",
                    "components": [
                        { "name": "amount", "type": "uint256" },
                        { "name": "maker", "type": "address" }
                    ]
                },
                { "name": "flag", "type": "bool" }
            ],
            "stateMutability": "payable"
        }));
        assert_eq!(f.signature(), "f((uint256,address)[],bool)");
        assert!(!f.mutability().is_read());
    }

    #[test]
    fn test_nested_tuple_signature() {
        let param: Param = serde_json::from_value(json!({
            "type": "tuple",
            "components": [
                { "type": "tuple[2]", "components": [{ "type": "bytes4" }] },
                { "type": "string" }
            ]
        }))
        .unwrap();
        assert_eq!(param.canonical_type(), "((bytes4)[2],string)");
    }

    #[test]
    fn test_legacy_mutability_flags() {
        let constant = function(json!({
            "type": "function",
            "name": "totalSupply",
            "inputs": [],
            "constant": true,
            "payable": false
        }));
        assert_eq!(constant.mutability(), StateMutability::View);

        let payable = function(json!({
            "type": "function",
            "name": "deposit",
            "constant": false,
            "payable": true
        }));
        assert_eq!(payable.mutability(), StateMutability::Payable);
    }

    #[test]
    fn test_non_function_items() {
        let event: AbiItem = serde_json::from_value(json!({
            "type": "event",
            "name": "Transfer",
            "anonymous": false,
            "inputs": [{ "name": "from", "type": "address", "indexed": true }]
        }))
        .unwrap();
        assert!(event.is_event());

        let receive: AbiItem =
            serde_json::from_value(json!({ "type": "receive", "stateMutability": "payable" }))
                .unwrap();
        assert!(receive.is_receive());

        let unknown: AbiItem =
            serde_json::from_value(json!({ "type": "somethingNew", "name": "x" })).unwrap();
        assert!(unknown.is_unknown());
    }
}
