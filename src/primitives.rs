pub use alloy_primitives::{
    address,
    fixed_bytes,
    hex,
    keccak256,
    Address,
    Bytes,
    FixedBytes,
    U256,
};

use serde::{
    Deserialize,
    Serialize,
};

/// 4-byte function identifier, as returned by the diamond loupe.
pub type Selector = FixedBytes<4>;

/// A facet of an EIP-2535 diamond: the implementation address and the
/// selectors the diamond routes to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facet {
    pub address: Address,
    pub selectors: Vec<Selector>,
}

impl Facet {
    pub fn new(address: Address, selectors: Vec<Selector>) -> Self {
        Self { address, selectors }
    }
}

/// Method names of a facet bucketed by whether calling them mutates state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodClassification {
    pub read_methods: Vec<String>,
    pub write_methods: Vec<String>,
}

impl MethodClassification {
    pub fn len(&self) -> usize {
        self.read_methods.len() + self.write_methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checksummed form of `address`.
pub fn checksummed(address: &Address) -> String {
    address.to_checksum(None)
}

/// Display form used when no contract name could be resolved, e.g. `0xAbCd…1234`.
pub fn short_address(address: &Address) -> String {
    let full = checksummed(address);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

/// First `len` characters of the checksummed address.
pub fn address_prefix(address: &Address, len: usize) -> String {
    let full = checksummed(address);
    full[..len.min(full.len())].to_string()
}
