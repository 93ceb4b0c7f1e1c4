//! Reads the facet table of an EIP-2535 diamond and calls its view methods.

use crate::{
    abi::{
        decode_output,
        encode_call,
        AbiError,
        FunctionDescriptor,
    },
    primitives::{
        Address,
        Bytes,
        Facet,
    },
};

use alloy_dyn_abi::DynSolValue;

use alloy_provider::Provider;
use alloy_rpc_types::{
    TransactionInput,
    TransactionRequest,
};
use alloy_sol_types::{
    sol,
    SolCall,
};
use alloy_transport::TransportError;
use std::future::Future;
use tracing::debug;

sol! {
    #[derive(Debug)]
    struct LoupeFacet {
        address facetAddress;
        bytes4[] functionSelectors;
    }

    #[derive(Debug)]
    function facets() external view returns (LoupeFacet[] memory);
}

#[derive(Debug, thiserror::Error)]
pub enum LoupeError {
    #[error("Transport error")]
    TransportError(#[from] TransportError),
    #[error("Failed to decode facets")]
    DecodeError(#[from] alloy_sol_types::Error),
    #[error("Invalid method call")]
    CallError(#[from] AbiError),
}

/// Read access to a diamond: its facets and `eth_call` against it.
pub trait DiamondLoupe: Send + Sync {
    fn facets(&self) -> impl Future<Output = Result<Vec<Facet>, LoupeError>> + Send;

    /// Executes `input` as a call to the diamond and returns the raw output.
    fn call(&self, input: Bytes) -> impl Future<Output = Result<Bytes, LoupeError>> + Send;
}

/// Calls `function` on the diamond with `args` given as text and decodes
/// the returned values.
pub async fn read_method<L: DiamondLoupe>(
    loupe: &L,
    function: &FunctionDescriptor,
    args: &[String],
) -> Result<Vec<DynSolValue>, LoupeError> {
    let input = encode_call(function, args)?;
    let output = loupe.call(input).await?;
    debug!(
        target: "diamond-inspector::loupe",
        method = %function.signature(),
        bytes = output.len(),
        "Read method"
    );
    Ok(decode_output(function, &output)?)
}

/// Calls `facets()` on the diamond through an alloy provider.
#[derive(Debug, Clone)]
pub struct ProviderLoupe<P> {
    provider: P,
    diamond: Address,
}

impl<P> ProviderLoupe<P> {
    pub fn new(provider: P, diamond: Address) -> Self {
        Self { provider, diamond }
    }

    pub fn diamond(&self) -> Address {
        self.diamond
    }
}

impl<P: Provider> DiamondLoupe for ProviderLoupe<P> {
    async fn facets(&self) -> Result<Vec<Facet>, LoupeError> {
        let output = self.call(facetsCall {}.abi_encode().into()).await?;
        let facets = decode_facets(&output)?;

        debug!(
            target: "diamond-inspector::loupe",
            diamond = ?self.diamond,
            facets = facets.len(),
            "Read diamond facets"
        );

        Ok(facets)
    }

    async fn call(&self, input: Bytes) -> Result<Bytes, LoupeError> {
        let request = TransactionRequest::default()
            .to(self.diamond)
            .input(TransactionInput::new(input));
        Ok(self.provider.call(&request).await?)
    }
}

/// Decodes the return data of `facets()`.
pub fn decode_facets(output: &[u8]) -> Result<Vec<Facet>, LoupeError> {
    let facets = facetsCall::abi_decode_returns(output, true)?._0;
    Ok(facets
        .into_iter()
        .map(|facet| Facet::new(facet.facetAddress, facet.functionSelectors))
        .collect())
}
