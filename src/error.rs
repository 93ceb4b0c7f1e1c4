use crate::{
    abi::AbiError,
    cache::CacheError,
    config::ConfigError,
    explorer::ExplorerError,
    loupe::LoupeError,
    orchestrator::OrchestratorError,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectorError {
    #[error("Failed to access the facet cache")]
    CacheError(#[from] CacheError),
    #[error("Explorer request failed")]
    ExplorerError(#[from] ExplorerError),
    #[error("Invalid ABI")]
    AbiError(#[from] AbiError),
    #[error("Failed to read diamond facets")]
    LoupeError(#[from] LoupeError),
    #[error("Facet processing failed")]
    OrchestratorError(#[from] OrchestratorError),
    #[error("Invalid configuration")]
    ConfigError(#[from] ConfigError),
}
