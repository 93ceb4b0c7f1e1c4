mod error;
pub use error::InspectorError;

pub mod abi;

pub mod cache;

pub mod config;
pub use config::InspectorConfig;

pub mod explorer;

pub mod loupe;

pub mod orchestrator;
pub use orchestrator::{
    FacetOrchestrator,
    FacetReport,
    Inspection,
};

pub mod primitives;

pub mod render;

#[cfg(any(test, feature = "test"))]
pub mod test_utils;
