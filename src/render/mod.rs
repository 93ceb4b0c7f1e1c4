//! Turns an orchestration report into layouts a visualization can draw
//! directly: a 2D node/edge graph or a stack of 3D method rings.

pub mod graph;
pub use graph::{
    FacetGraph,
    GraphEdge,
    GraphNode,
    NodeKind,
    Position,
    FACET_COLOR,
};

pub mod ring;
pub use ring::{
    Ring,
    RingMethod,
    RingStyle,
};

use serde::{
    Deserialize,
    Serialize,
};

/// Which layout the binary emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Graph,
    Ring,
}
