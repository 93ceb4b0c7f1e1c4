use crate::{
    orchestrator::FacetReport,
    primitives::{
        address_prefix,
        checksummed,
        Facet,
    },
};

use rand::Rng;
use serde::Serialize;
use tracing::warn;

/// Color of facet nodes and of the edges chaining facets together.
pub const FACET_COLOR: &str = "#00ccff";

/// Distance between neighbouring nodes on both axes.
const GRID: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Facet,
    ReadMethod,
    WriteMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub color: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub color: String,
}

/// Preset-positioned graph: facets stacked vertically, read methods to the
/// left of their facet and write methods to the right.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacetGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl FacetGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// `#RRGGBB` with uniformly random channels.
pub fn random_color(rng: &mut impl Rng) -> String {
    format!("#{:06X}", rng.gen_range(0..0x100_0000u32))
}

pub fn layout(facets: &[Facet], report: &FacetReport, rng: &mut impl Rng) -> FacetGraph {
    let mut graph = FacetGraph::default();

    for (index, facet) in facets.iter().enumerate() {
        let id = checksummed(&facet.address);
        let y = GRID * index as f64;
        let label = report
            .name_of(&facet.address)
            .map(str::to_string)
            .unwrap_or_else(|| address_prefix(&facet.address, 6));

        graph.nodes.push(GraphNode {
            id: id.clone(),
            label,
            kind: NodeKind::Facet,
            color: FACET_COLOR.to_string(),
            position: Position { x: 0.0, y },
        });

        if index > 0 {
            graph.edges.push(GraphEdge {
                source: checksummed(&facets[index - 1].address),
                target: id.clone(),
                color: FACET_COLOR.to_string(),
            });
        }

        let color = random_color(rng);
        let Some(methods) = report.methods_of(&facet.address) else {
            warn!(
                target: "diamond-inspector::render",
                address = ?facet.address,
                "No method names for facet"
            );
            continue;
        };

        let sides = [
            (&methods.read_methods, NodeKind::ReadMethod, "read", -1.0),
            (&methods.write_methods, NodeKind::WriteMethod, "write", 1.0),
        ];
        for (names, kind, tag, direction) in sides {
            for (k, method) in names.iter().enumerate() {
                let method_id = format!("{id}-{tag}-{k}");
                graph.nodes.push(GraphNode {
                    id: method_id.clone(),
                    label: method.clone(),
                    kind,
                    color: color.clone(),
                    position: Position {
                        x: direction * (GRID + GRID * k as f64),
                        y,
                    },
                });
                graph.edges.push(GraphEdge {
                    source: id.clone(),
                    target: method_id,
                    color: color.clone(),
                });
            }
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{
        Address,
        MethodClassification,
    };
    use rand::{
        rngs::StdRng,
        SeedableRng,
    };

    fn report_for(entries: Vec<(Address, &str, Vec<&str>, Vec<&str>)>) -> FacetReport {
        let mut report = FacetReport::default();
        for (address, name, reads, writes) in entries {
            report.facet_names_lookup.insert(address, name.to_string());
            report.method_names_lookup.insert(
                address,
                MethodClassification {
                    read_methods: reads.iter().map(|m| m.to_string()).collect(),
                    write_methods: writes.iter().map(|m| m.to_string()).collect(),
                },
            );
        }
        report
    }

    #[test]
    fn test_edge_counts() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let c = Address::repeat_byte(0xcc);
        let report = report_for(vec![
            (a, "DiamondCutFacet", vec![], vec!["diamondCut"]),
            (b, "LoupeFacet", vec!["facets", "facetAddress"], vec![]),
            (c, "TokenFacet", vec!["balanceOf"], vec!["transfer", "approve"]),
        ]);
        let facets = [a, b, c].map(|address| Facet::new(address, vec![]));

        let graph = layout(&facets, &report, &mut StdRng::seed_from_u64(7));

        let chain = graph.edges.iter().filter(|e| e.color == FACET_COLOR).count();
        assert_eq!(chain, facets.len() - 1);
        assert_eq!(graph.edges.len(), facets.len() - 1 + 6);
        assert_eq!(graph.nodes.len(), 3 + 6);
    }

    #[test]
    fn test_preset_positions() {
        let a = Address::repeat_byte(0x01);
        let b = Address::repeat_byte(0x02);
        let report = report_for(vec![
            (a, "A", vec![], vec![]),
            (b, "B", vec!["r0", "r1"], vec!["w0"]),
        ]);
        let facets = [Facet::new(a, vec![]), Facet::new(b, vec![])];
        let graph = layout(&facets, &report, &mut StdRng::seed_from_u64(1));

        let id = checksummed(&b);
        assert_eq!(graph.node(&id).unwrap().position, Position { x: 0.0, y: 300.0 });
        assert_eq!(
            graph.node(&format!("{id}-read-1")).unwrap().position,
            Position { x: -600.0, y: 300.0 }
        );
        let write = graph.node(&format!("{id}-write-0")).unwrap();
        assert_eq!(write.position, Position { x: 300.0, y: 300.0 });
        assert_eq!(write.kind, NodeKind::WriteMethod);
        assert_eq!(write.label, "w0");
    }

    #[test]
    fn test_unreported_facet_is_labelled_by_address() {
        let address = Address::repeat_byte(0xab);
        let graph = layout(
            &[Facet::new(address, vec![])],
            &FacetReport::default(),
            &mut StdRng::seed_from_u64(3),
        );

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].label, address_prefix(&address, 6));
        assert_eq!(graph.nodes[0].label.len(), 6);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_random_color_format() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..32 {
            let color = random_color(&mut rng);
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
