use crate::{
    orchestrator::FacetReport,
    primitives::{
        address_prefix,
        Address,
        Facet,
    },
    render::FACET_COLOR,
};

use serde::Serialize;
use std::f64::consts::{
    FRAC_PI_2,
    TAU,
};

/// Ring geometry, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RingStyle {
    pub radius: f64,
    /// Distance between consecutive rings along the z axis.
    pub spacing: f64,
}

impl Default for RingStyle {
    fn default() -> Self {
        Self {
            radius: 1.6,
            spacing: 1.6,
        }
    }
}

impl RingStyle {
    /// Smaller rings for narrow viewports.
    pub fn compact() -> Self {
        Self {
            radius: 0.78,
            spacing: 0.92,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingMethod {
    pub method: String,
    /// Relative to the ring's center.
    pub position: [f64; 3],
}

/// One facet drawn as a circle of its methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ring {
    pub facet_address: Address,
    pub label: String,
    pub z: f64,
    pub radius: f64,
    pub base_color: String,
    pub reads: Vec<RingMethod>,
    pub writes: Vec<RingMethod>,
}

impl Ring {
    pub fn method_count(&self) -> usize {
        self.reads.len() + self.writes.len()
    }
}

/// Places every facet on its own ring, receding along z in facet order.
///
/// Methods sit at equal angular steps starting at the top, reads first. A facet
/// with selectors but no classified methods gets `fn_0`, `fn_1`, .. read
/// placeholders so its ring is never empty.
pub fn layout(facets: &[Facet], report: &FacetReport, style: RingStyle) -> Vec<Ring> {
    facets
        .iter()
        .enumerate()
        .map(|(index, facet)| {
            let (mut reads, writes) = report
                .methods_of(&facet.address)
                .map(|methods| (methods.read_methods.clone(), methods.write_methods.clone()))
                .unwrap_or_default();
            if reads.is_empty() && writes.is_empty() {
                reads = (0..facet.selectors.len()).map(|k| format!("fn_{k}")).collect();
            }

            let step = TAU / (reads.len() + writes.len()).max(1) as f64;
            let place = |k: usize, method: String| {
                let angle = -FRAC_PI_2 + k as f64 * step;
                RingMethod {
                    method,
                    position: [angle.cos() * style.radius, angle.sin() * style.radius, 0.0],
                }
            };

            let offset = reads.len();
            let reads = reads.into_iter().enumerate().map(|(k, m)| place(k, m)).collect();
            let writes = writes
                .into_iter()
                .enumerate()
                .map(|(k, m)| place(offset + k, m))
                .collect();

            Ring {
                facet_address: facet.address,
                label: report
                    .name_of(&facet.address)
                    .map(str::to_string)
                    .unwrap_or_else(|| address_prefix(&facet.address, 10)),
                z: -(index as f64) * style.spacing,
                radius: style.radius,
                base_color: FACET_COLOR.to_string(),
                reads,
                writes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::MethodClassification,
        test_utils::selector_of,
    };

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_placeholder_methods_from_selectors() {
        let address = Address::repeat_byte(0x42);
        let facet = Facet::new(
            address,
            vec![selector_of("a()"), selector_of("b()"), selector_of("c()")],
        );
        let mut report = FacetReport::default();
        report
            .method_names_lookup
            .insert(address, MethodClassification::default());

        let rings = layout(&[facet], &report, RingStyle::default());
        let names: Vec<_> = rings[0].reads.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(names, ["fn_0", "fn_1", "fn_2"]);
        assert!(rings[0].writes.is_empty());
        assert_eq!(rings[0].label, address_prefix(&address, 10));
    }

    #[test]
    fn test_angles_start_at_top_and_partition() {
        let address = Address::repeat_byte(0x07);
        let mut report = FacetReport::default();
        report.facet_names_lookup.insert(address, "TokenFacet".into());
        report.method_names_lookup.insert(
            address,
            MethodClassification {
                read_methods: vec!["balanceOf".into(), "name".into()],
                write_methods: vec!["transfer".into(), "approve".into()],
            },
        );

        let facets = [Facet::new(Address::ZERO, vec![]), Facet::new(address, vec![])];
        let rings = layout(&facets, &report, RingStyle::default());
        let ring = &rings[1];

        assert_eq!(ring.label, "TokenFacet");
        assert_eq!(ring.z, -1.6);
        assert_eq!(ring.method_count(), 4);
        assert!(close(ring.reads[0].position, [0.0, -1.6, 0.0]));
        assert!(close(ring.reads[1].position, [1.6, 0.0, 0.0]));
        assert!(close(ring.writes[0].position, [0.0, 1.6, 0.0]));
        assert!(close(ring.writes[1].position, [-1.6, 0.0, 0.0]));

        // A facet with neither methods nor selectors renders an empty ring.
        assert_eq!(rings[0].method_count(), 0);
    }

    #[test]
    fn test_compact_style() {
        let facets = [
            Facet::new(Address::repeat_byte(1), vec![selector_of("a()")]),
            Facet::new(Address::repeat_byte(2), vec![selector_of("b()")]),
        ];
        let rings = layout(&facets, &FacetReport::default(), RingStyle::compact());

        assert_eq!(rings[1].z, -0.92);
        assert_eq!(rings[1].radius, 0.78);
        assert!(close(rings[1].reads[0].position, [0.0, -0.78, 0.0]));
    }
}
