//! Value-band partitioning of grid nodes for layered surface rendering.
//!
//! The map draws one extruded layer per band. Defaults are surface-pressure
//! bands in Pascal: low ≤ 98000 < mid ≤ 100000 < high.

use serde::Serialize;
use utoipa::ToSchema;

use crate::services::grid::GridNode;

pub const DEFAULT_LOW_MAX: f64 = 98_000.0;
pub const DEFAULT_MID_MAX: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValueBand {
    Low,
    Mid,
    High,
}

/// Inclusive upper bounds of the low and mid bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandThresholds {
    pub low_max: f64,
    pub mid_max: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            low_max: DEFAULT_LOW_MAX,
            mid_max: DEFAULT_MID_MAX,
        }
    }
}

impl BandThresholds {
    /// Band for `value`; `None` for NaN/±Inf.
    pub fn classify(&self, value: f64) -> Option<ValueBand> {
        if !value.is_finite() {
            None
        } else if value <= self.low_max {
            Some(ValueBand::Low)
        } else if value <= self.mid_max {
            Some(ValueBand::Mid)
        } else {
            Some(ValueBand::High)
        }
    }
}

/// Nodes falling in one band.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BandedNodes {
    pub band: ValueBand,
    pub nodes: Vec<GridNode>,
}

/// Split `nodes` into low, mid and high bands (always three entries, in that
/// order). Invalid nodes are dropped; order within a band follows `nodes`.
pub fn partition_into_bands(nodes: &[GridNode], thresholds: &BandThresholds) -> Vec<BandedNodes> {
    let mut bands: Vec<BandedNodes> = [ValueBand::Low, ValueBand::Mid, ValueBand::High]
        .into_iter()
        .map(|band| BandedNodes {
            band,
            nodes: Vec::new(),
        })
        .collect();

    for node in nodes {
        match thresholds.classify(node.value) {
            Some(band) => {
                if let Some(entry) = bands.iter_mut().find(|b| b.band == band) {
                    entry.nodes.push(node.clone());
                }
            }
            None => tracing::trace!(
                "Dropping invalid node ({}, {}) from bands",
                node.latitude,
                node.longitude
            ),
        }
    }

    bands
}
