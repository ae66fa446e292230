//! Neighbor-sector discovery and directional classification.
//!
//! For every cell of a parent node, nearby cells of the same frequency layer
//! (from any node) are found within a distance window, and each pair is
//! classified by whether the source-to-target bearing falls inside the
//! source's and/or the target's coverage window `[azimuth - bw, azimuth + bw]`.
//!
//! A physical pair is reported once, from the side that is reached first in
//! input order.

use std::collections::{HashMap, HashSet};

use log::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::geo_utils::{calculate_bearing, normalize_degrees, round2};
use crate::spatial::{build_layer_indexes, LayerIndex};
use crate::{CellTable, NeighborConfig, NeighborRelation, Remark};

/// True when `bearing` lies inside `[azimuth - beamwidth, azimuth + beamwidth]`
/// on the compass, wraparound included.
pub fn in_coverage_window(bearing: f64, azimuth: f64, beamwidth: f64) -> bool {
    // A window of a full turn or more covers every direction
    if 2.0 * beamwidth >= 360.0 {
        return true;
    }

    let start = normalize_degrees(azimuth - beamwidth);
    let mut end = normalize_degrees(azimuth + beamwidth);
    if end < start {
        end += 360.0;
    }

    let mut bearing = normalize_degrees(bearing);
    if bearing < start {
        bearing += 360.0;
    }

    start <= bearing && bearing <= end
}

/// Classify a source-to-target bearing against both coverage windows.
///
/// | source window | target window | remark            |
/// |---------------|---------------|-------------------|
/// | yes           | yes           | `DirectionSource` |
/// | yes           | no            | `HeadToHead`      |
/// | no            | yes           | `DirectionTarget` |
/// | no            | no            | `Indirection`     |
pub fn calculate_remark(
    bearing: f64,
    source_azimuth: f64,
    source_beamwidth: f64,
    target_azimuth: f64,
    target_beamwidth: f64,
) -> Remark {
    let in_direction_source = in_coverage_window(bearing, source_azimuth, source_beamwidth);
    let in_direction_target = in_coverage_window(bearing, target_azimuth, target_beamwidth);

    match (in_direction_source, in_direction_target) {
        (true, true) => Remark::DirectionSource,
        (true, false) => Remark::HeadToHead,
        (false, true) => Remark::DirectionTarget,
        (false, false) => Remark::Indirection,
    }
}

/// A candidate pair before deduplication: (source idx, target idx, distance km).
type Candidate = (usize, usize, f64);

/// Neighbor-sector finder bound to a cell table.
///
/// Construction builds one spatial index per frequency layer; the classifier
/// can then be queried for any number of nodes.
#[derive(Debug)]
pub struct NeighborClassifier<'a> {
    table: &'a CellTable,
    config: NeighborConfig,
    layers: HashMap<String, LayerIndex>,
}

impl<'a> NeighborClassifier<'a> {
    /// Create a classifier, validating the configuration.
    pub fn new(table: &'a CellTable, config: NeighborConfig) -> Result<Self> {
        config.validate()?;
        let layers = build_layer_indexes(table);
        info!(
            "[Neighbors] Indexed {} cells across {} frequency layers",
            table.len(),
            layers.len()
        );
        Ok(Self {
            table,
            config,
            layers,
        })
    }

    pub fn config(&self) -> &NeighborConfig {
        &self.config
    }

    /// Classified relations for every cell under `node_id`.
    ///
    /// Targets may belong to any node. Pairs are kept when
    /// `min_distance_km < distance <= max_distance_km` and emitted once per
    /// unordered pair, in source input order then target input order.
    pub fn find_neighbor_sectors(&self, node_id: &str) -> Vec<NeighborRelation> {
        let sources = self.table.node_indices(node_id);

        #[cfg(feature = "parallel")]
        let per_source: Vec<Vec<Candidate>> = sources
            .par_iter()
            .map(|&idx| self.candidates_for(idx))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let per_source: Vec<Vec<Candidate>> = sources
            .iter()
            .map(|&idx| self.candidates_for(idx))
            .collect();

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let relations: Vec<NeighborRelation> = per_source
            .into_iter()
            .flatten()
            .filter(|&(a, b, _)| seen.insert((a.min(b), a.max(b))))
            .map(|(a, b, distance_km)| self.relation(a, b, distance_km))
            .collect();

        info!(
            "[Neighbors] Node {}: {} source cells, {} relations",
            node_id,
            sources.len(),
            relations.len()
        );

        relations
    }

    fn candidates_for(&self, idx: usize) -> Vec<Candidate> {
        let cells = self.table.cells();
        let source = &cells[idx];

        let layer = source.frequency_layer.trim();
        let Some(index) = self.layers.get(layer) else {
            if layer.is_empty() {
                warn!(
                    "[Neighbors] {} has no frequency layer, skipping",
                    source.cell_name
                );
            }
            return Vec::new();
        };

        index
            .candidates_within(source.latitude, source.longitude, self.config.max_distance_km)
            .into_iter()
            .filter(|&other| other != idx)
            .filter_map(|other| {
                let distance = source.distance_km_to(&cells[other]);
                let in_range =
                    distance > self.config.min_distance_km && distance <= self.config.max_distance_km;
                in_range.then_some((idx, other, distance))
            })
            .collect()
    }

    fn relation(&self, source_idx: usize, target_idx: usize, distance_km: f64) -> NeighborRelation {
        let cells = self.table.cells();
        let source = &cells[source_idx];
        let target = &cells[target_idx];

        let bearing = source.bearing_to(target);
        let reverse = if self.config.exact_reverse_bearing {
            target.bearing_to(source)
        } else {
            normalize_degrees(bearing + 180.0)
        };

        let remark = calculate_remark(
            bearing,
            source.azimuth,
            self.config.beamwidth_of(source),
            target.azimuth,
            self.config.beamwidth_of(target),
        );

        NeighborRelation {
            source_site_id: source.site_id.clone(),
            source_node_id: source.node_id.clone(),
            source_cell_name: source.cell_name.clone(),
            target_node_id: target.node_id.clone(),
            target_cell_name: target.cell_name.clone(),
            distance_km: round2(distance_km),
            bearing_from_source_deg: round_bearing(bearing),
            bearing_from_target_deg: round_bearing(reverse),
            remark,
        }
    }
}

fn round_bearing(bearing: f64) -> f64 {
    normalize_degrees(round2(bearing))
}
