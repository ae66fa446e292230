//! R-tree indexed cell locations and radius pre-filtering.
//!
//! Candidates returned here are a superset of the cells within range; callers
//! still apply the exact great-circle test. Results are always returned in
//! input order so downstream tie-breaks stay deterministic.

use std::collections::HashMap;

use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::km_to_degrees;
use crate::CellTable;

/// Search boxes are widened so points near the box corners on the sphere are
/// never missed.
const ENVELOPE_PADDING: f64 = 1.1;

/// A cell location with its table position for R-tree queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedCell {
    pub idx: usize,
    pub lat: f64,
    pub lng: f64,
}

impl RTreeObject for IndexedCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

/// Spatial index over the cells of one frequency layer.
#[derive(Debug)]
pub struct LayerIndex {
    members: Vec<usize>,
    tree: RTree<IndexedCell>,
}

impl LayerIndex {
    fn build(table: &CellTable, members: Vec<usize>) -> Self {
        let cells = table.cells();
        let indexed: Vec<IndexedCell> = members
            .iter()
            .map(|&idx| IndexedCell {
                idx,
                lat: cells[idx].latitude,
                lng: cells[idx].longitude,
            })
            .collect();
        Self {
            members,
            tree: RTree::bulk_load(indexed),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Table positions of cells that may lie within `radius_km` of a point,
    /// sorted ascending.
    ///
    /// Falls back to the full member list when the search box would cross
    /// the antimeridian or a pole. Near a pole the box widens to every
    /// longitude, which takes the same fallback.
    pub fn candidates_within(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<usize> {
        let (dlat, dlng) = km_to_degrees(radius_km * ENVELOPE_PADDING, lat);
        let crosses_edge =
            lat - dlat < -90.0 || lat + dlat > 90.0 || lng - dlng < -180.0 || lng + dlng > 180.0;
        if crosses_edge {
            return self.members.clone();
        }

        let envelope = AABB::from_corners([lat - dlat, lng - dlng], [lat + dlat, lng + dlng]);
        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|c| c.idx)
            .collect();
        found.sort_unstable();
        found
    }
}

/// Build one spatial index per frequency layer.
///
/// Cells with an empty layer tag are not indexed and never take part in
/// neighbor discovery.
pub fn build_layer_indexes(table: &CellTable) -> HashMap<String, LayerIndex> {
    let mut members: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, cell) in table.iter().enumerate() {
        let layer = cell.frequency_layer.trim();
        if layer.is_empty() {
            continue;
        }
        members.entry(layer.to_string()).or_default().push(idx);
    }

    members
        .into_iter()
        .map(|(layer, idxs)| {
            let index = LayerIndex::build(table, idxs);
            (layer, index)
        })
        .collect()
}
