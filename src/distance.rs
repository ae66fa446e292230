//! Inter-site distance (ISD).
//!
//! For each cell, the ISD is the mean great-circle distance to its nearest
//! beam-compatible neighbors (three by default). A neighbor is
//! beam-compatible when its azimuth is within a fixed coarse filter
//! (90° by default) of the source cell's azimuth. This filter is unrelated to
//! the per-cell beamwidth used by the neighbor classifier.
//!
//! Cells sharing the exact coordinates of the source are the same physical
//! point and never count as neighbors. A cell with too few neighbors gets no
//! result at all rather than an average over fewer points.

use log::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{OptionExt, Result};
use crate::geo_utils::{angular_difference, round2};
use crate::{CellTable, IsdConfig, IsdResult, NeighborRecord};

/// True when the minimal angle between two azimuths is at most `beamwidth`.
///
/// # Example
/// ```
/// use cellsite_geometry::is_within_beamwidth;
/// assert!(is_within_beamwidth(350.0, 20.0, 90.0));
/// assert!(!is_within_beamwidth(0.0, 180.0, 90.0));
/// ```
#[inline]
pub fn is_within_beamwidth(azimuth_a: f64, azimuth_b: f64, beamwidth: f64) -> bool {
    angular_difference(azimuth_a, azimuth_b) <= beamwidth
}

/// ISD calculator bound to a cell table.
#[derive(Debug, Clone)]
pub struct DistanceEngine<'a> {
    table: &'a CellTable,
    config: IsdConfig,
}

impl<'a> DistanceEngine<'a> {
    /// Create an engine, validating the configuration.
    pub fn new(table: &'a CellTable, config: IsdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { table, config })
    }

    pub fn config(&self) -> &IsdConfig {
        &self.config
    }

    /// Nearest beam-compatible neighbors of a cell, closest first.
    ///
    /// At most `neighbor_count` records are returned. Ties keep input order.
    pub fn find_nearest_neighbors(&self, cell_name: &str) -> Result<Vec<NeighborRecord>> {
        let idx = self.table.index_of(cell_name).ok_or_unknown_cell(cell_name)?;
        Ok(self.nearest_for_index(idx))
    }

    /// Mean distance to the nearest neighbors in kilometres, rounded to two
    /// decimals. `None` when fewer than `neighbor_count` neighbors qualify.
    pub fn calculate_isd(&self, cell_name: &str) -> Result<Option<f64>> {
        let idx = self.table.index_of(cell_name).ok_or_unknown_cell(cell_name)?;
        Ok(self.isd_for_index(idx))
    }

    /// ISD for every cell under a parent node, in input order.
    ///
    /// Cells without enough neighbors or without site/node identifiers are
    /// omitted from the output.
    pub fn calculate_all_isd(&self, node_id: &str) -> Vec<IsdResult> {
        let indices = self.table.node_indices(node_id);

        #[cfg(feature = "parallel")]
        let results: Vec<IsdResult> = indices
            .par_iter()
            .filter_map(|&idx| self.result_for_index(idx))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<IsdResult> = indices
            .iter()
            .filter_map(|&idx| self.result_for_index(idx))
            .collect();

        info!(
            "[Isd] Node {}: {} cells, {} results, {} omitted",
            node_id,
            indices.len(),
            results.len(),
            indices.len() - results.len()
        );

        results
    }

    fn result_for_index(&self, idx: usize) -> Option<IsdResult> {
        let cell = &self.table.cells()[idx];
        if !cell.is_identified() {
            debug!("[Isd] {} omitted: missing site or node id", cell.cell_name);
            return None;
        }

        let Some(isd_km) = self.isd_for_index(idx) else {
            debug!(
                "[Isd] {} omitted: fewer than {} neighbors",
                cell.cell_name, self.config.neighbor_count
            );
            return None;
        };

        Some(IsdResult {
            site_id: cell.site_id.clone(),
            node_id: cell.node_id.clone(),
            cell_name: cell.cell_name.clone(),
            isd_km,
            enb_id: cell.enb_id.clone(),
            cell_identity: cell.cell_identity.clone(),
        })
    }

    fn isd_for_index(&self, idx: usize) -> Option<f64> {
        let neighbors = self.nearest_for_index(idx);
        if neighbors.len() < self.config.neighbor_count {
            return None;
        }
        let total: f64 = neighbors.iter().map(|n| n.distance_km).sum();
        Some(round2(total / neighbors.len() as f64))
    }

    fn nearest_for_index(&self, idx: usize) -> Vec<NeighborRecord> {
        let cells = self.table.cells();
        let source = &cells[idx];

        let mut candidates: Vec<(f64, usize)> = cells
            .iter()
            .enumerate()
            .filter(|(other_idx, _)| *other_idx != idx)
            .filter(|(_, other)| {
                is_within_beamwidth(source.azimuth, other.azimuth, self.config.beam_filter_deg)
            })
            .map(|(other_idx, other)| (source.distance_km_to(other), other_idx))
            .filter(|(distance, _)| *distance > 0.0)
            .collect();

        // Stable sort: equal distances keep input order
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.truncate(self.config.neighbor_count);

        candidates
            .into_iter()
            .map(|(distance_km, other_idx)| NeighborRecord {
                distance_km,
                neighbor_cell_name: cells[other_idx].cell_name.clone(),
            })
            .collect()
    }
}
