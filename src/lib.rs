//! # Cell-Site Geometry
//!
//! Geometric site-relationship engine for radio access networks.
//!
//! This library provides:
//! - Great-circle distance and bearing utilities
//! - Inter-site distance (ISD): mean distance from each cell to its three
//!   nearest beam-compatible neighbors
//! - Neighbor-sector discovery and directional classification within a
//!   frequency layer
//! - Sector polygons for map layers
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel per-cell search with rayon
//! - **`io`** - Enable CSV import of cell tables and export of results
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use cellsite_geometry::{CellSite, CellTable, DistanceEngine, IsdConfig};
//!
//! let cells = vec![
//!     CellSite::new("S1", "N1", "S1A", 51.5000, -0.1200, 0.0, "L1800"),
//!     CellSite::new("S2", "N1", "S2A", 51.5090, -0.1200, 10.0, "L1800"),
//!     CellSite::new("S3", "N2", "S3A", 51.5180, -0.1200, 20.0, "L1800"),
//!     CellSite::new("S4", "N2", "S4A", 51.5270, -0.1200, 30.0, "L1800"),
//! ];
//! let table = CellTable::from_records(cells).unwrap();
//!
//! let engine = DistanceEngine::new(&table, IsdConfig::default()).unwrap();
//! let isd = engine.calculate_all_isd("N1");
//! assert_eq!(isd.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SiteGeometryError};

// Geographic utilities (distance, bearing, angle arithmetic)
pub mod geo_utils;
pub use geo_utils::{calculate_bearing, haversine_distance};

// Column-checked cell table
pub mod table;
pub use table::{CellTable, OPTIONAL_COLUMNS, REQUIRED_COLUMNS};

// R-tree index over cell locations
pub mod spatial;

// Inter-site distance
pub mod distance;
pub use distance::{is_within_beamwidth, DistanceEngine};

// Neighbor-sector discovery and classification
pub mod neighbors;
pub use neighbors::{calculate_remark, NeighborClassifier};

// Sector polygons for map layers
pub mod sector;
pub use sector::{sector_polygon, sector_polygons, SectorConfig, SectorShape};

// Per-node reports combining ISD and neighbor relations
pub mod report;
pub use report::{analyze_node, analyze_nodes, NodeReport, ReportStats};

// CSV import/export
#[cfg(feature = "io")]
pub mod io;
#[cfg(feature = "io")]
pub use io::{
    export_report_by_site, read_cell_table, read_cell_table_from_path, write_isd_results,
    write_neighbor_relations,
};

// ============================================================================
// Core Types
// ============================================================================

/// A single cell (sector) of a radio site.
///
/// # Example
/// ```
/// use cellsite_geometry::CellSite;
/// let cell = CellSite::new("SITE01", "ENB100", "SITE01_1", 48.85, 2.35, 120.0, "L800")
///     .with_beamwidth(65.0);
/// assert_eq!(cell.beamwidth, Some(65.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSite {
    /// Physical site, may host several cells
    pub site_id: String,
    /// Parent network element (eNodeB / gNodeB / BSC)
    pub node_id: String,
    /// Unique cell key
    pub cell_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Antenna pointing direction in degrees, [0, 360)
    pub azimuth: f64,
    /// Half-power beamwidth in degrees; `None` falls back to the classifier default
    pub beamwidth: Option<f64>,
    /// Tag restricting neighbor search to radio-compatible cells
    pub frequency_layer: String,
    /// Pass-through identifier, not used in computation
    pub cell_identity: Option<String>,
    /// Pass-through identifier, not used in computation
    pub enb_id: Option<String>,
}

impl CellSite {
    /// Create a cell with the required attributes.
    pub fn new(
        site_id: &str,
        node_id: &str,
        cell_name: &str,
        latitude: f64,
        longitude: f64,
        azimuth: f64,
        frequency_layer: &str,
    ) -> Self {
        Self {
            site_id: site_id.to_string(),
            node_id: node_id.to_string(),
            cell_name: cell_name.to_string(),
            latitude,
            longitude,
            azimuth,
            beamwidth: None,
            frequency_layer: frequency_layer.to_string(),
            cell_identity: None,
            enb_id: None,
        }
    }

    pub fn with_beamwidth(mut self, beamwidth: f64) -> Self {
        self.beamwidth = Some(beamwidth);
        self
    }

    pub fn with_identity(mut self, cell_identity: &str, enb_id: &str) -> Self {
        self.cell_identity = Some(cell_identity.to_string());
        self.enb_id = Some(enb_id.to_string());
        self
    }

    /// Check if the cell has valid coordinates.
    pub fn has_valid_coordinates(&self) -> bool {
        geo_utils::is_valid_coordinate(self.latitude, self.longitude)
    }

    /// Site and node identifiers are present, so a result row can be emitted.
    pub fn is_identified(&self) -> bool {
        !self.site_id.trim().is_empty() && !self.node_id.trim().is_empty()
    }

    /// Great-circle distance to another cell in kilometres, unrounded.
    pub fn distance_km_to(&self, other: &CellSite) -> f64 {
        geo_utils::great_circle_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Initial bearing from this cell to another, in [0, 360).
    pub fn bearing_to(&self, other: &CellSite) -> f64 {
        geo_utils::calculate_bearing(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// A neighbor found by the ISD search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    /// Unrounded great-circle distance in kilometres
    pub distance_km: f64,
    pub neighbor_cell_name: String,
}

/// Inter-site distance for a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsdResult {
    pub site_id: String,
    pub node_id: String,
    pub cell_name: String,
    /// Mean distance to the nearest neighbors, rounded to 2 decimals
    pub isd_km: f64,
    pub enb_id: Option<String>,
    pub cell_identity: Option<String>,
}

/// Directional relationship between a source and target cell.
///
/// The labels are kept exactly as downstream planning tools expect them:
/// both windows hit is `DirectionSource`, only the source window is
/// `HeadToHead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Remark {
    DirectionSource,
    HeadToHead,
    DirectionTarget,
    Indirection,
}

impl Remark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Remark::DirectionSource => "DirectionSource",
            Remark::HeadToHead => "HeadToHead",
            Remark::DirectionTarget => "DirectionTarget",
            Remark::Indirection => "Indirection",
        }
    }
}

impl std::fmt::Display for Remark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified relation between two nearby cells of the same layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborRelation {
    pub source_site_id: String,
    pub source_node_id: String,
    pub source_cell_name: String,
    pub target_node_id: String,
    pub target_cell_name: String,
    /// Rounded to 2 decimals
    pub distance_km: f64,
    pub bearing_from_source_deg: f64,
    pub bearing_from_target_deg: f64,
    pub remark: Remark,
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the inter-site distance search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsdConfig {
    /// Maximum azimuth difference for a neighbor to count, in degrees.
    /// This is a coarse co-location filter, not the cell's own beamwidth.
    /// Default: 90.0
    pub beam_filter_deg: f64,

    /// Number of nearest neighbors averaged into the ISD.
    /// Cells with fewer qualifying neighbors get no result. Default: 3
    pub neighbor_count: usize,
}

impl Default for IsdConfig {
    fn default() -> Self {
        Self {
            beam_filter_deg: 90.0,
            neighbor_count: 3,
        }
    }
}

impl IsdConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.beam_filter_deg.is_finite() || self.beam_filter_deg < 0.0 {
            return Err(SiteGeometryError::ConfigError {
                message: format!("beam_filter_deg must be >= 0, got {}", self.beam_filter_deg),
            });
        }
        if self.neighbor_count == 0 {
            return Err(SiteGeometryError::ConfigError {
                message: "neighbor_count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for neighbor-sector discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborConfig {
    /// Exclusive lower distance bound in kilometres. Default: 0.0
    pub min_distance_km: f64,

    /// Inclusive upper distance bound in kilometres. Default: 5.0
    pub max_distance_km: f64,

    /// Beamwidth used for cells without one, in degrees. Default: 60.0
    pub default_beamwidth_deg: f64,

    /// Compute the target-side bearing exactly instead of source bearing + 180.
    /// The approximation only holds over short ranges. Default: false
    pub exact_reverse_bearing: bool,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            min_distance_km: 0.0,
            max_distance_km: 5.0,
            default_beamwidth_deg: 60.0,
            exact_reverse_bearing: false,
        }
    }
}

impl NeighborConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_distance_km.is_finite() || self.min_distance_km < 0.0 {
            return Err(SiteGeometryError::ConfigError {
                message: format!("min_distance_km must be >= 0, got {}", self.min_distance_km),
            });
        }
        if !self.max_distance_km.is_finite() || self.max_distance_km <= self.min_distance_km {
            return Err(SiteGeometryError::ConfigError {
                message: format!(
                    "max_distance_km ({}) must be greater than min_distance_km ({})",
                    self.max_distance_km, self.min_distance_km
                ),
            });
        }
        if !self.default_beamwidth_deg.is_finite() || self.default_beamwidth_deg < 0.0 {
            return Err(SiteGeometryError::ConfigError {
                message: format!(
                    "default_beamwidth_deg must be >= 0, got {}",
                    self.default_beamwidth_deg
                ),
            });
        }
        Ok(())
    }

    /// Beamwidth of a cell, falling back to the configured default.
    pub fn beamwidth_of(&self, cell: &CellSite) -> f64 {
        cell.beamwidth.unwrap_or(self.default_beamwidth_deg)
    }
}

// ============================================================================
// Tests
// ============================================================================
