//! Sector polygons for map layers.
//!
//! A sector is a wedge anchored at the cell location, opening symmetrically
//! around the azimuth by the antenna beamwidth (`azimuth ± beamwidth / 2`)
//! out to a fixed drawing radius. Polygons use `x = longitude`,
//! `y = latitude`, matching the `geo` crate convention.

use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteGeometryError};
use crate::geo_utils::destination_point;
use crate::{CellSite, CellTable};

/// Drawing parameters for sector polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConfig {
    /// Wedge radius in kilometres. Default: 0.5
    pub radius_km: f64,
    /// Beamwidth for cells without one, in degrees. Default: 60.0
    pub default_beamwidth_deg: f64,
    /// Number of segments along the arc. Default: 16
    pub arc_steps: usize,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            radius_km: 0.5,
            default_beamwidth_deg: 60.0,
            arc_steps: 16,
        }
    }
}

impl SectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(SiteGeometryError::ConfigError {
                message: format!("radius_km must be > 0, got {}", self.radius_km),
            });
        }
        if self.arc_steps == 0 {
            return Err(SiteGeometryError::ConfigError {
                message: "arc_steps must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// A cell's sector outline.
#[derive(Debug, Clone)]
pub struct SectorShape {
    pub cell_name: String,
    pub site_id: String,
    pub polygon: Polygon<f64>,
}

/// Wedge polygon for a single cell.
///
/// A beamwidth of 360° or more produces a circle around the cell instead of a
/// wedge.
pub fn sector_polygon(
    cell: &CellSite,
    radius_km: f64,
    beamwidth_deg: f64,
    arc_steps: usize,
) -> Polygon<f64> {
    let steps = arc_steps.max(1);
    let to_coord = |(lat, lon): (f64, f64)| Coord { x: lon, y: lat };

    if beamwidth_deg >= 360.0 {
        let ring: Vec<Coord<f64>> = (0..steps.max(3))
            .map(|i| {
                let bearing = 360.0 * i as f64 / steps.max(3) as f64;
                to_coord(destination_point(cell.latitude, cell.longitude, bearing, radius_km))
            })
            .collect();
        // Polygon::new closes the ring
        return Polygon::new(LineString::new(ring), vec![]);
    }

    let start = cell.azimuth - beamwidth_deg / 2.0;
    let center = Coord {
        x: cell.longitude,
        y: cell.latitude,
    };

    let mut ring = Vec::with_capacity(steps + 2);
    ring.push(center);
    for i in 0..=steps {
        let bearing = start + beamwidth_deg * i as f64 / steps as f64;
        ring.push(to_coord(destination_point(
            cell.latitude,
            cell.longitude,
            bearing,
            radius_km,
        )));
    }

    Polygon::new(LineString::new(ring), vec![])
}

/// Sector outlines for every cell of the table, in input order.
pub fn sector_polygons(table: &CellTable, config: &SectorConfig) -> Result<Vec<SectorShape>> {
    config.validate()?;
    Ok(table
        .iter()
        .map(|cell| SectorShape {
            cell_name: cell.cell_name.clone(),
            site_id: cell.site_id.clone(),
            polygon: sector_polygon(
                cell,
                config.radius_km,
                cell.beamwidth.unwrap_or(config.default_beamwidth_deg),
                config.arc_steps,
            ),
        })
        .collect())
}
