//! Column-checked, in-memory table of cell sites.
//!
//! The table is the single input of every computation in this crate. It is
//! built either from typed records or from a generic string table (headers
//! plus rows) as produced by a file or database loader.
//!
//! Row policy: a missing required column or a duplicated cell name is fatal.
//! A row with unparsable numbers or coordinates outside WGS84 ranges is
//! skipped with a warning, and the rest of the batch continues.

use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::error::{Result, SiteGeometryError};
use crate::geo_utils::normalize_degrees;
use crate::CellSite;

/// Columns that must be present in a string table.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "site_id",
    "node_id",
    "cell_name",
    "latitude",
    "longitude",
    "azimuth",
    "frequency_layer",
];

/// Columns read when present.
pub const OPTIONAL_COLUMNS: [&str; 3] = ["beamwidth", "cell_identity", "enb_id"];

/// Immutable table of cells, in input order.
#[derive(Debug, Clone, Default)]
pub struct CellTable {
    cells: Vec<CellSite>,
    by_name: HashMap<String, usize>,
}

impl CellTable {
    /// Build a table from typed records.
    ///
    /// Azimuths are normalized into [0, 360). Rows with invalid coordinates,
    /// non-finite azimuths, negative beamwidths or empty cell names are
    /// skipped with a warning.
    pub fn from_records(records: Vec<CellSite>) -> Result<Self> {
        let total = records.len();
        let mut table = CellTable {
            cells: Vec::with_capacity(total),
            by_name: HashMap::with_capacity(total),
        };

        for record in records {
            match validate_record(record) {
                Ok(cell) => table.push(cell)?,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => warn!("[Table] Skipping row: {}", err),
            }
        }

        info!("[Table] Loaded {} of {} cells", table.len(), total);
        Ok(table)
    }

    /// Build a table from a generic string table.
    ///
    /// Column names are matched case-insensitively after trimming. Every
    /// column in [`REQUIRED_COLUMNS`] must be present, otherwise the whole
    /// call fails with [`SiteGeometryError::MissingColumn`].
    pub fn from_columns<H, R, F>(headers: &[H], rows: R) -> Result<Self>
    where
        H: AsRef<str>,
        R: IntoIterator<Item = Vec<F>>,
        F: AsRef<str>,
    {
        let columns = ColumnMap::resolve(headers)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line, row) in rows.into_iter().enumerate() {
            match columns.parse_row(&row) {
                Ok(cell) => records.push(cell),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    skipped += 1;
                    warn!("[Table] Skipping row {}: {}", line + 1, err);
                }
            }
        }

        if skipped > 0 {
            info!("[Table] Skipped {} unparsable rows", skipped);
        }
        Self::from_records(records)
    }

    fn push(&mut self, cell: CellSite) -> Result<()> {
        if self.by_name.contains_key(&cell.cell_name) {
            return Err(SiteGeometryError::DuplicateCell {
                cell_name: cell.cell_name,
            });
        }
        self.by_name.insert(cell.cell_name.clone(), self.cells.len());
        self.cells.push(cell);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[CellSite] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellSite> {
        self.cells.iter()
    }

    /// Look up a cell by name.
    pub fn get(&self, cell_name: &str) -> Option<&CellSite> {
        self.index_of(cell_name).map(|idx| &self.cells[idx])
    }

    /// Position of a cell in input order.
    pub fn index_of(&self, cell_name: &str) -> Option<usize> {
        self.by_name.get(cell_name).copied()
    }

    /// Input positions of all cells under a parent node, in input order.
    pub fn node_indices(&self, node_id: &str) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.node_id == node_id)
            .map(|(i, _)| i)
            .collect()
    }

    /// Cells under a parent node, in input order.
    pub fn cells_in_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a CellSite> {
        self.cells.iter().filter(move |c| c.node_id == node_id)
    }

    /// Distinct node ids in first-seen order.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.cells
            .iter()
            .map(|c| c.node_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

fn validate_record(mut cell: CellSite) -> Result<CellSite> {
    if cell.cell_name.trim().is_empty() {
        return Err(SiteGeometryError::InvalidField {
            cell_name: String::new(),
            column: "cell_name".to_string(),
            value: cell.cell_name,
        });
    }
    if !cell.has_valid_coordinates() {
        return Err(SiteGeometryError::InvalidCoordinates {
            cell_name: cell.cell_name,
            latitude: cell.latitude,
            longitude: cell.longitude,
        });
    }
    if !cell.azimuth.is_finite() {
        return Err(SiteGeometryError::InvalidField {
            value: cell.azimuth.to_string(),
            cell_name: cell.cell_name,
            column: "azimuth".to_string(),
        });
    }
    if let Some(bw) = cell.beamwidth {
        if !bw.is_finite() || bw < 0.0 {
            return Err(SiteGeometryError::InvalidField {
                value: bw.to_string(),
                cell_name: cell.cell_name,
                column: "beamwidth".to_string(),
            });
        }
    }
    cell.azimuth = normalize_degrees(cell.azimuth);
    Ok(cell)
}

/// Resolved column positions of a string table.
struct ColumnMap {
    site_id: usize,
    node_id: usize,
    cell_name: usize,
    latitude: usize,
    longitude: usize,
    azimuth: usize,
    frequency_layer: usize,
    beamwidth: Option<usize>,
    cell_identity: Option<usize>,
    enb_id: Option<usize>,
}

impl ColumnMap {
    fn resolve<H: AsRef<str>>(headers: &[H]) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_ascii_lowercase())
            .collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| SiteGeometryError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            site_id: require("site_id")?,
            node_id: require("node_id")?,
            cell_name: require("cell_name")?,
            latitude: require("latitude")?,
            longitude: require("longitude")?,
            azimuth: require("azimuth")?,
            frequency_layer: require("frequency_layer")?,
            beamwidth: find("beamwidth"),
            cell_identity: find("cell_identity"),
            enb_id: find("enb_id"),
        })
    }

    fn parse_row<F: AsRef<str>>(&self, row: &[F]) -> Result<CellSite> {
        let text = |idx: usize| row.get(idx).map(|v| v.as_ref().trim()).unwrap_or("");
        let optional = |idx: Option<usize>| {
            idx.map(text)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let cell_name = text(self.cell_name).to_string();
        let number = |idx: usize, column: &str| -> Result<f64> {
            let raw = text(idx);
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| SiteGeometryError::InvalidField {
                    cell_name: cell_name.clone(),
                    column: column.to_string(),
                    value: raw.to_string(),
                })
        };

        let latitude = number(self.latitude, "latitude")?;
        let longitude = number(self.longitude, "longitude")?;
        let azimuth = number(self.azimuth, "azimuth")?;
        let beamwidth = match self.beamwidth {
            Some(idx) if !text(idx).is_empty() => Some(number(idx, "beamwidth")?),
            _ => None,
        };

        Ok(CellSite {
            site_id: text(self.site_id).to_string(),
            node_id: text(self.node_id).to_string(),
            cell_name: cell_name.clone(),
            latitude,
            longitude,
            azimuth,
            beamwidth,
            frequency_layer: text(self.frequency_layer).to_string(),
            cell_identity: optional(self.cell_identity),
            enb_id: optional(self.enb_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<&'static str> {
        vec![
            "Site_ID",
            "node_id",
            "cell_name",
            "latitude",
            "longitude",
            "azimuth",
            "beamwidth",
            "frequency_layer",
        ]
    }

    fn row(cell: &str, lat: &str, az: &str, bw: &str) -> Vec<String> {
        vec!["S1", "N1", cell, lat, "2.35", az, bw, "L800"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_from_columns_parses_rows() {
        let rows = vec![
            row("C1", "48.85", "-90", "65"),
            row("C2", "48.86", "370", ""),
        ];
        let table = CellTable::from_columns(&headers(), rows).unwrap();

        assert_eq!(table.len(), 2);
        let c1 = table.get("C1").unwrap();
        assert_eq!(c1.azimuth, 270.0);
        assert_eq!(c1.beamwidth, Some(65.0));
        let c2 = table.get("C2").unwrap();
        assert_eq!(c2.azimuth, 10.0);
        assert_eq!(c2.beamwidth, None);
        assert_eq!(c2.enb_id, None);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let mut cols = headers();
        cols.retain(|c| *c != "azimuth");
        let result = CellTable::from_columns(&cols, Vec::<Vec<String>>::new());
        assert_eq!(
            result.unwrap_err(),
            SiteGeometryError::MissingColumn {
                column: "azimuth".to_string()
            }
        );
    }

    #[test]
    fn test_every_required_column_is_checked() {
        for required in REQUIRED_COLUMNS {
            let cols: Vec<&str> = REQUIRED_COLUMNS
                .iter()
                .copied()
                .filter(|c| *c != required)
                .collect();
            let err = CellTable::from_columns(&cols, Vec::<Vec<String>>::new()).unwrap_err();
            assert_eq!(
                err,
                SiteGeometryError::MissingColumn {
                    column: required.to_string()
                }
            );
        }

        let mut all: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        all.extend(OPTIONAL_COLUMNS);
        assert!(CellTable::from_columns(&all, Vec::<Vec<String>>::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let table = CellTable::from_columns(
            &headers(),
            vec![
                row("C1", "48.85", "0", ""),
                row("C2", "not-a-number", "0", ""),
                row("C3", "95.0", "0", ""),
                row("C4", "48.85", "0", "-5"),
                row("", "48.85", "0", ""),
            ],
        )
        .unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.get("C1").is_some());
    }

    #[test]
    fn test_row_errors_are_skippable() {
        let columns = ColumnMap::resolve(&headers()).unwrap();
        let err = columns
            .parse_row(&row("C2", "not-a-number", "0", ""))
            .unwrap_err();
        assert!(!err.is_fatal());

        let err = validate_record(CellSite::new("S1", "N1", "C3", 95.0, 0.0, 0.0, "L")).unwrap_err();
        assert!(!err.is_fatal());
        let table =
            CellTable::from_records(vec![CellSite::new("S1", "N1", "C3", 95.0, 0.0, 0.0, "L")])
                .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_cell_is_fatal() {
        let result = CellTable::from_columns(
            &headers(),
            vec![row("C1", "48.85", "0", ""), row("C1", "48.86", "0", "")],
        );
        assert!(matches!(
            result,
            Err(SiteGeometryError::DuplicateCell { .. })
        ));
    }

    #[test]
    fn test_node_queries() {
        let cells = vec![
            CellSite::new("S1", "N2", "A", 0.0, 0.0, 0.0, "L"),
            CellSite::new("S1", "N1", "B", 0.0, 0.0, 0.0, "L"),
            CellSite::new("S2", "N2", "C", 0.0, 0.0, 0.0, "L"),
        ];
        let table = CellTable::from_records(cells).unwrap();

        assert_eq!(table.node_ids(), vec!["N2", "N1"]);
        assert_eq!(table.node_indices("N2"), vec![0, 2]);
        let names: Vec<&str> = table.cells_in_node("N2").map(|c| c.cell_name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(table.index_of("B"), Some(1));
        assert!(table.get("Z").is_none());
    }
}
