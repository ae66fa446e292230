//! CSV import of cell tables and export of result tables.
//!
//! Import goes through [`CellTable::from_columns`], so column checks and the
//! row-skip policy are the same as for any other loader. Records with a
//! different field count than the header are read as-is: missing required
//! fields get the row skipped, extra fields are ignored.
//!
//! Export serializes each result row; the header comes from the field names
//! and optional identifiers are written as empty fields. An empty slice
//! produces an empty file.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, Writer};
use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::{CellTable, IsdResult, NeighborRelation, NodeReport};

/// Read a cell table from CSV with a header row.
pub fn read_cell_table<R: Read>(reader: R) -> Result<CellTable> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    CellTable::from_columns(&headers, rows)
}

/// Read a cell table from a CSV file.
pub fn read_cell_table_from_path<P: AsRef<Path>>(path: P) -> Result<CellTable> {
    let file = fs::File::open(path.as_ref())?;
    info!("[Io] Reading cells from {}", path.as_ref().display());
    read_cell_table(file)
}

/// Write ISD rows as CSV, with a header taken from the field names.
pub fn write_isd_results<W: Write>(writer: W, rows: &[IsdResult]) -> Result<()> {
    write_rows(writer, rows)
}

/// Write neighbor relations as CSV, with a header taken from the field names.
pub fn write_neighbor_relations<W: Write>(writer: W, rows: &[NeighborRelation]) -> Result<()> {
    write_rows(writer, rows)
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a report as one directory per source site under `dir`, each holding
/// `isd.csv` and `neighbors.csv`. Returns the site directories in site order.
pub fn export_report_by_site(dir: &Path, report: &NodeReport) -> Result<Vec<PathBuf>> {
    let mut by_site: BTreeMap<&str, (Vec<IsdResult>, Vec<NeighborRelation>)> = BTreeMap::new();
    for row in &report.isd {
        by_site.entry(&row.site_id).or_default().0.push(row.clone());
    }
    for row in &report.relations {
        by_site
            .entry(&row.source_site_id)
            .or_default()
            .1
            .push(row.clone());
    }

    let mut written = Vec::with_capacity(by_site.len());
    for (site_id, (isd, relations)) in by_site {
        let site_dir = dir.join(site_dir_name(site_id));
        fs::create_dir_all(&site_dir)?;
        write_isd_results(fs::File::create(site_dir.join("isd.csv"))?, &isd)?;
        write_neighbor_relations(fs::File::create(site_dir.join("neighbors.csv"))?, &relations)?;
        written.push(site_dir);
    }

    info!(
        "[Io] Exported node {} into {} site directories",
        report.node_id,
        written.len()
    );
    Ok(written)
}

fn site_dir_name(site_id: &str) -> String {
    let cleaned: String = site_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_unknown".to_string()
    } else {
        cleaned
    }
}
