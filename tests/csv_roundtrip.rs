//! CSV import and per-site export.
//!
//! Run with: `cargo test --features io --test csv_roundtrip`

use std::fs;

use cellsite_geometry::{
    analyze_node, export_report_by_site, read_cell_table, read_cell_table_from_path,
    write_neighbor_relations, IsdConfig, NeighborConfig, SiteGeometryError,
};
use tempfile::TempDir;

const CELLS: &str = "\
site_id,node_id,cell_name,latitude,longitude,azimuth,beamwidth,frequency_layer,cell_identity,enb_id
S1,ENB1,S1_1,45.0000,7.0000,0,65,L800,101,1
S1,ENB1,S1_2,45.0000,7.0000,120,65,L800,102,1
S2,ENB2,S2_1,45.0090,7.0000,0,65,L800,201,2
S3,ENB2,S3_1,45.0180,7.0000,10,,L800,301,2
S4,ENB3,S4_1,45.0270,7.0000,350,65,L800,401,3
S5,ENB3,S5_1,95.0000,7.0000,0,65,L800,501,3
";

#[test]
fn test_import_skips_invalid_rows() {
    let table = read_cell_table(CELLS.as_bytes()).unwrap();
    assert_eq!(table.len(), 5);
    assert!(table.get("S5_1").is_none());
    assert_eq!(table.get("S3_1").unwrap().beamwidth, None);
    assert_eq!(table.get("S1_1").unwrap().enb_id.as_deref(), Some("1"));
}

#[test]
fn test_import_skips_short_records() {
    let data = "\
site_id,node_id,cell_name,latitude,longitude,azimuth,frequency_layer
S1,ENB1,S1_1,45.0000,7.0000,0,L800
S2,ENB1,S2_1
S3,ENB2,S3_1,45.0180,7.0000,10,L800
";
    let table = read_cell_table(data.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.get("S1_1").is_some());
    assert!(table.get("S2_1").is_none());
    assert!(table.get("S3_1").is_some());
}

#[test]
fn test_import_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cells.csv");
    fs::write(&path, CELLS).unwrap();

    let table = read_cell_table_from_path(&path).unwrap();
    assert_eq!(table.node_ids(), vec!["ENB1", "ENB2", "ENB3"]);

    let missing = read_cell_table_from_path(dir.path().join("nope.csv"));
    assert!(matches!(missing, Err(SiteGeometryError::Io { .. })));
}

#[test]
fn test_relations_csv_layout() {
    let table = read_cell_table(CELLS.as_bytes()).unwrap();
    let report =
        analyze_node(&table, "ENB1", &IsdConfig::default(), &NeighborConfig::default()).unwrap();

    let mut buffer = Vec::new();
    write_neighbor_relations(&mut buffer, &report.relations).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();

    assert_eq!(
        lines.next().unwrap(),
        "source_site_id,source_node_id,source_cell_name,target_node_id,target_cell_name,\
         distance_km,bearing_from_source_deg,bearing_from_target_deg,remark"
    );
    // S1_1 -> S2_1 is 1 km due north, both facing north
    assert_eq!(
        lines.next().unwrap(),
        "S1,ENB1,S1_1,ENB2,S2_1,1.0,0.0,180.0,DirectionSource"
    );
}

#[test]
fn test_export_one_directory_per_site() {
    let table = read_cell_table(CELLS.as_bytes()).unwrap();
    let report =
        analyze_node(&table, "ENB2", &IsdConfig::default(), &NeighborConfig::default()).unwrap();
    assert_eq!(report.stats.cells_in_node, 2);

    let dir = TempDir::new().unwrap();
    let written = export_report_by_site(dir.path(), &report).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["S2", "S3"]);

    for site_dir in &written {
        let isd = fs::read_to_string(site_dir.join("isd.csv")).unwrap();
        assert!(isd.starts_with("site_id,node_id,cell_name,isd_km,enb_id,cell_identity"));
        assert!(site_dir.join("neighbors.csv").exists());
    }

    let s2_isd = fs::read_to_string(written[0].join("isd.csv")).unwrap();
    assert!(s2_isd.contains("S2,ENB2,S2_1,"));
    assert!(s2_isd.trim_end().ends_with(",2,201"));
}
