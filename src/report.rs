//! Per-node reports combining inter-site distance and neighbor relations.
//!
//! A report is recomputed from the table on every call. Omitted cells are
//! only visible as the difference between `cells_in_node` and `isd_rows`.

use log::info;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, SiteGeometryError};
use crate::{
    CellTable, DistanceEngine, IsdConfig, IsdResult, NeighborClassifier, NeighborConfig,
    NeighborRelation,
};

/// Row counts for auditing a report against its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportStats {
    pub cells_in_node: u32,
    pub isd_rows: u32,
    pub omitted_cells: u32,
    pub relation_rows: u32,
}

/// ISD and neighbor relations for one parent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    pub node_id: String,
    pub isd: Vec<IsdResult>,
    pub relations: Vec<NeighborRelation>,
    pub stats: ReportStats,
}

impl NodeReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SiteGeometryError::Internal {
            message: format!("report serialization failed: {}", e),
        })
    }
}

/// Compute the report for a single node.
pub fn analyze_node(
    table: &CellTable,
    node_id: &str,
    isd_config: &IsdConfig,
    neighbor_config: &NeighborConfig,
) -> Result<NodeReport> {
    let distance = DistanceEngine::new(table, isd_config.clone())?;
    let classifier = NeighborClassifier::new(table, neighbor_config.clone())?;
    Ok(build_report(table, &distance, &classifier, node_id))
}

/// Compute reports for several nodes, in the requested order.
///
/// The spatial indexes are built once and shared by all nodes.
pub fn analyze_nodes(
    table: &CellTable,
    node_ids: &[&str],
    isd_config: &IsdConfig,
    neighbor_config: &NeighborConfig,
) -> Result<Vec<NodeReport>> {
    let start = std::time::Instant::now();
    let distance = DistanceEngine::new(table, isd_config.clone())?;
    let classifier = NeighborClassifier::new(table, neighbor_config.clone())?;

    #[cfg(feature = "parallel")]
    let reports: Vec<NodeReport> = node_ids
        .par_iter()
        .map(|node_id| build_report(table, &distance, &classifier, node_id))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let reports: Vec<NodeReport> = node_ids
        .iter()
        .map(|node_id| build_report(table, &distance, &classifier, node_id))
        .collect();

    info!(
        "[Report] Analyzed {} nodes in {}ms",
        reports.len(),
        start.elapsed().as_millis()
    );
    Ok(reports)
}

fn build_report(
    table: &CellTable,
    distance: &DistanceEngine<'_>,
    classifier: &NeighborClassifier<'_>,
    node_id: &str,
) -> NodeReport {
    let cells_in_node = table.node_indices(node_id).len() as u32;
    let isd = distance.calculate_all_isd(node_id);
    let relations = classifier.find_neighbor_sectors(node_id);

    let stats = ReportStats {
        cells_in_node,
        isd_rows: isd.len() as u32,
        omitted_cells: cells_in_node - isd.len() as u32,
        relation_rows: relations.len() as u32,
    };

    NodeReport {
        node_id: node_id.to_string(),
        isd,
        relations,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellSite;

    fn table() -> CellTable {
        // Four cells a kilometre apart along a meridian, all facing north
        let step = 1.0 / 111.195;
        let cells = (0..4)
            .map(|i| {
                let node = if i < 2 { "N1" } else { "N2" };
                let name = format!("C{}", i);
                CellSite::new(&name, node, &name, 45.0 + i as f64 * step, 7.0, 0.0, "L800")
            })
            .collect();
        CellTable::from_records(cells).unwrap()
    }

    #[test]
    fn test_report_stats() {
        let table = table();
        let report =
            analyze_node(&table, "N1", &IsdConfig::default(), &NeighborConfig::default()).unwrap();

        assert_eq!(report.stats.cells_in_node, 2);
        assert_eq!(report.stats.isd_rows, 2);
        assert_eq!(report.stats.omitted_cells, 0);
        // C0-C1, C0-C2, C0-C3, C1-C2, C1-C3
        assert_eq!(report.stats.relation_rows, 5);
    }

    #[test]
    fn test_multiple_nodes_keep_order() {
        let table = table();
        let reports = analyze_nodes(
            &table,
            &["N2", "N1", "MISSING"],
            &IsdConfig::default(),
            &NeighborConfig::default(),
        )
        .unwrap();

        let ids: Vec<&str> = reports.iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(ids, vec!["N2", "N1", "MISSING"]);
        assert_eq!(reports[2].stats, ReportStats::default());
    }

    #[test]
    fn test_report_json() {
        let table = table();
        let report =
            analyze_node(&table, "N2", &IsdConfig::default(), &NeighborConfig::default()).unwrap();
        let json = report.to_json().unwrap();
        let parsed: NodeReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert!(json.contains("\"remark\":\"DirectionSource\""));
    }
}
