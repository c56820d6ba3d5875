//! Terminal tables

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use failguard_core::QueryResult;
use failguard_driver_failover::{CandidateReport, Readiness};
use failguard_drivers::DriverRegistry;
use failguard_drivers::postgres::redact_endpoint;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn query_table(result: &QueryResult) -> Table {
    let mut table = new_table(result.columns.iter().map(|c| c.name.as_str()).collect());
    for row in &result.rows {
        table.add_row(row.values.iter().map(|v| v.to_string()).collect::<Vec<_>>());
    }
    table
}

pub fn survey_table(reports: &[CandidateReport]) -> Table {
    let mut table = new_table(vec!["#", "endpoint", "verdict", "detail"]);
    for report in reports {
        let detail = match &report.readiness {
            Readiness::ProbeFailed(e) => e.to_string(),
            _ => String::new(),
        };
        table.add_row(vec![
            report.index.to_string(),
            redact_endpoint(&report.endpoint),
            report.readiness.label().to_string(),
            detail,
        ]);
    }
    table
}

pub fn drivers_table(registry: &DriverRegistry) -> Table {
    let mut table = new_table(vec!["name", "display name", "version"]);
    for name in registry.list() {
        if let Some(driver) = registry.get(name) {
            table.add_row(vec![
                name.to_string(),
                driver.display_name().to_string(),
                driver.version().to_string(),
            ]);
        }
    }
    table
}
