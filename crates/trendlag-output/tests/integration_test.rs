//! Integration tests for the reporting sink.

use rstest::rstest;
use trendlag_output::{
    ExportFormat, Exporter, OVERALL_GROUP, RegressionResult, ReportBuilder, SkipReason,
    SkippedGroup, SummaryTable,
};

fn result(group: &str, coefficient: f64, p_value: f64) -> RegressionResult {
    RegressionResult {
        group: group.to_string(),
        lag: 0,
        coefficient,
        std_error: 0.002,
        statistic: coefficient / 0.002,
        p_value,
        partial_r_squared: 0.05,
        r_squared: 0.4,
        n_obs: 90,
        n_entities: 3,
        n_periods: 30,
    }
}

fn sector_table() -> SummaryTable {
    let mut table = SummaryTable::new(0);
    table.push_result(result("Tech", 0.003, 0.41));
    table.push_result(result("Auto", -0.001, 0.07));
    table.push_result(result("Health Insurance", 0.002, 0.002));
    table.push_result(result(OVERALL_GROUP, 0.0005, 0.2));
    table.push_skip(SkippedGroup {
        group: "Other".to_string(),
        reason: SkipReason::TooFewRows { min: 30 },
        rows: 12,
        entities: 1,
    });
    table.push_skip(SkippedGroup {
        group: "Pharmacy".to_string(),
        reason: SkipReason::TooFewEntities { min: 2 },
        rows: 60,
        entities: 1,
    });
    table
}

#[test]
fn test_sector_summary_workflow() {
    let mut table = sector_table();
    table.sort_by_p_value();

    let csv = table.export_to_string(ExportFormat::Csv).unwrap();
    let groups: Vec<_> = csv
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().to_string())
        .collect();
    assert_eq!(
        groups,
        vec!["Health Insurance", "Auto", OVERALL_GROUP, "Tech", "Other", "Pharmacy"]
    );

    let ascii = table.to_ascii_table();
    assert!(ascii.contains("Health Insurance"));
    assert!(ascii.contains("Other (12 rows, 1 entities): fewer than 30 rows"));

    let markdown = table.to_markdown();
    assert!(markdown.contains("# Attention Regression Summary (Lag = 0)"));
}

#[rstest]
#[case(ExportFormat::Json)]
#[case(ExportFormat::PrettyJson)]
fn test_json_round_trip(#[case] format: ExportFormat) {
    let table = sector_table();
    let json = table.export_to_string(format).unwrap();
    let parsed: SummaryTable = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, table);
}

#[test]
fn test_general_report_from_table() {
    let mut table = SummaryTable::new(4);
    table.push_result(RegressionResult {
        lag: 4,
        ..result(OVERALL_GROUP, -0.000321, 0.5)
    });

    let overall = table.overall().unwrap().clone();
    let report = ReportBuilder::new().result(overall).build().unwrap();
    let text = report.to_text();
    assert!(text.contains("Coefficient for attention_lag : -0.000321"));
    assert!(text.ends_with("R-squared                    : 0.4000\n"));
}
