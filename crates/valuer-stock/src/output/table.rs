//! Console formatting of valuation results

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};

use crate::api::KeyMetrics;
use crate::engine::{RunReport, SkippedTicker, ValuationRecord};

const UNDEFINED: &str = "n/a";

pub trait Formatter: Send + Sync {
    fn format_records(&self, records: &[ValuationRecord]) -> String;

    fn format_skipped(&self, skipped: &SkippedTicker) -> String {
        format!("skipped {}: {}", skipped.ticker, skipped.reason)
    }

    fn format_report(&self, report: &RunReport) -> String {
        let mut output = self.format_records(&report.records);
        output.push('\n');
        output.push_str(&report.summary());
        output
    }
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn ratio(record: &ValuationRecord) -> String {
    record
        .valuation
        .ratio_or_none()
        .map_or_else(|| UNDEFINED.to_string(), |r| format!("{r:.2}"))
}

fn with_profiles(records: &[ValuationRecord]) -> bool {
    records.iter().any(|r| r.profile.is_some())
}

fn with_metrics(records: &[ValuationRecord]) -> bool {
    records.iter().any(|r| r.metrics.is_some())
}

const METRIC_HEADERS: [&str; 9] = [
    "PE", "PS", "P/B", "P/CF", "P/FCF", "Op. Margin", "Net Margin", "D/E", "R&D ($M)",
];

fn metric_cells(metrics: &KeyMetrics) -> [String; 9] {
    let multiple = |v: Option<f64>| v.map_or_else(|| UNDEFINED.to_string(), |v| format!("{v:.2}"));
    let percent = |v: Option<f64>| v.map_or_else(|| UNDEFINED.to_string(), |v| format!("{:.1}%", v * 100.0));

    [
        multiple(metrics.pe_ratio),
        multiple(metrics.ps_ratio),
        multiple(metrics.pb_ratio),
        multiple(metrics.pcf_ratio),
        multiple(metrics.pfcf_ratio),
        percent(metrics.operating_margin),
        percent(metrics.net_margin),
        multiple(metrics.debt_to_equity),
        multiple(metrics.research_expense),
    ]
}

/// Box-drawn table for terminals
#[derive(Debug, Default, Clone, Copy)]
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_records(&self, records: &[ValuationRecord]) -> String {
        let profiles = with_profiles(records);
        let metrics = with_metrics(records);

        let mut headers = vec!["Ticker", "Price", "Value (Exp)", "Value (Graham)", "P/V Ratio"];
        if profiles {
            headers.extend(["Name", "Sector", "Industry"]);
        }
        if metrics {
            headers.extend(METRIC_HEADERS);
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED).set_header(headers);

        for record in records {
            let valuation = &record.valuation;
            let mut row = vec![
                Cell::new(record.ticker()),
                Cell::new(money(valuation.input.price)).set_alignment(CellAlignment::Right),
                Cell::new(money(valuation.exponential_value)).set_alignment(CellAlignment::Right),
                Cell::new(money(valuation.graham_value)).set_alignment(CellAlignment::Right),
                Cell::new(ratio(record)).set_alignment(CellAlignment::Right),
            ];
            if profiles {
                let profile = record.profile.clone().unwrap_or_default();
                row.extend(
                    [profile.name, profile.sector, profile.industry]
                        .into_iter()
                        .map(|v| Cell::new(v.unwrap_or_default())),
                );
            }
            if metrics {
                let values = record.metrics.clone().unwrap_or_default();
                row.extend(
                    metric_cells(&values)
                        .into_iter()
                        .map(|v| Cell::new(v).set_alignment(CellAlignment::Right)),
                );
            }
            table.add_row(row);
        }

        table.to_string()
    }
}

/// Fixed-width columns, no box drawing; friendlier to pipes and logs
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format_records(&self, records: &[ValuationRecord]) -> String {
        let mut output = format!(
            "{:<16} {:<16} {:<16} {:<16} {:<16}\n",
            "Ticker", "Price", "Value Exp", "Value Gr.", "P/V Ratio"
        );
        for record in records {
            let valuation = &record.valuation;
            output.push_str(&format!(
                "{:<16} {:<16.2} {:<16.2} {:<16.2} {:<16}\n",
                record.ticker(),
                valuation.input.price,
                valuation.exponential_value,
                valuation.graham_value,
                ratio(record),
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CompanyProfile;
    use crate::engine::{Valuation, ValuationInput};
    use crate::error::ValuationError;

    fn record(ticker: &str, eps: f64) -> ValuationRecord {
        let input = ValuationInput::new(ticker, 150.0, eps, 0.08).unwrap();
        ValuationRecord::new(Valuation::compute(input).unwrap())
    }

    #[test]
    fn test_table_contains_values() {
        let out = TableFormatter.format_records(&[record("AAA", 5.0), record("ZERO", 0.0)]);
        assert!(out.contains("Value (Graham)"));
        assert!(out.contains("122.50"));
        assert!(out.contains("88.16"));
        assert!(out.contains("1.70"));
        assert!(out.contains(UNDEFINED));
        assert!(!out.contains("Sector"));
    }

    #[test]
    fn test_table_profile_columns() {
        let rec = record("AAA", 5.0).with_profile(CompanyProfile {
            name: Some("Triple A Corp".to_string()),
            sector: Some("Industrials".to_string()),
            industry: None,
        });
        let out = TableFormatter.format_records(&[rec]);
        assert!(out.contains("Sector"));
        assert!(out.contains("Industrials"));
    }

    #[test]
    fn test_table_metric_columns() {
        let rec = record("AAA", 5.0).with_metrics(KeyMetrics {
            pe_ratio: Some(18.25),
            operating_margin: Some(0.305),
            ..Default::default()
        });
        let out = TableFormatter.format_records(&[rec, record("BBB", 5.0)]);
        assert!(out.contains("P/FCF"));
        assert!(out.contains("18.25"));
        assert!(out.contains("30.5%"));
        assert!(!out.contains("Industry"));
    }

    #[test]
    fn test_metric_cells_mark_missing() {
        let cells = metric_cells(&KeyMetrics {
            research_expense: Some(1234.5),
            ..Default::default()
        });
        assert_eq!(cells[0], UNDEFINED);
        assert_eq!(cells[8], "1234.50");
    }

    #[test]
    fn test_plain_rows() {
        let out = PlainFormatter.format_records(&[record("AAA", 5.0)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Ticker"));
        assert!(lines[1].starts_with("AAA "));
        assert!(lines[1].contains("122.50"));
    }

    #[test]
    fn test_skip_notice_and_summary() {
        let mut report = RunReport::new();
        report.records.push(record("BBB", 5.0));
        let skipped = SkippedTicker::new("AAA", &ValuationError::missing("AAA", "EPS"));
        report.skipped.push(skipped.clone());

        assert_eq!(
            PlainFormatter.format_skipped(&skipped),
            "skipped AAA: Missing data for AAA: EPS"
        );
        assert!(PlainFormatter.format_report(&report).ends_with("1 valued, 1 skipped"));
    }
}
