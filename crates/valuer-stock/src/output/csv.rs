//! CSV output
//!
//! One canonical schema. Numbers use four decimals and an undefined
//! price/value ratio is written as `NaN`. Each row is flushed as soon as it
//! is written, so an interrupted batch keeps every ticker valued so far.

use csv::{Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use super::RecordSink;
use crate::engine::ValuationRecord;
use crate::error::{Result, ValuationError};

pub const CSV_COLUMNS: [&str; 7] = [
    "ticker",
    "price",
    "eps",
    "eps_growth_rate",
    "graham_value",
    "exponential_value",
    "price_to_value_ratio",
];

pub const CSV_HEADER: &str =
    "ticker,price,eps,eps_growth_rate,graham_value,exponential_value,price_to_value_ratio";

/// Writes records as CSV rows to any writer
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Wrap `writer` and emit the header row
    pub fn new(writer: W) -> Result<Self> {
        let mut sink = Self::without_header(writer);
        sink.writer.write_record(CSV_COLUMNS)?;
        sink.writer.flush()?;
        Ok(sink)
    }

    /// Wrap `writer` without writing a header, for appending to existing data
    pub fn without_header(writer: W) -> Self {
        // the header is written by hand so `append` can leave it out
        let writer = WriterBuilder::new().has_headers(false).from_writer(writer);
        Self { writer }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ValuationError::Io(e.into_error()))
    }
}

impl CsvSink<File> {
    /// Create or truncate `path` and write the header
    pub fn create(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "creating CSV output");
        Self::new(File::create(path)?)
    }

    /// Append to `path`; the header is written only when the file is new or empty
    pub fn append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        debug!(path = %path.display(), is_empty, "appending CSV output");

        if is_empty {
            Self::new(file)
        } else {
            Ok(Self::without_header(file))
        }
    }
}

fn row(record: &ValuationRecord) -> [String; 7] {
    let valuation = &record.valuation;
    let input = &valuation.input;
    let ratio = valuation
        .ratio_or_none()
        .map_or_else(|| "NaN".to_string(), |r| format!("{r:.4}"));

    [
        input.ticker.clone(),
        format!("{:.4}", input.price),
        format!("{:.4}", input.eps),
        format!("{:.4}", input.eps_growth_rate),
        format!("{:.4}", valuation.graham_value),
        format!("{:.4}", valuation.exponential_value),
        ratio,
    ]
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &ValuationRecord) -> Result<()> {
        self.writer.write_record(row(record))?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Valuation, ValuationInput};

    fn record(ticker: &str, price: f64, eps: f64, growth: f64) -> ValuationRecord {
        let input = ValuationInput::new(ticker, price, eps, growth).unwrap();
        ValuationRecord::new(Valuation::compute(input).unwrap())
    }

    fn contents(sink: CsvSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_matches_columns() {
        assert_eq!(CSV_COLUMNS.join(","), CSV_HEADER);
    }

    #[test]
    fn test_header_and_row() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write_record(&record("AAA", 150.0, 5.0, 0.08)).unwrap();

        let out = contents(sink);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "AAA,150.0000,5.0000,0.0800,122.5000,88.1597,1.7015"
        );
    }

    #[test]
    fn test_undefined_ratio_is_nan() {
        let mut sink = CsvSink::without_header(Vec::new());
        sink.write_record(&record("ZERO", 100.0, 0.0, 0.05)).unwrap();

        assert_eq!(contents(sink), "ZERO,100.0000,0.0000,0.0500,0.0000,0.0000,NaN\n");
    }

    #[test]
    fn test_ticker_with_separator_is_quoted() {
        let mut sink = CsvSink::without_header(Vec::new());
        sink.write_record(&record("A,B", 1.0, 1.0, 0.0)).unwrap();

        assert!(contents(sink).starts_with("\"A,B\",1.0000,"));
    }

    #[test]
    fn test_rows_reach_disk_before_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.write_record(&record("AAA", 150.0, 5.0, 0.08)).unwrap();

        // sink still open, nothing flushed explicitly
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            format!("{CSV_HEADER}\nAAA,150.0000,5.0000,0.0800,122.5000,88.1597,1.7015\n")
        );
        drop(sink);
    }

    #[test]
    fn test_create_then_append_writes_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.write_record(&record("AAA", 10.0, 1.0, 0.1)).unwrap();
        drop(sink);

        let mut sink = CsvSink::append(&path).unwrap();
        sink.write_record(&record("BBB", 20.0, 2.0, 0.1)).unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("AAA,"));
        assert!(lines[2].starts_with("BBB,"));
    }

    #[test]
    fn test_append_to_new_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.csv");

        let sink = CsvSink::append(&path).unwrap();
        drop(sink);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), format!("{CSV_HEADER}\n"));
    }
}
