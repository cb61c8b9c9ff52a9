//! Where valuation records go once computed

pub mod csv;
pub mod table;

pub use csv::{CSV_COLUMNS, CSV_HEADER, CsvSink};
pub use table::{Formatter, PlainFormatter, TableFormatter};

use crate::engine::ValuationRecord;
use crate::error::Result;

/// Destination for valuation records, written in ticker order
pub trait RecordSink {
    fn write_record(&mut self, record: &ValuationRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that drops every record, for runs without a CSV file
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl RecordSink for DiscardSink {
    fn write_record(&mut self, _record: &ValuationRecord) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<ValuationRecord> {
    fn write_record(&mut self, record: &ValuationRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}
