//! Ticker list input

use std::io::BufRead;
use std::path::Path;

use crate::error::Result;

/// Parse a newline-delimited ticker list.
///
/// Lines are trimmed and uppercased; blank lines and `#` comments are
/// ignored. Order and duplicates are kept.
pub fn parse_tickers(reader: impl BufRead) -> Result<Vec<String>> {
    let mut tickers = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let symbol = line.trim();
        if symbol.is_empty() || symbol.starts_with('#') {
            continue;
        }
        tickers.push(symbol.to_uppercase());
    }
    Ok(tickers)
}

/// Read a ticker list file, see [`parse_tickers`]
pub fn read_ticker_file(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    parse_tickers(std::io::BufReader::new(file))
}
