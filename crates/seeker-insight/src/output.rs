//! Tabular layout of many insight records.

use seeker_core::{InsightRecord, Result, SeekerError, record::IDENTITY_COLUMNS};
use std::collections::BTreeSet;
use std::io::Write;

/// Header shared by `records`: identity columns first, then every other
/// column found in any record, sorted.
#[must_use]
pub fn insight_header(records: &[InsightRecord]) -> Vec<String> {
    let others: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.columns().iter().map(String::as_str))
        .filter(|c| !IDENTITY_COLUMNS.contains(c))
        .collect();

    IDENTITY_COLUMNS
        .iter()
        .copied()
        .chain(others)
        .map(ToString::to_string)
        .collect()
}

/// Writes records as CSV under [`insight_header`]; missing cells are empty.
pub fn write_csv<W: Write>(records: &[InsightRecord], writer: W) -> Result<()> {
    let header = insight_header(records);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&header)
        .map_err(|e| SeekerError::Other(e.to_string()))?;

    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|c| record.get(c).map(ToString::to_string).unwrap_or_default())
            .collect();
        wtr.write_record(&row)
            .map_err(|e| SeekerError::Other(e.to_string()))?;
    }
    wtr.flush().map_err(|e| SeekerError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_core::record::{CODE, NAME};

    fn record(code: &str, extra: &[(&str, f64)]) -> InsightRecord {
        let mut record = InsightRecord::new();
        record.add_columns(IDENTITY_COLUMNS).unwrap();
        record.set(CODE, code).unwrap();
        record.set(NAME, "n").unwrap();
        for (column, value) in extra {
            record.add_columns([*column]).unwrap();
            record.set(column, *value).unwrap();
        }
        record
    }

    #[test]
    fn test_header_identity_first_then_sorted() {
        let records = [
            record("000977", &[("PE_at_season", 12.0), ("MarketValue_at_season", 1.0)]),
            record("600519", &[("12seasons_PE_mean", 30.0)]),
        ];
        assert_eq!(
            insight_header(&records),
            [
                "Code",
                "Name",
                "Industry",
                "IPO",
                "Season",
                "12seasons_PE_mean",
                "MarketValue_at_season",
                "PE_at_season",
            ]
        );
        assert_eq!(insight_header(&[]), IDENTITY_COLUMNS);
    }

    #[test]
    fn test_write_csv() {
        let records = [
            record("000977", &[("PE_at_season", 12.5)]),
            record("600519", &[]),
        ];
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Code,Name,Industry,IPO,Season,PE_at_season");
        assert_eq!(lines[1], "000977,n,,,,12.5");
        assert_eq!(lines[2], "600519,n,,,,");
    }
}
