//! CSV ingestion for historical telemetry uploads.
//!
//! Expected layout: a header row naming at least the five required columns
//! (any order, case-insensitive), then one data row per sample. Extra
//! columns are ignored. Timestamps are kept as literal tokens; the four
//! metric columns must parse as numbers.

use crate::buffer::TelemetrySeries;
use crate::error::CsvError;
use crate::sample::MetricField;

pub const REQUIRED_COLUMNS: [&str; 5] =
    ["timestamp", "latency", "bandwidth", "packet_loss", "jitter"];

/// Parse a CSV payload into a telemetry series.
///
/// Rejects the whole payload on the first bad row rather than coercing or
/// skipping it, so a successful parse always yields a well-shaped series.
/// Blank lines are skipped; line numbers in errors are 1-based over the
/// raw payload.
pub fn parse(text: &str) -> Result<TelemetrySeries, CsvError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (_, header) = lines.next().ok_or(CsvError::Empty)?;
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !columns.iter().any(|c| c == *name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvError::MissingColumns(missing));
    }

    let index_of = |name: &str| columns.iter().position(|c| c == name).unwrap_or(0);
    let ts_idx = index_of("timestamp");
    let metric_idx: [(MetricField, usize); 4] = [
        (MetricField::Latency, index_of("latency")),
        (MetricField::Bandwidth, index_of("bandwidth")),
        (MetricField::PacketLoss, index_of("packet_loss")),
        (MetricField::Jitter, index_of("jitter")),
    ];

    let mut series = TelemetrySeries::default();
    for (line, row) in lines {
        let cells: Vec<&str> = row.split(',').map(str::trim).collect();
        let cell = |idx: usize| -> Result<&str, CsvError> {
            cells.get(idx).copied().ok_or_else(|| CsvError::Row {
                line,
                reason: format!("expected at least {} columns, found {}", idx + 1, cells.len()),
            })
        };

        series.timestamps.push(cell(ts_idx)?.to_string());
        for (field, idx) in metric_idx {
            let raw = cell(idx)?;
            let value = raw.parse::<f64>().map_err(|_| CsvError::Row {
                line,
                reason: format!("{} value {raw:?} is not a number", field.name()),
            })?;
            match field {
                MetricField::Latency => series.latency.push(value),
                MetricField::Bandwidth => series.bandwidth.push(value),
                MetricField::PacketLoss => series.packet_loss.push(value),
                MetricField::Jitter => series.jitter.push(value),
            }
        }
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
timestamp,latency,bandwidth,packet_loss,jitter
10:00:00,45.5,100.2,0.5,2.1
10:00:05,48.0,98.7,0.6,2.3
";

    #[test]
    fn parses_well_formed_payload() {
        let series = parse(WELL_FORMED).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps, vec!["10:00:00", "10:00:05"]);
        assert_eq!(series.latency, vec![45.5, 48.0]);
        assert_eq!(series.bandwidth, vec![100.2, 98.7]);
        assert_eq!(series.packet_loss, vec![0.5, 0.6]);
        assert_eq!(series.jitter, vec![2.1, 2.3]);
    }

    #[test]
    fn header_is_case_insensitive_and_reorderable() {
        let text = "\
Jitter, Timestamp ,LATENCY,packet_loss,bandwidth
2.1,10:00:00,45.5,0.5,100.2
";
        let series = parse(text).unwrap();
        assert_eq!(series.timestamps, vec!["10:00:00"]);
        assert_eq!(series.latency, vec![45.5]);
        assert_eq!(series.jitter, vec![2.1]);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let text = "\
timestamp,latency,bandwidth,packet_loss,jitter,operator
10:00:00,45.5,100.2,0.5,2.1,alice
";
        let series = parse(text).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert_eq!(parse(""), Err(CsvError::Empty));
        assert_eq!(parse("\n  \n"), Err(CsvError::Empty));
    }

    #[test]
    fn missing_columns_are_named() {
        let err = parse("timestamp,latency,bandwidth\n10:00:00,1,2\n").unwrap_err();
        assert_eq!(
            err,
            CsvError::MissingColumns(vec!["packet_loss".into(), "jitter".into()])
        );
    }

    #[test]
    fn short_row_is_rejected_with_line_number() {
        let text = "\
timestamp,latency,bandwidth,packet_loss,jitter
10:00:00,45.5,100.2,0.5,2.1
10:00:05,48.0
";
        match parse(text).unwrap_err() {
            CsvError::Row { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_cell_is_rejected() {
        let text = "\
timestamp,latency,bandwidth,packet_loss,jitter
10:00:00,fast,100.2,0.5,2.1
";
        match parse(text).unwrap_err() {
            CsvError::Row { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("latency"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "\
timestamp,latency,bandwidth,packet_loss,jitter

10:00:00,45.5,100.2,0.5,2.1

";
        let series = parse(text).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn timestamps_are_kept_verbatim() {
        let text = "\
timestamp,latency,bandwidth,packet_loss,jitter
2024-02-20T10:00:00Z,45.5,100.2,0.5,2.1
";
        let series = parse(text).unwrap();
        assert_eq!(series.timestamps, vec!["2024-02-20T10:00:00Z"]);
    }
}
