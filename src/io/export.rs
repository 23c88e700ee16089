//! CSV export for energy-data rows.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::SecondsFormat;

use crate::model::EnergyData;

/// Column header, matching the JSON field names of [`EnergyData`].
const HEADER: &str = "_id,buildingId,timestamp,consumption,predictedConsumption,\
                      temperature,optimizationEnabled";

/// Exports energy-data rows to a CSV file at the given path.
///
/// Writes a header row followed by one data row per reading, in the order
/// given. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(rows: &[EnergyData], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(rows, buf)
}

/// Writes energy-data rows as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(rows: &[EnergyData], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.id.to_string(),
            r.building_id.to_string(),
            r.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            format!("{:.4}", r.consumption),
            format!("{:.4}", r.predicted_consumption),
            format!("{:.2}", r.temperature),
            r.optimization_enabled.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::model::DocumentId;

    fn make_rows(n: i64) -> Vec<EnergyData> {
        let building_id = DocumentId::generate();
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|h| EnergyData {
                id: DocumentId::generate(),
                building_id,
                timestamp: start + Duration::hours(h),
                consumption: 40.0 + h as f64,
                predicted_consumption: 42.5,
                temperature: 21.5,
                optimization_enabled: h % 2 == 0,
            })
            .collect()
    }

    fn render(rows: &[EnergyData]) -> String {
        let mut buf = Vec::new();
        write_csv(rows, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_uses_document_field_names() {
        let output = render(&make_rows(1));
        assert_eq!(
            output.lines().next().unwrap(),
            "_id,buildingId,timestamp,consumption,predictedConsumption,\
             temperature,optimizationEnabled"
        );
    }

    #[test]
    fn one_line_per_row_plus_header() {
        let output = render(&make_rows(24));
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn empty_input_writes_header_only() {
        assert_eq!(render(&[]).lines().count(), 1);
    }

    #[test]
    fn deterministic_output() {
        let rows = make_rows(5);
        assert_eq!(render(&rows), render(&rows));
    }

    #[test]
    fn rows_parse_back() {
        let rows = make_rows(3);
        let output = render(&rows);
        let mut rdr = csv::ReaderBuilder::new().from_reader(output.as_bytes());

        let mut seen = 0;
        for (record, row) in rdr.records().zip(&rows) {
            let rec = record.unwrap();
            assert_eq!(&rec[0], row.id.to_string());
            assert_eq!(&rec[2], format!("2024-03-01T0{seen}:00:00.000Z"));
            let consumption: f64 = rec[3].parse().unwrap();
            assert!((consumption - row.consumption).abs() < 1e-9);
            let flag: bool = rec[6].parse().unwrap();
            assert_eq!(flag, row.optimization_enabled);
            seen += 1;
        }
        assert_eq!(seen, 3);
    }
}
