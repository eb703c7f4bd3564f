use ::csv::WriterBuilder;
use ::std::fs::OpenOptions;

use crate::errors::SinkError;
use crate::imports::*;
use crate::types::FlightRecord;

/// Append-only dataset writer; the header row is written only when the file is absent
/// or empty.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: PathBuf) -> CsvSink {
        CsvSink { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, records: &[FlightRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let needs_header = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(needs_header).from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_HEADER: &str =
        "date_collecte,depart,arrivee,date_depart,prix,compagnie,heure_depart,heure_arrivee,duree_vol,escales,url_source";

    fn record(price: Option<f64>, airline: &str) -> FlightRecord {
        FlightRecord {
            collected_at: "2026-08-23 08:00:00".to_string(),
            origin: "Paris".to_string(),
            destination: "Londres".to_string(),
            travel_date: "2026-09-22".to_string(),
            price,
            airline: Some(airline.to_string()),
            departure_time: Some("08:15".to_string()),
            arrival_time: Some("10:40".to_string()),
            duration: Some("2 h 25 min".to_string()),
            stops: Some("Direct".to_string()),
            source_url: "http://test".to_string(),
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path).unwrap().lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_header_written_exactly_once_across_appends() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sink = CsvSink::new(dir.path().join("vols_data.csv"));
        sink.append(&[record(Some(123.0), "Air France")])?;
        sink.append(&[record(Some(98.0), "easyJet")])?;
        let lines = read_lines(sink.path());
        assert_eq!(lines[0], EXPECTED_HEADER);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("date_collecte")).count(), 1);
        Ok(())
    }

    #[test]
    fn test_append_preserves_order_and_is_contiguous() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sink = CsvSink::new(dir.path().join("vols_data.csv"));
        let records: Vec<FlightRecord> =
            (0..4).map(|i| record(Some(100.0 + f64::from(i)), &format!("airline-{}", i))).collect();
        assert_eq!(sink.append(&records)?, 4);
        let lines = read_lines(sink.path());
        for (i, line) in lines[1..].iter().enumerate() {
            assert!(line.contains(&format!("airline-{}", i)), "row {} out of order: {}", i, line);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_fields_serialize_as_empty_cells() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sink = CsvSink::new(dir.path().join("vols_data.csv"));
        let mut partial = record(None, "x");
        partial.airline = None;
        partial.stops = None;
        sink.append(&[partial])?;
        let lines = read_lines(sink.path());
        assert_eq!(lines[1], "2026-08-23 08:00:00,Paris,Londres,2026-09-22,,,08:15,10:40,2 h 25 min,,http://test");
        Ok(())
    }

    #[test]
    fn test_empty_append_writes_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sink = CsvSink::new(dir.path().join("vols_data.csv"));
        assert_eq!(sink.append(&[])?, 0);
        assert!(!sink.path().exists());
        Ok(())
    }

    #[test]
    fn test_append_to_unwritable_path_is_an_io_failure() {
        let sink = CsvSink::new(PathBuf::from("/proc/farescrape-no-such-dir/vols_data.csv"));
        assert!(matches!(sink.append(&[record(Some(1.0), "x")]), Err(SinkError::Io(_))));
    }
}
