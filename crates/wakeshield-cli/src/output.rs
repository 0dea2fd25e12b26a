use crate::error::{CliError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};
use wakeshield::workflows::record::ScenarioRecord;

/// Appends scenario records to a CSV file, writing the header only when the file is new or
/// empty. An existing header must match the grid shape of the new rows.
pub struct RecordWriter {
    writer: csv::Writer<std::fs::File>,
    rows_written: usize,
}

impl RecordWriter {
    pub fn append(path: &Path, grid_shape: (usize, usize)) -> Result<Self> {
        let header = ScenarioRecord::header(grid_shape.0, grid_shape.1);
        let existing_header = read_existing_header(path)?;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        match existing_header {
            None => {
                debug!("Writing CSV header with {} columns to {:?}", header.len(), path);
                writer.write_record(&header)?;
            }
            Some(existing) if existing != header => {
                return Err(CliError::Config(format!(
                    "'{}' already holds records with {} columns; this scene produces {}.",
                    path.display(),
                    existing.len(),
                    header.len()
                )));
            }
            Some(_) => {}
        }

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn write(&mut self, record: &ScenarioRecord) -> Result<()> {
        self.writer.write_record(record.fields())?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        info!("Appended {} scenario record(s).", self.rows_written);
        Ok(self.rows_written)
    }
}

fn read_existing_header(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() || std::fs::metadata(path)?.len() == 0 {
        return Ok(None);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    match reader.records().next() {
        Some(record) => Ok(Some(record?.iter().map(str::to_string).collect())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, Vector2};
    use tempfile::tempdir;
    use wakeshield::core::models::scene::Scene;
    use wakeshield::core::models::shield::{Coating, Shield, ShieldProfile};
    use wakeshield::core::models::wafer::WaferPlane;
    use wakeshield::workflows::trace::BatchStatistics;

    fn record(grid_shape: (usize, usize)) -> ScenarioRecord {
        let shield =
            Shield::new(ShieldProfile::Flat { radius: 2.0 }, 0.002, Coating::Specular).unwrap();
        let wafer = WaferPlane::new(0.3, -1.2, Vector2::zeros(), grid_shape).unwrap();
        let scene = Scene::with_default_wake(shield, wafer).unwrap();
        let (rows, cols) = grid_shape;
        let stats = BatchStatistics {
            mean_deflection_deg: 12.5,
            hit_ratio: 0.01,
            wake_intrusion_ratio: 0.02,
            wafer_flux_per_m2_per_s: 3.0e15,
            hit_grid: DMatrix::from_element(rows, cols, 1.0),
            batch_size: 100,
            shield_hits: 80,
            wafer_hits: rows * cols,
            wake_hits: rows * cols,
        };
        ScenarioRecord::from_scene(&scene, &stats, 2700.0)
    }

    #[test]
    fn header_is_written_once_across_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");

        let mut writer = RecordWriter::append(&path, (2, 2)).unwrap();
        writer.write(&record((2, 2))).unwrap();
        assert_eq!(writer.finish().unwrap(), 1);

        let mut writer = RecordWriter::append(&path, (2, 2)).unwrap();
        writer.write(&record((2, 2))).unwrap();
        writer.finish().unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 18);
        assert_eq!(&headers[0], "profile");
        assert_eq!(&headers[17], "g0003");
        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "flat");
        assert_eq!(&rows[1][13], "WakeCone");
        assert_eq!(&rows[1][17], "1");
    }

    #[test]
    fn mismatched_grid_shape_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");
        let mut writer = RecordWriter::append(&path, (2, 2)).unwrap();
        writer.write(&record((2, 2))).unwrap();
        writer.finish().unwrap();

        let result = RecordWriter::append(&path, (3, 3));
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
