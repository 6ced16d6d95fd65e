//!
//! src/persistent.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines module for persisting the genre seed dataset to disk.
//! The whole table is read at run start and replaced at run end
//!

use std::{fs, io, path::{Path, PathBuf}};
use tracing::{debug, info};

use crate::errors::SeederError;
use crate::record::{COLUMNS, TrackFeatureRecord};

#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf
}

impl DatasetStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row. A missing file is an empty dataset, a header that is
    /// not exactly COLUMNS is a Schema error
    pub fn load(&self) -> Result<Vec<TrackFeatureRecord>, SeederError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "dataset.load.missing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into())
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(io::BufReader::new(file));

        let headers = reader.headers()?.clone();
        validate_header(&headers)?;

        let mut rows = Vec::new();
        for (index, result) in reader.deserialize::<TrackFeatureRecord>().enumerate() {
            let row = result.map_err(|e| SeederError::Dataset(
                format!("{} row {}: {e}", self.path.display(), index + 1)
            ))?;
            rows.push(row);
        }

        info!(path = %self.path.display(), rows = rows.len(), "dataset.load");
        Ok(rows)
    }

    /// Writes every row to a temp file next to the target, syncs it, then
    /// renames it over the target so a failed write never truncates it
    pub fn save(&self, rows: &[TrackFeatureRecord]) -> Result<(), SeederError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new(".")
        };
        fs::create_dir_all(parent)?;

        let temp = tempfile::NamedTempFile::new_in(parent)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(temp.as_file());

            writer.write_record(COLUMNS)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| SeederError::Io(e.error))?;
        info!(path = %self.path.display(), rows = rows.len(), "dataset.write");
        Ok(())
    }
}

pub fn validate_header(headers: &csv::StringRecord) -> Result<(), SeederError> {
    let found: Vec<&str> = headers.iter().collect();
    if found.as_slice() != COLUMNS.as_slice() {
        return Err(SeederError::Schema {
            expected: COLUMNS.join(", "),
            found: found.join(", ")
        });
    }
    Ok(())
}
