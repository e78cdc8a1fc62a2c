use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use hw_core::{ErrorInfo, WalkError, WalkType};
use hw_walk::{restore_walker, Walker, WalkerParams, WalkerRecord};
use serde::{Deserialize, Serialize};

fn io_error(code: &str, err: impl ToString, path: &Path) -> WalkError {
    WalkError::Serde(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// One stored walk and the sweep it was recorded at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConfiguration {
    /// Sweep of the measurement.
    pub sweep: u64,
    /// Walk type.
    pub walk_type: WalkType,
    /// Dimension.
    pub dimension: usize,
    /// Number of steps.
    pub num_steps: usize,
    /// Random numbers the walk is built from.
    pub random_numbers: Vec<f64>,
}

impl StoredConfiguration {
    /// Captures the state of `walker`.
    pub fn capture(sweep: u64, walker: &dyn Walker) -> Self {
        let WalkerRecord {
            walk_type,
            dimension,
            num_steps,
            random_numbers,
        } = walker.record();
        Self {
            sweep,
            walk_type,
            dimension,
            num_steps,
            random_numbers,
        }
    }

    /// Rebuilds the walk. Model parameters not stored in the record
    /// (`mu`, `sigma`, `beta`, reset rate, hull algorithm) come from `base`.
    pub fn restore(&self, base: &WalkerParams) -> Result<Box<dyn Walker>, WalkError> {
        let params = WalkerParams {
            walk_type: self.walk_type,
            dimension: self.dimension,
            steps: self.num_steps,
            ..base.clone()
        };
        restore_walker(&params, &self.random_numbers)
    }
}

/// Append-only file of length-prefixed bincode records.
pub struct ConfigurationStore {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl ConfigurationStore {
    /// Creates (truncates) the store.
    pub fn create(path: &Path) -> Result<Self, WalkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error("conf-mkdir", err, parent))?;
        }
        let file = File::create(path).map_err(|err| io_error("conf-create", err, path))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Opens an existing store for appending.
    pub fn append_to(path: &Path) -> Result<Self, WalkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| io_error("conf-open", err, path))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Path of the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this handle.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Appends the current state of `walker`.
    pub fn append(&mut self, sweep: u64, walker: &dyn Walker) -> Result<(), WalkError> {
        self.append_record(&StoredConfiguration::capture(sweep, walker))
    }

    /// Appends an already captured record.
    pub fn append_record(&mut self, record: &StoredConfiguration) -> Result<(), WalkError> {
        let bytes = bincode::serialize(record)
            .map_err(|err| io_error("conf-encode", err, &self.path))?;
        self.writer
            .write_all(&(bytes.len() as u64).to_le_bytes())
            .and_then(|_| self.writer.write_all(&bytes))
            .map_err(|err| io_error("conf-write", err, &self.path))?;
        self.written += 1;
        Ok(())
    }

    /// Pushes buffered records to the file.
    pub fn flush(&mut self) -> Result<(), WalkError> {
        self.writer
            .flush()
            .map_err(|err| io_error("conf-flush", err, &self.path))
    }

    /// Flushes buffered records.
    pub fn finish(mut self) -> Result<PathBuf, WalkError> {
        self.writer
            .flush()
            .map_err(|err| io_error("conf-flush", err, &self.path))?;
        Ok(self.path)
    }

    /// Reads every record of a store.
    pub fn read_all(path: &Path) -> Result<Vec<StoredConfiguration>, WalkError> {
        let mut bytes = Vec::new();
        File::open(path)
            .and_then(|mut file| file.read_to_end(&mut bytes))
            .map_err(|err| io_error("conf-read", err, path))?;
        let mut records = Vec::new();
        let mut rest = bytes.as_slice();
        while !rest.is_empty() {
            if rest.len() < 8 {
                return Err(io_error("conf-truncated", "incomplete length prefix", path));
            }
            let (prefix, tail) = rest.split_at(8);
            let mut len = [0u8; 8];
            len.copy_from_slice(prefix);
            let len = u64::from_le_bytes(len) as usize;
            if tail.len() < len {
                return Err(io_error("conf-truncated", "incomplete record", path));
            }
            let (record, tail) = tail.split_at(len);
            records.push(
                bincode::deserialize(record).map_err(|err| io_error("conf-decode", err, path))?,
            );
            rest = tail;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hw_core::RngHandle;
    use hw_walk::build_walker;

    #[test]
    fn records_restore_the_stored_walks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confs.bin");
        let params = WalkerParams {
            steps: 12,
            ..WalkerParams::default()
        };
        let mut rng = RngHandle::from_seed(5);
        let mut walker = build_walker(&params, &mut rng).unwrap();
        let mut store = ConfigurationStore::create(&path).unwrap();
        store.append(0, walker.as_ref()).unwrap();
        walker.reconstruct(&mut rng).unwrap();
        store.append(1, walker.as_ref()).unwrap();
        assert_eq!(store.written(), 2);
        store.finish().unwrap();

        let records = ConfigurationStore::read_all(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sweep, 1);
        assert_eq!(records[1].random_numbers, walker.random_numbers());
        let restored = records[1].restore(&params).unwrap();
        assert_eq!(restored.volume(), walker.volume());
        assert_eq!(restored.surface(), walker.surface());
    }

    #[test]
    fn truncated_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confs.bin");
        std::fs::write(&path, [3u8, 0, 0]).unwrap();
        let err = ConfigurationStore::read_all(&path).unwrap_err();
        assert_eq!(err.code(), "conf-truncated");
    }
}
