//! Collection persistence.
//!
//! A snapshot is the collection serialized as JSON. It round-trips every
//! track field exactly, in collection order, so a saved library can be
//! reused offline without rescanning or reconnecting.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use thiserror::Error;

use super::collection::Collection;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

impl Collection {
    pub fn save_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load_snapshot(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        let collection = serde_json::from_reader(BufReader::new(file))?;
        Ok(collection)
    }
}
