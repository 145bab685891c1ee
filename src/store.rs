//! Where debts live between runs.

use crate::debt::RecordSet;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "serde")]
use crate::debt::{DebtId, DebtRecord};
#[cfg(feature = "serde")]
use log::{debug, info};
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use std::{fs, io::ErrorKind, path::Path};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "serde")]
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What a store handed back. `assigned_ids` counts records that had no id
/// on disk and were given one while loading; until they are saved those
/// ids change on every load.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Loaded {
    pub records: RecordSet,
    pub assigned_ids: usize,
}

impl From<RecordSet> for Loaded {
    fn from(records: RecordSet) -> Self {
        Self {
            records,
            assigned_ids: 0,
        }
    }
}

/// Load/save contract for the debt list. A store with no data yet loads as
/// an empty set, not an error. Saves replace everything (last write wins).
pub trait DebtStore {
    fn load(&self) -> Result<Loaded, StoreError>;
    fn save(&self, records: &RecordSet) -> Result<(), StoreError>;
}

// "Id" is read here so a missing one can be told apart from a present one
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct StoredDebt {
    #[serde(rename = "Id")]
    id: Option<DebtId>,
    #[serde(flatten)]
    record: DebtRecord,
}

/// Debts as a JSON array in a single file.
#[cfg(feature = "serde")]
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

#[cfg(feature = "serde")]
impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(feature = "serde")]
impl DebtStore for JsonFileStore {
    fn load(&self) -> Result<Loaded, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("{} not found, starting with no debts", self.path.display());
                return Ok(Loaded::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };
        if text.trim().is_empty() {
            return Ok(Loaded::default());
        }

        let stored: Vec<StoredDebt> =
            serde_json::from_str(&text).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        let mut assigned_ids = 0;
        let records: RecordSet = stored
            .into_iter()
            .map(|StoredDebt { id, mut record }| {
                match id {
                    Some(id) => record.id = id,
                    None => assigned_ids += 1,
                }
                record
            })
            .collect();
        debug!(
            "loaded {} debts from {}, {} without ids",
            records.len(),
            self.path.display(),
            assigned_ids
        );
        Ok(Loaded {
            records,
            assigned_ids,
        })
    }

    fn save(&self, records: &RecordSet) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|err| self.io_error(err))?;
        debug!("saved {} debts to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Keeps debts in memory. `fail_saves` makes every save error out, for
/// exercising what happens to edits that could not be written.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<RecordSet>,
    fail_saves: Cell<bool>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: RecordSet) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    pub fn saved(&self) -> RecordSet {
        self.records.borrow().clone()
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl DebtStore for MemoryStore {
    fn load(&self) -> Result<Loaded, StoreError> {
        Ok(self.records.borrow().clone().into())
    }

    fn save(&self, records: &RecordSet) -> Result<(), StoreError> {
        if self.fail_saves.get() {
            return Err(StoreError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "saves disabled"),
            });
        }
        *self.records.borrow_mut() = records.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
