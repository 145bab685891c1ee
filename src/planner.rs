//! Interaction handlers: each add or delete edits the record set, writes it
//! through the store, and leaves the caller to re-plan and render.

use crate::debt::{DebtError, DebtId, DebtRecord, NewDebt, RecordSet};
use crate::portfolio::{plan_all, prioritize, summarize, PlannedDebt, PortfolioSummary};
use crate::store::{DebtStore, Loaded, StoreError};
use chrono::NaiveDate;
use log::{info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error(transparent)]
    Debt(#[from] DebtError),

    #[error("could not save debts, edits are kept in memory: {0}")]
    Store(#[from] StoreError),

    #[error("no debt matches '{0}'")]
    NotFound(String),

    #[error("'{prefix}' matches {matches} debts, use more of the id")]
    Ambiguous { prefix: String, matches: usize },
}

/// Every schedule and the totals for one evaluation date.
#[derive(Clone, PartialEq, Debug)]
pub struct Plan {
    pub evaluation_date: NaiveDate,
    pub debts: Vec<PlannedDebt>,
    pub summary: PortfolioSummary,
}

impl Plan {
    pub fn new(records: &RecordSet, evaluation_date: NaiveDate) -> Self {
        let debts = plan_all(records, evaluation_date);
        let summary = summarize(&debts);
        Self {
            evaluation_date,
            debts,
            summary,
        }
    }

    pub fn prioritized(&self) -> Vec<&PlannedDebt> {
        prioritize(&self.debts)
    }
}

pub struct Planner<S: DebtStore> {
    store: S,
    records: RecordSet,
    dirty: bool,
}

impl<S: DebtStore> Planner<S> {
    /// Loads the records. Ids handed out during the load are saved right
    /// away so they stay the same on the next open. If that save fails the
    /// planner opens dirty and the ids are written with the next edit.
    pub fn open(store: S) -> Result<Self, PlannerError> {
        let Loaded {
            records,
            assigned_ids,
        } = store.load()?;
        info!("opened planner with {} debts", records.len());
        let mut planner = Self {
            store,
            records,
            dirty: assigned_ids > 0,
        };
        if planner.dirty {
            info!("saving {} newly assigned debt ids", assigned_ids);
            if planner.save().is_err() {
                warn!("debt ids are not stored yet and will change on the next open");
            }
        }
        Ok(planner)
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True while the in-memory records differ from what was last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the records through the store. On failure the records stay
    /// as they are and the planner stays dirty.
    pub fn save(&mut self) -> Result<(), PlannerError> {
        match self.store.save(&self.records) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                warn!("save failed: {}", err);
                self.dirty = true;
                Err(err.into())
            }
        }
    }

    pub fn add(&mut self, debt: NewDebt) -> Result<DebtId, PlannerError> {
        let record = DebtRecord::new(debt)?;
        info!("adding {}", record);
        let id = self.records.push(record);
        self.dirty = true;
        self.save()?;
        Ok(id)
    }

    pub fn delete(&mut self, id: &DebtId) -> Result<DebtRecord, PlannerError> {
        let removed = self
            .records
            .remove(id)
            .ok_or_else(|| PlannerError::NotFound(id.to_string()))?;
        info!("deleted {}", removed);
        self.dirty = true;
        self.save()?;
        Ok(removed)
    }

    /// The one debt whose id starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<&DebtRecord, PlannerError> {
        match self.records.find_by_prefix(prefix).as_slice() {
            [record] => Ok(*record),
            [] => Err(PlannerError::NotFound(prefix.to_string())),
            matches => Err(PlannerError::Ambiguous {
                prefix: prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// Deletes the one debt whose id starts with `prefix`.
    pub fn delete_by_prefix(&mut self, prefix: &str) -> Result<DebtRecord, PlannerError> {
        let id = self.find_by_prefix(prefix)?.id;
        self.delete(&id)
    }

    /// Deletes every debt called `name`. Names can repeat, so prefer ids.
    pub fn delete_by_name(&mut self, name: &str) -> Result<Vec<DebtRecord>, PlannerError> {
        let removed = self.records.remove_by_name(name);
        if removed.is_empty() {
            return Err(PlannerError::NotFound(name.to_string()));
        }
        info!("deleted {} debts named '{}'", removed.len(), name);
        self.dirty = true;
        self.save()?;
        Ok(removed)
    }

    pub fn plan(&self, evaluation_date: NaiveDate) -> Plan {
        Plan::new(&self.records, evaluation_date)
    }
}
