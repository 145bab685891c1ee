use log::debug;
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DebtError {
    #[error("debt name must not be empty")]
    InvalidName,

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("unknown debt type '{0}' (expected credit card, car loan or loan)")]
    UnknownType(String),

    #[error("invalid debt id '{0}'")]
    InvalidId(String),
}

/// Stable identifier assigned when a debt is created. Names are for display
/// and may repeat.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct DebtId(Uuid);

impl DebtId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First block of the id, enough to tell debts apart on screen.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for DebtId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DebtId {
    type Err = DebtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DebtError::InvalidId(s.to_string()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DebtType {
    #[cfg_attr(feature = "serde", serde(rename = "Credit Card"))]
    CreditCard,
    #[cfg_attr(feature = "serde", serde(rename = "Car Loan"))]
    CarLoan,
    Loan,
}

impl DebtType {
    pub const ALL: [DebtType; 3] = [DebtType::CreditCard, DebtType::CarLoan, DebtType::Loan];

    pub fn label(&self) -> &'static str {
        match self {
            DebtType::CreditCard => "Credit Card",
            DebtType::CarLoan => "Car Loan",
            DebtType::Loan => "Loan",
        }
    }
}

impl fmt::Display for DebtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for DebtType {
    type Err = DebtError;

    // accepts "Credit Card", "credit-card", "creditcard", "credit_card"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "creditcard" => Ok(DebtType::CreditCard),
            "carloan" => Ok(DebtType::CarLoan),
            "loan" => Ok(DebtType::Loan),
            _ => Err(DebtError::UnknownType(s.to_string())),
        }
    }
}

/// A debt as entered by the user, before it has an id.
#[derive(Clone, PartialEq, Debug)]
pub struct NewDebt {
    pub name: String,
    pub debt_type: DebtType,
    pub principal: f64,
    pub apr: f64,
    pub minimum_payment: f64,
}

/// A stored debt. Field names on disk match the flat file layout
/// `[{"Name", "Type", "Amount", "APR", "Minimum Payment"}]`; files without
/// ids get fresh ones on load.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebtRecord {
    #[cfg_attr(feature = "serde", serde(rename = "Id", default))]
    pub id: DebtId,
    #[cfg_attr(feature = "serde", serde(rename = "Name"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "Type"))]
    pub debt_type: DebtType,
    #[cfg_attr(feature = "serde", serde(rename = "Amount"))]
    pub principal: f64,
    #[cfg_attr(feature = "serde", serde(rename = "APR"))]
    pub apr: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Minimum Payment"))]
    pub minimum_payment: f64,
}

impl DebtRecord {
    /// Checks that the debt can be stored. Whether it can be paid off is the
    /// calculator's business, so negative amounts are kept as entered.
    pub fn new(debt: NewDebt) -> Result<Self, DebtError> {
        let name = debt.name.trim();
        if name.is_empty() {
            return Err(DebtError::InvalidName);
        }
        for (field, value) in [
            ("amount", debt.principal),
            ("apr", debt.apr),
            ("minimum payment", debt.minimum_payment),
        ] {
            if !value.is_finite() {
                return Err(DebtError::NotFinite { field, value });
            }
        }
        Ok(Self {
            id: DebtId::new(),
            name: name.to_string(),
            debt_type: debt.debt_type,
            principal: debt.principal,
            apr: debt.apr,
            minimum_payment: debt.minimum_payment,
        })
    }
}

impl fmt::Display for DebtRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}), balance ${:.2} at {}% APR, minimum payment ${:.2}",
            self.name, self.debt_type, self.principal, self.apr, self.minimum_payment
        )
    }
}

/// The user's debts in insertion order. Handlers take it by `&mut` from
/// whoever owns it instead of sharing one global list.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct RecordSet(Vec<DebtRecord>);

impl RecordSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DebtRecord> {
        self.0.iter()
    }

    pub fn get(&self, id: &DebtId) -> Option<&DebtRecord> {
        self.0.iter().find(|record| record.id == *id)
    }

    /// Records whose id starts with `prefix` (case-insensitive, dashes ignored).
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&DebtRecord> {
        let prefix: String = prefix
            .chars()
            .filter(|c| *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.0
            .iter()
            .filter(|record| record.id.0.simple().to_string().starts_with(&prefix))
            .collect()
    }

    pub fn push(&mut self, record: DebtRecord) -> DebtId {
        let id = record.id;
        debug!("adding debt {} '{}'", id, record.name);
        self.0.push(record);
        id
    }

    pub fn remove(&mut self, id: &DebtId) -> Option<DebtRecord> {
        let index = self.0.iter().position(|record| record.id == *id)?;
        debug!("removing debt {}", id);
        Some(self.0.remove(index))
    }

    /// Removes every record called `name`, returning them in order.
    pub fn remove_by_name(&mut self, name: &str) -> Vec<DebtRecord> {
        let (removed, kept) = std::mem::take(&mut self.0)
            .into_iter()
            .partition(|record| record.name == name);
        self.0 = kept;
        debug!("removed {} debts named '{}'", removed.len(), name);
        removed
    }
}

impl From<Vec<DebtRecord>> for RecordSet {
    fn from(records: Vec<DebtRecord>) -> Self {
        Self(records)
    }
}

impl FromIterator<DebtRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = DebtRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a DebtRecord;
    type IntoIter = std::slice::Iter<'a, DebtRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
pub(crate) fn sample(name: &str, principal: f64, apr: f64, minimum_payment: f64) -> DebtRecord {
    DebtRecord::new(NewDebt {
        name: name.to_string(),
        debt_type: DebtType::CreditCard,
        principal,
        apr,
        minimum_payment,
    })
    .unwrap()
}
