//! Flat insight records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, SeekerError};

/// Stock code column.
pub const CODE: &str = "Code";
/// Display name column.
pub const NAME: &str = "Name";
/// Industry classification column.
pub const INDUSTRY: &str = "Industry";
/// IPO date column.
pub const IPO: &str = "IPO";
/// As-of period column.
pub const SEASON: &str = "Season";

/// Identity columns, in output order.
pub const IDENTITY_COLUMNS: [&str; 5] = [CODE, NAME, INDUSTRY, IPO, SEASON];

/// A scalar cell of an insight record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightValue {
    /// Text, e.g. a formatted market value.
    Text(String),
    /// A number.
    Number(f64),
}

impl fmt::Display for InsightValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for InsightValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for InsightValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for InsightValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// An ordered, duplicate-free column registry plus the values set so far.
///
/// A registered column without a value is a missing cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    columns: Vec<String>,
    data: HashMap<String, InsightValue>,
}

impl InsightRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers columns in order. Fails if any is already registered.
    pub fn add_columns<I, S>(&mut self, columns: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            if self.columns.contains(&column) {
                return Err(SeekerError::DuplicateColumn(column));
            }
            self.columns.push(column);
        }
        Ok(self)
    }

    /// Sets the value of a registered column.
    pub fn set(&mut self, column: &str, value: impl Into<InsightValue>) -> Result<&mut Self> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(SeekerError::UnknownColumn(column.to_string()));
        }
        self.data.insert(column.to_string(), value.into());
        Ok(self)
    }

    /// Sets a registered column when a value is present; leaves it missing otherwise.
    pub fn set_opt(
        &mut self,
        column: &str,
        value: Option<impl Into<InsightValue>>,
    ) -> Result<&mut Self> {
        match value {
            Some(value) => self.set(column, value),
            None => Ok(self),
        }
    }

    /// Appends another record's columns and values.
    pub fn merge(&mut self, other: Self) -> Result<&mut Self> {
        self.add_columns(other.columns)?;
        self.data.extend(other.data);
        Ok(self)
    }

    /// Registered columns in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns a cell value; `None` when missing or unregistered.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&InsightValue> {
        self.data.get(column)
    }

    /// Returns a numeric cell value.
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        match self.data.get(column)? {
            InsightValue::Number(n) => Some(*n),
            InsightValue::Text(_) => None,
        }
    }

    /// Returns true if the column is registered.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}
