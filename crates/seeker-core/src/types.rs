//! Core identity types.
//!
//! - [`StockCode`] - Exchange ticker code
//! - [`Stock`] - An exchange-listed equity with its reference information

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exchange ticker code such as `000977`.
///
/// Codes are trimmed on creation. Unlike US symbols they are numeric strings,
/// so no case folding is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockCode(String);

impl StockCode {
    /// Creates a new code from a string, trimming surrounding whitespace.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the code is listed on the Shanghai exchange.
    #[must_use]
    pub fn is_shanghai(&self) -> bool {
        self.0.starts_with('6')
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StockCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for StockCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StockCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// An exchange-listed equity.
///
/// Immutable once built; identified by its [`StockCode`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stock {
    code: StockCode,
    name: String,
    industry: String,
    ipo_date: Option<NaiveDate>,
}

impl Stock {
    /// Creates a new stock with only its code and display name.
    #[must_use]
    pub fn new(code: impl Into<StockCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            industry: String::new(),
            ipo_date: None,
        }
    }

    /// Sets the industry classification.
    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = industry.into();
        self
    }

    /// Sets the IPO date.
    #[must_use]
    pub const fn with_ipo_date(mut self, ipo_date: NaiveDate) -> Self {
        self.ipo_date = Some(ipo_date);
        self
    }

    /// Ticker code.
    #[must_use]
    pub const fn code(&self) -> &StockCode {
        &self.code
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Industry classification, empty when unknown.
    #[must_use]
    pub fn industry(&self) -> &str {
        &self.industry
    }

    /// IPO date, if known.
    #[must_use]
    pub const fn ipo_date(&self) -> Option<NaiveDate> {
        self.ipo_date
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.code, self.name)
    }
}
