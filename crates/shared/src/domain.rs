use std::fmt;

use serde::{Deserialize, Serialize};

/// Directory identifier of an employee, kept in textual form whatever JSON
/// scalar the backend used for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for EmployeeId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for EmployeeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Result-count cap offered by the limit selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ResultLimit {
    #[default]
    L25,
    L50,
    L100,
    L200,
}

impl ResultLimit {
    pub const ALL: [ResultLimit; 4] = [Self::L25, Self::L50, Self::L100, Self::L200];

    pub fn value(self) -> u32 {
        match self {
            Self::L25 => 25,
            Self::L50 => 50,
            Self::L100 => 100,
            Self::L200 => 200,
        }
    }
}

impl fmt::Display for ResultLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported result limit {0}; expected one of 25, 50, 100, 200")]
pub struct UnsupportedLimit(pub u32);

impl TryFrom<u32> for ResultLimit {
    type Error = UnsupportedLimit;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|limit| limit.value() == value)
            .ok_or(UnsupportedLimit(value))
    }
}

impl From<ResultLimit> for u32 {
    fn from(value: ResultLimit) -> Self {
        value.value()
    }
}

/// Free-text filter fields that go through staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    LastName,
    FirstName,
}

/// Query parameters for the employee list. Serializes to the exact
/// `limit` / `lastName` / `firstName` query string the directory expects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub limit: ResultLimit,
    pub last_name: String,
    pub first_name: String,
}

impl FilterCriteria {
    pub fn with_limit(limit: ResultLimit) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn set_field(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FilterField::LastName => self.last_name = value,
            FilterField::FirstName => self.first_name = value,
        }
    }
}
