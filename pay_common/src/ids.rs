use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------        UserId         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not a valid user id. User ids are whole numbers.")]
pub struct UserIdParseError(pub String);

impl FromStr for UserId {
    type Err = UserIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|_| UserIdParseError(s.to_string()))
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The order identifier assigned by the remote service. It is opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderStatus       ---------------------------------------------------------
/// An order status as reported by the remote service, e.g. `NEW` or `FINISHED`. The service is the only authority on
/// which values exist, so the client keeps it as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderStatus(String);

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive membership test against a set of status names.
    pub fn is_one_of<S: AsRef<str>>(&self, statuses: &[S]) -> bool {
        statuses.iter().any(|s| s.as_ref().eq_ignore_ascii_case(&self.0))
    }
}
