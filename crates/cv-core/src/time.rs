//! Canonical time representation.
//!
//! The source corpus this toolkit is modeled on mixed `Date` objects and
//! `Date.now()` epoch millis across persisted records, which made two
//! otherwise-identical records compare unequal. We pick one representation
//! and hold it everywhere: epoch milliseconds in memory, ISO-8601 strings on
//! the wire (JSON files, graph/vector payloads). `Timestamp` is the only type
//! allowed to cross that boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }

    pub fn to_rfc3339(&self) -> String {
        self.to_datetime().to_rfc3339()
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self(DateTime::parse_from_rfc3339(s)?.timestamp_millis()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

/// Caller-supplied clock so that callers (and tests) control "now" rather
/// than every module reaching for `Utc::now()` independently.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_rfc3339() {
        let original = Timestamp::from_millis(1_700_000_000_123);
        let wire = original.to_rfc3339();
        let parsed = Timestamp::parse_rfc3339(&wire).unwrap();
        assert_eq!(original, parsed);
    }
}
