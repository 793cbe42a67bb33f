//! Timestamp utilities.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// From a DateTime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// From fractional seconds since the Unix epoch.
    ///
    /// Out-of-range values clamp to the epoch.
    pub fn from_epoch_secs(secs: f64) -> Self {
        let whole = secs.trunc() as i64;
        let nanos = (secs.fract() * 1e9) as u32;
        Self(
            Utc.timestamp_opt(whole, nanos)
                .single()
                .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap()),
        )
    }

    /// Fractional seconds since the Unix epoch, as stored in REAL columns.
    pub fn as_epoch_secs(&self) -> f64 {
        self.0.timestamp() as f64 + f64::from(self.0.timestamp_subsec_nanos()) / 1e9
    }

    /// Get the inner DateTime.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// ISO 8601 string.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_serialization() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let deserialized: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, deserialized);
    }

    #[test]
    fn test_timestamp_ordering() {
        let ts1 = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let ts2 = Timestamp::now();
        assert!(ts1 < ts2);
    }

    #[test]
    fn test_epoch_secs_round_trip() {
        let ts = Timestamp::from_epoch_secs(1_700_000_000.25);
        let secs = ts.as_epoch_secs();
        assert!((secs - 1_700_000_000.25).abs() < 1e-6);
    }

    #[test]
    fn test_epoch_secs_monotonic() {
        let a = Timestamp::now().as_epoch_secs();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = Timestamp::now().as_epoch_secs();
        assert!(b > a);
    }
}
