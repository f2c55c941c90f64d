//! Pipeline clock. The only source of "now".
//!
//! RULE: Nothing in the pipeline may call `Utc::now()` directly.
//! createdAt / updatedAt / uploadedAt stamps and backup suffixes
//! all come from a Clock handed in by the caller, so every
//! transformation is reproducible in tests with a FixedClock.

use chrono::{DateTime, Utc};

/// Timestamp layout written into canonical records.
pub const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Suffix layout for timestamped backup files.
pub const BACKUP_SUFFIX_FORMAT: &str = "%Y%m%d_%H%M%S";

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// The current instant as written into records.
    fn stamp(&self) -> String {
        self.now().format(STAMP_FORMAT).to_string()
    }
}

/// Wall-clock time. Used by the runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant. Used in tests and dry runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    pub instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Parse an RFC 3339 instant, e.g. `2024-03-01T09:30:00Z`.
    pub fn parse(rfc3339: &str) -> anyhow::Result<Self> {
        let instant = DateTime::parse_from_rfc3339(rfc3339)
            .map_err(|e| anyhow::anyhow!("Invalid instant '{rfc3339}': {e}"))?
            .with_timezone(&Utc);
        Ok(Self { instant })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
