use std::fmt;

use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RunStatus {
    Success,
    Error,
    Warning,
}

impl RunStatus {
    /// Value stored in `collection_logs.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record written once at the end of every collection cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CollectionRun {
    pub ts: OffsetDateTime,
    pub status: RunStatus,
    pub message: String,
    pub execution_time_ms: i64,
    pub records_processed: i32,
}
