//! Recurring scaling window shared by configs and groups

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One recurring window during which the target should be active.
///
/// A schedule with an empty `days` list is invalid and ignored during
/// evaluation. Windows do not wrap through midnight: `startTime` must not be
/// later than `endTime` or the window never matches.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScalingSchedule {
    /// Days of week this window applies to (0 = Sunday ... 6 = Saturday)
    pub days: Vec<u32>,

    /// Window start as "HH:MM" (inclusive)
    pub start_time: String,

    /// Window end as "HH:MM" (inclusive)
    pub end_time: String,

    /// IANA timezone name (e.g. "UTC", "Europe/Berlin").
    /// Absent or unknown names fall back to operator-local time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl ScalingSchedule {
    /// A schedule participates in evaluation only if it names at least one day
    pub fn is_valid(&self) -> bool {
        !self.days.is_empty()
    }
}
