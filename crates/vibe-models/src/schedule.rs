//! Monitoring schedule updates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Coarse sampling tier derived from a cadence in hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyTier {
    /// Hourly or faster
    Critical,
    /// Up to every 6 hours
    High,
    /// Up to every 12 hours
    Elevated,
    /// Up to daily
    #[default]
    Normal,
    /// Less than daily
    Low,
}

impl FrequencyTier {
    /// Tier for a sampling cadence.
    pub fn from_hours(hours: f64) -> Self {
        if hours <= 1.0 {
            Self::Critical
        } else if hours <= 6.0 {
            Self::High
        } else if hours <= 12.0 {
            Self::Elevated
        } else if hours <= 24.0 {
            Self::Normal
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Elevated => "elevated",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }

    /// Parse a stored tier label. Unknown labels yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "elevated" => Some(Self::Elevated),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Partial mutation applied to a camera's schedule after a run.
///
/// `last_analysis_time` is not carried here: the store stamps it with its
/// own clock when the update is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleUpdate {
    pub current_score: f64,
    pub sampling_frequency_hours: f64,
    pub frequency_tier: FrequencyTier,
}

impl ScheduleUpdate {
    /// Build an update, deriving the tier from the cadence.
    pub fn new(current_score: f64, sampling_frequency_hours: f64) -> Self {
        Self {
            current_score,
            sampling_frequency_hours,
            frequency_tier: FrequencyTier::from_hours(sampling_frequency_hours),
        }
    }
}
