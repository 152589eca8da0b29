//! Strictly validated scene ratings.
//!
//! The model answers with a flat bracketed list of 25 integers in 0..=4,
//! one per `RAW_SLOT_LABELS` entry. [`SceneVector::parse`] is the only way
//! to build a [`SceneVector`]; anything that is not exactly that shape is
//! rejected whole. From a validated vector this module derives:
//! - the 17-element scoring [`FeatureVector`] (fixed slot selection)
//! - the [`SceneMetrics`] object counts and safety indicators

use thiserror::Error;

use vibe_models::{FeatureVector, SceneMetrics, TrafficDensity, FEATURE_COUNT, MAX_FEATURE_VALUE};

/// Number of ratings in a model answer.
pub const RAW_SLOT_COUNT: usize = 25;

/// Slot names, in prompt order.
pub const RAW_SLOT_LABELS: [&str; RAW_SLOT_COUNT] = [
    "bikes_sidewalk",
    "bikes_street",
    "bikes_bike_lane",
    "bikes_crosswalk",
    "bikes_parked",
    "people_sidewalk",
    "people_street",
    "people_crosswalk",
    "people_waiting",
    "people_moving",
    "vehicles_moving",
    "vehicles_stopped",
    "vehicles_parked",
    "vehicles_turning",
    "vehicles_blocking",
    "activity_pedestrian",
    "activity_cycling",
    "activity_traffic",
    "activity_construction",
    "activity_emergency",
    "infrastructure_signals",
    "infrastructure_signs",
    "infrastructure_lanes",
    "infrastructure_barriers",
    "infrastructure_lighting",
];

/// Raw slot indices.
pub mod slot {
    pub const BIKES_SIDEWALK: usize = 0;
    pub const BIKES_STREET: usize = 1;
    pub const BIKES_CROSSWALK: usize = 3;
    pub const PEOPLE_SIDEWALK: usize = 5;
    pub const PEOPLE_STREET: usize = 6;
    pub const PEOPLE_CROSSWALK: usize = 7;
    pub const VEHICLES_MOVING: usize = 10;
    pub const VEHICLES_STOPPED: usize = 11;
    pub const VEHICLES_PARKED: usize = 12;
    pub const VEHICLES_TURNING: usize = 13;
    pub const VEHICLES_BLOCKING: usize = 14;
    pub const ACTIVITY_CYCLING: usize = 16;
    pub const ACTIVITY_TRAFFIC: usize = 17;
    pub const ACTIVITY_CONSTRUCTION: usize = 18;
    pub const ACTIVITY_EMERGENCY: usize = 19;
    pub const INFRA_SIGNALS: usize = 20;
    pub const INFRA_LANES: usize = 22;
    pub const INFRA_BARRIERS: usize = 23;

    pub const BIKES: std::ops::Range<usize> = 0..5;
    pub const PEOPLE: std::ops::Range<usize> = 5..10;
    pub const VEHICLES: std::ops::Range<usize> = 10..15;
}

/// Raw slot feeding each scoring feature, by feature index.
pub const FEATURE_SOURCE_SLOTS: [usize; FEATURE_COUNT] = [
    slot::BIKES_SIDEWALK,
    slot::BIKES_STREET,
    slot::BIKES_CROSSWALK,
    slot::VEHICLES_BLOCKING,
    slot::VEHICLES_PARKED,
    slot::PEOPLE_SIDEWALK,
    slot::PEOPLE_STREET,
    slot::VEHICLES_MOVING,
    slot::PEOPLE_CROSSWALK,
    slot::VEHICLES_TURNING,
    slot::ACTIVITY_CYCLING,
    slot::ACTIVITY_CONSTRUCTION,
    slot::ACTIVITY_EMERGENCY,
    slot::VEHICLES_STOPPED,
    slot::INFRA_BARRIERS,
    slot::INFRA_LANES,
    slot::INFRA_SIGNALS,
];

// =============================================================================
// Parse errors
// =============================================================================

/// Why a model answer was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneParseError {
    #[error("response is not a bracketed list: {0:?}")]
    NotBracketed(String),

    #[error("expected {expected} values, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("token {index} is not an integer: {token:?}")]
    NotInteger { index: usize, token: String },

    #[error("value {value} at index {index} is outside 0..={max}")]
    OutOfRange { index: usize, value: i64, max: u8 },
}

// =============================================================================
// SceneVector
// =============================================================================

/// The 25 validated ratings of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneVector([u8; RAW_SLOT_COUNT]);

impl SceneVector {
    /// Parse a model answer.
    ///
    /// Accepts surrounding whitespace and a Markdown code fence; nothing
    /// else is tolerated.
    pub fn parse(answer: &str) -> Result<Self, SceneParseError> {
        let body = strip_code_fence(answer.trim()).trim();

        let inner = body
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| SceneParseError::NotBracketed(preview(body)))?;

        let tokens: Vec<&str> = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };

        if tokens.len() != RAW_SLOT_COUNT {
            return Err(SceneParseError::WrongCount {
                expected: RAW_SLOT_COUNT,
                actual: tokens.len(),
            });
        }

        let mut values = [0u8; RAW_SLOT_COUNT];
        for (index, token) in tokens.iter().enumerate() {
            let value = parse_integer(token).ok_or_else(|| SceneParseError::NotInteger {
                index,
                token: token.to_string(),
            })?;
            if !(0..=i64::from(MAX_FEATURE_VALUE)).contains(&value) {
                return Err(SceneParseError::OutOfRange {
                    index,
                    value,
                    max: MAX_FEATURE_VALUE,
                });
            }
            values[index] = value as u8;
        }

        Ok(Self(values))
    }

    pub fn values(&self) -> &[u8; RAW_SLOT_COUNT] {
        &self.0
    }

    pub fn get(&self, slot: usize) -> u8 {
        self.0[slot]
    }

    fn sum(&self, range: std::ops::Range<usize>) -> u32 {
        self.0[range].iter().map(|v| u32::from(*v)).sum()
    }

    /// Select the scoring features.
    pub fn to_features(&self) -> FeatureVector {
        let mut values = [0u8; FEATURE_COUNT];
        for (feature, source) in FEATURE_SOURCE_SLOTS.iter().enumerate() {
            values[feature] = self.0[*source];
        }
        FeatureVector::clamped(values)
    }

    /// Derive object counts and the safety indicators.
    pub fn metrics(&self) -> SceneMetrics {
        let pedestrian_count = self.sum(slot::PEOPLE);
        let bicycle_count = self.sum(slot::BIKES);
        let vehicle_count = self.sum(slot::VEHICLES);
        let total = pedestrian_count + bicycle_count + vehicle_count;

        let traffic_density = if total >= 15 || self.get(slot::ACTIVITY_TRAFFIC) == MAX_FEATURE_VALUE {
            TrafficDensity::High
        } else if total >= 8 {
            TrafficDensity::Medium
        } else {
            TrafficDensity::Low
        };

        SceneMetrics {
            pedestrian_count,
            bicycle_count,
            vehicle_count,
            total_objects_detected: total,
            traffic_density,
            congestion_level: (f64::from(total) / 3.0).min(4.0),
            safety_score: self.safety_score(traffic_density, pedestrian_count + bicycle_count),
            error: false,
            error_message: None,
        }
    }

    fn safety_score(&self, density: TrafficDensity, activity: u32) -> u8 {
        let interaction = (u32::from(self.get(slot::BIKES_SIDEWALK))
            + u32::from(self.get(slot::BIKES_CROSSWALK))
            + u32::from(self.get(slot::PEOPLE_STREET)))
        .min(4);
        let lanes = self.get(slot::INFRA_LANES);
        let signals = self.get(slot::INFRA_SIGNALS);

        let mut score = 10.0 - 1.5 * f64::from(interaction);
        score -= match density {
            TrafficDensity::High => 2.0,
            TrafficDensity::Medium => 1.0,
            TrafficDensity::Low => 0.0,
        };
        if activity > 10 && lanes == 0 {
            score -= 2.0;
        }
        if activity > 10 && signals == 0 {
            score -= 1.0;
        }
        if self.get(slot::INFRA_BARRIERS) > 0 {
            score += 1.0;
        }
        if lanes > 0 {
            score += 1.0;
        }

        score.round().clamp(1.0, 10.0) as u8
    }
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return s;
    };
    // Drop an info string such as ```json
    match rest.find('\n') {
        Some(pos) if !rest[..pos].trim_start().starts_with('[') => &rest[pos + 1..],
        _ => rest,
    }
}

/// Optional sign followed by ASCII digits only.
fn parse_integer(token: &str) -> Option<i64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn preview(s: &str) -> String {
    s.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[2,0,1,3,2,1,0,2,3,1,2,0,1,2,3,0,1,2,1,3,2,0,1,2,3]";

    #[test]
    fn test_parse_valid_answer() {
        let scene = SceneVector::parse(SAMPLE).unwrap();
        assert_eq!(scene.get(0), 2);
        assert_eq!(scene.get(24), 3);
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_fence() {
        let fenced = format!("\n```json\n{}\n```\n", SAMPLE.replace(',', ", "));
        assert_eq!(SceneVector::parse(&fenced).unwrap(), SceneVector::parse(SAMPLE).unwrap());
        let bare_fence = format!("```{}```", SAMPLE);
        assert!(SceneVector::parse(&bare_fence).is_ok());
    }

    #[test]
    fn test_rejects_wrong_count() {
        let short = "[2,0,1,3,2,1,0,2,3,1,2,0,1,2,3,0,1,2,1,3,2,0,1,2]";
        assert_eq!(
            SceneVector::parse(short),
            Err(SceneParseError::WrongCount { expected: 25, actual: 24 })
        );
        assert!(matches!(
            SceneVector::parse("[]"),
            Err(SceneParseError::WrongCount { actual: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let bad = SAMPLE.replacen("[2,", "[5,", 1);
        assert!(matches!(
            SceneVector::parse(&bad),
            Err(SceneParseError::OutOfRange { index: 0, value: 5, .. })
        ));
        let negative = SAMPLE.replacen("[2,", "[-1,", 1);
        assert!(matches!(
            SceneVector::parse(&negative),
            Err(SceneParseError::OutOfRange { value: -1, .. })
        ));
    }

    #[test]
    fn test_rejects_non_integer_tokens() {
        for token in ["a", "1.5", "", "+2", "0x1"] {
            let bad = SAMPLE.replacen("[2,", &format!("[{},", token), 1);
            assert!(
                matches!(SceneVector::parse(&bad), Err(SceneParseError::NotInteger { index: 0, .. })),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_rejects_prose_and_nesting() {
        assert!(matches!(
            SceneVector::parse("I see three bikes"),
            Err(SceneParseError::NotBracketed(_))
        ));
        assert!(SceneVector::parse(&format!("Here you go: {}", SAMPLE)).is_err());
        assert!(SceneVector::parse(&format!("[{}]", SAMPLE)).is_err());
    }

    #[test]
    fn test_feature_selection() {
        let scene = SceneVector::parse(SAMPLE).unwrap();
        let features = scene.to_features();
        let expected: [u8; 17] = [2, 0, 3, 3, 1, 1, 0, 2, 2, 2, 1, 1, 3, 0, 2, 1, 2];
        assert_eq!(features.values(), &expected);
    }

    #[test]
    fn test_metrics_for_sample() {
        let metrics = SceneVector::parse(SAMPLE).unwrap().metrics();
        assert_eq!(metrics.bicycle_count, 8);
        assert_eq!(metrics.pedestrian_count, 7);
        assert_eq!(metrics.vehicle_count, 8);
        assert_eq!(metrics.total_objects_detected, 23);
        assert_eq!(metrics.traffic_density, TrafficDensity::High);
        assert_eq!(metrics.congestion_level, 4.0);
        // 10 - 1.5*4 - 2 (high) + 1 (barriers) + 1 (lanes) = 4
        assert_eq!(metrics.safety_score, 4);
        assert!(!metrics.error);
    }

    #[test]
    fn test_metrics_empty_scene() {
        let zeros = format!("[{}]", vec!["0"; 25].join(","));
        let metrics = SceneVector::parse(&zeros).unwrap().metrics();
        assert_eq!(metrics.total_objects_detected, 0);
        assert_eq!(metrics.traffic_density, TrafficDensity::Low);
        assert_eq!(metrics.safety_score, 10);
    }
}
