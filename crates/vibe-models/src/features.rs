//! Fixed-length scoring feature vector.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Number of features consumed by the scorer.
pub const FEATURE_COUNT: usize = 17;

/// Highest rating a single feature can carry.
pub const MAX_FEATURE_VALUE: u8 = 4;

/// Positions of the features the scorer references by name.
pub mod index {
    pub const WALKWAY_VIOLATION: usize = 0;
    pub const DANGEROUS_BIKE_POSITION: usize = 1;
    pub const RED_LIGHT_VIOLATION: usize = 2;
    pub const BLOCKING_PEDESTRIAN_FLOW: usize = 3;
    pub const CAR_BIKE_LANE_VIOLATION: usize = 4;
    pub const PEDESTRIAN_DENSITY: usize = 5;
    pub const VULNERABLE_POPULATION: usize = 6;
    pub const TRAFFIC_VOLUME: usize = 7;
    pub const PEDESTRIAN_CROSSING_LOAD: usize = 8;
    pub const INTERSECTION_COMPLEXITY: usize = 9;
    pub const CYCLIST_VOLUME: usize = 10;
    pub const STOPPED_TRAFFIC: usize = 13;
}

/// Errors raised when building a feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureVectorError {
    #[error("feature vector must have {expected} elements, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("feature {index} out of range: {value} (max {max})")]
    OutOfRange { index: usize, value: u8, max: u8 },
}

/// Exactly 17 small non-negative ratings (0..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct FeatureVector([u8; FEATURE_COUNT]);

impl FeatureVector {
    /// Build from a fixed-size array, checking the value range.
    pub fn new(values: [u8; FEATURE_COUNT]) -> Result<Self, FeatureVectorError> {
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| **v > MAX_FEATURE_VALUE)
        {
            return Err(FeatureVectorError::OutOfRange {
                index,
                value,
                max: MAX_FEATURE_VALUE,
            });
        }
        Ok(Self(values))
    }

    /// Build from values already known to be in range, capping any
    /// element above `MAX_FEATURE_VALUE`.
    pub fn clamped(mut values: [u8; FEATURE_COUNT]) -> Self {
        for v in values.iter_mut() {
            *v = (*v).min(MAX_FEATURE_VALUE);
        }
        Self(values)
    }

    /// Element values in order.
    pub fn values(&self) -> &[u8; FEATURE_COUNT] {
        &self.0
    }

    /// Value at a position.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Sum of all elements.
    pub fn total(&self) -> u32 {
        self.0.iter().map(|v| u32::from(*v)).sum()
    }
}

impl TryFrom<Vec<u8>> for FeatureVector {
    type Error = FeatureVectorError;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        let actual = values.len();
        let array: [u8; FEATURE_COUNT] = values
            .try_into()
            .map_err(|_| FeatureVectorError::WrongLength {
                expected: FEATURE_COUNT,
                actual,
            })?;
        Self::new(array)
    }
}

impl<'de> Deserialize<'de> for FeatureVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<u8>::deserialize(deserializer)?;
        FeatureVector::try_from(values).map_err(serde::de::Error::custom)
    }
}
