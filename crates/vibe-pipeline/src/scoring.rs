//! Adaptive temperature scoring.
//!
//! Turns a 17-feature scene vector into a bounded 0..10 priority score plus a
//! recommended sampling cadence.
//!
//! # Algorithm
//!
//! - Each [`RiskRule`] sums the features it names and compares against its
//!   threshold; triggered rules contribute their points.
//! - An infrastructure multiplier (≥ 1) rewards dangerous combinations.
//! - `intensity = (points + density_weight × Σ features) × multiplier`
//! - `score = 10 × intensity / (intensity + half_saturation)`, rounded to
//!   two decimals.
//!
//! The persisted sampling cadence never enters the score. It only seeds the
//! recommended cadence, which a known neighborhood can override.
//!
//! Every step is non-decreasing in each feature, so raising any single
//! feature never lowers the score.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use vibe_models::features::index;
use vibe_models::{CameraRecord, FeatureVector, FEATURE_COUNT};

pub type ScoringResult<T> = Result<T, ScoringError>;

/// Maximum score.
pub const MAX_SCORE: f64 = 10.0;

/// Score recorded when no usable feature vector exists.
pub const FALLBACK_SCORE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("Failed to load scoring weights: {0}")]
    Load(String),
}

impl ScoringError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidWeights(msg.into())
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// One threshold rule over a sum of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRule {
    pub name: String,
    /// Feature positions summed into the rule value
    pub features: Vec<usize>,
    pub threshold: f64,
    pub points: f64,
}

impl RiskRule {
    pub fn new(name: &str, features: &[usize], threshold: f64, points: f64) -> Self {
        Self {
            name: name.to_string(),
            features: features.to_vec(),
            threshold,
            points,
        }
    }
}

/// Multipliers for dangerous feature combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureMultipliers {
    /// Walkway violation and dangerous bike position both present
    pub walkway_conflict: f64,
    /// Several of the first six features active at once
    pub multiple_violations: f64,
    pub multiple_violations_min: usize,
    /// Complex intersection
    pub intersection: f64,
    pub intersection_threshold: u8,
}

impl Default for InfrastructureMultipliers {
    fn default() -> Self {
        Self {
            walkway_conflict: 2.0,
            multiple_violations: 1.5,
            multiple_violations_min: 3,
            intersection: 1.3,
            intersection_threshold: 3,
        }
    }
}

/// Scoring coefficients, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub rules: Vec<RiskRule>,
    pub multipliers: InfrastructureMultipliers,
    /// Weight of the raw feature sum in the intensity
    pub density_weight: f64,
    /// Intensity at which the score reaches 5
    pub half_saturation: f64,
    /// Neighborhoods sampled at least every `high_risk_hours`
    pub high_risk_neighborhoods: Vec<String>,
    pub high_risk_hours: f64,
    /// Neighborhoods sampled at least every `medium_risk_hours`
    pub medium_risk_neighborhoods: Vec<String>,
    pub medium_risk_hours: f64,
    pub min_sampling_hours: f64,
    pub max_sampling_hours: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rules: vec![
                RiskRule::new(
                    "pedestrian_street_grade_plus_bike_lane",
                    &[index::WALKWAY_VIOLATION, index::DANGEROUS_BIKE_POSITION],
                    1.0,
                    24.0,
                ),
                RiskRule::new(
                    "bike_red_light_violation_active",
                    &[index::RED_LIGHT_VIOLATION],
                    1.0,
                    48.0,
                ),
                RiskRule::new(
                    "pedestrian_bike_interaction_critical",
                    &[index::BLOCKING_PEDESTRIAN_FLOW],
                    3.0,
                    12.0,
                ),
                RiskRule::new(
                    "sidewalk_obstruction_high",
                    &[index::CAR_BIKE_LANE_VIOLATION],
                    2.5,
                    8.0,
                ),
                RiskRule::new(
                    "dangerous_bike_lane_position",
                    &[index::DANGEROUS_BIKE_POSITION],
                    2.0,
                    6.0,
                ),
                RiskRule::new(
                    "traffic_congestion_pedestrian_impact",
                    &[index::TRAFFIC_VOLUME, index::STOPPED_TRAFFIC],
                    3.0,
                    4.0,
                ),
                RiskRule::new(
                    "pedestrian_density_high",
                    &[index::PEDESTRIAN_DENSITY],
                    4.0,
                    3.0,
                ),
                RiskRule::new("bike_volume_moderate", &[index::CYCLIST_VOLUME], 2.0, 2.0),
                RiskRule::new(
                    "intersection_complexity",
                    &[index::INTERSECTION_COMPLEXITY],
                    2.5,
                    3.0,
                ),
            ],
            multipliers: InfrastructureMultipliers::default(),
            density_weight: 0.5,
            half_saturation: 40.0,
            high_risk_neighborhoods: ["Hell's Kitchen", "Times Square", "Union Square", "Chelsea"]
                .map(String::from)
                .to_vec(),
            high_risk_hours: 12.0,
            medium_risk_neighborhoods: ["Midtown West", "Midtown East", "Greenwich Village", "SoHo"]
                .map(String::from)
                .to_vec(),
            medium_risk_hours: 18.0,
            min_sampling_hours: 0.5,
            max_sampling_hours: 96.0,
        }
    }
}

impl ScoringWeights {
    /// Load weights from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> ScoringResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::Load(format!("{}: {}", path.display(), e)))?;
        let weights: Self = serde_json::from_str(&json)
            .map_err(|e| ScoringError::Load(format!("{}: {}", path.display(), e)))?;
        weights.validate()?;
        info!(path = %path.display(), rules = weights.rules.len(), "Loaded scoring weights");
        Ok(weights)
    }

    pub fn validate(&self) -> ScoringResult<()> {
        for rule in &self.rules {
            check_coefficient(&format!("rule {} threshold", rule.name), rule.threshold)?;
            check_coefficient(&format!("rule {} points", rule.name), rule.points)?;
            if let Some(bad) = rule.features.iter().find(|i| **i >= FEATURE_COUNT) {
                return Err(ScoringError::invalid(format!(
                    "rule {} references feature {} (max {})",
                    rule.name,
                    bad,
                    FEATURE_COUNT - 1
                )));
            }
        }

        let m = &self.multipliers;
        for (name, value) in [
            ("walkway_conflict", m.walkway_conflict),
            ("multiple_violations", m.multiple_violations),
            ("intersection", m.intersection),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(ScoringError::invalid(format!(
                    "multiplier {} must be >= 1, got {}",
                    name, value
                )));
            }
        }

        check_coefficient("density_weight", self.density_weight)?;
        if !self.half_saturation.is_finite() || self.half_saturation <= 0.0 {
            return Err(ScoringError::invalid(format!(
                "half_saturation must be positive, got {}",
                self.half_saturation
            )));
        }

        check_coefficient("high_risk_hours", self.high_risk_hours)?;
        check_coefficient("medium_risk_hours", self.medium_risk_hours)?;
        check_coefficient("min_sampling_hours", self.min_sampling_hours)?;
        check_coefficient("max_sampling_hours", self.max_sampling_hours)?;
        if self.min_sampling_hours > self.max_sampling_hours {
            return Err(ScoringError::invalid(format!(
                "min_sampling_hours {} exceeds max_sampling_hours {}",
                self.min_sampling_hours, self.max_sampling_hours
            )));
        }

        Ok(())
    }
}

fn check_coefficient(name: &str, value: f64) -> ScoringResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScoringError::invalid(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )))
    }
}

// ============================================================================
// Output
// ============================================================================

/// Evaluation of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub value: f64,
    pub threshold: f64,
    pub points_added: f64,
    pub triggered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// 0..=10
    pub total_score: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub infrastructure_multiplier: f64,
    pub activity_intensity: f64,
    pub neighborhood_baseline_hours: f64,
    pub recommended_sampling_hours: f64,
}

impl ScoreBreakdown {
    pub fn triggered(&self) -> impl Iterator<Item = &RiskFactor> {
        self.risk_factors.iter().filter(|f| f.triggered)
    }
}

// ============================================================================
// Scorer
// ============================================================================

/// Pure, deterministic scorer. Built once at startup and shared.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveScorer {
    weights: ScoringWeights,
}

impl AdaptiveScorer {
    /// Wrap weights as given. Invalid weights surface on every `score` call.
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Wrap weights after validating them.
    pub fn validated(weights: ScoringWeights) -> ScoringResult<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(
        &self,
        features: &FeatureVector,
        camera: &CameraRecord,
        sampling_frequency_hours: f64,
    ) -> ScoringResult<ScoreBreakdown> {
        self.weights.validate()?;
        let w = &self.weights;
        let values = features.values();

        let risk_factors: Vec<RiskFactor> = w
            .rules
            .iter()
            .map(|rule| {
                let value: f64 = rule.features.iter().map(|i| f64::from(values[*i])).sum();
                let triggered = value >= rule.threshold;
                RiskFactor {
                    name: rule.name.clone(),
                    value,
                    threshold: rule.threshold,
                    points_added: if triggered { rule.points } else { 0.0 },
                    triggered,
                }
            })
            .collect();

        let points: f64 = risk_factors.iter().map(|f| f.points_added).sum();
        let multiplier = self.infrastructure_multiplier(features);
        let density = w.density_weight * f64::from(features.total());
        let intensity = (points + density) * multiplier;

        let total_score = round2(MAX_SCORE * intensity / (intensity + w.half_saturation))
            .clamp(0.0, MAX_SCORE);

        let baseline = self.neighborhood_baseline(camera, sampling_frequency_hours);
        let recommended = ((baseline - points) / multiplier)
            .clamp(w.min_sampling_hours, w.max_sampling_hours);

        Ok(ScoreBreakdown {
            total_score,
            risk_factors,
            infrastructure_multiplier: multiplier,
            activity_intensity: intensity,
            neighborhood_baseline_hours: baseline,
            recommended_sampling_hours: recommended,
        })
    }

    fn infrastructure_multiplier(&self, features: &FeatureVector) -> f64 {
        let m = &self.weights.multipliers;
        let values = features.values();
        let mut multiplier = 1.0;

        if values[index::WALKWAY_VIOLATION] >= 1 && values[index::DANGEROUS_BIKE_POSITION] >= 1 {
            multiplier *= m.walkway_conflict;
        }

        let active = values[..6].iter().filter(|v| **v > 0).count();
        if active >= m.multiple_violations_min {
            multiplier *= m.multiple_violations;
        }

        if values[index::INTERSECTION_COMPLEXITY] >= m.intersection_threshold {
            multiplier *= m.intersection;
        }

        multiplier
    }

    /// Baseline cadence: a known neighborhood overrides the camera's own.
    fn neighborhood_baseline(&self, camera: &CameraRecord, sampling_frequency_hours: f64) -> f64 {
        let w = &self.weights;
        let listed = |names: &[String]| {
            camera.neighborhood.as_deref().is_some_and(|n| {
                names.iter().any(|name| name.eq_ignore_ascii_case(n.trim()))
            })
        };

        if listed(&w.high_risk_neighborhoods) {
            w.high_risk_hours
        } else if listed(&w.medium_risk_neighborhoods) {
            w.medium_risk_hours
        } else {
            sampling_frequency_hours
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibe_models::MAX_FEATURE_VALUE;

    // Feature selection of the prompt's example answer
    const SAMPLE: [u8; 17] = [2, 0, 3, 3, 1, 1, 0, 2, 2, 2, 1, 1, 3, 0, 2, 1, 2];

    fn camera() -> CameraRecord {
        CameraRecord::new("cam-42", "z-7")
    }

    fn fv(values: [u8; 17]) -> FeatureVector {
        FeatureVector::new(values).unwrap()
    }

    #[test]
    fn test_default_weights_valid() {
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let scorer = AdaptiveScorer::default();
        let breakdown = scorer.score(&fv([0; 17]), &camera(), 24.0).unwrap();
        assert_eq!(breakdown.total_score, 0.0);
        assert_eq!(breakdown.infrastructure_multiplier, 1.0);
        assert_eq!(breakdown.recommended_sampling_hours, 24.0);
        assert_eq!(breakdown.triggered().count(), 0);
    }

    #[test]
    fn test_sample_vector() {
        let scorer = AdaptiveScorer::default();
        let breakdown = scorer.score(&fv(SAMPLE), &camera(), 24.0).unwrap();

        // walkway (2+0), red light (3), interaction (3)
        let triggered: Vec<&str> = breakdown.triggered().map(|f| f.name.as_str()).collect();
        assert_eq!(
            triggered,
            vec![
                "pedestrian_street_grade_plus_bike_lane",
                "bike_red_light_violation_active",
                "pedestrian_bike_interaction_critical",
            ]
        );
        // five of the first six features active; intersection 2 < 3
        assert_eq!(breakdown.infrastructure_multiplier, 1.5);
        // (84 + 0.5 * 26) * 1.5
        assert_eq!(breakdown.activity_intensity, 145.5);
        assert_eq!(breakdown.total_score, 7.84);
        assert_eq!(breakdown.recommended_sampling_hours, 0.5);
    }

    #[test]
    fn test_score_bounds_at_extremes() {
        let scorer = AdaptiveScorer::default();
        let max = scorer
            .score(&fv([MAX_FEATURE_VALUE; 17]), &camera(), 24.0)
            .unwrap();
        assert!(max.total_score > 9.0 && max.total_score <= MAX_SCORE);
        assert_eq!(max.infrastructure_multiplier, 2.0 * 1.5 * 1.3);
    }

    #[test]
    fn test_monotone_in_every_feature() {
        let scorer = AdaptiveScorer::default();
        let bases = [[0u8; 17], SAMPLE, [1u8; 17], [3u8; 17]];

        for base in bases {
            for i in 0..17 {
                let mut prev = scorer.score(&fv(base), &camera(), 24.0).unwrap().total_score;
                let mut values = base;
                while values[i] < MAX_FEATURE_VALUE {
                    values[i] += 1;
                    let next = scorer.score(&fv(values), &camera(), 24.0).unwrap().total_score;
                    assert!(next >= prev, "feature {} lowered score: {} -> {}", i, prev, next);
                    prev = next;
                }
            }
        }
    }

    #[test]
    fn test_cadence_does_not_change_score() {
        let scorer = AdaptiveScorer::default();
        let hourly = scorer.score(&fv(SAMPLE), &camera(), 1.0).unwrap();
        let weekly = scorer.score(&fv(SAMPLE), &camera(), 168.0).unwrap();
        assert_eq!(hourly.total_score, weekly.total_score);
        assert_eq!(weekly.neighborhood_baseline_hours, 168.0);
    }

    #[test]
    fn test_neighborhood_baseline_and_clamp() {
        let scorer = AdaptiveScorer::default();
        let mut values = [0u8; 17];
        values[index::CYCLIST_VOLUME] = 2;

        let kitchen = camera().with_neighborhood("hell's kitchen");
        let breakdown = scorer.score(&fv(values), &kitchen, 24.0).unwrap();
        assert_eq!(breakdown.neighborhood_baseline_hours, 12.0);
        assert_eq!(breakdown.recommended_sampling_hours, 10.0);

        let soho = camera().with_neighborhood("SoHo");
        let breakdown = scorer.score(&fv([0; 17]), &soho, 24.0).unwrap();
        assert_eq!(breakdown.recommended_sampling_hours, 18.0);

        let breakdown = scorer.score(&fv([0; 17]), &camera(), 200.0).unwrap();
        assert_eq!(breakdown.recommended_sampling_hours, 96.0);
    }

    #[test]
    fn test_invalid_weights() {
        let mut weights = ScoringWeights::default();
        weights.half_saturation = 0.0;
        assert!(AdaptiveScorer::validated(weights.clone()).is_err());

        let scorer = AdaptiveScorer::new(weights);
        assert!(matches!(
            scorer.score(&fv(SAMPLE), &camera(), 24.0),
            Err(ScoringError::InvalidWeights(_))
        ));

        let mut weights = ScoringWeights::default();
        weights.rules.push(RiskRule::new("bad", &[17], 1.0, 1.0));
        assert!(weights.validate().is_err());

        let mut weights = ScoringWeights::default();
        weights.multipliers.intersection = 0.9;
        assert!(weights.validate().is_err());

        let mut weights = ScoringWeights::default();
        weights.density_weight = f64::NAN;
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_load_partial_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, r#"{"half_saturation": 20.0, "density_weight": 1.0}"#).unwrap();

        let weights = ScoringWeights::load(&path).unwrap();
        assert_eq!(weights.half_saturation, 20.0);
        assert_eq!(weights.rules.len(), 9);

        std::fs::write(&path, r#"{"half_saturation": -1}"#).unwrap();
        assert!(ScoringWeights::load(&path).is_err());
    }
}
