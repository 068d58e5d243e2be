//! Deterministic placement classifier.
//!
//! For one catalog entry the classifier produces at most one recommendation,
//! in a fixed order: temperature rule, predictor override, provider
//! constraint, economic filter, rationale. Pure and idempotent for a fixed
//! input and model.

use crate::cost::CostModel;
use crate::features::FeatureVector;
use crate::predictor::AccessPredictor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stratus_core::{
    CatalogEntry, Rationale, RationaleTag, Recommendation, RecommendationPriority, Tier,
};

const GIB: u64 = 1 << 30;

/// Classifier thresholds. Comparisons in the warm direction are strict, so
/// an object exactly at a threshold lands on the colder side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum monthly savings for a recommendation to surface.
    pub min_savings_threshold: f64,

    /// Rolling access window, in days.
    pub access_window_days: u32,

    /// Accesses in the window above which an object is hot.
    pub hot_access_count: u64,

    /// Recency bound for the small-hot rule, in days.
    pub hot_recency_days: f64,

    /// Size bound for the small-hot rule.
    pub hot_max_size_bytes: u64,

    /// Age beyond which an untouched object is archival, in days.
    pub archive_age_days: f64,

    /// Idle bound for the large-cold rule, in days.
    pub cold_idle_days: f64,

    /// Size bound for the large-cold rule.
    pub cold_min_size_bytes: u64,

    /// Predicted accesses below which the predictor considers an object
    /// merely warm rather than hot.
    pub predictor_warm_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_savings_threshold: 0.01,
            access_window_days: 30,
            hot_access_count: 100,
            hot_recency_days: 7.0,
            hot_max_size_bytes: GIB,
            archive_age_days: 365.0,
            cold_idle_days: 30.0,
            cold_min_size_bytes: 10 * GIB,
            predictor_warm_threshold: 10.0,
        }
    }
}

/// Rules plus predictor plus cost model.
pub struct PlacementClassifier {
    config: ClassifierConfig,
    cost: CostModel,
    predictor: Arc<AccessPredictor>,
}

impl PlacementClassifier {
    pub fn new(config: ClassifierConfig, cost: CostModel, predictor: Arc<AccessPredictor>) -> Self {
        Self {
            config,
            cost,
            predictor,
        }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Classify one entry. Returns `None` when the object is already placed
    /// well or the savings do not clear the threshold.
    pub fn classify(&self, entry: &CatalogEntry, now: DateTime<Utc>) -> Option<Recommendation> {
        let (rule_temp, rule_tag) = self.temperature_rule(entry, now);

        // Predictor override: adopt the model's temperature when it crosses
        // a threshold the rules did not.
        let (temperature, tag, confidence) = match self
            .predictor
            .predict(&FeatureVector::from_entry(entry, now))
        {
            Some(predicted) => {
                let (predicted_temp, threshold) = self.predictor_temperature(predicted);
                if predicted_temp != rule_temp {
                    let tag = if predicted_temp < rule_temp {
                        RationaleTag::PredictorPromoted
                    } else {
                        RationaleTag::PredictorDemoted
                    };
                    (
                        predicted_temp,
                        tag,
                        threshold_confidence(predicted, threshold),
                    )
                } else {
                    (rule_temp, rule_tag, 0.7)
                }
            }
            None => (rule_temp, rule_tag, 0.7),
        };

        // Round to the coldest tier the provider supports.
        let provider = entry.object.provider;
        let rounded = temperature.clamp_to_provider(provider);
        let tag = if rounded != temperature {
            RationaleTag::ProviderRounded
        } else {
            tag
        };

        if rounded == entry.current_tier {
            return None;
        }

        let savings = self.cost.monthly_savings(
            provider,
            entry.current_tier,
            rounded,
            entry.object.size_bytes,
        );
        if savings < self.config.min_savings_threshold {
            return None;
        }

        let priority = if savings >= 10.0 * self.config.min_savings_threshold {
            RecommendationPriority::High
        } else if savings >= 3.0 * self.config.min_savings_threshold {
            RecommendationPriority::Medium
        } else {
            RecommendationPriority::Low
        };

        Some(Recommendation {
            recommended_tier: rounded,
            monthly_savings: savings,
            priority,
            rationale: Rationale {
                tag,
                reason: self.reason(entry, tag, rounded, now),
            },
            confidence,
        })
    }

    /// Step A: rule temperature. Strict comparisons in the warm direction
    /// bias borderline objects colder, toward savings.
    fn temperature_rule(&self, entry: &CatalogEntry, now: DateTime<Utc>) -> (Tier, RationaleTag) {
        let cfg = &self.config;
        let object = &entry.object;
        let access = entry.access.access_count_window;
        let age = stratus_core::AccessStats::age_days(object.last_modified, now);
        let idle = entry.access.days_since_last_access(object.last_modified, now);

        if access > cfg.hot_access_count
            || (idle < cfg.hot_recency_days && object.size_bytes < cfg.hot_max_size_bytes)
        {
            (Tier::Hot, RationaleTag::AccessRule)
        } else if age > cfg.archive_age_days && access == 0 {
            (Tier::Archive, RationaleTag::AgeRule)
        } else if idle > cfg.cold_idle_days && object.size_bytes > cfg.cold_min_size_bytes {
            (Tier::Cold, RationaleTag::IdleRule)
        } else {
            (Tier::Warm, RationaleTag::DefaultWarm)
        }
    }

    /// Map a predicted access count onto a temperature, returning the
    /// threshold that bounds the chosen band.
    fn predictor_temperature(&self, predicted: f64) -> (Tier, f64) {
        let hot = self.config.hot_access_count as f64;
        let warm = self.config.predictor_warm_threshold;
        if predicted > hot {
            (Tier::Hot, hot)
        } else if predicted > warm {
            (Tier::Warm, warm)
        } else if predicted >= 1.0 {
            (Tier::Cold, 1.0)
        } else {
            (Tier::Archive, 1.0)
        }
    }

    fn reason(
        &self,
        entry: &CatalogEntry,
        tag: RationaleTag,
        recommended: Tier,
        now: DateTime<Utc>,
    ) -> String {
        let access = entry.access.access_count_window;
        let age = stratus_core::AccessStats::age_days(entry.object.last_modified, now) as u64;
        match tag {
            RationaleTag::AccessRule => format!(
                "{} accesses in the last {} days keep this object hot",
                access, self.config.access_window_days
            ),
            RationaleTag::AgeRule => format!(
                "untouched for {} days with no accesses in the window; archive to {}",
                age, recommended
            ),
            RationaleTag::IdleRule => format!(
                "large object idle beyond {} days; move to {}",
                self.config.cold_idle_days as u64, recommended
            ),
            RationaleTag::DefaultWarm => {
                format!("steady access pattern; {} is the economic fit", recommended)
            }
            RationaleTag::PredictorPromoted => {
                format!("predicted access rise; keep at {}", recommended)
            }
            RationaleTag::PredictorDemoted => {
                format!("predicted access drop; demote to {}", recommended)
            }
            RationaleTag::ProviderRounded => format!(
                "{} lacks a colder class; rounded to {}",
                entry.object.provider, recommended
            ),
        }
    }
}

/// Confidence grows monotonically with distance from the crossed threshold,
/// clamped to `[0.5, 0.95]`.
fn threshold_confidence(predicted: f64, threshold: f64) -> f64 {
    let distance = (predicted - threshold).abs() / threshold.max(1.0);
    (0.5 + 0.45 * distance.min(1.0)).clamp(0.5, 0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stratus_core::{AccessStats, ObjectRef, Provider};

    fn entry(
        provider: Provider,
        size_bytes: u64,
        age_days: i64,
        access_count: u64,
        current_tier: Tier,
    ) -> CatalogEntry {
        let last_modified = Utc::now() - Duration::days(age_days);
        CatalogEntry {
            object: ObjectRef {
                provider,
                container: "bucket".to_string(),
                key: "data.bin".to_string(),
                size_bytes,
                last_modified,
                provider_storage_class: current_tier
                    .storage_class(provider)
                    .unwrap()
                    .to_string(),
                etag: None,
            },
            access: AccessStats {
                access_count_window: access_count,
                last_access_at: None,
            },
            current_tier,
            recommendation: None,
        }
    }

    fn rules_only() -> PlacementClassifier {
        PlacementClassifier::new(
            ClassifierConfig::default(),
            CostModel::default(),
            Arc::new(AccessPredictor::disabled()),
        )
    }

    #[test]
    fn test_old_untouched_object_recommends_archive() {
        let classifier = rules_only();
        let e = entry(Provider::Aws, 20 * GIB, 400, 0, Tier::Hot);
        let rec = classifier.classify(&e, Utc::now()).expect("recommendation");

        assert_eq!(rec.recommended_tier, Tier::Archive);
        assert_eq!(rec.rationale.tag, RationaleTag::AgeRule);
        assert_eq!(rec.priority, RecommendationPriority::High);
        assert_eq!(rec.confidence, 0.7);
        assert!(rec.monthly_savings > 0.0);
    }

    #[test]
    fn test_large_idle_object_recommends_cold() {
        let classifier = rules_only();
        let e = entry(Provider::Aws, 20 * GIB, 180, 0, Tier::Hot);
        let rec = classifier.classify(&e, Utc::now()).expect("recommendation");
        assert_eq!(rec.recommended_tier, Tier::Cold);
        assert_eq!(rec.rationale.tag, RationaleTag::IdleRule);
    }

    #[test]
    fn test_access_exactly_at_threshold_stays_colder() {
        let classifier = rules_only();
        // Exactly 100 accesses: the hot rule requires strictly more.
        let e = entry(Provider::Aws, 20 * GIB, 60, 100, Tier::Hot);
        let rec = classifier.classify(&e, Utc::now()).expect("recommendation");
        assert_ne!(rec.recommended_tier, Tier::Hot);
    }

    #[test]
    fn test_no_recommendation_when_already_placed() {
        let classifier = rules_only();
        let e = entry(Provider::Aws, 20 * GIB, 400, 0, Tier::Archive);
        assert!(classifier.classify(&e, Utc::now()).is_none());
    }

    #[test]
    fn test_no_recommendation_below_savings_threshold() {
        let classifier = rules_only();
        // A tiny object saves fractions of a cent.
        let e = entry(Provider::Aws, 1024, 400, 0, Tier::Hot);
        assert!(classifier.classify(&e, Utc::now()).is_none());
    }

    #[test]
    fn test_predictor_demotes_with_confidence() {
        // Model always predicts zero accesses next window.
        let predictor = Arc::new(AccessPredictor::with_weights([0.0; 15], 0.0));
        let classifier = PlacementClassifier::new(
            ClassifierConfig::default(),
            CostModel::default(),
            predictor,
        );
        // Rules say warm (moderate age, small-ish, some access).
        let e = entry(Provider::Aws, 5 * GIB, 60, 3, Tier::Hot);
        let rec = classifier.classify(&e, Utc::now()).expect("recommendation");

        assert_eq!(rec.recommended_tier, Tier::Archive);
        assert_eq!(rec.rationale.tag, RationaleTag::PredictorDemoted);
        assert!(rec.confidence >= 0.5 && rec.confidence <= 0.95);
    }

    #[test]
    fn test_classifier_is_pure() {
        let classifier = rules_only();
        let e = entry(Provider::Gcp, 20 * GIB, 400, 0, Tier::Hot);
        let now = Utc::now();
        let a = classifier.classify(&e, now);
        let b = classifier.classify(&e, now);
        assert_eq!(a, b);
    }
}
