//! Object identity, access statistics, and placement recommendations.

use crate::provider::Provider;
use crate::tier::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary identity of a stored object: `(provider, container, key)`.
///
/// Two entries with the same triple refer to the same underlying object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub provider: Provider,
    pub container: String,
    pub key: String,
}

impl ObjectKey {
    pub fn new(provider: Provider, container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            provider,
            container: container.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.provider, self.container, self.key)
    }
}

/// Identity and provider-reported metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub provider: Provider,

    /// Bucket / blob container name.
    pub container: String,

    /// Provider-relative path.
    pub key: String,

    pub size_bytes: u64,

    /// Provider-reported modification timestamp.
    pub last_modified: DateTime<Utc>,

    /// Free-form storage class string from the provider.
    pub provider_storage_class: String,

    /// Opaque entity tag, when the provider reports one.
    pub etag: Option<String>,
}

impl ObjectRef {
    /// The `(provider, container, key)` identity of this object.
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(self.provider, self.container.clone(), self.key.clone())
    }

    /// Tier derived from the provider storage class.
    pub fn tier(&self) -> Tier {
        Tier::from_storage_class(self.provider, &self.provider_storage_class)
    }
}

/// Per-object access statistics over a rolling window.
///
/// Reported by the provider, inferred, or zeroed when unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessStats {
    /// Reads observed in the rolling window.
    pub access_count_window: u64,

    /// Last observed read, if any.
    pub last_access_at: Option<DateTime<Utc>>,
}

impl AccessStats {
    /// Days since the object was last modified.
    pub fn age_days(last_modified: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        (now - last_modified).num_seconds().max(0) as f64 / 86_400.0
    }

    /// Days since last access; falls back to object age when never accessed.
    pub fn days_since_last_access(&self, last_modified: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        match self.last_access_at {
            Some(at) => (now - at).num_seconds().max(0) as f64 / 86_400.0,
            None => Self::age_days(last_modified, now),
        }
    }
}

/// Priority of a placement recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

/// Machine tag identifying which classifier rule produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RationaleTag {
    /// High access count or recent small-object access.
    AccessRule,
    /// Old and never accessed in the window.
    AgeRule,
    /// Large and idle.
    IdleRule,
    /// No rule fired; default temperature.
    DefaultWarm,
    /// Predictor moved the object warmer than the rules.
    PredictorPromoted,
    /// Predictor moved the object colder than the rules.
    PredictorDemoted,
    /// Temperature rounded to the coldest tier the provider supports.
    ProviderRounded,
}

/// Why a recommendation was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    pub tag: RationaleTag,
    pub reason: String,
}

/// A tier move worth making.
///
/// Only surfaced when `recommended_tier` differs from the current tier and
/// the monthly savings clear the configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_tier: Tier,

    /// Non-negative monthly savings, in the cost table's currency.
    pub monthly_savings: f64,

    pub priority: RecommendationPriority,

    pub rationale: Rationale,

    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A catalog's view of one object: identity, stats, tier, recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub object: ObjectRef,

    pub access: AccessStats,

    pub current_tier: Tier,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl CatalogEntry {
    /// Build an entry from a provider-reported object, zeroing access stats.
    pub fn from_object(object: ObjectRef) -> Self {
        let current_tier = object.tier();
        Self {
            object,
            access: AccessStats::default(),
            current_tier,
            recommendation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_object() -> ObjectRef {
        ObjectRef {
            provider: Provider::Aws,
            container: "bucket-a".to_string(),
            key: "report.pdf".to_string(),
            size_bytes: 1_048_576,
            last_modified: Utc::now() - Duration::days(10),
            provider_storage_class: "STANDARD".to_string(),
            etag: Some("abc123".to_string()),
        }
    }

    #[test]
    fn test_object_key_identity() {
        let a = sample_object().object_key();
        let b = sample_object().object_key();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "aws://bucket-a/report.pdf");
    }

    #[test]
    fn test_entry_from_object_derives_tier() {
        let entry = CatalogEntry::from_object(sample_object());
        assert_eq!(entry.current_tier, Tier::Hot);
        assert_eq!(entry.access.access_count_window, 0);
        assert!(entry.recommendation.is_none());
    }

    #[test]
    fn test_days_since_last_access_falls_back_to_age() {
        let now = Utc::now();
        let modified = now - Duration::days(40);
        let stats = AccessStats::default();
        let days = stats.days_since_last_access(modified, now);
        assert!((days - 40.0).abs() < 0.1);
    }
}
