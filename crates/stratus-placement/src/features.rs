//! Fixed feature schema for the access predictor.
//!
//! Feature order is part of the model contract: a trained artifact's weights
//! line up positionally with [`FeatureVector`].

use chrono::{DateTime, Datelike, Timelike, Utc};
use stratus_core::{CatalogEntry, Provider};

/// Dimensionality of the feature vector:
/// 4 scalars + 6 content-hint one-hots + weekday + hour + 3 provider one-hots.
pub const FEATURE_DIM: usize = 15;

/// Content-type hint derived from the object key's extension. A small closed
/// set; anything unrecognized is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentHint {
    Text,
    Image,
    Media,
    Archive,
    Data,
    Other,
}

impl ContentHint {
    pub fn from_key(key: &str) -> Self {
        let ext = key.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" | "csv" | "json" | "xml" | "html" | "log" | "yaml" | "yml" => {
                ContentHint::Text
            }
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" | "webp" | "svg" => ContentHint::Image,
            "mp4" | "mov" | "avi" | "mkv" | "mp3" | "wav" | "flac" => ContentHint::Media,
            "zip" | "tar" | "gz" | "bz2" | "xz" | "7z" | "rar" => ContentHint::Archive,
            "parquet" | "avro" | "orc" | "db" | "sqlite" | "bin" | "bak" => ContentHint::Data,
            _ => ContentHint::Other,
        }
    }

    fn one_hot_index(&self) -> usize {
        match self {
            ContentHint::Text => 0,
            ContentHint::Image => 1,
            ContentHint::Media => 2,
            ContentHint::Archive => 3,
            ContentHint::Data => 4,
            ContentHint::Other => 5,
        }
    }
}

/// A fixed-order feature vector for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_DIM]);

impl FeatureVector {
    /// Build features from a catalog entry. Pure: identical inputs yield
    /// identical vectors.
    pub fn from_entry(entry: &CatalogEntry, now: DateTime<Utc>) -> Self {
        let mut features = [0.0f64; FEATURE_DIM];

        let object = &entry.object;
        let access = &entry.access;

        features[0] = (object.size_bytes as f64 + 1.0).ln();
        features[1] = stratus_core::AccessStats::age_days(object.last_modified, now);
        features[2] = access.days_since_last_access(object.last_modified, now);
        features[3] = access.access_count_window as f64;

        features[4 + ContentHint::from_key(&object.key).one_hot_index()] = 1.0;

        // Weekday/hour come from the last access, falling back to the last
        // modification for never-accessed objects.
        let reference = access.last_access_at.unwrap_or(object.last_modified);
        features[10] = reference.weekday().num_days_from_monday() as f64;
        features[11] = reference.hour() as f64;

        let provider_index = match object.provider {
            Provider::Aws => 0,
            Provider::Azure => 1,
            Provider::Gcp => 2,
        };
        features[12 + provider_index] = 1.0;

        Self(features)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
