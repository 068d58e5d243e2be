//! Storage temperature tiers and provider storage-class mapping.

use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage temperature tier.
///
/// Ordered by retrieval latency: `Hot < Warm < Cold < Archive`. Unit storage
/// cost runs the other way.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
    Archive,
}

impl Tier {
    /// All tiers, warmest first.
    pub const ALL: [Tier; 4] = [Tier::Hot, Tier::Warm, Tier::Cold, Tier::Archive];

    /// Wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "HOT",
            Tier::Warm => "WARM",
            Tier::Cold => "COLD",
            Tier::Archive => "ARCHIVE",
        }
    }

    /// Derive a tier from a provider-reported storage class string.
    ///
    /// Unknown classes map to `Hot`: providers report their default class
    /// for objects that were never transitioned.
    pub fn from_storage_class(provider: Provider, class: &str) -> Tier {
        let class = class.to_ascii_uppercase();
        match provider {
            Provider::Aws => match class.as_str() {
                "STANDARD" | "EXPRESS_ONEZONE" => Tier::Hot,
                "STANDARD_IA" | "ONEZONE_IA" | "INTELLIGENT_TIERING" => Tier::Warm,
                "GLACIER_IR" => Tier::Cold,
                "GLACIER" | "DEEP_ARCHIVE" => Tier::Archive,
                _ => Tier::Hot,
            },
            Provider::Azure => match class.as_str() {
                "HOT" => Tier::Hot,
                "COOL" => Tier::Warm,
                "COLD" => Tier::Cold,
                "ARCHIVE" => Tier::Archive,
                _ => Tier::Hot,
            },
            Provider::Gcp => match class.as_str() {
                "STANDARD" => Tier::Hot,
                "NEARLINE" => Tier::Warm,
                "COLDLINE" => Tier::Cold,
                "ARCHIVE" => Tier::Archive,
                _ => Tier::Hot,
            },
        }
    }

    /// The provider storage class implementing this tier, or `None` when the
    /// provider has no equivalent class. Every provider maps `Hot`.
    pub fn storage_class(&self, provider: Provider) -> Option<&'static str> {
        match provider {
            Provider::Aws => match self {
                Tier::Hot => Some("STANDARD"),
                Tier::Warm => Some("STANDARD_IA"),
                Tier::Cold => Some("GLACIER_IR"),
                Tier::Archive => Some("DEEP_ARCHIVE"),
            },
            Provider::Azure => match self {
                Tier::Hot => Some("HOT"),
                Tier::Warm => Some("COOL"),
                Tier::Cold => Some("COLD"),
                Tier::Archive => Some("ARCHIVE"),
            },
            Provider::Gcp => match self {
                Tier::Hot => Some("STANDARD"),
                Tier::Warm => Some("NEARLINE"),
                Tier::Cold => Some("COLDLINE"),
                Tier::Archive => Some("ARCHIVE"),
            },
        }
    }

    /// The coldest tier the provider maps a storage class for.
    ///
    /// All three current providers map an archive class, so this resolves to
    /// `Archive` today; a provider lacking one rounds to the next coldest
    /// mapped tier.
    pub fn coldest_supported(provider: Provider) -> Tier {
        Self::coldest_of(|tier| tier.storage_class(provider).is_some())
    }

    /// Coldest tier satisfying a support predicate. `Hot` is the floor:
    /// every provider maps its default class.
    fn coldest_of(supported: impl Fn(Tier) -> bool) -> Tier {
        Tier::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| supported(*tier))
            .unwrap_or(Tier::Hot)
    }

    /// Clamp this tier to what the provider supports.
    pub fn clamp_to_provider(&self, provider: Provider) -> Tier {
        (*self).min(Tier::coldest_supported(provider))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Hot < Tier::Warm);
        assert!(Tier::Cold < Tier::Archive);
    }

    #[test]
    fn test_storage_class_round_trip() {
        for provider in Provider::ALL {
            for tier in Tier::ALL {
                let class = tier.storage_class(provider).expect("mapped class");
                assert_eq!(Tier::from_storage_class(provider, class), tier);
            }
        }
    }

    #[test]
    fn test_unknown_class_defaults_hot() {
        assert_eq!(Tier::from_storage_class(Provider::Aws, "REDUCED_REDUNDANCY"), Tier::Hot);
    }

    #[test]
    fn test_rounding_skips_unmapped_tiers() {
        // A provider without an archive-equivalent class rounds to the next
        // coldest mapped tier.
        assert_eq!(Tier::coldest_of(|tier| tier != Tier::Archive), Tier::Cold);
        assert_eq!(
            Tier::coldest_of(|tier| !matches!(tier, Tier::Archive | Tier::Cold)),
            Tier::Warm
        );
        // Hot is the floor even for an empty mapping.
        assert_eq!(Tier::coldest_of(|_| false), Tier::Hot);
    }

    #[test]
    fn test_all_current_providers_map_archive() {
        for provider in Provider::ALL {
            assert_eq!(Tier::coldest_supported(provider), Tier::Archive);
            // With a full mapping the provider clamp changes nothing.
            assert_eq!(Tier::Archive.clamp_to_provider(provider), Tier::Archive);
        }
    }
}
