//! Cloud provider tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported cloud storage provider.
///
/// `Ord` is derived so that cross-partition operations can take per-provider
/// locks in a fixed order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

impl Provider {
    /// All supported providers, in lock-acquisition order.
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    /// Lowercase wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" | "s3" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" | "gcs" => Ok(Provider::Gcp),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!("aws".parse::<Provider>().unwrap(), Provider::Aws);
        assert_eq!("GCS".parse::<Provider>().unwrap(), Provider::Gcp);
        assert!("ibm".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_ordering_is_stable() {
        let mut providers = vec![Provider::Gcp, Provider::Aws, Provider::Azure];
        providers.sort();
        assert_eq!(providers, Provider::ALL.to_vec());
    }
}
