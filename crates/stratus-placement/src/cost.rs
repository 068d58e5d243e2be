//! Per-tier, per-provider storage prices and savings arithmetic.
//!
//! Prices are configuration, not code: the defaults below are a starting
//! point overridden by deployment config.

use serde::{Deserialize, Serialize};
use stratus_core::{Provider, Tier};

const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Unit prices per GB-month for one provider's four tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierPrices {
    pub hot: f64,
    pub warm: f64,
    pub cold: f64,
    pub archive: f64,
}

impl TierPrices {
    pub fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Hot => self.hot,
            Tier::Warm => self.warm,
            Tier::Cold => self.cold,
            Tier::Archive => self.archive,
        }
    }
}

/// `(provider, tier) -> unit price` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    pub aws: TierPrices,
    pub azure: TierPrices,
    pub gcp: TierPrices,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            aws: TierPrices {
                hot: 0.023,
                warm: 0.0125,
                cold: 0.004,
                archive: 0.00099,
            },
            azure: TierPrices {
                hot: 0.0184,
                warm: 0.01,
                cold: 0.0045,
                archive: 0.00099,
            },
            gcp: TierPrices {
                hot: 0.02,
                warm: 0.01,
                cold: 0.004,
                archive: 0.0012,
            },
        }
    }
}

impl PriceTable {
    pub fn price(&self, provider: Provider, tier: Tier) -> f64 {
        match provider {
            Provider::Aws => self.aws.get(tier),
            Provider::Azure => self.azure.get(tier),
            Provider::Gcp => self.gcp.get(tier),
        }
    }
}

/// Savings arithmetic over the price table.
#[derive(Debug, Clone)]
pub struct CostModel {
    table: PriceTable,
}

impl CostModel {
    pub fn new(table: PriceTable) -> Self {
        Self { table }
    }

    /// Monthly storage cost of `size_bytes` at `(provider, tier)`.
    pub fn monthly_cost(&self, provider: Provider, tier: Tier, size_bytes: u64) -> f64 {
        (size_bytes as f64 / BYTES_PER_GB) * self.table.price(provider, tier)
    }

    /// `max(0, current - recommended)` monthly savings of a tier move.
    pub fn monthly_savings(
        &self,
        provider: Provider,
        current: Tier,
        recommended: Tier,
        size_bytes: u64,
    ) -> f64 {
        let current_cost = self.monthly_cost(provider, current, size_bytes);
        let recommended_cost = self.monthly_cost(provider, recommended, size_bytes);
        (current_cost - recommended_cost).max(0.0)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(PriceTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1 << 30;

    #[test]
    fn test_monthly_cost() {
        let model = CostModel::default();
        let cost = model.monthly_cost(Provider::Aws, Tier::Hot, 10 * GIB);
        assert!((cost - 0.23).abs() < 1e-9);
    }

    #[test]
    fn test_savings_never_negative() {
        let model = CostModel::default();
        let savings = model.monthly_savings(Provider::Aws, Tier::Archive, Tier::Hot, GIB);
        assert_eq!(savings, 0.0);
    }

    #[test]
    fn test_savings_hot_to_archive() {
        let model = CostModel::default();
        let savings = model.monthly_savings(Provider::Aws, Tier::Hot, Tier::Archive, 20 * GIB);
        assert!((savings - 20.0 * (0.023 - 0.00099)).abs() < 1e-9);
    }
}
