//! Simulation configuration.

use serde::{Deserialize, Serialize};

/// Order in which the modifier-refresh phase rebuilds its caches. Both
/// orders must produce bitwise-identical sums; the toggle exists so tests
/// can prove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModifierBuildOrder {
    #[default]
    ProvincesThenCountries,
    CountriesThenProvinces,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Exponential price band (`price ± price/64`) instead of the legacy
    /// flat-step band.
    pub exponential_price_changes: bool,
    pub modifier_build_order: ModifierBuildOrder,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            exponential_price_changes: false,
            modifier_build_order: ModifierBuildOrder::ProvincesThenCountries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert!(!config.exponential_price_changes);
        assert_eq!(
            config.modifier_build_order,
            ModifierBuildOrder::ProvincesThenCountries
        );
    }
}
