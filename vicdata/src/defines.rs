//! Tunable constants a mod can override.
//!
//! Values are plain `f64`/`i64` here; the simulation converts them to
//! fixed-point once at load. Defaults follow the base 1836 setup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defines {
    pub pops: PopsDefines,
    pub economy: EconomyDefines,
    pub military: MilitaryDefines,
}

impl Default for Defines {
    fn default() -> Self {
        Self {
            pops: PopsDefines::default(),
            economy: EconomyDefines::default(),
            military: MilitaryDefines::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopsDefines {
    /// Consciousness divisor in the needs scalar `1 + 2*CON / base_con`.
    pub base_con: f64,
    /// Divisor applied to `base_amount * needs_scalar` when computing the
    /// desired quantity of a needs good.
    pub needs_scalar_divisor: f64,
    /// Per-strata multipliers on life/everyday/luxury need quantities,
    /// indexed poor/middle/rich.
    pub life_need_scalar: [f64; 3],
    pub everyday_need_scalar: [f64; 3],
    pub luxury_need_scalar: [f64; 3],
}

impl Default for PopsDefines {
    fn default() -> Self {
        Self {
            base_con: 20.0,
            needs_scalar_divisor: 200_000.0,
            life_need_scalar: [1.0, 1.0, 1.0],
            everyday_need_scalar: [1.0, 1.6, 2.0],
            luxury_need_scalar: [1.0, 2.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyDefines {
    /// Number of consecutive loss-making days after which a factory may be
    /// closed by an event.
    pub factory_unprofitable_days_limit: u32,
    /// Fraction of a pop's cash an artisan may commit to input purchases.
    pub artisanal_spending_fraction: f64,
    /// Share of producer revenue paid to the owner job before the wage
    /// pool.
    pub rgo_owner_share: f64,
    /// Flat daily factory wage per employed head.
    pub factory_daily_wage_per_worker: f64,
}

impl Default for EconomyDefines {
    fn default() -> Self {
        Self {
            factory_unprofitable_days_limit: 10,
            artisanal_spending_fraction: 0.25,
            rgo_owner_share: 0.5,
            factory_daily_wage_per_worker: 0.001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MilitaryDefines {
    /// Pops below this size support no regiments at all.
    pub min_pop_size_for_regiment: i64,
    /// Pop size backing one regiment, before the per-world multiplier.
    pub pop_size_per_regiment: i64,
    /// World-level multiplier on `pop_size_per_regiment`.
    pub pop_size_per_regiment_multiplier: f64,
}

impl Default for MilitaryDefines {
    fn default() -> Self {
        Self {
            min_pop_size_for_regiment: 1000,
            pop_size_per_regiment: 10_000,
            pop_size_per_regiment_multiplier: 1.0,
        }
    }
}
