//! Producers: resource-gathering operations, factories and artisans.
//!
//! All three share one daily shape: buy inputs through the market scaled
//! by workforce and modifiers, turn yesterday's stockpile into output, and
//! sell the output back. They differ in who owns the money and how revenue
//! is distributed.

pub mod artisan;
pub mod factory;
pub mod rgo;

pub use artisan::ArtisanProducer;
pub use factory::FactoryProducer;
pub use rgo::ResourceGatheringOperation;

use crate::defs::goods::GoodIndex;
use crate::defs::production::ProductionTypeDef;
use crate::fixed::Fixed;
use crate::indexed::FixedMap;
use crate::market::{BuyUpToOrder, MarketSellOrder};
use crate::scripts::PopRef;
use serde::{Deserialize, Serialize};

/// Orders a producer wants placed; the scheduler submits them so the
/// producer never has to reach into the market arena itself.
#[derive(Debug, Default)]
pub struct OrderBatch {
    pub buys: Vec<BuyUpToOrder>,
    pub sells: Vec<MarketSellOrder>,
}

impl OrderBatch {
    pub fn clear(&mut self) {
        self.buys.clear();
        self.sells.clear();
    }
}

/// Input/output/throughput factors for one producer, already folded from
/// the province and owner modifier sums (`1 + Σ contributions`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerEffects {
    pub input: Fixed,
    pub output: Fixed,
    pub throughput: Fixed,
}

impl Default for ProducerEffects {
    fn default() -> Self {
        Self {
            input: Fixed::ONE,
            output: Fixed::ONE,
            throughput: Fixed::ONE,
        }
    }
}

/// One employed pop slice inside a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub pop: PopRef,
    pub size: i64,
    /// Index into the production type's employee job list.
    pub job: u32,
}

/// Workforce utilisation: employed headcount over the recipe's base
/// workforce, scaled by the producer's size multiplier.
pub fn scaled_workforce_share(
    employed_total: i64,
    base_workforce_size: i64,
    size_multiplier: Fixed,
) -> Fixed {
    if base_workforce_size <= 0 {
        return Fixed::ZERO;
    }
    Fixed::from_fraction(employed_total, base_workforce_size) * size_multiplier
}

/// Input quantities to order for tomorrow: recipe inputs scaled by
/// workforce share and the input·throughput factor.
pub fn desired_inputs(
    production_type: &ProductionTypeDef,
    workforce_share: Fixed,
    effects: ProducerEffects,
) -> FixedMap<GoodIndex> {
    let scale = workforce_share * effects.input * effects.throughput;
    production_type
        .input_goods
        .iter()
        .map(|(good, amount)| (good, amount * scale))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionRun {
    /// How many recipe-multiples of inputs were consumed.
    pub recipe_multiple: Fixed,
    /// Output quantity to sell.
    pub quantity: Fixed,
    /// An input good was entirely absent from the stockpile.
    pub missing_input: bool,
}

/// Turn stockpile into output. Recipes without inputs produce at the
/// workforce share directly; recipes with inputs produce at the smallest
/// stockpile-to-requirement ratio, zero when any input is missing.
pub fn run_production(
    production_type: &ProductionTypeDef,
    stockpile: &FixedMap<GoodIndex>,
    workforce_share: Fixed,
    effects: ProducerEffects,
    bonus_multiplier: Fixed,
) -> ProductionRun {
    let inputs = &production_type.input_goods;
    let mut missing_input = false;

    let recipe_multiple = if inputs.is_empty() {
        workforce_share
    } else {
        let mut multiple = Fixed::USABLE_MAX;
        for (good, amount) in inputs.iter() {
            if amount <= Fixed::ZERO {
                continue;
            }
            let held = stockpile.get(good);
            if held == Fixed::ZERO {
                missing_input = true;
                multiple = Fixed::ZERO;
                break;
            }
            multiple = multiple.min(held / amount);
        }
        multiple
    };

    let quantity = recipe_multiple
        * production_type.base_output_quantity
        * effects.output
        * effects.throughput
        * bonus_multiplier;

    ProductionRun {
        recipe_multiple,
        quantity,
        missing_input,
    }
}

/// Remove the consumed recipe-multiples of every input from the stockpile.
pub fn consume_inputs(
    stockpile: &mut FixedMap<GoodIndex>,
    production_type: &ProductionTypeDef,
    recipe_multiple: Fixed,
) {
    if recipe_multiple == Fixed::ZERO {
        return;
    }
    for (good, amount) in production_type.input_goods.iter() {
        let consumed = amount * recipe_multiple;
        let held = stockpile.get(good);
        stockpile.set(good, (held - consumed).max(Fixed::ZERO));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::production::ProducerKind;

    fn recipe(inputs: &[(u32, i64)], base_output: i64) -> ProductionTypeDef {
        ProductionTypeDef {
            identifier: "test_recipe".to_string(),
            kind: ProducerKind::Artisan,
            owner: None,
            employees: vec![],
            base_workforce_size: 10_000,
            input_goods: inputs
                .iter()
                .map(|(good, amount)| (GoodIndex(*good), Fixed::from_int(*amount)))
                .collect(),
            output_good: GoodIndex(99),
            base_output_quantity: Fixed::from_int(base_output),
            maintenance_requirements: FixedMap::new(),
            bonuses: vec![],
            farm: false,
            mine: false,
            coastal: false,
        }
    }

    #[test]
    fn workforce_share_scales_with_size_multiplier() {
        let share = scaled_workforce_share(5_000, 10_000, Fixed::from_int(2));
        assert_eq!(share, Fixed::ONE);
        assert_eq!(scaled_workforce_share(0, 10_000, Fixed::ONE), Fixed::ZERO);
        assert_eq!(scaled_workforce_share(100, 0, Fixed::ONE), Fixed::ZERO);
    }

    #[test]
    fn no_input_recipe_produces_at_workforce_share() {
        let recipe = recipe(&[], 4);
        let run = run_production(
            &recipe,
            &FixedMap::new(),
            Fixed::HALF,
            ProducerEffects::default(),
            Fixed::ONE,
        );
        assert_eq!(run.quantity, Fixed::from_int(2));
        assert!(!run.missing_input);
    }

    #[test]
    fn production_is_limited_by_scarcest_input() {
        let recipe = recipe(&[(0, 2), (1, 1)], 10);
        let mut stockpile = FixedMap::new();
        stockpile.set(GoodIndex(0), Fixed::from_int(4)); // 2 multiples
        stockpile.set(GoodIndex(1), Fixed::from_int(1)); // 1 multiple
        let run = run_production(
            &recipe,
            &stockpile,
            Fixed::ONE,
            ProducerEffects::default(),
            Fixed::ONE,
        );
        assert_eq!(run.recipe_multiple, Fixed::ONE);
        assert_eq!(run.quantity, Fixed::from_int(10));
    }

    #[test]
    fn missing_input_stops_production() {
        let recipe = recipe(&[(0, 2), (1, 1)], 10);
        let mut stockpile = FixedMap::new();
        stockpile.set(GoodIndex(0), Fixed::from_int(4));
        let run = run_production(
            &recipe,
            &stockpile,
            Fixed::ONE,
            ProducerEffects::default(),
            Fixed::ONE,
        );
        assert!(run.missing_input);
        assert_eq!(run.quantity, Fixed::ZERO);
    }

    #[test]
    fn effects_and_bonuses_scale_output() {
        let recipe = recipe(&[], 10);
        let effects = ProducerEffects {
            input: Fixed::ONE,
            output: Fixed::ONE + Fixed::from_fraction(1, 2),
            throughput: Fixed::from_int(2),
        };
        let run = run_production(
            &recipe,
            &FixedMap::new(),
            Fixed::ONE,
            effects,
            Fixed::ONE + Fixed::from_fraction(1, 4),
        );
        // 10 · 1.5 · 2 · 1.25 = 37.5
        assert_eq!(run.quantity, Fixed::from_fraction(75, 2));
    }

    #[test]
    fn consume_inputs_drains_stockpile() {
        let recipe = recipe(&[(0, 2), (1, 1)], 10);
        let mut stockpile = FixedMap::new();
        stockpile.set(GoodIndex(0), Fixed::from_int(4));
        stockpile.set(GoodIndex(1), Fixed::from_int(3));
        consume_inputs(&mut stockpile, &recipe, Fixed::ONE);
        assert_eq!(stockpile.get(GoodIndex(0)), Fixed::from_int(2));
        assert_eq!(stockpile.get(GoodIndex(1)), Fixed::from_int(2));
    }

    #[test]
    fn desired_inputs_scale_with_share_and_effects() {
        let recipe = recipe(&[(0, 4)], 10);
        let effects = ProducerEffects {
            input: Fixed::HALF,
            output: Fixed::ONE,
            throughput: Fixed::from_int(2),
        };
        let desired = desired_inputs(&recipe, Fixed::HALF, effects);
        // 4 · 0.5 share · (0.5 · 2) = 2
        assert_eq!(desired.get(GoodIndex(0)), Fixed::from_int(2));
    }
}
