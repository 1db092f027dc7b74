//! Artisanal producers, one per artisan pop.
//!
//! The artisan works for itself: it picks a recipe deterministically,
//! spends a capped slice of its pop's cash on inputs, and its leftover
//! output first feeds the pop's own needs before going to market.

use crate::defs::goods::GoodIndex;
use crate::defs::production::{ProductionTypeDef, ProductionTypeIndex};
use crate::fixed::Fixed;
use crate::indexed::FixedMap;
use crate::market::{BuyUpToOrder, OrderActor, SellResult};
use crate::production::{consume_inputs, desired_inputs, run_production, OrderBatch, ProducerEffects};
use crate::scripts::PopRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtisanProducer {
    pub production_type: Option<ProductionTypeIndex>,
    /// Cursor into the unlocked-recipe list; advances round-robin daily.
    recipe_cursor: Option<usize>,
    pub stockpile: FixedMap<GoodIndex>,
    pub current_production: Fixed,
    pub current_needs: FixedMap<GoodIndex>,
    pub last_produced_good: Option<GoodIndex>,
    /// Money actually spent on inputs yesterday; sale revenue above this
    /// is the taxable part of artisanal income.
    pub costs_of_production: Fixed,
    costs_today: Fixed,
    pub cash_allocated_for_artisanal_spending: Fixed,
}

impl ArtisanProducer {
    pub fn new() -> Self {
        Self {
            production_type: None,
            recipe_cursor: None,
            stockpile: FixedMap::new(),
            current_production: Fixed::ZERO,
            current_needs: FixedMap::new(),
            last_produced_good: None,
            costs_of_production: Fixed::ZERO,
            costs_today: Fixed::ZERO,
            cash_allocated_for_artisanal_spending: Fixed::ZERO,
        }
    }

    /// Advance the recipe cursor round-robin through `candidates`, keeping
    /// only recipes whose output good passes `output_available`. Returns
    /// the chosen recipe.
    pub fn select_recipe(
        &mut self,
        candidates: &[ProductionTypeIndex],
        output_available: impl Fn(ProductionTypeIndex) -> bool,
    ) -> Option<ProductionTypeIndex> {
        if candidates.is_empty() {
            self.production_type = None;
            self.recipe_cursor = None;
            return None;
        }
        let start = match self.recipe_cursor {
            Some(cursor) => (cursor + 1) % candidates.len(),
            None => 0,
        };
        for step in 0..candidates.len() {
            let cursor = (start + step) % candidates.len();
            let candidate = candidates[cursor];
            if output_available(candidate) {
                self.recipe_cursor = Some(cursor);
                self.production_type = Some(candidate);
                return Some(candidate);
            }
        }
        self.production_type = None;
        None
    }

    /// Daily production step, run from the pop tick before needs are
    /// computed. `cash_cap` is what the pop allows the artisan to commit;
    /// the return value is the money actually reserved for input orders.
    pub fn tick(
        &mut self,
        pop: PopRef,
        country: Option<crate::defs::politics::CountryIndex>,
        recipe: &ProductionTypeDef,
        effects: ProducerEffects,
        bonus_multiplier: Fixed,
        cash_cap: Fixed,
        price_of: impl Fn(GoodIndex) -> Fixed,
        batch: &mut OrderBatch,
    ) -> Fixed {
        self.costs_of_production = self.costs_today;
        self.costs_today = Fixed::ZERO;

        // The whole workforce is the pop itself; artisans always run their
        // recipe at unit scale.
        let run = run_production(recipe, &self.stockpile, Fixed::ONE, effects, bonus_multiplier);
        consume_inputs(&mut self.stockpile, recipe, run.recipe_multiple);
        self.current_production = run.quantity;
        if run.quantity > Fixed::ZERO {
            self.stockpile.add(recipe.output_good, run.quantity);
        }
        self.last_produced_good = Some(recipe.output_good);

        // Input orders for tomorrow out of the pop's cash allowance.
        let desired = desired_inputs(recipe, Fixed::ONE, effects);
        self.current_needs = desired.clone();
        let estimated_cost: Fixed = desired
            .iter()
            .map(|(good, quantity)| quantity * price_of(good))
            .sum();
        let allocated = estimated_cost.min(cash_cap).max(Fixed::ZERO);
        self.cash_allocated_for_artisanal_spending = allocated;
        if allocated <= Fixed::ZERO || estimated_cost <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        let scale = allocated / estimated_cost;
        for (good, quantity) in desired.iter() {
            if quantity <= Fixed::ZERO {
                continue;
            }
            let money = quantity * price_of(good) * scale;
            if money <= Fixed::ZERO {
                continue;
            }
            batch.buys.push(BuyUpToOrder {
                good,
                country,
                max_quantity: quantity,
                money_to_spend: money,
                actor: OrderActor::Artisan(pop),
            });
        }
        allocated
    }

    /// Unsold output of the current recipe available to feed the pop's own
    /// needs.
    pub fn consumable_output(&self, good: GoodIndex) -> Fixed {
        if self.last_produced_good == Some(good) {
            self.stockpile.get(good)
        } else {
            Fixed::ZERO
        }
    }

    /// Take output out of the stockpile for the pop's own consumption.
    pub fn consume_output(&mut self, good: GoodIndex, quantity: Fixed) {
        let held = self.stockpile.get(good);
        self.stockpile.set(good, (held - quantity).max(Fixed::ZERO));
    }

    /// Leftover goods to offer on the market after needs were fed: every
    /// stockpiled good the current recipe does not consume as an input.
    pub fn sellable_leftovers(&self, recipe: &ProductionTypeDef) -> Vec<(GoodIndex, Fixed)> {
        self.stockpile
            .iter()
            .filter(|(good, quantity)| {
                *quantity > Fixed::ZERO && !recipe.input_goods.contains_key(*good)
            })
            .collect()
    }

    /// Input purchase settled.
    pub fn on_inputs_bought(&mut self, good: GoodIndex, quantity: Fixed, money_spent: Fixed) {
        self.stockpile.add(good, quantity);
        self.costs_today += money_spent;
    }

    /// Sale settled; returns true when the revenue is taxable artisanal
    /// income (the sold good is the recipe's own output).
    pub fn on_sold(&mut self, result: SellResult) -> bool {
        let held = self.stockpile.get(result.good);
        self.stockpile
            .set(result.good, (held - result.quantity_sold).max(Fixed::ZERO));
        self.last_produced_good == Some(result.good)
    }
}

impl Default for ArtisanProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_selection_cycles_round_robin() {
        let mut artisan = ArtisanProducer::new();
        let candidates = [
            ProductionTypeIndex(0),
            ProductionTypeIndex(1),
            ProductionTypeIndex(2),
        ];
        // recipe 2's output is unavailable
        let available = |recipe: ProductionTypeIndex| recipe.0 != 2;

        assert_eq!(
            artisan.select_recipe(&candidates, available),
            Some(ProductionTypeIndex(0))
        );
        assert_eq!(
            artisan.select_recipe(&candidates, available),
            Some(ProductionTypeIndex(1))
        );
        // skips the unavailable recipe and wraps
        assert_eq!(
            artisan.select_recipe(&candidates, available),
            Some(ProductionTypeIndex(0))
        );
    }

    #[test]
    fn no_available_recipe_clears_selection() {
        let mut artisan = ArtisanProducer::new();
        let candidates = [ProductionTypeIndex(0)];
        assert_eq!(artisan.select_recipe(&candidates, |_| false), None);
        assert_eq!(artisan.production_type, None);
    }

    #[test]
    fn consumable_output_matches_last_produced_good_only() {
        let mut artisan = ArtisanProducer::new();
        artisan.stockpile.set(GoodIndex(1), Fixed::from_int(4));
        artisan.stockpile.set(GoodIndex(2), Fixed::from_int(9));
        artisan.last_produced_good = Some(GoodIndex(1));
        assert_eq!(artisan.consumable_output(GoodIndex(1)), Fixed::from_int(4));
        assert_eq!(artisan.consumable_output(GoodIndex(2)), Fixed::ZERO);

        artisan.consume_output(GoodIndex(1), Fixed::from_int(3));
        assert_eq!(artisan.consumable_output(GoodIndex(1)), Fixed::from_int(1));
    }

    #[test]
    fn sale_of_own_output_is_taxable() {
        let mut artisan = ArtisanProducer::new();
        artisan.stockpile.set(GoodIndex(1), Fixed::from_int(4));
        artisan.last_produced_good = Some(GoodIndex(1));
        let taxable = artisan.on_sold(SellResult {
            good: GoodIndex(1),
            quantity_sold: Fixed::from_int(4),
            money_gained: Fixed::from_int(8),
        });
        assert!(taxable);
        assert_eq!(artisan.stockpile.get(GoodIndex(1)), Fixed::ZERO);

        artisan.stockpile.set(GoodIndex(3), Fixed::ONE);
        let taxable = artisan.on_sold(SellResult {
            good: GoodIndex(3),
            quantity_sold: Fixed::ONE,
            money_gained: Fixed::from_int(2),
        });
        assert!(!taxable);
    }
}
