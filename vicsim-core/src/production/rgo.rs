//! Resource-gathering operations, one per producing province.

use crate::defs::goods::GoodIndex;
use crate::defs::map::ProvinceIndex;
use crate::defs::politics::CountryIndex;
use crate::defs::production::{ProductionTypeDef, ProductionTypeIndex};
use crate::fixed::Fixed;
use crate::indexed::FixedMap;
use crate::market::{BuyUpToOrder, MarketSellOrder, OrderActor, SellResult};
use crate::production::{
    consume_inputs, desired_inputs, run_production, scaled_workforce_share, Employee,
    OrderBatch, ProducerEffects,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGatheringOperation {
    pub production_type: ProductionTypeIndex,
    pub size_multiplier: Fixed,
    pub revenue_yesterday: Fixed,
    pub output_quantity_yesterday: Fixed,
    pub unsold_quantity_yesterday: Fixed,
    pub employees: Vec<Employee>,
    /// Inputs bought today for tomorrow; drained every tick because RGO
    /// stock does not persist across days.
    stockpile: FixedMap<GoodIndex>,
    offered_today: Fixed,
    sold_today: Fixed,
    revenue_today: Fixed,
    market_spendings_today: Fixed,
}

impl ResourceGatheringOperation {
    pub fn new(production_type: ProductionTypeIndex, size_multiplier: Fixed) -> Self {
        Self {
            production_type,
            size_multiplier,
            revenue_yesterday: Fixed::ZERO,
            output_quantity_yesterday: Fixed::ZERO,
            unsold_quantity_yesterday: Fixed::ZERO,
            employees: Vec::new(),
            stockpile: FixedMap::new(),
            offered_today: Fixed::ZERO,
            sold_today: Fixed::ZERO,
            revenue_today: Fixed::ZERO,
            market_spendings_today: Fixed::ZERO,
        }
    }

    pub fn employed_total(&self) -> i64 {
        self.employees.iter().map(|e| e.size).sum()
    }

    /// Daily production step: turn yesterday's inputs into output, offer
    /// it for sale and order tomorrow's inputs, funded by yesterday's
    /// revenue. Orders are appended to `batch` for submission.
    pub fn tick(
        &mut self,
        province: ProvinceIndex,
        owner: Option<CountryIndex>,
        recipe: &ProductionTypeDef,
        effects: ProducerEffects,
        bonus_multiplier: Fixed,
        price_of: impl Fn(GoodIndex) -> Fixed,
        batch: &mut OrderBatch,
    ) {
        let share = scaled_workforce_share(
            self.employed_total(),
            recipe.base_workforce_size,
            self.size_multiplier,
        );

        let run = run_production(recipe, &self.stockpile, share, effects, bonus_multiplier);
        consume_inputs(&mut self.stockpile, recipe, run.recipe_multiple);
        // leftovers vanish: no RGO stock persists across days
        self.stockpile.clear();

        self.output_quantity_yesterday = run.quantity;
        self.offered_today = run.quantity;
        self.sold_today = Fixed::ZERO;
        self.revenue_today = Fixed::ZERO;
        self.market_spendings_today = Fixed::ZERO;

        let actor = OrderActor::Rgo(province);
        if run.quantity > Fixed::ZERO {
            batch.sells.push(MarketSellOrder {
                good: recipe.output_good,
                country: owner,
                quantity: run.quantity,
                actor,
            });
        }

        let mut budget = self.revenue_yesterday;
        for (good, quantity) in desired_inputs(recipe, share, effects).iter() {
            if quantity <= Fixed::ZERO || budget <= Fixed::ZERO {
                continue;
            }
            let money = (quantity * price_of(good)).min(budget);
            budget -= money;
            batch.buys.push(BuyUpToOrder {
                good,
                country: owner,
                max_quantity: quantity,
                money_to_spend: money,
                actor,
            });
        }
    }

    /// Input purchase settled: goods enter the stockpile for tomorrow and
    /// the spend is withheld from today's distributable revenue.
    pub fn on_inputs_bought(&mut self, good: GoodIndex, quantity: Fixed, money_spent: Fixed) {
        self.stockpile.add(good, quantity);
        self.market_spendings_today += money_spent;
    }

    /// Output sale settled. Returns the revenue for the caller to split
    /// between the owner share and the worker wage pool.
    pub fn on_output_sold(&mut self, result: SellResult) -> Fixed {
        self.sold_today += result.quantity_sold;
        self.revenue_today += result.money_gained;
        result.money_gained
    }

    /// Revenue left for owner and worker payouts after input spending.
    pub fn distributable_revenue(&self) -> Fixed {
        (self.revenue_today - self.market_spendings_today).max(Fixed::ZERO)
    }

    /// End-of-day bookkeeping.
    pub fn finish_day(&mut self) {
        self.unsold_quantity_yesterday = (self.offered_today - self.sold_today).max(Fixed::ZERO);
        self.revenue_yesterday = self.revenue_today;
    }
}
