//! Factories: producers with a persistent budget and stockpile.

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

pub const PROFIT_HISTORY_DAYS: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryProducer {
    pub production_type: ProductionTypeIndex,
    pub size_multiplier: Fixed,
    pub revenue_yesterday: Fixed,
    pub output_quantity_yesterday: Fixed,
    pub unsold_quantity_yesterday: Fixed,
    pub employees: Vec<Employee>,
    pub stockpile: FixedMap<GoodIndex>,
    pub budget: Fixed,
    pub balance_yesterday: Fixed,
    pub received_investments_yesterday: Fixed,
    pub market_spendings_yesterday: Fixed,
    pub paychecks_yesterday: Fixed,
    pub unprofitable_days: u32,
    pub subsidised_days: u32,
    pub days_without_input: u32,
    pub hiring_priority: u8,
    profit_history_current: u8,
    /// Circular buffer over the last week; `profit_history_current` points
    /// at yesterday's entry.
    daily_profit_history: [Fixed; PROFIT_HISTORY_DAYS],
    offered_today: Fixed,
    sold_today: Fixed,
    revenue_today: Fixed,
    market_spendings_today: Fixed,
    paychecks_today: Fixed,
    subsidies_today: Fixed,
}

impl FactoryProducer {
    pub fn new(production_type: ProductionTypeIndex, size_multiplier: Fixed, budget: Fixed) -> Self {
        Self {
            production_type,
            size_multiplier,
            revenue_yesterday: Fixed::ZERO,
            output_quantity_yesterday: Fixed::ZERO,
            unsold_quantity_yesterday: Fixed::ZERO,
            employees: Vec::new(),
            stockpile: FixedMap::new(),
            budget,
            balance_yesterday: Fixed::ZERO,
            received_investments_yesterday: Fixed::ZERO,
            market_spendings_yesterday: Fixed::ZERO,
            paychecks_yesterday: Fixed::ZERO,
            unprofitable_days: 0,
            subsidised_days: 0,
            days_without_input: 0,
            hiring_priority: 0,
            profit_history_current: 0,
            daily_profit_history: [Fixed::ZERO; PROFIT_HISTORY_DAYS],
            offered_today: Fixed::ZERO,
            sold_today: Fixed::ZERO,
            revenue_today: Fixed::ZERO,
            market_spendings_today: Fixed::ZERO,
            paychecks_today: Fixed::ZERO,
            subsidies_today: Fixed::ZERO,
        }
    }

    pub fn employed_total(&self) -> i64 {
        self.employees.iter().map(|e| e.size).sum()
    }

    pub fn is_unprofitable(&self) -> bool {
        self.balance_yesterday < Fixed::ZERO
    }

    pub fn get_profitability_yesterday(&self) -> Fixed {
        self.daily_profit_history[self.profit_history_current as usize]
    }

    /// Mean over the entries from slot 0 to the current slot inclusive.
    pub fn get_average_profitability_last_seven_days(&self) -> Fixed {
        let mut sum = Fixed::ZERO;
        for day in 0..=self.profit_history_current as usize {
            sum += self.daily_profit_history[day];
        }
        sum / Fixed::from_int(self.profit_history_current as i64 + 1)
    }

    /// Daily production step. Wages and input orders come out of the
    /// persistent budget; sales and subsidies flow back into it.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        province: ProvinceIndex,
        slot: u32,
        owner: Option<CountryIndex>,
        recipe: &ProductionTypeDef,
        effects: ProducerEffects,
        bonus_multiplier: Fixed,
        wage_per_worker: Fixed,
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
        if run.missing_input {
            self.days_without_input += 1;
        } else if run.quantity > Fixed::ZERO {
            self.days_without_input = 0;
        }

        self.output_quantity_yesterday = run.quantity;
        self.offered_today = run.quantity;
        self.sold_today = Fixed::ZERO;
        self.revenue_today = Fixed::ZERO;
        self.market_spendings_today = Fixed::ZERO;
        self.subsidies_today = Fixed::ZERO;

        // Wages are owed for today's labour and paid from the budget.
        self.paychecks_today =
            (Fixed::from_int(self.employed_total()) * wage_per_worker).min(self.budget.max(Fixed::ZERO));
        self.budget -= self.paychecks_today;

        let actor = OrderActor::Factory { province, slot };
        if run.quantity > Fixed::ZERO {
            batch.sells.push(MarketSellOrder {
                good: recipe.output_good,
                country: owner,
                quantity: run.quantity,
                actor,
            });
        }

        // Tomorrow's inputs, budget-capped pro-rata across goods. The
        // budget is debited at settlement for what was actually spent.
        let desired = desired_inputs(recipe, share, effects);
        let estimated_cost: Fixed = desired
            .iter()
            .map(|(good, quantity)| quantity * price_of(good))
            .sum();
        if estimated_cost > Fixed::ZERO {
            let available = self.budget.max(Fixed::ZERO);
            let scale = if estimated_cost > available {
                available / estimated_cost
            } else {
                Fixed::ONE
            };
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
                    country: owner,
                    max_quantity: quantity,
                    money_to_spend: money,
                    actor,
                });
            }
        }
    }

    pub fn on_inputs_bought(&mut self, good: GoodIndex, quantity: Fixed, money_spent: Fixed) {
        self.stockpile.add(good, quantity);
        self.budget -= money_spent;
        self.market_spendings_today += money_spent;
    }

    pub fn on_output_sold(&mut self, result: SellResult) {
        self.sold_today += result.quantity_sold;
        self.revenue_today += result.money_gained;
        self.budget += result.money_gained;
    }

    pub fn paychecks_today(&self) -> Fixed {
        self.paychecks_today
    }

    /// Profit left after wages and input spending, available as owner
    /// dividends.
    pub fn distributable_dividends(&self) -> Fixed {
        (self.revenue_today - self.paychecks_today - self.market_spendings_today)
            .max(Fixed::ZERO)
            .min(self.budget.max(Fixed::ZERO))
    }

    pub fn pay_dividends(&mut self, amount: Fixed) {
        self.budget -= amount;
    }

    /// A subsidy from the owning country, credited to the budget.
    pub fn receive_subsidy(&mut self, amount: Fixed) {
        self.budget += amount;
        self.subsidies_today += amount;
        self.subsidised_days += 1;
    }

    pub fn receive_investment(&mut self, amount: Fixed) {
        self.budget += amount;
        self.received_investments_yesterday += amount;
    }

    /// End-of-day bookkeeping: balance, profitability history, counters.
    pub fn finish_day(&mut self) {
        self.unsold_quantity_yesterday = (self.offered_today - self.sold_today).max(Fixed::ZERO);
        self.revenue_yesterday = self.revenue_today;
        self.market_spendings_yesterday = self.market_spendings_today;
        self.paychecks_yesterday = self.paychecks_today;

        let expenses = self.market_spendings_today + self.paychecks_today;
        self.balance_yesterday = self.revenue_today + self.subsidies_today - expenses;
        if self.balance_yesterday < Fixed::ZERO {
            self.unprofitable_days += 1;
        } else {
            self.unprofitable_days = 0;
        }

        let next = (self.profit_history_current as usize + 1) % PROFIT_HISTORY_DAYS;
        self.profit_history_current = next as u8;
        self.daily_profit_history[next] = self.balance_yesterday;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::production::{Job, ProducerKind};
    use crate::defs::pops::PopTypeIndex;
    use crate::scripts::PopRef;

    fn mill_recipe() -> ProductionTypeDef {
        let mut inputs = FixedMap::new();
        inputs.set(GoodIndex(0), Fixed::ONE); // grain in
        ProductionTypeDef {
            identifier: "flour_mill".to_string(),
            kind: ProducerKind::Factory,
            owner: Some(Job {
                pop_type: PopTypeIndex(0),
                effect_multiplier: Fixed::from_int(2),
                amount: Fixed::ONE,
            }),
            employees: vec![Job {
                pop_type: PopTypeIndex(1),
                effect_multiplier: Fixed::ONE,
                amount: Fixed::ONE,
            }],
            base_workforce_size: 1_000,
            input_goods: inputs,
            output_good: GoodIndex(1),
            base_output_quantity: Fixed::from_int(2),
            maintenance_requirements: FixedMap::new(),
            bonuses: vec![],
            farm: false,
            mine: false,
            coastal: false,
        }
    }

    fn worker() -> Employee {
        Employee {
            pop: PopRef {
                province: ProvinceIndex(0),
                slot: 0,
            },
            size: 1_000,
            job: 0,
        }
    }

    #[test]
    fn missing_inputs_stop_production_and_count_days() {
        let recipe = mill_recipe();
        let mut factory =
            FactoryProducer::new(ProductionTypeIndex(0), Fixed::ONE, Fixed::from_int(100));
        factory.employees.push(worker());

        let mut batch = OrderBatch::default();
        factory.tick(
            ProvinceIndex(0),
            0,
            None,
            &recipe,
            ProducerEffects::default(),
            Fixed::ONE,
            Fixed::ZERO,
            |_| Fixed::from_int(2),
            &mut batch,
        );
        assert!(batch.sells.is_empty());
        assert_eq!(factory.days_without_input, 1);
        // it still orders inputs for tomorrow
        assert_eq!(batch.buys.len(), 1);
        assert_eq!(batch.buys[0].max_quantity, Fixed::ONE);
    }

    #[test]
    fn stocked_factory_produces_and_sells() {
        let recipe = mill_recipe();
        let mut factory =
            FactoryProducer::new(ProductionTypeIndex(0), Fixed::ONE, Fixed::from_int(100));
        factory.employees.push(worker());
        factory.stockpile.set(GoodIndex(0), Fixed::ONE);

        let mut batch = OrderBatch::default();
        factory.tick(
            ProvinceIndex(0),
            0,
            None,
            &recipe,
            ProducerEffects::default(),
            Fixed::ONE,
            Fixed::ZERO,
            |_| Fixed::from_int(2),
            &mut batch,
        );
        assert_eq!(batch.sells.len(), 1);
        assert_eq!(batch.sells[0].quantity, Fixed::from_int(2));
        assert_eq!(factory.days_without_input, 0);
    }

    #[test]
    fn wages_and_inputs_come_from_budget() {
        let recipe = mill_recipe();
        let mut factory =
            FactoryProducer::new(ProductionTypeIndex(0), Fixed::ONE, Fixed::from_int(100));
        factory.employees.push(worker());

        let mut batch = OrderBatch::default();
        factory.tick(
            ProvinceIndex(0),
            0,
            None,
            &recipe,
            ProducerEffects::default(),
            Fixed::ONE,
            Fixed::from_fraction(1, 100), // wage 0.01 per worker
            |_| Fixed::from_int(2),
            &mut batch,
        );
        // wages leave the budget at tick time, inputs at settlement
        assert_eq!(factory.paychecks_today, Fixed::from_int(10));
        assert_eq!(factory.budget, Fixed::from_int(90));
        assert_eq!(batch.buys[0].money_to_spend, Fixed::from_int(2));

        factory.on_inputs_bought(GoodIndex(0), Fixed::ONE, Fixed::from_int(2));
        assert_eq!(factory.budget, Fixed::from_int(88));
        assert_eq!(factory.market_spendings_today, Fixed::from_int(2));
    }

    #[test]
    fn profit_history_wraps_over_a_week() {
        let mut factory =
            FactoryProducer::new(ProductionTypeIndex(0), Fixed::ONE, Fixed::ZERO);
        for day in 0..10 {
            factory.revenue_today = Fixed::from_int(day);
            factory.finish_day();
        }
        assert_eq!(factory.get_profitability_yesterday(), Fixed::from_int(9));
        // slots 0..=3 hold the balances of days 7..=10: mean = 7.5
        assert_eq!(
            factory.get_average_profitability_last_seven_days(),
            Fixed::from_fraction(15, 2)
        );
    }

    #[test]
    fn average_profitability_before_first_wrap() {
        let mut factory =
            FactoryProducer::new(ProductionTypeIndex(0), Fixed::ONE, Fixed::ZERO);
        factory.revenue_today = Fixed::from_int(4);
        factory.finish_day();
        factory.revenue_today = Fixed::from_int(8);
        factory.finish_day();
        // populated entries: slot 0 (never written, zero) is not part of
        // the window yet; slots 1 and 2 hold 4 and 8
        assert_eq!(factory.get_profitability_yesterday(), Fixed::from_int(8));
        assert_eq!(
            factory.get_average_profitability_last_seven_days(),
            Fixed::from_int(4)
        );
    }

    #[test]
    fn unprofitable_days_count_consecutively() {
        let mut factory =
            FactoryProducer::new(ProductionTypeIndex(0), Fixed::ONE, Fixed::from_int(10));
        factory.employees.push(worker());
        factory.paychecks_today = Fixed::from_int(5);
        factory.finish_day();
        assert_eq!(factory.unprofitable_days, 1);
        assert!(factory.is_unprofitable());

        factory.revenue_today = Fixed::from_int(20);
        factory.finish_day();
        assert_eq!(factory.unprofitable_days, 0);
    }

    #[test]
    fn subsidies_enter_the_balance() {
        let mut factory =
            FactoryProducer::new(ProductionTypeIndex(0), Fixed::ONE, Fixed::ZERO);
        factory.paychecks_today = Fixed::from_int(5);
        factory.receive_subsidy(Fixed::from_int(5));
        factory.finish_day();
        assert_eq!(factory.balance_yesterday, Fixed::ZERO);
        assert_eq!(factory.subsidised_days, 1);
        assert_eq!(factory.unprofitable_days, 0);
    }
}
