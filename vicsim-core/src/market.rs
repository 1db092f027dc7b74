//! Per-good markets: order buffering, daily clearing, price movement.
//!
//! Producers and pops place buy-up-to and market-sell orders during the
//! day; the clearing phase settles every good once, moves the price toward
//! the short side and reports one outcome per order, in submission order.
//! Order submission is guarded by per-queue mutexes so future callers may
//! submit from worker threads without restructuring; clearing itself is
//! single-threaded.

use crate::config::SimConfig;
use crate::date::Date;
use crate::defs::goods::{GoodDefinition, GoodIndex};
use crate::defs::map::ProvinceIndex;
use crate::defs::politics::CountryIndex;
use crate::fixed::Fixed;
use crate::registry::Registry;
use crate::scripts::PopRef;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Who placed an order. Clearing returns the actor with each result and
/// the scheduler routes it back; this is the typed stand-in for the
/// opaque-pointer callback of a C API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderActor {
    /// A pop buying needs goods.
    Pop(PopRef),
    /// A pop's artisanal producer trading inputs and output.
    Artisan(PopRef),
    /// A province's resource-gathering operation.
    Rgo(ProvinceIndex),
    /// A factory, identified by its province and slot.
    Factory { province: ProvinceIndex, slot: u32 },
    /// A national actor (stockpiles, subsidies).
    Country(CountryIndex),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BuyUpToOrder {
    pub good: GoodIndex,
    pub country: Option<CountryIndex>,
    pub max_quantity: Fixed,
    pub money_to_spend: Fixed,
    pub actor: OrderActor,
}

impl BuyUpToOrder {
    /// The highest unit price at which the full desired quantity is still
    /// affordable.
    pub fn affordable_unit_price(&self) -> Fixed {
        self.money_to_spend / self.max_quantity
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketSellOrder {
    pub good: GoodIndex,
    pub country: Option<CountryIndex>,
    pub quantity: Fixed,
    pub actor: OrderActor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyResult {
    pub good: GoodIndex,
    pub quantity_bought: Fixed,
    pub money_spent_total: Fixed,
    pub money_spent_on_imports: Fixed,
}

impl BuyResult {
    /// Outcome handed to a buyer whose order was rejected outright.
    pub fn no_purchase(good: GoodIndex) -> Self {
        Self {
            good,
            quantity_bought: Fixed::ZERO,
            money_spent_total: Fixed::ZERO,
            money_spent_on_imports: Fixed::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellResult {
    pub good: GoodIndex,
    pub quantity_sold: Fixed,
    pub money_gained: Fixed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BuyOutcome {
    pub actor: OrderActor,
    pub result: BuyResult,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SellOutcome {
    pub actor: OrderActor,
    pub result: SellResult,
}

/// Runtime state of one good.
#[derive(Debug, Serialize, Deserialize)]
pub struct GoodInstance {
    pub good: GoodIndex,
    base_price: Fixed,
    money: bool,
    price: Fixed,
    price_change_yesterday: Fixed,
    max_next_price: Fixed,
    min_next_price: Fixed,
    is_available: bool,
    total_demand_yesterday: Fixed,
    total_supply_yesterday: Fixed,
    quantity_traded_yesterday: Fixed,
    /// Sparse (date, price) samples, one per traded day.
    price_history: Vec<(Date, Fixed)>,
    #[serde(skip)]
    buy_orders: Mutex<Vec<BuyUpToOrder>>,
    #[serde(skip)]
    sell_orders: Mutex<Vec<MarketSellOrder>>,
}

fn unpoison<T>(result: Result<T, std::sync::PoisonError<T>>) -> T {
    match result {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl GoodInstance {
    pub fn new(good: GoodIndex, definition: &GoodDefinition, config: &SimConfig) -> Self {
        let mut instance = Self {
            good,
            base_price: definition.base_price,
            money: definition.money,
            price: definition.base_price,
            price_change_yesterday: Fixed::ZERO,
            max_next_price: Fixed::ZERO,
            min_next_price: Fixed::ZERO,
            is_available: definition.available_from_start,
            total_demand_yesterday: Fixed::ZERO,
            total_supply_yesterday: Fixed::ZERO,
            quantity_traded_yesterday: Fixed::ZERO,
            price_history: Vec::new(),
            buy_orders: Mutex::new(Vec::new()),
            sell_orders: Mutex::new(Vec::new()),
        };
        instance.update_next_price_limits(config);
        instance
    }

    pub fn price(&self) -> Fixed {
        self.price
    }

    pub fn price_change_yesterday(&self) -> Fixed {
        self.price_change_yesterday
    }

    pub fn max_next_price(&self) -> Fixed {
        self.max_next_price
    }

    pub fn min_next_price(&self) -> Fixed {
        self.min_next_price
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    /// Tradeable on the daily market: available and not the money good.
    pub fn is_trading_good(&self) -> bool {
        self.is_available && !self.money
    }

    pub fn total_demand_yesterday(&self) -> Fixed {
        self.total_demand_yesterday
    }

    pub fn total_supply_yesterday(&self) -> Fixed {
        self.total_supply_yesterday
    }

    pub fn quantity_traded_yesterday(&self) -> Fixed {
        self.quantity_traded_yesterday
    }

    pub fn price_history(&self) -> &[(Date, Fixed)] {
        &self.price_history
    }

    /// Enable a good unlocked mid-game by an invention or event.
    pub fn enable(&mut self) {
        self.is_available = true;
    }

    /// Price limits depend on the price-change rule; recompute when the
    /// rule itself is flipped mid-game.
    pub fn on_price_change_rule_changed(&mut self, config: &SimConfig) {
        self.update_next_price_limits(config);
    }

    fn update_next_price_limits(&mut self, config: &SimConfig) {
        if config.exponential_price_changes {
            let max_change = Fixed::from_raw(self.price.raw() >> 6);
            self.max_next_price = Fixed::USABLE_MAX.min(self.price + max_change);
            self.min_next_price = Fixed::EPSILON.max(self.price - max_change);
        } else {
            let step = Fixed::from_fraction(1, 100);
            self.max_next_price = (self.base_price * Fixed::from_int(5))
                .min(Fixed::USABLE_MAX)
                .min(self.price + step);
            self.min_next_price = (self.base_price * Fixed::from_fraction(22, 100))
                .max(Fixed::EPSILON)
                .max(self.price - step);
        }
    }

    /// Thread-safe. Rejects orders on unavailable goods (the buyer gets a
    /// `no_purchase` outcome back) and caps the quantity at what the
    /// order's budget can pay for at the worst next price, so settlement
    /// never spends more than the buyer offered.
    pub fn add_buy_up_to_order(&self, mut order: BuyUpToOrder) -> Result<(), BuyOutcome> {
        if !self.is_trading_good() {
            return Err(BuyOutcome {
                actor: order.actor,
                result: BuyResult::no_purchase(self.good),
            });
        }
        if order.max_quantity <= Fixed::ZERO || order.money_to_spend < Fixed::ZERO {
            log::error!(
                "rejecting malformed buy order for good {:?}: quantity {}, budget {}",
                self.good,
                order.max_quantity,
                order.money_to_spend
            );
            return Err(BuyOutcome {
                actor: order.actor,
                result: BuyResult::no_purchase(self.good),
            });
        }
        let affordable = order.money_to_spend / self.max_next_price;
        if affordable < order.max_quantity {
            order.max_quantity = affordable;
        }
        if order.max_quantity <= Fixed::ZERO {
            return Err(BuyOutcome {
                actor: order.actor,
                result: BuyResult::no_purchase(self.good),
            });
        }
        unpoison(self.buy_orders.lock()).push(order);
        Ok(())
    }

    /// Thread-safe.
    pub fn add_market_sell_order(&self, order: MarketSellOrder) -> Result<(), SellOutcome> {
        if !self.is_trading_good() || order.quantity <= Fixed::ZERO {
            if order.quantity <= Fixed::ZERO {
                log::error!(
                    "rejecting malformed sell order for good {:?}: quantity {}",
                    self.good,
                    order.quantity
                );
            }
            return Err(SellOutcome {
                actor: order.actor,
                result: SellResult {
                    good: self.good,
                    quantity_sold: Fixed::ZERO,
                    money_gained: Fixed::ZERO,
                },
            });
        }
        unpoison(self.sell_orders.lock()).push(order);
        Ok(())
    }

    /// Not thread-safe; runs once per day from the clearing phase.
    ///
    /// Outcomes are appended in submission order, buys before sells.
    pub fn execute_orders(
        &mut self,
        config: &SimConfig,
        buy_outcomes: &mut Vec<BuyOutcome>,
        sell_outcomes: &mut Vec<SellOutcome>,
    ) {
        let buys = std::mem::take(unpoison(self.buy_orders.get_mut()));
        let sells = std::mem::take(unpoison(self.sell_orders.get_mut()));

        let demand: Fixed = buys.iter().map(|b| b.max_quantity).sum();
        let supply: Fixed = sells.iter().map(|s| s.quantity).sum();

        self.total_demand_yesterday = demand;
        self.total_supply_yesterday = supply;

        // One empty side means nothing trades and the price holds.
        if buys.is_empty() || sells.is_empty() {
            self.quantity_traded_yesterday = Fixed::ZERO;
            self.price_change_yesterday = Fixed::ZERO;
            return;
        }

        let new_price;
        let traded;
        if demand > supply {
            new_price = self.max_next_price;
            traded = supply;
        } else if demand < supply {
            new_price = self.min_next_price;
            traded = demand;
        } else {
            new_price = self.price;
            traded = demand;
        }
        self.quantity_traded_yesterday = traded;

        // Supply tally per selling country, for import apportionment.
        let mut supply_by_country: FxHashMap<Option<CountryIndex>, Fixed> = FxHashMap::default();
        for sell in &sells {
            *supply_by_country.entry(sell.country).or_insert(Fixed::ZERO) += sell.quantity;
        }

        for buy in &buys {
            let quantity_bought = buy.max_quantity.mul_div(traded, demand);
            let money_spent = quantity_bought * new_price;
            let money_spent_on_imports = match buy.country {
                Some(country) => {
                    let domestic = supply_by_country
                        .get(&Some(country))
                        .copied()
                        .unwrap_or(Fixed::ZERO);
                    let foreign = supply - domestic;
                    money_spent.mul_div(foreign, supply)
                }
                None => Fixed::ZERO,
            };
            buy_outcomes.push(BuyOutcome {
                actor: buy.actor,
                result: BuyResult {
                    good: self.good,
                    quantity_bought,
                    money_spent_total: money_spent,
                    money_spent_on_imports,
                },
            });
        }

        for sell in &sells {
            let quantity_sold = sell.quantity.mul_div(traded, supply);
            sell_outcomes.push(SellOutcome {
                actor: sell.actor,
                result: SellResult {
                    good: self.good,
                    quantity_sold,
                    money_gained: quantity_sold * new_price,
                },
            });
        }

        self.price_change_yesterday = new_price - self.price;
        if new_price != self.price {
            self.price = new_price;
            self.update_next_price_limits(config);
        }
    }

    /// Record-keeping phase: one sample per day for available goods.
    pub fn record_price_history(&mut self, date: Date) {
        if self.is_available {
            self.price_history.push((date, self.price));
        }
    }
}

/// All good instances, indexed densely by [`GoodIndex`].
#[derive(Debug, Serialize, Deserialize)]
pub struct Market {
    goods: Vec<GoodInstance>,
}

impl Market {
    pub fn new(definitions: &Registry<GoodIndex, GoodDefinition>, config: &SimConfig) -> Self {
        Self {
            goods: definitions
                .iter()
                .map(|(index, definition)| GoodInstance::new(index, definition, config))
                .collect(),
        }
    }

    pub fn good(&self, index: GoodIndex) -> &GoodInstance {
        &self.goods[index.0 as usize]
    }

    pub fn good_mut(&mut self, index: GoodIndex) -> &mut GoodInstance {
        &mut self.goods[index.0 as usize]
    }

    pub fn goods(&self) -> &[GoodInstance] {
        &self.goods
    }

    /// Clear every good in ascending index order, collecting outcomes in
    /// firing order.
    pub fn execute_all_orders(
        &mut self,
        config: &SimConfig,
        buy_outcomes: &mut Vec<BuyOutcome>,
        sell_outcomes: &mut Vec<SellOutcome>,
    ) {
        for good in &mut self.goods {
            good.execute_orders(config, buy_outcomes, sell_outcomes);
        }
    }

    pub fn record_price_history(&mut self, date: Date) {
        for good in &mut self.goods {
            good.record_price_history(date);
        }
    }

    /// The price-change rule flipped mid-game: every good's band must be
    /// recomputed against the new rule.
    pub fn on_price_change_rule_changed(&mut self, config: &SimConfig) {
        for good in &mut self.goods {
            good.on_price_change_rule_changed(config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::goods::GoodDefinition;
    use vicdata::goods::GoodCategory;

    fn test_definition(base_price: Fixed) -> GoodDefinition {
        GoodDefinition {
            identifier: "grain".to_string(),
            category: GoodCategory::RawMaterialGoods,
            color: None,
            base_price,
            available_from_start: true,
            tradeable: true,
            money: false,
            overseas_penalty: false,
        }
    }

    fn instance(base_price: Fixed, config: &SimConfig) -> GoodInstance {
        GoodInstance::new(GoodIndex(0), &test_definition(base_price), config)
    }

    fn buy(max_quantity: i64, money: i64) -> BuyUpToOrder {
        BuyUpToOrder {
            good: GoodIndex(0),
            country: None,
            max_quantity: Fixed::from_int(max_quantity),
            money_to_spend: Fixed::from_int(money),
            actor: OrderActor::Rgo(ProvinceIndex(0)),
        }
    }

    fn sell(quantity: i64) -> MarketSellOrder {
        MarketSellOrder {
            good: GoodIndex(0),
            country: None,
            quantity: Fixed::from_int(quantity),
            actor: OrderActor::Rgo(ProvinceIndex(1)),
        }
    }

    #[test]
    fn legacy_price_limits() {
        let config = SimConfig::default();
        let good = instance(Fixed::from_int(2), &config);
        assert_eq!(good.max_next_price(), Fixed::from_int(2) + Fixed::from_fraction(1, 100));
        assert_eq!(good.min_next_price(), Fixed::from_int(2) - Fixed::from_fraction(1, 100));
    }

    #[test]
    fn legacy_limits_clamp_to_base_band() {
        let config = SimConfig::default();
        let mut good = instance(Fixed::from_int(2), &config);
        // Walk the price to the ceiling: band is [0.44, 10]
        for _ in 0..2000 {
            assert!(good
                .add_buy_up_to_order(buy(10, 1_000_000))
                .is_ok());
            assert!(good.add_market_sell_order(sell(5)).is_ok());
            let mut buys = Vec::new();
            let mut sells = Vec::new();
            good.execute_orders(&config, &mut buys, &mut sells);
        }
        assert_eq!(good.price(), Fixed::from_int(10));
        assert_eq!(good.max_next_price(), Fixed::from_int(10));
    }

    #[test]
    fn exponential_price_limits() {
        let config = SimConfig {
            exponential_price_changes: true,
            ..SimConfig::default()
        };
        let good = instance(Fixed::from_int(64), &config);
        assert_eq!(good.max_next_price(), Fixed::from_int(65));
        assert_eq!(good.min_next_price(), Fixed::from_int(63));
    }

    #[test]
    fn exponential_floor_is_epsilon() {
        let config = SimConfig {
            exponential_price_changes: true,
            ..SimConfig::default()
        };
        // at the epsilon floor, price/64 rounds to zero and the band
        // degenerates to the floor itself
        let mut good = instance(Fixed::from_int(1), &config);
        good.price = Fixed::EPSILON;
        good.update_next_price_limits(&config);
        assert_eq!(good.min_next_price(), Fixed::EPSILON);
        assert!(good.max_next_price() >= Fixed::EPSILON);
    }

    #[test]
    fn matched_orders_trade_at_current_price() {
        let config = SimConfig::default();
        let mut good = instance(Fixed::from_int(2), &config);
        assert!(good.add_buy_up_to_order(buy(10, 30)).is_ok());
        assert!(good.add_market_sell_order(sell(10)).is_ok());

        let mut buys = Vec::new();
        let mut sells = Vec::new();
        good.execute_orders(&config, &mut buys, &mut sells);

        assert_eq!(good.price(), Fixed::from_int(2));
        assert_eq!(good.price_change_yesterday(), Fixed::ZERO);
        assert_eq!(good.quantity_traded_yesterday(), Fixed::from_int(10));
        assert_eq!(buys[0].result.quantity_bought, Fixed::from_int(10));
        assert_eq!(buys[0].result.money_spent_total, Fixed::from_int(20));
        assert_eq!(buys[0].result.money_spent_on_imports, Fixed::ZERO);
        assert_eq!(sells[0].result.quantity_sold, Fixed::from_int(10));
        assert_eq!(sells[0].result.money_gained, Fixed::from_int(20));
    }

    #[test]
    fn excess_demand_moves_price_up_and_rations_buyers() {
        let config = SimConfig::default();
        let mut good = instance(Fixed::from_int(2), &config);
        assert!(good.add_buy_up_to_order(buy(10, 30)).is_ok());
        assert!(good.add_buy_up_to_order(buy(5, 20)).is_ok());
        assert!(good.add_market_sell_order(sell(6)).is_ok());

        let mut buys = Vec::new();
        let mut sells = Vec::new();
        good.execute_orders(&config, &mut buys, &mut sells);

        let expected_price = Fixed::from_int(2) + Fixed::from_fraction(1, 100);
        assert_eq!(good.price(), expected_price);
        assert_eq!(good.quantity_traded_yesterday(), Fixed::from_int(6));
        // rationed pro-rata: 6·10/15 = 4 and 6·5/15 = 2
        assert_eq!(buys[0].result.quantity_bought, Fixed::from_int(4));
        assert_eq!(buys[1].result.quantity_bought, Fixed::from_int(2));
        assert_eq!(buys[0].result.money_spent_total, Fixed::from_int(4) * expected_price);
        assert_eq!(sells[0].result.money_gained, Fixed::from_int(6) * expected_price);
    }

    #[test]
    fn empty_side_trades_nothing() {
        let config = SimConfig::default();
        let mut good = instance(Fixed::from_int(2), &config);
        assert!(good.add_buy_up_to_order(buy(10, 30)).is_ok());

        let mut buys = Vec::new();
        let mut sells = Vec::new();
        good.execute_orders(&config, &mut buys, &mut sells);

        assert!(buys.is_empty());
        assert!(sells.is_empty());
        assert_eq!(good.price(), Fixed::from_int(2));
        assert_eq!(good.quantity_traded_yesterday(), Fixed::ZERO);
        assert_eq!(good.total_demand_yesterday(), Fixed::from_int(10));
    }

    #[test]
    fn unavailable_good_rejects_orders() {
        let config = SimConfig::default();
        let mut definition = test_definition(Fixed::from_int(2));
        definition.available_from_start = false;
        let good = GoodInstance::new(GoodIndex(0), &definition, &config);

        let rejected = good.add_buy_up_to_order(buy(10, 30)).unwrap_err();
        assert_eq!(rejected.result, BuyResult::no_purchase(GoodIndex(0)));
        assert!(good.add_market_sell_order(sell(5)).is_err());
    }

    #[test]
    fn budget_caps_effective_quantity() {
        let config = SimConfig::default();
        let mut good = instance(Fixed::from_int(2), &config);
        // Budget 6 at max_next_price 2.01 affords less than 3 units
        assert!(good.add_buy_up_to_order(buy(10, 6)).is_ok());
        assert!(good.add_market_sell_order(sell(10)).is_ok());

        let mut buys = Vec::new();
        let mut sells = Vec::new();
        good.execute_orders(&config, &mut buys, &mut sells);

        let result = buys[0].result;
        assert!(result.quantity_bought < Fixed::from_int(3));
        assert!(result.money_spent_total <= Fixed::from_int(6));
    }

    #[test]
    fn import_value_apportioned_by_seller_supply() {
        let config = SimConfig::default();
        let mut good = instance(Fixed::from_int(2), &config);
        let home = CountryIndex(0);
        let abroad = CountryIndex(1);

        let mut order = buy(12, 100);
        order.country = Some(home);
        assert!(good.add_buy_up_to_order(order).is_ok());

        let mut domestic = sell(9);
        domestic.country = Some(home);
        assert!(good.add_market_sell_order(domestic).is_ok());
        let mut foreign = sell(3);
        foreign.country = Some(abroad);
        assert!(good.add_market_sell_order(foreign).is_ok());

        let mut buys = Vec::new();
        let mut sells = Vec::new();
        good.execute_orders(&config, &mut buys, &mut sells);

        let result = buys[0].result;
        // a quarter of the matched supply is foreign
        assert_eq!(
            result.money_spent_on_imports,
            result.money_spent_total.mul_div(Fixed::from_int(3), Fixed::from_int(12))
        );
    }

    #[test]
    fn price_history_records_available_goods_only() {
        let config = SimConfig::default();
        let mut good = instance(Fixed::from_int(2), &config);
        let date = Date::from_ymd(1836, 1, 1);
        good.record_price_history(date);
        assert_eq!(good.price_history(), &[(date, Fixed::from_int(2))]);

        let mut definition = test_definition(Fixed::from_int(2));
        definition.available_from_start = false;
        let mut locked = GoodInstance::new(GoodIndex(1), &definition, &config);
        locked.record_price_history(date);
        assert!(locked.price_history().is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Money conservation: sellers never receive more than buyers
            /// paid, and the residual is bounded by one epsilon per order.
            #[test]
            fn clearing_conserves_money(
                buy_quantities in proptest::collection::vec(1i64..=1000, 1..6),
                sell_quantities in proptest::collection::vec(1i64..=1000, 1..6),
            ) {
                let config = SimConfig::default();
                let mut good = instance(Fixed::from_int(2), &config);
                for &quantity in &buy_quantities {
                    prop_assert!(good.add_buy_up_to_order(buy(quantity, quantity * 11)).is_ok());
                }
                for &quantity in &sell_quantities {
                    prop_assert!(good.add_market_sell_order(sell(quantity)).is_ok());
                }
                let mut buys = Vec::new();
                let mut sells = Vec::new();
                good.execute_orders(&config, &mut buys, &mut sells);

                let spent: Fixed = buys.iter().map(|o| o.result.money_spent_total).sum();
                let gained: Fixed = sells.iter().map(|o| o.result.money_gained).sum();
                let residual = (spent - gained).abs();
                let order_count = (buys.len() + sells.len()) as i64;
                // each order rounds at most one epsilon of quantity (worth
                // price epsilons of money) plus one epsilon in the money
                // multiply itself
                let bound = Fixed::from_raw(2 * order_count) * good.price()
                    + Fixed::from_raw(order_count);
                prop_assert!(residual <= bound,
                    "residual {residual:?} exceeds bound {bound:?}");
            }

            /// The price respects its limits and the epsilon floor.
            #[test]
            fn price_stays_in_bounds(
                rounds in 1usize..30,
                buy_quantity in 1i64..=50,
                sell_quantity in 1i64..=50,
            ) {
                let config = SimConfig::default();
                let mut good = instance(Fixed::from_int(2), &config);
                for _ in 0..rounds {
                    let min = good.min_next_price();
                    let max = good.max_next_price();
                    prop_assert!(good.add_buy_up_to_order(buy(buy_quantity, buy_quantity * 11)).is_ok());
                    prop_assert!(good.add_market_sell_order(sell(sell_quantity)).is_ok());
                    let mut buys = Vec::new();
                    let mut sells = Vec::new();
                    good.execute_orders(&config, &mut buys, &mut sells);
                    prop_assert!(good.price() >= min && good.price() <= max);
                    prop_assert!(good.price() >= Fixed::EPSILON);
                }
            }

            /// Demand pressure is monotone: excess demand never lowers the
            /// price, excess supply never raises it.
            #[test]
            fn price_moves_with_pressure(
                buy_quantity in 1i64..=100,
                sell_quantity in 1i64..=100,
            ) {
                let config = SimConfig::default();
                let mut good = instance(Fixed::from_int(2), &config);
                let before = good.price();
                prop_assert!(good.add_buy_up_to_order(buy(buy_quantity, buy_quantity * 11)).is_ok());
                prop_assert!(good.add_market_sell_order(sell(sell_quantity)).is_ok());
                let mut buys = Vec::new();
                let mut sells = Vec::new();
                good.execute_orders(&config, &mut buys, &mut sells);
                if buy_quantity > sell_quantity {
                    prop_assert!(good.price() >= before);
                } else if buy_quantity < sell_quantity {
                    prop_assert!(good.price() <= before);
                } else {
                    prop_assert_eq!(good.price(), before);
                }
            }
        }
    }
}
