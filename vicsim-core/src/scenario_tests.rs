//! End-to-end scenarios exercising the market, artisans, taxation and
//! aggregation together.

use crate::config::SimConfig;
use crate::defs::goods::{GoodDefinition, GoodIndex};
use crate::defs::map::ProvinceIndex;
use crate::fixed::Fixed;
use crate::market::{BuyUpToOrder, GoodInstance, MarketSellOrder, OrderActor};
use crate::scheduler::Scheduler;
use crate::testing::WorldBuilder;
use vicdata::bookmark::PopSetup;
use vicdata::goods::GoodCategory;

fn test_good(base_price: Fixed, config: &SimConfig) -> GoodInstance {
    let definition = GoodDefinition {
        identifier: "grain".to_string(),
        category: GoodCategory::RawMaterialGoods,
        color: None,
        base_price,
        available_from_start: true,
        tradeable: true,
        money: false,
        overseas_penalty: false,
    };
    GoodInstance::new(GoodIndex(0), &definition, config)
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

/// Matched orders clear at the standing price with full fills.
#[test]
fn matched_orders_settle_at_standing_price() {
    let config = SimConfig::default();
    let mut good = test_good(Fixed::from_int(2), &config);
    assert!(good.add_buy_up_to_order(buy(10, 30)).is_ok());
    assert!(good.add_market_sell_order(sell(10)).is_ok());

    let mut buys = Vec::new();
    let mut sells = Vec::new();
    good.execute_orders(&config, &mut buys, &mut sells);

    assert_eq!(good.price(), Fixed::from_int(2));
    assert_eq!(good.price_change_yesterday(), Fixed::ZERO);
    assert_eq!(good.quantity_traded_yesterday(), Fixed::from_int(10));

    let result = buys[0].result;
    assert_eq!(result.quantity_bought, Fixed::from_int(10));
    assert_eq!(result.money_spent_total, Fixed::from_int(20));
    assert_eq!(result.money_spent_on_imports, Fixed::ZERO);
    assert_eq!(sells[0].result.quantity_sold, Fixed::from_int(10));
    assert_eq!(sells[0].result.money_gained, Fixed::from_int(20));

    // both queues drained: an immediate re-clear trades nothing
    let mut buys = Vec::new();
    let mut sells = Vec::new();
    good.execute_orders(&config, &mut buys, &mut sells);
    assert!(buys.is_empty() && sells.is_empty());
    assert_eq!(good.quantity_traded_yesterday(), Fixed::ZERO);
}

/// Two buyers compete for six units: price steps up and fills pro-rate.
#[test]
fn excess_demand_steps_price_and_rations() {
    let config = SimConfig::default();
    let mut good = test_good(Fixed::from_int(2), &config);
    assert!(good.add_buy_up_to_order(buy(10, 30)).is_ok());
    assert!(good.add_buy_up_to_order(buy(5, 20)).is_ok());
    assert!(good.add_market_sell_order(sell(6)).is_ok());

    let mut buys = Vec::new();
    let mut sells = Vec::new();
    good.execute_orders(&config, &mut buys, &mut sells);

    let stepped = Fixed::from_int(2) + Fixed::from_fraction(1, 100);
    assert_eq!(good.price(), stepped);
    assert_eq!(good.quantity_traded_yesterday(), Fixed::from_int(6));
    assert_eq!(buys[0].result.quantity_bought, Fixed::from_int(4));
    assert_eq!(buys[0].result.money_spent_total, Fixed::from_int(4) * stepped);
    assert_eq!(buys[1].result.quantity_bought, Fixed::from_int(2));
    assert_eq!(buys[1].result.money_spent_total, Fixed::from_int(2) * stepped);
    assert_eq!(sells[0].result.quantity_sold, Fixed::from_int(6));
    assert_eq!(sells[0].result.money_gained, Fixed::from_int(6) * stepped);
}

/// The artisan walks its unlocked recipes round-robin, skipping recipes
/// whose output good is locked, and tracks the last produced good.
#[test]
fn artisan_recipe_rotation_skips_locked_outputs() {
    let mut world = WorldBuilder::new().build();
    let mut scheduler = Scheduler::new();
    let stockholm = world.defs().provinces.index_of("stockholm").unwrap();
    let cloth = world.defs().goods.index_of("cloth").unwrap();
    let cloth_recipe = world.defs().production_types.index_of("artisan_cloth").unwrap();
    let furniture_recipe = world
        .defs()
        .production_types
        .index_of("artisan_furniture")
        .unwrap();
    let radio_recipe = world
        .defs()
        .production_types
        .index_of("artisan_radios")
        .unwrap();

    let mut chosen = Vec::new();
    for _ in 0..3 {
        scheduler.tick(&mut world);
        let artisan_pop = world
            .province(stockholm)
            .pops
            .iter()
            .find(|pop| pop.artisan.is_some())
            .unwrap();
        let artisan = artisan_pop.artisan.as_ref().unwrap();
        chosen.push(artisan.production_type.unwrap());
        // radios never unlock, so their recipe is never selectable
        assert_ne!(artisan.production_type, Some(radio_recipe));
    }
    assert_eq!(chosen, vec![cloth_recipe, furniture_recipe, cloth_recipe]);

    // after day one the tracked output is the first recipe's good
    let mut world = WorldBuilder::new().build();
    let mut scheduler = Scheduler::new();
    scheduler.tick(&mut world);
    let artisan_pop = world
        .province(stockholm)
        .pops
        .iter()
        .find(|pop| pop.artisan.is_some())
        .unwrap();
    assert_eq!(
        artisan_pop.artisan.as_ref().unwrap().last_produced_good,
        Some(cloth)
    );
}

/// A middle-strata artisan sale is taxed on the margin over production
/// costs only.
#[test]
fn artisanal_income_taxed_on_margin() {
    let mut world = WorldBuilder::new().build();
    let sweden = world.defs().countries.index_of("SWE").unwrap();
    world.country_mut(sweden).effective_tax_rate = [Fixed::from_fraction(1, 10); 3];

    let stockholm = world.defs().provinces.index_of("stockholm").unwrap();
    let pop_slot = world
        .province(stockholm)
        .pops
        .iter()
        .position(|pop| pop.artisan.is_some())
        .unwrap();
    let pop = &mut world.provinces[stockholm.0 as usize].pops[pop_slot];
    let cash_before = pop.cash;

    let rate = Fixed::from_fraction(1, 10);
    let tax = pop.add_artisanal_revenue(Fixed::from_int(100), true, Fixed::from_int(60), rate);

    assert_eq!(tax, Fixed::from_int(4));
    assert_eq!(pop.income_ledger.artisanal_revenue, Fixed::from_int(100));
    assert_eq!(pop.cash - cash_before, Fixed::from_int(96));
}

/// In exponential mode the price band floors at epsilon and a persistent
/// glut cannot push the price below it.
#[test]
fn exponential_price_floor_clamps_at_epsilon() {
    let config = SimConfig {
        exponential_price_changes: true,
        ..SimConfig::default()
    };
    let mut good = test_good(Fixed::EPSILON, &config);
    assert_eq!(good.min_next_price(), Fixed::EPSILON);

    for _ in 0..10 {
        assert!(good.add_buy_up_to_order(buy(1, 10)).is_ok());
        assert!(good.add_market_sell_order(sell(50)).is_ok());
        let mut buys = Vec::new();
        let mut sells = Vec::new();
        good.execute_orders(&config, &mut buys, &mut sells);
        assert_eq!(good.price(), Fixed::EPSILON);
        assert!(good.min_next_price() >= Fixed::EPSILON);
    }
}

/// JSON mod data loads into locked registries through the convenience
/// entry point.
#[test]
fn definitions_load_from_json() {
    let text = r#"{
        "goods": [
            {"identifier": "grain", "category": "raw_material_goods", "base_price": 2.0}
        ],
        "pop_types": [
            {"identifier": "farmers", "strata": "poor",
             "life_needs": [{"good": "grain", "base_amount": 1.5}]}
        ]
    }"#;
    let defs = crate::defs::Definitions::from_json_str(text).unwrap();
    assert!(defs.goods.is_locked());
    assert_eq!(defs.goods.len(), 1);
    let farmers = defs.pop_types.by_identifier("farmers").unwrap();
    let grain = defs.goods.index_of("grain").unwrap();
    assert!(farmers.needs[0].get(grain) > Fixed::ZERO);

    assert!(crate::defs::Definitions::from_json_str("not json").is_err());
}

/// Pop-type counts aggregate across every owned province, and the primary
/// culture tally follows each pop's culture status.
#[test]
fn country_aggregation_counts_clerks() {
    let mut world = WorldBuilder::new()
        .modify_bookmark(|bookmark| {
            for province in &mut bookmark.provinces {
                province.factories.clear();
                province.pops = vec![
                    PopSetup {
                        pop_type: "clerks".to_string(),
                        culture: "swedish".to_string(),
                        religion: "protestant".to_string(),
                        size: 1000,
                        militancy: 0.0,
                        consciousness: 0.0,
                        literacy: 0.5,
                        cash: 100.0,
                        rebel_type: None,
                    },
                    PopSetup {
                        pop_type: "clerks".to_string(),
                        culture: "finnish".to_string(),
                        religion: "protestant".to_string(),
                        size: 500,
                        militancy: 0.0,
                        consciousness: 0.0,
                        literacy: 0.5,
                        cash: 100.0,
                        rebel_type: None,
                    },
                ];
            }
        })
        .build();
    let mut scheduler = Scheduler::new();
    scheduler.tick(&mut world);

    let sweden = world.defs().countries.index_of("SWE").unwrap();
    let clerks = world.defs().pop_types.index_of("clerks").unwrap();
    let country = world.country(sweden);
    assert_eq!(country.pop_type_counts[clerks], Fixed::from_int(3000));
    assert_eq!(country.total_population, 3000);
    // only the swedish pops count as primary culture
    assert_eq!(country.primary_culture_population, 2000);
}
