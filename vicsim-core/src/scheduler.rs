//! The day-tick scheduler.
//!
//! One tick advances the date and runs the fixed phase sequence: modifier
//! refresh, producers, pops, country transfers, market clearing, gamestate
//! update, events, record-keeping. Everything is single-threaded and runs
//! to completion; an external stop request is honoured only between ticks.
//! Per-tick scratch buffers live here and are reused across days.

use crate::defs::modifiers::EffectIndex;
use crate::defs::politics::CountryIndex;
use crate::defs::production::{ProductionTypeDef, ProductionTypeIndex};
use crate::fixed::Fixed;
use crate::market::{BuyOutcome, Market, OrderActor, SellOutcome};
use crate::modifier_sum::ContributionSource;
use crate::pop::{IncomeStream, Pop, SharedNeedsValues};
use crate::production::{Employee, OrderBatch, ProducerEffects};
use crate::province::ProvinceInstance;
use crate::scripts::{Scope, ScopeCtx};
use crate::world::World;
use tracing::instrument;
use vicdata::pops::Strata;
use vicdata::rules::Rule;

/// Per-producer context captured in the read-only pass: effect factors and
/// the evaluated bonus multiplier.
#[derive(Debug, Clone, Copy)]
struct ProducerCtx {
    effects: ProducerEffects,
    bonus: Fixed,
}

impl Default for ProducerCtx {
    fn default() -> Self {
        Self {
            effects: ProducerEffects::default(),
            bonus: Fixed::ONE,
        }
    }
}

#[derive(Debug, Default)]
struct ProvinceProducerCtx {
    rgo: ProducerCtx,
    factories: Vec<ProducerCtx>,
    /// Bonus per artisan recipe, aligned with the scratch recipe list.
    artisan_bonus: Vec<Fixed>,
    artisan_effects: ProducerEffects,
}

#[derive(Debug, Default)]
struct TickScratch {
    batch: OrderBatch,
    buy_outcomes: Vec<BuyOutcome>,
    sell_outcomes: Vec<SellOutcome>,
    rejected_buys: Vec<BuyOutcome>,
    rejected_sells: Vec<SellOutcome>,
    producer_ctx: Vec<ProvinceProducerCtx>,
    artisan_recipes: Vec<ProductionTypeIndex>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    stop_requested: bool,
    scratch: TickScratch,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the scheduler to refuse further ticks. Observed between ticks
    /// only; a running tick always completes.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Run one day unless a stop was requested. Returns whether a tick ran.
    pub fn try_tick(&mut self, world: &mut World) -> bool {
        if self.stop_requested {
            return false;
        }
        self.tick(world);
        true
    }

    /// Advance the date by one day and run the full phase sequence.
    #[instrument(skip_all, name = "day_tick")]
    pub fn tick(&mut self, world: &mut World) {
        world.date = world.date.add_days(1);
        for country in &mut world.countries {
            country.tax_income_today = Fixed::ZERO;
            country.tariff_income_today = Fixed::ZERO;
        }

        refresh_modifiers(world);
        self.producer_phase(world);
        self.pop_phase(world);
        country_transfer_phase(world);
        self.clearing_phase(world);
        gamestate_phase(world);
        event_phase(world);
        self.record_phase(world);
    }

    /// Phase 2: hire, produce, and place producer orders.
    #[instrument(skip_all, name = "producer_phase")]
    fn producer_phase(&mut self, world: &mut World) {
        self.scratch.artisan_recipes = world.defs.artisan_recipes();
        self.collect_producer_ctx(world);

        let scratch = &mut self.scratch;
        {
            let World {
                defs,
                provinces,
                market,
                ..
            } = world;
            let wage = defs.defines.factory_daily_wage_per_worker;
            for (index, province) in provinces.iter_mut().enumerate() {
                let province_index = province.province;
                let owner = province.owner;
                let ctx = &scratch.producer_ctx[index];
                let ProvinceInstance {
                    rgo,
                    factories,
                    pops,
                    ..
                } = province;

                if let Some(rgo) = rgo.as_mut() {
                    let recipe = defs.production_types.get(rgo.production_type);
                    hire(&mut rgo.employees, recipe, rgo.size_multiplier, pops);
                    rgo.tick(
                        province_index,
                        owner,
                        recipe,
                        ctx.rgo.effects,
                        ctx.rgo.bonus,
                        |good| market.good(good).price(),
                        &mut scratch.batch,
                    );
                }

                for (slot, factory) in factories.iter_mut().enumerate() {
                    let recipe = defs.production_types.get(factory.production_type);
                    hire(&mut factory.employees, recipe, factory.size_multiplier, pops);
                    let factory_ctx = ctx
                        .factories
                        .get(slot)
                        .copied()
                        .unwrap_or_default();
                    factory.tick(
                        province_index,
                        slot as u32,
                        owner,
                        recipe,
                        factory_ctx.effects,
                        factory_ctx.bonus,
                        wage,
                        |good| market.good(good).price(),
                        &mut scratch.batch,
                    );
                }
            }
        }
        submit_orders(
            &world.market,
            &mut scratch.batch,
            &mut scratch.rejected_buys,
            &mut scratch.rejected_sells,
        );
    }

    /// Read-only pass evaluating producer effects and bonus conditions.
    fn collect_producer_ctx(&mut self, world: &World) {
        let ids = &world.defs().effect_ids;
        let rgo_effects = (ids.rgo_input, ids.rgo_output, ids.rgo_throughput);
        let factory_effects = (ids.factory_input, ids.factory_output, ids.factory_throughput);
        let artisan_effects = (ids.artisan_input, ids.artisan_output, ids.artisan_throughput);

        self.scratch.producer_ctx.clear();
        for province in &world.provinces {
            let scope = ScopeCtx::on(Scope::Province(province.province));
            let mut ctx = ProvinceProducerCtx {
                artisan_effects: producer_effects(world, province, artisan_effects),
                ..Default::default()
            };
            if let Some(rgo) = &province.rgo {
                let recipe = world.defs().production_types.get(rgo.production_type);
                ctx.rgo = ProducerCtx {
                    effects: producer_effects(world, province, rgo_effects),
                    bonus: bonus_multiplier(world, recipe, &scope),
                };
            }
            for factory in &province.factories {
                let recipe = world.defs().production_types.get(factory.production_type);
                ctx.factories.push(ProducerCtx {
                    effects: producer_effects(world, province, factory_effects),
                    bonus: bonus_multiplier(world, recipe, &scope),
                });
            }
            for recipe_index in &self.scratch.artisan_recipes {
                let recipe = world.defs().production_types.get(*recipe_index);
                ctx.artisan_bonus.push(bonus_multiplier(world, recipe, &scope));
            }
            self.scratch.producer_ctx.push(ctx);
        }
    }

    /// Phase 3: per-province, per-pop daily pipeline through order
    /// placement.
    #[instrument(skip_all, name = "pop_phase")]
    fn pop_phase(&mut self, world: &mut World) {
        let scratch = &mut self.scratch;
        {
            let World {
                defs,
                provinces,
                market,
                ..
            } = world;
            let defines = &defs.defines;
            let catalogue = &defs.modifier_effects;
            let ids = &defs.effect_ids;

            for (index, province) in provinces.iter_mut().enumerate() {
                let owner = province.owner;
                let shared = shared_needs_values(province, defines, catalogue, ids);
                let artisan_effects = scratch.producer_ctx[index].artisan_effects;

                for pop in &mut province.pops {
                    pop.start_day();
                    let pop_type = defs.pop_types.get(pop.pop_type);
                    let pop_ref = pop.pop_ref();

                    // Step 2: the artisan works before needs are computed.
                    let mut reserved_cash = Fixed::ZERO;
                    if pop.artisan.is_some() {
                        pop.employed = pop.size;
                        let cash_cap = pop.cash * defines.artisanal_spending_fraction;
                        if let Some(artisan) = pop.artisan.as_mut() {
                            let chosen = artisan.select_recipe(&scratch.artisan_recipes, |recipe| {
                                let output = defs.production_types.get(recipe).output_good;
                                market.good(output).is_trading_good()
                            });
                            if let Some(recipe_index) = chosen {
                                let slot = scratch
                                    .artisan_recipes
                                    .iter()
                                    .position(|r| *r == recipe_index);
                                let bonus = slot
                                    .and_then(|s| {
                                        scratch.producer_ctx[index].artisan_bonus.get(s).copied()
                                    })
                                    .unwrap_or(Fixed::ONE);
                                let recipe = defs.production_types.get(recipe_index);
                                reserved_cash = artisan.tick(
                                    pop_ref,
                                    owner,
                                    recipe,
                                    artisan_effects,
                                    bonus,
                                    cash_cap,
                                    |good| market.good(good).price(),
                                    &mut scratch.batch,
                                );
                            }
                        }
                    }

                    // Steps 4–6: needs and allocation.
                    let strata_shared = shared[pop_type.strata.index()];
                    pop.compute_and_order_needs(
                        pop_type,
                        defines,
                        &strata_shared,
                        owner,
                        reserved_cash,
                        |good| market.good(good).is_trading_good(),
                        |good| market.good(good).price(),
                        |good| market.good(good).min_next_price(),
                        &mut scratch.batch,
                    );

                    // Step 7: leftover artisan output goes to market.
                    if let Some(artisan) = pop.artisan.as_ref() {
                        if let Some(recipe_index) = artisan.production_type {
                            let recipe = defs.production_types.get(recipe_index);
                            for (good, quantity) in artisan.sellable_leftovers(recipe) {
                                scratch.batch.sells.push(crate::market::MarketSellOrder {
                                    good,
                                    country: owner,
                                    quantity,
                                    actor: OrderActor::Artisan(pop_ref),
                                });
                            }
                        }
                    }
                }
            }
        }
        submit_orders(
            &world.market,
            &mut scratch.batch,
            &mut scratch.rejected_buys,
            &mut scratch.rejected_sells,
        );
    }

    /// Phase 5: clear every good in index order and route the outcomes in
    /// firing order.
    #[instrument(skip_all, name = "market_clearing")]
    fn clearing_phase(&mut self, world: &mut World) {
        let scratch = &mut self.scratch;
        scratch.buy_outcomes.clear();
        scratch.sell_outcomes.clear();
        {
            let World { market, config, .. } = world;
            market.execute_all_orders(config, &mut scratch.buy_outcomes, &mut scratch.sell_outcomes);
        }
        for outcome in scratch.rejected_buys.drain(..) {
            route_buy_outcome(world, outcome);
        }
        for outcome in scratch.buy_outcomes.drain(..) {
            route_buy_outcome(world, outcome);
        }
        for outcome in scratch.rejected_sells.drain(..) {
            route_sell_outcome(world, outcome);
        }
        for outcome in scratch.sell_outcomes.drain(..) {
            route_sell_outcome(world, outcome);
        }
    }

    /// Phase 8: price history samples and scratch reset.
    #[instrument(skip_all, name = "record_keeping")]
    fn record_phase(&mut self, world: &mut World) {
        world.market.record_price_history(world.date);
        self.scratch.batch.clear();
        self.scratch.buy_outcomes.clear();
        self.scratch.sell_outcomes.clear();
        self.scratch.rejected_buys.clear();
        self.scratch.rejected_sells.clear();
    }
}

fn producer_effects(
    world: &World,
    province: &ProvinceInstance,
    (input, output, throughput): (EffectIndex, EffectIndex, EffectIndex),
) -> ProducerEffects {
    let catalogue = &world.defs().modifier_effects;
    ProducerEffects {
        input: Fixed::ONE + province.modifier_total(input, catalogue),
        output: Fixed::ONE + province.modifier_total(output, catalogue),
        throughput: Fixed::ONE + province.modifier_total(throughput, catalogue),
    }
}

/// `1 + Σ value` over the recipe bonuses whose condition holds in scope.
fn bonus_multiplier(world: &World, recipe: &ProductionTypeDef, scope: &ScopeCtx) -> Fixed {
    let mut bonus = Fixed::ONE;
    for entry in &recipe.bonuses {
        if entry.condition.evaluate(world, scope) {
            bonus += entry.value;
        }
    }
    bonus
}

/// Per-strata needs scalars for one province: the defines' strata factors
/// scaled by the province's needs-cost modifiers.
fn shared_needs_values(
    province: &ProvinceInstance,
    defines: &crate::defs::SimDefines,
    catalogue: &crate::registry::Registry<EffectIndex, crate::defs::modifiers::ModifierEffect>,
    ids: &crate::defs::modifiers::EffectIds,
) -> [SharedNeedsValues; Strata::COUNT] {
    let category_effects = [
        Fixed::ONE + province.modifier_total(ids.life_needs, catalogue),
        Fixed::ONE + province.modifier_total(ids.everyday_needs, catalogue),
        Fixed::ONE + province.modifier_total(ids.luxury_needs, catalogue),
    ];
    let mut shared = [SharedNeedsValues::default(); Strata::COUNT];
    for (strata_slot, values) in shared.iter_mut().enumerate() {
        for category in 0..3 {
            values.category_scalars[category] =
                defines.strata_need_scalars[category][strata_slot] * category_effects[category];
        }
    }
    shared
}

/// Fill a producer's employee roster from the province's pops, in pop
/// order, respecting each job's capacity share.
fn hire(
    employees: &mut Vec<Employee>,
    recipe: &ProductionTypeDef,
    size_multiplier: Fixed,
    pops: &mut [Pop],
) {
    employees.clear();
    let capacity_total = Fixed::from_int(recipe.base_workforce_size) * size_multiplier;
    for (job_index, job) in recipe.employees.iter().enumerate() {
        let mut job_capacity = (capacity_total * job.amount).to_int();
        if job_capacity <= 0 {
            continue;
        }
        for pop in pops.iter_mut() {
            if job_capacity <= 0 {
                break;
            }
            if pop.pop_type != job.pop_type {
                continue;
            }
            let available = (pop.size - pop.employed).max(0);
            let hired = available.min(job_capacity);
            if hired <= 0 {
                continue;
            }
            pop.employed += hired;
            job_capacity -= hired;
            employees.push(Employee {
                pop: pop.pop_ref(),
                size: hired,
                job: job_index as u32,
            });
        }
    }
}

fn submit_orders(
    market: &Market,
    batch: &mut OrderBatch,
    rejected_buys: &mut Vec<BuyOutcome>,
    rejected_sells: &mut Vec<SellOutcome>,
) {
    for order in batch.buys.drain(..) {
        if let Err(outcome) = market.good(order.good).add_buy_up_to_order(order) {
            rejected_buys.push(outcome);
        }
    }
    for order in batch.sells.drain(..) {
        if let Err(outcome) = market.good(order.good).add_market_sell_order(order) {
            rejected_sells.push(outcome);
        }
    }
}

/// Phase 1: rebuild the modifier-sum caches. Both configured build orders
/// must produce bitwise identical caches; owner propagation always runs
/// after the country pools are current.
#[instrument(skip_all, name = "modifier_refresh")]
pub fn refresh_modifiers(world: &mut World) {
    use crate::config::ModifierBuildOrder;
    match world.config.modifier_build_order {
        ModifierBuildOrder::CountriesThenProvinces => {
            rebuild_country_sums(world);
            rebuild_province_local_sums(world);
        }
        ModifierBuildOrder::ProvincesThenCountries => {
            rebuild_province_local_sums(world);
            rebuild_country_sums(world);
        }
    }
    propagate_owner_sums(world);
}

fn rebuild_country_sums(world: &mut World) {
    let date = world.date;
    let World {
        defs, countries, ..
    } = world;
    for country in countries.iter_mut() {
        country
            .timed_modifiers
            .retain(|active| active.expires.map_or(true, |expires| expires > date));
        country.modifiers.clear();

        let active_issues: Vec<_> = country
            .active_issues
            .values()
            .iter()
            .flatten()
            .copied()
            .collect();
        for issue in active_issues {
            if let Some(modifier) = defs.issues.get(issue).modifier {
                country.modifiers.add_modifier(
                    defs.named_modifiers.get(modifier),
                    ContributionSource::Reform(issue),
                );
            }
        }
        if let Some(national_value) = country.national_value {
            if let Some(modifier) = defs.national_values.get(national_value).modifier {
                country.modifiers.add_modifier(
                    defs.named_modifiers.get(modifier),
                    ContributionSource::NationalValue(national_value),
                );
            }
        }
        for slot in 0..country.timed_modifiers.len() {
            let active = country.timed_modifiers[slot];
            country.modifiers.add_modifier(
                defs.named_modifiers.get(active.modifier),
                ContributionSource::TimedModifier(active.modifier),
            );
        }
    }
}

fn rebuild_province_local_sums(world: &mut World) {
    let date = world.date;
    let World {
        defs, provinces, ..
    } = world;
    for province in provinces.iter_mut() {
        province
            .timed_modifiers
            .retain(|active| active.expires.map_or(true, |expires| expires > date));
        province.local_modifiers.clear();

        if let Some(terrain) = defs.provinces.get(province.province).terrain {
            if let Some(modifier) = defs.terrains.get(terrain).modifier {
                province.local_modifiers.add_modifier(
                    defs.named_modifiers.get(modifier),
                    ContributionSource::Terrain(terrain),
                );
            }
        }
        for slot in 0..province.timed_modifiers.len() {
            let active = province.timed_modifiers[slot];
            province.local_modifiers.add_modifier(
                defs.named_modifiers.get(active.modifier),
                ContributionSource::TimedModifier(active.modifier),
            );
        }
    }
}

fn propagate_owner_sums(world: &mut World) {
    let World {
        provinces,
        countries,
        ..
    } = world;
    for province in provinces.iter_mut() {
        province.owner_modifiers.clear();
        if let Some(owner) = province.owner {
            province
                .owner_modifiers
                .add_sum(&countries[owner.0 as usize].modifiers);
        }
    }
}

/// Phase 4: welfare, salary and factory-subsidy transfers out of each
/// treasury, credited through the pop income helpers.
#[instrument(skip_all, name = "country_transfers")]
fn country_transfer_phase(world: &mut World) {
    for country_slot in 0..world.countries.len() {
        let (
            owned,
            subsidy_rate,
            pension_rate,
            salary_rate,
            import_refund,
            tax_rates,
            mut treasury_left,
            subsidise_factories,
        ) = {
            let country = &world.countries[country_slot];
            (
                country.owned_provinces.clone(),
                country.unemployment_subsidy_per_capita,
                country.pension_per_capita,
                country.administration_salary_per_capita,
                country.import_subsidies_fraction,
                country.effective_tax_rate,
                country.treasury,
                country.subsidise_factories && country.rules.allows(Rule::CanSubsidise),
            )
        };
        let has_welfare = subsidy_rate > Fixed::ZERO
            || pension_rate > Fixed::ZERO
            || salary_rate > Fixed::ZERO
            || import_refund > Fixed::ZERO;
        if !has_welfare && !subsidise_factories {
            continue;
        }

        let mut tax_back = Fixed::ZERO;
        let defs = &world.defs;
        for &province_index in &owned {
            let province = &mut world.provinces[province_index.0 as usize];
            if has_welfare {
                for pop in &mut province.pops {
                    let pop_type = defs.pop_types.get(pop.pop_type);
                    let tax_rate = tax_rates[pop_type.strata.index()];

                    if subsidy_rate > Fixed::ZERO && pop_type.can_be_unemployed {
                        let unemployed = (pop.size - pop.employed_yesterday).max(0);
                        let amount = (subsidy_rate * Fixed::from_int(unemployed))
                            .min(treasury_left.max(Fixed::ZERO));
                        if amount > Fixed::ZERO {
                            treasury_left -= amount;
                            tax_back +=
                                pop.add_income(IncomeStream::UnemploymentSubsidy, amount, tax_rate);
                        }
                    }
                    if pension_rate > Fixed::ZERO {
                        let amount = (pension_rate * Fixed::from_int(pop.size))
                            .min(treasury_left.max(Fixed::ZERO));
                        if amount > Fixed::ZERO {
                            treasury_left -= amount;
                            tax_back += pop.add_income(IncomeStream::Pension, amount, tax_rate);
                        }
                    }
                    if salary_rate > Fixed::ZERO && pop_type.strata == Strata::Middle {
                        let amount = (salary_rate * Fixed::from_int(pop.size))
                            .min(treasury_left.max(Fixed::ZERO));
                        if amount > Fixed::ZERO {
                            treasury_left -= amount;
                            tax_back +=
                                pop.add_income(IncomeStream::AdministrationSalary, amount, tax_rate);
                        }
                    }
                    if import_refund > Fixed::ZERO {
                        let amount = (import_refund * pop.yesterdays_import_value)
                            .min(treasury_left.max(Fixed::ZERO));
                        if amount > Fixed::ZERO {
                            treasury_left -= amount;
                            pop.add_import_subsidies(amount);
                        }
                    }
                }
            }
            if subsidise_factories {
                for factory in &mut province.factories {
                    if factory.budget < Fixed::ZERO {
                        let topup = (-factory.budget).min(treasury_left.max(Fixed::ZERO));
                        if topup > Fixed::ZERO {
                            treasury_left -= topup;
                            factory.receive_subsidy(topup);
                        }
                    }
                }
            }
        }

        let country = &mut world.countries[country_slot];
        country.treasury = treasury_left + tax_back;
        country.tax_income_today += tax_back;
    }
}

fn route_buy_outcome(world: &mut World, outcome: BuyOutcome) {
    let result = outcome.result;
    match outcome.actor {
        OrderActor::Pop(pop_ref) => {
            let owner = world.province(pop_ref.province).owner;
            let tariff_rate = owner
                .map(|country| world.country(country).effective_tariff_rate)
                .unwrap_or(Fixed::ZERO);
            let Some(pop) = world.pop_mut(pop_ref) else {
                log::error!("buy outcome for missing pop {pop_ref:?}");
                return;
            };
            let tariff = pop.on_needs_bought(result, tariff_rate);
            credit_tariff(world, owner, tariff);
        }
        OrderActor::Artisan(pop_ref) => {
            let owner = world.province(pop_ref.province).owner;
            let tariff_rate = owner
                .map(|country| world.country(country).effective_tariff_rate)
                .unwrap_or(Fixed::ZERO);
            let Some(pop) = world.pop_mut(pop_ref) else {
                log::error!("buy outcome for missing artisan pop {pop_ref:?}");
                return;
            };
            let tariff = pop.on_artisan_inputs_bought(result, tariff_rate);
            credit_tariff(world, owner, tariff);
        }
        OrderActor::Rgo(province_index) => {
            if let Some(rgo) = world.province_mut(province_index).rgo.as_mut() {
                rgo.on_inputs_bought(result.good, result.quantity_bought, result.money_spent_total);
            }
        }
        OrderActor::Factory { province, slot } => {
            if let Some(factory) = world
                .province_mut(province)
                .factories
                .get_mut(slot as usize)
            {
                factory.on_inputs_bought(
                    result.good,
                    result.quantity_bought,
                    result.money_spent_total,
                );
            } else {
                log::error!("buy outcome for missing factory slot {slot} in {province:?}");
            }
        }
        OrderActor::Country(_) => {
            log::debug!("unrouted national buy outcome for {:?}", result.good);
        }
    }
}

fn credit_tariff(world: &mut World, owner: Option<CountryIndex>, tariff: Fixed) {
    if tariff <= Fixed::ZERO {
        return;
    }
    if let Some(owner) = owner {
        let country = world.country_mut(owner);
        country.treasury += tariff;
        country.tariff_income_today += tariff;
    }
}

fn route_sell_outcome(world: &mut World, outcome: SellOutcome) {
    let result = outcome.result;
    match outcome.actor {
        OrderActor::Rgo(province_index) => {
            if let Some(rgo) = world.province_mut(province_index).rgo.as_mut() {
                rgo.on_output_sold(result);
            }
        }
        OrderActor::Factory { province, slot } => {
            if let Some(factory) = world
                .province_mut(province)
                .factories
                .get_mut(slot as usize)
            {
                factory.on_output_sold(result);
            } else {
                log::error!("sell outcome for missing factory slot {slot} in {province:?}");
            }
        }
        OrderActor::Artisan(pop_ref) => {
            let owner = world.province(pop_ref.province).owner;
            let strata = world
                .pop(pop_ref)
                .map(|pop| world.defs().pop_types.get(pop.pop_type).strata);
            let tax_rate = match (owner, strata) {
                (Some(country), Some(strata)) => {
                    world.country(country).effective_tax_rate_for(strata)
                }
                _ => Fixed::ZERO,
            };
            let Some(pop) = world.pop_mut(pop_ref) else {
                log::error!("sell outcome for missing artisan pop {pop_ref:?}");
                return;
            };
            let (taxable, costs) = match pop.artisan.as_mut() {
                Some(artisan) => (artisan.on_sold(result), artisan.costs_of_production),
                None => (false, Fixed::ZERO),
            };
            let tax = pop.add_artisanal_revenue(result.money_gained, taxable, costs, tax_rate);
            credit_tax(world, owner, tax);
        }
        OrderActor::Pop(pop_ref) => {
            log::error!("sell outcome for a non-artisan pop {pop_ref:?}");
        }
        OrderActor::Country(_) => {
            log::debug!("unrouted national sell outcome for {:?}", result.good);
        }
    }
}

fn credit_tax(world: &mut World, owner: Option<CountryIndex>, tax: Fixed) {
    if tax <= Fixed::ZERO {
        return;
    }
    if let Some(owner) = owner {
        let country = world.country_mut(owner);
        country.treasury += tax;
        country.tax_income_today += tax;
    }
}

/// Phase 6: producer payouts and bookkeeping, pop clamps, distribution and
/// country aggregate updates.
#[instrument(skip_all, name = "gamestate_update")]
fn gamestate_phase(world: &mut World) {
    for province_slot in 0..world.provinces.len() {
        distribute_rgo_revenue(world, province_slot);
        distribute_factory_payrolls(world, province_slot);
    }
    update_pops_and_distributions(world);
    update_country_aggregates(world);
}

fn distribute_rgo_revenue(world: &mut World, province_slot: usize) {
    let owner = world.provinces[province_slot].owner;
    let Some((recipe_index, pool, employees)) =
        world.provinces[province_slot].rgo.as_ref().map(|rgo| {
            (
                rgo.production_type,
                rgo.distributable_revenue(),
                rgo.employees.clone(),
            )
        })
    else {
        return;
    };

    let defines_owner_share = world.defs.defines.rgo_owner_share;
    let tax_rates = owner
        .map(|country| world.country(country).effective_tax_rate)
        .unwrap_or([Fixed::ZERO; Strata::COUNT]);
    let mut tax_total = Fixed::ZERO;

    if pool > Fixed::ZERO {
        let defs = &world.defs;
        let recipe = defs.production_types.get(recipe_index);
        let owner_pool = pool * defines_owner_share;
        let wage_pool = pool - owner_pool;

        let province = &mut world.provinces[province_slot];

        if let Some(owner_job) = &recipe.owner {
            let owner_size: i64 = province
                .pops
                .iter()
                .filter(|pop| pop.pop_type == owner_job.pop_type)
                .map(|pop| pop.size)
                .sum();
            if owner_size > 0 {
                for pop in &mut province.pops {
                    if pop.pop_type != owner_job.pop_type {
                        continue;
                    }
                    let amount = owner_pool.mul_div(
                        Fixed::from_int(pop.size),
                        Fixed::from_int(owner_size),
                    );
                    let strata = defs.pop_types.get(pop.pop_type).strata;
                    tax_total +=
                        pop.add_income(IncomeStream::RgoOwner, amount, tax_rates[strata.index()]);
                }
            }
        }

        let total_weight: Fixed = employees
            .iter()
            .map(|employee| {
                let multiplier = recipe
                    .employees
                    .get(employee.job as usize)
                    .map(|job| job.effect_multiplier)
                    .unwrap_or(Fixed::ONE);
                Fixed::from_int(employee.size) * multiplier
            })
            .sum();
        if total_weight > Fixed::ZERO {
            for employee in &employees {
                let multiplier = recipe
                    .employees
                    .get(employee.job as usize)
                    .map(|job| job.effect_multiplier)
                    .unwrap_or(Fixed::ONE);
                let weight = Fixed::from_int(employee.size) * multiplier;
                let amount = wage_pool.mul_div(weight, total_weight);
                if let Some(pop) = province.pops.get_mut(employee.pop.slot as usize) {
                    let strata = defs.pop_types.get(pop.pop_type).strata;
                    tax_total +=
                        pop.add_income(IncomeStream::RgoWorker, amount, tax_rates[strata.index()]);
                }
            }
        }
    }

    if let Some(rgo) = world.provinces[province_slot].rgo.as_mut() {
        rgo.finish_day();
    }
    credit_tax(world, owner, tax_total);
}

fn distribute_factory_payrolls(world: &mut World, province_slot: usize) {
    let owner = world.provinces[province_slot].owner;
    let tax_rates = owner
        .map(|country| world.country(country).effective_tax_rate)
        .unwrap_or([Fixed::ZERO; Strata::COUNT]);
    let owner_share = world.defs.defines.rgo_owner_share;
    let mut tax_total = Fixed::ZERO;

    for factory_slot in 0..world.provinces[province_slot].factories.len() {
        let (recipe_index, paychecks, dividends, employees) = {
            let factory = &world.provinces[province_slot].factories[factory_slot];
            (
                factory.production_type,
                factory.paychecks_today(),
                factory.distributable_dividends() * owner_share,
                factory.employees.clone(),
            )
        };
        let defs = &world.defs;
        let recipe = defs.production_types.get(recipe_index);

        if paychecks > Fixed::ZERO {
            let total_weight: Fixed = employees
                .iter()
                .map(|employee| {
                    let multiplier = recipe
                        .employees
                        .get(employee.job as usize)
                        .map(|job| job.effect_multiplier)
                        .unwrap_or(Fixed::ONE);
                    Fixed::from_int(employee.size) * multiplier
                })
                .sum();
            if total_weight > Fixed::ZERO {
                let province = &mut world.provinces[province_slot];
                for employee in &employees {
                    let multiplier = recipe
                        .employees
                        .get(employee.job as usize)
                        .map(|job| job.effect_multiplier)
                        .unwrap_or(Fixed::ONE);
                    let weight = Fixed::from_int(employee.size) * multiplier;
                    let amount = paychecks.mul_div(weight, total_weight);
                    if let Some(pop) = province.pops.get_mut(employee.pop.slot as usize) {
                        let strata = defs.pop_types.get(pop.pop_type).strata;
                        tax_total += pop.add_income(
                            IncomeStream::FactoryWorker,
                            amount,
                            tax_rates[strata.index()],
                        );
                    }
                }
            }
        }

        if dividends > Fixed::ZERO {
            if let Some(owner_job) = &recipe.owner {
                let province = &mut world.provinces[province_slot];
                let owner_size: i64 = province
                    .pops
                    .iter()
                    .filter(|pop| pop.pop_type == owner_job.pop_type)
                    .map(|pop| pop.size)
                    .sum();
                if owner_size > 0 {
                    let mut paid = Fixed::ZERO;
                    for pop in &mut province.pops {
                        if pop.pop_type != owner_job.pop_type {
                            continue;
                        }
                        let amount = dividends.mul_div(
                            Fixed::from_int(pop.size),
                            Fixed::from_int(owner_size),
                        );
                        let strata = defs.pop_types.get(pop.pop_type).strata;
                        tax_total += pop.add_income(
                            IncomeStream::FactoryOwner,
                            amount,
                            tax_rates[strata.index()],
                        );
                        paid += amount;
                    }
                    province.factories[factory_slot].pay_dividends(paid);
                }
            }
        }

        world.provinces[province_slot].factories[factory_slot].finish_day();
    }
    credit_tax(world, owner, tax_total);
}

fn update_pops_and_distributions(world: &mut World) {
    let World {
        defs, provinces, ..
    } = world;
    let defines = &defs.defines;
    let catalogue = &defs.modifier_effects;
    let ids = &defs.effect_ids;

    for province in provinces.iter_mut() {
        let militancy_drift = province.modifier_total(ids.pop_militancy, catalogue);
        let consciousness_drift = province.modifier_total(ids.pop_consciousness, catalogue);
        let owner_definition = province
            .owner
            .map(|owner| defs.countries.get(owner))
            .map(|definition| {
                (
                    definition.primary_culture,
                    definition.accepted_cultures.as_slice(),
                    definition.regiment_cultures,
                )
            });

        for pop in &mut province.pops {
            pop.militancy += militancy_drift;
            pop.consciousness += consciousness_drift;
            let pop_type = defs.pop_types.get(pop.pop_type);
            let view = owner_definition.map(|(primary, accepted, policy)| {
                crate::pop::PopGamestateView {
                    primary_culture: primary,
                    accepted_cultures: accepted,
                    regiment_cultures: policy,
                    pop_type_can_be_recruited: pop_type.can_be_recruited,
                }
            });
            pop.update_gamestate(defines, view);
        }
        province.update_distributions();
    }
}

fn update_country_aggregates(world: &mut World) {
    let World {
        defs,
        provinces,
        countries,
        ..
    } = world;

    for country in countries.iter_mut() {
        country.pop_type_counts.clear();
        country.culture_counts.clear();
        country.religion_counts.clear();
        country.ideology_counts.clear();
        country.total_population = 0;
        country.primary_culture_population = 0;
        country.average_literacy = Fixed::ZERO;
        country.supported_regiments = 0;
    }

    for province in provinces.iter() {
        let Some(owner) = province.owner else {
            continue;
        };
        let country = &mut countries[owner.0 as usize];
        country.pop_type_counts += &province.pop_type_distribution;
        country.culture_counts += &province.culture_distribution;
        country.religion_counts += &province.religion_distribution;
        country.ideology_counts += &province.ideology_distribution;
        country.total_population += province.total_population;
        for pop in &province.pops {
            if pop.culture_status == crate::pop::CultureStatus::Primary {
                country.primary_culture_population += pop.size;
            }
            country.average_literacy += pop.literacy * Fixed::from_int(pop.size);
            country.supported_regiments += pop.max_supported_regiments;
        }
    }

    for country in countries.iter_mut() {
        if country.total_population > 0 {
            country.average_literacy =
                country.average_literacy / Fixed::from_int(country.total_population);
        }
        country.recompute_rules(defs);
        country.recompute_effective_tax_rates(defs);
        country.recompute_effective_tariff(defs);
        country.generate_research_and_leadership(defs);
    }
}

/// Phase 7: offer every event a daily roll against its mean time to
/// happen; fired effects mutate state through the script helpers.
#[instrument(skip_all, name = "event_phase")]
fn event_phase(world: &mut World) {
    use vicdata::events::EventScopeKind;

    let mut candidates: Vec<(usize, ScopeCtx, Fixed)> = Vec::new();
    for (event_index, event) in world.defs().events.iter() {
        if event.fire_only_once && world.events_fired_once[event_index.0 as usize] {
            continue;
        }
        let scopes: Vec<Scope> = match event.scope {
            EventScopeKind::Country => world
                .countries
                .iter()
                .filter(|country| !country.owned_provinces.is_empty())
                .map(|country| Scope::Country(country.country))
                .collect(),
            EventScopeKind::Province => world
                .provinces
                .iter()
                .filter(|province| province.owner.is_some())
                .map(|province| Scope::Province(province.province))
                .collect(),
        };
        for scope in scopes {
            let ctx = ScopeCtx::on(scope);
            if let Some(trigger) = &event.trigger {
                if !trigger.evaluate(world, &ctx) {
                    continue;
                }
            }
            let mtth_days = event.mean_time_to_happen.evaluate(world, &ctx).max(Fixed::ONE);
            let probability = Fixed::ONE / mtth_days;
            candidates.push((event_index.0 as usize, ctx, probability));
        }
    }

    for (event_slot, ctx, probability) in candidates {
        if world.random_fixed() >= probability {
            continue;
        }
        let event_index = crate::defs::events::EventIndex(event_slot as u32);
        let (effect, fire_only_once) = {
            let event = world.defs().events.get(event_index);
            (event.effect.clone(), event.fire_only_once)
        };
        log::debug!(
            "event {:?} fires",
            world.defs().events.get(event_index).identifier
        );
        effect.apply(world, &ctx);
        if fire_only_once {
            world.events_fired_once[event_slot] = true;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
