//! The world arena: every runtime instance, owned in one place.
//!
//! Cyclic entity references (pop → province → country → pops) are broken
//! by typed dense indices; anything that needs to cross-reference resolves
//! through this arena. Only the scheduler thread mutates it.

use crate::config::SimConfig;
use crate::country::CountryInstance;
use crate::date::Date;
use crate::defs::goods::GoodIndex;
use crate::defs::map::ProvinceIndex;
use crate::defs::modifiers::ModifierIndex;
use crate::defs::politics::{CountryIndex, IssueIndex};
use crate::defs::production::ProducerKind;
use crate::defs::Definitions;
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::market::Market;
use crate::pop::Pop;
use crate::production::{FactoryProducer, ResourceGatheringOperation};
use crate::province::{ActiveModifier, ProvinceInstance};
use crate::scripts::{PopRef, Scope};
use serde::{Deserialize, Serialize};
use vicdata::Bookmark;

#[derive(Debug, Serialize, Deserialize)]
pub struct World {
    pub(crate) defs: Definitions,
    pub config: SimConfig,
    pub date: Date,
    pub market: Market,
    pub provinces: Vec<ProvinceInstance>,
    pub countries: Vec<CountryInstance>,
    /// Events already consumed by their fire-once flag.
    pub events_fired_once: Vec<bool>,
    pub rng_seed: u64,
    rng_state: u64,
}

impl World {
    /// Build the starting state from locked definitions and a bookmark.
    pub fn from_bookmark(
        defs: Definitions,
        config: SimConfig,
        bookmark: &Bookmark,
        rng_seed: u64,
    ) -> Result<Self, ErrorSet> {
        let mut errors = ErrorSet::OK;

        let date: Date = match bookmark.date.parse() {
            Ok(date) => date,
            Err(err) => {
                log::error!("bookmark start date {:?}: {}", bookmark.date, err);
                return Err(ErrorCode::InvalidData.into());
            }
        };

        let market = Market::new(&defs.goods, &config);
        let mut provinces: Vec<ProvinceInstance> = defs
            .provinces
            .indices()
            .map(|index| {
                ProvinceInstance::new(
                    index,
                    defs.pop_types.len(),
                    defs.cultures.len(),
                    defs.religions.len(),
                    defs.ideologies.len(),
                )
            })
            .collect();
        let mut countries: Vec<CountryInstance> = defs
            .countries
            .indices()
            .map(|index| CountryInstance::new(index, &defs))
            .collect();

        for setup in &bookmark.countries {
            let Some(country_index) = defs.countries.index_of(&setup.tag) else {
                log::error!("bookmark names unknown country {:?}", setup.tag);
                errors.insert(ErrorCode::DoesNotExist);
                continue;
            };
            let country = &mut countries[country_index.0 as usize];
            if let Some(government) = &setup.government {
                match defs.governments.expect(government) {
                    Ok(index) => country.government = Some(index),
                    Err(err) => errors |= err,
                }
            }
            if let Some(national_value) = &setup.national_value {
                match defs.national_values.expect(national_value) {
                    Ok(index) => country.national_value = Some(index),
                    Err(err) => errors |= err,
                }
            }
            if let Some(ruling_party) = &setup.ruling_party {
                let definition = defs.countries.get(country_index);
                match definition
                    .parties
                    .iter()
                    .position(|party| &party.identifier == ruling_party)
                {
                    Some(slot) => {
                        country.ruling_party = Some(slot as u32);
                        for &policy in &definition.parties[slot].policies {
                            country.set_active_issue(defs.issues.get(policy).group, policy);
                        }
                    }
                    None => {
                        log::error!(
                            "country {:?} has no party {:?}",
                            setup.tag,
                            ruling_party
                        );
                        errors.insert(ErrorCode::DoesNotExist);
                    }
                }
            }
            for reform in &setup.reforms {
                match defs.issues.expect(reform) {
                    Ok(issue) => {
                        if defs.issues.get(issue).is_reform() {
                            country.set_active_issue(defs.issues.get(issue).group, issue);
                        } else {
                            log::error!("bookmark reform {:?} is a party policy", reform);
                            errors.insert(ErrorCode::InvalidData);
                        }
                    }
                    Err(err) => errors |= err,
                }
            }
            for technology in &setup.technologies {
                country.technologies.insert(technology.clone());
            }
            for flag in &setup.flags {
                country.flags.insert(flag.clone());
            }
            country.prestige = Fixed::from_f64(setup.prestige);
            country.plurality = Fixed::from_f64(setup.plurality);
            country.treasury = Fixed::from_f64(setup.treasury);
            country.tax_rate = [
                Fixed::from_f64(setup.tax_rate.poor),
                Fixed::from_f64(setup.tax_rate.middle),
                Fixed::from_f64(setup.tax_rate.rich),
            ];
            country.effective_tax_rate = country.tax_rate;
            country.tariff_rate = Fixed::from_f64(setup.tariff_rate);
            country.effective_tariff_rate = country.tariff_rate;
            country.recompute_rules(&defs);
        }

        for setup in &bookmark.provinces {
            let Some(province_index) = defs.provinces.index_of(&setup.province) else {
                log::error!("bookmark names unknown province {:?}", setup.province);
                errors.insert(ErrorCode::DoesNotExist);
                continue;
            };
            let definition = defs.provinces.get(province_index);
            if definition.water && (setup.owner.is_some() || !setup.pops.is_empty()) {
                log::error!("bookmark settles water province {:?}", setup.province);
                errors.insert(ErrorCode::InvalidData);
                continue;
            }

            let owner = match &setup.owner {
                Some(tag) => match defs.countries.expect(tag) {
                    Ok(index) => Some(index),
                    Err(err) => {
                        errors |= err;
                        None
                    }
                },
                None => None,
            };
            let controller = match &setup.controller {
                Some(tag) => match defs.countries.expect(tag) {
                    Ok(index) => Some(index),
                    Err(err) => {
                        errors |= err;
                        None
                    }
                },
                None => owner,
            };

            let province = &mut provinces[province_index.0 as usize];
            province.owner = owner;
            province.controller = controller;
            for core in &setup.cores {
                match defs.countries.expect(core) {
                    Ok(index) => province.cores.push(index),
                    Err(err) => errors |= err,
                }
            }
            if let Some(owner) = owner {
                countries[owner.0 as usize].owned_provinces.push(province_index);
            }
            if let Some(controller) = controller {
                countries[controller.0 as usize]
                    .controlled_provinces
                    .push(province_index);
            }

            // The RGO comes from static geography plus the bookmark's size.
            if let Some(recipe_name) = &definition.rgo_production_type {
                match defs.production_types.expect(recipe_name) {
                    Ok(recipe_index) => {
                        let recipe = defs.production_types.get(recipe_index);
                        if recipe.kind != ProducerKind::Rgo {
                            log::error!(
                                "province {:?} RGO recipe {:?} is not an RGO type",
                                setup.province,
                                recipe_name
                            );
                            errors.insert(ErrorCode::InvalidData);
                        } else {
                            let size = if setup.rgo_size_multiplier > 0.0 {
                                Fixed::from_f64(setup.rgo_size_multiplier)
                            } else {
                                Fixed::ONE
                            };
                            province.rgo =
                                Some(ResourceGatheringOperation::new(recipe_index, size));
                        }
                    }
                    Err(err) => errors |= err,
                }
            }

            for factory in &setup.factories {
                match defs.production_types.expect(&factory.production_type) {
                    Ok(recipe_index) => {
                        let recipe = defs.production_types.get(recipe_index);
                        if recipe.kind != ProducerKind::Factory {
                            log::error!(
                                "bookmark factory {:?} is not a factory recipe",
                                factory.production_type
                            );
                            errors.insert(ErrorCode::InvalidData);
                            continue;
                        }
                        province.factories.push(FactoryProducer::new(
                            recipe_index,
                            Fixed::from_f64(factory.size_multiplier),
                            Fixed::from_f64(factory.budget),
                        ));
                    }
                    Err(err) => errors |= err,
                }
            }

            for pop_setup in &setup.pops {
                let pop_type = match defs.pop_types.expect(&pop_setup.pop_type) {
                    Ok(index) => index,
                    Err(err) => {
                        errors |= err;
                        continue;
                    }
                };
                let culture = match defs.cultures.expect(&pop_setup.culture) {
                    Ok(index) => index,
                    Err(err) => {
                        errors |= err;
                        continue;
                    }
                };
                let religion = match defs.religions.expect(&pop_setup.religion) {
                    Ok(index) => index,
                    Err(err) => {
                        errors |= err;
                        continue;
                    }
                };
                if pop_setup.size <= 0 {
                    log::error!(
                        "bookmark pop in {:?} has non-positive size {}",
                        setup.province,
                        pop_setup.size
                    );
                    errors.insert(ErrorCode::InvalidData);
                    continue;
                }
                let mut pop = Pop::new(
                    pop_type,
                    defs.pop_types.get(pop_type).is_artisan,
                    culture,
                    religion,
                    pop_setup.size,
                    province_index,
                    0,
                    defs.ideologies.len(),
                );
                pop.militancy = Fixed::from_f64(pop_setup.militancy);
                pop.consciousness = Fixed::from_f64(pop_setup.consciousness);
                pop.literacy = Fixed::from_f64(pop_setup.literacy);
                pop.cash = Fixed::from_f64(pop_setup.cash);
                if let Some(rebel_type) = &pop_setup.rebel_type {
                    match defs.rebel_types.expect(rebel_type) {
                        Ok(index) => pop.rebel_type = Some(index),
                        Err(err) => errors |= err,
                    }
                }

                // Start with an even spread over the unlocked ideologies,
                // rescaled to pop size.
                for (ideology_index, ideology) in defs.ideologies.iter() {
                    if ideology.available_from_start {
                        pop.ideology_distribution[ideology_index] = Fixed::ONE;
                    }
                }
                pop.ideology_distribution
                    .rescale(Fixed::from_int(pop_setup.size));

                if let Some(owner) = owner {
                    pop.reset_party_votes(defs.countries.get(owner).parties.len());
                }
                province.add_pop(pop);
            }
            province.update_distributions();
        }

        if !errors.is_ok() {
            return Err(errors);
        }

        let events_fired_once = vec![false; defs.events.len()];
        Ok(Self {
            defs,
            config,
            date,
            market,
            provinces,
            countries,
            events_fired_once,
            rng_seed,
            rng_state: if rng_seed == 0 { 1 } else { rng_seed },
        })
    }

    pub fn defs(&self) -> &Definitions {
        &self.defs
    }

    pub fn country(&self, index: CountryIndex) -> &CountryInstance {
        &self.countries[index.0 as usize]
    }

    pub fn country_mut(&mut self, index: CountryIndex) -> &mut CountryInstance {
        &mut self.countries[index.0 as usize]
    }

    pub fn province(&self, index: ProvinceIndex) -> &ProvinceInstance {
        &self.provinces[index.0 as usize]
    }

    pub fn province_mut(&mut self, index: ProvinceIndex) -> &mut ProvinceInstance {
        &mut self.provinces[index.0 as usize]
    }

    pub fn pop(&self, pop: PopRef) -> Option<&Pop> {
        self.provinces
            .get(pop.province.0 as usize)
            .and_then(|province| province.pops.get(pop.slot as usize))
    }

    pub fn pop_mut(&mut self, pop: PopRef) -> Option<&mut Pop> {
        self.provinces
            .get_mut(pop.province.0 as usize)
            .and_then(|province| province.pops.get_mut(pop.slot as usize))
    }

    /// The country that collects taxes and tariffs on activity in a
    /// province.
    pub fn tax_collector_of(&self, province: ProvinceIndex) -> Option<CountryIndex> {
        self.province(province).owner
    }

    /// Land province with at least one water neighbour.
    pub fn province_is_coastal(&self, province: ProvinceIndex) -> bool {
        let definition = self.defs.provinces.get(province);
        if definition.water {
            return false;
        }
        definition
            .adjacencies
            .iter()
            .any(|adjacency| self.defs.provinces.get(adjacency.to).water)
    }

    pub fn scope_country(&self, scope: Scope) -> Option<CountryIndex> {
        match scope {
            Scope::Country(country) => Some(country),
            Scope::Province(province) => self.province(province).owner,
            Scope::Pop(pop) => self
                .pop(pop)
                .and_then(|p| self.province(p.location).owner),
            Scope::State(_) | Scope::None => None,
        }
    }

    pub fn scope_province(&self, scope: Scope) -> Option<ProvinceIndex> {
        match scope {
            Scope::Province(province) => Some(province),
            Scope::Pop(pop) => self.pop(pop).map(|p| p.location),
            _ => None,
        }
    }

    pub fn for_each_pop_in_scope(&mut self, scope: Scope, mut apply: impl FnMut(&mut Pop)) {
        match scope {
            Scope::Pop(pop) => {
                if let Some(pop) = self.pop_mut(pop) {
                    apply(pop);
                }
            }
            Scope::Province(province) => {
                for pop in &mut self.province_mut(province).pops {
                    apply(pop);
                }
            }
            Scope::Country(country) => {
                let owned = self.country(country).owned_provinces.clone();
                for province in owned {
                    for pop in &mut self.province_mut(province).pops {
                        apply(pop);
                    }
                }
            }
            Scope::State(region) => {
                for index in 0..self.provinces.len() {
                    let province_index = ProvinceIndex(index as u32);
                    if self.defs.provinces.get(province_index).region == Some(region) {
                        for pop in &mut self.provinces[index].pops {
                            apply(pop);
                        }
                    }
                }
            }
            Scope::None => {}
        }
    }

    pub fn add_country_modifier(
        &mut self,
        country: CountryIndex,
        modifier: ModifierIndex,
        days: u32,
    ) {
        let expires = if days == 0 {
            None
        } else {
            Some(self.date.add_days(days as i64))
        };
        self.country_mut(country)
            .timed_modifiers
            .push(ActiveModifier { modifier, expires });
    }

    pub fn remove_country_modifier(&mut self, country: CountryIndex, modifier: ModifierIndex) {
        self.country_mut(country)
            .timed_modifiers
            .retain(|active| active.modifier != modifier);
    }

    pub fn add_province_modifier(
        &mut self,
        province: ProvinceIndex,
        modifier: ModifierIndex,
        days: u32,
    ) {
        let expires = if days == 0 {
            None
        } else {
            Some(self.date.add_days(days as i64))
        };
        self.province_mut(province)
            .timed_modifiers
            .push(ActiveModifier { modifier, expires });
    }

    pub fn remove_province_modifier(&mut self, province: ProvinceIndex, modifier: ModifierIndex) {
        self.province_mut(province)
            .timed_modifiers
            .retain(|active| active.modifier != modifier);
    }

    /// Enact a reform: replaces the active member of the reform's group.
    pub fn enact_reform(&mut self, country: CountryIndex, reform: IssueIndex) {
        let group = self.defs.issues.get(reform).group;
        let country = &mut self.countries[country.0 as usize];
        country.set_active_issue(group, reform);
        // rules and effective rates are refreshed in the aggregate phase
    }

    /// Enable a previously locked good mid-game.
    pub fn enable_good(&mut self, good: GoodIndex) {
        self.market.good_mut(good).enable();
    }

    /// Switch between the exponential and legacy price bands; every good's
    /// limits are refreshed against the new rule.
    pub fn set_exponential_price_changes(&mut self, enabled: bool) {
        if self.config.exponential_price_changes == enabled {
            return;
        }
        self.config.exponential_price_changes = enabled;
        self.market.on_price_change_rule_changed(&self.config);
    }

    /// Deterministic xorshift64; all simulation randomness flows through
    /// here so replays reproduce bit-for-bit.
    pub fn random_u64(&mut self) -> u64 {
        let mut x = self.rng_state;
        if x == 0 {
            x = 1;
        }
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        x
    }

    /// Random fixed-point value in [0, 1).
    pub fn random_fixed(&mut self) -> Fixed {
        let raw = self.random_u64();
        Fixed::from_raw(((raw >> 32) % Fixed::SCALE as u64) as i64)
    }
}
