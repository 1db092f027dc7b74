//! Locked registries built from mod data.
//!
//! `Definitions` is the static half of the world: every registered entity
//! class with its dense indices, plus the defines converted to fixed-point.
//! Construction either succeeds completely and locks every registry, or
//! fails with the aggregated error set and the world is never built.

pub mod events;
pub mod goods;
pub mod map;
pub mod military;
pub mod modifiers;
pub mod politics;
pub mod pops;
pub mod production;

use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::registry::{DuplicatePolicy, HasIdentifier, Registry};
use crate::scripts::compile_condition;
use serde::{Deserialize, Serialize};
use vicdata::defines::Defines;
use vicdata::pops::Strata;
use vicdata::ModData;

use events::{EventDef, EventIndex, NationalFocus, NationalFocusIndex};
use goods::{GoodDefinition, GoodIndex};
use map::{ProvinceDefinition, ProvinceIndex, Region, RegionIndex, TerrainDefinition, TerrainIndex};
use military::{RebelType, RebelTypeIndex, UnitType, UnitTypeIndex, Wargoal, WargoalIndex};
use modifiers::{EffectIds, EffectIndex, ModifierEffect, ModifierIndex, NamedModifier};
use politics::{
    CountryDefinition, CountryIndex, Government, GovernmentIndex, Ideology, IdeologyIndex, Issue,
    IssueGroup, IssueGroupIndex, IssueIndex, NationalValue, NationalValueIndex,
};
use pops::{Culture, CultureIndex, PopType, PopTypeIndex, Religion, ReligionIndex};
use production::{ProductionTypeDef, ProductionTypeIndex};

/// Defines converted to simulation types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimDefines {
    pub base_con: Fixed,
    pub needs_scalar_divisor: Fixed,
    /// Per-strata scalars indexed [need category][strata].
    pub strata_need_scalars: [[Fixed; Strata::COUNT]; 3],
    pub factory_unprofitable_days_limit: u32,
    pub artisanal_spending_fraction: Fixed,
    pub rgo_owner_share: Fixed,
    pub factory_daily_wage_per_worker: Fixed,
    pub min_pop_size_for_regiment: i64,
    pub pop_size_per_regiment: i64,
    pub pop_size_per_regiment_multiplier: Fixed,
}

impl SimDefines {
    pub fn from_rows(defines: &Defines) -> Self {
        let scalars = |values: &[f64; 3]| {
            [
                Fixed::from_f64(values[0]),
                Fixed::from_f64(values[1]),
                Fixed::from_f64(values[2]),
            ]
        };
        Self {
            base_con: Fixed::from_f64(defines.pops.base_con),
            needs_scalar_divisor: Fixed::from_f64(defines.pops.needs_scalar_divisor),
            strata_need_scalars: [
                scalars(&defines.pops.life_need_scalar),
                scalars(&defines.pops.everyday_need_scalar),
                scalars(&defines.pops.luxury_need_scalar),
            ],
            factory_unprofitable_days_limit: defines.economy.factory_unprofitable_days_limit,
            artisanal_spending_fraction: Fixed::from_f64(
                defines.economy.artisanal_spending_fraction,
            ),
            rgo_owner_share: Fixed::from_f64(defines.economy.rgo_owner_share),
            factory_daily_wage_per_worker: Fixed::from_f64(
                defines.economy.factory_daily_wage_per_worker,
            ),
            min_pop_size_for_regiment: defines.military.min_pop_size_for_regiment,
            pop_size_per_regiment: defines.military.pop_size_per_regiment,
            pop_size_per_regiment_multiplier: Fixed::from_f64(
                defines.military.pop_size_per_regiment_multiplier,
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definitions {
    pub goods: Registry<GoodIndex, GoodDefinition>,
    pub pop_types: Registry<PopTypeIndex, PopType>,
    pub cultures: Registry<CultureIndex, Culture>,
    pub religions: Registry<ReligionIndex, Religion>,
    pub ideologies: Registry<IdeologyIndex, Ideology>,
    pub issues: Registry<IssueIndex, Issue>,
    pub issue_groups: Registry<IssueGroupIndex, IssueGroup>,
    pub national_values: Registry<NationalValueIndex, NationalValue>,
    pub governments: Registry<GovernmentIndex, Government>,
    pub countries: Registry<CountryIndex, CountryDefinition>,
    pub production_types: Registry<ProductionTypeIndex, ProductionTypeDef>,
    pub unit_types: Registry<UnitTypeIndex, UnitType>,
    pub rebel_types: Registry<RebelTypeIndex, RebelType>,
    pub wargoals: Registry<WargoalIndex, Wargoal>,
    pub events: Registry<EventIndex, EventDef>,
    pub national_foci: Registry<NationalFocusIndex, NationalFocus>,
    pub modifier_effects: Registry<EffectIndex, ModifierEffect>,
    pub named_modifiers: Registry<ModifierIndex, NamedModifier>,
    pub terrains: Registry<TerrainIndex, TerrainDefinition>,
    pub regions: Registry<RegionIndex, Region>,
    pub provinces: Registry<ProvinceIndex, ProvinceDefinition>,
    /// Skipped by serde; the default reproduces the fixed registration
    /// order of the builtin catalogue.
    #[serde(skip)]
    pub effect_ids: EffectIds,
    pub defines: SimDefines,
}

impl Definitions {
    fn empty(
        defines: SimDefines,
        modifier_effects: Registry<EffectIndex, ModifierEffect>,
        effect_ids: EffectIds,
    ) -> Self {
        Self {
            goods: Registry::new("goods"),
            pop_types: Registry::new("pop_types"),
            cultures: Registry::new("cultures"),
            religions: Registry::new("religions"),
            ideologies: Registry::new("ideologies"),
            issues: Registry::new("issues"),
            issue_groups: Registry::new("issue_groups"),
            national_values: Registry::new("national_values"),
            governments: Registry::new("governments"),
            countries: Registry::new("countries"),
            production_types: Registry::new("production_types"),
            unit_types: Registry::new("unit_types"),
            rebel_types: Registry::new("rebel_types"),
            wargoals: Registry::new("wargoals"),
            events: Registry::new("events"),
            national_foci: Registry::new("national_foci"),
            modifier_effects,
            named_modifiers: Registry::new("named_modifiers"),
            terrains: Registry::new("terrains"),
            regions: Registry::new("regions"),
            provinces: Registry::new("provinces"),
            effect_ids,
            defines,
        }
    }

    /// Convenience for hosts carrying mod data as JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ErrorSet> {
        let data: ModData = serde_json::from_str(text).map_err(|err| {
            log::error!("mod data is not valid JSON: {err}");
            ErrorSet::from(ErrorCode::InvalidData)
        })?;
        Self::from_mod_data(&data)
    }

    /// Build and lock every registry from parsed mod data.
    ///
    /// Load failure leaves the registries unlocked and reports the full
    /// aggregated error set; callers must treat it as fatal.
    pub fn from_mod_data(data: &ModData) -> Result<Self, ErrorSet> {
        let mut modifier_effects = Registry::new("modifier_effects");
        let effect_ids = modifiers::register_builtin_effects(&mut modifier_effects)?;
        let mut defs = Definitions::empty(
            SimDefines::from_rows(&data.defines),
            modifier_effects,
            effect_ids,
        );
        let mut errors = ErrorSet::OK;

        errors |= modifiers::load_named_modifiers(
            &data.named_modifiers,
            &defs.modifier_effects,
            &mut defs.named_modifiers,
        );
        errors |= goods::load_goods(&data.goods, &mut defs.goods);
        errors |= pops::load_pop_types(&data.pop_types, &defs.goods, &mut defs.pop_types);
        errors |= pops::load_cultures(&data.cultures, &mut defs.cultures);
        errors |= pops::load_religions(&data.religions, &mut defs.religions);
        errors |= politics::load_ideologies(&data.ideologies, &mut defs.ideologies);
        errors |= politics::load_issues(
            &data.issues,
            &defs.named_modifiers,
            &mut defs.issue_groups,
            &mut defs.issues,
        );
        errors |= politics::load_national_values(
            &data.national_values,
            &defs.named_modifiers,
            &mut defs.national_values,
        );
        errors |= politics::load_governments(
            &data.governments,
            &defs.ideologies,
            &mut defs.governments,
        );
        errors |= politics::load_countries(
            &data.countries,
            &defs.cultures,
            &defs.religions,
            &defs.ideologies,
            &defs.issues,
            &mut defs.countries,
        );
        errors |= map::load_terrains(&data.terrains, &defs.named_modifiers, &mut defs.terrains);
        errors |= map::load_provinces(
            &data.provinces,
            &defs.goods,
            &defs.terrains,
            &mut defs.regions,
            &mut defs.provinces,
        );

        // Script-bearing content compiles against the registries above.
        let (production_types, production_errors) =
            production::compile_production_types(&data.production_types, &defs);
        errors |= production_errors;
        errors |= register_all(&mut defs.production_types, production_types);

        let (unit_types, unit_errors) = military::compile_unit_types(&data.unit_types, &defs);
        errors |= unit_errors;
        errors |= register_all(&mut defs.unit_types, unit_types);

        let (rebel_types, rebel_errors) = military::compile_rebel_types(&data.rebel_types, &defs);
        errors |= rebel_errors;
        errors |= register_all(&mut defs.rebel_types, rebel_types);

        let (wargoals, wargoal_errors) = military::compile_wargoals(&data.wargoals, &defs);
        errors |= wargoal_errors;
        errors |= register_all(&mut defs.wargoals, wargoals);

        let (event_defs, event_errors) = events::compile_events(&data.events, &defs);
        errors |= event_errors;
        errors |= register_all(&mut defs.events, event_defs);

        let (foci, foci_errors) = events::compile_national_foci(&data.national_foci, &defs);
        errors |= foci_errors;
        errors |= register_all(&mut defs.national_foci, foci);

        errors |= attach_decision_conditions(&mut defs, data);

        if !errors.is_ok() {
            log::error!("mod data failed to load: {errors}");
            return Err(errors);
        }

        defs.lock_all();
        Ok(defs)
    }

    fn lock_all(&mut self) {
        self.goods.lock();
        self.pop_types.lock();
        self.cultures.lock();
        self.religions.lock();
        self.ideologies.lock();
        self.issues.lock();
        self.issue_groups.lock();
        self.national_values.lock();
        self.governments.lock();
        self.countries.lock();
        self.production_types.lock();
        self.unit_types.lock();
        self.rebel_types.lock();
        self.wargoals.lock();
        self.events.lock();
        self.national_foci.lock();
        self.modifier_effects.lock();
        self.named_modifiers.lock();
        self.terrains.lock();
        self.regions.lock();
        self.provinces.lock();
    }

    /// Artisan recipes in registration order; the artisan selection cycle
    /// walks this list.
    pub fn artisan_recipes(&self) -> Vec<ProductionTypeIndex> {
        self.production_types
            .iter()
            .filter(|(_, recipe)| recipe.kind == production::ProducerKind::Artisan)
            .map(|(index, _)| index)
            .collect()
    }
}

fn register_all<I, T>(registry: &mut Registry<I, T>, items: Vec<T>) -> ErrorSet
where
    I: crate::indexed::EntityIndex,
    T: HasIdentifier,
{
    let mut errors = ErrorSet::OK;
    for item in items {
        if let Err(err) = registry.register(item, DuplicatePolicy::Fail) {
            errors |= err;
        }
    }
    errors
}

/// Country decision conditions may reference any registry (including other
/// countries), so they compile last.
fn attach_decision_conditions(defs: &mut Definitions, data: &ModData) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    let mut compiled = Vec::new();
    for row in &data.countries {
        let Some(country) = defs.countries.index_of(&row.identifier) else {
            continue;
        };
        for (slot, decision) in row.decisions.iter().enumerate() {
            if let Some(allow) = &decision.allow {
                match compile_condition(allow, defs) {
                    Ok(condition) => compiled.push((country, slot, condition)),
                    Err(err) => errors |= err | ErrorCode::InvalidData.into(),
                }
            }
        }
    }
    for (country, slot, condition) in compiled {
        defs.countries.get_mut(country).decisions[slot].allow = Some(condition);
    }
    errors
}
