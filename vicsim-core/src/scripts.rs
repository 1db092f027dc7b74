//! Compiled condition and effect scripts.
//!
//! The simulation sees scripts as a boolean predicate and a state mutation
//! over a scoped context; this module is the reference scripting
//! collaborator. Declarative trees from the mod are compiled once at load
//! (name resolution failures are fatal) and evaluated without allocation
//! during ticks.

use crate::defs::map::{ProvinceIndex, RegionIndex, TerrainIndex};
use crate::defs::politics::{CountryIndex, GovernmentIndex, IssueIndex};
use crate::defs::pops::PopTypeIndex;
use crate::defs::Definitions;
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::world::World;
use serde::{Deserialize, Serialize};
use vicdata::events::{ConditionRow, EffectRow, WeightRow};

/// Position of one pop inside the world: its province and its slot in that
/// province's pop list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct PopRef {
    pub province: ProvinceIndex,
    pub slot: u32,
}

/// Tagged scope for script evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    None,
    Country(CountryIndex),
    State(RegionIndex),
    Province(ProvinceIndex),
    Pop(PopRef),
}

/// The (initial, this, from) triple every script runs against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeCtx {
    pub initial: Scope,
    pub this: Scope,
    pub from: Scope,
}

impl ScopeCtx {
    pub fn on(this: Scope) -> Self {
        Self {
            initial: this,
            this,
            from: Scope::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Condition {
    Always(bool),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    HasCountryFlag(String),
    HasDecision(String),
    HasTechnology(String),
    HasInvention(String),
    HasReform(IssueIndex),
    GovernmentIs(GovernmentIndex),
    OwnerIs(CountryIndex),
    TerrainIs(TerrainIndex),
    IsCoastal,
    PopTypeIs(PopTypeIndex),
    IsCultureAccepted,
    MilitancyAtLeast(Fixed),
}

impl Condition {
    /// Runtime evaluation is total: a well-formed tree always yields a
    /// boolean. Scope mismatches evaluate to false.
    pub fn evaluate(&self, world: &World, ctx: &ScopeCtx) -> bool {
        match self {
            Condition::Always(value) => *value,
            Condition::Not(inner) => !inner.evaluate(world, ctx),
            Condition::All(inner) => inner.iter().all(|c| c.evaluate(world, ctx)),
            Condition::Any(inner) => inner.iter().any(|c| c.evaluate(world, ctx)),
            Condition::HasCountryFlag(flag) => world
                .scope_country(ctx.this)
                .map_or(false, |c| world.country(c).flags.contains(flag)),
            Condition::HasDecision(decision) => world
                .scope_country(ctx.this)
                .map_or(false, |c| world.country(c).decisions_taken.contains(decision)),
            Condition::HasTechnology(tech) => world
                .scope_country(ctx.this)
                .map_or(false, |c| world.country(c).technologies.contains(tech)),
            Condition::HasInvention(invention) => world
                .scope_country(ctx.this)
                .map_or(false, |c| world.country(c).inventions.contains(invention)),
            Condition::HasReform(reform) => world.scope_country(ctx.this).map_or(false, |c| {
                let group = world.defs().issues.get(*reform).group;
                world.country(c).reform_in(group) == Some(*reform)
            }),
            Condition::GovernmentIs(government) => world
                .scope_country(ctx.this)
                .map_or(false, |c| world.country(c).government == Some(*government)),
            Condition::OwnerIs(owner) => world
                .scope_province(ctx.this)
                .map_or(false, |p| world.province(p).owner == Some(*owner)),
            Condition::TerrainIs(terrain) => world.scope_province(ctx.this).map_or(false, |p| {
                world.defs().provinces.get(p).terrain == Some(*terrain)
            }),
            Condition::IsCoastal => world
                .scope_province(ctx.this)
                .map_or(false, |p| world.province_is_coastal(p)),
            Condition::PopTypeIs(pop_type) => match ctx.this {
                Scope::Pop(pop) => world.pop(pop).map_or(false, |p| p.pop_type == *pop_type),
                _ => false,
            },
            Condition::IsCultureAccepted => match ctx.this {
                Scope::Pop(pop) => world
                    .pop(pop)
                    .map_or(false, |p| p.culture_status.is_accepted()),
                _ => false,
            },
            Condition::MilitancyAtLeast(threshold) => match ctx.this {
                Scope::Pop(pop) => world.pop(pop).map_or(false, |p| p.militancy >= *threshold),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Effect {
    Nothing,
    Compound(Vec<Effect>),
    SetCountryFlag(String),
    ClearCountryFlag(String),
    AddCountryModifier {
        modifier: crate::defs::modifiers::ModifierIndex,
        days: u32,
    },
    RemoveCountryModifier(crate::defs::modifiers::ModifierIndex),
    AddProvinceModifier {
        modifier: crate::defs::modifiers::ModifierIndex,
        days: u32,
    },
    RemoveProvinceModifier(crate::defs::modifiers::ModifierIndex),
    UnlockInvention(String),
    EnactReform(IssueIndex),
    AddMilitancy(Fixed),
    AddConsciousness(Fixed),
    AddPrestige(Fixed),
    AddTreasury(Fixed),
}

impl Effect {
    /// Mutations go through the world's helper APIs only; an effect whose
    /// scope does not carry the needed entity is a silent no-op.
    pub fn apply(&self, world: &mut World, ctx: &ScopeCtx) {
        match self {
            Effect::Nothing => {}
            Effect::Compound(inner) => {
                for effect in inner {
                    effect.apply(world, ctx);
                }
            }
            Effect::SetCountryFlag(flag) => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.country_mut(country).flags.insert(flag.clone());
                }
            }
            Effect::ClearCountryFlag(flag) => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.country_mut(country).flags.remove(flag);
                }
            }
            Effect::AddCountryModifier { modifier, days } => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.add_country_modifier(country, *modifier, *days);
                }
            }
            Effect::RemoveCountryModifier(modifier) => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.remove_country_modifier(country, *modifier);
                }
            }
            Effect::AddProvinceModifier { modifier, days } => {
                if let Some(province) = world.scope_province(ctx.this) {
                    world.add_province_modifier(province, *modifier, *days);
                }
            }
            Effect::RemoveProvinceModifier(modifier) => {
                if let Some(province) = world.scope_province(ctx.this) {
                    world.remove_province_modifier(province, *modifier);
                }
            }
            Effect::UnlockInvention(invention) => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.country_mut(country).inventions.insert(invention.clone());
                }
            }
            Effect::EnactReform(reform) => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.enact_reform(country, *reform);
                }
            }
            Effect::AddMilitancy(amount) => {
                world.for_each_pop_in_scope(ctx.this, |pop| pop.militancy += *amount);
            }
            Effect::AddConsciousness(amount) => {
                world.for_each_pop_in_scope(ctx.this, |pop| pop.consciousness += *amount);
            }
            Effect::AddPrestige(amount) => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.country_mut(country).prestige += *amount;
                }
            }
            Effect::AddTreasury(amount) => {
                if let Some(country) = world.scope_country(ctx.this) {
                    world.country_mut(country).treasury += *amount;
                }
            }
        }
    }
}

/// How one weight factor combines into the running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorMode {
    FactorMul,
    FactorAdd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightFactor {
    pub condition: Condition,
    pub value: Fixed,
    pub mode: FactorMode,
}

/// Base value adjusted by conditional factors; used for event
/// mean-time-to-happen and AI weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalWeight {
    pub base: Fixed,
    pub factors: Vec<WeightFactor>,
}

impl ConditionalWeight {
    pub fn constant(base: Fixed) -> Self {
        Self {
            base,
            factors: Vec::new(),
        }
    }

    pub fn evaluate(&self, world: &World, ctx: &ScopeCtx) -> Fixed {
        let mut result = self.base;
        for factor in &self.factors {
            if factor.condition.evaluate(world, ctx) {
                match factor.mode {
                    FactorMode::FactorMul => result *= factor.value,
                    FactorMode::FactorAdd => result += factor.value,
                }
            }
        }
        result
    }
}

pub fn compile_condition(row: &ConditionRow, defs: &Definitions) -> Result<Condition, ErrorSet> {
    Ok(match row {
        ConditionRow::Always(value) => Condition::Always(*value),
        ConditionRow::Not(inner) => Condition::Not(Box::new(compile_condition(inner, defs)?)),
        ConditionRow::All(inner) => Condition::All(
            inner
                .iter()
                .map(|c| compile_condition(c, defs))
                .collect::<Result<_, _>>()?,
        ),
        ConditionRow::Any(inner) => Condition::Any(
            inner
                .iter()
                .map(|c| compile_condition(c, defs))
                .collect::<Result<_, _>>()?,
        ),
        ConditionRow::HasCountryFlag(flag) => Condition::HasCountryFlag(flag.clone()),
        ConditionRow::HasDecision(decision) => Condition::HasDecision(decision.clone()),
        ConditionRow::HasTechnology(tech) => Condition::HasTechnology(tech.clone()),
        ConditionRow::HasInvention(invention) => Condition::HasInvention(invention.clone()),
        ConditionRow::HasReform(name) => Condition::HasReform(defs.issues.expect(name)?),
        ConditionRow::GovernmentIs(name) => Condition::GovernmentIs(defs.governments.expect(name)?),
        ConditionRow::OwnerIs(tag) => Condition::OwnerIs(defs.countries.expect(tag)?),
        ConditionRow::TerrainIs(name) => Condition::TerrainIs(defs.terrains.expect(name)?),
        ConditionRow::IsCoastal => Condition::IsCoastal,
        ConditionRow::PopTypeIs(name) => Condition::PopTypeIs(defs.pop_types.expect(name)?),
        ConditionRow::IsCultureAccepted => Condition::IsCultureAccepted,
        ConditionRow::MilitancyAtLeast(value) => {
            Condition::MilitancyAtLeast(Fixed::from_f64(*value))
        }
    })
}

pub fn compile_effect(row: &EffectRow, defs: &Definitions) -> Result<Effect, ErrorSet> {
    Ok(match row {
        EffectRow::Nothing => Effect::Nothing,
        EffectRow::Compound(inner) => Effect::Compound(
            inner
                .iter()
                .map(|e| compile_effect(e, defs))
                .collect::<Result<_, _>>()?,
        ),
        EffectRow::SetCountryFlag(flag) => Effect::SetCountryFlag(flag.clone()),
        EffectRow::ClearCountryFlag(flag) => Effect::ClearCountryFlag(flag.clone()),
        EffectRow::AddCountryModifier { name, days } => Effect::AddCountryModifier {
            modifier: defs.named_modifiers.expect(name)?,
            days: *days,
        },
        EffectRow::RemoveCountryModifier(name) => {
            Effect::RemoveCountryModifier(defs.named_modifiers.expect(name)?)
        }
        EffectRow::AddProvinceModifier { name, days } => Effect::AddProvinceModifier {
            modifier: defs.named_modifiers.expect(name)?,
            days: *days,
        },
        EffectRow::RemoveProvinceModifier(name) => {
            Effect::RemoveProvinceModifier(defs.named_modifiers.expect(name)?)
        }
        EffectRow::UnlockInvention(invention) => Effect::UnlockInvention(invention.clone()),
        EffectRow::EnactReform(name) => {
            let issue = defs.issues.expect(name)?;
            if !defs.issues.get(issue).is_reform() {
                log::error!("effect enacts {:?}, which is not a reform", name);
                return Err(ErrorCode::InvalidData.into());
            }
            Effect::EnactReform(issue)
        }
        EffectRow::AddMilitancy(value) => Effect::AddMilitancy(Fixed::from_f64(*value)),
        EffectRow::AddConsciousness(value) => Effect::AddConsciousness(Fixed::from_f64(*value)),
        EffectRow::AddPrestige(value) => Effect::AddPrestige(Fixed::from_f64(*value)),
        EffectRow::AddTreasury(value) => Effect::AddTreasury(Fixed::from_f64(*value)),
    })
}

pub fn compile_weight(row: &WeightRow, defs: &Definitions) -> Result<ConditionalWeight, ErrorSet> {
    let mut factors = Vec::with_capacity(row.factors.len());
    for factor in &row.factors {
        factors.push(WeightFactor {
            condition: compile_condition(&factor.condition, defs)?,
            value: Fixed::from_f64(factor.value),
            mode: if factor.additive {
                FactorMode::FactorAdd
            } else {
                FactorMode::FactorMul
            },
        });
    }
    Ok(ConditionalWeight {
        base: Fixed::from_f64(row.base),
        factors,
    })
}
