//! Unit, rebel and wargoal definitions.

use crate::define_index;
use crate::defs::goods::GoodIndex;
use crate::defs::politics::IdeologyIndex;
use crate::defs::modifiers::ModifierIndex;
use crate::defs::Definitions;
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::indexed::FixedMap;
use crate::registry::HasIdentifier;
use crate::scripts::{compile_condition, compile_effect, Condition, Effect};
use serde::{Deserialize, Serialize};
use vicdata::military::{RebelTypeRow, UnitTypeRow, WargoalRow};

pub use vicdata::military::UnitBranch;

define_index!(UnitTypeIndex);
define_index!(RebelTypeIndex);
define_index!(WargoalIndex);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitType {
    pub identifier: String,
    pub branch: UnitBranch,
    pub attack: Fixed,
    pub defence: Fixed,
    pub maneuver: Fixed,
    pub speed: Fixed,
    pub build_cost: FixedMap<GoodIndex>,
    pub supply_consumption: FixedMap<GoodIndex>,
}

impl HasIdentifier for UnitType {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebelType {
    pub identifier: String,
    pub ideology: Option<IdeologyIndex>,
    pub defection_militancy: Fixed,
    pub modifier: Option<ModifierIndex>,
}

impl HasIdentifier for RebelType {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wargoal {
    pub identifier: String,
    pub sprite_index: u32,
    pub war_score_cost: Fixed,
    pub prestige_gain: Fixed,
    pub can_use: Option<Condition>,
    pub on_success: Option<Effect>,
}

impl HasIdentifier for Wargoal {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

fn resolve_goods_map(
    rows: &[vicdata::production::InputRow],
    defs: &Definitions,
    errors: &mut ErrorSet,
) -> FixedMap<GoodIndex> {
    let mut map = FixedMap::new();
    for input in rows {
        match defs.goods.expect(&input.good) {
            Ok(good) => map.add(good, Fixed::from_f64(input.amount)),
            Err(err) => *errors |= err | ErrorCode::InvalidData.into(),
        }
    }
    map
}

pub fn compile_unit_types(
    rows: &[UnitTypeRow],
    defs: &Definitions,
) -> (Vec<UnitType>, ErrorSet) {
    let mut errors = ErrorSet::OK;
    let mut compiled = Vec::with_capacity(rows.len());
    for row in rows {
        compiled.push(UnitType {
            identifier: row.identifier.clone(),
            branch: row.branch,
            attack: Fixed::from_f64(row.attack),
            defence: Fixed::from_f64(row.defence),
            maneuver: Fixed::from_f64(row.maneuver),
            speed: Fixed::from_f64(row.speed),
            build_cost: resolve_goods_map(&row.build_cost, defs, &mut errors),
            supply_consumption: resolve_goods_map(&row.supply_consumption, defs, &mut errors),
        });
    }
    (compiled, errors)
}

pub fn compile_rebel_types(
    rows: &[RebelTypeRow],
    defs: &Definitions,
) -> (Vec<RebelType>, ErrorSet) {
    let mut errors = ErrorSet::OK;
    let mut compiled = Vec::with_capacity(rows.len());
    for row in rows {
        let ideology = match &row.ideology {
            Some(name) => match defs.ideologies.expect(name) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            },
            None => None,
        };
        let modifier = match &row.modifier {
            Some(name) => match defs.named_modifiers.expect(name) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            },
            None => None,
        };
        compiled.push(RebelType {
            identifier: row.identifier.clone(),
            ideology,
            defection_militancy: Fixed::from_f64(row.defection_militancy),
            modifier,
        });
    }
    (compiled, errors)
}

pub fn compile_wargoals(rows: &[WargoalRow], defs: &Definitions) -> (Vec<Wargoal>, ErrorSet) {
    let mut errors = ErrorSet::OK;
    let mut compiled = Vec::with_capacity(rows.len());
    for row in rows {
        let can_use = match &row.can_use {
            Some(condition) => match compile_condition(condition, defs) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            },
            None => None,
        };
        let on_success = match &row.on_success {
            Some(effect) => match compile_effect(effect, defs) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            },
            None => None,
        };
        compiled.push(Wargoal {
            identifier: row.identifier.clone(),
            sprite_index: row.sprite_index,
            war_score_cost: Fixed::from_f64(row.war_score_cost),
            prestige_gain: Fixed::from_f64(row.prestige_gain),
            can_use,
            on_success,
        });
    }
    (compiled, errors)
}
