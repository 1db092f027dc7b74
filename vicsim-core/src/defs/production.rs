//! Production recipe definitions.

use crate::define_index;
use crate::defs::goods::GoodIndex;
use crate::defs::pops::PopTypeIndex;
use crate::defs::Definitions;
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::indexed::FixedMap;
use crate::registry::HasIdentifier;
use crate::scripts::{compile_condition, Condition};
use serde::{Deserialize, Serialize};
use vicdata::production::ProductionTypeRow;

pub use vicdata::production::ProducerKind;

define_index!(ProductionTypeIndex);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub pop_type: PopTypeIndex,
    pub effect_multiplier: Fixed,
    pub amount: Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBonus {
    pub condition: Condition,
    pub value: Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTypeDef {
    pub identifier: String,
    pub kind: ProducerKind,
    pub owner: Option<Job>,
    pub employees: Vec<Job>,
    pub base_workforce_size: i64,
    pub input_goods: FixedMap<GoodIndex>,
    pub output_good: GoodIndex,
    pub base_output_quantity: Fixed,
    pub maintenance_requirements: FixedMap<GoodIndex>,
    pub bonuses: Vec<ProductionBonus>,
    pub farm: bool,
    pub mine: bool,
    pub coastal: bool,
}

impl HasIdentifier for ProductionTypeDef {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

fn resolve_job(
    row: &vicdata::production::JobRow,
    defs: &Definitions,
    errors: &mut ErrorSet,
) -> Option<Job> {
    match defs.pop_types.expect(&row.pop_type) {
        Ok(pop_type) => Some(Job {
            pop_type,
            effect_multiplier: Fixed::from_f64(row.effect_multiplier),
            amount: Fixed::from_f64(row.amount),
        }),
        Err(err) => {
            *errors |= err | ErrorCode::InvalidData.into();
            None
        }
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

/// Compile recipes against the already-loaded registries. Invariants:
/// artisan recipes carry no jobs; factory and RGO recipes carry an owner
/// job and at least one employee job.
pub fn compile_production_types(
    rows: &[ProductionTypeRow],
    defs: &Definitions,
) -> (Vec<ProductionTypeDef>, ErrorSet) {
    let mut errors = ErrorSet::OK;
    let mut compiled = Vec::with_capacity(rows.len());

    for row in rows {
        if row.base_workforce_size <= 0 {
            log::error!(
                "production type {:?} has non-positive workforce size",
                row.identifier
            );
            errors.insert(ErrorCode::InvalidData);
            continue;
        }
        match row.kind {
            ProducerKind::Artisan => {
                if row.owner.is_some() || !row.employees.is_empty() {
                    log::error!(
                        "artisan recipe {:?} must not declare owner or employee jobs",
                        row.identifier
                    );
                    errors.insert(ErrorCode::InvalidData);
                    continue;
                }
            }
            ProducerKind::Factory | ProducerKind::Rgo => {
                if row.owner.is_none() || row.employees.is_empty() {
                    log::error!(
                        "recipe {:?} requires an owner job and employee jobs",
                        row.identifier
                    );
                    errors.insert(ErrorCode::InvalidData);
                    continue;
                }
            }
        }

        let output_good = match defs.goods.expect(&row.output_good) {
            Ok(good) => good,
            Err(err) => {
                errors |= err | ErrorCode::InvalidData.into();
                continue;
            }
        };
        let owner = row
            .owner
            .as_ref()
            .and_then(|job| resolve_job(job, defs, &mut errors));
        let employees: Vec<Job> = row
            .employees
            .iter()
            .filter_map(|job| resolve_job(job, defs, &mut errors))
            .collect();
        if employees.len() != row.employees.len() {
            continue;
        }

        let mut bonuses = Vec::with_capacity(row.bonuses.len());
        let mut bonuses_ok = true;
        for bonus in &row.bonuses {
            match compile_condition(&bonus.condition, defs) {
                Ok(condition) => bonuses.push(ProductionBonus {
                    condition,
                    value: Fixed::from_f64(bonus.value),
                }),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    bonuses_ok = false;
                }
            }
        }
        if !bonuses_ok {
            continue;
        }

        compiled.push(ProductionTypeDef {
            identifier: row.identifier.clone(),
            kind: row.kind,
            owner,
            employees,
            base_workforce_size: row.base_workforce_size,
            input_goods: resolve_goods_map(&row.input_goods, defs, &mut errors),
            output_good,
            base_output_quantity: Fixed::from_f64(row.base_output_quantity),
            maintenance_requirements: resolve_goods_map(
                &row.maintenance_requirements,
                defs,
                &mut errors,
            ),
            bonuses,
            farm: row.farm,
            mine: row.mine,
            coastal: row.coastal,
        });
    }
    (compiled, errors)
}
