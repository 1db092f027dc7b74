//! Event and national-focus definitions.

use crate::define_index;
use crate::defs::modifiers::ModifierIndex;
use crate::defs::Definitions;
use crate::error::{ErrorCode, ErrorSet};
use crate::registry::HasIdentifier;
use crate::scripts::{
    compile_condition, compile_effect, compile_weight, Condition, ConditionalWeight, Effect,
};
use serde::{Deserialize, Serialize};
use vicdata::events::{EventRow, EventScopeKind, NationalFocusRow};

define_index!(EventIndex);
define_index!(NationalFocusIndex);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDef {
    pub identifier: String,
    pub scope: EventScopeKind,
    pub trigger: Option<Condition>,
    /// Mean time to happen in days; rolled daily per candidate scope.
    pub mean_time_to_happen: ConditionalWeight,
    pub effect: Effect,
    pub fire_only_once: bool,
}

impl HasIdentifier for EventDef {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalFocus {
    pub identifier: String,
    pub group: String,
    pub modifier: Option<ModifierIndex>,
    pub limit: Option<Condition>,
}

impl HasIdentifier for NationalFocus {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

pub fn compile_events(rows: &[EventRow], defs: &Definitions) -> (Vec<EventDef>, ErrorSet) {
    let mut errors = ErrorSet::OK;
    let mut compiled = Vec::with_capacity(rows.len());
    for row in rows {
        let trigger = match &row.trigger {
            Some(condition) => match compile_condition(condition, defs) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            },
            None => None,
        };
        let mean_time_to_happen = match compile_weight(&row.mean_time_to_happen, defs) {
            Ok(weight) => weight,
            Err(err) => {
                errors |= err | ErrorCode::InvalidData.into();
                continue;
            }
        };
        let effect = match compile_effect(&row.effect, defs) {
            Ok(effect) => effect,
            Err(err) => {
                errors |= err | ErrorCode::InvalidData.into();
                continue;
            }
        };
        compiled.push(EventDef {
            identifier: row.identifier.clone(),
            scope: row.scope,
            trigger,
            mean_time_to_happen,
            effect,
            fire_only_once: row.fire_only_once,
        });
    }
    (compiled, errors)
}

pub fn compile_national_foci(
    rows: &[NationalFocusRow],
    defs: &Definitions,
) -> (Vec<NationalFocus>, ErrorSet) {
    let mut errors = ErrorSet::OK;
    let mut compiled = Vec::with_capacity(rows.len());
    for row in rows {
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
        let limit = match &row.limit {
            Some(condition) => match compile_condition(condition, defs) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            },
            None => None,
        };
        compiled.push(NationalFocus {
            identifier: row.identifier.clone(),
            group: row.group.clone(),
            modifier,
            limit,
        });
    }
    (compiled, errors)
}
