//! Modifier effect catalogue and named modifier definitions.
//!
//! Effects are the vocabulary: each has format metadata, a neutral element
//! and a cosmetic flag. Named modifiers are bundles of (effect, value)
//! pairs contributed to countries and provinces by reforms, terrain,
//! events, rebels and national values.

use crate::define_index;
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::registry::{DuplicatePolicy, HasIdentifier, Registry};
use serde::{Deserialize, Serialize};
use vicdata::modifiers::NamedModifierRow;

define_index!(EffectIndex);
define_index!(ModifierIndex);

/// How an effect's value is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectFormat {
    Percent,
    Absolute,
    Days,
}

/// Value used when no contribution is active: 0 for additive effects,
/// 1 for multiplicative ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Neutral {
    Additive,
    Multiplicative,
}

impl Neutral {
    pub fn value(self) -> Fixed {
        match self {
            Neutral::Additive => Fixed::ZERO,
            Neutral::Multiplicative => Fixed::ONE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierEffect {
    pub identifier: String,
    pub format: EffectFormat,
    pub neutral: Neutral,
    /// Cosmetic effects are cached for display but never alter gameplay
    /// numbers.
    pub no_effect: bool,
}

impl HasIdentifier for ModifierEffect {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedModifier {
    pub identifier: String,
    pub effects: Vec<(EffectIndex, Fixed)>,
}

impl HasIdentifier for NamedModifier {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// The built-in effect vocabulary, in registration order. Mods cannot add
/// effects: the consumption sites are fixed in code.
#[derive(Debug, Clone)]
pub struct EffectIds {
    pub rgo_input: EffectIndex,
    pub rgo_output: EffectIndex,
    pub rgo_throughput: EffectIndex,
    pub factory_input: EffectIndex,
    pub factory_output: EffectIndex,
    pub factory_throughput: EffectIndex,
    pub artisan_input: EffectIndex,
    pub artisan_output: EffectIndex,
    pub artisan_throughput: EffectIndex,
    pub life_needs: EffectIndex,
    pub everyday_needs: EffectIndex,
    pub luxury_needs: EffectIndex,
    pub tax_efficiency: EffectIndex,
    pub tariff: EffectIndex,
    pub research_points: EffectIndex,
    pub leadership: EffectIndex,
    pub pop_militancy: EffectIndex,
    pub pop_consciousness: EffectIndex,
    /// Cosmetic: shown on province tooltips, never consulted by gameplay.
    pub supply_limit_display: EffectIndex,
    pub influence_display: EffectIndex,
}

impl Default for EffectIds {
    /// Indices follow the fixed registration order of
    /// [`register_builtin_effects`], so the default is always correct for a
    /// loaded catalogue.
    fn default() -> Self {
        EffectIds {
            rgo_input: EffectIndex(0),
            rgo_output: EffectIndex(1),
            rgo_throughput: EffectIndex(2),
            factory_input: EffectIndex(3),
            factory_output: EffectIndex(4),
            factory_throughput: EffectIndex(5),
            artisan_input: EffectIndex(6),
            artisan_output: EffectIndex(7),
            artisan_throughput: EffectIndex(8),
            life_needs: EffectIndex(9),
            everyday_needs: EffectIndex(10),
            luxury_needs: EffectIndex(11),
            tax_efficiency: EffectIndex(12),
            tariff: EffectIndex(13),
            research_points: EffectIndex(14),
            leadership: EffectIndex(15),
            pop_militancy: EffectIndex(16),
            pop_consciousness: EffectIndex(17),
            supply_limit_display: EffectIndex(18),
            influence_display: EffectIndex(19),
        }
    }
}

pub fn register_builtin_effects(
    registry: &mut Registry<EffectIndex, ModifierEffect>,
) -> Result<EffectIds, ErrorSet> {
    use EffectFormat::*;
    use Neutral::*;

    let mut add = |identifier: &str, format: EffectFormat, neutral: Neutral, no_effect: bool| {
        registry.register(
            ModifierEffect {
                identifier: identifier.to_string(),
                format,
                neutral,
                no_effect,
            },
            DuplicatePolicy::Fail,
        )
    };

    Ok(EffectIds {
        rgo_input: add("rgo_input", Percent, Additive, false)?,
        rgo_output: add("rgo_output", Percent, Additive, false)?,
        rgo_throughput: add("rgo_throughput", Percent, Additive, false)?,
        factory_input: add("factory_input", Percent, Additive, false)?,
        factory_output: add("factory_output", Percent, Additive, false)?,
        factory_throughput: add("factory_throughput", Percent, Additive, false)?,
        artisan_input: add("artisan_input", Percent, Additive, false)?,
        artisan_output: add("artisan_output", Percent, Additive, false)?,
        artisan_throughput: add("artisan_throughput", Percent, Additive, false)?,
        life_needs: add("life_needs", Percent, Additive, false)?,
        everyday_needs: add("everyday_needs", Percent, Additive, false)?,
        luxury_needs: add("luxury_needs", Percent, Additive, false)?,
        tax_efficiency: add("tax_efficiency", Percent, Additive, false)?,
        tariff: add("tariff", Percent, Additive, false)?,
        research_points: add("research_points", Percent, Additive, false)?,
        leadership: add("leadership", Absolute, Additive, false)?,
        pop_militancy: add("pop_militancy", Absolute, Additive, false)?,
        pop_consciousness: add("pop_consciousness", Absolute, Additive, false)?,
        supply_limit_display: add("supply_limit", Absolute, Additive, true)?,
        influence_display: add("influence", Percent, Additive, true)?,
    })
}

/// Load the mod's named modifiers. Unknown effect names are fatal.
pub fn load_named_modifiers(
    rows: &[NamedModifierRow],
    effects: &Registry<EffectIndex, ModifierEffect>,
    registry: &mut Registry<ModifierIndex, NamedModifier>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let mut resolved = Vec::with_capacity(row.effects.len());
        let mut row_ok = true;
        for entry in &row.effects {
            match effects.expect(&entry.effect) {
                Ok(effect) => resolved.push((effect, Fixed::from_f64(entry.value))),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    row_ok = false;
                }
            }
        }
        if !row_ok {
            continue;
        }
        if let Err(err) = registry.register(
            NamedModifier {
                identifier: row.identifier.clone(),
                effects: resolved,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use vicdata::modifiers::EffectValueRow;

    #[test]
    fn builtin_effects_register_once() {
        let mut registry = Registry::new("modifier_effects");
        let ids = register_builtin_effects(&mut registry).unwrap();
        assert_eq!(registry.len(), 20);
        assert_eq!(registry.get(ids.rgo_output).identifier, "rgo_output");
        assert!(registry.get(ids.supply_limit_display).no_effect);
        assert!(!registry.get(ids.factory_throughput).no_effect);
    }

    #[test]
    fn named_modifier_resolves_effects() {
        let mut effects = Registry::new("modifier_effects");
        let ids = register_builtin_effects(&mut effects).unwrap();
        let mut named = Registry::new("named_modifiers");

        let rows = vec![NamedModifierRow {
            identifier: "mountain".to_string(),
            effects: vec![
                EffectValueRow {
                    effect: "rgo_output".to_string(),
                    value: -0.1,
                },
                EffectValueRow {
                    effect: "leadership".to_string(),
                    value: 2.0,
                },
            ],
        }];
        let errors = load_named_modifiers(&rows, &effects, &mut named);
        assert!(errors.is_ok());
        let mountain = named.by_identifier("mountain").unwrap();
        assert_eq!(mountain.effects[0].0, ids.rgo_output);
        assert_eq!(mountain.effects[1].1, Fixed::from_int(2));
    }

    #[test]
    fn unknown_effect_is_fatal() {
        let mut effects = Registry::new("modifier_effects");
        register_builtin_effects(&mut effects).unwrap();
        let mut named = Registry::new("named_modifiers");
        let rows = vec![NamedModifierRow {
            identifier: "broken".to_string(),
            effects: vec![EffectValueRow {
                effect: "no_such_effect".to_string(),
                value: 1.0,
            }],
        }];
        let errors = load_named_modifiers(&rows, &effects, &mut named);
        assert!(errors.contains(ErrorCode::DoesNotExist));
        assert!(errors.contains(ErrorCode::InvalidData));
        assert!(named.is_empty());
    }
}
