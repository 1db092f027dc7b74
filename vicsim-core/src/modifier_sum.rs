//! Modifier contribution sums.
//!
//! Each country and each province carries two of these: one for local
//! contributions and one for contributions propagated from the owner. A
//! sum keeps the full (source, effect, value) stack so contributions can
//! be removed exactly, plus a per-effect cache consulted by gameplay code.

use crate::defs::map::TerrainIndex;
use crate::defs::modifiers::{EffectIndex, ModifierEffect, ModifierIndex, NamedModifier};
use crate::defs::politics::{CountryIndex, IssueIndex, NationalValueIndex};
use crate::defs::military::RebelTypeIndex;
use crate::defs::events::NationalFocusIndex;
use crate::fixed::Fixed;
use crate::indexed::FixedMap;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};

/// Where a contribution came from. Removal is by source, so a reform swap
/// or an expiring event modifier takes exactly its own values with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionSource {
    Terrain(TerrainIndex),
    Reform(IssueIndex),
    NationalValue(NationalValueIndex),
    TimedModifier(ModifierIndex),
    Rebels(RebelTypeIndex),
    NationalFocus(NationalFocusIndex),
    /// Owner-country contributions propagated onto an owned province.
    OwnerCountry(CountryIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub source: ContributionSource,
    pub effect: EffectIndex,
    pub value: Fixed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierSum {
    contributions: Vec<Contribution>,
    cache: FixedMap<EffectIndex>,
}

impl ModifierSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.contributions.clear();
        self.cache.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn add_contribution(&mut self, source: ContributionSource, effect: EffectIndex, value: Fixed) {
        self.contributions.push(Contribution {
            source,
            effect,
            value,
        });
        self.cache.add(effect, value);
    }

    /// Add every effect of a named modifier, scaled by `multiplier`
    /// (sources like plurality-weighted national foci contribute
    /// fractionally).
    pub fn add_modifier_scaled(
        &mut self,
        modifier: &NamedModifier,
        source: ContributionSource,
        multiplier: Fixed,
    ) {
        for &(effect, value) in &modifier.effects {
            self.add_contribution(source, effect, value * multiplier);
        }
    }

    pub fn add_modifier(&mut self, modifier: &NamedModifier, source: ContributionSource) {
        self.add_modifier_scaled(modifier, source, Fixed::ONE);
    }

    /// Take every contribution from one source back out. The cache is
    /// rebuilt so the result is bitwise identical to a sum that never saw
    /// the source.
    pub fn remove_source(&mut self, source: ContributionSource) {
        self.contributions.retain(|c| c.source != source);
        self.rebuild_cache();
    }

    /// Fold another sum into this one (country sums absorb their
    /// province-independent pools this way).
    pub fn add_sum(&mut self, other: &ModifierSum) {
        for contribution in &other.contributions {
            self.add_contribution(contribution.source, contribution.effect, contribution.value);
        }
    }

    fn rebuild_cache(&mut self) {
        self.cache.clear();
        for contribution in &self.contributions {
            self.cache.add(contribution.effect, contribution.value);
        }
    }

    /// Cached total for a gameplay consumer. Absent effects report their
    /// neutral element; cosmetic (`no_effect`) entries are elided and
    /// always report neutral.
    pub fn effect_of(
        &self,
        effect: EffectIndex,
        catalogue: &Registry<EffectIndex, ModifierEffect>,
    ) -> Fixed {
        if effect.0 as usize >= catalogue.len() {
            log::error!("modifier effect {:?} is not in the catalogue", effect);
            return Fixed::ZERO;
        }
        let metadata = catalogue.get(effect);
        if metadata.no_effect {
            return metadata.neutral.value();
        }
        self.cache
            .lookup(effect)
            .unwrap_or_else(|| metadata.neutral.value())
    }

    /// Raw cached total including cosmetic effects, for display.
    pub fn displayed_value(&self, effect: EffectIndex) -> Option<Fixed> {
        self.cache.lookup(effect)
    }

    /// Bitwise cache equality, used by the rebuild-order tests.
    pub fn cache_eq(&self, other: &ModifierSum) -> bool {
        let mut lhs: Vec<(EffectIndex, Fixed)> = self.cache.iter().collect();
        let mut rhs: Vec<(EffectIndex, Fixed)> = other.cache.iter().collect();
        lhs.sort_by_key(|(effect, _)| *effect);
        rhs.sort_by_key(|(effect, _)| *effect);
        lhs == rhs
    }
}
