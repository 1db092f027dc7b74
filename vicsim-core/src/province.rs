//! Province runtime state: pops, producers, distributions, modifiers.

use crate::date::Date;
use crate::defs::map::ProvinceIndex;
use crate::defs::modifiers::ModifierIndex;
use crate::defs::politics::{CountryIndex, IdeologyIndex};
use crate::defs::pops::{CultureIndex, PopTypeIndex, ReligionIndex};
use crate::fixed::Fixed;
use crate::indexed::IndexedMap;
use crate::modifier_sum::ModifierSum;
use crate::pop::{Pop, PopSize};
use crate::production::{FactoryProducer, ResourceGatheringOperation};
use serde::{Deserialize, Serialize};

/// A named modifier attached for a limited time (or permanently when no
/// expiry is set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveModifier {
    pub modifier: ModifierIndex,
    pub expires: Option<Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub slot: u32,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceInstance {
    pub province: ProvinceIndex,
    pub owner: Option<CountryIndex>,
    pub controller: Option<CountryIndex>,
    pub cores: Vec<CountryIndex>,
    pub rgo: Option<ResourceGatheringOperation>,
    pub factories: Vec<FactoryProducer>,
    pub buildings: Vec<Building>,
    /// Pops in their stable per-province order; `Pop::id_in_province` is
    /// the slot here.
    pub pops: Vec<Pop>,
    pub total_population: PopSize,
    pub pop_type_distribution: IndexedMap<PopTypeIndex, Fixed>,
    pub culture_distribution: IndexedMap<CultureIndex, Fixed>,
    pub religion_distribution: IndexedMap<ReligionIndex, Fixed>,
    pub ideology_distribution: IndexedMap<IdeologyIndex, Fixed>,
    /// Contributions local to the province (terrain, buildings, events).
    pub local_modifiers: ModifierSum,
    /// Contributions propagated from the owning country.
    pub owner_modifiers: ModifierSum,
    pub timed_modifiers: Vec<ActiveModifier>,
}

impl ProvinceInstance {
    pub fn new(
        province: ProvinceIndex,
        pop_type_count: usize,
        culture_count: usize,
        religion_count: usize,
        ideology_count: usize,
    ) -> Self {
        Self {
            province,
            owner: None,
            controller: None,
            cores: Vec::new(),
            rgo: None,
            factories: Vec::new(),
            buildings: Vec::new(),
            pops: Vec::new(),
            total_population: 0,
            pop_type_distribution: IndexedMap::new(pop_type_count),
            culture_distribution: IndexedMap::new(culture_count),
            religion_distribution: IndexedMap::new(religion_count),
            ideology_distribution: IndexedMap::new(ideology_count),
            local_modifiers: ModifierSum::new(),
            owner_modifiers: ModifierSum::new(),
            timed_modifiers: Vec::new(),
        }
    }

    pub fn add_pop(&mut self, mut pop: Pop) {
        pop.location = self.province;
        pop.id_in_province = self.pops.len() as u32;
        self.pops.push(pop);
    }

    /// Recompute the four distributions and the population total from the
    /// current pop list.
    pub fn update_distributions(&mut self) {
        self.total_population = 0;
        self.pop_type_distribution.clear();
        self.culture_distribution.clear();
        self.religion_distribution.clear();
        self.ideology_distribution.clear();

        for pop in &self.pops {
            self.total_population += pop.size;
            let size = Fixed::from_int(pop.size);
            self.pop_type_distribution[pop.pop_type] += size;
            self.culture_distribution[pop.culture] += size;
            self.religion_distribution[pop.religion] += size;
            self.ideology_distribution += &pop.ideology_distribution;
        }
    }

    /// Sum of an effect over both modifier pools, in neutral-absent form.
    pub fn modifier_total(
        &self,
        effect: crate::defs::modifiers::EffectIndex,
        catalogue: &crate::registry::Registry<
            crate::defs::modifiers::EffectIndex,
            crate::defs::modifiers::ModifierEffect,
        >,
    ) -> Fixed {
        self.local_modifiers.effect_of(effect, catalogue)
            + self.owner_modifiers.effect_of(effect, catalogue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distributions_follow_pops() {
        let mut province = ProvinceInstance::new(ProvinceIndex(0), 2, 2, 1, 2);
        let mut pop_a = Pop::new(
            PopTypeIndex(0),
            false,
            CultureIndex(0),
            ReligionIndex(0),
            1000,
            ProvinceIndex(0),
            0,
            2,
        );
        pop_a.ideology_distribution[IdeologyIndex(0)] = Fixed::from_int(1000);
        let mut pop_b = Pop::new(
            PopTypeIndex(1),
            false,
            CultureIndex(1),
            ReligionIndex(0),
            500,
            ProvinceIndex(0),
            1,
            2,
        );
        pop_b.ideology_distribution[IdeologyIndex(1)] = Fixed::from_int(500);
        province.add_pop(pop_a);
        province.add_pop(pop_b);

        province.update_distributions();
        assert_eq!(province.total_population, 1500);
        assert_eq!(
            province.pop_type_distribution[PopTypeIndex(0)],
            Fixed::from_int(1000)
        );
        assert_eq!(
            province.culture_distribution[CultureIndex(1)],
            Fixed::from_int(500)
        );
        assert_eq!(
            province.ideology_distribution[IdeologyIndex(0)],
            Fixed::from_int(1000)
        );
    }

    #[test]
    fn add_pop_assigns_slots() {
        let mut province = ProvinceInstance::new(ProvinceIndex(3), 1, 1, 1, 1);
        let pop = Pop::new(
            PopTypeIndex(0),
            false,
            CultureIndex(0),
            ReligionIndex(0),
            100,
            ProvinceIndex(0),
            99,
            1,
        );
        province.add_pop(pop);
        assert_eq!(province.pops[0].location, ProvinceIndex(3));
        assert_eq!(province.pops[0].id_in_province, 0);
    }
}
