//! Country runtime state: politics, budgets, aggregates.

use crate::defs::politics::{
    CountryIndex, GovernmentIndex, IdeologyIndex, IssueGroupIndex, IssueIndex, NationalValueIndex,
};
use crate::defs::map::ProvinceIndex;
use crate::defs::pops::{CultureIndex, PopTypeIndex, ReligionIndex};
use crate::defs::Definitions;
use crate::fixed::Fixed;
use crate::indexed::IndexedMap;
use crate::modifier_sum::ModifierSum;
use crate::pop::PopSize;
use crate::province::ActiveModifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use vicdata::pops::Strata;
use vicdata::rules::RuleSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryInstance {
    pub country: CountryIndex,
    pub owned_provinces: Vec<ProvinceIndex>,
    pub controlled_provinces: Vec<ProvinceIndex>,
    pub government: Option<GovernmentIndex>,
    pub national_value: Option<NationalValueIndex>,
    /// Slot into the definition's party roster.
    pub ruling_party: Option<u32>,
    /// Active issue per group: the ruling party's policy for policy
    /// groups, the enacted reform for reform groups.
    pub active_issues: IndexedMap<IssueGroupIndex, Option<IssueIndex>>,
    pub rules: RuleSet,
    pub flags: BTreeSet<String>,
    pub technologies: BTreeSet<String>,
    pub inventions: BTreeSet<String>,
    pub decisions_taken: BTreeSet<String>,
    pub timed_modifiers: Vec<ActiveModifier>,
    /// Cached country-wide modifier contributions.
    pub modifiers: ModifierSum,

    pub prestige: Fixed,
    pub plurality: Fixed,
    pub treasury: Fixed,
    /// Budget-set tax sliders per strata.
    pub tax_rate: [Fixed; Strata::COUNT],
    /// Sliders after administrative efficiency, consulted by pops.
    pub effective_tax_rate: [Fixed; Strata::COUNT],
    /// Budget-set tariff slider.
    pub tariff_rate: Fixed,
    /// Slider after clamping to the active trade policy's allowed range.
    pub effective_tariff_rate: Fixed,
    pub subsidise_factories: bool,
    /// Daily welfare/salary sliders, per head. Zero disables the stream.
    pub unemployment_subsidy_per_capita: Fixed,
    pub pension_per_capita: Fixed,
    pub administration_salary_per_capita: Fixed,
    /// Fraction of yesterday's import value refunded to each pop.
    pub import_subsidies_fraction: Fixed,

    pub research_pool: Fixed,
    pub leadership_pool: Fixed,

    pub tax_income_today: Fixed,
    pub tariff_income_today: Fixed,

    pub pop_type_counts: IndexedMap<PopTypeIndex, Fixed>,
    pub culture_counts: IndexedMap<CultureIndex, Fixed>,
    pub religion_counts: IndexedMap<ReligionIndex, Fixed>,
    pub ideology_counts: IndexedMap<IdeologyIndex, Fixed>,
    pub total_population: PopSize,
    pub primary_culture_population: PopSize,
    /// Literacy mean weighted by pop size.
    pub average_literacy: Fixed,
    /// Regiments supportable by pops whose culture status passes the
    /// recruitment policy.
    pub supported_regiments: u32,
}

impl CountryInstance {
    pub fn new(country: CountryIndex, defs: &Definitions) -> Self {
        Self {
            country,
            owned_provinces: Vec::new(),
            controlled_provinces: Vec::new(),
            government: None,
            national_value: None,
            ruling_party: None,
            active_issues: IndexedMap::new(defs.issue_groups.len()),
            rules: RuleSet::EMPTY,
            flags: BTreeSet::new(),
            technologies: BTreeSet::new(),
            inventions: BTreeSet::new(),
            decisions_taken: BTreeSet::new(),
            timed_modifiers: Vec::new(),
            modifiers: ModifierSum::new(),
            prestige: Fixed::ZERO,
            plurality: Fixed::ZERO,
            treasury: Fixed::ZERO,
            tax_rate: [Fixed::from_fraction(1, 4); Strata::COUNT],
            effective_tax_rate: [Fixed::from_fraction(1, 4); Strata::COUNT],
            tariff_rate: Fixed::ZERO,
            effective_tariff_rate: Fixed::ZERO,
            subsidise_factories: false,
            unemployment_subsidy_per_capita: Fixed::ZERO,
            pension_per_capita: Fixed::ZERO,
            administration_salary_per_capita: Fixed::ZERO,
            import_subsidies_fraction: Fixed::ZERO,
            research_pool: Fixed::ZERO,
            leadership_pool: Fixed::ZERO,
            tax_income_today: Fixed::ZERO,
            tariff_income_today: Fixed::ZERO,
            pop_type_counts: IndexedMap::new(defs.pop_types.len()),
            culture_counts: IndexedMap::new(defs.cultures.len()),
            religion_counts: IndexedMap::new(defs.religions.len()),
            ideology_counts: IndexedMap::new(defs.ideologies.len()),
            total_population: 0,
            primary_culture_population: 0,
            average_literacy: Fixed::ZERO,
            supported_regiments: 0,
        }
    }

    pub fn reform_in(&self, group: IssueGroupIndex) -> Option<IssueIndex> {
        self.active_issues.get(group).copied().flatten()
    }

    pub fn set_active_issue(&mut self, group: IssueGroupIndex, issue: IssueIndex) {
        self.active_issues[group] = Some(issue);
    }

    pub fn effective_tax_rate_for(&self, strata: Strata) -> Fixed {
        self.effective_tax_rate[strata.index()]
    }

    /// Union of every active issue's rules. Any source granting a rule
    /// grants it overall.
    pub fn recompute_rules(&mut self, defs: &Definitions) {
        let mut rules = RuleSet::EMPTY;
        for (_, issue) in self.active_issues.iter() {
            if let Some(issue) = issue {
                rules |= defs.issues.get(*issue).rules;
            }
        }
        self.rules = rules;
    }

    /// Effective tax per strata: the slider scaled by one plus the summed
    /// efficiency of active issues and the country's tax modifiers,
    /// clamped into [0, 1].
    pub fn recompute_effective_tax_rates(&mut self, defs: &Definitions) {
        let modifier_bonus = self
            .modifiers
            .effect_of(defs.effect_ids.tax_efficiency, &defs.modifier_effects);
        for strata_slot in 0..Strata::COUNT {
            let mut issue_bonus = Fixed::ZERO;
            for (_, issue) in self.active_issues.iter() {
                if let Some(issue) = issue {
                    issue_bonus += defs.issues.get(*issue).tax_efficiency[strata_slot];
                }
            }
            let efficiency = Fixed::ONE + issue_bonus + modifier_bonus;
            self.effective_tax_rate[strata_slot] =
                (self.tax_rate[strata_slot] * efficiency).clamp(Fixed::ZERO, Fixed::ONE);
        }
    }

    /// Tariff slider clamped to the range the active trade policy allows,
    /// shifted by tariff modifiers.
    pub fn recompute_effective_tariff(&mut self, defs: &Definitions) {
        let mut lower = Fixed::ZERO;
        let mut upper = Fixed::ONE;
        for (_, issue) in self.active_issues.iter() {
            if let Some(issue) = issue {
                let issue = defs.issues.get(*issue);
                if let Some(min) = issue.tariff_min {
                    lower = lower.max(min);
                }
                if let Some(max) = issue.tariff_max {
                    upper = upper.min(max);
                }
            }
        }
        let modifier_bonus = self
            .modifiers
            .effect_of(defs.effect_ids.tariff, &defs.modifier_effects);
        if upper < lower {
            upper = lower;
        }
        self.effective_tariff_rate = (self.tariff_rate + modifier_bonus).clamp(lower, upper);
    }

    /// Research and leadership points generated by pops near each type's
    /// optimum share of the population.
    pub fn generate_research_and_leadership(&mut self, defs: &Definitions) {
        if self.total_population == 0 {
            return;
        }
        let total = Fixed::from_int(self.total_population);
        let mut research = Fixed::ZERO;
        let mut leadership = Fixed::ZERO;
        for (pop_type_index, count) in self.pop_type_counts.iter() {
            let pop_type = defs.pop_types.get(pop_type_index);
            let share = *count / total;
            if pop_type.research_points > Fixed::ZERO && pop_type.research_optimum > Fixed::ZERO {
                let ratio = (share / pop_type.research_optimum).min(Fixed::ONE);
                research += pop_type.research_points * ratio;
            }
            if pop_type.leadership_points > Fixed::ZERO && pop_type.leadership_optimum > Fixed::ZERO
            {
                let ratio = (share / pop_type.leadership_optimum).min(Fixed::ONE);
                leadership += pop_type.leadership_points * ratio;
            }
        }
        let research_bonus = Fixed::ONE
            + self
                .modifiers
                .effect_of(defs.effect_ids.research_points, &defs.modifier_effects);
        let leadership_bonus = self
            .modifiers
            .effect_of(defs.effect_ids.leadership, &defs.modifier_effects);
        self.research_pool += research * research_bonus;
        self.leadership_pool += leadership + leadership_bonus;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vicdata::politics::{IssueKind, IssueRow};
    use vicdata::rules::Rule;

    fn defs_with_issues(rows: Vec<IssueRow>) -> Definitions {
        let data = vicdata::ModData {
            issues: rows,
            ..Default::default()
        };
        Definitions::from_mod_data(&data).unwrap()
    }

    fn reform_row(identifier: &str, group: &str) -> IssueRow {
        IssueRow {
            identifier: identifier.to_string(),
            kind: IssueKind::Reform,
            group: group.to_string(),
            ordinal: 0,
            modifier: None,
            rules: vec![],
            tax_efficiency: BTreeMap::new(),
            tariff_min: None,
            tariff_max: None,
        }
    }

    #[test]
    fn rules_union_over_active_issues() {
        let mut row_a = reform_row("state_factories", "economy");
        row_a.rules = vec![Rule::BuildFactory, Rule::CanSubsidise];
        let mut row_b = reform_row("free_press", "press");
        row_b.rules = vec![Rule::PressRights];
        let defs = defs_with_issues(vec![row_a, row_b]);

        let mut country = CountryInstance::new(CountryIndex(0), &defs);
        country.set_active_issue(
            defs.issues.get(defs.issues.index_of("state_factories").unwrap()).group,
            defs.issues.index_of("state_factories").unwrap(),
        );
        country.recompute_rules(&defs);
        assert!(country.rules.allows(Rule::BuildFactory));
        assert!(!country.rules.allows(Rule::PressRights));

        country.set_active_issue(
            defs.issues.get(defs.issues.index_of("free_press").unwrap()).group,
            defs.issues.index_of("free_press").unwrap(),
        );
        country.recompute_rules(&defs);
        assert!(country.rules.allows(Rule::PressRights));
        assert!(country.rules.allows(Rule::CanSubsidise));
    }

    #[test]
    fn effective_tax_includes_issue_efficiency() {
        let mut row = reform_row("bureaucracy", "administration");
        row.tax_efficiency.insert("poor".to_string(), 0.2);
        let defs = defs_with_issues(vec![row]);

        let mut country = CountryInstance::new(CountryIndex(0), &defs);
        let issue = defs.issues.index_of("bureaucracy").unwrap();
        country.set_active_issue(defs.issues.get(issue).group, issue);
        country.tax_rate = [Fixed::from_fraction(1, 2); Strata::COUNT];
        country.recompute_effective_tax_rates(&defs);

        // poor: 0.5 · 1.2 = 0.6; others: 0.5
        assert_eq!(
            country.effective_tax_rate_for(Strata::Poor),
            Fixed::from_fraction(6, 10)
        );
        assert_eq!(
            country.effective_tax_rate_for(Strata::Middle),
            Fixed::from_fraction(1, 2)
        );
    }

    #[test]
    fn tariff_clamps_to_policy_range() {
        let mut row = reform_row("protectionism", "trade_policy");
        row.kind = IssueKind::PartyPolicy;
        row.tariff_min = Some(0.1);
        row.tariff_max = Some(0.6);
        let defs = defs_with_issues(vec![row]);

        let mut country = CountryInstance::new(CountryIndex(0), &defs);
        let issue = defs.issues.index_of("protectionism").unwrap();
        country.set_active_issue(defs.issues.get(issue).group, issue);

        country.tariff_rate = Fixed::from_fraction(9, 10);
        country.recompute_effective_tariff(&defs);
        assert_eq!(country.effective_tariff_rate, Fixed::from_fraction(6, 10));

        country.tariff_rate = Fixed::ZERO;
        country.recompute_effective_tariff(&defs);
        assert_eq!(country.effective_tariff_rate, Fixed::from_fraction(1, 10));
    }

    #[test]
    fn research_scales_with_optimum_ratio() {
        let data = vicdata::ModData {
            pop_types: vec![
                vicdata::pops::PopTypeRow {
                    identifier: "clerks".to_string(),
                    strata: Strata::Middle,
                    color: None,
                    life_needs: vec![],
                    everyday_needs: vec![],
                    luxury_needs: vec![],
                    is_artisan: false,
                    can_be_unemployed: true,
                    can_be_recruited: false,
                    equivalent: None,
                    research_optimum: 0.02,
                    research_points: 2.0,
                    leadership_optimum: 0.0,
                    leadership_points: 0.0,
                },
                vicdata::pops::PopTypeRow {
                    identifier: "farmers".to_string(),
                    strata: Strata::Poor,
                    color: None,
                    life_needs: vec![],
                    everyday_needs: vec![],
                    luxury_needs: vec![],
                    is_artisan: false,
                    can_be_unemployed: true,
                    can_be_recruited: true,
                    equivalent: None,
                    research_optimum: 0.0,
                    research_points: 0.0,
                    leadership_optimum: 0.0,
                    leadership_points: 0.0,
                },
            ],
            ..Default::default()
        };
        let defs = Definitions::from_mod_data(&data).unwrap();
        let clerks = defs.pop_types.index_of("clerks").unwrap();
        let farmers = defs.pop_types.index_of("farmers").unwrap();

        let mut country = CountryInstance::new(CountryIndex(0), &defs);
        country.total_population = 100_000;
        country.pop_type_counts[clerks] = Fixed::from_int(1_000); // 1% of 2% optimum
        country.pop_type_counts[farmers] = Fixed::from_int(99_000);
        country.generate_research_and_leadership(&defs);
        // half the optimum share: 2.0 · 0.5 = 1.0
        assert_eq!(country.research_pool, Fixed::ONE);
    }
}
