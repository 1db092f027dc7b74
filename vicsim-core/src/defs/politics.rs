//! Ideologies, issues, national values, governments and country
//! definitions.
//!
//! Party policies and reforms share registration, grouping and modifier
//! plumbing; they are one entity with a tagged payload rather than an
//! inheritance pair.

use crate::define_index;
use crate::defs::modifiers::{ModifierIndex, NamedModifier};
use crate::defs::pops::{Culture, CultureIndex, Religion, ReligionIndex};
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::registry::{DuplicatePolicy, HasIdentifier, Registry};
use crate::scripts::Condition;
use serde::{Deserialize, Serialize};
use vicdata::color::Color;
use vicdata::politics::{
    CountryRow, GovernmentRow, IdeologyRow, IssueKind, IssueRow, NationalValueRow,
    RegimentCulturePolicy,
};
use vicdata::pops::Strata;
use vicdata::rules::RuleSet;

define_index!(IdeologyIndex);
define_index!(IssueIndex);
define_index!(IssueGroupIndex);
define_index!(GovernmentIndex);
define_index!(NationalValueIndex);
define_index!(CountryIndex);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ideology {
    pub identifier: String,
    pub group: String,
    pub color: Option<Color>,
    pub uncivilised: bool,
    pub available_from_start: bool,
}

impl HasIdentifier for Ideology {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Payload distinguishing the two issue flavours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuePayload {
    PartyPolicy,
    Reform { ordinal: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub identifier: String,
    pub group: IssueGroupIndex,
    pub payload: IssuePayload,
    pub modifier: Option<ModifierIndex>,
    pub rules: RuleSet,
    /// Tax-efficiency contribution while active, indexed by strata.
    pub tax_efficiency: [Fixed; Strata::COUNT],
    pub tariff_min: Option<Fixed>,
    pub tariff_max: Option<Fixed>,
}

impl Issue {
    pub fn is_reform(&self) -> bool {
        matches!(self.payload, IssuePayload::Reform { .. })
    }
}

impl HasIdentifier for Issue {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Mutually-exclusive group: exactly one member is active per country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueGroup {
    pub identifier: String,
    pub kind: IssueKind,
    /// Members in declaration order (reform ordering within the group).
    pub members: Vec<IssueIndex>,
}

impl HasIdentifier for IssueGroup {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalValue {
    pub identifier: String,
    pub modifier: Option<ModifierIndex>,
}

impl HasIdentifier for NationalValue {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Government {
    pub identifier: String,
    pub allowed_party_ideologies: Vec<IdeologyIndex>,
    pub elections: bool,
    pub election_duration_months: u32,
}

impl HasIdentifier for Government {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub identifier: String,
    pub ideology: IdeologyIndex,
    /// One active policy per policy group.
    pub policies: Vec<IssueIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub identifier: String,
    pub allow: Option<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryDefinition {
    /// Three-letter tag.
    pub identifier: String,
    pub color: Option<Color>,
    pub primary_culture: CultureIndex,
    pub accepted_cultures: Vec<CultureIndex>,
    pub religion: ReligionIndex,
    /// Roster in definition order.
    pub parties: Vec<Party>,
    pub regiment_cultures: RegimentCulturePolicy,
    pub decisions: Vec<Decision>,
}

impl HasIdentifier for CountryDefinition {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

pub fn load_ideologies(
    rows: &[IdeologyRow],
    registry: &mut Registry<IdeologyIndex, Ideology>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        if let Err(err) = registry.register(
            Ideology {
                identifier: row.identifier.clone(),
                group: row.group.clone(),
                color: row.color,
                uncivilised: row.uncivilised,
                available_from_start: row.available_from_start,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}

fn strata_index(name: &str) -> Option<usize> {
    match name {
        "poor" => Some(Strata::Poor.index()),
        "middle" => Some(Strata::Middle.index()),
        "rich" => Some(Strata::Rich.index()),
        _ => None,
    }
}

pub fn load_issues(
    rows: &[IssueRow],
    named_modifiers: &Registry<ModifierIndex, NamedModifier>,
    groups: &mut Registry<IssueGroupIndex, IssueGroup>,
    registry: &mut Registry<IssueIndex, Issue>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let group = match groups.register(
            IssueGroup {
                identifier: row.group.clone(),
                kind: row.kind,
                members: Vec::new(),
            },
            DuplicatePolicy::Ignore,
        ) {
            Ok(index) => index,
            Err(err) => {
                errors |= err;
                continue;
            }
        };
        if groups.get(group).kind != row.kind {
            log::error!(
                "issue group {:?} mixes party policies and reforms ({:?})",
                row.group,
                row.identifier
            );
            errors.insert(ErrorCode::InvalidData);
            continue;
        }
        let modifier = match &row.modifier {
            Some(name) => match named_modifiers.expect(name) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    None
                }
            },
            None => None,
        };
        let mut tax_efficiency = [Fixed::ZERO; Strata::COUNT];
        for (strata, value) in &row.tax_efficiency {
            match strata_index(strata) {
                Some(slot) => tax_efficiency[slot] = Fixed::from_f64(*value),
                None => {
                    log::error!("issue {:?} names unknown strata {:?}", row.identifier, strata);
                    errors.insert(ErrorCode::InvalidData);
                }
            }
        }
        let payload = match row.kind {
            IssueKind::PartyPolicy => IssuePayload::PartyPolicy,
            IssueKind::Reform => IssuePayload::Reform {
                ordinal: row.ordinal,
            },
        };
        let mut rules = RuleSet::EMPTY;
        for rule in &row.rules {
            rules.set(*rule, true);
        }
        match registry.register(
            Issue {
                identifier: row.identifier.clone(),
                group,
                payload,
                modifier,
                rules,
                tax_efficiency,
                tariff_min: row.tariff_min.map(Fixed::from_f64),
                tariff_max: row.tariff_max.map(Fixed::from_f64),
            },
            DuplicatePolicy::Fail,
        ) {
            Ok(index) => groups.get_mut(group).members.push(index),
            Err(err) => errors |= err,
        }
    }
    errors
}

pub fn load_national_values(
    rows: &[NationalValueRow],
    named_modifiers: &Registry<ModifierIndex, NamedModifier>,
    registry: &mut Registry<NationalValueIndex, NationalValue>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let modifier = match &row.modifier {
            Some(name) => match named_modifiers.expect(name) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    None
                }
            },
            None => None,
        };
        if let Err(err) = registry.register(
            NationalValue {
                identifier: row.identifier.clone(),
                modifier,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}

pub fn load_governments(
    rows: &[GovernmentRow],
    ideologies: &Registry<IdeologyIndex, Ideology>,
    registry: &mut Registry<GovernmentIndex, Government>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let mut allowed = Vec::with_capacity(row.allowed_party_ideologies.len());
        for name in &row.allowed_party_ideologies {
            match ideologies.expect(name) {
                Ok(index) => allowed.push(index),
                Err(err) => errors |= err | ErrorCode::InvalidData.into(),
            }
        }
        if let Err(err) = registry.register(
            Government {
                identifier: row.identifier.clone(),
                allowed_party_ideologies: allowed,
                elections: row.elections,
                election_duration_months: row.election_duration_months,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}

/// Decisions' `allow` conditions are attached afterwards, once every
/// registry a condition may reference is populated.
pub fn load_countries(
    rows: &[CountryRow],
    cultures: &Registry<CultureIndex, Culture>,
    religions: &Registry<ReligionIndex, Religion>,
    ideologies: &Registry<IdeologyIndex, Ideology>,
    issues: &Registry<IssueIndex, Issue>,
    registry: &mut Registry<CountryIndex, CountryDefinition>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let primary_culture = match cultures.expect(&row.primary_culture) {
            Ok(index) => index,
            Err(err) => {
                errors |= err | ErrorCode::InvalidData.into();
                continue;
            }
        };
        let religion = match religions.expect(&row.religion) {
            Ok(index) => index,
            Err(err) => {
                errors |= err | ErrorCode::InvalidData.into();
                continue;
            }
        };
        let mut accepted = Vec::with_capacity(row.accepted_cultures.len());
        for name in &row.accepted_cultures {
            match cultures.expect(name) {
                Ok(index) => accepted.push(index),
                Err(err) => errors |= err | ErrorCode::InvalidData.into(),
            }
        }
        let mut parties = Vec::with_capacity(row.parties.len());
        for party in &row.parties {
            let ideology = match ideologies.expect(&party.ideology) {
                Ok(index) => index,
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            };
            let mut policies = Vec::with_capacity(party.policies.len());
            for policy in &party.policies {
                match issues.expect(policy) {
                    Ok(index) => {
                        if issues.get(index).is_reform() {
                            log::error!(
                                "party {:?} lists reform {:?} as a policy",
                                party.identifier,
                                policy
                            );
                            errors.insert(ErrorCode::InvalidData);
                        } else {
                            policies.push(index);
                        }
                    }
                    Err(err) => errors |= err | ErrorCode::InvalidData.into(),
                }
            }
            parties.push(Party {
                identifier: party.identifier.clone(),
                ideology,
                policies,
            });
        }
        let decisions = row
            .decisions
            .iter()
            .map(|decision| Decision {
                identifier: decision.identifier.clone(),
                allow: None,
            })
            .collect();
        if let Err(err) = registry.register(
            CountryDefinition {
                identifier: row.identifier.clone(),
                color: row.color,
                primary_culture,
                accepted_cultures: accepted,
                religion,
                parties,
                regiment_cultures: row.regiment_cultures,
                decisions,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}
