//! Ideologies, issues (party policies and reforms), national values,
//! governments and country definitions.

use crate::color::Color;
use crate::events::ConditionRow;
use crate::rules::Rule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeologyRow {
    pub identifier: String,
    pub group: String,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub uncivilised: bool,
    /// Ideologies can be locked behind a date or an event.
    #[serde(default = "default_true")]
    pub available_from_start: bool,
}

/// Which half of the issue vocabulary a row belongs to.
///
/// Party policies shape party platforms; reforms shape government
/// capability. They share identifier space, group exclusivity and modifier
/// plumbing, so they are one row type with a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    PartyPolicy,
    Reform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRow {
    pub identifier: String,
    pub kind: IssueKind,
    /// Mutually-exclusive group; exactly one member is active per country.
    pub group: String,
    /// Ordering of reforms within their group (next/previous steps).
    #[serde(default)]
    pub ordinal: u32,
    /// Name of a declared modifier applied while active.
    #[serde(default)]
    pub modifier: Option<String>,
    /// Rules granted while active.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Administrative tax-efficiency contribution per strata while active,
    /// keyed poor/middle/rich.
    #[serde(default)]
    pub tax_efficiency: BTreeMap<String, f64>,
    /// Tariff range allowed while this (trade-policy) issue is active.
    #[serde(default)]
    pub tariff_min: Option<f64>,
    #[serde(default)]
    pub tariff_max: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalValueRow {
    pub identifier: String,
    #[serde(default)]
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernmentRow {
    pub identifier: String,
    /// Ideologies a ruling party may hold under this government.
    #[serde(default)]
    pub allowed_party_ideologies: Vec<String>,
    #[serde(default)]
    pub elections: bool,
    #[serde(default)]
    pub election_duration_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRow {
    pub identifier: String,
    pub ideology: String,
    /// Active party policies, one per policy group.
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Which culture statuses may man the country's regiments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RegimentCulturePolicy {
    PrimaryOnly,
    #[default]
    PrimaryAndAccepted,
    AllCultures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRow {
    /// Three-letter tag.
    pub identifier: String,
    #[serde(default)]
    pub color: Option<Color>,
    pub primary_culture: String,
    #[serde(default)]
    pub accepted_cultures: Vec<String>,
    pub religion: String,
    /// Parties in definition order; order is the roster order.
    #[serde(default)]
    pub parties: Vec<PartyRow>,
    #[serde(default)]
    pub regiment_cultures: RegimentCulturePolicy,
    /// Decisions with their availability condition; evaluated by the
    /// scripting layer.
    #[serde(default)]
    pub decisions: Vec<DecisionRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRow {
    pub identifier: String,
    #[serde(default)]
    pub allow: Option<ConditionRow>,
}

fn default_true() -> bool {
    true
}
