//! Event and national-focus declarations, plus the declarative condition
//! and effect trees the scripting layer compiles.
//!
//! The trees are deliberately small: the simulation only promises a boolean
//! predicate and a state mutation over a scoped context. A host with a
//! richer script language lowers into these nodes when it parses the mod.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRow {
    Always(bool),
    Not(Box<ConditionRow>),
    All(Vec<ConditionRow>),
    Any(Vec<ConditionRow>),
    /// Scoped country has the named flag set.
    HasCountryFlag(String),
    /// Scoped country has taken the named decision.
    HasDecision(String),
    /// Scoped country has the named technology.
    HasTechnology(String),
    /// Scoped country has the named invention unlocked.
    HasInvention(String),
    /// Scoped country's active reform in the row's group is the named one.
    HasReform(String),
    /// Scoped country's government type is the named one.
    GovernmentIs(String),
    /// Scoped province owner exists and equals the named tag.
    OwnerIs(String),
    /// Scoped province terrain is the named one.
    TerrainIs(String),
    /// Scoped province is coastal.
    IsCoastal,
    /// Scoped pop's type is the named one.
    PopTypeIs(String),
    /// Scoped pop's culture status is primary or accepted.
    IsCultureAccepted,
    /// Scoped pop militancy is at least this value.
    MilitancyAtLeast(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectRow {
    Nothing,
    Compound(Vec<EffectRow>),
    SetCountryFlag(String),
    ClearCountryFlag(String),
    /// Attach the named modifier to the scoped country for N days
    /// (0 = permanent).
    AddCountryModifier { name: String, days: u32 },
    RemoveCountryModifier(String),
    AddProvinceModifier { name: String, days: u32 },
    RemoveProvinceModifier(String),
    UnlockInvention(String),
    EnactReform(String),
    /// Adjust militancy of every pop in scope by this amount.
    AddMilitancy(f64),
    AddConsciousness(f64),
    AddPrestige(f64),
    /// Credit the scoped country's treasury (may be negative).
    AddTreasury(f64),
}

/// Declarative conditional weight: `base` combined with factor entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRow {
    pub base: f64,
    #[serde(default)]
    pub factors: Vec<WeightFactorRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightFactorRow {
    pub condition: ConditionRow,
    pub value: f64,
    /// Multiplicative by default; additive factors opt in.
    #[serde(default)]
    pub additive: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventScopeKind {
    Country,
    Province,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub identifier: String,
    pub scope: EventScopeKind,
    #[serde(default)]
    pub trigger: Option<ConditionRow>,
    /// Mean time to happen, in days; rolled against daily.
    pub mean_time_to_happen: WeightRow,
    pub effect: EffectRow,
    #[serde(default)]
    pub fire_only_once: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalFocusRow {
    pub identifier: String,
    pub group: String,
    /// Modifier applied to the focused state/province.
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(default)]
    pub limit: Option<ConditionRow>,
}
