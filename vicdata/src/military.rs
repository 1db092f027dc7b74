//! Unit, rebel and wargoal declarations.

use crate::events::{ConditionRow, EffectRow};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UnitBranch {
    Land,
    Naval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTypeRow {
    pub identifier: String,
    pub branch: UnitBranch,
    #[serde(default)]
    pub attack: f64,
    #[serde(default)]
    pub defence: f64,
    #[serde(default)]
    pub maneuver: f64,
    #[serde(default)]
    pub speed: f64,
    /// Goods consumed to build one regiment/ship of this type.
    #[serde(default)]
    pub build_cost: Vec<crate::production::InputRow>,
    /// Daily supply consumption while mobilised.
    #[serde(default)]
    pub supply_consumption: Vec<crate::production::InputRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebelTypeRow {
    pub identifier: String,
    /// Ideology the rebels fight for, if any.
    #[serde(default)]
    pub ideology: Option<String>,
    /// Militancy threshold above which pops may defect to this type.
    #[serde(default)]
    pub defection_militancy: f64,
    /// Modifier applied country-wide while the rebellion is active.
    #[serde(default)]
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WargoalRow {
    pub identifier: String,
    #[serde(default)]
    pub sprite_index: u32,
    #[serde(default)]
    pub war_score_cost: f64,
    #[serde(default)]
    pub prestige_gain: f64,
    /// Condition under which the goal can be declared.
    #[serde(default)]
    pub can_use: Option<ConditionRow>,
    /// Applied to the winner when the goal is enforced.
    #[serde(default)]
    pub on_success: Option<EffectRow>,
}
