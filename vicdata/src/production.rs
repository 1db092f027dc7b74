//! Production recipe declarations.

use crate::events::ConditionRow;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProducerKind {
    Factory,
    Rgo,
    Artisan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRow {
    pub pop_type: String,
    /// Multiplier weighting this job's share of the wage pool.
    #[serde(default = "one")]
    pub effect_multiplier: f64,
    /// Fraction of the workforce slot this job fills (employees only).
    #[serde(default = "one")]
    pub amount: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRow {
    pub good: String,
    pub amount: f64,
}

/// A production bonus active while its condition holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusRow {
    pub condition: ConditionRow,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTypeRow {
    pub identifier: String,
    pub kind: ProducerKind,
    /// Required for factory/RGO recipes, absent for artisans.
    #[serde(default)]
    pub owner: Option<JobRow>,
    #[serde(default)]
    pub employees: Vec<JobRow>,
    pub base_workforce_size: i64,
    #[serde(default)]
    pub input_goods: Vec<InputRow>,
    pub output_good: String,
    pub base_output_quantity: f64,
    /// Goods consumed for upkeep rather than production.
    #[serde(default)]
    pub maintenance_requirements: Vec<InputRow>,
    #[serde(default)]
    pub bonuses: Vec<BonusRow>,
    #[serde(default)]
    pub farm: bool,
    #[serde(default)]
    pub mine: bool,
    #[serde(default)]
    pub coastal: bool,
}
