//! Pop type, culture and religion declarations.

use crate::color::Color;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Strata {
    Poor,
    Middle,
    Rich,
}

impl Strata {
    pub const COUNT: usize = 3;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One good the pop type demands, in base units per 200k size-points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedRow {
    pub good: String,
    pub base_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopTypeRow {
    pub identifier: String,
    pub strata: Strata,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub life_needs: Vec<NeedRow>,
    #[serde(default)]
    pub everyday_needs: Vec<NeedRow>,
    #[serde(default)]
    pub luxury_needs: Vec<NeedRow>,
    #[serde(default)]
    pub is_artisan: bool,
    #[serde(default)]
    pub can_be_unemployed: bool,
    #[serde(default)]
    pub can_be_recruited: bool,
    /// Pop type this one converts to when its own type is retired by a mod.
    #[serde(default)]
    pub equivalent: Option<String>,
    /// Share of the national pop at which research output peaks.
    #[serde(default)]
    pub research_optimum: f64,
    #[serde(default)]
    pub research_points: f64,
    /// Leadership-point generation analogues.
    #[serde(default)]
    pub leadership_optimum: f64,
    #[serde(default)]
    pub leadership_points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CultureRow {
    pub identifier: String,
    /// Culture group identifier; groups need no registration of their own.
    pub group: String,
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReligionRow {
    pub identifier: String,
    pub group: String,
    #[serde(default)]
    pub color: Option<Color>,
}
