//! Trade good declarations.

use crate::color::Color;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GoodCategory {
    MilitaryGoods,
    RawMaterialGoods,
    IndustrialGoods,
    ConsumerGoods,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodRow {
    pub identifier: String,
    pub category: GoodCategory,
    #[serde(default)]
    pub color: Option<Color>,
    pub base_price: f64,
    /// Goods can start locked and be enabled later by an invention/event.
    #[serde(default = "default_true")]
    pub available_from_start: bool,
    #[serde(default = "default_true")]
    pub tradeable: bool,
    /// The money good is never shown in trade and never cleared.
    #[serde(default)]
    pub money: bool,
    #[serde(default)]
    pub overseas_penalty: bool,
}

fn default_true() -> bool {
    true
}
