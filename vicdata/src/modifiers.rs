//! Named modifier declarations.
//!
//! The effect vocabulary itself (identifiers, formats, neutral elements) is
//! a fixed catalogue registered by the simulation; mods only declare named
//! bundles of effect values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedModifierRow {
    pub identifier: String,
    /// (effect identifier, value) pairs, in declaration order.
    #[serde(default)]
    pub effects: Vec<EffectValueRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectValueRow {
    pub effect: String,
    pub value: f64,
}
