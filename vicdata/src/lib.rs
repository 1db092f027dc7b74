//! # Victorian-era mod data
//!
//! Declarative content for the simulation: plain serde-deserialisable rows
//! describing goods, pops, politics, production recipes, military content
//! and events, plus the shared defines and rule vocabulary.
//!
//! Nothing here is runtime state. The rows are whatever the host parsed out
//! of a mod (the reference driver feeds them in as JSON); `vicsim-core`
//! turns them into locked registries and builds the world from a bookmark.

pub mod bookmark;
pub mod color;
pub mod defines;
pub mod events;
pub mod goods;
pub mod ident;
pub mod military;
pub mod modifiers;
pub mod politics;
pub mod pops;
pub mod production;
pub mod rules;

pub use bookmark::{Bookmark, CountrySetup, PopSetup, ProvinceSetup};
pub use color::Color;
pub use ident::{validate_identifier, IdentError};
pub use rules::{Rule, RuleSet};

use serde::{Deserialize, Serialize};

/// Everything a mod declares, already parsed.
///
/// This is the single handoff structure between the host's data layer and
/// the simulation's registry loaders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModData {
    #[serde(default)]
    pub goods: Vec<goods::GoodRow>,
    #[serde(default)]
    pub pop_types: Vec<pops::PopTypeRow>,
    #[serde(default)]
    pub cultures: Vec<pops::CultureRow>,
    #[serde(default)]
    pub religions: Vec<pops::ReligionRow>,
    #[serde(default)]
    pub ideologies: Vec<politics::IdeologyRow>,
    #[serde(default)]
    pub issues: Vec<politics::IssueRow>,
    #[serde(default)]
    pub national_values: Vec<politics::NationalValueRow>,
    #[serde(default)]
    pub governments: Vec<politics::GovernmentRow>,
    #[serde(default)]
    pub countries: Vec<politics::CountryRow>,
    #[serde(default)]
    pub production_types: Vec<production::ProductionTypeRow>,
    #[serde(default)]
    pub unit_types: Vec<military::UnitTypeRow>,
    #[serde(default)]
    pub rebel_types: Vec<military::RebelTypeRow>,
    #[serde(default)]
    pub wargoals: Vec<military::WargoalRow>,
    #[serde(default)]
    pub events: Vec<events::EventRow>,
    #[serde(default)]
    pub national_foci: Vec<events::NationalFocusRow>,
    #[serde(default)]
    pub named_modifiers: Vec<modifiers::NamedModifierRow>,
    #[serde(default)]
    pub terrains: Vec<TerrainRow>,
    #[serde(default)]
    pub provinces: Vec<ProvinceRow>,
    #[serde(default)]
    pub defines: defines::Defines,
}

/// A terrain category. Gameplay only cares about the identifier and the
/// modifier it applies; the colour is presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainRow {
    pub identifier: String,
    #[serde(default)]
    pub color: Option<Color>,
    /// Name of a declared modifier applied to provinces with this terrain.
    #[serde(default)]
    pub modifier: Option<String>,
}

/// Static geography of one province.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceRow {
    pub identifier: String,
    #[serde(default)]
    pub water: bool,
    #[serde(default)]
    pub terrain: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Good gathered by this province's RGO, if any.
    #[serde(default)]
    pub rgo_good: Option<String>,
    /// Production type run by the RGO (must be an RGO recipe).
    #[serde(default)]
    pub rgo_production_type: Option<String>,
    /// (neighbour identifier, distance, flags) triples.
    #[serde(default)]
    pub adjacencies: Vec<AdjacencyRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacencyRow {
    pub to: String,
    pub distance: f64,
    #[serde(default)]
    pub flags: u32,
}
