//! Starting-state bookmark: which countries exist, what they own, who
//! lives where.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bookmark {
    /// Start date in `Y.M.D` form.
    pub date: String,
    #[serde(default)]
    pub countries: Vec<CountrySetup>,
    #[serde(default)]
    pub provinces: Vec<ProvinceSetup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountrySetup {
    pub tag: String,
    #[serde(default)]
    pub government: Option<String>,
    #[serde(default)]
    pub national_value: Option<String>,
    #[serde(default)]
    pub ruling_party: Option<String>,
    /// Active reforms, one per reform group.
    #[serde(default)]
    pub reforms: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub prestige: f64,
    #[serde(default)]
    pub plurality: f64,
    #[serde(default)]
    pub tax_rate: TaxSetup,
    #[serde(default)]
    pub tariff_rate: f64,
    #[serde(default)]
    pub treasury: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxSetup {
    pub poor: f64,
    pub middle: f64,
    pub rich: f64,
}

impl Default for TaxSetup {
    fn default() -> Self {
        Self {
            poor: 0.25,
            middle: 0.25,
            rich: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceSetup {
    pub province: String,
    #[serde(default)]
    pub owner: Option<String>,
    /// Defaults to the owner.
    #[serde(default)]
    pub controller: Option<String>,
    #[serde(default)]
    pub cores: Vec<String>,
    #[serde(default)]
    pub pops: Vec<PopSetup>,
    /// Factories standing at start: (production type, size multiplier).
    #[serde(default)]
    pub factories: Vec<FactorySetup>,
    #[serde(default)]
    pub rgo_size_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopSetup {
    pub pop_type: String,
    pub culture: String,
    pub religion: String,
    pub size: i64,
    #[serde(default)]
    pub militancy: f64,
    #[serde(default)]
    pub consciousness: f64,
    #[serde(default = "default_literacy")]
    pub literacy: f64,
    #[serde(default)]
    pub cash: f64,
    #[serde(default)]
    pub rebel_type: Option<String>,
}

fn default_literacy() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorySetup {
    pub production_type: String,
    #[serde(default = "one")]
    pub size_multiplier: f64,
    #[serde(default)]
    pub budget: f64,
}

fn one() -> f64 {
    1.0
}
