//! Static geography: terrains, regions and province definitions.

use crate::define_index;
use crate::defs::goods::{GoodDefinition, GoodIndex};
use crate::defs::modifiers::{ModifierIndex, NamedModifier};
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::registry::{DuplicatePolicy, HasIdentifier, Registry};
use serde::{Deserialize, Serialize};
use vicdata::color::Color;
use vicdata::{ProvinceRow, TerrainRow};

define_index!(ProvinceIndex);
define_index!(RegionIndex);
define_index!(TerrainIndex);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainDefinition {
    pub identifier: String,
    pub color: Option<Color>,
    pub modifier: Option<ModifierIndex>,
}

impl HasIdentifier for TerrainDefinition {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub identifier: String,
}

impl HasIdentifier for Region {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Adjacency {
    pub to: ProvinceIndex,
    pub distance: Fixed,
    pub flags: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceDefinition {
    pub identifier: String,
    pub water: bool,
    pub terrain: Option<TerrainIndex>,
    pub region: Option<RegionIndex>,
    pub rgo_good: Option<GoodIndex>,
    pub rgo_production_type: Option<String>,
    pub adjacencies: Vec<Adjacency>,
}

impl HasIdentifier for ProvinceDefinition {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

pub fn load_terrains(
    rows: &[TerrainRow],
    named_modifiers: &Registry<ModifierIndex, NamedModifier>,
    registry: &mut Registry<TerrainIndex, TerrainDefinition>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let modifier = match &row.modifier {
            Some(name) => match named_modifiers.expect(name) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    continue;
                }
            },
            None => None,
        };
        if let Err(err) = registry.register(
            TerrainDefinition {
                identifier: row.identifier.clone(),
                color: row.color,
                modifier,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}

/// Provinces resolve in two passes so adjacencies may reference provinces
/// declared later. Regions are registered on first mention.
pub fn load_provinces(
    rows: &[ProvinceRow],
    goods: &Registry<GoodIndex, GoodDefinition>,
    terrains: &Registry<TerrainIndex, TerrainDefinition>,
    regions: &mut Registry<RegionIndex, Region>,
    registry: &mut Registry<ProvinceIndex, ProvinceDefinition>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;

    for row in rows {
        let terrain = match &row.terrain {
            Some(name) => match terrains.expect(name) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    None
                }
            },
            None => None,
        };
        let region = match &row.region {
            Some(name) => match regions.register(
                Region {
                    identifier: name.clone(),
                },
                DuplicatePolicy::Ignore,
            ) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err;
                    None
                }
            },
            None => None,
        };
        let rgo_good = match &row.rgo_good {
            Some(name) => match goods.expect(name) {
                Ok(index) => Some(index),
                Err(err) => {
                    errors |= err | ErrorCode::InvalidData.into();
                    None
                }
            },
            None => None,
        };
        if let Err(err) = registry.register(
            ProvinceDefinition {
                identifier: row.identifier.clone(),
                water: row.water,
                terrain,
                region,
                rgo_good,
                rgo_production_type: row.rgo_production_type.clone(),
                adjacencies: Vec::new(),
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }

    for row in rows {
        let Some(own) = registry.index_of(&row.identifier) else {
            continue;
        };
        let mut adjacencies = Vec::with_capacity(row.adjacencies.len());
        for adjacency in &row.adjacencies {
            match registry.expect(&adjacency.to) {
                Ok(to) => adjacencies.push(Adjacency {
                    to,
                    distance: Fixed::from_f64(adjacency.distance),
                    flags: adjacency.flags,
                }),
                Err(err) => errors |= err | ErrorCode::InvalidData.into(),
            }
        }
        registry.get_mut(own).adjacencies = adjacencies;
    }
    errors
}
