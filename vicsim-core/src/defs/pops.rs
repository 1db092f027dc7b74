//! Pop type, culture and religion definitions.

use crate::define_index;
use crate::defs::goods::{GoodDefinition, GoodIndex};
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::indexed::FixedMap;
use crate::registry::{DuplicatePolicy, HasIdentifier, Registry};
use serde::{Deserialize, Serialize};
use vicdata::color::Color;
use vicdata::pops::{CultureRow, NeedRow, PopTypeRow, ReligionRow, Strata};

define_index!(PopTypeIndex);
define_index!(CultureIndex);
define_index!(ReligionIndex);

/// The three need tiers, in feeding order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum NeedCategory {
    Life,
    Everyday,
    Luxury,
}

impl NeedCategory {
    pub const ALL: [NeedCategory; 3] = [
        NeedCategory::Life,
        NeedCategory::Everyday,
        NeedCategory::Luxury,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopType {
    pub identifier: String,
    pub strata: Strata,
    pub color: Option<Color>,
    /// Base demand per good, indexed by [`NeedCategory`].
    pub needs: [FixedMap<GoodIndex>; 3],
    pub is_artisan: bool,
    pub can_be_unemployed: bool,
    pub can_be_recruited: bool,
    pub equivalent: Option<PopTypeIndex>,
    pub research_optimum: Fixed,
    pub research_points: Fixed,
    pub leadership_optimum: Fixed,
    pub leadership_points: Fixed,
}

impl PopType {
    pub fn needs_for(&self, category: NeedCategory) -> &FixedMap<GoodIndex> {
        &self.needs[category.index()]
    }
}

impl HasIdentifier for PopType {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Culture {
    pub identifier: String,
    pub group: String,
    pub color: Option<Color>,
}

impl HasIdentifier for Culture {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Religion {
    pub identifier: String,
    pub group: String,
    pub color: Option<Color>,
}

impl HasIdentifier for Religion {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

fn resolve_needs(
    rows: &[NeedRow],
    goods: &Registry<GoodIndex, GoodDefinition>,
    errors: &mut ErrorSet,
) -> FixedMap<GoodIndex> {
    let mut map = FixedMap::new();
    for need in rows {
        match goods.expect(&need.good) {
            Ok(good) => map.add(good, Fixed::from_f64(need.base_amount)),
            Err(err) => *errors |= err | ErrorCode::InvalidData.into(),
        }
    }
    map
}

/// Two passes: register every type, then resolve `equivalent` references so
/// forward declarations work.
pub fn load_pop_types(
    rows: &[PopTypeRow],
    goods: &Registry<GoodIndex, GoodDefinition>,
    registry: &mut Registry<PopTypeIndex, PopType>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let needs = [
            resolve_needs(&row.life_needs, goods, &mut errors),
            resolve_needs(&row.everyday_needs, goods, &mut errors),
            resolve_needs(&row.luxury_needs, goods, &mut errors),
        ];
        if let Err(err) = registry.register(
            PopType {
                identifier: row.identifier.clone(),
                strata: row.strata,
                color: row.color,
                needs,
                is_artisan: row.is_artisan,
                can_be_unemployed: row.can_be_unemployed,
                can_be_recruited: row.can_be_recruited,
                equivalent: None,
                research_optimum: Fixed::from_f64(row.research_optimum),
                research_points: Fixed::from_f64(row.research_points),
                leadership_optimum: Fixed::from_f64(row.leadership_optimum),
                leadership_points: Fixed::from_f64(row.leadership_points),
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }

    for row in rows {
        let Some(equivalent_name) = &row.equivalent else {
            continue;
        };
        let equivalent = match registry.expect(equivalent_name) {
            Ok(index) => index,
            Err(err) => {
                errors |= err | ErrorCode::InvalidData.into();
                continue;
            }
        };
        if let Some(own) = registry.index_of(&row.identifier) {
            registry.get_mut(own).equivalent = Some(equivalent);
        }
    }
    errors
}

pub fn load_cultures(
    rows: &[CultureRow],
    registry: &mut Registry<CultureIndex, Culture>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        if let Err(err) = registry.register(
            Culture {
                identifier: row.identifier.clone(),
                group: row.group.clone(),
                color: row.color,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}

pub fn load_religions(
    rows: &[ReligionRow],
    registry: &mut Registry<ReligionIndex, Religion>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        if let Err(err) = registry.register(
            Religion {
                identifier: row.identifier.clone(),
                group: row.group.clone(),
                color: row.color,
            },
            DuplicatePolicy::Fail,
        ) {
            errors |= err;
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::goods::load_goods;
    use vicdata::goods::{GoodCategory, GoodRow};

    fn goods_registry() -> Registry<GoodIndex, GoodDefinition> {
        let mut registry = Registry::new("goods");
        let rows = vec![GoodRow {
            identifier: "grain".to_string(),
            category: GoodCategory::RawMaterialGoods,
            color: None,
            base_price: 2.0,
            available_from_start: true,
            tradeable: true,
            money: false,
            overseas_penalty: false,
        }];
        assert!(load_goods(&rows, &mut registry).is_ok());
        registry
    }

    fn farmer_row() -> PopTypeRow {
        PopTypeRow {
            identifier: "farmers".to_string(),
            strata: Strata::Poor,
            color: None,
            life_needs: vec![NeedRow {
                good: "grain".to_string(),
                base_amount: 1.5,
            }],
            everyday_needs: vec![],
            luxury_needs: vec![],
            is_artisan: false,
            can_be_unemployed: true,
            can_be_recruited: true,
            equivalent: None,
            research_optimum: 0.0,
            research_points: 0.0,
            leadership_optimum: 0.0,
            leadership_points: 0.0,
        }
    }

    #[test]
    fn loads_needs_against_goods() {
        let goods = goods_registry();
        let mut registry = Registry::new("pop_types");
        assert!(load_pop_types(&[farmer_row()], &goods, &mut registry).is_ok());
        let farmers = registry.by_identifier("farmers").unwrap();
        let grain = goods.index_of("grain").unwrap();
        assert_eq!(
            farmers.needs_for(NeedCategory::Life).get(grain),
            Fixed::from_fraction(3, 2)
        );
    }

    #[test]
    fn resolves_forward_equivalent() {
        let goods = goods_registry();
        let mut registry = Registry::new("pop_types");
        let mut retired = farmer_row();
        retired.identifier = "serfs".to_string();
        retired.equivalent = Some("farmers".to_string());
        // "serfs" references "farmers" before it is registered
        let rows = vec![retired, farmer_row()];
        assert!(load_pop_types(&rows, &goods, &mut registry).is_ok());
        let serfs = registry.by_identifier("serfs").unwrap();
        assert_eq!(serfs.equivalent, registry.index_of("farmers"));
    }

    #[test]
    fn unknown_need_good_is_invalid_data() {
        let goods = goods_registry();
        let mut registry = Registry::new("pop_types");
        let mut row = farmer_row();
        row.life_needs[0].good = "unobtainium".to_string();
        let errors = load_pop_types(&[row], &goods, &mut registry);
        assert!(errors.contains(ErrorCode::InvalidData));
    }
}
