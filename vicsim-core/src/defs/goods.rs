//! Trade good definitions.

use crate::define_index;
use crate::error::{ErrorCode, ErrorSet};
use crate::fixed::Fixed;
use crate::registry::{DuplicatePolicy, HasIdentifier, Registry};
use serde::{Deserialize, Serialize};
use vicdata::color::Color;
use vicdata::goods::{GoodCategory, GoodRow};

define_index!(GoodIndex);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodDefinition {
    pub identifier: String,
    pub category: GoodCategory,
    pub color: Option<Color>,
    pub base_price: Fixed,
    pub available_from_start: bool,
    pub tradeable: bool,
    pub money: bool,
    pub overseas_penalty: bool,
}

impl HasIdentifier for GoodDefinition {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

pub fn load_goods(
    rows: &[GoodRow],
    registry: &mut Registry<GoodIndex, GoodDefinition>,
) -> ErrorSet {
    let mut errors = ErrorSet::OK;
    for row in rows {
        let base_price = Fixed::from_f64(row.base_price);
        if base_price <= Fixed::ZERO {
            log::error!(
                "good {:?} has non-positive base price {}",
                row.identifier,
                row.base_price
            );
            errors.insert(ErrorCode::InvalidData);
            continue;
        }
        if let Err(err) = registry.register(
            GoodDefinition {
                identifier: row.identifier.clone(),
                category: row.category,
                color: row.color,
                base_price,
                available_from_start: row.available_from_start,
                tradeable: row.tradeable,
                money: row.money,
                overseas_penalty: row.overseas_penalty,
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

    fn grain_row() -> GoodRow {
        GoodRow {
            identifier: "grain".to_string(),
            category: GoodCategory::RawMaterialGoods,
            color: None,
            base_price: 2.0,
            available_from_start: true,
            tradeable: true,
            money: false,
            overseas_penalty: false,
        }
    }

    #[test]
    fn loads_goods_with_fixed_prices() {
        let mut registry = Registry::new("goods");
        let errors = load_goods(&[grain_row()], &mut registry);
        assert!(errors.is_ok());
        let grain = registry.by_identifier("grain").unwrap();
        assert_eq!(grain.base_price, Fixed::from_int(2));
    }

    #[test]
    fn rejects_non_positive_price() {
        let mut registry = Registry::new("goods");
        let mut row = grain_row();
        row.base_price = 0.0;
        let errors = load_goods(&[row], &mut registry);
        assert!(errors.contains(ErrorCode::InvalidData));
        assert!(registry.is_empty());
    }
}
