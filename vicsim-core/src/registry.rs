//! Identifier registries.
//!
//! Every content class (goods, pop types, ideologies, ...) is registered
//! once at load: each entry gets a dense typed index, lookups by identifier
//! or index are O(1), and `lock()` freezes the set before the first tick.

use crate::error::{ErrorCode, ErrorSet};
use crate::indexed::EntityIndex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use vicdata::validate_identifier;

/// What to do when an identifier is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Reject the insertion and report `ALREADY_EXISTS`.
    Fail,
    /// Keep the first entry, log a warning, succeed.
    Warn,
    /// Keep the first entry silently.
    Ignore,
}

pub trait HasIdentifier {
    fn identifier(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize, T: Serialize",
    deserialize = "I: Deserialize<'de> + EntityIndex, T: Deserialize<'de>"
))]
pub struct Registry<I: EntityIndex, T> {
    items: Vec<T>,
    #[serde(skip)]
    lookup: FxHashMap<String, I>,
    locked: bool,
    #[serde(skip)]
    name: &'static str,
}

impl<I: EntityIndex, T: HasIdentifier> Registry<I, T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            items: Vec::new(),
            lookup: FxHashMap::default(),
            locked: false,
            name,
        }
    }

    /// Register an entry, assigning the next dense index.
    pub fn register(&mut self, item: T, policy: DuplicatePolicy) -> Result<I, ErrorSet> {
        if self.locked {
            log::error!(
                "cannot register {:?} in locked registry {}",
                item.identifier(),
                self.name
            );
            return Err(ErrorCode::Locked.into());
        }
        if let Err(err) = validate_identifier(item.identifier()) {
            log::error!("registry {}: {}", self.name, err);
            return Err(ErrorCode::InvalidParameter.into());
        }
        if let Some(&existing) = self.lookup.get(item.identifier()) {
            return match policy {
                DuplicatePolicy::Fail => {
                    log::error!(
                        "registry {}: duplicate identifier {:?}",
                        self.name,
                        item.identifier()
                    );
                    Err(ErrorCode::AlreadyExists.into())
                }
                DuplicatePolicy::Warn => {
                    log::warn!(
                        "registry {}: duplicate identifier {:?}, keeping first entry",
                        self.name,
                        item.identifier()
                    );
                    Ok(existing)
                }
                DuplicatePolicy::Ignore => Ok(existing),
            };
        }
        let index = I::from_usize(self.items.len());
        self.lookup.insert(item.identifier().to_string(), index);
        self.items.push(item);
        Ok(index)
    }

    /// Freeze the registry. Registration afterwards is an error.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: I) -> &T {
        &self.items[index.as_usize()]
    }

    pub fn get_mut(&mut self, index: I) -> &mut T {
        &mut self.items[index.as_usize()]
    }

    pub fn index_of(&self, identifier: &str) -> Option<I> {
        self.lookup.get(identifier).copied()
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<&T> {
        self.index_of(identifier).map(|i| self.get(i))
    }

    /// Identifier lookup that reports `DOES_NOT_EXIST` for loaders.
    pub fn expect(&self, identifier: &str) -> Result<I, ErrorSet> {
        self.index_of(identifier).ok_or_else(|| {
            log::error!("registry {}: unknown identifier {:?}", self.name, identifier);
            ErrorCode::DoesNotExist.into()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_usize(i), item))
    }

    pub fn indices(&self) -> impl Iterator<Item = I> {
        (0..self.items.len()).map(I::from_usize)
    }

    /// Rebuild the identifier lookup (needed after deserialisation, where
    /// only the item vector is carried).
    pub fn rebuild_lookup(&mut self) {
        self.lookup = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.identifier().to_string(), I::from_usize(i)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_index;

    define_index!(ThingIndex);

    #[derive(Debug)]
    struct Thing {
        identifier: String,
    }

    impl HasIdentifier for Thing {
        fn identifier(&self) -> &str {
            &self.identifier
        }
    }

    fn thing(ident: &str) -> Thing {
        Thing {
            identifier: ident.to_string(),
        }
    }

    #[test]
    fn registers_with_dense_indices() {
        let mut registry: Registry<ThingIndex, Thing> = Registry::new("things");
        let a = registry.register(thing("alpha"), DuplicatePolicy::Fail).unwrap();
        let b = registry.register(thing("beta"), DuplicatePolicy::Fail).unwrap();
        assert_eq!(a, ThingIndex(0));
        assert_eq!(b, ThingIndex(1));
        assert_eq!(registry.index_of("beta"), Some(b));
        assert_eq!(registry.get(a).identifier(), "alpha");
    }

    #[test]
    fn duplicate_policies() {
        let mut registry: Registry<ThingIndex, Thing> = Registry::new("things");
        let first = registry.register(thing("x"), DuplicatePolicy::Fail).unwrap();

        let err = registry.register(thing("x"), DuplicatePolicy::Fail).unwrap_err();
        assert!(err.contains(ErrorCode::AlreadyExists));

        assert_eq!(
            registry.register(thing("x"), DuplicatePolicy::Warn).unwrap(),
            first
        );
        assert_eq!(
            registry.register(thing("x"), DuplicatePolicy::Ignore).unwrap(),
            first
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lock_prevents_registration() {
        let mut registry: Registry<ThingIndex, Thing> = Registry::new("things");
        registry.register(thing("x"), DuplicatePolicy::Fail).unwrap();
        registry.lock();
        let err = registry.register(thing("y"), DuplicatePolicy::Fail).unwrap_err();
        assert!(err.contains(ErrorCode::Locked));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_invalid_identifiers() {
        let mut registry: Registry<ThingIndex, Thing> = Registry::new("things");
        let err = registry.register(thing(""), DuplicatePolicy::Fail).unwrap_err();
        assert!(err.contains(ErrorCode::InvalidParameter));
        let err = registry
            .register(thing("two words"), DuplicatePolicy::Fail)
            .unwrap_err();
        assert!(err.contains(ErrorCode::InvalidParameter));
    }
}
