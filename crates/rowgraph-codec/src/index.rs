//! Identity index
//!
//! Provides [`IdentityIndex`], the bidirectional object/id mapping owned by
//! each resource. The encoder asks it for ids, the decoder asks it for
//! objects.

use parking_lot::RwLock;
use rowgraph_model::{IdGenerator, ModelObject, UuidGenerator};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Bidirectional object ↔ id index
///
/// Both directions are kept in lock-step: for every binding present,
/// `obj_of(id_of(x)) == x`. Rebinding an object or an id evicts the stale
/// entry on the other side.
///
/// Interior locking only serialises individual calls; a save or load still
/// owns the index for its whole duration.
pub struct IdentityIndex<O: ModelObject> {
    maps: RwLock<BiMap<O>>,
    generator: Arc<dyn IdGenerator>,
}

struct BiMap<O> {
    ids: HashMap<O, String>,
    objects: HashMap<String, O>,
}

impl<O: ModelObject> BiMap<O> {
    fn bind(&mut self, object: O, id: String) {
        if let Some(old_id) = self.ids.insert(object.clone(), id.clone()) {
            if old_id != id {
                self.objects.remove(&old_id);
            }
        }
        if let Some(old_object) = self.objects.insert(id, object.clone()) {
            if old_object != object {
                self.ids.remove(&old_object);
            }
        }
    }
}

impl<O: ModelObject> IdentityIndex<O> {
    /// Create empty index minting random UUIDs
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_generator(Arc::new(UuidGenerator))
    }

    /// Create empty index with a custom id source
    #[must_use]
    pub fn with_generator(generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            maps: RwLock::new(BiMap {
                ids: HashMap::new(),
                objects: HashMap::new(),
            }),
            generator,
        }
    }

    /// Id to use for `object`, registering it if new
    ///
    /// An intrinsic id always wins and replaces a stale binding. Otherwise
    /// the registered id is returned, or a fresh one is minted.
    pub fn id_for(&self, object: &O) -> String {
        let intrinsic = object.intrinsic_id();
        let mut maps = self.maps.write();

        let id = match (maps.ids.get(object), intrinsic) {
            (Some(current), Some(intrinsic)) if *current == intrinsic => return intrinsic,
            (Some(current), None) => return current.clone(),
            (_, Some(intrinsic)) => intrinsic,
            (None, None) => self.generator.generate(),
        };

        maps.bind(object.clone(), id.clone());
        id
    }

    /// Bind `id` and `object`, overwriting both directions
    ///
    /// The caller is responsible for consistency with the object's
    /// intrinsic id. Returns the id previously bound to `object`.
    pub fn put(&self, id: impl Into<String>, object: &O) -> Option<String> {
        let mut maps = self.maps.write();
        let previous = maps.ids.get(object).cloned();
        maps.bind(object.clone(), id.into());
        previous
    }

    /// Object bound to `id`
    #[must_use]
    pub fn obj_of(&self, id: &str) -> Option<O> {
        self.maps.read().objects.get(id).cloned()
    }

    /// Id bound to `object`, without registering it
    #[must_use]
    pub fn id_of(&self, object: &O) -> Option<String> {
        self.maps.read().ids.get(object).cloned()
    }

    /// Check if `id` is bound
    #[inline]
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.maps.read().objects.contains_key(id)
    }

    /// Check if `object` is bound
    #[inline]
    #[must_use]
    pub fn contains_object(&self, object: &O) -> bool {
        self.maps.read().ids.contains_key(object)
    }

    /// Drop the binding of `object`, returning its id
    pub fn remove(&self, object: &O) -> Option<String> {
        let mut maps = self.maps.write();
        let id = maps.ids.remove(object)?;
        maps.objects.remove(&id);
        Some(id)
    }

    /// All bound ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.maps.read().objects.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.read().ids.len()
    }

    /// Check if index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: ModelObject> Default for IdentityIndex<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ModelObject> fmt::Debug for IdentityIndex<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityIndex")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowgraph_model::{ClassBuilder, DataType, DynObject, Package};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl IdGenerator for Counter {
        fn generate(&self) -> String {
            format!("G{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    fn index() -> IdentityIndex<DynObject> {
        IdentityIndex::with_generator(Arc::new(Counter(AtomicUsize::new(0))))
    }

    fn objects() -> (DynObject, DynObject) {
        let package = Package::builder("http://ex/m")
            .class(ClassBuilder::new("Plain").attribute("name", DataType::String))
            .class(ClassBuilder::new("Keyed").id_attribute("uid"))
            .build()
            .unwrap();
        (
            DynObject::new(package.class("Plain").unwrap()),
            DynObject::new(package.class("Keyed").unwrap()),
        )
    }

    #[test]
    fn id_for_mints_once() {
        let index = index();
        let (plain, _) = objects();

        let id = index.id_for(&plain);
        assert_eq!(id, "G1");
        assert_eq!(index.id_for(&plain), "G1");
        assert_eq!(index.obj_of("G1"), Some(plain));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn intrinsic_id_wins_without_minting() {
        let index = index();
        let (_, keyed) = objects();
        keyed.set_value("uid", "k1");

        assert_eq!(index.id_for(&keyed), "k1");
        assert_eq!(index.obj_of("k1"), Some(keyed));
        assert_eq!(index.id_for(&objects().0), "G1");
    }

    #[test]
    fn changed_intrinsic_id_rebinds() {
        let index = index();
        let (_, keyed) = objects();
        keyed.set_value("uid", "old");
        index.id_for(&keyed);

        keyed.set_value("uid", "new");
        assert_eq!(index.id_for(&keyed), "new");
        assert_eq!(index.obj_of("new"), Some(keyed.clone()));
        assert!(!index.contains_id("old"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn put_overwrites_both_directions() {
        let index = index();
        let (a, b) = objects();

        index.put("x", &a);
        assert_eq!(index.put("y", &a), Some("x".to_string()));
        assert!(!index.contains_id("x"));

        // Same id taken over by another object: last write wins.
        index.put("y", &b);
        assert_eq!(index.obj_of("y"), Some(b.clone()));
        assert!(!index.contains_object(&a));
        assert_eq!(index.id_of(&b).as_deref(), Some("y"));
    }

    #[test]
    fn remove_clears_both_directions() {
        let index = index();
        let (a, _) = objects();
        let id = index.id_for(&a);

        assert_eq!(index.remove(&a), Some(id.clone()));
        assert!(!index.contains_id(&id));
        assert!(!index.contains_object(&a));
        assert!(index.is_empty());
    }

    #[test]
    fn ids_are_sorted() {
        let index = index();
        let (a, b) = objects();
        index.put("zeta", &a);
        index.put("alpha", &b);
        assert_eq!(index.ids(), ["alpha", "zeta"]);
    }

    #[test]
    fn default_index_mints_uuids() {
        let index: IdentityIndex<DynObject> = IdentityIndex::default();
        let (a, _) = objects();
        assert_eq!(index.id_for(&a).len(), 36);
    }
}
