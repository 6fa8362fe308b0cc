//! Dynamic objects driven by the metamodel
//!
//! [`DynObject`] stores feature values by name, with no generated code.
//! Containment references own their targets; other references hold weak
//! handles, so reference cycles between objects do not leak.

use crate::class::{Class, Feature};
use crate::datatype::Value;
use crate::object::{ModelObject, ObjectFactory};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Shared handle to a dynamic object
///
/// Clones designate the same object.
#[derive(Clone)]
pub struct DynObject(Arc<ObjectCell>);

struct ObjectCell {
    class: Arc<Class>,
    state: RwLock<ObjectState>,
}

#[derive(Default)]
struct ObjectState {
    slots: HashMap<String, Slot>,
    container: Option<Weak<ObjectCell>>,
    resource: Option<String>,
}

enum Slot {
    Values(Vec<Value>),
    Owned(Vec<DynObject>),
    Linked(Vec<Weak<ObjectCell>>),
}

impl DynObject {
    /// New object of `class` with every feature unset
    #[must_use]
    pub fn new(class: Arc<Class>) -> Self {
        Self(Arc::new(ObjectCell {
            class,
            state: RwLock::new(ObjectState::default()),
        }))
    }

    /// The containing object, if any
    #[must_use]
    pub fn container(&self) -> Option<DynObject> {
        self.0
            .state
            .read()
            .container
            .as_ref()
            .and_then(Weak::upgrade)
            .map(DynObject)
    }

    /// First value of the named attribute
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.values(name).into_iter().next()
    }

    /// Values of the named attribute; empty for unknown names
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<Value> {
        match self.0.class.feature(name) {
            Some(feature) => self.attribute_values(feature),
            None => Vec::new(),
        }
    }

    /// Set (single) or append (many) a value of the named attribute
    ///
    /// Unknown names are ignored.
    pub fn set_value(&self, name: &str, value: impl Into<Value>) {
        let Some(feature) = self.0.class.feature(name) else {
            return;
        };
        if feature.is_many() {
            self.add_attribute(feature, value.into());
        } else {
            self.set_attribute(feature, Some(value.into()));
        }
    }

    /// First target of the named reference
    #[must_use]
    pub fn target(&self, name: &str) -> Option<DynObject> {
        self.targets(name).into_iter().next()
    }

    /// Targets of the named reference; empty for unknown names
    #[must_use]
    pub fn targets(&self, name: &str) -> Vec<DynObject> {
        match self.0.class.feature(name) {
            Some(feature) => self.reference_targets(feature),
            None => Vec::new(),
        }
    }

    /// Set (single) or append (many) a target of the named reference
    ///
    /// Unknown names are ignored.
    pub fn link(&self, name: &str, target: &DynObject) {
        let Some(feature) = self.0.class.feature(name) else {
            return;
        };
        if feature.is_many() {
            self.add_reference(feature, target);
        } else {
            self.set_reference(feature, Some(target));
        }
    }

    fn adopt(&self, child: &DynObject) {
        child.0.state.write().container = Some(Arc::downgrade(&self.0));
    }
}

impl PartialEq for DynObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DynObject {}

impl Hash for DynObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for DynObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynObject")
            .field("class", &self.0.class.uri().to_string())
            .field("at", &Arc::as_ptr(&self.0))
            .finish()
    }
}

impl ModelObject for DynObject {
    fn class(&self) -> Arc<Class> {
        Arc::clone(&self.0.class)
    }

    fn is_set(&self, feature: &Feature) -> bool {
        match self.0.state.read().slots.get(feature.name()) {
            Some(Slot::Values(values)) => !values.is_empty(),
            Some(Slot::Owned(targets)) => !targets.is_empty(),
            Some(Slot::Linked(targets)) => targets.iter().any(|t| t.strong_count() > 0),
            None => false,
        }
    }

    fn attribute_values(&self, feature: &Feature) -> Vec<Value> {
        match self.0.state.read().slots.get(feature.name()) {
            Some(Slot::Values(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    fn reference_targets(&self, feature: &Feature) -> Vec<Self> {
        match self.0.state.read().slots.get(feature.name()) {
            Some(Slot::Owned(targets)) => targets.clone(),
            Some(Slot::Linked(targets)) => {
                targets.iter().filter_map(Weak::upgrade).map(DynObject).collect()
            }
            _ => Vec::new(),
        }
    }

    fn set_attribute(&self, feature: &Feature, value: Option<Value>) {
        let mut state = self.0.state.write();
        match value {
            Some(value) => {
                state
                    .slots
                    .insert(feature.name().to_owned(), Slot::Values(vec![value]));
            }
            None => {
                state.slots.remove(feature.name());
            }
        }
    }

    fn add_attribute(&self, feature: &Feature, value: Value) {
        let mut state = self.0.state.write();
        match state.slots.get_mut(feature.name()) {
            Some(Slot::Values(values)) => values.push(value),
            _ => {
                state
                    .slots
                    .insert(feature.name().to_owned(), Slot::Values(vec![value]));
            }
        }
    }

    fn set_reference(&self, feature: &Feature, target: Option<&Self>) {
        let slot = match target {
            Some(target) if feature.is_containment() => {
                // Lock the child before the parent, never both at once.
                self.adopt(target);
                Some(Slot::Owned(vec![target.clone()]))
            }
            Some(target) => Some(Slot::Linked(vec![Arc::downgrade(&target.0)])),
            None => None,
        };

        let mut state = self.0.state.write();
        match slot {
            Some(slot) => {
                state.slots.insert(feature.name().to_owned(), slot);
            }
            None => {
                state.slots.remove(feature.name());
            }
        }
    }

    fn add_reference(&self, feature: &Feature, target: &Self) {
        if feature.is_containment() {
            self.adopt(target);
        }

        let mut state = self.0.state.write();
        let slot = state
            .slots
            .entry(feature.name().to_owned())
            .or_insert_with(|| {
                if feature.is_containment() {
                    Slot::Owned(Vec::new())
                } else {
                    Slot::Linked(Vec::new())
                }
            });
        match slot {
            Slot::Owned(targets) => targets.push(target.clone()),
            Slot::Linked(targets) => targets.push(Arc::downgrade(&target.0)),
            Slot::Values(_) => {}
        }
    }

    fn resource_uri(&self) -> Option<String> {
        let mut current = self.clone();
        loop {
            let next = {
                let state = current.0.state.read();
                if let Some(uri) = &state.resource {
                    return Some(uri.clone());
                }
                state.container.as_ref().and_then(Weak::upgrade)?
            };
            current = DynObject(next);
        }
    }

    fn attach_to_resource(&self, uri: &str) {
        self.0.state.write().resource = Some(uri.to_owned());
    }
}

/// [`ObjectFactory`] for [`DynObject`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DynFactory;

impl ObjectFactory<DynObject> for DynFactory {
    fn create(&self, class: &Arc<Class>) -> DynObject {
        DynObject::new(Arc::clone(class))
    }
}
