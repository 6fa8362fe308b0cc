//! Host capabilities over objects
//!
//! The codec never touches concrete object types. It reads and writes
//! through [`ModelObject`], creates objects through [`ObjectFactory`],
//! resolves cross-document links through [`ResourceSetResolver`] and mints
//! identifiers through [`IdGenerator`].

use crate::class::{Class, Feature};
use crate::datatype::{DataTypeCodec, DataTypeError, Value};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Reflective object handle
///
/// Handles are cheap to clone and compare by identity: two handles are
/// equal iff they designate the same object. All mutators take `&self`,
/// the host decides how the object state is shared.
pub trait ModelObject: Clone + Eq + Hash + Debug {
    /// Class of the object
    fn class(&self) -> Arc<Class>;

    /// Whether the feature holds at least one value
    fn is_set(&self, feature: &Feature) -> bool;

    /// Values of an attribute, empty if unset
    fn attribute_values(&self, feature: &Feature) -> Vec<Value>;

    /// Targets of a reference, empty if unset
    fn reference_targets(&self, feature: &Feature) -> Vec<Self>;

    /// Replace the value of a single-valued attribute; `None` unsets it
    fn set_attribute(&self, feature: &Feature, value: Option<Value>);

    /// Append to a multi-valued attribute
    fn add_attribute(&self, feature: &Feature, value: Value);

    /// Replace the target of a single-valued reference; `None` unsets it
    fn set_reference(&self, feature: &Feature, target: Option<&Self>);

    /// Append to a multi-valued reference
    fn add_reference(&self, feature: &Feature, target: &Self);

    /// URI of the resource holding this object or its outermost container
    fn resource_uri(&self) -> Option<String>;

    /// Record that this object is a top-level object of a resource
    fn attach_to_resource(&self, uri: &str);

    /// Directly contained objects, in feature declaration order
    fn contents(&self) -> Vec<Self> {
        let class = self.class();
        let children = class
            .containments()
            .flat_map(|feature| self.reference_targets(feature))
            .collect();
        children
    }

    /// Value of the identifying attribute, rendered as a string
    fn intrinsic_id(&self) -> Option<String> {
        let class = self.class();
        let attribute = class.id_attribute()?;
        let value = self.attribute_values(attribute).into_iter().next()?;
        attribute.data_type()?.encode(&value).ok()
    }

    /// Set the identifying attribute from its string form
    ///
    /// Does nothing if the class declares no identifying attribute.
    ///
    /// # Errors
    /// Returns error if `id` is not a valid literal of the attribute's type
    fn set_intrinsic_id(&self, id: &str) -> Result<(), DataTypeError> {
        let class = self.class();
        let Some(attribute) = class.id_attribute() else {
            return Ok(());
        };
        if let Some(data_type) = attribute.data_type() {
            let value = data_type.decode(id)?;
            self.set_attribute(attribute, Some(value));
        }
        Ok(())
    }
}

/// Creates empty instances of a class
pub trait ObjectFactory<O> {
    /// New object with every feature unset
    fn create(&self, class: &Arc<Class>) -> O;
}

/// Cross-document object lookup
pub trait ResourceSetResolver<O> {
    /// Object designated by a full `<resourceURI>#<fragment>` URI
    fn resolve(&self, uri: &str) -> Option<O>;

    /// Full URI designating `object`, if it belongs to a known resource
    fn uri_of(&self, object: &O) -> Option<String>;
}

/// Source of fresh identifiers
pub trait IdGenerator {
    /// A globally unique identifier
    fn generate(&self) -> String;
}

/// Random (v4) UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
