//! rowgraph Model
//!
//! Reflective metamodel capabilities consumed by the tabular codec, plus a
//! reference in-memory host.
//!
//! # Core Concepts
//!
//! - [`ClassUri`]: `<nsURI>#<fragment>` name of a class
//! - [`DataType`] / [`DataTypeCodec`]: string codec for attribute values
//! - [`Feature`], [`Class`], [`Package`]: the metamodel
//! - [`Registry`] / [`ClassResolver`]: packages keyed by nsURI
//! - [`ModelObject`]: reflective object handle the codec reads and writes
//! - [`DynObject`] / [`DynFactory`]: dynamic objects backed by the metamodel
//!
//! # Example
//!
//! ```rust
//! use rowgraph_model::{ClassBuilder, DataType, DynObject, ModelObject, Package, Value};
//!
//! let package = Package::builder("http://ex/m")
//!     .class(ClassBuilder::new("A").attribute("name", DataType::String))
//!     .build()
//!     .unwrap();
//!
//! let a = DynObject::new(package.class("A").unwrap());
//! a.set_value("name", "root");
//! assert_eq!(a.value("name"), Some(Value::from("root")));
//! ```

mod class;
mod datatype;
mod dynamic;
mod object;
mod uri;

// Re-exports
pub use class::{
    Class, ClassBuilder, ClassResolver, Feature, FeatureKind, MetamodelError, Package,
    PackageBuilder, Registry,
};
pub use datatype::{DataType, DataTypeCodec, DataTypeError, Value};
pub use dynamic::{DynFactory, DynObject};
pub use object::{IdGenerator, ModelObject, ObjectFactory, ResourceSetResolver, UuidGenerator};
pub use uri::{ClassUri, ClassUriError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
