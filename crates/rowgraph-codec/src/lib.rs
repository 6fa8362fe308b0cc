//! rowgraph Codec
//!
//! Sort-stable delimited-record persistence for reflective object graphs.
//!
//! # Overview
//!
//! Every object becomes one `;`-delimited line:
//!
//! ```text
//! classURI ; id ; name1 ; value1 ; name2 ; value2 ; ...
//! ```
//!
//! Features appear in ascending name order, reference lists are sorted and
//! the lines of a file are sorted, so two isomorphic graphs produce the same
//! bytes and files diff cleanly under version control.
//!
//! - **IdentityIndex**: bidirectional object/id map, one per resource
//! - **SortBuffer**: holds written lines back and emits them sorted on close
//! - **Encoder** / **Decoder**: records out, records in (two passes)
//! - **TabularResource** / **ResourceSet**: host-facing save and load
//!
//! # Example
//!
//! ```rust
//! use rowgraph_codec::{HostContext, TabularResource};
//! use rowgraph_model::{ClassBuilder, DataType, DynFactory, DynObject, Package, Registry, Value};
//!
//! let registry = Registry::new();
//! let package = registry.register(
//!     Package::builder("http://ex/m")
//!         .class(ClassBuilder::new("A").id_attribute("uid").attribute("name", DataType::String))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let a = DynObject::new(package.class("A").unwrap());
//! a.set_value("uid", "k1");
//! a.set_value("name", "root");
//!
//! let resource = TabularResource::new("mem:/doc");
//! resource.add_root(a);
//!
//! let mut bytes = Vec::new();
//! resource.save(&mut bytes, None, None).unwrap();
//! assert_eq!(bytes, b"http://ex/m#A;k1;name;root\n");
//!
//! let copy: TabularResource<DynObject> = TabularResource::new("mem:/copy");
//! let roots = copy
//!     .load(bytes.as_slice(), &HostContext::<DynObject>::new(&registry, &DynFactory), None)
//!     .unwrap();
//! assert_eq!(roots[0].value("name"), Some(Value::from("root")));
//! ```

mod decoder;
mod encoder;
mod error;
mod index;
mod options;
mod record;
mod resource;
mod resource_set;
mod sort_buffer;

// Re-exports
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CodecError, Result};
pub use index::IdentityIndex;
pub use options::{CodecOptions, Options};
pub use record::FIELD_DELIMITER;
pub use resource::{HostContext, TabularResource};
pub use resource_set::ResourceSet;
pub use sort_buffer::SortBuffer;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
