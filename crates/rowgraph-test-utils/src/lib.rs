//! Testing utilities for the rowgraph workspace
//!
//! Shared metamodel fixtures, deterministic ids and tracing setup.

#![allow(missing_docs)]

use rowgraph_model::{ClassBuilder, DataType, DynObject, IdGenerator, Package, Registry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Namespace of the example metamodel
pub const NS_URI: &str = "http://ex/m";

/// Example metamodel
///
/// `A`: `uid` (id), `name`, `label`, `tags` (many), `child` (containment to
/// `B`), `next`, `refs` (many) and `external` references to `A`.
/// `B`: `label`.
pub fn example_package() -> Package {
    Package::builder(NS_URI)
        .class(
            ClassBuilder::new("A")
                .id_attribute("uid")
                .attribute("name", DataType::String)
                .attribute("label", DataType::String)
                .many_attribute("tags", DataType::String)
                .containment("child", "B")
                .reference("next", "A")
                .many_reference("refs", "A")
                .reference("external", "A"),
        )
        .class(ClassBuilder::new("B").attribute("label", DataType::String))
        .build()
        .unwrap()
}

pub fn example_registry() -> Arc<Registry> {
    let registry = Registry::new();
    registry.register(example_package());
    Arc::new(registry)
}

pub fn new_object(registry: &Registry, class: &str) -> DynObject {
    let class = registry.package(NS_URI).unwrap().class(class).unwrap();
    DynObject::new(class)
}

/// `A` instance with its `uid` set
pub fn keyed_a(registry: &Registry, uid: &str) -> DynObject {
    let a = new_object(registry, "A");
    a.set_value("uid", uid);
    a
}

/// Ids `<prefix>1`, `<prefix>2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicUsize,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicUsize::new(1),
        }
    }

    pub fn shared(prefix: impl Into<String>) -> Arc<dyn IdGenerator> {
        Arc::new(Self::new(prefix))
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("{}{}", self.prefix, self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Option mapping from a JSON object literal
pub fn options(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("options must be a JSON object, got {other}"),
    }
}

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
