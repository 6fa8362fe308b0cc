//! Decoder: records to object graph
//!
//! Decoding runs in two passes over the fully materialised record list.
//! Pass 1 creates (or reuses) every object and fills its attributes; pass 2
//! resolves references. Since no link is wired before every object exists,
//! forward references and cycles need no special handling.

use crate::error::Result;
use crate::index::IdentityIndex;
use crate::options::CodecOptions;
use crate::record::{self, Property};
use crate::resource::HostContext;
use indexmap::IndexSet;
use rowgraph_model::{Class, ClassUri, DataTypeCodec, Feature, FeatureKind, ModelObject};
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

/// Reads records into objects registered in an identity index
pub struct Decoder<'a, O: ModelObject> {
    index: &'a IdentityIndex<O>,
    host: &'a HostContext<'a, O>,
    options: &'a CodecOptions,
}

/// Record checked against its class, before any object exists
struct Parsed<'r> {
    number: u64,
    record: &'r csv::StringRecord,
    id: &'r str,
    class: Arc<Class>,
    properties: Vec<Property>,
}

/// Object produced in pass 1 with its record tail
struct Decoded<O> {
    object: O,
    properties: Vec<Property>,
}

impl<'a, O: ModelObject> Decoder<'a, O> {
    /// Decoder registering objects in `index`
    pub fn new(
        index: &'a IdentityIndex<O>,
        host: &'a HostContext<'a, O>,
        options: &'a CodecOptions,
    ) -> Self {
        Self {
            index,
            host,
            options,
        }
    }

    /// Read every record from `source` and decode them
    ///
    /// Returns the top-level objects: every decoded object that is not the
    /// target of a containment reference, in record order.
    ///
    /// # Errors
    /// Returns error on source failure, invalid UTF-8 or a malformed record;
    /// nothing is decoded in that case.
    pub fn decode<R: Read>(&self, source: R) -> Result<Vec<O>> {
        let records = record::reader(source)
            .into_records()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.decode_records(&records)
    }

    /// Decode already-read records
    ///
    /// # Errors
    /// Returns error on a malformed record
    pub fn decode_records(&self, records: &[csv::StringRecord]) -> Result<Vec<O>> {
        // Parse everything first so a malformed record leaves no objects behind.
        let mut parsed = Vec::with_capacity(records.len());
        for (number, r) in (1_u64..).zip(records) {
            parsed.push(self.parse(r, number)?);
        }

        let mut roots: IndexSet<O> = IndexSet::new();
        let mut decoded = Vec::with_capacity(parsed.len());
        for entry in parsed.into_iter().flatten() {
            decoded.push(self.create_object(entry, &mut roots)?);
        }

        for entry in &decoded {
            self.resolve_references(entry, &mut roots);
        }

        tracing::debug!(
            records = records.len(),
            objects = decoded.len(),
            roots = roots.len(),
            "decoded records"
        );
        Ok(roots.into_iter().collect())
    }

    /// Structural parse; `None` for records of unknown classes
    fn parse<'r>(&self, r: &'r csv::StringRecord, number: u64) -> Result<Option<Parsed<'r>>> {
        let head = record::head(r, number)?;

        let Some(class) = ClassUri::from_str(head.class_uri)
            .ok()
            .and_then(|uri| self.host.classes.resolve_class(&uri))
        else {
            tracing::warn!(
                record = number,
                class = head.class_uri,
                "unknown class, record skipped"
            );
            return Ok(None);
        };

        let properties = record::properties(r, &class, number)?;
        Ok(Some(Parsed {
            number,
            record: r,
            id: head.id,
            class,
            properties,
        }))
    }

    /// Pass 1: instantiate or reuse, register, fill attributes
    fn create_object(&self, parsed: Parsed<'_>, roots: &mut IndexSet<O>) -> Result<Decoded<O>> {
        let number = parsed.number;
        let object = match self.index.obj_of(parsed.id) {
            Some(existing) => existing,
            None => {
                let object = self.host.factory.create(&parsed.class);
                if let Err(e) = object.set_intrinsic_id(parsed.id) {
                    tracing::warn!(record = number, id = parsed.id, error = %e, "id attribute not set");
                }
                self.index.put(parsed.id, &object);
                object
            }
        };

        let class = object.class();
        let properties = if class.uri() == parsed.class.uri() {
            parsed.properties
        } else {
            tracing::warn!(
                record = number,
                id = parsed.id,
                bound = %class.uri(),
                "id already bound to an object of another class"
            );
            record::properties(parsed.record, &class, number)?
        };
        roots.insert(object.clone());

        for property in &properties {
            let Some(feature) = class.feature(&property.name) else {
                tracing::warn!(
                    record = number,
                    class = %class.uri(),
                    feature = %property.name,
                    "unknown feature, value skipped"
                );
                continue;
            };
            if let FeatureKind::Attribute { data_type, .. } = feature.kind() {
                self.fill_attribute(&object, feature, data_type, &property.values, number);
            }
        }

        Ok(Decoded { object, properties })
    }

    fn fill_attribute(
        &self,
        object: &O,
        feature: &Feature,
        data_type: &dyn DataTypeCodec,
        values: &[String],
        number: u64,
    ) {
        let decode = |text: &str| match data_type.decode(text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(record = number, feature = feature.name(), error = %e, "value skipped");
                None
            }
        };

        if !feature.is_many() {
            if let Some(value) = values.first().and_then(|text| decode(text.as_str())) {
                object.set_attribute(feature, Some(value));
            }
            return;
        }

        // A lone field is the comma-joined list form.
        let elements: Vec<&str> = match values {
            [joined] => joined.split(self.options.list_delimiter).collect(),
            _ => values.iter().map(String::as_str).collect(),
        };
        for value in elements.into_iter().filter_map(decode) {
            object.add_attribute(feature, value);
        }
    }

    /// Pass 2: link references, drop containment targets from the roots
    fn resolve_references(&self, entry: &Decoded<O>, roots: &mut IndexSet<O>) {
        let class = entry.object.class();

        for property in &entry.properties {
            let Some(feature) = class.feature(&property.name) else {
                continue;
            };
            if !feature.is_reference() {
                continue;
            }
            let Some(value) = property.values.first() else {
                continue;
            };

            if feature.is_many() {
                for token in value.split(self.options.list_delimiter) {
                    if token.is_empty() {
                        continue;
                    }
                    if let Some(target) = self.resolve(token) {
                        entry.object.add_reference(feature, &target);
                        if feature.is_containment() {
                            roots.shift_remove(&target);
                        }
                    }
                }
            } else if let Some(target) = self.resolve(value) {
                entry.object.set_reference(feature, Some(&target));
                if feature.is_containment() {
                    roots.shift_remove(&target);
                }
            }
        }
    }

    /// Local id first, then cross-document URI
    fn resolve(&self, token: &str) -> Option<O> {
        let target = self
            .index
            .obj_of(token)
            .or_else(|| self.host.resources.and_then(|r| r.resolve(token)));
        if target.is_none() {
            tracing::warn!(reference = token, "unresolved reference left empty");
        }
        target
    }
}
