//! Encoder: object graph to records
//!
//! [`Encoder`] walks root objects and their containment children and writes
//! one record per object. Features are emitted in ascending name order and
//! reference lists are sorted, so that together with the line sort of
//! [`SortBuffer`](crate::SortBuffer) the file depends only on the graph.

use crate::error::{CodecError, Result};
use crate::index::IdentityIndex;
use crate::options::CodecOptions;
use crate::record;
use rowgraph_model::{DataTypeCodec, Feature, FeatureKind, ModelObject, ResourceSetResolver};
use std::io::Write;

/// Writes objects as records to a sink
pub struct Encoder<'a, O: ModelObject, W: Write> {
    index: &'a IdentityIndex<O>,
    resources: Option<&'a dyn ResourceSetResolver<O>>,
    options: &'a CodecOptions,
    writer: csv::Writer<W>,
    records: usize,
}

impl<'a, O: ModelObject, W: Write> Encoder<'a, O, W> {
    /// Encoder writing to `sink`, taking ids from `index`
    pub fn new(sink: W, index: &'a IdentityIndex<O>, options: &'a CodecOptions) -> Self {
        Self {
            index,
            resources: None,
            options,
            writer: record::writer(sink),
            records: 0,
        }
    }

    /// Resolve URIs of targets in other resources through `resources`
    #[must_use]
    pub fn with_resources(mut self, resources: &'a dyn ResourceSetResolver<O>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Records written so far
    #[inline]
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Emit every root and, depth first, its registered containment children
    ///
    /// # Errors
    /// Returns error on sink failure, on a value that does not match its
    /// data type, or on a field containing a line break. A failing record is
    /// never partially written.
    pub fn print<'o, I>(&mut self, roots: I) -> Result<()>
    where
        I: IntoIterator<Item = &'o O>,
        O: 'o,
    {
        for root in roots {
            let mut pending = vec![root.clone()];
            while let Some(object) = pending.pop() {
                self.print_object(&object)?;

                // Children never registered while encoding their parent's
                // references are not persisted content.
                let children: Vec<O> = object
                    .contents()
                    .into_iter()
                    .filter(|child| self.index.contains_object(child))
                    .collect();
                pending.extend(children.into_iter().rev());
            }
        }
        Ok(())
    }

    /// Flush buffered records and hand the sink back
    ///
    /// # Errors
    /// Returns the sink's write error
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        tracing::debug!(records = self.records, "encoded records");
        self.writer
            .into_inner()
            .map_err(|e| CodecError::Io(e.into_error()))
    }

    fn print_object(&mut self, object: &O) -> Result<()> {
        let id = self.index.id_for(object);
        let class = object.class();
        let features = class.features_by_name();

        let mut fields = vec![class.uri().to_string(), id.clone()];
        for feature in &features {
            if feature.is_transient() || !object.is_set(feature) {
                continue;
            }
            match feature.kind() {
                FeatureKind::Attribute { is_id: true, .. } => {}
                FeatureKind::Attribute { data_type, .. } => {
                    let values = object.attribute_values(feature);
                    if values.is_empty() {
                        continue;
                    }
                    fields.push(feature.name().to_owned());
                    for value in &values {
                        let text = data_type.encode(value)?;
                        if feature.is_many() {
                            // A reader ends the element run at the first later feature name
                            // and splits a lone element on the list delimiter.
                            if record::names_later_feature(&class, feature.name(), &text) {
                                return Err(CodecError::ValueNamesFeature {
                                    id,
                                    feature: feature.name().to_owned(),
                                    value: text,
                                });
                            }
                            if values.len() == 1 && text.contains(self.options.list_delimiter) {
                                return Err(CodecError::AmbiguousListValue {
                                    id,
                                    feature: feature.name().to_owned(),
                                });
                            }
                        }
                        fields.push(text);
                    }
                }
                FeatureKind::Reference { .. } => {
                    let value = self.reference_value(object, feature);
                    if !value.is_empty() {
                        fields.push(feature.name().to_owned());
                        fields.push(value);
                    }
                }
            }
        }

        if let Some(position) = fields.iter().position(|f| f.contains(['\n', '\r'])) {
            return Err(CodecError::MultiLineField { id, position });
        }

        tracing::trace!(%id, fields = fields.len(), "record");
        self.writer.write_record(&fields)?;
        self.records += 1;
        Ok(())
    }

    /// Single reference: one token. Many: sorted tokens joined by the list
    /// delimiter. Empty when there is nothing to persist.
    fn reference_value(&self, object: &O, feature: &Feature) -> String {
        let targets = object.reference_targets(feature);

        if feature.is_many() {
            let mut tokens: Vec<String> = targets
                .iter()
                .filter_map(|target| self.reference_token(object, target))
                .collect();
            tokens.sort();
            tokens.join(self.options.list_delimiter.to_string().as_str())
        } else {
            targets
                .first()
                .and_then(|target| self.reference_token(object, target))
                .unwrap_or_default()
        }
    }

    /// Id for targets in the same resource, full URI otherwise
    fn reference_token(&self, object: &O, target: &O) -> Option<String> {
        let resource = target.resource_uri();
        if resource == object.resource_uri() {
            return Some(self.index.id_for(target));
        }

        let uri = self.resources.and_then(|r| r.uri_of(target));
        if uri.is_none() {
            tracing::warn!(
                resource = resource.as_deref().unwrap_or("<none>"),
                "no URI for cross-resource target, reference dropped"
            );
        }
        uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowgraph_model::{ClassBuilder, DataType, DynObject, Package, Value};

    fn package() -> Package {
        Package::builder("http://ex/m")
            .class(
                ClassBuilder::new("A")
                    .id_attribute("uid")
                    .attribute("name", DataType::String)
                    .attribute("count", DataType::Integer)
                    .many_attribute("tags", DataType::String)
                    .many_reference("refs", "A")
                    .containment("child", "A")
                    .feature(
                        Feature::attribute("scratch", DataType::String)
                            .transient(),
                    ),
            )
            .build()
            .unwrap()
    }

    fn keyed(package: &Package, uid: &str) -> DynObject {
        let a = DynObject::new(package.class("A").unwrap());
        a.set_value("uid", uid);
        a
    }

    fn encode(roots: &[DynObject]) -> Result<String> {
        let index = IdentityIndex::new();
        let options = CodecOptions::default();
        let mut encoder = Encoder::new(Vec::new(), &index, &options);
        encoder.print(roots)?;
        let bytes = encoder.finish()?;
        Ok(String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn features_sorted_and_id_attribute_omitted() {
        let p = package();
        let a = keyed(&p, "k1");
        a.set_value("name", "n");
        a.set_value("count", 3_i64);
        a.set_value("scratch", "ignored");

        let out = encode(&[a]).unwrap();
        assert_eq!(out, "http://ex/m#A;k1;count;3;name;n\n");
    }

    #[test]
    fn many_attribute_values_are_separate_fields() {
        let p = package();
        let a = keyed(&p, "k1");
        a.set_value("tags", "x");
        a.set_value("tags", "y,z");

        let out = encode(&[a]).unwrap();
        assert_eq!(out, "http://ex/m#A;k1;tags;x;y,z\n");
    }

    #[test]
    fn lone_many_value_with_delimiter_is_refused() {
        let p = package();
        let a = keyed(&p, "t");
        a.set_value("tags", "a,b");

        let err = encode(&[a]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::AmbiguousListValue { ref id, ref feature } if id == "t" && feature == "tags"
        ));
    }

    #[test]
    fn many_value_naming_later_feature_is_refused() {
        let p = Package::builder("http://ex/m")
            .class(
                ClassBuilder::new("C")
                    .id_attribute("uid")
                    .many_attribute("alpha", DataType::String)
                    .attribute("beta", DataType::String)
                    .feature(Feature::attribute("gamma", DataType::String).transient()),
            )
            .build()
            .unwrap();
        let c = DynObject::new(p.class("C").unwrap());
        c.set_value("uid", "c");

        // id and transient names are never feature fields
        for value in ["x", "uid", "gamma", "alpha"] {
            c.set_value("alpha", value);
        }
        assert_eq!(
            encode(&[c.clone()]).unwrap(),
            "http://ex/m#C;c;alpha;x;uid;gamma;alpha\n"
        );

        c.set_value("alpha", "beta");
        let err = encode(&[c]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::ValueNamesFeature { ref id, ref feature, ref value }
                if id == "c" && feature == "alpha" && value == "beta"
        ));
    }

    #[test]
    fn many_reference_tokens_are_sorted() {
        let p = package();
        let root = keyed(&p, "root");
        // non-containment targets are held weakly, keep them alive
        let targets: Vec<DynObject> = ["z", "a", "m"].iter().map(|uid| keyed(&p, uid)).collect();
        for target in &targets {
            root.link("refs", target);
        }

        let out = encode(&[root]).unwrap();
        assert_eq!(out, "http://ex/m#A;root;refs;a,m,z\n");
    }

    #[test]
    fn contained_children_follow_parent() {
        let p = package();
        let parent = keyed(&p, "p");
        let child = keyed(&p, "c");
        parent.link("child", &child);

        let out = encode(&[parent]).unwrap();
        assert_eq!(out, "http://ex/m#A;p;child;c\nhttp://ex/m#A;c\n");
    }

    #[test]
    fn line_breaks_are_refused_before_writing() {
        let p = package();
        let a = keyed(&p, "k1");
        a.set_value("name", "two\nlines");

        let index = IdentityIndex::new();
        let options = CodecOptions::default();
        let mut encoder = Encoder::new(Vec::new(), &index, &options);
        let err = encoder.print([&a]).unwrap_err();
        assert!(matches!(err, CodecError::MultiLineField { position: 3, .. }));
        assert_eq!(encoder.records(), 0);
        assert!(encoder.finish().unwrap().is_empty());
    }

    #[test]
    fn mismatched_value_is_an_error() {
        let p = package();
        let a = keyed(&p, "k1");
        let class = a.class();
        let count = class.feature("count").unwrap();
        a.set_attribute(count, Some(Value::from("three")));

        assert!(matches!(encode(&[a]), Err(CodecError::DataType(_))));
    }

    #[test]
    fn unset_objects_get_minted_ids() {
        let p = package();
        let a = DynObject::new(p.class("A").unwrap());
        let out = encode(&[a]).unwrap();
        let fields: Vec<&str> = out.trim_end().split(';').collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].len(), 36);
    }
}
