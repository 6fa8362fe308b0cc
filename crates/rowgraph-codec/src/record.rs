//! Record layout and delimited-record I/O
//!
//! One object is one record: `classURI;id;name;value;...`. Attribute
//! features may carry several value fields, so the `(name, values)` tail is
//! parsed against the object's class rather than as strict pairs.

use crate::error::{CodecError, Result};
use rowgraph_model::Class;
use std::io::{Read, Write};

/// Field delimiter of the record format
pub const FIELD_DELIMITER: u8 = b';';

/// Record writer over `sink`: `;`-delimited, minimal quoting, `\n` endings
pub(crate) fn writer<W: Write>(sink: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(sink)
}

/// Record reader over `source`; accepts `\r`, `\n` and `\r\n` line endings
pub(crate) fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(source)
}

/// Leading fields of a record
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordHead<'r> {
    pub(crate) class_uri: &'r str,
    pub(crate) id: &'r str,
}

/// Split off `classURI` and `id`
pub(crate) fn head(record: &csv::StringRecord, number: u64) -> Result<RecordHead<'_>> {
    match (record.get(0), record.get(1)) {
        (Some(class_uri), Some(id)) => Ok(RecordHead { class_uri, id }),
        _ => Err(CodecError::malformed(
            number,
            format!("expected class URI and id, found {} field(s)", record.len()),
        )),
    }
}

/// One `(name, value...)` group of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Property {
    pub(crate) name: String,
    pub(crate) values: Vec<String>,
}

/// Parse the fields after the id against `class`
///
/// A multi-valued attribute takes every following field up to the next one
/// that names a feature of the class sorting after it; every other feature
/// takes exactly one value field.
pub(crate) fn properties(
    record: &csv::StringRecord,
    class: &Class,
    number: u64,
) -> Result<Vec<Property>> {
    let fields: Vec<&str> = record.iter().skip(2).collect();
    let mut properties = Vec::new();
    let mut i = 0;

    while i < fields.len() {
        let name = fields[i];
        i += 1;
        if i >= fields.len() {
            return Err(CodecError::malformed(
                number,
                format!("feature {name:?} has no value"),
            ));
        }

        let start = i;
        i += 1;
        let spans_fields = class
            .feature(name)
            .is_some_and(|f| f.is_attribute() && f.is_many());
        if spans_fields {
            while i < fields.len() && !names_later_feature(class, name, fields[i]) {
                i += 1;
            }
        }

        properties.push(Property {
            name: name.to_owned(),
            values: fields[start..i].iter().map(|s| (*s).to_owned()).collect(),
        });
    }

    Ok(properties)
}

/// Whether `field` is the name of a persisted feature ordered after `current`
pub(crate) fn names_later_feature(class: &Class, current: &str, field: &str) -> bool {
    field > current
        && class
            .feature(field)
            .is_some_and(|f| !f.is_transient() && !f.is_id())
}
