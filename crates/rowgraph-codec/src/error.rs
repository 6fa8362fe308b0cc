//! Error types for the tabular codec
//!
//! Only failures of the underlying streams and structurally broken input
//! surface here. Data problems on load (unknown classes, unknown features,
//! dangling references) are logged and absorbed.

use rowgraph_model::DataTypeError;
use std::io;

/// Result alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Main codec error type
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Underlying sink or source failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record reader or writer failed (includes invalid UTF-8)
    #[error("record error: {0}")]
    Csv(#[from] csv::Error),

    /// Record does not follow the `classURI;id;name;value...` layout
    #[error("malformed record {record}: {reason}")]
    MalformedRecord {
        /// 1-based record number in the input
        record: u64,
        /// What is wrong with it
        reason: String,
    },

    /// A field would span several lines, breaking line sorting
    #[error("object {id}: field {position} contains a line break")]
    MultiLineField {
        /// Id of the object being encoded
        id: String,
        /// 0-based field position in the record
        position: usize,
    },

    /// Lone element of a multi-valued attribute contains the list
    /// delimiter and would be read back as several elements
    #[error("object {id}: sole value of {feature} contains the list delimiter")]
    AmbiguousListValue {
        /// Id of the object being encoded
        id: String,
        /// Multi-valued attribute
        feature: String,
    },

    /// Element of a multi-valued attribute equals the name of a feature
    /// sorting after it and would be read back as that feature
    #[error("object {id}: value {value:?} of {feature} names a later feature")]
    ValueNamesFeature {
        /// Id of the object being encoded
        id: String,
        /// Multi-valued attribute
        feature: String,
        /// Offending element
        value: String,
    },

    /// Attribute value does not match its declared type
    #[error("data type error: {0}")]
    DataType(#[from] DataTypeError),

    /// Save or load options have the wrong shape
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),

    /// No resource registered under the URI
    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

impl CodecError {
    /// Create malformed record error
    #[inline]
    pub(crate) fn malformed(record: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record,
            reason: reason.into(),
        }
    }

    /// Check if the error came from the underlying stream
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Csv(e) => e.is_io_error(),
            _ => false,
        }
    }
}
