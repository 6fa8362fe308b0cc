//! Save and load options
//!
//! Hosts pass options as a loose key/value mapping ([`Options`]); the codec
//! reads them into a typed [`CodecOptions`]. Unknown keys are ignored and an
//! absent mapping behaves as an empty one.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Host-side option mapping
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Typed codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Sort output lines on close (key `sort_lines`)
    ///
    /// With `false` records are streamed in traversal order and the output
    /// is no longer stable across traversal orders.
    pub sort_lines: bool,

    /// Separator of multi-valued reference lists (key `list_delimiter`)
    pub list_delimiter: char,
}

impl CodecOptions {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from a host mapping
    ///
    /// # Errors
    /// Returns error if a known key holds a value of the wrong shape
    pub fn from_options(options: Option<&Options>) -> Result<Self> {
        match options {
            Some(map) if !map.is_empty() => {
                Ok(serde_json::from_value(serde_json::Value::Object(map.clone()))?)
            }
            _ => Ok(Self::default()),
        }
    }

    /// With line sorting on or off
    #[inline]
    #[must_use]
    pub fn with_sort_lines(mut self, sort_lines: bool) -> Self {
        self.sort_lines = sort_lines;
        self
    }

    /// With list delimiter
    #[inline]
    #[must_use]
    pub fn with_list_delimiter(mut self, delimiter: char) -> Self {
        self.list_delimiter = delimiter;
        self
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            sort_lines: true,
            list_delimiter: ',',
        }
    }
}
