//! Class URIs
//!
//! Provides [`ClassUri`], the `<nsURI>#<fragment>` name that identifies a
//! class inside a [`Registry`](crate::Registry).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Absolute name of a class
///
/// The namespace part selects a package, the fragment selects the class
/// inside it.
///
/// # Examples
/// - `http://ex/m#A` → package `http://ex/m`, class `A`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassUri {
    ns_uri: String,
    fragment: String,
}

impl ClassUri {
    /// Create from namespace URI and fragment
    #[inline]
    #[must_use]
    pub fn new(ns_uri: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            ns_uri: ns_uri.into(),
            fragment: fragment.into(),
        }
    }

    /// Namespace URI of the owning package
    #[inline]
    #[must_use]
    pub fn ns_uri(&self) -> &str {
        &self.ns_uri
    }

    /// Class name inside the package
    #[inline]
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

impl Display for ClassUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.ns_uri, self.fragment)
    }
}

impl FromStr for ClassUri {
    type Err = ClassUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ns_uri, fragment) = s
            .split_once('#')
            .ok_or_else(|| ClassUriError::MissingFragment(s.to_owned()))?;

        if fragment.is_empty() {
            return Err(ClassUriError::MissingFragment(s.to_owned()));
        }

        Ok(Self::new(ns_uri, fragment))
    }
}

/// Errors parsing a class URI
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassUriError {
    /// No `#fragment` part
    #[error("class URI has no fragment: {0}")]
    MissingFragment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_namespace_and_fragment() {
        let uri = ClassUri::from_str("http://ex/m#A").unwrap();
        assert_eq!(uri.ns_uri(), "http://ex/m");
        assert_eq!(uri.fragment(), "A");
    }

    #[test]
    fn display_round_trips() {
        let uri = ClassUri::new("platform:/plugin/x.ecore", "Node");
        assert_eq!(uri.to_string(), "platform:/plugin/x.ecore#Node");
        assert_eq!(ClassUri::from_str(&uri.to_string()).unwrap(), uri);
    }

    #[test]
    fn parse_rejects_missing_fragment() {
        assert!(matches!(
            ClassUri::from_str("http://ex/m"),
            Err(ClassUriError::MissingFragment(_))
        ));
        assert!(ClassUri::from_str("http://ex/m#").is_err());
    }
}
