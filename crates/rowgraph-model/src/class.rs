//! Metamodel: features, classes, packages and the package registry
//!
//! A [`Package`] groups [`Class`]es under one namespace URI. A [`Registry`]
//! maps namespace URIs to packages and answers [`ClassResolver`] queries.

use crate::datatype::DataType;
use crate::uri::ClassUri;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Attribute or reference declared by a class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    name: String,
    kind: FeatureKind,
    many: bool,
    transient: bool,
}

/// What a feature holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Primitive values
    Attribute {
        /// Value codec
        data_type: DataType,
        /// Values of this attribute identify the object
        is_id: bool,
    },

    /// Links to other objects
    Reference {
        /// Declared target class
        target: ClassUri,
        /// Target is owned by the source
        containment: bool,
    },
}

impl Feature {
    /// Single-valued attribute
    #[must_use]
    pub fn attribute(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Attribute {
                data_type,
                is_id: false,
            },
            many: false,
            transient: false,
        }
    }

    /// Single-valued non-containment reference
    #[must_use]
    pub fn reference(name: impl Into<String>, target: ClassUri) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Reference {
                target,
                containment: false,
            },
            many: false,
            transient: false,
        }
    }

    /// Single-valued containment reference
    #[must_use]
    pub fn containment(name: impl Into<String>, target: ClassUri) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Reference {
                target,
                containment: true,
            },
            many: false,
            transient: false,
        }
    }

    /// Make multi-valued
    #[inline]
    #[must_use]
    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    /// Exclude from persistence
    #[inline]
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Mark an attribute as the identifying attribute (no-op on references)
    #[inline]
    #[must_use]
    pub fn id(mut self) -> Self {
        if let FeatureKind::Attribute { is_id, .. } = &mut self.kind {
            *is_id = true;
        }
        self
    }

    /// Feature name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute or reference
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    /// Multi-valued
    #[inline]
    #[must_use]
    pub fn is_many(&self) -> bool {
        self.many
    }

    /// Excluded from persistence
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Holds primitive values
    #[inline]
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { .. })
    }

    /// Holds links to objects
    #[inline]
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    /// Containment reference
    #[inline]
    #[must_use]
    pub fn is_containment(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                containment: true,
                ..
            }
        )
    }

    /// Identifying attribute
    #[inline]
    #[must_use]
    pub fn is_id(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { is_id: true, .. })
    }

    /// Data type of an attribute
    #[inline]
    #[must_use]
    pub fn data_type(&self) -> Option<&DataType> {
        match &self.kind {
            FeatureKind::Attribute { data_type, .. } => Some(data_type),
            FeatureKind::Reference { .. } => None,
        }
    }
}

/// Class of reflective objects
///
/// `features` includes the features inherited from the supertype, declared
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    uri: ClassUri,
    supertype: Option<ClassUri>,
    features: Vec<Feature>,
}

impl Class {
    /// Globally unique class URI
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &ClassUri {
        &self.uri
    }

    /// Class name (URI fragment)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.uri.fragment()
    }

    /// Direct supertype, if any
    #[inline]
    #[must_use]
    pub fn supertype(&self) -> Option<&ClassUri> {
        self.supertype.as_ref()
    }

    /// All features, inherited ones first
    #[inline]
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Feature by name
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// All features in ascending name order
    #[must_use]
    pub fn features_by_name(&self) -> Vec<&Feature> {
        let mut sorted: Vec<&Feature> = self.features.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }

    /// The identifying attribute, if the class declares one
    #[must_use]
    pub fn id_attribute(&self) -> Option<&Feature> {
        self.features.iter().find(|f| f.is_id())
    }

    /// Containment references
    pub fn containments(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.is_containment())
    }
}

/// Builder for one class of a [`Package`]
///
/// Reference targets are class names within the same package, or full
/// class URIs when they contain `#`.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    supertype: Option<String>,
    features: Vec<PendingFeature>,
}

#[derive(Debug, Clone)]
enum PendingFeature {
    Ready(Feature),
    Reference {
        name: String,
        target: String,
        containment: bool,
        many: bool,
    },
}

impl ClassBuilder {
    /// Start a class with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertype: None,
            features: Vec::new(),
        }
    }

    /// Inherit the features of an earlier class of the package
    #[must_use]
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Add a fully specified feature
    #[must_use]
    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.push(PendingFeature::Ready(feature));
        self
    }

    /// Single-valued attribute
    #[must_use]
    pub fn attribute(self, name: impl Into<String>, data_type: DataType) -> Self {
        self.feature(Feature::attribute(name, data_type))
    }

    /// Multi-valued attribute
    #[must_use]
    pub fn many_attribute(self, name: impl Into<String>, data_type: DataType) -> Self {
        self.feature(Feature::attribute(name, data_type).many())
    }

    /// Identifying string attribute
    #[must_use]
    pub fn id_attribute(self, name: impl Into<String>) -> Self {
        self.feature(Feature::attribute(name, DataType::String).id())
    }

    /// Single-valued non-containment reference
    #[must_use]
    pub fn reference(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.pending(name, target, false, false)
    }

    /// Multi-valued non-containment reference
    #[must_use]
    pub fn many_reference(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.pending(name, target, false, true)
    }

    /// Single-valued containment reference
    #[must_use]
    pub fn containment(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.pending(name, target, true, false)
    }

    /// Multi-valued containment reference
    #[must_use]
    pub fn many_containment(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.pending(name, target, true, true)
    }

    fn pending(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        containment: bool,
        many: bool,
    ) -> Self {
        self.features.push(PendingFeature::Reference {
            name: name.into(),
            target: target.into(),
            containment,
            many,
        });
        self
    }
}

/// Classes sharing one namespace URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    ns_uri: String,
    classes: IndexMap<String, Arc<Class>>,
}

impl Package {
    /// Start building a package
    #[must_use]
    pub fn builder(ns_uri: impl Into<String>) -> PackageBuilder {
        PackageBuilder {
            ns_uri: ns_uri.into(),
            classes: Vec::new(),
        }
    }

    /// Namespace URI
    #[inline]
    #[must_use]
    pub fn ns_uri(&self) -> &str {
        &self.ns_uri
    }

    /// Class by name
    #[must_use]
    pub fn class(&self, name: &str) -> Option<Arc<Class>> {
        self.classes.get(name).cloned()
    }

    /// All classes in declaration order
    pub fn classes(&self) -> impl Iterator<Item = &Arc<Class>> {
        self.classes.values()
    }
}

/// Builder returned by [`Package::builder`]
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    ns_uri: String,
    classes: Vec<ClassBuilder>,
}

impl PackageBuilder {
    /// Add a class
    #[must_use]
    pub fn class(mut self, class: ClassBuilder) -> Self {
        self.classes.push(class);
        self
    }

    /// Resolve targets and supertypes
    ///
    /// # Errors
    /// Returns error on duplicate class or feature names, or when a
    /// supertype is not declared before its subclass.
    pub fn build(self) -> Result<Package, MetamodelError> {
        let mut classes: IndexMap<String, Arc<Class>> = IndexMap::new();

        for builder in self.classes {
            if classes.contains_key(&builder.name) {
                return Err(MetamodelError::DuplicateClass(builder.name));
            }

            let mut features = Vec::new();
            let supertype = match &builder.supertype {
                Some(name) => {
                    let parent = classes.get(name).ok_or_else(|| {
                        MetamodelError::UnknownSupertype {
                            class: builder.name.clone(),
                            supertype: name.clone(),
                        }
                    })?;
                    features.extend(parent.features.iter().cloned());
                    Some(parent.uri.clone())
                }
                None => None,
            };

            for pending in builder.features {
                let feature = match pending {
                    PendingFeature::Ready(feature) => feature,
                    PendingFeature::Reference {
                        name,
                        target,
                        containment,
                        many,
                    } => {
                        let target = match target.split_once('#') {
                            Some((ns, fragment)) => ClassUri::new(ns, fragment),
                            None => ClassUri::new(self.ns_uri.clone(), target),
                        };
                        let feature = if containment {
                            Feature::containment(name, target)
                        } else {
                            Feature::reference(name, target)
                        };
                        if many {
                            feature.many()
                        } else {
                            feature
                        }
                    }
                };

                if features.iter().any(|f: &Feature| f.name == feature.name) {
                    return Err(MetamodelError::DuplicateFeature {
                        class: builder.name.clone(),
                        feature: feature.name,
                    });
                }
                features.push(feature);
            }

            let class = Class {
                uri: ClassUri::new(self.ns_uri.clone(), builder.name.clone()),
                supertype,
                features,
            };
            classes.insert(builder.name, Arc::new(class));
        }

        Ok(Package {
            ns_uri: self.ns_uri,
            classes,
        })
    }
}

/// Errors building a metamodel
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetamodelError {
    /// Two classes share a name
    #[error("duplicate class: {0}")]
    DuplicateClass(String),

    /// Two features of a class share a name
    #[error("duplicate feature {feature} in class {class}")]
    DuplicateFeature {
        /// Class name
        class: String,
        /// Feature name
        feature: String,
    },

    /// Supertype not declared earlier in the package
    #[error("class {class} extends unknown class {supertype}")]
    UnknownSupertype {
        /// Class name
        class: String,
        /// Missing supertype name
        supertype: String,
    },
}

/// Class lookup by URI
pub trait ClassResolver {
    /// Resolve a class; `None` if the package or fragment is unknown
    fn resolve_class(&self, uri: &ClassUri) -> Option<Arc<Class>>;
}

/// Packages keyed by namespace URI
#[derive(Debug, Default)]
pub struct Registry {
    packages: RwLock<HashMap<String, Arc<Package>>>,
}

impl Registry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package, replacing any package with the same namespace
    pub fn register(&self, package: Package) -> Arc<Package> {
        let package = Arc::new(package);
        self.packages
            .write()
            .insert(package.ns_uri.clone(), Arc::clone(&package));
        package
    }

    /// Package by namespace URI
    #[must_use]
    pub fn package(&self, ns_uri: &str) -> Option<Arc<Package>> {
        self.packages.read().get(ns_uri).cloned()
    }

    /// Number of registered packages
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.read().len()
    }

    /// Check if no package is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClassResolver for Registry {
    fn resolve_class(&self, uri: &ClassUri) -> Option<Arc<Class>> {
        self.package(uri.ns_uri())?.class(uri.fragment())
    }
}
