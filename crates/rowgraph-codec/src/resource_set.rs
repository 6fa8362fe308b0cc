//! Resource set
//!
//! [`ResourceSet`] owns the resources of one session, keyed by URI, and
//! resolves cross-resource references of the form `<resource URI>#<id>`.

use crate::error::{CodecError, Result};
use crate::options::Options;
use crate::resource::{HostContext, TabularResource};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rowgraph_model::{ClassResolver, IdGenerator, ModelObject, ObjectFactory, ResourceSetResolver};
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// Resources of one session plus the host capabilities they load with
pub struct ResourceSet<O: ModelObject> {
    classes: Arc<dyn ClassResolver>,
    factory: Arc<dyn ObjectFactory<O>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    resources: RwLock<IndexMap<String, Arc<TabularResource<O>>>>,
}

impl<O: ModelObject> ResourceSet<O> {
    /// Empty set over a metamodel and an object factory
    #[must_use]
    pub fn new(classes: Arc<dyn ClassResolver>, factory: Arc<dyn ObjectFactory<O>>) -> Self {
        Self {
            classes,
            factory,
            id_generator: None,
            resources: RwLock::new(IndexMap::new()),
        }
    }

    /// Resources created from now on mint ids with `generator`
    #[must_use]
    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Resource registered under `uri`, created empty if absent
    pub fn create_resource(&self, uri: &str) -> Arc<TabularResource<O>> {
        if let Some(existing) = self.resource(uri) {
            return existing;
        }

        let mut resources = self.resources.write();
        Arc::clone(resources.entry(uri.to_owned()).or_insert_with(|| {
            tracing::debug!(uri, "created resource");
            Arc::new(match &self.id_generator {
                Some(generator) => TabularResource::with_id_generator(uri, Arc::clone(generator)),
                None => TabularResource::new(uri),
            })
        }))
    }

    /// Resource registered under `uri`
    #[must_use]
    pub fn resource(&self, uri: &str) -> Option<Arc<TabularResource<O>>> {
        self.resources.read().get(uri).cloned()
    }

    /// URIs of all resources, in creation order
    #[must_use]
    pub fn uris(&self) -> Vec<String> {
        self.resources.read().keys().cloned().collect()
    }

    /// Decoding context resolving cross-resource references through this set
    #[must_use]
    pub fn host(&self) -> HostContext<'_, O> {
        HostContext::new(self.classes.as_ref(), self.factory.as_ref()).with_resources(self)
    }

    /// Load `source` into the resource at `uri`, creating it if needed
    ///
    /// References into resources loaded earlier resolve; references into
    /// resources loaded later stay empty.
    ///
    /// # Errors
    /// Returns any [`TabularResource::load`] error
    pub fn load_resource<R: Read>(
        &self,
        uri: &str,
        source: R,
        options: Option<&Options>,
    ) -> Result<Vec<O>> {
        let resource = self.create_resource(uri);
        resource.load(source, &self.host(), options)
    }

    /// Save the resource at `uri`, writing cross-resource references as URIs
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownResource`] if no resource is registered
    /// under `uri`, or any [`TabularResource::save`] error
    pub fn save_resource<W: Write>(
        &self,
        uri: &str,
        sink: W,
        options: Option<&Options>,
    ) -> Result<()> {
        let resource = self
            .resource(uri)
            .ok_or_else(|| CodecError::UnknownResource(uri.to_owned()))?;
        resource.save(sink, options, Some(self))
    }
}

impl<O: ModelObject> ResourceSetResolver<O> for ResourceSet<O> {
    fn resolve(&self, uri: &str) -> Option<O> {
        let (resource, id) = uri.rsplit_once('#')?;
        self.resource(resource)?.obj_for(id)
    }

    fn uri_of(&self, object: &O) -> Option<String> {
        let uri = object.resource_uri()?;
        let id = self.resource(&uri)?.id_for(object);
        Some(format!("{uri}#{id}"))
    }
}

impl<O: ModelObject> fmt::Debug for ResourceSet<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSet")
            .field("resources", &self.uris())
            .finish_non_exhaustive()
    }
}
