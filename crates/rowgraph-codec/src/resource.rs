//! Resource adapter
//!
//! A [`TabularResource`] is one persisted document: a URI, the identity
//! index its records are keyed by, and the top-level objects it holds.
//! [`HostContext`] bundles the host capabilities a load needs.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::index::IdentityIndex;
use crate::options::{CodecOptions, Options};
use crate::sort_buffer::SortBuffer;
use indexmap::IndexSet;
use parking_lot::RwLock;
use rowgraph_model::{ClassResolver, IdGenerator, ModelObject, ObjectFactory, ResourceSetResolver};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Host capabilities consumed while decoding
pub struct HostContext<'a, O> {
    /// Metamodel lookup for record class URIs
    pub classes: &'a dyn ClassResolver,
    /// Creates empty instances in pass 1
    pub factory: &'a dyn ObjectFactory<O>,
    /// Resolves references into other resources; `None` leaves them empty
    pub resources: Option<&'a dyn ResourceSetResolver<O>>,
}

impl<'a, O> HostContext<'a, O> {
    /// Context without cross-resource resolution
    pub fn new(classes: &'a dyn ClassResolver, factory: &'a dyn ObjectFactory<O>) -> Self {
        Self {
            classes,
            factory,
            resources: None,
        }
    }

    /// With a resolver for references into other resources
    #[must_use]
    pub fn with_resources(mut self, resources: &'a dyn ResourceSetResolver<O>) -> Self {
        self.resources = Some(resources);
        self
    }
}

/// One document persisted as sorted records
pub struct TabularResource<O: ModelObject> {
    uri: String,
    index: IdentityIndex<O>,
    contents: RwLock<Vec<O>>,
}

impl<O: ModelObject> TabularResource<O> {
    /// Empty resource minting UUIDs for objects without an intrinsic id
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self::from_index(uri.into(), IdentityIndex::new())
    }

    /// Empty resource with a custom id source
    #[must_use]
    pub fn with_id_generator(uri: impl Into<String>, generator: Arc<dyn IdGenerator>) -> Self {
        Self::from_index(uri.into(), IdentityIndex::with_generator(generator))
    }

    fn from_index(uri: String, index: IdentityIndex<O>) -> Self {
        Self {
            uri,
            index,
            contents: RwLock::new(Vec::new()),
        }
    }

    /// Resource URI
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Identity index backing the records
    #[inline]
    #[must_use]
    pub fn index(&self) -> &IdentityIndex<O> {
        &self.index
    }

    /// Top-level objects, in insertion order
    #[must_use]
    pub fn contents(&self) -> Vec<O> {
        self.contents.read().clone()
    }

    /// Make `object` a top-level object of this resource
    ///
    /// Adding an object twice is a no-op.
    pub fn add_root(&self, object: O) {
        object.attach_to_resource(&self.uri);
        let mut contents = self.contents.write();
        if !contents.contains(&object) {
            contents.push(object);
        }
    }

    /// Id of `object` within this resource, minted if needed
    pub fn id_for(&self, object: &O) -> String {
        self.index.id_for(object)
    }

    /// Object recorded under `id`
    #[must_use]
    pub fn obj_for(&self, id: &str) -> Option<O> {
        self.index.obj_of(id)
    }

    /// URI fragment addressing `object` inside this resource
    pub fn uri_fragment(&self, object: &O) -> String {
        self.id_for(object)
    }

    /// Check if `object` lives in this resource
    #[must_use]
    pub fn contains_object(&self, object: &O) -> bool {
        object.resource_uri().as_deref() == Some(self.uri.as_str())
    }

    /// Write every top-level object and its contained children to `sink`
    ///
    /// With line sorting on (the default) nothing reaches `sink` until all
    /// records are encoded; the lines are then written in ascending order
    /// and `sink` is flushed.
    ///
    /// # Errors
    /// Returns error on invalid options, sink failure, a mistyped value or
    /// a field containing a line break
    pub fn save<W: Write>(
        &self,
        sink: W,
        options: Option<&Options>,
        resources: Option<&dyn ResourceSetResolver<O>>,
    ) -> Result<()> {
        let options = CodecOptions::from_options(options)?;
        let roots: IndexSet<O> = self.contents.read().iter().cloned().collect();

        let records = if options.sort_lines {
            let (buffer, records) = self.encode(SortBuffer::new(sink), &roots, &options, resources)?;
            buffer.close()?;
            records
        } else {
            self.encode(sink, &roots, &options, resources)?.1
        };

        tracing::debug!(uri = %self.uri, roots = roots.len(), records, "saved resource");
        Ok(())
    }

    fn encode<W: Write>(
        &self,
        sink: W,
        roots: &IndexSet<O>,
        options: &CodecOptions,
        resources: Option<&dyn ResourceSetResolver<O>>,
    ) -> Result<(W, usize)> {
        let mut encoder = Encoder::new(sink, &self.index, options);
        if let Some(resources) = resources {
            encoder = encoder.with_resources(resources);
        }
        encoder.print(roots)?;
        let records = encoder.records();
        Ok((encoder.finish()?, records))
    }

    /// Decode `source` and append its top-level objects to this resource
    ///
    /// Returns the newly decoded top-level objects.
    ///
    /// # Errors
    /// Returns error on invalid options, source failure, invalid UTF-8 or
    /// a malformed record
    pub fn load<R: Read>(
        &self,
        source: R,
        host: &HostContext<'_, O>,
        options: Option<&Options>,
    ) -> Result<Vec<O>> {
        let options = CodecOptions::from_options(options)?;
        let roots = Decoder::new(&self.index, host, &options).decode(source)?;
        for root in &roots {
            self.add_root(root.clone());
        }

        tracing::debug!(uri = %self.uri, roots = roots.len(), objects = self.index.len(), "loaded resource");
        Ok(roots)
    }

    /// [`save`](Self::save) to a file, creating or truncating it
    ///
    /// # Errors
    /// Returns error if the file cannot be created or on any save error
    pub fn save_file(
        &self,
        path: impl AsRef<Path>,
        options: Option<&Options>,
        resources: Option<&dyn ResourceSetResolver<O>>,
    ) -> Result<()> {
        let file = File::create(path)?;
        self.save(BufWriter::new(file), options, resources)
    }

    /// [`load`](Self::load) from a file
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or on any load error
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        host: &HostContext<'_, O>,
        options: Option<&Options>,
    ) -> Result<Vec<O>> {
        let file = File::open(path)?;
        self.load(BufReader::new(file), host, options)
    }
}

impl<O: ModelObject> fmt::Debug for TabularResource<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabularResource")
            .field("uri", &self.uri)
            .field("roots", &self.contents.read().len())
            .field("index", &self.index)
            .finish()
    }
}
