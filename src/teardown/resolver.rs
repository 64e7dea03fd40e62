//! Sources of cluster resource names for teardown.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Deserialize;
use tracing::debug;

use crate::exec::CommandRunner;
use crate::resource::{ResourceKind, belongs_to_cluster};
use crate::state::ExternalStateReader;

use super::TeardownError;

/// Supplies the names of cluster resources to delete.
pub trait NameResolver {
    /// Names of every resource of `kind` belonging to the cluster being torn
    /// down. An empty list means there is nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError::Resolve`] when the names cannot be determined.
    fn resolve(&self, kind: ResourceKind) -> Result<Vec<String>, TeardownError>;
}

/// Resolves names by querying the live cluster.
///
/// Kinds with a deterministic name are looked up directly; the rest are
/// listed and filtered by the cluster identifier.
#[derive(Debug)]
pub struct LiveResolver<'exec, R: CommandRunner> {
    reader: ExternalStateReader<'exec, R>,
    cluster_id: String,
    namespace: String,
}

impl<'exec, R: CommandRunner> LiveResolver<'exec, R> {
    /// Creates a resolver for `cluster_id` in `namespace`.
    #[must_use]
    pub const fn new(
        reader: ExternalStateReader<'exec, R>,
        cluster_id: String,
        namespace: String,
    ) -> Self {
        Self {
            reader,
            cluster_id,
            namespace,
        }
    }
}

impl<R: CommandRunner> NameResolver for LiveResolver<'_, R> {
    fn resolve(&self, kind: ResourceKind) -> Result<Vec<String>, TeardownError> {
        let resolved = match kind.deterministic_name(&self.cluster_id) {
            Some(name) => self
                .reader
                .resource_name(kind, &name, &self.namespace)
                .map(|found| found.into_iter().collect()),
            None => self
                .reader
                .list_resource_names(kind, &self.namespace)
                .map(|names| {
                    names
                        .into_iter()
                        .filter(|name| belongs_to_cluster(name, &self.cluster_id))
                        .collect()
                }),
        };
        resolved.map_err(|source| TeardownError::Resolve { kind, source })
    }
}

/// Resolves names from a previously exported manifest.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ManifestResolver {
    names: HashMap<ResourceKind, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    metadata: Option<ManifestMetadata>,
    #[serde(default)]
    items: Vec<ManifestDocument>,
}

#[derive(Debug, Deserialize)]
struct ManifestMetadata {
    #[serde(default)]
    name: Option<String>,
}

impl ManifestResolver {
    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError::ManifestIo`] when the file cannot be read and
    /// [`TeardownError::ManifestParse`] when it is not valid YAML.
    pub fn load(path: &Utf8Path) -> Result<Self, TeardownError> {
        let contents = read_manifest(path)?;
        Self::parse(&contents).map_err(|err| TeardownError::ManifestParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Parses manifest text holding one or more YAML documents. `List`
    /// documents contribute their `items`.
    ///
    /// # Errors
    ///
    /// Returns the parser error for invalid YAML.
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        let mut resolver = Self::default();
        for document in serde_yaml::Deserializer::from_str(contents) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            let parsed: ManifestDocument = serde_yaml::from_value(value)?;
            resolver.collect(parsed);
        }
        Ok(resolver)
    }

    fn collect(&mut self, document: ManifestDocument) {
        let kind = document
            .kind
            .as_deref()
            .and_then(ResourceKind::from_manifest_kind);
        let name = document.metadata.and_then(|metadata| metadata.name);
        if let (Some(found_kind), Some(found_name)) = (kind, name) {
            let names = self.names.entry(found_kind).or_default();
            if !names.contains(&found_name) {
                names.push(found_name);
            }
        }
        for item in document.items {
            self.collect(item);
        }
    }
}

impl NameResolver for ManifestResolver {
    fn resolve(&self, kind: ResourceKind) -> Result<Vec<String>, TeardownError> {
        Ok(self.names.get(&kind).cloned().unwrap_or_default())
    }
}

/// Manifest names confirmed against the live cluster.
///
/// Each name is requested with `get <kind> <name>`; names the cluster no
/// longer holds are dropped so teardown only deletes what still exists.
#[derive(Debug)]
pub struct VerifiedManifest<'a, R: CommandRunner> {
    reader: ExternalStateReader<'a, R>,
    manifest: &'a ManifestResolver,
    namespace: String,
}

impl<'a, R: CommandRunner> VerifiedManifest<'a, R> {
    /// Wraps `manifest`, verifying its names in `namespace`.
    #[must_use]
    pub const fn new(
        reader: ExternalStateReader<'a, R>,
        manifest: &'a ManifestResolver,
        namespace: String,
    ) -> Self {
        Self {
            reader,
            manifest,
            namespace,
        }
    }
}

impl<R: CommandRunner> NameResolver for VerifiedManifest<'_, R> {
    fn resolve(&self, kind: ResourceKind) -> Result<Vec<String>, TeardownError> {
        let mut present = Vec::new();
        for name in self.manifest.resolve(kind)? {
            match self.reader.resource_name(kind, &name, &self.namespace) {
                Ok(Some(found)) => present.push(found),
                Ok(None) => debug!(%kind, name, "manifest resource already absent"),
                Err(source) => return Err(TeardownError::Resolve { kind, source }),
            }
        }
        Ok(present)
    }
}

fn read_manifest(path: &Utf8Path) -> Result<String, TeardownError> {
    let io_error = |target: &Utf8Path, message: String| TeardownError::ManifestIo {
        path: target.to_path_buf(),
        message,
    };
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_path_buf);
    let file_name = path
        .file_name()
        .ok_or_else(|| io_error(path, String::from("manifest path is missing a filename")))?;

    let dir = Dir::open_ambient_dir(&parent, ambient_authority())
        .map_err(|err| io_error(parent.as_path(), err.to_string()))?;
    dir.read_to_string(file_name)
        .map_err(|err| io_error(path, err.to_string()))
}
