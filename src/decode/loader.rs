use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DecodeError, DecodeResult};

/// Names a JSON resource, optionally inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceInfo {
    pub resource_name: String,
    pub package_name: Option<String>,
}

impl ResourceInfo {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            package_name: None,
        }
    }

    pub fn with_package(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }
}

impl fmt::Display for ResourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package_name {
            Some(package) => write!(f, "{}/{}", package, self.resource_name),
            None => write!(f, "{}", self.resource_name),
        }
    }
}

/// Source of raw resource bytes.
pub trait FileLoader {
    fn load(&self, resource: &ResourceInfo) -> DecodeResult<Vec<u8>>;
}

/// Loads resources from a directory. Packages are subdirectories and a
/// resource name without an extension gets `.json`.
#[derive(Debug, Clone)]
pub struct DirectoryFileLoader {
    root: PathBuf,
}

impl DirectoryFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a resource resolves to
    pub fn path_for(&self, resource: &ResourceInfo) -> PathBuf {
        let mut path = self.root.clone();
        if let Some(package) = &resource.package_name {
            path.push(package);
        }
        path.push(&resource.resource_name);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        path
    }
}

impl FileLoader for DirectoryFileLoader {
    fn load(&self, resource: &ResourceInfo) -> DecodeResult<Vec<u8>> {
        let path = self.path_for(resource);
        debug!(resource = %resource, path = %path.display(), "Loading resource");
        std::fs::read(&path).map_err(|e| DecodeError::Resource {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }
}
