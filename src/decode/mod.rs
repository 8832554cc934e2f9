//! Decoding node trees from JSON resources.
//!
//! [`unpack`] loads a root resource through a [`FileLoader`], splices in
//! nested `import` placeholders, normalizes type names through a
//! [`NodeRegistry`] and decodes the result into a [`Node`] tree.
//!
//! An import placeholder looks like:
//!
//! ```json
//! { "type": "import", "identifier": "part2", "resourceName": "part2" }
//! ```
//!
//! Any other fields on the placeholder (e.g. `nextNodeIdentifier`) override
//! the imported node's fields.

mod loader;
mod registry;

pub use loader::*;
pub use registry::*;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{DecodeError, DecodeResult};
use crate::model::{validate_tree, Node};
use crate::results::ResultData;

/// Type tag of a placeholder that pulls in another resource.
pub const IMPORT_TYPE: &str = "import";

/// Load, resolve and validate a node tree.
pub fn unpack(
    loader: &dyn FileLoader,
    resource: &ResourceInfo,
    registry: &NodeRegistry,
) -> DecodeResult<Arc<Node>> {
    let node = unpack_tree(loader, resource, registry)?;
    validate_tree(&node)?;
    Ok(node)
}

/// Load and resolve a node tree without structural validation.
pub fn unpack_tree(
    loader: &dyn FileLoader,
    resource: &ResourceInfo,
    registry: &NodeRegistry,
) -> DecodeResult<Arc<Node>> {
    let mut stack = Vec::new();
    let value = load_resource(loader, resource, registry, &mut stack)?;
    let node: Node = serde_json::from_value(value)?;
    info!(
        resource = %resource,
        identifier = %node.identifier,
        node_type = %node.kind.as_str(),
        "Unpacked node tree"
    );
    Ok(Arc::new(node))
}

/// Encode a result as pretty JSON.
pub fn encode_result(result: &ResultData) -> DecodeResult<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn load_resource(
    loader: &dyn FileLoader,
    resource: &ResourceInfo,
    registry: &NodeRegistry,
    stack: &mut Vec<ResourceInfo>,
) -> DecodeResult<Value> {
    if stack.contains(resource) {
        return Err(DecodeError::ReferenceCycle {
            resource: resource.to_string(),
        });
    }
    stack.push(resource.clone());

    let bytes = loader.load(resource)?;
    let mut value: Value = serde_json::from_slice(&bytes)?;
    resolve_node(&mut value, resource, loader, registry, stack)?;

    stack.pop();
    Ok(value)
}

fn resolve_node(
    value: &mut Value,
    resource: &ResourceInfo,
    loader: &dyn FileLoader,
    registry: &NodeRegistry,
    stack: &mut Vec<ResourceInfo>,
) -> DecodeResult<()> {
    let Value::Object(object) = value else {
        return Err(DecodeError::MissingType {
            context: format!("non-object node in '{}'", resource),
        });
    };

    if object.get("type").and_then(Value::as_str) == Some(IMPORT_TYPE) {
        let mut placeholder = std::mem::take(object);
        placeholder.remove("type");
        let name = match placeholder.remove("resourceName") {
            Some(Value::String(name)) => name,
            _ => {
                return Err(DecodeError::Resource {
                    resource: resource.to_string(),
                    message: "import is missing 'resourceName'".to_string(),
                })
            }
        };
        let package = match placeholder.remove("packageName") {
            Some(Value::String(package)) => Some(package),
            _ => resource.package_name.clone(),
        };
        let imported = ResourceInfo {
            resource_name: name,
            package_name: package,
        };
        debug!(from = %resource, import = %imported, "Resolving import");

        let mut node = load_resource(loader, &imported, registry, stack)?;
        if let Value::Object(target) = &mut node {
            target.extend(placeholder);
        }
        *value = node;
        return Ok(());
    }

    registry.normalize(object)?;

    if let Some(Value::Array(children)) = object.get_mut("children") {
        for child in children.iter_mut() {
            resolve_node(child, resource, loader, registry, stack)?;
        }
    }
    Ok(())
}
