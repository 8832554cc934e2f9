//! Registry of node type names accepted by the decoder.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::error;

use crate::error::{DecodeError, DecodeResult};
use crate::model::NodeKind;

/// Keys that stay on a custom node; everything else moves to its payload.
const NODE_KEYS: [&str; 9] = [
    "identifier",
    "resultIdentifier",
    "comment",
    "title",
    "buttonMap",
    "hideButtons",
    "nextNodeIdentifier",
    "surveyRules",
    "children",
];

/// A host defined node type.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomNodeType {
    pub type_name: String,
    pub description: String,
}

impl CustomNodeType {
    pub fn new(type_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            description: description.into(),
        }
    }
}

/// Explicit decoding context: which type names map to built-in kinds and
/// which are host defined.
///
/// Unregistered type names fail decoding instead of being dropped.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    aliases: HashMap<String, String>,
    custom_types: HashMap<String, CustomNodeType>,
}

impl NodeRegistry {
    /// Create a new registry with the built-in aliases.
    pub fn new() -> Self {
        let mut registry = Self {
            aliases: HashMap::new(),
            custom_types: HashMap::new(),
        };
        registry.register_builtin_aliases();
        registry
    }

    /// Register a host defined node type.
    ///
    /// # Errors
    /// Returns error if the name is empty or already in use.
    pub fn register(&mut self, node_type: CustomNodeType) -> Result<(), String> {
        if node_type.type_name.is_empty() {
            return Err("Node type name is required".to_string());
        }
        self.ensure_unused(&node_type.type_name)?;
        self.custom_types
            .insert(node_type.type_name.clone(), node_type);
        Ok(())
    }

    /// Register another name for a built-in node kind.
    ///
    /// # Errors
    /// Returns error if the target is not built in or the alias is in use.
    pub fn register_alias(&mut self, alias: &str, builtin: &str) -> Result<(), String> {
        if alias.is_empty() {
            return Err("Alias is required".to_string());
        }
        if !NodeKind::BUILTIN_TYPES.contains(&builtin) {
            return Err(format!("'{}' is not a built-in node type", builtin));
        }
        self.ensure_unused(alias)?;
        self.aliases.insert(alias.to_string(), builtin.to_string());
        Ok(())
    }

    /// Get a custom type by name.
    pub fn get(&self, type_name: &str) -> Option<&CustomNodeType> {
        self.custom_types.get(type_name)
    }

    /// List custom types sorted by name.
    pub fn list(&self) -> Vec<&CustomNodeType> {
        let mut types: Vec<_> = self.custom_types.values().collect();
        types.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        types
    }

    /// Get the number of custom types.
    pub fn count(&self) -> usize {
        self.custom_types.len()
    }

    /// Rewrite a node object's `type` into the form the node model decodes:
    /// aliases become their built-in name and custom types move into the
    /// `custom` arm with their extra fields as payload.
    pub(crate) fn normalize(&self, object: &mut Map<String, Value>) -> DecodeResult<()> {
        let type_name = match object.get("type").and_then(Value::as_str) {
            Some(type_name) => type_name.to_string(),
            None => {
                return Err(DecodeError::MissingType {
                    context: describe(object),
                })
            }
        };

        if NodeKind::BUILTIN_TYPES.contains(&type_name.as_str()) {
            return Ok(());
        }
        if let Some(builtin) = self.aliases.get(&type_name) {
            object.insert("type".to_string(), Value::String(builtin.clone()));
            return Ok(());
        }
        if self.custom_types.contains_key(&type_name) {
            let mut payload = std::mem::take(object);
            payload.remove("type");
            for key in NODE_KEYS {
                if let Some(value) = payload.remove(key) {
                    object.insert(key.to_string(), value);
                }
            }
            object.insert("type".to_string(), Value::String("custom".to_string()));
            object.insert("customType".to_string(), Value::String(type_name));
            if !payload.is_empty() {
                object.insert("payload".to_string(), Value::Object(payload));
            }
            return Ok(());
        }

        Err(DecodeError::UnknownNodeType { type_name })
    }

    fn ensure_unused(&self, name: &str) -> Result<(), String> {
        if NodeKind::BUILTIN_TYPES.contains(&name) {
            return Err(format!("'{}' is a built-in node type", name));
        }
        if self.aliases.contains_key(name) || self.custom_types.contains_key(name) {
            return Err(format!("Node type '{}' already exists", name));
        }
        Ok(())
    }

    fn register_builtin_aliases(&mut self) {
        let aliases = [
            ("overview", "instruction"),
            ("simpleQuestion", "question"),
            ("choiceQuestion", "question"),
        ];

        for (alias, builtin) in aliases {
            if let Err(e) = self.register_alias(alias, builtin) {
                error!(
                    alias = alias,
                    error = %e,
                    "Failed to register builtin alias - this indicates a programming error"
                );
            }
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(object: &Map<String, Value>) -> String {
    match object.get("identifier").and_then(Value::as_str) {
        Some(identifier) => format!("node '{}'", identifier),
        None => "node without identifier".to_string(),
    }
}
