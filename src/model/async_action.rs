use serde::{Deserialize, Serialize};

/// Kind of device permission an action or step needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermissionType {
    Camera,
    Location,
    LocationWhenInUse,
    Microphone,
    Motion,
    Notifications,
    Photos,
    Custom(String),
}

impl PermissionType {
    /// Get the permission name as a string
    pub fn as_str(&self) -> &str {
        match self {
            PermissionType::Camera => "camera",
            PermissionType::Location => "location",
            PermissionType::LocationWhenInUse => "locationWhenInUse",
            PermissionType::Microphone => "microphone",
            PermissionType::Motion => "motion",
            PermissionType::Notifications => "notifications",
            PermissionType::Photos => "photos",
            PermissionType::Custom(name) => name,
        }
    }
}

impl From<String> for PermissionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "camera" => PermissionType::Camera,
            "location" => PermissionType::Location,
            "locationWhenInUse" => PermissionType::LocationWhenInUse,
            "microphone" => PermissionType::Microphone,
            "motion" => PermissionType::Motion,
            "notifications" => PermissionType::Notifications,
            "photos" => PermissionType::Photos,
            _ => PermissionType::Custom(value),
        }
    }
}

impl From<PermissionType> for String {
    fn from(value: PermissionType) -> Self {
        match value {
            PermissionType::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PermissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A permission request attached to a step or background action.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionInfo {
    pub permission_type: PermissionType,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PermissionInfo {
    /// Create a required permission request
    pub fn new(permission_type: PermissionType) -> Self {
        Self {
            permission_type,
            optional: false,
            reason: None,
        }
    }
}

/// Configuration of a background action (e.g. a sensor recorder) that runs
/// between two steps of a container.
///
/// A missing `start_step_identifier` starts the action as soon as the
/// container is entered. A missing `stop_step_identifier` keeps it running
/// until the container is exited.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncActionConfiguration {
    pub identifier: String,
    /// Recorder kind understood by the host, e.g. `motion` or `distance`.
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_step_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_step_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionInfo>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AsyncActionConfiguration {
    /// Create a configuration that runs for the whole container
    pub fn new(identifier: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            action_type: action_type.into(),
            start_step_identifier: None,
            stop_step_identifier: None,
            permissions: Vec::new(),
            optional: false,
            comment: None,
        }
    }

    /// Start the action when the given step is entered
    pub fn starting_at(mut self, step: impl Into<String>) -> Self {
        self.start_step_identifier = Some(step.into());
        self
    }

    /// Stop the action when the given step is left
    pub fn stopping_after(mut self, step: impl Into<String>) -> Self {
        self.stop_step_identifier = Some(step.into());
        self
    }

    /// Add a permission the action needs
    pub fn with_permission(mut self, permission: PermissionInfo) -> Self {
        self.permissions.push(permission);
        self
    }
}
