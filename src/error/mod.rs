use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Structural and runtime navigation errors.
///
/// All of these are fatal for a session: the root state delivers them to the
/// host controller once and stops.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Unknown identifier '{identifier}' in container '{container}'")]
    UnknownIdentifier {
        container: String,
        identifier: String,
    },

    #[error("Duplicate identifier '{identifier}' in container '{container}'")]
    DuplicateIdentifier {
        container: String,
        identifier: String,
    },

    #[error("Container '{identifier}' has no children")]
    EmptyContainer { identifier: String },

    #[error("Node '{identifier}' is not a container")]
    NotAContainer { identifier: String },

    #[error("No node state available for '{identifier}'")]
    NoNodeState { identifier: String },

    #[error("Root controller is not attached")]
    MissingController,

    #[error("Session for '{identifier}' has already finished")]
    SessionFinished { identifier: String },

    #[error("Rule evaluation failed: {0}")]
    Rule(#[from] RuleError),
}

/// Survey rule evaluation errors
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Cannot apply '{operator}' to {answer} and {matching}")]
    Incomparable {
        operator: String,
        answer: String,
        matching: String,
    },
}

/// Decoding and resource loading errors
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Node is missing a 'type' field: {context}")]
    MissingType { context: String },

    #[error("Unknown node type: {type_name}")]
    UnknownNodeType { type_name: String },

    #[error("Failed to load resource '{resource}': {message}")]
    Resource { resource: String, message: String },

    #[error("Resource '{resource}' references itself")]
    ReferenceCycle { resource: String },

    #[error("Invalid node tree: {0}")]
    Structure(#[from] NavigationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RuleError> for AppError {
    fn from(err: RuleError) -> Self {
        AppError::Navigation(NavigationError::Rule(err))
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for navigation operations
pub type NavigationResult<T> = Result<T, NavigationError>;

/// Result type alias for rule evaluation
pub type RuleResult<T> = Result<T, RuleError>;

/// Result type alias for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;
