use serde::{Deserialize, Serialize};

/// Navigation or auxiliary button a node can customize or hide.
///
/// Unknown action names are kept as [`ButtonAction::Custom`] so host
/// specific buttons survive a decode/encode cycle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ButtonAction {
    GoForward,
    GoBackward,
    Skip,
    Cancel,
    Info,
    Custom(String),
}

impl ButtonAction {
    /// Get the action name as a string
    pub fn as_str(&self) -> &str {
        match self {
            ButtonAction::GoForward => "goForward",
            ButtonAction::GoBackward => "goBackward",
            ButtonAction::Skip => "skip",
            ButtonAction::Cancel => "cancel",
            ButtonAction::Info => "info",
            ButtonAction::Custom(name) => name,
        }
    }
}

impl From<String> for ButtonAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "goForward" => ButtonAction::GoForward,
            "goBackward" => ButtonAction::GoBackward,
            "skip" => ButtonAction::Skip,
            "cancel" => ButtonAction::Cancel,
            "info" => ButtonAction::Info,
            _ => ButtonAction::Custom(value),
        }
    }
}

impl From<ButtonAction> for String {
    fn from(value: ButtonAction) -> Self {
        match value {
            ButtonAction::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display overrides for a button.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
}
