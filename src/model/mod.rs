//! Immutable node tree.
//!
//! An assessment is a tree of [`Node`]s. Containers (sections, forms and the
//! assessment root) own ordered children; everything else is a leaf that the
//! host presents. Nodes are built once, wrapped in [`Arc`], and shared
//! read-only by navigators, node states and the host.

mod answer_type;
mod async_action;
mod buttons;
mod validate;

pub use answer_type::*;
pub use async_action::*;
pub use buttons::*;
pub use validate::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::navigation::SurveyRule;

// ============================================================================
// Node
// ============================================================================

/// A node of the assessment tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Identifier, unique among siblings.
    pub identifier: String,
    /// Identifier used for this node's result, when it differs from `identifier`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub button_map: BTreeMap<ButtonAction, ButtonInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hide_buttons: Vec<ButtonAction>,
    /// Direct navigation rule. Takes precedence over `survey_rules`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_identifier: Option<String>,
    /// Conditional skip rules, evaluated in order against this node's answer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub survey_rules: Vec<SurveyRule>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Closed set of node kinds with an open custom arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Instruction,
    Completion,
    Question(QuestionInfo),
    Permission(PermissionStepInfo),
    Section(ContainerInfo),
    Form(ContainerInfo),
    Assessment(AssessmentInfo),
    Custom(CustomNodeInfo),
}

/// Question payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInfo {
    pub answer_type: AnswerType,
    #[serde(default)]
    pub optional: bool,
}

/// Permission request step payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStepInfo {
    pub permissions: Vec<PermissionInfo>,
}

/// Children and container-level settings shared by all container kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    pub children: Vec<Arc<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_markers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub background_actions: Vec<AsyncActionConfiguration>,
}

/// Assessment root payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentInfo {
    #[serde(flatten)]
    pub container: ContainerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
}

/// Host defined node kind, tagged with its original type name.
///
/// A custom node with children navigates like a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomNodeInfo {
    pub custom_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Node>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl NodeKind {
    /// Get the type tag as a string
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Instruction => "instruction",
            NodeKind::Completion => "completion",
            NodeKind::Question(_) => "question",
            NodeKind::Permission(_) => "permission",
            NodeKind::Section(_) => "section",
            NodeKind::Form(_) => "form",
            NodeKind::Assessment(_) => "assessment",
            NodeKind::Custom(info) => &info.custom_type,
        }
    }

    /// Type tags decoded without a registry lookup
    pub const BUILTIN_TYPES: [&'static str; 8] = [
        "instruction",
        "completion",
        "question",
        "permission",
        "section",
        "form",
        "assessment",
        "custom",
    ];
}

impl Node {
    /// Create a node with the given kind and no rules
    pub fn new(identifier: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            identifier: identifier.into(),
            result_identifier: None,
            comment: None,
            title: None,
            button_map: BTreeMap::new(),
            hide_buttons: Vec::new(),
            next_node_identifier: None,
            survey_rules: Vec::new(),
            kind,
        }
    }

    /// Create an instruction step
    pub fn instruction(identifier: impl Into<String>) -> Self {
        Self::new(identifier, NodeKind::Instruction)
    }

    /// Create a completion step
    pub fn completion(identifier: impl Into<String>) -> Self {
        Self::new(identifier, NodeKind::Completion)
    }

    /// Create a required question
    pub fn question(identifier: impl Into<String>, answer_type: AnswerType) -> Self {
        Self::new(
            identifier,
            NodeKind::Question(QuestionInfo {
                answer_type,
                optional: false,
            }),
        )
    }

    /// Create a permission request step
    pub fn permission(identifier: impl Into<String>, permissions: Vec<PermissionInfo>) -> Self {
        Self::new(
            identifier,
            NodeKind::Permission(PermissionStepInfo { permissions }),
        )
    }

    /// Create a section containing the given children
    pub fn section(identifier: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(identifier, NodeKind::Section(ContainerInfo::new(children)))
    }

    /// Create a form containing the given children
    pub fn form(identifier: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(identifier, NodeKind::Form(ContainerInfo::new(children)))
    }

    /// Create an assessment root containing the given children
    pub fn assessment(identifier: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(
            identifier,
            NodeKind::Assessment(AssessmentInfo {
                container: ContainerInfo::new(children),
                version_string: None,
                estimated_minutes: None,
            }),
        )
    }

    /// Set the direct navigation rule
    pub fn with_next_node(mut self, identifier: impl Into<String>) -> Self {
        self.next_node_identifier = Some(identifier.into());
        self
    }

    /// Set the survey rules
    pub fn with_survey_rules(mut self, rules: Vec<SurveyRule>) -> Self {
        self.survey_rules = rules;
        self
    }

    /// Set the result identifier
    pub fn with_result_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.result_identifier = Some(identifier.into());
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Override a button
    pub fn with_button(mut self, action: ButtonAction, info: ButtonInfo) -> Self {
        self.button_map.insert(action, info);
        self
    }

    /// Hide a button
    pub fn with_hidden_button(mut self, action: ButtonAction) -> Self {
        self.hide_buttons.push(action);
        self
    }

    /// Set the background actions. Ignored for non-container nodes.
    pub fn with_background_actions(mut self, actions: Vec<AsyncActionConfiguration>) -> Self {
        if let Some(container) = self.container_info_mut() {
            container.background_actions = actions;
        }
        self
    }

    /// Set the progress markers. Ignored for non-container nodes.
    pub fn with_progress_markers(mut self, markers: Vec<String>) -> Self {
        if let Some(container) = self.container_info_mut() {
            container.progress_markers = Some(markers);
        }
        self
    }

    /// Wrap in an [`Arc`] for sharing
    pub fn into_shared(self) -> Arc<Node> {
        Arc::new(self)
    }

    /// Identifier used for this node's result
    pub fn result_id(&self) -> &str {
        self.result_identifier.as_deref().unwrap_or(&self.identifier)
    }

    /// Whether this node owns children and is navigated by a navigator
    pub fn is_container(&self) -> bool {
        self.children().is_some()
    }

    /// Ordered children, or `None` for leaves
    pub fn children(&self) -> Option<&[Arc<Node>]> {
        match &self.kind {
            NodeKind::Section(info) | NodeKind::Form(info) => Some(&info.children),
            NodeKind::Assessment(info) => Some(&info.container.children),
            NodeKind::Custom(info) if !info.children.is_empty() => Some(&info.children),
            _ => None,
        }
    }

    /// Progress markers declared by a container
    pub fn progress_markers(&self) -> Option<&[String]> {
        self.container_info()
            .and_then(|info| info.progress_markers.as_deref())
    }

    /// Background actions declared by a container
    pub fn background_actions(&self) -> &[AsyncActionConfiguration] {
        self.container_info()
            .map(|info| info.background_actions.as_slice())
            .unwrap_or(&[])
    }

    /// Permissions requested when this node is navigated to
    pub fn requested_permissions(&self) -> Option<&[PermissionInfo]> {
        match &self.kind {
            NodeKind::Permission(info) if !info.permissions.is_empty() => {
                Some(&info.permissions)
            }
            _ => None,
        }
    }

    /// Answer type of a question
    pub fn answer_type(&self) -> Option<&AnswerType> {
        match &self.kind {
            NodeKind::Question(info) => Some(&info.answer_type),
            _ => None,
        }
    }

    /// Whether this is a completion step
    pub fn is_completion(&self) -> bool {
        matches!(self.kind, NodeKind::Completion)
    }

    /// Whether this node carries a direct or conditional navigation rule
    pub fn has_navigation_rules(&self) -> bool {
        self.next_node_identifier.is_some() || !self.survey_rules.is_empty()
    }

    /// Find a direct child by identifier
    pub fn child(&self, identifier: &str) -> Option<&Arc<Node>> {
        self.children()?
            .iter()
            .find(|child| child.identifier == identifier)
    }

    fn container_info(&self) -> Option<&ContainerInfo> {
        match &self.kind {
            NodeKind::Section(info) | NodeKind::Form(info) => Some(info),
            NodeKind::Assessment(info) => Some(&info.container),
            _ => None,
        }
    }

    fn container_info_mut(&mut self) -> Option<&mut ContainerInfo> {
        match &mut self.kind {
            NodeKind::Section(info) | NodeKind::Form(info) => Some(info),
            NodeKind::Assessment(info) => Some(&mut info.container),
            _ => None,
        }
    }
}

impl ContainerInfo {
    /// Create container settings for the given children
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children: children.into_iter().map(Arc::new).collect(),
            progress_markers: None,
            background_actions: Vec::new(),
        }
    }
}
