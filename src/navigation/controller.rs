use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AsyncActionNavigation, BranchNodeState, LeafNodeState, NodeState};
use crate::error::AppError;
use crate::model::{Node, NodeKind, PermissionInfo};

/// When the host should persist the results of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveResults {
    Now,
    WhenSessionExpires,
    Never,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishedReason {
    /// The participant reached the end of the assessment.
    Complete,
    /// The participant left before the end (backward past the first node,
    /// an `exit` jump, or a host request).
    EarlyExit,
    /// The participant declined to take part.
    Declined,
    /// A fatal navigation error ended the session.
    Error,
}

impl FinishedReason {
    /// Get the reason as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishedReason::Complete => "complete",
            FinishedReason::EarlyExit => "early_exit",
            FinishedReason::Declined => "declined",
            FinishedReason::Error => "error",
        }
    }

    pub fn save_results(&self) -> SaveResults {
        match self {
            FinishedReason::Complete => SaveResults::Now,
            FinishedReason::EarlyExit => SaveResults::WhenSessionExpires,
            FinishedReason::Declined | FinishedReason::Error => SaveResults::Never,
        }
    }

    /// Whether the assessment should be considered done by the host's schedule
    pub fn mark_finished(&self) -> bool {
        matches!(self, FinishedReason::Complete | FinishedReason::Declined)
    }
}

impl std::fmt::Display for FinishedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Host callbacks driven by the root [`BranchNodeState`].
///
/// All methods are called synchronously from within `go_forward`,
/// `go_backward` or `exit_early`.
pub trait RootNodeController {
    /// Whether the host presents `node` itself. Containers the host cannot
    /// handle are navigated into.
    fn can_handle(&self, node: &Node) -> bool {
        !node.is_container() || matches!(node.kind, NodeKind::Form(_))
    }

    /// Supply a custom state for `node`, e.g. a branch with its own
    /// navigator or a leaf restored from elsewhere.
    fn custom_node_state_for(
        &mut self,
        _node: &Arc<Node>,
        _parent: &BranchNodeState,
    ) -> Option<NodeState> {
        None
    }

    /// A leaf was reached moving forward.
    fn handle_go_forward(
        &mut self,
        node_state: &LeafNodeState,
        requested_permissions: Option<&[PermissionInfo]>,
        async_action_navigations: &[AsyncActionNavigation],
    );

    /// A leaf was reached moving backward.
    fn handle_go_backward(
        &mut self,
        node_state: &LeafNodeState,
        requested_permissions: Option<&[PermissionInfo]>,
        async_action_navigations: &[AsyncActionNavigation],
    );

    /// Results are final and may be saved. Called at most once per session,
    /// before [`RootNodeController::handle_finished`].
    fn handle_ready_to_save(&mut self, _reason: FinishedReason, _node_state: &BranchNodeState) {}

    /// The session ended. `async_action_navigations` stops everything that
    /// was still running.
    fn handle_finished(
        &mut self,
        reason: FinishedReason,
        node_state: &BranchNodeState,
        async_action_navigations: &[AsyncActionNavigation],
        error: Option<&AppError>,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_results_mapping() {
        assert_eq!(FinishedReason::Complete.save_results(), SaveResults::Now);
        assert_eq!(
            FinishedReason::EarlyExit.save_results(),
            SaveResults::WhenSessionExpires
        );
        assert_eq!(FinishedReason::Declined.save_results(), SaveResults::Never);
        assert_eq!(FinishedReason::Error.save_results(), SaveResults::Never);
    }

    #[test]
    fn test_mark_finished() {
        assert!(FinishedReason::Complete.mark_finished());
        assert!(FinishedReason::Declined.mark_finished());
        assert!(!FinishedReason::EarlyExit.mark_finished());
        assert!(!FinishedReason::Error.mark_finished());
    }

    #[test]
    fn test_finished_reason_serialization() {
        let json = serde_json::to_string(&FinishedReason::EarlyExit).unwrap();
        assert_eq!(json, "\"early_exit\"");
        assert_eq!(FinishedReason::EarlyExit.to_string(), "early_exit");
    }
}
