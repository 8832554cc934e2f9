//! Navigation engine.
//!
//! This module provides:
//! - [`Navigator`]: computes the next/previous [`NavigationPoint`] inside a container
//! - [`NodeNavigator`]: the default navigator driven by sibling order and rules
//! - [`SurveyRule`]: conditional skip rules evaluated against an answer
//! - [`AsyncActionNavigation`]: background action start/stop sets for a move
//! - [`BranchNodeState`] / [`LeafNodeState`]: the runtime state machine
//! - [`RootNodeController`]: callbacks implemented by the host

mod async_actions;
mod controller;
mod navigator;
mod state;
mod survey_rule;

pub use async_actions::*;
pub use controller::*;
pub use navigator::*;
pub use state::*;
pub use survey_rule::*;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::NavigationResult;
use crate::model::{Node, PermissionInfo};
use crate::results::{BranchNodeResult, Direction};

// ============================================================================
// Navigation Point
// ============================================================================

/// Where a move lands.
///
/// `node == None` means the container has no more nodes in `direction`; the
/// caller hands control back to the parent container.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPoint {
    pub node: Option<Arc<Node>>,
    pub branch_result: BranchNodeResult,
    pub direction: Direction,
    pub requested_permissions: Option<Vec<PermissionInfo>>,
    pub async_action_navigations: Vec<AsyncActionNavigation>,
}

/// Position within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    /// True when navigation rules may change the number of nodes visited.
    pub is_estimated: bool,
}

// ============================================================================
// Reserved Identifiers
// ============================================================================

/// Jump targets that do not name a sibling. Matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationIdentifier {
    /// End the whole assessment.
    Exit,
    /// End the current container and continue in the parent.
    NextSection,
    /// Return to the first child of the current container.
    Beginning,
}

impl NavigationIdentifier {
    /// Get the identifier as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationIdentifier::Exit => "exit",
            NavigationIdentifier::NextSection => "nextSection",
            NavigationIdentifier::Beginning => "beginning",
        }
    }

    /// Parse a jump target. Returns `None` for ordinary identifiers.
    pub fn parse(identifier: &str) -> Option<Self> {
        [
            NavigationIdentifier::Exit,
            NavigationIdentifier::NextSection,
            NavigationIdentifier::Beginning,
        ]
        .into_iter()
        .find(|reserved| reserved.as_str().eq_ignore_ascii_case(identifier))
    }
}

impl fmt::Display for NavigationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Navigator
// ============================================================================

/// Stateless navigation over the children of one container.
///
/// Implementations never mutate the branch result they are given; any change
/// they want applied is returned in [`NavigationPoint::branch_result`].
pub trait Navigator: fmt::Debug {
    /// Look up a child by identifier
    fn node(&self, identifier: &str) -> Option<Arc<Node>>;

    /// Node to show after `current`. `None` asks for the first node.
    fn node_after(
        &self,
        current: Option<&Node>,
        branch_result: &BranchNodeResult,
    ) -> NavigationResult<NavigationPoint>;

    /// Node to show before `current`. `None` asks for the last visited node.
    fn node_before(
        &self,
        current: Option<&Node>,
        branch_result: &BranchNodeResult,
    ) -> NavigationResult<NavigationPoint>;

    /// Whether moving forward from `current` stays inside this container
    fn has_node_after(&self, current: &Node, branch_result: &BranchNodeResult) -> bool {
        self.node_after(Some(current), branch_result)
            .map(|point| point.node.is_some())
            .unwrap_or(false)
    }

    /// Whether moving backward from `current` stays inside this container
    fn allow_back_navigation(&self, current: &Node, branch_result: &BranchNodeResult) -> bool {
        self.node_before(Some(current), branch_result)
            .map(|point| point.node.is_some())
            .unwrap_or(false)
    }

    /// Progress of `current` within this container
    fn progress(&self, current: &Node, branch_result: &BranchNodeResult) -> Option<Progress>;
}
