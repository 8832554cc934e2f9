use std::sync::Arc;

use tracing::debug;

use super::async_actions::async_action_navigation;
use super::survey_rule::first_matching_rule;
use super::{NavigationIdentifier, NavigationPoint, Navigator, Progress};
use crate::error::{NavigationError, NavigationResult};
use crate::model::Node;
use crate::results::{BranchNodeResult, Direction};

/// Default significant digits for numeric rule comparisons.
pub const DEFAULT_SIGNIFICANT_DIGITS: u32 = 5;

/// Navigator over a container's children.
///
/// Forward moves follow, in order of precedence: the current node's
/// `next_node_identifier`, its first matching survey rule, then sibling
/// order. Backward moves retrace the branch's path log.
#[derive(Debug, Clone)]
pub struct NodeNavigator {
    container: Arc<Node>,
    significant_digits: u32,
}

impl NodeNavigator {
    /// Create a navigator for a container node
    pub fn new(container: Arc<Node>) -> NavigationResult<Self> {
        if !container.is_container() {
            return Err(NavigationError::NotAContainer {
                identifier: container.identifier.clone(),
            });
        }
        Ok(Self {
            container,
            significant_digits: DEFAULT_SIGNIFICANT_DIGITS,
        })
    }

    /// Set the digits used for numeric equality when a rule has no accuracy
    pub fn with_significant_digits(mut self, digits: u32) -> Self {
        self.significant_digits = digits;
        self
    }

    pub fn container(&self) -> &Arc<Node> {
        &self.container
    }

    fn children(&self) -> &[Arc<Node>] {
        self.container.children().unwrap_or(&[])
    }

    fn index_of(&self, identifier: &str) -> Option<usize> {
        self.children()
            .iter()
            .position(|child| child.identifier == identifier)
    }

    fn first_child(&self) -> NavigationResult<Arc<Node>> {
        self.children()
            .first()
            .cloned()
            .ok_or_else(|| NavigationError::EmptyContainer {
                identifier: self.container.identifier.clone(),
            })
    }

    fn unknown(&self, identifier: &str) -> NavigationError {
        NavigationError::UnknownIdentifier {
            container: self.container.identifier.clone(),
            identifier: identifier.to_string(),
        }
    }

    /// Jump target requested by `current`'s rules, if any.
    fn rule_target<'n>(
        &self,
        current: &'n Node,
        branch_result: &BranchNodeResult,
    ) -> NavigationResult<Option<&'n str>> {
        if let Some(next) = current.next_node_identifier.as_deref() {
            return Ok(Some(next));
        }
        if current.survey_rules.is_empty() {
            return Ok(None);
        }
        let result = branch_result.child_result(current.result_id());
        let answer = result.and_then(|r| r.answer_value());
        let answer_type = result
            .and_then(|r| r.answer_type())
            .or_else(|| current.answer_type());
        Ok(first_matching_rule(
            &current.survey_rules,
            answer,
            answer_type,
            self.significant_digits,
        )?)
    }

    fn resolve_jump(&self, target: &str) -> NavigationResult<(Option<Arc<Node>>, Direction)> {
        match NavigationIdentifier::parse(target) {
            Some(NavigationIdentifier::Exit) => Ok((None, Direction::Exit)),
            Some(NavigationIdentifier::NextSection) => Ok((None, Direction::Forward)),
            Some(NavigationIdentifier::Beginning) => {
                Ok((Some(self.first_child()?), Direction::Forward))
            }
            None => self
                .node(target)
                .map(|node| (Some(node), Direction::Forward))
                .ok_or_else(|| self.unknown(target)),
        }
    }
}

impl Navigator for NodeNavigator {
    fn node(&self, identifier: &str) -> Option<Arc<Node>> {
        self.container.child(identifier).cloned()
    }

    fn node_after(
        &self,
        current: Option<&Node>,
        branch_result: &BranchNodeResult,
    ) -> NavigationResult<NavigationPoint> {
        let (node, direction) = match current {
            None => (Some(self.first_child()?), Direction::Forward),
            Some(current) => match self.rule_target(current, branch_result)? {
                Some(target) => self.resolve_jump(target)?,
                None => {
                    let index = self
                        .index_of(&current.identifier)
                        .ok_or_else(|| self.unknown(&current.identifier))?;
                    (self.children().get(index + 1).cloned(), Direction::Forward)
                }
            },
        };

        debug!(
            container = %self.container.identifier,
            from = current.map(|n| n.identifier.as_str()).unwrap_or("-"),
            to = node.as_ref().map(|n| n.identifier.as_str()).unwrap_or("-"),
            direction = %direction,
            "Resolved node after"
        );

        let mut next_result = branch_result.clone();
        let async_action_navigations = async_action_navigation(
            &self.container,
            current,
            node.as_deref(),
            direction,
            &mut next_result,
        )
        .into_iter()
        .collect();
        let requested_permissions = node
            .as_ref()
            .and_then(|n| n.requested_permissions())
            .map(|permissions| permissions.to_vec());

        Ok(NavigationPoint {
            node,
            branch_result: next_result,
            direction,
            requested_permissions,
            async_action_navigations,
        })
    }

    fn node_before(
        &self,
        current: Option<&Node>,
        branch_result: &BranchNodeResult,
    ) -> NavigationResult<NavigationPoint> {
        let trail = branch_result.active_trail();
        let previous: Option<&str> = match current {
            None => trail.last().copied(),
            Some(current) => {
                match trail
                    .iter()
                    .rposition(|identifier| *identifier == current.identifier)
                {
                    Some(position) => position.checked_sub(1).map(|p| trail[p]),
                    // Not on the trail: fall back to sibling order.
                    None => self
                        .index_of(&current.identifier)
                        .and_then(|index| index.checked_sub(1))
                        .map(|index| self.children()[index].identifier.as_str()),
                }
            }
        };

        let node = previous
            .map(|identifier| self.node(identifier).ok_or_else(|| self.unknown(identifier)))
            .transpose()?;

        debug!(
            container = %self.container.identifier,
            from = current.map(|n| n.identifier.as_str()).unwrap_or("-"),
            to = node.as_ref().map(|n| n.identifier.as_str()).unwrap_or("-"),
            "Resolved node before"
        );

        let mut previous_result = branch_result.clone();
        let async_action_navigations = async_action_navigation(
            &self.container,
            current,
            node.as_deref(),
            Direction::Backward,
            &mut previous_result,
        )
        .into_iter()
        .collect();

        Ok(NavigationPoint {
            node,
            branch_result: previous_result,
            direction: Direction::Backward,
            requested_permissions: None,
            async_action_navigations,
        })
    }

    fn progress(&self, current: &Node, _branch_result: &BranchNodeResult) -> Option<Progress> {
        let children = self.children();
        let index = self.index_of(&current.identifier)?;
        let is_estimated = children.iter().any(|child| child.has_navigation_rules());

        let Some(markers) = self.container.progress_markers() else {
            return Some(Progress {
                current: index,
                total: children.len(),
                is_estimated,
            });
        };
        if markers.is_empty() {
            return None;
        }

        // Nearest marker at or before the current node.
        let marker_index = children[..=index]
            .iter()
            .rev()
            .find_map(|child| markers.iter().position(|m| *m == child.identifier))?;

        // Past the last marker only the marker itself reports progress.
        let last_marker = markers.last()?;
        let last_marker_index = self.index_of(last_marker);
        if last_marker_index.is_some_and(|last| index > last) {
            return None;
        }

        Some(Progress {
            current: marker_index,
            total: markers.len(),
            is_estimated: false,
        })
    }
}
