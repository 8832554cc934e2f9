//! Runtime node states.
//!
//! A [`BranchNodeState`] owns the state of its current child, which is either
//! another branch or a [`LeafNodeState`]. Children only keep their parent's
//! identifier; moves are driven from the root, and each level reports a
//! [`BranchOutcome`] upward instead of calling back into its parent.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::async_actions::{merge_navigations, stop_all_actions, AsyncActionNavigation};
use super::controller::{FinishedReason, RootNodeController, SaveResults};
use super::navigator::NodeNavigator;
use super::{Navigator, Progress};
use crate::config::NavigationConfig;
use crate::error::{AppError, AppResult, NavigationError, NavigationResult};
use crate::model::{validate_tree, Node, PermissionInfo};
use crate::results::{BranchNodeResult, Direction, ResultData};

// ============================================================================
// Node State
// ============================================================================

/// State of a node currently on the active path.
#[derive(Debug)]
pub enum NodeState {
    Branch(BranchNodeState),
    Leaf(LeafNodeState),
}

impl NodeState {
    pub fn node(&self) -> &Arc<Node> {
        match self {
            NodeState::Branch(state) => &state.node,
            NodeState::Leaf(state) => &state.node,
        }
    }

    pub fn parent_identifier(&self) -> Option<&str> {
        match self {
            NodeState::Branch(state) => state.parent.as_deref(),
            NodeState::Leaf(state) => state.parent.as_deref(),
        }
    }

    /// Snapshot of this node's result
    pub fn result(&self) -> ResultData {
        match self {
            NodeState::Branch(state) => ResultData::Branch(state.current_result.clone()),
            NodeState::Leaf(state) => state.current_result.clone(),
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNodeState> {
        match self {
            NodeState::Leaf(state) => Some(state),
            NodeState::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&BranchNodeState> {
        match self {
            NodeState::Branch(state) => Some(state),
            NodeState::Leaf(_) => None,
        }
    }

    fn close(&mut self) {
        let now = Utc::now();
        match self {
            NodeState::Branch(state) => {
                state.current_result.collection.end_date.get_or_insert(now);
            }
            NodeState::Leaf(state) => {
                if state.current_result.end_date().is_none() {
                    state.current_result.set_end_date(Some(now));
                }
            }
        }
    }
}

// ============================================================================
// Leaf Node State
// ============================================================================

/// State of a node the host presents (a step, a question or a form).
#[derive(Debug, Clone)]
pub struct LeafNodeState {
    node: Arc<Node>,
    parent: Option<String>,
    current_result: ResultData,
}

impl LeafNodeState {
    /// Create a state with a fresh result
    pub fn new(node: Arc<Node>, parent: Option<&BranchNodeState>) -> Self {
        let current_result = ResultData::for_node(&node);
        Self {
            node,
            parent: parent.map(|p| p.node.identifier.clone()),
            current_result,
        }
    }

    /// Resume from a previous result. Timing restarts with this visit.
    pub fn with_previous_result(mut self, mut result: ResultData) -> Self {
        result.set_start_date(Utc::now());
        result.set_end_date(None);
        self.current_result = result;
        self
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn parent_identifier(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn current_result(&self) -> &ResultData {
        &self.current_result
    }

    pub fn current_result_mut(&mut self) -> &mut ResultData {
        &mut self.current_result
    }

    /// Current answer, if this is an answered question
    pub fn answer(&self) -> Option<&Value> {
        self.current_result.answer_value()
    }

    /// Record an answer. `null` clears it.
    ///
    /// Returns `false` and leaves the result untouched when this node does
    /// not take answers or the value does not fit its answer type.
    pub fn set_answer(&mut self, value: Value) -> bool {
        let ResultData::Answer(result) = &mut self.current_result else {
            warn!(node = %self.node.identifier, "Node does not accept answers");
            return false;
        };
        if let Some(answer_type) = &result.answer_type {
            if !answer_type.accepts(&value) {
                warn!(
                    node = %self.node.identifier,
                    answer_type = %answer_type,
                    "Answer does not match answer type"
                );
                return false;
            }
        }
        result.json_value = (!value.is_null()).then_some(value);
        true
    }
}

// ============================================================================
// Branch Node State
// ============================================================================

/// What a branch reports to its parent after handling a move.
#[derive(Debug)]
enum BranchOutcome {
    /// A leaf was handed to the host. `ready_to_save` is set when that leaf
    /// completes the assessment.
    Presented { ready_to_save: bool },
    /// The branch ran out of nodes in `direction`; the parent continues.
    Finished {
        direction: Direction,
        pending: Vec<AsyncActionNavigation>,
    },
    /// The whole assessment is being exited.
    Exit { pending: Vec<AsyncActionNavigation> },
}

struct RootContext {
    controller: Option<Box<dyn RootNodeController>>,
    ready_to_save_sent: bool,
    finished: bool,
}

/// State of a container node.
///
/// The root state owns the [`RootNodeController`] and is the entry point for
/// all moves: [`go_forward`](Self::go_forward),
/// [`go_backward`](Self::go_backward) and [`exit_early`](Self::exit_early).
pub struct BranchNodeState {
    node: Arc<Node>,
    parent: Option<String>,
    navigator: Box<dyn Navigator>,
    current_result: BranchNodeResult,
    current_child: Option<Box<NodeState>>,
    config: NavigationConfig,
    root: Option<RootContext>,
}

impl fmt::Debug for BranchNodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchNodeState")
            .field("node", &self.node.identifier)
            .field("parent", &self.parent)
            .field("navigator", &self.navigator)
            .field("current_child", &self.current_child)
            .field("is_root", &self.root.is_some())
            .finish()
    }
}

impl BranchNodeState {
    /// Create a state for a container using the default navigator.
    pub fn new(node: Arc<Node>, parent: Option<&BranchNodeState>) -> NavigationResult<Self> {
        let config = parent.map(|p| p.config.clone()).unwrap_or_default();
        let navigator = NodeNavigator::new(node.clone())?
            .with_significant_digits(config.significant_digits);
        let current_result = BranchNodeResult::for_node(&node);
        Ok(Self {
            node,
            parent: parent.map(|p| p.node.identifier.clone()),
            navigator: Box::new(navigator),
            current_result,
            current_child: None,
            config,
            root: None,
        })
    }

    /// Create the root state of a session with default configuration.
    pub fn new_root(
        node: Arc<Node>,
        controller: Box<dyn RootNodeController>,
    ) -> NavigationResult<Self> {
        Self::new_root_with_config(node, controller, NavigationConfig::default())
    }

    /// Create the root state of a session. The tree is validated first.
    pub fn new_root_with_config(
        node: Arc<Node>,
        controller: Box<dyn RootNodeController>,
        config: NavigationConfig,
    ) -> NavigationResult<Self> {
        validate_tree(&node)?;
        let navigator = NodeNavigator::new(node.clone())?
            .with_significant_digits(config.significant_digits);
        let current_result = BranchNodeResult::for_node(&node);
        info!(
            assessment = %node.identifier,
            task_run = ?current_result.task_run_uuid,
            "Starting assessment session"
        );
        Ok(Self {
            node,
            parent: None,
            navigator: Box::new(navigator),
            current_result,
            current_child: None,
            config,
            root: Some(RootContext {
                controller: Some(controller),
                ready_to_save_sent: false,
                finished: false,
            }),
        })
    }

    /// Replace the navigator
    pub fn with_navigator(mut self, navigator: Box<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Resume from a previous result. Timing restarts with this visit.
    pub fn with_previous_result(mut self, mut result: BranchNodeResult) -> Self {
        result.collection.start_date = Utc::now();
        result.collection.end_date = None;
        result.running_actions.clear();
        self.current_result = result;
        self
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn parent_identifier(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    pub fn current_result(&self) -> &BranchNodeResult {
        &self.current_result
    }

    pub fn current_child(&self) -> Option<&NodeState> {
        self.current_child.as_deref()
    }

    /// Whether the session driven by this root state has ended
    pub fn is_finished(&self) -> bool {
        self.root.as_ref().is_some_and(|root| root.finished)
    }

    /// The deepest branch on the active path
    pub fn lowest_branch(&self) -> &BranchNodeState {
        match self.current_child.as_deref() {
            Some(NodeState::Branch(child)) => child.lowest_branch(),
            _ => self,
        }
    }

    /// The leaf currently presented to the host
    pub fn current_leaf(&self) -> Option<&LeafNodeState> {
        match self.current_child.as_deref()? {
            NodeState::Branch(child) => child.current_leaf(),
            NodeState::Leaf(leaf) => Some(leaf),
        }
    }

    /// Mutable access to the presented leaf, e.g. to record an answer
    pub fn current_leaf_mut(&mut self) -> Option<&mut LeafNodeState> {
        match self.current_child.as_deref_mut()? {
            NodeState::Branch(child) => child.current_leaf_mut(),
            NodeState::Leaf(leaf) => Some(leaf),
        }
    }

    /// Progress of the presented node within its container
    pub fn progress(&self) -> Option<Progress> {
        let branch = self.lowest_branch();
        let child = branch.current_child.as_deref()?;
        branch
            .navigator
            .progress(child.node(), &branch.current_result)
    }

    /// Whether a forward move stays inside the assessment
    pub fn has_node_after(&self) -> bool {
        let Some(child) = self.current_child.as_deref() else {
            return false;
        };
        if let NodeState::Branch(branch) = child {
            if branch.has_node_after() {
                return true;
            }
        }
        self.navigator
            .has_node_after(child.node(), &self.current_result)
    }

    /// Whether a backward move stays inside the assessment
    pub fn allow_back_navigation(&self) -> bool {
        let Some(child) = self.current_child.as_deref() else {
            return false;
        };
        if let NodeState::Branch(branch) = child {
            if branch.allow_back_navigation() {
                return true;
            }
        }
        self.navigator
            .allow_back_navigation(child.node(), &self.current_result)
    }

    // ------------------------------------------------------------------------
    // Root entry points
    // ------------------------------------------------------------------------

    /// Move forward from the presented node.
    ///
    /// Requested permissions and async action navigations are threaded down
    /// the active path internally and handed to the controller.
    pub fn go_forward(&mut self) -> AppResult<()> {
        self.drive(Direction::Forward)
    }

    /// Move backward from the presented node. Navigations are threaded
    /// internally as in [`BranchNodeState::go_forward`].
    pub fn go_backward(&mut self) -> AppResult<()> {
        self.drive(Direction::Backward)
    }

    /// End the session from wherever it stands. Every running background
    /// action on the active path is stopped.
    pub fn exit_early(&mut self, reason: FinishedReason) -> AppResult<()> {
        let mut controller = self.take_controller()?;
        info!(assessment = %self.node.identifier, reason = %reason, "Exiting early");
        let pending = self.collect_exit(Vec::new());
        self.finish_session(reason, pending, None, controller.as_mut());
        self.restore_controller(controller);
        Ok(())
    }

    fn drive(&mut self, direction: Direction) -> AppResult<()> {
        let mut controller = self.take_controller()?;
        let outcome = self.step(direction, controller.as_mut());
        let result = self.resolve(outcome, controller.as_mut());
        self.restore_controller(controller);
        result
    }

    fn take_controller(&mut self) -> NavigationResult<Box<dyn RootNodeController>> {
        let identifier = self.node.identifier.clone();
        let root = self.root.as_mut().ok_or(NavigationError::MissingController)?;
        if root.finished {
            return Err(NavigationError::SessionFinished { identifier });
        }
        root.controller
            .take()
            .ok_or(NavigationError::MissingController)
    }

    fn restore_controller(&mut self, controller: Box<dyn RootNodeController>) {
        if let Some(root) = self.root.as_mut() {
            root.controller = Some(controller);
        }
    }

    fn resolve(
        &mut self,
        outcome: NavigationResult<BranchOutcome>,
        controller: &mut dyn RootNodeController,
    ) -> AppResult<()> {
        match outcome {
            Ok(BranchOutcome::Presented { ready_to_save }) => {
                if ready_to_save {
                    self.send_ready_to_save(FinishedReason::Complete, controller);
                }
                Ok(())
            }
            Ok(BranchOutcome::Finished { direction, pending }) => {
                let reason = match direction {
                    Direction::Forward => FinishedReason::Complete,
                    _ => FinishedReason::EarlyExit,
                };
                let pending = self.collect_exit(pending);
                self.finish_session(reason, pending, None, controller);
                Ok(())
            }
            Ok(BranchOutcome::Exit { pending }) => {
                let pending = self.collect_exit(pending);
                self.finish_session(FinishedReason::EarlyExit, pending, None, controller);
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                error!(assessment = %self.node.identifier, error = %err, "Navigation failed");
                let pending = self.collect_exit(Vec::new());
                self.finish_session(FinishedReason::Error, pending, Some(&err), controller);
                Err(err)
            }
        }
    }

    fn send_ready_to_save(&mut self, reason: FinishedReason, controller: &mut dyn RootNodeController) {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        if root.ready_to_save_sent {
            return;
        }
        root.ready_to_save_sent = true;
        debug!(assessment = %self.node.identifier, reason = %reason, "Ready to save");
        controller.handle_ready_to_save(reason, self);
    }

    fn finish_session(
        &mut self,
        reason: FinishedReason,
        pending: Vec<AsyncActionNavigation>,
        error: Option<&AppError>,
        controller: &mut dyn RootNodeController,
    ) {
        self.current_result
            .collection
            .end_date
            .get_or_insert_with(Utc::now);
        if reason.save_results() != SaveResults::Never {
            self.send_ready_to_save(reason, controller);
        }
        if let Some(root) = self.root.as_mut() {
            root.finished = true;
        }
        info!(
            assessment = %self.node.identifier,
            reason = %reason,
            visited = self.current_result.path.len(),
            "Assessment session finished"
        );
        controller.handle_finished(reason, self, &pending, error);
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Route a move to the deepest branch, then let each level react to
    /// the outcome on the way back up.
    fn step(
        &mut self,
        direction: Direction,
        controller: &mut dyn RootNodeController,
    ) -> NavigationResult<BranchOutcome> {
        if let Some(NodeState::Branch(child)) = self.current_child.as_deref_mut() {
            let outcome = child.step(direction, controller)?;
            return self.handle_child_outcome(outcome, controller);
        }
        self.move_to_next(direction, None, Vec::new(), controller)
    }

    fn move_to_next(
        &mut self,
        direction: Direction,
        requested_permissions: Option<Vec<PermissionInfo>>,
        pending: Vec<AsyncActionNavigation>,
        controller: &mut dyn RootNodeController,
    ) -> NavigationResult<BranchOutcome> {
        let current = self.append_child_result_if_needed();
        let point = match direction {
            Direction::Backward => self
                .navigator
                .node_before(current.as_deref(), &self.current_result)?,
            _ => self
                .navigator
                .node_after(current.as_deref(), &self.current_result)?,
        };

        self.current_result = point.branch_result;
        let navigations = merge_navigations(pending, point.async_action_navigations);
        let permissions = point.requested_permissions.or(requested_permissions);

        match point.node {
            Some(node) => self.move_to(node, point.direction, permissions, navigations, controller),
            None => Ok(self.finish(point.direction, navigations)),
        }
    }

    fn move_to(
        &mut self,
        node: Arc<Node>,
        direction: Direction,
        requested_permissions: Option<Vec<PermissionInfo>>,
        navigations: Vec<AsyncActionNavigation>,
        controller: &mut dyn RootNodeController,
    ) -> NavigationResult<BranchOutcome> {
        self.current_result.append_path(&node.identifier, direction);
        debug!(
            branch = %self.node.identifier,
            node = %node.identifier,
            direction = %direction,
            "Moving to node"
        );

        match self.node_state_for(&node, controller)? {
            NodeState::Leaf(leaf) => {
                let completes = leaf.node.is_completion()
                    && !self
                        .navigator
                        .has_node_after(&leaf.node, &self.current_result);
                self.current_child = Some(Box::new(NodeState::Leaf(leaf)));
                if let Some(NodeState::Leaf(leaf)) = self.current_child.as_deref() {
                    let permissions = requested_permissions.as_deref();
                    match direction {
                        Direction::Backward => {
                            controller.handle_go_backward(leaf, permissions, &navigations)
                        }
                        _ => controller.handle_go_forward(leaf, permissions, &navigations),
                    }
                }
                Ok(BranchOutcome::Presented {
                    ready_to_save: completes,
                })
            }
            NodeState::Branch(mut branch) => {
                let outcome =
                    branch.move_to_next(direction, requested_permissions, navigations, controller)?;
                self.current_child = Some(Box::new(NodeState::Branch(branch)));
                self.handle_child_outcome(outcome, controller)
            }
        }
    }

    fn handle_child_outcome(
        &mut self,
        outcome: BranchOutcome,
        controller: &mut dyn RootNodeController,
    ) -> NavigationResult<BranchOutcome> {
        match outcome {
            BranchOutcome::Presented { ready_to_save } => {
                let child_is_last = self
                    .current_child
                    .as_deref()
                    .map(|child| {
                        !self
                            .navigator
                            .has_node_after(child.node(), &self.current_result)
                    })
                    .unwrap_or(true);
                Ok(BranchOutcome::Presented {
                    ready_to_save: ready_to_save && child_is_last,
                })
            }
            BranchOutcome::Finished { direction, pending } => {
                self.move_to_next(direction, None, pending, controller)
            }
            BranchOutcome::Exit { pending } => Ok(BranchOutcome::Exit {
                pending: self.exit_navigations(pending),
            }),
        }
    }

    /// The navigator found no node in `direction`.
    fn finish(
        &mut self,
        direction: Direction,
        navigations: Vec<AsyncActionNavigation>,
    ) -> BranchOutcome {
        self.current_result.collection.end_date = Some(Utc::now());
        debug!(branch = %self.node.identifier, direction = %direction, "Branch finished");
        match direction {
            Direction::Exit => BranchOutcome::Exit {
                pending: self.exit_navigations(navigations),
            },
            direction => {
                // Leaving in either direction stops whatever is still running.
                let stops = stop_all_actions(&self.node, &mut self.current_result);
                BranchOutcome::Finished {
                    direction,
                    pending: merge_navigations(navigations, stops.into_iter().collect()),
                }
            }
        }
    }

    /// Close this level for an exit and add stops for everything of this
    /// container that is still running.
    fn exit_navigations(&mut self, pending: Vec<AsyncActionNavigation>) -> Vec<AsyncActionNavigation> {
        self.append_child_result_if_needed();
        self.current_result
            .collection
            .end_date
            .get_or_insert_with(Utc::now);
        let stops = stop_all_actions(&self.node, &mut self.current_result);
        merge_navigations(pending, stops.into_iter().collect())
    }

    /// Close every level of the active path, deepest first.
    fn collect_exit(&mut self, pending: Vec<AsyncActionNavigation>) -> Vec<AsyncActionNavigation> {
        let pending = match self.current_child.as_deref_mut() {
            Some(NodeState::Branch(child)) => child.collect_exit(pending),
            _ => pending,
        };
        self.exit_navigations(pending)
    }

    /// Store the current child's result in this branch's collection and
    /// return the child's node.
    fn append_child_result_if_needed(&mut self) -> Option<Arc<Node>> {
        let child = self.current_child.as_deref_mut()?;
        child.close();
        let result = child.result();
        let node = child.node().clone();
        self.current_result.append_input_result(result);
        Some(node)
    }

    /// Result recorded by an earlier visit to `node`
    pub fn previous_result(&self, node: &Node) -> Option<&ResultData> {
        self.current_result.child_result(node.result_id())
    }

    fn node_state_for(
        &self,
        node: &Arc<Node>,
        controller: &mut dyn RootNodeController,
    ) -> NavigationResult<NodeState> {
        if let Some(state) = controller.custom_node_state_for(node, self) {
            return Ok(state);
        }

        let previous = self.previous_result(node).cloned();
        if controller.can_handle(node) {
            let leaf = LeafNodeState::new(node.clone(), Some(self));
            return Ok(NodeState::Leaf(match previous {
                Some(result) => leaf.with_previous_result(result),
                None => leaf,
            }));
        }

        if node.is_container() {
            let branch = BranchNodeState::new(node.clone(), Some(self))?;
            return Ok(NodeState::Branch(match previous {
                Some(ResultData::Branch(result)) => branch.with_previous_result(result),
                _ => branch,
            }));
        }

        Err(NavigationError::NoNodeState {
            identifier: node.identifier.clone(),
        })
    }
}
