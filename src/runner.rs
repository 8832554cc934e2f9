//! Scripted session runner.
//!
//! [`run_scripted`] drives an assessment forward from start to finish,
//! answering each question from a map keyed by result identifier. It backs
//! the `assessment-navigator` binary and doubles as a reference host.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::NavigationConfig;
use crate::error::{AppError, AppResult};
use crate::model::{Node, PermissionInfo};
use crate::navigation::{
    merge_navigations, AsyncActionNavigation, BranchNodeState, FinishedReason, LeafNodeState,
    RootNodeController,
};
use crate::results::BranchNodeResult;

/// Everything a scripted controller observed during a session.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLog {
    /// Identifiers of presented nodes, in order.
    pub presented: Vec<String>,
    pub requested_permissions: Vec<PermissionInfo>,
    /// Background action changes, merged per section.
    pub async_action_navigations: Vec<AsyncActionNavigation>,
    pub ready_to_save: Option<FinishedReason>,
    pub finished: Option<FinishedReason>,
    pub error: Option<String>,
}

/// Controller that records callbacks into a shared [`SessionLog`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedController {
    log: Rc<RefCell<SessionLog>>,
}

impl ScriptedController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the log, still readable after the controller is moved into
    /// a root state.
    pub fn log(&self) -> Rc<RefCell<SessionLog>> {
        Rc::clone(&self.log)
    }

    fn record(
        &mut self,
        node_state: &LeafNodeState,
        requested_permissions: Option<&[PermissionInfo]>,
        async_action_navigations: &[AsyncActionNavigation],
    ) {
        let mut log = self.log.borrow_mut();
        log.presented.push(node_state.node().identifier.clone());
        if let Some(permissions) = requested_permissions {
            log.requested_permissions.extend_from_slice(permissions);
        }
        let existing = std::mem::take(&mut log.async_action_navigations);
        log.async_action_navigations =
            merge_navigations(existing, async_action_navigations.to_vec());
    }
}

impl RootNodeController for ScriptedController {
    fn handle_go_forward(
        &mut self,
        node_state: &LeafNodeState,
        requested_permissions: Option<&[PermissionInfo]>,
        async_action_navigations: &[AsyncActionNavigation],
    ) {
        debug!(node = %node_state.node().identifier, "Presenting node");
        self.record(node_state, requested_permissions, async_action_navigations);
    }

    fn handle_go_backward(
        &mut self,
        node_state: &LeafNodeState,
        requested_permissions: Option<&[PermissionInfo]>,
        async_action_navigations: &[AsyncActionNavigation],
    ) {
        debug!(node = %node_state.node().identifier, "Presenting node (backward)");
        self.record(node_state, requested_permissions, async_action_navigations);
    }

    fn handle_ready_to_save(&mut self, reason: FinishedReason, _node_state: &BranchNodeState) {
        self.log.borrow_mut().ready_to_save = Some(reason);
    }

    fn handle_finished(
        &mut self,
        reason: FinishedReason,
        _node_state: &BranchNodeState,
        async_action_navigations: &[AsyncActionNavigation],
        error: Option<&AppError>,
    ) {
        let mut log = self.log.borrow_mut();
        let existing = std::mem::take(&mut log.async_action_navigations);
        log.async_action_navigations =
            merge_navigations(existing, async_action_navigations.to_vec());
        log.finished = Some(reason);
        log.error = error.map(|e| e.to_string());
    }
}

/// Outcome of a scripted run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub reason: FinishedReason,
    pub steps: usize,
    pub result: BranchNodeResult,
    pub log: SessionLog,
}

/// Drive `node` forward until the session finishes.
///
/// Before each move the presented question is answered from `answers`,
/// looked up by result identifier and then by node identifier. Questions
/// without an entry are left unanswered.
///
/// # Errors
/// Returns navigation errors from the engine, and [`AppError::Internal`]
/// when the session does not finish within `max_steps` moves.
pub fn run_scripted(
    node: Arc<Node>,
    answers: &BTreeMap<String, Value>,
    config: &NavigationConfig,
    max_steps: usize,
) -> AppResult<RunReport> {
    let controller = ScriptedController::new();
    let log = controller.log();
    let mut root = BranchNodeState::new_root_with_config(node, Box::new(controller), config.clone())?;

    let mut steps = 0;
    while !root.is_finished() {
        if steps >= max_steps {
            warn!(max_steps, "Step budget exhausted, ending session");
            root.exit_early(FinishedReason::Error)?;
            return Err(AppError::Internal {
                message: format!("Assessment did not finish within {} steps", max_steps),
            });
        }
        if let Some(leaf) = root.current_leaf_mut() {
            answer_from_script(leaf, answers);
        }
        root.go_forward()?;
        steps += 1;
    }

    let log = log.borrow().clone();
    let reason = log.finished.unwrap_or(FinishedReason::Error);
    info!(
        assessment = %root.node().identifier,
        reason = %reason,
        steps,
        "Scripted run complete"
    );
    Ok(RunReport {
        reason,
        steps,
        result: root.current_result().clone(),
        log,
    })
}

fn answer_from_script(leaf: &mut LeafNodeState, answers: &BTreeMap<String, Value>) {
    if leaf.node().answer_type().is_none() {
        return;
    }
    let answer = answers
        .get(leaf.node().result_id())
        .or_else(|| answers.get(&leaf.node().identifier));
    if let Some(answer) = answer {
        if !leaf.set_answer(answer.clone()) {
            warn!(node = %leaf.node().identifier, "Scripted answer rejected");
        }
    }
}
