use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{AsyncActionConfiguration, Node};
use crate::results::{BranchNodeResult, Direction};

/// Background actions to start and stop for one move, scoped to the
/// container that declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncActionNavigation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub start_actions: BTreeSet<AsyncActionConfiguration>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub stop_actions: BTreeSet<AsyncActionConfiguration>,
}

impl AsyncActionNavigation {
    pub fn new(section_identifier: Option<String>) -> Self {
        Self {
            section_identifier,
            start_actions: BTreeSet::new(),
            stop_actions: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_actions.is_empty() && self.stop_actions.is_empty()
    }

    /// Fold a later navigation for the same section into this one.
    ///
    /// A later stop cancels an earlier start and a later start cancels an
    /// earlier stop.
    pub fn union(&mut self, later: &AsyncActionNavigation) {
        let start: BTreeSet<_> = self
            .start_actions
            .union(&later.start_actions)
            .filter(|action| !later.stop_actions.contains(*action))
            .cloned()
            .collect();
        let stop: BTreeSet<_> = self
            .stop_actions
            .union(&later.stop_actions)
            .filter(|action| !later.start_actions.contains(*action))
            .cloned()
            .collect();
        self.start_actions = start;
        self.stop_actions = stop;
    }
}

/// Merge two lists of navigations, keyed by section identifier. Order of
/// first appearance is kept and empty entries are dropped.
pub fn merge_navigations(
    existing: Vec<AsyncActionNavigation>,
    later: Vec<AsyncActionNavigation>,
) -> Vec<AsyncActionNavigation> {
    let mut merged = existing;
    for navigation in later {
        match merged
            .iter_mut()
            .find(|entry| entry.section_identifier == navigation.section_identifier)
        {
            Some(entry) => entry.union(&navigation),
            None => merged.push(navigation),
        }
    }
    merged.retain(|navigation| !navigation.is_empty());
    merged
}

type ActionSet<'a> = BTreeSet<&'a AsyncActionConfiguration>;

/// Start/stop sets for the boundary `previous -> next`, given what is
/// running. `next == None` means the container is being left and
/// `previous == None` that it is being entered.
fn boundary<'a>(
    actions: &'a [AsyncActionConfiguration],
    running: &BTreeSet<AsyncActionConfiguration>,
    previous: Option<&str>,
    next: Option<&str>,
    direction: Direction,
) -> (ActionSet<'a>, ActionSet<'a>) {
    let stop: ActionSet<'a> = actions
        .iter()
        .filter(|action| running.contains(*action))
        .filter(|action| match (direction, next, previous) {
            (Direction::Exit, _, _) | (_, None, _) => true,
            (_, Some(_), None) => false,
            (Direction::Forward, Some(_), Some(previous)) => {
                action.stop_step_identifier.as_deref() == Some(previous)
            }
            // Going back over the start step un-visits it.
            (Direction::Backward, Some(_), Some(previous)) => {
                action.start_step_identifier.as_deref() == Some(previous)
            }
        })
        .collect();

    let start: ActionSet<'a> = match (direction, next) {
        (Direction::Exit, _) | (_, None) => BTreeSet::new(),
        (Direction::Forward, Some(next)) => actions
            .iter()
            .filter(|action| match action.start_step_identifier.as_deref() {
                Some(start) => start == next,
                None => previous.is_none(),
            })
            .filter(|action| !running.contains(*action) || stop.contains(action))
            .collect(),
        // Backward moves only start actions when re-entering the container.
        (Direction::Backward, Some(next)) => actions
            .iter()
            .filter(|_| previous.is_none())
            .filter(|action| match action.start_step_identifier.as_deref() {
                Some(start) => start == next,
                None => true,
            })
            .filter(|action| !running.contains(*action))
            .collect(),
    };

    (start, stop)
}

/// Compute the navigation for moving from `previous` to `next` inside
/// `container` and apply it to the running set stored on `branch_result`.
/// Returns `None` when nothing starts or stops.
pub fn async_action_navigation(
    container: &Node,
    previous: Option<&Node>,
    next: Option<&Node>,
    direction: Direction,
    branch_result: &mut BranchNodeResult,
) -> Option<AsyncActionNavigation> {
    let actions = container.background_actions();
    if actions.is_empty() {
        return None;
    }

    let previous_id = previous.map(|node| node.identifier.as_str());
    let next_id = next.map(|node| node.identifier.as_str());
    let (start, stop) = boundary(
        actions,
        &branch_result.running_actions,
        previous_id,
        next_id,
        direction,
    );

    let navigation = AsyncActionNavigation {
        section_identifier: Some(container.identifier.clone()),
        start_actions: start.into_iter().cloned().collect(),
        stop_actions: stop.into_iter().cloned().collect(),
    };
    let running = &mut branch_result.running_actions;
    running.retain(|action| !navigation.stop_actions.contains(action));
    running.extend(navigation.start_actions.iter().cloned());
    (!navigation.is_empty()).then_some(navigation)
}

/// Stop everything of `container` that is still running and clear the
/// running set.
pub fn stop_all_actions(
    container: &Node,
    branch_result: &mut BranchNodeResult,
) -> Option<AsyncActionNavigation> {
    if branch_result.running_actions.is_empty() {
        return None;
    }
    let mut navigation = AsyncActionNavigation::new(Some(container.identifier.clone()));
    navigation.stop_actions = std::mem::take(&mut branch_result.running_actions);
    Some(navigation)
}
