//! Navigation session tests
//!
//! These tests drive complete sessions through `BranchNodeState` and check
//! what the host observes through its `RootNodeController`.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use assessment_navigator::error::{AppError, NavigationError, NavigationResult, RuleError};
use assessment_navigator::model::{AnswerType, AsyncActionConfiguration, Node, PermissionInfo};
use assessment_navigator::navigation::{
    AsyncActionNavigation, BranchNodeState, FinishedReason, LeafNodeState, NavigationPoint,
    Navigator, NodeState, Progress, RootNodeController, SurveyRule, SurveyRuleOperator,
};
use assessment_navigator::results::{BranchNodeResult, Direction, PathMarker, ResultData};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ============================================================================
// Test Controller
// ============================================================================

#[derive(Debug, Default)]
struct Log {
    events: Vec<String>,
    navigations: Vec<(String, Vec<AsyncActionNavigation>)>,
    error: Option<String>,
}

#[derive(Default)]
struct Recorder {
    log: Rc<RefCell<Log>>,
    reverse_sections: bool,
}

impl Recorder {
    fn record(&mut self, event: String, navigations: &[AsyncActionNavigation]) {
        let mut log = self.log.borrow_mut();
        if !navigations.is_empty() {
            log.navigations.push((event.clone(), navigations.to_vec()));
        }
        log.events.push(event);
    }
}

impl RootNodeController for Recorder {
    fn custom_node_state_for(
        &mut self,
        node: &Arc<Node>,
        parent: &BranchNodeState,
    ) -> Option<NodeState> {
        if !self.reverse_sections || node.identifier != "S" {
            return None;
        }
        let navigator = ReverseNavigator {
            container: node.clone(),
        };
        let state = BranchNodeState::new(node.clone(), Some(parent))
            .ok()?
            .with_navigator(Box::new(navigator));
        Some(NodeState::Branch(state))
    }

    fn handle_go_forward(
        &mut self,
        node_state: &LeafNodeState,
        _requested_permissions: Option<&[PermissionInfo]>,
        async_action_navigations: &[AsyncActionNavigation],
    ) {
        let event = format!("forward:{}", node_state.node().identifier);
        self.record(event, async_action_navigations);
    }

    fn handle_go_backward(
        &mut self,
        node_state: &LeafNodeState,
        _requested_permissions: Option<&[PermissionInfo]>,
        async_action_navigations: &[AsyncActionNavigation],
    ) {
        let event = format!("backward:{}", node_state.node().identifier);
        self.record(event, async_action_navigations);
    }

    fn handle_ready_to_save(&mut self, reason: FinishedReason, _node_state: &BranchNodeState) {
        self.log.borrow_mut().events.push(format!("ready:{}", reason));
    }

    fn handle_finished(
        &mut self,
        reason: FinishedReason,
        _node_state: &BranchNodeState,
        async_action_navigations: &[AsyncActionNavigation],
        error: Option<&AppError>,
    ) {
        self.record(format!("finished:{}", reason), async_action_navigations);
        self.log.borrow_mut().error = error.map(|e| e.to_string());
    }
}

/// Visits a container's children last to first.
#[derive(Debug)]
struct ReverseNavigator {
    container: Arc<Node>,
}

impl ReverseNavigator {
    fn children(&self) -> &[Arc<Node>] {
        self.container.children().unwrap_or(&[])
    }

    fn point(
        &self,
        node: Option<Arc<Node>>,
        result: &BranchNodeResult,
        direction: Direction,
    ) -> NavigationPoint {
        NavigationPoint {
            node,
            branch_result: result.clone(),
            direction,
            requested_permissions: None,
            async_action_navigations: Vec::new(),
        }
    }
}

impl Navigator for ReverseNavigator {
    fn node(&self, identifier: &str) -> Option<Arc<Node>> {
        self.container.child(identifier).cloned()
    }

    fn node_after(
        &self,
        current: Option<&Node>,
        branch_result: &BranchNodeResult,
    ) -> NavigationResult<NavigationPoint> {
        let children = self.children();
        let node = match current {
            None => children.last().cloned(),
            Some(current) => children
                .iter()
                .position(|child| child.identifier == current.identifier)
                .and_then(|index| index.checked_sub(1))
                .map(|index| children[index].clone()),
        };
        Ok(self.point(node, branch_result, Direction::Forward))
    }

    fn node_before(
        &self,
        current: Option<&Node>,
        branch_result: &BranchNodeResult,
    ) -> NavigationResult<NavigationPoint> {
        let children = self.children();
        let node = current.and_then(|current| {
            children
                .iter()
                .position(|child| child.identifier == current.identifier)
                .and_then(|index| children.get(index + 1).cloned())
        });
        Ok(self.point(node, branch_result, Direction::Backward))
    }

    fn progress(&self, _current: &Node, _branch_result: &BranchNodeResult) -> Option<Progress> {
        None
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn start(root: Node) -> (BranchNodeState, Rc<RefCell<Log>>) {
    start_with(root, Recorder::default())
}

fn start_with(root: Node, recorder: Recorder) -> (BranchNodeState, Rc<RefCell<Log>>) {
    let log = Rc::clone(&recorder.log);
    let state = BranchNodeState::new_root(root.into_shared(), Box::new(recorder)).unwrap();
    (state, log)
}

fn events(log: &Rc<RefCell<Log>>) -> Vec<String> {
    log.borrow().events.clone()
}

fn answer(state: &mut BranchNodeState, value: Value) {
    assert!(state.current_leaf_mut().unwrap().set_answer(value));
}

fn current_id(state: &BranchNodeState) -> String {
    state.current_leaf().unwrap().node().identifier.clone()
}

/// Times `action` was started and stopped across every recorded navigation.
fn tally(log: &Rc<RefCell<Log>>, action: &AsyncActionConfiguration) -> (usize, usize) {
    let log = log.borrow();
    let all = log.navigations.iter().flat_map(|(_, navigations)| navigations);
    all.fold((0, 0), |(started, stopped), navigation| {
        (
            started + navigation.start_actions.contains(action) as usize,
            stopped + navigation.stop_actions.contains(action) as usize,
        )
    })
}

fn navigation_events(log: &Rc<RefCell<Log>>) -> Vec<String> {
    log.borrow()
        .navigations
        .iter()
        .map(|(event, _)| event.clone())
        .collect()
}

/// A asks yes/no; "no" skips B.
fn skip_survey() -> Node {
    Node::assessment(
        "survey",
        vec![
            Node::question("A", AnswerType::String).with_survey_rules(vec![SurveyRule::new(
                json!("no"),
                SurveyRuleOperator::Equal,
                "C",
            )]),
            Node::instruction("B"),
            Node::completion("C"),
        ],
    )
}

// ============================================================================
// Forward Navigation
// ============================================================================

#[test]
fn test_skip_rule_records_path() {
    let (mut state, log) = start(skip_survey());
    state.go_forward().unwrap();
    answer(&mut state, json!("no"));
    state.go_forward().unwrap();

    assert_eq!(current_id(&state), "C");
    assert_eq!(
        state.current_result().path,
        vec![
            PathMarker::new("A", Direction::Forward),
            PathMarker::new("C", Direction::Forward),
        ]
    );
    assert_eq!(events(&log)[..2].to_vec(), vec!["forward:A", "forward:C"]);
}

#[test]
fn test_rule_jumping_to_itself_is_logged_each_time() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::question("A", AnswerType::String)
                .with_survey_rules(vec![SurveyRule::skip("A")]),
            Node::instruction("B"),
        ],
    );
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    state.go_forward().unwrap();

    assert_eq!(current_id(&state), "A");
    assert_eq!(
        state.current_result().path,
        vec![
            PathMarker::new("A", Direction::Forward),
            PathMarker::new("A", Direction::Forward),
        ]
    );
    assert_eq!(events(&log), vec!["forward:A", "forward:A"]);
}

#[test]
fn test_non_matching_answer_follows_sibling_order() {
    let (mut state, _log) = start(skip_survey());
    state.go_forward().unwrap();
    answer(&mut state, json!("yes"));
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "B");
}

#[test]
fn test_completion_sends_ready_to_save_once() {
    let (mut state, log) = start(skip_survey());
    state.go_forward().unwrap();
    answer(&mut state, json!("no"));
    state.go_forward().unwrap();
    state.go_forward().unwrap();

    assert!(state.is_finished());
    assert_eq!(
        events(&log),
        vec!["forward:A", "forward:C", "ready:complete", "finished:complete"]
    );
    assert!(state.current_result().collection.end_date.is_some());
}

#[test]
fn test_direct_rule_takes_precedence() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::question("A", AnswerType::Integer)
                .with_next_node("C")
                .with_survey_rules(vec![SurveyRule::always("B")]),
            Node::instruction("B"),
            Node::instruction("C"),
        ],
    );
    let (mut state, _log) = start(root);
    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "C");
}

#[test]
fn test_decimal_rule_uses_rounding() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::question(
                "weight",
                AnswerType::Decimal {
                    significant_digits: Some(1),
                },
            )
            .with_survey_rules(vec![SurveyRule::new(
                json!(70.0),
                SurveyRuleOperator::Equal,
                "done",
            )]),
            Node::instruction("followUp"),
            Node::instruction("done"),
        ],
    );
    let (mut state, _log) = start(root);
    state.go_forward().unwrap();
    answer(&mut state, json!(70.04));
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "done");
}

#[test]
fn test_exit_jump_finishes_early() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::instruction("A").with_next_node("Exit"),
            Node::instruction("B"),
        ],
    );
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    state.go_forward().unwrap();

    assert!(state.is_finished());
    assert_eq!(
        events(&log),
        vec!["forward:A", "ready:early_exit", "finished:early_exit"]
    );
}

#[test]
fn test_exit_from_inside_section() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::section("S", vec![Node::instruction("S1").with_next_node("exit")]),
            Node::instruction("B"),
        ],
    );
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    state.go_forward().unwrap();

    assert!(state.is_finished());
    assert_eq!(events(&log).last().unwrap(), "finished:early_exit");
    assert!(!events(&log).contains(&"forward:B".to_string()));
}

// ============================================================================
// Sections
// ============================================================================

fn sectioned() -> Node {
    Node::assessment(
        "survey",
        vec![
            Node::instruction("intro"),
            Node::section("S", vec![Node::instruction("S1"), Node::instruction("S2")]),
            Node::instruction("end"),
        ],
    )
}

#[test]
fn test_sections_are_navigated_into() {
    let (mut state, log) = start(sectioned());
    for _ in 0..4 {
        state.go_forward().unwrap();
    }
    assert_eq!(
        events(&log),
        vec!["forward:intro", "forward:S1", "forward:S2", "forward:end"]
    );

    let result = state.current_result();
    assert_eq!(
        result.path,
        vec![
            PathMarker::new("intro", Direction::Forward),
            PathMarker::new("S", Direction::Forward),
            PathMarker::new("end", Direction::Forward),
        ]
    );
    let Some(ResultData::Branch(section)) = result.child_result("S") else {
        panic!("section result missing");
    };
    assert_eq!(section.path.len(), 2);
    assert!(section.child_result("S2").is_some());
}

#[test]
fn test_backward_reenters_section_at_last_node() {
    let (mut state, log) = start(sectioned());
    for _ in 0..4 {
        state.go_forward().unwrap();
    }
    state.go_backward().unwrap();
    assert_eq!(current_id(&state), "S2");
    assert_eq!(events(&log).last().unwrap(), "backward:S2");

    state.go_backward().unwrap();
    assert_eq!(current_id(&state), "S1");
}

#[test]
fn test_next_section_leaves_container() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::section(
                "S",
                vec![
                    Node::instruction("S1").with_next_node("nextSection"),
                    Node::instruction("S2"),
                ],
            ),
            Node::instruction("end"),
        ],
    );
    let (mut state, _log) = start(root);
    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "end");
}

#[test]
fn test_has_node_after_spans_levels() {
    let (mut state, _log) = start(sectioned());
    state.go_forward().unwrap();
    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "S2");
    assert!(state.has_node_after());
    assert!(state.allow_back_navigation());

    state.go_forward().unwrap();
    assert!(!state.has_node_after());
}

// ============================================================================
// Backward Navigation
// ============================================================================

#[test]
fn test_backward_from_first_node_exits() {
    let (mut state, log) = start(skip_survey());
    state.go_forward().unwrap();
    assert!(!state.allow_back_navigation());
    state.go_backward().unwrap();

    assert!(state.is_finished());
    assert_eq!(
        events(&log),
        vec!["forward:A", "ready:early_exit", "finished:early_exit"]
    );
}

#[test]
fn test_forward_then_backward_returns_to_same_node() {
    let (mut state, log) = start(skip_survey());
    state.go_forward().unwrap();
    answer(&mut state, json!("yes"));
    state.go_forward().unwrap();
    state.go_backward().unwrap();

    assert_eq!(current_id(&state), "A");
    assert_eq!(events(&log), vec!["forward:A", "forward:B", "backward:A"]);
    assert_eq!(state.current_leaf().unwrap().answer(), Some(&json!("yes")));
}

#[test]
fn test_backward_follows_path_after_skip() {
    let (mut state, _log) = start(skip_survey());
    state.go_forward().unwrap();
    answer(&mut state, json!("no"));
    state.go_forward().unwrap();
    state.go_backward().unwrap();
    assert_eq!(current_id(&state), "A");
}

#[test]
fn test_revisit_keeps_history() {
    let (mut state, _log) = start(skip_survey());
    state.go_forward().unwrap();
    answer(&mut state, json!("yes"));
    state.go_forward().unwrap();
    state.go_backward().unwrap();
    answer(&mut state, json!("no"));
    state.go_forward().unwrap();

    assert_eq!(current_id(&state), "C");
    let result = state.current_result();
    assert_eq!(
        result.child_result("A").and_then(ResultData::answer_value),
        Some(&json!("no"))
    );
    assert_eq!(result.path_history_results[0].identifier(), "A");
    assert_eq!(
        result.path_history_results[0].answer_value(),
        Some(&json!("yes"))
    );
    assert_eq!(
        result.path.last(),
        Some(&PathMarker::new("C", Direction::Forward))
    );
}

// ============================================================================
// Progress
// ============================================================================

#[test]
fn test_progress_counts_siblings() {
    let (mut state, _log) = start(sectioned());
    state.go_forward().unwrap();
    assert_eq!(
        state.progress(),
        Some(Progress {
            current: 0,
            total: 3,
            is_estimated: false
        })
    );

    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert_eq!(
        state.progress(),
        Some(Progress {
            current: 1,
            total: 2,
            is_estimated: false
        })
    );
}

#[test]
fn test_progress_is_estimated_with_rules() {
    let (mut state, _log) = start(skip_survey());
    state.go_forward().unwrap();
    assert!(state.progress().unwrap().is_estimated);
}

#[test]
fn test_progress_markers() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::instruction("intro"),
            Node::instruction("m1"),
            Node::instruction("detail"),
            Node::instruction("m2"),
            Node::completion("outro"),
        ],
    )
    .with_progress_markers(vec!["m1".to_string(), "m2".to_string()]);
    let (mut state, _log) = start(root);

    state.go_forward().unwrap();
    assert_eq!(state.progress(), None);

    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "detail");
    assert_eq!(
        state.progress(),
        Some(Progress {
            current: 0,
            total: 2,
            is_estimated: false
        })
    );

    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "outro");
    assert_eq!(state.progress(), None);
}

// ============================================================================
// Background Actions
// ============================================================================

#[test]
fn test_async_actions_start_and_stop() {
    let motion = AsyncActionConfiguration::new("motion", "motion")
        .starting_at("B")
        .stopping_after("C");
    let root = Node::assessment(
        "survey",
        vec![
            Node::instruction("A"),
            Node::instruction("B"),
            Node::instruction("C"),
            Node::instruction("D"),
        ],
    )
    .with_background_actions(vec![motion.clone()]);
    let (mut state, log) = start(root);
    for _ in 0..4 {
        state.go_forward().unwrap();
    }

    let navigations = log.borrow().navigations.clone();
    assert_eq!(navigations.len(), 2);

    let (event, started) = &navigations[0];
    assert_eq!(event, "forward:B");
    assert_eq!(started[0].section_identifier.as_deref(), Some("survey"));
    assert!(started[0].start_actions.contains(&motion));
    assert!(started[0].stop_actions.is_empty());

    let (event, stopped) = &navigations[1];
    assert_eq!(event, "forward:D");
    assert!(stopped[0].stop_actions.contains(&motion));
}

#[test]
fn test_exit_stops_running_actions() {
    let recording = AsyncActionConfiguration::new("recording", "microphone");
    let root = Node::assessment(
        "survey",
        vec![
            Node::instruction("A"),
            Node::instruction("B").with_next_node("exit"),
            Node::instruction("C"),
        ],
    )
    .with_background_actions(vec![recording.clone()]);
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    state.go_forward().unwrap();
    state.go_forward().unwrap();

    let navigations = log.borrow().navigations.clone();
    let (event, started) = &navigations[0];
    assert_eq!(event, "forward:A");
    assert!(started[0].start_actions.contains(&recording));

    let (event, stopped) = navigations.last().unwrap();
    assert_eq!(event, "finished:early_exit");
    assert!(stopped[0].stop_actions.contains(&recording));
    assert!(stopped[0].start_actions.is_empty());
}

#[test]
fn test_exit_early_stops_actions_in_sections() {
    let recording = AsyncActionConfiguration::new("recording", "microphone");
    let root = Node::assessment(
        "survey",
        vec![Node::section("S", vec![Node::instruction("S1"), Node::instruction("S2")])
            .with_background_actions(vec![recording.clone()])],
    );
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    state.exit_early(FinishedReason::Declined).unwrap();

    assert!(state.is_finished());
    let log = log.borrow();
    assert_eq!(log.events.last().unwrap(), "finished:declined");
    assert!(!log.events.iter().any(|e| e.starts_with("ready:")));
    let (_, stopped) = log.navigations.last().unwrap();
    assert_eq!(stopped[0].section_identifier.as_deref(), Some("S"));
    assert!(stopped[0].stop_actions.contains(&recording));
}

fn sectioned_with_action(action: &AsyncActionConfiguration) -> Node {
    Node::assessment(
        "survey",
        vec![
            Node::instruction("intro"),
            Node::section("S", vec![Node::instruction("S1"), Node::instruction("S2")])
                .with_background_actions(vec![action.clone()]),
            Node::instruction("end"),
        ],
    )
}

#[test]
fn test_leaving_section_backward_stops_actions() {
    let recording = AsyncActionConfiguration::new("recording", "microphone");
    let (mut state, log) = start(sectioned_with_action(&recording));
    state.go_forward().unwrap();
    state.go_forward().unwrap();
    state.go_backward().unwrap();
    assert_eq!(current_id(&state), "intro");
    assert_eq!(tally(&log, &recording), (1, 1));

    {
        let log = log.borrow();
        let (event, stopped) = log.navigations.last().unwrap();
        assert_eq!(event, "backward:intro");
        assert_eq!(stopped[0].section_identifier.as_deref(), Some("S"));
        assert!(stopped[0].stop_actions.contains(&recording));
        assert!(stopped[0].start_actions.is_empty());
    }

    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "S1");
    assert_eq!(tally(&log, &recording), (2, 1));

    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "end");
    assert_eq!(tally(&log, &recording), (2, 2));
}

#[test]
fn test_reentering_section_backward_restarts_actions() {
    let recording = AsyncActionConfiguration::new("recording", "microphone");
    let (mut state, log) = start(sectioned_with_action(&recording));
    for _ in 0..4 {
        state.go_forward().unwrap();
    }
    state.go_backward().unwrap();
    assert_eq!(current_id(&state), "S2");
    state.go_forward().unwrap();

    assert_eq!(
        navigation_events(&log),
        vec!["forward:S1", "forward:end", "backward:S2", "forward:end"]
    );
    assert_eq!(tally(&log, &recording), (2, 2));
}

#[test]
fn test_back_past_start_step_then_forward() {
    let motion = AsyncActionConfiguration::new("motion", "motion")
        .starting_at("B")
        .stopping_after("C");
    let root = Node::assessment(
        "survey",
        vec![
            Node::instruction("A"),
            Node::instruction("B"),
            Node::instruction("C"),
        ],
    )
    .with_background_actions(vec![motion.clone()]);
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    state.go_forward().unwrap();
    state.go_backward().unwrap();
    assert_eq!(tally(&log, &motion), (1, 1));

    state.go_forward().unwrap();
    assert_eq!(current_id(&state), "B");
    assert_eq!(tally(&log, &motion), (2, 1));

    state.go_forward().unwrap();
    state.go_forward().unwrap();
    assert!(state.is_finished());
    assert_eq!(
        navigation_events(&log),
        vec!["forward:B", "backward:A", "forward:B", "finished:complete"]
    );
    assert_eq!(tally(&log, &motion), (2, 2));
}

#[test]
fn test_start_and_stop_on_same_step_are_disjoint() {
    let tap = AsyncActionConfiguration::new("tap", "motion")
        .starting_at("B")
        .stopping_after("B");
    let root = Node::assessment(
        "survey",
        vec![
            Node::instruction("A"),
            Node::instruction("B"),
            Node::instruction("C"),
        ],
    )
    .with_background_actions(vec![tap.clone()]);
    let (mut state, log) = start(root);
    for _ in 0..4 {
        state.go_forward().unwrap();
    }

    assert_eq!(navigation_events(&log), vec!["forward:B", "forward:C"]);
    assert_eq!(tally(&log, &tap), (1, 1));
    for (event, navigations) in log.borrow().navigations.iter() {
        for navigation in navigations {
            assert!(
                navigation.start_actions.is_disjoint(&navigation.stop_actions),
                "{} both starts and stops",
                event
            );
        }
    }
}

// ============================================================================
// Errors and Customization
// ============================================================================

#[test]
fn test_rule_error_finishes_with_error() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::question("A", AnswerType::Boolean).with_survey_rules(vec![SurveyRule::new(
                json!(true),
                SurveyRuleOperator::GreaterThan,
                "C",
            )]),
            Node::instruction("B"),
            Node::instruction("C"),
        ],
    );
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    answer(&mut state, json!(true));

    let err = state.go_forward().unwrap_err();
    assert!(matches!(
        err,
        AppError::Navigation(NavigationError::Rule(RuleError::Incomparable { .. }))
    ));
    assert!(state.is_finished());
    assert_eq!(events(&log).last().unwrap(), "finished:error");
    assert!(log.borrow().error.is_some());
}

#[test]
fn test_custom_node_state_with_custom_navigator() {
    let root = Node::assessment(
        "survey",
        vec![
            Node::section(
                "S",
                vec![
                    Node::instruction("S1"),
                    Node::instruction("S2"),
                    Node::instruction("S3"),
                ],
            ),
            Node::instruction("end"),
        ],
    );
    let recorder = Recorder {
        reverse_sections: true,
        ..Recorder::default()
    };
    let (mut state, log) = start_with(root, recorder);
    for _ in 0..4 {
        state.go_forward().unwrap();
    }
    assert_eq!(
        events(&log),
        vec!["forward:S3", "forward:S2", "forward:S1", "forward:end"]
    );
}

#[test]
fn test_form_is_presented_as_one_node() {
    let root = Node::assessment(
        "survey",
        vec![Node::form(
            "vitals",
            vec![
                Node::question("height", AnswerType::Integer),
                Node::question("weight", AnswerType::Integer),
            ],
        )],
    );
    let (mut state, log) = start(root);
    state.go_forward().unwrap();
    assert_eq!(events(&log), vec!["forward:vitals"]);
    assert!(matches!(
        state.current_leaf().unwrap().current_result(),
        ResultData::Collection(_)
    ));
}

#[test]
fn test_result_encodes_run_identifier() {
    let (mut state, _log) = start(skip_survey());
    state.go_forward().unwrap();
    let encoded = serde_json::to_value(state.current_result()).unwrap();
    assert!(encoded["taskRunUuid"].is_string());
    assert_eq!(encoded["identifier"], "survey");
}
