//! Mutable result tree.
//!
//! Every visited node produces a [`ResultData`]. Containers collect their
//! children's results in a [`BranchNodeResult`], which also keeps the
//! append-only navigation [`PathMarker`] log and snapshots of results that
//! were replaced when a node was visited again.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::{AnswerType, AsyncActionConfiguration, Node, NodeKind};

// ============================================================================
// Direction & Path
// ============================================================================

/// Direction of a navigation move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Exit,
}

impl Direction {
    /// Get the direction as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Exit => "exit",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            "exit" => Ok(Direction::Exit),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

/// One entry of a branch's navigation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMarker {
    pub identifier: String,
    pub direction: Direction,
}

impl PathMarker {
    pub fn new(identifier: impl Into<String>, direction: Direction) -> Self {
        Self {
            identifier: identifier.into(),
            direction,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// A self-describing result of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResultData {
    Base(BasicResult),
    Answer(AnswerResult),
    Collection(CollectionResult),
    Branch(BranchNodeResult),
}

/// Result of a step that records only timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Answer to a question. `json_value` is `None` while unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_type: Option<AnswerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_value: Option<Value>,
}

/// Results keyed by identifier. Inserting an existing identifier replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub input_results: BTreeMap<String, ResultData>,
}

/// Result of a container: collected child results plus the navigation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchNodeResult {
    #[serde(flatten)]
    pub collection: CollectionResult,
    #[serde(default)]
    pub path: Vec<PathMarker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_history_results: Vec<ResultData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_run_uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_string: Option<String>,
    /// Background actions of this container the host was told to start and
    /// has not yet been told to stop. Runtime only; empty once the
    /// container is left.
    #[serde(skip)]
    pub running_actions: BTreeSet<AsyncActionConfiguration>,
}

impl ResultData {
    /// Create the empty result a node produces when it is first visited.
    pub fn for_node(node: &Node) -> Self {
        let identifier = node.result_id().to_string();
        match &node.kind {
            NodeKind::Question(info) => ResultData::Answer(AnswerResult {
                identifier,
                start_date: Utc::now(),
                end_date: None,
                answer_type: Some(info.answer_type.clone()),
                json_value: None,
            }),
            NodeKind::Form(_) => ResultData::Collection(CollectionResult::new(identifier)),
            _ if node.is_container() => ResultData::Branch(BranchNodeResult::for_node(node)),
            _ => ResultData::Base(BasicResult {
                identifier,
                start_date: Utc::now(),
                end_date: None,
            }),
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            ResultData::Base(r) => &r.identifier,
            ResultData::Answer(r) => &r.identifier,
            ResultData::Collection(r) => &r.identifier,
            ResultData::Branch(r) => &r.collection.identifier,
        }
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        match self {
            ResultData::Base(r) => r.start_date,
            ResultData::Answer(r) => r.start_date,
            ResultData::Collection(r) => r.start_date,
            ResultData::Branch(r) => r.collection.start_date,
        }
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        match self {
            ResultData::Base(r) => r.end_date,
            ResultData::Answer(r) => r.end_date,
            ResultData::Collection(r) => r.end_date,
            ResultData::Branch(r) => r.collection.end_date,
        }
    }

    pub fn set_start_date(&mut self, date: DateTime<Utc>) {
        match self {
            ResultData::Base(r) => r.start_date = date,
            ResultData::Answer(r) => r.start_date = date,
            ResultData::Collection(r) => r.start_date = date,
            ResultData::Branch(r) => r.collection.start_date = date,
        }
    }

    pub fn set_end_date(&mut self, date: Option<DateTime<Utc>>) {
        match self {
            ResultData::Base(r) => r.end_date = date,
            ResultData::Answer(r) => r.end_date = date,
            ResultData::Collection(r) => r.end_date = date,
            ResultData::Branch(r) => r.collection.end_date = date,
        }
    }

    /// The answer value, if this is an answered question.
    pub fn answer_value(&self) -> Option<&Value> {
        match self {
            ResultData::Answer(r) => r.json_value.as_ref(),
            _ => None,
        }
    }

    /// The answer type, if this is a question result.
    pub fn answer_type(&self) -> Option<&AnswerType> {
        match self {
            ResultData::Answer(r) => r.answer_type.as_ref(),
            _ => None,
        }
    }

    /// Get the result kind as a string
    pub fn kind_str(&self) -> &'static str {
        match self {
            ResultData::Base(_) => "base",
            ResultData::Answer(_) => "answer",
            ResultData::Collection(_) => "collection",
            ResultData::Branch(_) => "branch",
        }
    }
}

impl CollectionResult {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            start_date: Utc::now(),
            end_date: None,
            input_results: BTreeMap::new(),
        }
    }

    /// Insert a result, returning the one it replaced.
    pub fn insert(&mut self, result: ResultData) -> Option<ResultData> {
        self.input_results
            .insert(result.identifier().to_string(), result)
    }

    pub fn get(&self, identifier: &str) -> Option<&ResultData> {
        self.input_results.get(identifier)
    }

    pub fn remove(&mut self, identifier: &str) -> Option<ResultData> {
        self.input_results.remove(identifier)
    }
}

impl BranchNodeResult {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            collection: CollectionResult::new(identifier),
            path: Vec::new(),
            path_history_results: Vec::new(),
            task_run_uuid: None,
            version_string: None,
            running_actions: BTreeSet::new(),
        }
    }

    /// Create the result for a container. The assessment root gets a run
    /// identifier and its version.
    pub fn for_node(node: &Node) -> Self {
        let mut result = Self::new(node.result_id());
        if let NodeKind::Assessment(info) = &node.kind {
            result.task_run_uuid = Some(Uuid::new_v4());
            result.version_string = info.version_string.clone();
        }
        result
    }

    pub fn identifier(&self) -> &str {
        &self.collection.identifier
    }

    /// Child result for the given result identifier
    pub fn child_result(&self, identifier: &str) -> Option<&ResultData> {
        self.collection.get(identifier)
    }

    /// Append a marker. Revisits of the same node are logged every time.
    pub fn append_path(&mut self, identifier: &str, direction: Direction) {
        self.path.push(PathMarker::new(identifier, direction));
    }

    /// Insert or replace a child result. A replaced result that differs from
    /// the new one is kept in `path_history_results`.
    pub fn append_input_result(&mut self, result: ResultData) {
        if let Some(previous) = self.collection.get(result.identifier()) {
            if previous == &result {
                return;
            }
            self.path_history_results.push(previous.clone());
        }
        self.collection.insert(result);
    }

    /// Replay the path log into the trail of identifiers that are currently
    /// "behind" the participant, oldest first.
    ///
    /// A forward marker for an identifier already on the trail truncates the
    /// trail back to it. A backward marker unwinds the trail to its target.
    pub fn active_trail(&self) -> Vec<&str> {
        let mut trail: Vec<&str> = Vec::new();
        for marker in &self.path {
            let existing = trail
                .iter()
                .rposition(|identifier| *identifier == marker.identifier);
            match marker.direction {
                Direction::Forward => {
                    if let Some(pos) = existing {
                        trail.truncate(pos);
                    }
                    trail.push(&marker.identifier);
                }
                Direction::Backward => match existing {
                    Some(pos) => trail.truncate(pos + 1),
                    None => trail.push(&marker.identifier),
                },
                Direction::Exit => {}
            }
        }
        trail
    }
}
