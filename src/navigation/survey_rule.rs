use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{RuleError, RuleResult};
use crate::model::AnswerType;

/// Comparison applied between an answer and a rule's matching answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyRuleOperator {
    #[default]
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "ne")]
    NotEqual,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "le")]
    LessThanOrEqual,
    #[serde(rename = "ge")]
    GreaterThanOrEqual,
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "skip", alias = "de")]
    Skip,
}

impl SurveyRuleOperator {
    /// Get the operator as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyRuleOperator::Equal => "eq",
            SurveyRuleOperator::NotEqual => "ne",
            SurveyRuleOperator::LessThan => "lt",
            SurveyRuleOperator::GreaterThan => "gt",
            SurveyRuleOperator::LessThanOrEqual => "le",
            SurveyRuleOperator::GreaterThanOrEqual => "ge",
            SurveyRuleOperator::Always => "always",
            SurveyRuleOperator::Skip => "skip",
        }
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            SurveyRuleOperator::LessThan
                | SurveyRuleOperator::GreaterThan
                | SurveyRuleOperator::LessThanOrEqual
                | SurveyRuleOperator::GreaterThanOrEqual
        )
    }

    /// Apply the operator given whether the values are equal and, when
    /// defined, how they order.
    fn apply(&self, equal: bool, ordering: Option<Ordering>) -> bool {
        match self {
            SurveyRuleOperator::Equal => equal,
            SurveyRuleOperator::NotEqual => !equal,
            SurveyRuleOperator::LessThan => !equal && ordering == Some(Ordering::Less),
            SurveyRuleOperator::GreaterThan => !equal && ordering == Some(Ordering::Greater),
            SurveyRuleOperator::LessThanOrEqual => equal || ordering == Some(Ordering::Less),
            SurveyRuleOperator::GreaterThanOrEqual => equal || ordering == Some(Ordering::Greater),
            SurveyRuleOperator::Always => true,
            SurveyRuleOperator::Skip => false,
        }
    }
}

impl std::fmt::Display for SurveyRuleOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SurveyRuleOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" => Ok(SurveyRuleOperator::Equal),
            "ne" => Ok(SurveyRuleOperator::NotEqual),
            "lt" => Ok(SurveyRuleOperator::LessThan),
            "gt" => Ok(SurveyRuleOperator::GreaterThan),
            "le" => Ok(SurveyRuleOperator::LessThanOrEqual),
            "ge" => Ok(SurveyRuleOperator::GreaterThanOrEqual),
            "always" => Ok(SurveyRuleOperator::Always),
            "skip" | "de" => Ok(SurveyRuleOperator::Skip),
            _ => Err(format!("Unknown rule operator: {}", s)),
        }
    }
}

/// Conditional jump attached to a node and evaluated against its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRule {
    /// Value compared with the answer. `None` and JSON `null` both mean "no answer".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_answer: Option<Value>,
    #[serde(default)]
    pub rule_operator: SurveyRuleOperator,
    /// Absolute tolerance for numeric equality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub skip_to_identifier: String,
}

impl SurveyRule {
    /// Create a rule that jumps when the answer compares with `operator`
    pub fn new(
        matching_answer: Value,
        rule_operator: SurveyRuleOperator,
        skip_to_identifier: impl Into<String>,
    ) -> Self {
        Self {
            matching_answer: Some(matching_answer),
            rule_operator,
            accuracy: None,
            skip_to_identifier: skip_to_identifier.into(),
        }
    }

    /// Create a rule that jumps when the question is left unanswered
    pub fn skip(skip_to_identifier: impl Into<String>) -> Self {
        Self {
            matching_answer: None,
            rule_operator: SurveyRuleOperator::Skip,
            accuracy: None,
            skip_to_identifier: skip_to_identifier.into(),
        }
    }

    /// Create a rule that always jumps
    pub fn always(skip_to_identifier: impl Into<String>) -> Self {
        Self {
            matching_answer: None,
            rule_operator: SurveyRuleOperator::Always,
            accuracy: None,
            skip_to_identifier: skip_to_identifier.into(),
        }
    }

    /// Set the numeric tolerance
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Evaluate the rule against an answer.
    ///
    /// `default_digits` is the rounding used for numeric equality when
    /// neither `accuracy` nor the answer type defines one. Ordering
    /// comparisons between values that have no order (booleans, arrays,
    /// objects, or mismatched types) are an error.
    pub fn evaluate(
        &self,
        answer: Option<&Value>,
        answer_type: Option<&AnswerType>,
        default_digits: u32,
    ) -> RuleResult<bool> {
        let answer = answer.filter(|value| !value.is_null());
        let matching = self.matching_answer.as_ref().filter(|value| !value.is_null());

        match self.rule_operator {
            SurveyRuleOperator::Always => return Ok(true),
            SurveyRuleOperator::Skip => return Ok(answer.is_none()),
            _ => {}
        }

        let (answer, matching) = match (answer, matching) {
            (Some(answer), Some(matching)) => (answer, matching),
            (None, None) => return Ok(self.rule_operator.apply(true, None)),
            _ => return Ok(self.rule_operator.apply(false, None)),
        };

        let (equal, ordering) = match (answer, matching) {
            (Value::Number(a), Value::Number(m)) => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let m = m.as_f64().unwrap_or(f64::NAN);
                let digits = answer_type
                    .and_then(AnswerType::significant_digits)
                    .unwrap_or(default_digits);
                (self.numbers_equal(a, m, digits), a.partial_cmp(&m))
            }
            (Value::String(a), Value::String(m)) => (a == m, Some(a.cmp(m))),
            _ => {
                if self.rule_operator.is_ordering() {
                    return Err(RuleError::Incomparable {
                        operator: self.rule_operator.to_string(),
                        answer: answer.to_string(),
                        matching: matching.to_string(),
                    });
                }
                (answer == matching, None)
            }
        };

        Ok(self.rule_operator.apply(equal, ordering))
    }

    fn numbers_equal(&self, a: f64, m: f64, digits: u32) -> bool {
        match self.accuracy {
            Some(accuracy) => (a - m).abs() <= accuracy.abs(),
            None => {
                let scale = 10f64.powi(digits as i32);
                let (scaled_a, scaled_m) = (a * scale, m * scale);
                if scaled_a.is_finite() && scaled_m.is_finite() {
                    scaled_a.round() == scaled_m.round()
                } else {
                    // Too large to scale; compare relative to magnitude.
                    (a - m).abs() <= f64::EPSILON * a.abs().max(m.abs())
                }
            }
        }
    }
}

/// Find the jump target of the first rule matching `answer`.
pub fn first_matching_rule<'a>(
    rules: &'a [SurveyRule],
    answer: Option<&Value>,
    answer_type: Option<&AnswerType>,
    default_digits: u32,
) -> RuleResult<Option<&'a str>> {
    for rule in rules {
        if rule.evaluate(answer, answer_type, default_digits)? {
            debug!(
                operator = %rule.rule_operator,
                skip_to = %rule.skip_to_identifier,
                "Survey rule matched"
            );
            return Ok(Some(&rule.skip_to_identifier));
        }
    }
    Ok(None)
}
