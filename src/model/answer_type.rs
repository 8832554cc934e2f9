use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type tag describing the JSON shape of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnswerType {
    Boolean,
    Integer,
    Decimal {
        #[serde(
            rename = "significantDigits",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        significant_digits: Option<u32>,
    },
    String,
    Array {
        #[serde(rename = "baseType", default)]
        base_type: BaseType,
        #[serde(
            rename = "sequenceSeparator",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        sequence_separator: Option<String>,
    },
    DateTime {
        #[serde(
            rename = "codingFormat",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        coding_format: Option<String>,
    },
    Measurement {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Object,
    Null,
}

/// Element type of an array answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseType {
    Boolean,
    Integer,
    Number,
    #[default]
    String,
}

impl AnswerType {
    /// Get the type tag as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::Boolean => "boolean",
            AnswerType::Integer => "integer",
            AnswerType::Decimal { .. } => "decimal",
            AnswerType::String => "string",
            AnswerType::Array { .. } => "array",
            AnswerType::DateTime { .. } => "dateTime",
            AnswerType::Measurement { .. } => "measurement",
            AnswerType::Object => "object",
            AnswerType::Null => "null",
        }
    }

    /// Significant digits used for numeric equality, if the type defines them.
    ///
    /// Integers compare exactly. Decimals use their own digits when declared.
    pub fn significant_digits(&self) -> Option<u32> {
        match self {
            AnswerType::Integer => Some(0),
            AnswerType::Decimal { significant_digits } => *significant_digits,
            _ => None,
        }
    }

    /// Whether a JSON value has the shape this type expects. `null` is
    /// always accepted since unanswered is a valid state.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            AnswerType::Boolean => value.is_boolean(),
            AnswerType::Integer => value.is_i64() || value.is_u64(),
            AnswerType::Decimal { .. } | AnswerType::Measurement { .. } => value.is_number(),
            AnswerType::String | AnswerType::DateTime { .. } => value.is_string(),
            AnswerType::Array { base_type, .. } => match value.as_array() {
                Some(items) => items.iter().all(|item| base_type.accepts(item)),
                None => false,
            },
            AnswerType::Object => value.is_object(),
            AnswerType::Null => false,
        }
    }
}

impl BaseType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            BaseType::Boolean => value.is_boolean(),
            BaseType::Integer => value.is_i64() || value.is_u64(),
            BaseType::Number => value.is_number(),
            BaseType::String => value.is_string(),
        }
    }
}

impl std::fmt::Display for AnswerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
