use std::error::Error as StdError;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The structured decision extracted from a model completion: what the
/// model was thinking, and which tool it selected.
///
/// The decision is selection only. Nothing here executes the tool; the
/// caller owns that.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decision {
    /// The model's stated reasoning.
    pub thought: String,
    /// The selected tool and its argument.
    pub action: ToolAction,
}

/// A tool selection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolAction {
    /// Name of the selected tool.
    pub tool: String,
    /// Free-text argument to pass to the tool.
    pub argument: String,
}

/// The parsed markup did not match the expected decision schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaError {
    field: &'static str,
}

impl SchemaError {
    /// Returns the path of the missing or mistyped field.
    #[inline]
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "response markup is missing `{}`", self.field)
    }
}

impl StdError for SchemaError {}

impl Decision {
    /// Extracts a decision from a parsed response mapping.
    ///
    /// Expects the `Response.Thought`, `Response.Action.Tool` and
    /// `Response.Action.Argument` fields to be present as text. Anything
    /// else is a schema error, which the router treats as an attempt
    /// failure.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let response = &value["Response"];
        let thought = expect_text(&response["Thought"], "Response.Thought")?;
        let action = &response["Action"];
        let tool = expect_text(&action["Tool"], "Response.Action.Tool")?;
        let argument =
            expect_text(&action["Argument"], "Response.Action.Argument")?;
        Ok(Self {
            thought,
            action: ToolAction { tool, argument },
        })
    }
}

fn expect_text(
    value: &Value,
    field: &'static str,
) -> Result<String, SchemaError> {
    match value.as_str() {
        Some(text) => Ok(text.to_owned()),
        None => Err(SchemaError { field }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_value() {
        let value = json!({
            "Response": {
                "Thought": "A scholarship query.",
                "Action": {
                    "Tool": "Scholarships",
                    "Argument": "Which program?",
                },
            },
        });
        let decision = Decision::from_value(&value).unwrap();
        assert_eq!(decision.thought, "A scholarship query.");
        assert_eq!(decision.action.tool, "Scholarships");
        assert_eq!(decision.action.argument, "Which program?");
    }

    #[test]
    fn test_missing_fields() {
        let value = json!({
            "Response": {
                "Thought": "hm",
                "Action": { "Tool": "Done" },
            },
        });
        let err = Decision::from_value(&value).unwrap_err();
        assert_eq!(err.field(), "Response.Action.Argument");

        let err = Decision::from_value(&json!({})).unwrap_err();
        assert_eq!(err.field(), "Response.Thought");
    }
}
