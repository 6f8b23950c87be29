//! Function tools exposed to the language model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AgentError, Result};

/// Definition of a tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema for the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Creates a tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Creates a tool that takes no arguments.
    pub fn without_arguments(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, json!({"type": "object", "properties": {}}))
    }

    /// Creates a tool whose arguments are all required strings.
    pub fn with_string_args(
        name: impl Into<String>,
        description: impl Into<String>,
        args: &[(&str, &str)],
    ) -> Self {
        let properties: serde_json::Map<String, Value> = args
            .iter()
            .map(|(arg, desc)| (arg.to_string(), json!({"type": "string", "description": desc})))
            .collect();
        let required: Vec<&str> = args.iter().map(|(arg, _)| *arg).collect();
        Self::new(
            name,
            description,
            json!({"type": "object", "properties": properties, "required": required}),
        )
    }
}

/// A model request to run a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, echoed in the result.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Arguments object.
    pub arguments: Value,
}

impl ToolCall {
    /// Creates a call with a generated identifier.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self::with_id(format!("call_{}", uuid::Uuid::new_v4().simple()), name, arguments)
    }

    /// Creates a call with an explicit identifier.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Deserializes the arguments into `T`.
    pub fn parse_arguments<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.arguments.clone()).map_err(|e| AgentError::InvalidArguments {
            tool_name: self.name.clone(),
            message: e.to_string(),
        })
    }
}

/// Outcome of a tool call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Identifier of the call this answers.
    pub tool_call_id: String,
    /// Structured result.
    pub content: Value,
    /// True if the tool reported an error.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Creates a successful result.
    pub fn success(tool_call_id: impl Into<String>, content: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content,
            is_error: false,
        }
    }

    /// Creates an `{"error": message}` result.
    pub fn error(tool_call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: json!({"error": message.into()}),
            is_error: true,
        }
    }

    /// Adds a field to an object result.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.content {
            map.insert(key.to_string(), value.into());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Args {
        destination: String,
    }

    #[test]
    fn test_string_args_schema() {
        let def = ToolDefinition::with_string_args(
            "book_travel_package",
            "Book flights and hotels",
            &[("destination", "Where to"), ("email", "Customer email")],
        );
        assert_eq!(def.parameters["properties"]["destination"]["type"], "string");
        assert_eq!(def.parameters["required"], json!(["destination", "email"]));
    }

    #[test]
    fn test_parse_arguments() {
        let call = ToolCall::new("book_travel_package", json!({"destination": "Lisbon"}));
        assert!(call.id.starts_with("call_"));
        let args: Args = call.parse_arguments().unwrap();
        assert_eq!(args.destination, "Lisbon");

        let call = ToolCall::with_id("1", "book_travel_package", json!({}));
        let err = call.parse_arguments::<Args>().unwrap_err();
        assert!(matches!(err, AgentError::InvalidArguments { .. }));
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("1", "No hotel agent available").with_field("attempts", 3);
        assert!(result.is_error);
        assert_eq!(result.content, json!({"error": "No hotel agent available", "attempts": 3}));
    }
}
