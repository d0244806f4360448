//! Tool system for the bridge
//!
//! Every capability the bridge serves is a `Tool`: a named, schema-described
//! unit of functionality invoked with JSON arguments. Descriptors are built
//! once at registration and never change afterwards, so the advertised
//! catalog is stable for the lifetime of the process.

mod analyze;
mod discover;
mod registry;
mod validate;

pub use analyze::{AnalyzeFileTool, AnalysisPayload};
pub use discover::{DiscoverFilesTool, FileMatch};
pub use registry::ToolRegistry;
pub use validate::{merge_defaults, validate_arguments, TypeMismatch, ValidationFailure};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{BridgeError, ErrorKind, Result};

/// JSON argument map passed to tool bodies
pub type Arguments = Map<String, Value>;

/// Declared runtime type for a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    /// Wire name used in the input schema
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Check a runtime JSON value against this kind. `null` never matches;
    /// an absent optional field is the way to omit a value.
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            _ => false,
        }
    }

    /// Name of a runtime value's type, for mismatch messages
    pub fn value_type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// One declared parameter of a tool's input schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            description: description.into(),
        }
    }

    /// Attach a default value, merged in when the caller omits the field
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Static metadata advertised for one tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// Wire form served from the catalog endpoint:
    /// `{ name, description, inputSchema }`
    pub fn to_wire(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.kind.as_str()));
            prop.insert("description".to_string(), json!(param.description));
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": {
                "type": "object",
                "properties": properties,
                "required": required
            }
        })
    }
}

/// A tool that can be invoked through the bridge
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (unique within the registry)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Declared parameters, in declaration order
    fn params(&self) -> Vec<ParamSpec>;

    /// Execute the tool. Arguments have already been validated against
    /// `params()` and defaults merged in.
    async fn execute(&self, args: &Arguments) -> Result<Value>;
}

/// Outcome of one invocation. Exactly one of the two variants exists, so a
/// response can never carry both a payload and an error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InvocationResult {
    Success { result: Value },
    Failure { error: ErrorEnvelope },
}

/// Failure half of the invocation envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
}

impl InvocationResult {
    pub fn success(payload: Value) -> Self {
        Self::Success { result: payload }
    }

    pub fn failure(err: &BridgeError) -> Self {
        Self::Failure {
            error: ErrorEnvelope {
                kind: err.kind(),
                message: err.public_message(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Error kind, if this is a failure
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error.kind),
        }
    }

    /// The success payload, if any
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { result } => Some(result),
            Self::Failure { .. } => None,
        }
    }

    /// The failure message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(&error.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_kind_matches() {
        assert!(ParamKind::String.matches(&json!("hi")));
        assert!(ParamKind::Number.matches(&json!(42)));
        assert!(ParamKind::Number.matches(&json!(4.2)));
        assert!(ParamKind::Boolean.matches(&json!(true)));
        assert!(ParamKind::Object.matches(&json!({})));
        assert!(ParamKind::Array.matches(&json!([])));

        assert!(!ParamKind::String.matches(&json!(42)));
        assert!(!ParamKind::Number.matches(&json!("42")));
        assert!(!ParamKind::Boolean.matches(&json!(null)));
    }

    #[test]
    fn test_null_matches_no_kind() {
        let null = json!(null);
        assert!(!ParamKind::String.matches(&null));
        assert!(!ParamKind::Number.matches(&null));
        assert!(!ParamKind::Boolean.matches(&null));
        assert!(!ParamKind::Object.matches(&null));
        assert!(!ParamKind::Array.matches(&null));
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(ParamKind::value_type_name(&json!(null)), "null");
        assert_eq!(ParamKind::value_type_name(&json!("x")), "string");
        assert_eq!(ParamKind::value_type_name(&json!(1)), "number");
        assert_eq!(ParamKind::value_type_name(&json!([1])), "array");
    }

    #[test]
    fn test_param_spec_builders() {
        let required = ParamSpec::required("directory", ParamKind::String, "where to look");
        assert!(required.required);
        assert!(required.default.is_none());

        let optional = ParamSpec::optional("depth", ParamKind::Number, "how deep").with_default(json!(3));
        assert!(!optional.required);
        assert_eq!(optional.default, Some(json!(3)));
    }

    #[test]
    fn test_descriptor_to_wire() {
        let descriptor = ToolDescriptor {
            name: "sample".to_string(),
            description: "A sample tool".to_string(),
            params: vec![
                ParamSpec::required("path", ParamKind::String, "File path"),
                ParamSpec::optional("limit", ParamKind::Number, "Max results").with_default(json!(10)),
            ],
        };

        let wire = descriptor.to_wire();
        assert_eq!(wire["name"], "sample");
        assert_eq!(wire["description"], "A sample tool");
        assert_eq!(wire["inputSchema"]["type"], "object");
        assert_eq!(wire["inputSchema"]["properties"]["path"]["type"], "string");
        assert_eq!(wire["inputSchema"]["properties"]["limit"]["default"], 10);
        assert_eq!(wire["inputSchema"]["required"], json!(["path"]));
    }

    #[test]
    fn test_success_envelope_shape() {
        let outcome = InvocationResult::success(json!({"count": 2}));
        assert!(outcome.is_success());
        assert_eq!(outcome.kind(), None);

        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire["result"]["count"], 2);
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn test_failure_envelope_shape() {
        let err = BridgeError::ToolNotFound("mystery".to_string());
        let outcome = InvocationResult::failure(&err);
        assert!(!outcome.is_success());
        assert_eq!(outcome.kind(), Some(ErrorKind::NotFound));

        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire["error"]["kind"], "NotFound");
        assert_eq!(wire["error"]["message"], "Tool not found: mystery");
        assert!(wire.get("result").is_none());
    }

    #[test]
    fn test_failure_envelope_hides_internal_detail() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "secret path /etc/shadow");
        let err = BridgeError::from(io_err);
        let outcome = InvocationResult::failure(&err);

        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire["error"]["kind"], "InternalError");
        assert_eq!(wire["error"]["message"], "unexpected internal error");
    }
}
