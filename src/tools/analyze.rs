//! analyze_file tool - ask the inference backend about a file's contents
//!
//! Reads the file, strips any leading YAML front matter, embeds content and
//! query into a fixed prompt shape, and forwards exactly one generate call
//! upstream. Every local precondition is checked before the backend is
//! touched, so a bad path or oversized file never costs an inference call.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{Arguments, ParamKind, ParamSpec, Tool};
use crate::error::{BridgeError, Result};
use crate::ollama::InferenceClient;

/// Payload returned by a successful analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub file_path: String,
    pub query: String,
    pub answer: String,
    pub model_name: String,
}

pub struct AnalyzeFileTool {
    client: Arc<dyn InferenceClient>,
    max_file_bytes: u64,
}

impl AnalyzeFileTool {
    pub fn new(client: Arc<dyn InferenceClient>, max_file_bytes: u64) -> Self {
        Self {
            client,
            max_file_bytes,
        }
    }
}

#[async_trait]
impl Tool for AnalyzeFileTool {
    fn name(&self) -> &'static str {
        "analyze_file"
    }

    fn description(&self) -> &'static str {
        "Analyze a file with the local model and get insights based on a user query"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("filePath", ParamKind::String, "Path to the file to analyze"),
            ParamSpec::required(
                "query",
                ParamKind::String,
                "The question or task to perform on the file content",
            ),
        ]
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let file_path = args
            .get("filePath")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::InvalidArgument("filePath is required".to_string()))?;
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::InvalidArgument("query is required".to_string()))?;

        if query.trim().is_empty() {
            return Err(BridgeError::InvalidArgument(
                "query must not be empty".to_string(),
            ));
        }

        let path = Path::new(file_path);
        let meta = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                BridgeError::InvalidArgument(format!("file '{}' does not exist", file_path))
            }
            std::io::ErrorKind::PermissionDenied => BridgeError::InvalidArgument(format!(
                "file '{}' is not readable: permission denied",
                file_path
            )),
            _ => BridgeError::InvalidArgument(format!("cannot access file '{}': {}", file_path, e)),
        })?;

        if !meta.is_file() {
            return Err(BridgeError::InvalidArgument(format!(
                "'{}' is not a regular file",
                file_path
            )));
        }
        if meta.len() > self.max_file_bytes {
            return Err(BridgeError::InvalidArgument(format!(
                "file '{}' is {} bytes, larger than the {} byte limit",
                file_path,
                meta.len(),
                self.max_file_bytes
            )));
        }

        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| BridgeError::InvalidArgument(format!("failed to read '{}': {}", file_path, e)))?;
        let content = String::from_utf8(raw).map_err(|_| {
            BridgeError::InvalidArgument(format!("file '{}' is not valid UTF-8 text", file_path))
        })?;
        let content = strip_front_matter(&content);

        let prompt = build_prompt(content, query);
        let model = self.client.model().to_string();
        let answer = self.client.generate(&model, &prompt).await?;

        let payload = AnalysisPayload {
            file_path: file_path.to_string(),
            query: query.to_string(),
            answer,
            model_name: model,
        };
        Ok(serde_json::to_value(payload)?)
    }
}

/// Fixed prompt shape the backend receives
fn build_prompt(content: &str, query: &str) -> String {
    format!(
        "Here is the content from a file:\n\n{}\n\nUser query: {}\n\nPlease respond to the user query based on the file content.",
        content, query
    )
}

/// Strip a leading YAML front matter block.
///
/// The block must open with a `---` line at the very start of the file and
/// close with another `---` line; without a closing fence the content is
/// returned untouched.
fn strip_front_matter(content: &str) -> &str {
    if !content.starts_with("---") {
        return content;
    }
    let Some(first_newline) = content.find('\n') else {
        return content;
    };
    if !content[3..first_newline].trim().is_empty() {
        return content;
    }

    let body = &content[first_newline + 1..];
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return body[offset + line.len()..].trim_start();
        }
        offset += line.len();
    }

    content
}
