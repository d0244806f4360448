//! Tool registry - catalog management and invocation dispatch
//!
//! The registry owns the advertised catalog (in registration order) and is
//! the single place invocation outcomes are normalized: tools raise typed
//! errors, the registry resolves, validates, executes, and wraps whatever
//! happens into an `InvocationResult`.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error};
use serde_json::Value;

use super::validate::{merge_defaults, validate_arguments};
use super::{AnalyzeFileTool, Arguments, DiscoverFilesTool, InvocationResult, Tool, ToolDescriptor};
use crate::config::LimitsConfig;
use crate::error::{BridgeError, ErrorKind, Result};
use crate::ollama::InferenceClient;

/// Manages the tool catalog and dispatches invocations.
///
/// Tool bodies run on a detached task per invocation: once execution
/// starts it runs to completion even if the caller drops the invoke
/// future, and a panicking body surfaces as an internal error instead
/// of unwinding through the dispatcher.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            descriptors: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create a registry with the bridge's standard tool set
    pub fn standard(limits: &LimitsConfig, client: Arc<dyn InferenceClient>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AnalyzeFileTool::new(client, limits.max_file_bytes)));
        registry.register(Box::new(DiscoverFilesTool));
        registry
    }

    /// Register a tool. Registration order is the advertised catalog order;
    /// re-registering a name replaces the tool in its original slot.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let tool: Arc<dyn Tool> = Arc::from(tool);
        let descriptor = ToolDescriptor {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            params: tool.params(),
        };

        if let Some(&slot) = self.index.get(tool.name()) {
            self.descriptors[slot] = descriptor;
            self.tools[slot] = tool;
            return;
        }

        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.descriptors.push(descriptor);
        self.tools.push(tool);
    }

    /// All descriptors, in registration order
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Look up a single descriptor by name
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&slot| &self.descriptors[slot])
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names, in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name. Never panics and never leaks internal error
    /// detail; every outcome becomes a well-formed envelope.
    pub async fn invoke(&self, name: &str, args: &Arguments) -> InvocationResult {
        match self.try_invoke(name, args).await {
            Ok(payload) => {
                debug!("tool '{}' succeeded", name);
                InvocationResult::success(payload)
            }
            Err(err) => {
                if err.kind() == ErrorKind::InternalError {
                    error!("tool '{}' internal failure: {:?}", name, err);
                } else {
                    debug!("tool '{}' failed: {}", name, err);
                }
                InvocationResult::failure(&err)
            }
        }
    }

    async fn try_invoke(&self, name: &str, args: &Arguments) -> Result<Value> {
        let slot = self
            .index
            .get(name)
            .copied()
            .ok_or_else(|| BridgeError::ToolNotFound(name.to_string()))?;

        let descriptor = &self.descriptors[slot];
        validate_arguments(&descriptor.params, args)?;
        let merged = merge_defaults(&descriptor.params, args);

        debug!("invoking tool '{}'", name);

        // Detached task: dropping this future (client gone mid-request)
        // must not cancel a body that already started, and a panic stays
        // inside the task instead of taking the handler down with it.
        let tool = Arc::clone(&self.tools[slot]);
        let task = tokio::spawn(async move { tool.execute(&merged).await });
        match task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => {
                let payload = err.into_panic();
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "opaque panic payload".to_string());
                Err(BridgeError::Internal(format!("tool '{}' panicked: {}", name, detail)))
            }
            Err(err) => Err(BridgeError::Internal(format!("tool '{}' task failed: {}", name, err))),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
