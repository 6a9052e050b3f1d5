//! Tool invocation and result types.
//!
//! The result envelope follows the spec's wire shape exactly
//! (`{content: [{text}], status?}`) rather than the richer
//! success/output/error/metadata shape a full agent runtime tends to use —
//! this crate's tools are consumed by a model over a narrow channel, not by
//! a UI that wants exit codes and timings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem { text: text.into() }],
            status: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem { text: text.into() }],
            status: Some("error".to_string()),
        }
    }

    /// A precondition is unmet but the caller should be prompted to confirm
    /// rather than shown a bare error (spec.md S2: the `write` tool without
    /// prior `authorize`).
    pub fn requires_confirmation(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem { text: text.into() }],
            status: Some("requires_confirmation".to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }

    /// True for any non-success envelope; used by the gateway to decide
    /// whether a call's postcondition (state transition) should apply.
    pub fn is_ok(&self) -> bool {
        self.status.is_none() || self.status.as_deref() == Some("ok")
    }
}

#[derive(Debug, Clone)]
pub struct ToolParameter {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ToolParameter>,
}

impl ToolSchema {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            parameters: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: &'static str, description: &'static str, required: bool) -> Self {
        self.parameters.push(ToolParameter {
            name,
            description,
            required,
        });
        self
    }
}

/// One closed-set workspace tool.
///
/// Implementors only perform the tool's effect; precondition checking
/// against the session state lives in [`crate::tools::gateway::ToolGateway`]
/// so it is enforced uniformly and can be tested independently of any one
/// tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    async fn execute(&self, arguments: &Value) -> ToolResult;
}
