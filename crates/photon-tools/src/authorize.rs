//! `authorize` — the tool has no effect of its own; the gateway's
//! postcondition is what actually flips `ToolSession::authorized`. This
//! exists purely so `authorize` is a registerable tool with a schema.

use async_trait::async_trait;
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use serde_json::Value;

pub struct AuthorizeTool;

#[async_trait]
impl Tool for AuthorizeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "authorize",
            "Grant this session permission to perform write operations",
        )
    }

    async fn execute(&self, _arguments: &Value) -> ToolResult {
        ToolResult::text("Session authorized for writes")
    }
}
