//! `read` — returns a 1-based inclusive line range from a workspace file,
//! grounded in `sage-tools::tools::file_ops::read::ReadTool` but trimmed to
//! the line-range shape the gateway's state machine expects (no pagination
//! defaults, no binary-file sniffing beyond a UTF-8 check).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use serde_json::Value;
use tracing::instrument;

pub struct ReadTool {
    workspace_root: PathBuf,
}

impl ReadTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    fn resolve(&self, rel_path: &str) -> PathBuf {
        self.workspace_root.join(rel_path)
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("read", "Read a line range from a workspace file")
            .with_param("path", "workspace-relative file path", true)
            .with_param("start_line", "1-based first line to read", true)
            .with_param("end_line", "1-based last line to read (inclusive)", true)
    }

    #[instrument(skip(self, arguments))]
    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(path) = arguments.get("path").and_then(Value::as_str) else {
            return ToolResult::error("read requires a `path` argument");
        };
        let start_line = arguments
            .get("start_line")
            .and_then(Value::as_u64)
            .unwrap_or(1) as usize;
        let end_line = arguments
            .get("end_line")
            .and_then(Value::as_u64)
            .unwrap_or(usize::MAX as u64) as usize;

        let abs_path: &Path = &self.resolve(path);
        let content = match tokio::fs::read_to_string(abs_path).await {
            Ok(content) => content,
            Err(err) => return ToolResult::error(format!("failed to read {path}: {err}")),
        };

        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return ToolResult::text(String::new());
        }

        let start = start_line.max(1) - 1;
        let end = end_line.min(lines.len());
        if start >= lines.len() || start >= end {
            return ToolResult::error(format!(
                "requested range {start_line}-{end_line} is out of bounds for {path} ({} lines)",
                lines.len()
            ));
        }

        let mut out = String::new();
        for (offset, line) in lines[start..end].iter().enumerate() {
            out.push_str(&format!("{:>6}\t{}\n", start + offset + 1, line));
        }
        ToolResult::text(out)
    }
}
