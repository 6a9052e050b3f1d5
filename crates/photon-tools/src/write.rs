//! `write` — two distinct shapes share one tool name, exactly as the
//! gateway's precondition table distinguishes them: a partial edit
//! (`operation` ∈ {replace, insert, delete} plus a line range) or a
//! full-file create (`path` + `content` only). Grounded in
//! `sage-tools::tools::file_ops::{write,edit}` but the existing-file
//! overwrite guard lives in the gateway, not here — by the time this tool
//! runs, the gateway has already decided the write is allowed.

use std::path::PathBuf;

use async_trait::async_trait;
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use serde_json::Value;
use tracing::instrument;

pub struct WriteTool {
    workspace_root: PathBuf,
}

impl WriteTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("write", "Create a file or apply a line-range edit to one")
            .with_param("path", "workspace-relative file path", true)
            .with_param("operation", "replace | insert | delete (omit for full create)", false)
            .with_param("start_line", "1-based first affected line", false)
            .with_param("end_line", "1-based last affected line (inclusive)", false)
            .with_param("content", "replacement/insertion text, or full file content", false)
    }

    #[instrument(skip(self, arguments))]
    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(path) = arguments.get("path").and_then(Value::as_str) else {
            return ToolResult::error("write requires a `path` argument");
        };
        let abs_path = self.workspace_root.join(path);

        let Some(operation) = arguments.get("operation").and_then(Value::as_str) else {
            let content = arguments.get("content").and_then(Value::as_str).unwrap_or("");
            if let Some(parent) = abs_path.parent() {
                if let Err(err) = tokio::fs::create_dir_all(parent).await {
                    return ToolResult::error(format!("failed to create parent dirs: {err}"));
                }
            }
            return match tokio::fs::write(&abs_path, content).await {
                Ok(()) => ToolResult::text(format!("Created {path} ({} bytes)", content.len())),
                Err(err) => ToolResult::error(format!("failed to write {path}: {err}")),
            };
        };

        let existing = match tokio::fs::read_to_string(&abs_path).await {
            Ok(content) => content,
            Err(err) => return ToolResult::error(format!("failed to read {path}: {err}")),
        };
        let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();

        let start_line = arguments.get("start_line").and_then(Value::as_u64).unwrap_or(1) as usize;
        let end_line = arguments
            .get("end_line")
            .and_then(Value::as_u64)
            .unwrap_or(start_line as u64) as usize;
        let content = arguments.get("content").and_then(Value::as_str).unwrap_or("");

        match operation {
            "replace" => {
                let start = start_line.saturating_sub(1).min(lines.len());
                let end = end_line.min(lines.len());
                if start > end {
                    return ToolResult::error(format!(
                        "invalid range {start_line}-{end_line} for {path} ({} lines)",
                        lines.len()
                    ));
                }
                let replacement: Vec<String> = content.lines().map(str::to_string).collect();
                lines.splice(start..end, replacement);
                if let Err(err) = write_lines(&abs_path, &lines).await {
                    return ToolResult::error(format!("failed to write {path}: {err}"));
                }
                ToolResult::text(format!("Replaced lines {start_line}-{end_line} in {path}"))
            }
            "insert" => {
                let at = start_line.saturating_sub(1).min(lines.len());
                let insertion: Vec<String> = content.lines().map(str::to_string).collect();
                lines.splice(at..at, insertion);
                if let Err(err) = write_lines(&abs_path, &lines).await {
                    return ToolResult::error(format!("failed to write {path}: {err}"));
                }
                ToolResult::text(format!("Inserted at line {start_line} in {path}"))
            }
            "delete" => {
                let start = start_line.saturating_sub(1).min(lines.len());
                let end = end_line.min(lines.len());
                if start > end {
                    return ToolResult::error(format!(
                        "invalid range {start_line}-{end_line} for {path} ({} lines)",
                        lines.len()
                    ));
                }
                lines.splice(start..end, std::iter::empty());
                if let Err(err) = write_lines(&abs_path, &lines).await {
                    return ToolResult::error(format!("failed to write {path}: {err}"));
                }
                ToolResult::text(format!("Deleted lines {start_line}-{end_line} in {path}"))
            }
            other => ToolResult::error(format!("unknown write operation `{other}`")),
        }
    }
}

async fn write_lines(path: &std::path::Path, lines: &[String]) -> std::io::Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    tokio::fs::write(path, content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replace_overwrites_the_requested_range() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.txt"), "line1\nline2\nline3\n").unwrap();

        let tool = WriteTool::new(dir.path().to_path_buf());
        let result = tool
            .execute(&json!({
                "path": "sample.txt",
                "operation": "replace",
                "start_line": 1,
                "end_line": 1,
                "content": "updated",
            }))
            .await;
        assert!(!result.is_error());
        assert!(result.content[0].text.contains("Replaced"));

        let on_disk = std::fs::read_to_string(dir.path().join("sample.txt")).unwrap();
        assert!(on_disk.contains("updated"));
        assert!(on_disk.contains("line2"));
    }

    #[tokio::test]
    async fn full_create_writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteTool::new(dir.path().to_path_buf());
        let result = tool
            .execute(&json!({"path": "new.txt", "content": "hello"}))
            .await;
        assert!(!result.is_error());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("new.txt")).unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn insert_adds_lines_without_removing_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.txt"), "a\nb\n").unwrap();

        let tool = WriteTool::new(dir.path().to_path_buf());
        tool.execute(&json!({
            "path": "sample.txt",
            "operation": "insert",
            "start_line": 2,
            "content": "x",
        }))
        .await;

        let on_disk = std::fs::read_to_string(dir.path().join("sample.txt")).unwrap();
        assert_eq!(on_disk, "a\nx\nb\n");
    }
}
