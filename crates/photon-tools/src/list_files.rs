//! `list_files` — recursive workspace listing honoring `ScanIgnoreRules`,
//! shared with the symbol index and `grep_search` so all three tools agree
//! on what counts as "in the workspace".

use std::path::PathBuf;

use async_trait::async_trait;
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use photon_core::workspace::ScanIgnoreRules;
use serde_json::Value;

pub struct ListFilesTool {
    workspace_root: PathBuf,
}

impl ListFilesTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_files", "List workspace files under a directory")
            .with_param("path", "workspace-relative directory (default: workspace root)", false)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let scope = arguments.get("path").and_then(Value::as_str).unwrap_or("");
        let base = self.workspace_root.join(scope);
        if !base.exists() {
            return ToolResult::error(format!("no such directory: {scope}"));
        }

        let ignore = ScanIgnoreRules::default();
        let mut out = Vec::new();
        walk(&self.workspace_root, &base, &ignore, &mut out);
        out.sort();

        if out.is_empty() {
            ToolResult::text("(no files)".to_string())
        } else {
            ToolResult::text(out.join("\n"))
        }
    }
}

fn walk(root: &std::path::Path, dir: &std::path::Path, ignore: &ScanIgnoreRules, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if ignore.should_ignore(&rel_str) {
            continue;
        }
        if path.is_dir() {
            walk(root, &path, ignore, out);
        } else {
            out.push(rel_str);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn lists_files_and_skips_ignored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/pkg.js"), "").unwrap();

        let tool = ListFilesTool::new(dir.path().to_path_buf());
        let result = tool.execute(&json!({})).await;
        assert!(result.content[0].text.contains("a.rs"));
        assert!(!result.content[0].text.contains("node_modules"));
    }
}
