//! `grep_search` — regex content search over the workspace, grounded in
//! `sage-tools::tools::file_ops::grep::search` but walking the tree by hand
//! with `photon_core::workspace::ScanIgnoreRules` instead of `walkdir`, so
//! it shares exactly the same ignore behavior as the symbol index.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use photon_core::workspace::ScanIgnoreRules;
use regex::RegexBuilder;
use serde_json::Value;
use tracing::instrument;

const MAX_MATCHES: usize = 200;

pub struct GrepSearchTool {
    workspace_root: PathBuf,
}

impl GrepSearchTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for GrepSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("grep_search", "Search workspace file contents by regex pattern")
            .with_param("pattern", "regular expression to search for", true)
            .with_param("path", "workspace-relative subdirectory to scope the search", false)
            .with_param("case_insensitive", "match case-insensitively", false)
    }

    #[instrument(skip(self, arguments))]
    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(pattern) = arguments.get("pattern").and_then(Value::as_str) else {
            return ToolResult::error("grep_search requires a `pattern` argument");
        };
        let case_insensitive = arguments
            .get("case_insensitive")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
        {
            Ok(regex) => regex,
            Err(err) => return ToolResult::error(format!("invalid regex `{pattern}`: {err}")),
        };

        let scope = arguments
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or("");
        let base = self.workspace_root.join(scope);

        let ignore = ScanIgnoreRules::default();
        let mut matches = Vec::new();
        walk(&self.workspace_root, &base, &ignore, &mut |rel, line_no, line| {
            if matches.len() >= MAX_MATCHES {
                return;
            }
            if regex.is_match(line) {
                matches.push(format!("{rel}:{line_no}: {}", line.trim()));
            }
        });

        if matches.is_empty() {
            ToolResult::text(format!("No matches found for pattern: {pattern}"))
        } else {
            ToolResult::text(matches.join("\n"))
        }
    }
}

fn walk(
    root: &Path,
    dir: &Path,
    ignore: &ScanIgnoreRules,
    visit: &mut impl FnMut(&str, usize, &str),
) {
    if dir.is_file() {
        visit_file(root, dir, ignore, visit);
        return;
    }
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
            walk(root, &path, ignore, visit);
        } else {
            visit_file(root, &path, ignore, visit);
        }
    }
}

fn visit_file(root: &Path, path: &Path, ignore: &ScanIgnoreRules, visit: &mut impl FnMut(&str, usize, &str)) {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel_str = rel.to_string_lossy().replace('\\', "/");
    if ignore.should_ignore(&rel_str) {
        return;
    }
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    for (idx, line) in content.lines().enumerate() {
        visit(&rel_str, idx + 1, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn finds_matching_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.txt"), "line1\nline2\n").unwrap();

        let tool = GrepSearchTool::new(dir.path().to_path_buf());
        let result = tool.execute(&json!({"pattern": "line1"})).await;
        assert!(result.content[0].text.contains("sample.txt:1"));
    }

    #[tokio::test]
    async fn reports_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.txt"), "hello\n").unwrap();

        let tool = GrepSearchTool::new(dir.path().to_path_buf());
        let result = tool.execute(&json!({"pattern": "nonexistent"})).await;
        assert!(result.content[0].text.contains("No matches"));
    }
}
