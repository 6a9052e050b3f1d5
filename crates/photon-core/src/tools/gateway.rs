//! The tool-access state machine.
//!
//! `ToolSession` is owned by one `ToolGateway` instance — never ambient or
//! global — so a test can construct an isolated gateway and assert on its
//! state transitions without any cross-test leakage. Preconditions are
//! checked here, before a tool's own `execute` runs, so the state machine
//! is enforced in one place regardless of which tool is being called.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::tools::types::{Tool, ToolCall, ToolResult};

#[derive(Debug, Default, Clone)]
pub struct ToolSession {
    pub grep_performed: bool,
    pub read_paths: HashSet<String>,
    pub authorized: bool,
}

impl ToolSession {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct ToolGateway {
    workspace_root: PathBuf,
    session: ToolSession,
    tools: Vec<(&'static str, Box<dyn Tool>)>,
}

impl ToolGateway {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            session: ToolSession::new(),
            tools: Vec::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, tool: Box<dyn Tool>) {
        self.tools.push((name, tool));
    }

    pub fn session(&self) -> &ToolSession {
        &self.session
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Schemas of every registered tool, in registration order.
    pub fn schemas(&self) -> Vec<crate::tools::types::ToolSchema> {
        self.tools.iter().map(|(_, tool)| tool.schema()).collect()
    }

    /// Resolves a workspace-relative path and rejects any attempt to
    /// escape the workspace root via `..` segments.
    pub fn resolve_path(&self, rel_path: &str) -> Result<PathBuf, ToolResult> {
        let candidate = self.workspace_root.join(rel_path);
        let normalized = normalize(&candidate);
        if !normalized.starts_with(&self.workspace_root) {
            return Err(ToolResult::error(format!(
                "path escapes workspace root: {rel_path}"
            )));
        }
        Ok(normalized)
    }

    pub async fn call(&mut self, call: &ToolCall) -> ToolResult {
        if let Err(result) = self.check_path_containment(call) {
            return result;
        }
        if let Some(result) = self.check_precondition(call) {
            return result;
        }

        let Some((_, tool)) = self.tools.iter().find(|(name, _)| *name == call.name) else {
            return ToolResult::error(format!("unknown tool: {}", call.name));
        };

        let result = tool.execute(&call.arguments).await;
        self.apply_postcondition(call, &result);
        result
    }

    /// §4.5: "Workspace paths are resolved relative to the workspace root
    /// and must not escape it." Every tool that takes a `path` argument is
    /// checked here, once, before `execute` runs, rather than trusting each
    /// tool to repeat the containment check itself.
    fn check_path_containment(&self, call: &ToolCall) -> Result<(), ToolResult> {
        let Some(path) = call.arguments.get("path").and_then(Value::as_str) else {
            return Ok(());
        };
        self.resolve_path(path).map(|_| ())
    }

    fn check_precondition(&self, call: &ToolCall) -> Option<ToolResult> {
        match call.name.as_str() {
            "read" => {
                if !self.session.grep_performed {
                    return Some(ToolResult::error(
                        "请先执行 grep_search 定位目标后再 read",
                    ));
                }
                None
            }
            "write" => {
                let Some(path) = call.arguments.get("path").and_then(Value::as_str) else {
                    return Some(ToolResult::error("write requires a `path` argument"));
                };
                let is_partial_write = call.arguments.get("operation").is_some();

                if !self.session.authorized {
                    return Some(ToolResult::requires_confirmation(
                        "写入需要先调用 authorize 进行授权",
                    ));
                }

                if is_partial_write {
                    if !self.session.read_paths.contains(path) {
                        return Some(ToolResult::error("写入前请先 read 目标文件"));
                    }
                } else {
                    let abs_path = self.workspace_root.join(path);
                    if abs_path.exists() {
                        return Some(ToolResult::error("禁止对已存在文件进行整文件覆写"));
                    }
                }
                None
            }
            // `list_files`, `symbol_search`, `skill_read`, and the `lsp_*`
            // tools carry no precondition beyond the subsystem existing.
            _ => None,
        }
    }

    fn apply_postcondition(&mut self, call: &ToolCall, result: &ToolResult) {
        if !result.is_ok() {
            return;
        }
        match call.name.as_str() {
            "grep_search" => {
                self.session.grep_performed = true;
            }
            "read" => {
                if let Some(path) = call.arguments.get("path").and_then(Value::as_str) {
                    self.session.read_paths.insert(path.to_string());
                }
                // Each read requires a fresh grep before it (spec.md S1).
                self.session.grep_performed = false;
            }
            "authorize" => {
                self.session.authorized = true;
            }
            _ => {}
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> crate::tools::types::ToolSchema {
            crate::tools::types::ToolSchema::new("echo", "echoes back")
        }

        async fn execute(&self, arguments: &Value) -> ToolResult {
            ToolResult::text(arguments.to_string())
        }
    }

    fn gateway() -> ToolGateway {
        let mut gw = ToolGateway::new("/workspace");
        gw.register("grep_search", Box::new(EchoTool));
        gw.register("read", Box::new(EchoTool));
        gw.register("write", Box::new(EchoTool));
        gw.register("authorize", Box::new(EchoTool));
        gw
    }

    #[tokio::test]
    async fn read_before_grep_is_rejected() {
        let mut gw = gateway();
        let result = gw
            .call(&ToolCall {
                name: "read".into(),
                arguments: json!({"path": "src/lib.rs"}),
            })
            .await;
        assert!(result.is_error());
        assert!(result.content[0].text.contains("grep_search"));
    }

    /// S2: a partial write with no prior `authorize` asks for confirmation
    /// rather than erroring outright.
    #[tokio::test]
    async fn partial_write_without_authorize_requires_confirmation() {
        let mut gw = gateway();
        let result = gw
            .call(&ToolCall {
                name: "write".into(),
                arguments: json!({
                    "path": "sample.txt",
                    "operation": "replace",
                    "start_line": 1,
                    "end_line": 1,
                    "content": "updated",
                }),
            })
            .await;
        assert_eq!(result.status.as_deref(), Some("requires_confirmation"));
    }

    /// S3: authorized but never read — rejected naming the missing read.
    #[tokio::test]
    async fn partial_write_after_authorize_but_before_read_is_rejected() {
        let mut gw = gateway();
        gw.call(&ToolCall {
            name: "authorize".into(),
            arguments: json!({}),
        })
        .await;

        let result = gw
            .call(&ToolCall {
                name: "write".into(),
                arguments: json!({
                    "path": "sample.txt",
                    "operation": "replace",
                    "start_line": 1,
                    "end_line": 1,
                    "content": "updated",
                }),
            })
            .await;
        assert!(result.is_error());
        assert!(result.content[0].text.contains("写入前请先 read"));
    }

    /// S4: authorize, grep, read, then the same write succeeds.
    #[tokio::test]
    async fn partial_write_after_authorize_grep_and_read_succeeds() {
        let mut gw = gateway();
        gw.call(&ToolCall {
            name: "authorize".into(),
            arguments: json!({}),
        })
        .await;
        gw.call(&ToolCall {
            name: "grep_search".into(),
            arguments: json!({"pattern": "line1"}),
        })
        .await;
        gw.call(&ToolCall {
            name: "read".into(),
            arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
        })
        .await;

        let result = gw
            .call(&ToolCall {
                name: "write".into(),
                arguments: json!({
                    "path": "sample.txt",
                    "operation": "replace",
                    "start_line": 1,
                    "end_line": 1,
                    "content": "updated",
                }),
            })
            .await;
        assert!(!result.is_error());
    }

    /// S5: a full-file overwrite of an existing file is always forbidden,
    /// even after authorize/grep/read.
    #[tokio::test]
    async fn full_overwrite_of_existing_file_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.txt"), "old").unwrap();

        let mut gw = ToolGateway::new(dir.path());
        gw.register("grep_search", Box::new(EchoTool));
        gw.register("read", Box::new(EchoTool));
        gw.register("write", Box::new(EchoTool));
        gw.register("authorize", Box::new(EchoTool));

        gw.call(&ToolCall {
            name: "authorize".into(),
            arguments: json!({}),
        })
        .await;
        gw.call(&ToolCall {
            name: "grep_search".into(),
            arguments: json!({"pattern": "old"}),
        })
        .await;
        gw.call(&ToolCall {
            name: "read".into(),
            arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
        })
        .await;

        let denied = gw
            .call(&ToolCall {
                name: "write".into(),
                arguments: json!({"path": "sample.txt", "content": "all new"}),
            })
            .await;
        assert!(denied.is_error());
        assert!(denied.content[0].text.contains("禁止对已存在文件进行整文件覆写"));
    }

    /// A full-file write is allowed once authorized, provided the target
    /// does not already exist.
    #[tokio::test]
    async fn full_write_of_new_file_is_allowed_once_authorized() {
        let dir = tempfile::tempdir().unwrap();
        let mut gw = ToolGateway::new(dir.path());
        gw.register("write", Box::new(EchoTool));
        gw.register("authorize", Box::new(EchoTool));

        gw.call(&ToolCall {
            name: "authorize".into(),
            arguments: json!({}),
        })
        .await;
        let result = gw
            .call(&ToolCall {
                name: "write".into(),
                arguments: json!({"path": "new.txt", "content": "hi"}),
            })
            .await;
        assert!(!result.is_error());
    }

    /// S1: each `read` consumes the `grep_search` flag, so a second read
    /// immediately after the first is rejected again.
    #[tokio::test]
    async fn read_requires_a_fresh_grep_each_time() {
        let mut gw = gateway();
        let rejected = gw
            .call(&ToolCall {
                name: "read".into(),
                arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
            })
            .await;
        assert!(rejected.content[0].text.contains("grep_search"));

        gw.call(&ToolCall {
            name: "grep_search".into(),
            arguments: json!({"pattern": "line1"}),
        })
        .await;
        let allowed = gw
            .call(&ToolCall {
                name: "read".into(),
                arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
            })
            .await;
        assert!(!allowed.is_error());

        let rejected_again = gw
            .call(&ToolCall {
                name: "read".into(),
                arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
            })
            .await;
        assert!(rejected_again.content[0].text.contains("grep_search"));
    }

    #[test]
    fn resolve_path_rejects_escape() {
        let gw = ToolGateway::new("/workspace");
        assert!(gw.resolve_path("../etc/passwd").is_err());
        assert!(gw.resolve_path("src/lib.rs").is_ok());
    }

    /// A `path` argument that escapes the workspace root is rejected by
    /// `call()` itself, before the tool's own `execute` ever runs.
    #[tokio::test]
    async fn call_rejects_path_escaping_workspace_root() {
        let mut gw = gateway();
        gw.call(&ToolCall {
            name: "grep_search".into(),
            arguments: json!({"pattern": "x"}),
        })
        .await;

        let result = gw
            .call(&ToolCall {
                name: "read".into(),
                arguments: json!({"path": "../../etc/passwd", "start_line": 1, "end_line": 1}),
            })
            .await;
        assert!(result.is_error());
        assert!(result.content[0].text.contains("escapes workspace root"));
    }
}
