//! `symbol_search` — a thin delegation to `SymbolIndex::search`.

use std::sync::Arc;

use async_trait::async_trait;
use photon_core::symbols::SymbolIndex;
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use serde_json::Value;

pub struct SymbolSearchTool {
    index: Arc<SymbolIndex>,
}

impl SymbolSearchTool {
    pub fn new(index: Arc<SymbolIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for SymbolSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("symbol_search", "Search the workspace symbol index by substring")
            .with_param("query", "case-insensitive substring to match against symbol names", true)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(query) = arguments.get("query").and_then(Value::as_str) else {
            return ToolResult::error("symbol_search requires a `query` argument");
        };

        let symbols = self.index.search(query);
        if symbols.is_empty() {
            return ToolResult::text(format!("No symbols matching `{query}`"));
        }

        let lines: Vec<String> = symbols
            .iter()
            .map(|s| format!("{}:{} {:?} {}", s.path, s.line, s.kind, s.name))
            .collect();
        ToolResult::text(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photon_core::symbols::rust_provider::RustSymbolProvider;
    use photon_core::workspace::ScanIgnoreRules;

    #[tokio::test]
    async fn finds_registered_symbol() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.rs"), "pub fn foo() {}\n").unwrap();

        let mut index = SymbolIndex::new(dir.path().to_path_buf(), ScanIgnoreRules::default(), false);
        index.register_provider(Box::new(RustSymbolProvider));
        index.update_file("lib.rs");

        let tool = SymbolSearchTool::new(Arc::new(index));
        let result = tool.execute(&serde_json::json!({"query": "foo"})).await;
        assert!(result.content[0].text.contains("foo"));
    }
}
