//! `lsp_definition`, `lsp_references`, `lsp_hover`, `lsp_document_symbols`,
//! `lsp_diagnostics` — thin delegations to `LspSessionManager`, converting
//! the model-facing 1-based `line`/`character` into the LSP wire protocol's
//! 0-based `Position` at this boundary (see SPEC_FULL.md §3).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use photon_core::lsp::{LspSessionManager, Position};
use photon_core::tools::{Tool, ToolResult, ToolSchema};
use serde_json::Value;

const DEFAULT_DIAGNOSTICS_TIMEOUT_MS: u64 = 2000;

fn position_from_args(arguments: &Value) -> Option<Position> {
    let line = arguments.get("line").and_then(Value::as_u64)?;
    let character = arguments.get("character").and_then(Value::as_u64)?;
    Some(Position {
        line: (line.max(1) - 1) as u32,
        character: (character.max(1) - 1) as u32,
    })
}

fn resolve_path(arguments: &Value, workspace_root: &std::path::Path) -> Option<PathBuf> {
    arguments
        .get("path")
        .and_then(Value::as_str)
        .map(|rel| workspace_root.join(rel))
}

macro_rules! lsp_tool {
    ($name:ident, $tool_name:literal, $description:literal) => {
        pub struct $name {
            workspace_root: PathBuf,
            lsp: Arc<LspSessionManager>,
        }

        impl $name {
            pub fn new(workspace_root: PathBuf, lsp: Arc<LspSessionManager>) -> Self {
                Self { workspace_root, lsp }
            }
        }
    };
}

lsp_tool!(
    LspDefinitionTool,
    "lsp_definition",
    "Find the definition location of the symbol at a position"
);

#[async_trait]
impl Tool for LspDefinitionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("lsp_definition", "Find the definition location of the symbol at a position")
            .with_param("path", "workspace-relative file path", true)
            .with_param("line", "1-based line number", true)
            .with_param("character", "1-based character offset", true)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let (Some(abs_path), Some(position)) = (
            resolve_path(arguments, &self.workspace_root),
            position_from_args(arguments),
        ) else {
            return ToolResult::error("lsp_definition requires `path`, `line`, and `character`");
        };
        match self.lsp.go_to_definition(&abs_path, position).await {
            Ok(locations) if locations.is_empty() => ToolResult::text("No definition found"),
            Ok(locations) => ToolResult::text(format_locations(&locations)),
            Err(err) => ToolResult::error(err.to_string()),
        }
    }
}

lsp_tool!(
    LspReferencesTool,
    "lsp_references",
    "Find references to the symbol at a position"
);

#[async_trait]
impl Tool for LspReferencesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("lsp_references", "Find references to the symbol at a position")
            .with_param("path", "workspace-relative file path", true)
            .with_param("line", "1-based line number", true)
            .with_param("character", "1-based character offset", true)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let (Some(abs_path), Some(position)) = (
            resolve_path(arguments, &self.workspace_root),
            position_from_args(arguments),
        ) else {
            return ToolResult::error("lsp_references requires `path`, `line`, and `character`");
        };
        match self.lsp.find_references(&abs_path, position).await {
            Ok(locations) if locations.is_empty() => ToolResult::text("No references found"),
            Ok(locations) => ToolResult::text(format_locations(&locations)),
            Err(err) => ToolResult::error(err.to_string()),
        }
    }
}

lsp_tool!(LspHoverTool, "lsp_hover", "Show hover information at a position");

#[async_trait]
impl Tool for LspHoverTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("lsp_hover", "Show hover information at a position")
            .with_param("path", "workspace-relative file path", true)
            .with_param("line", "1-based line number", true)
            .with_param("character", "1-based character offset", true)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let (Some(abs_path), Some(position)) = (
            resolve_path(arguments, &self.workspace_root),
            position_from_args(arguments),
        ) else {
            return ToolResult::error("lsp_hover requires `path`, `line`, and `character`");
        };
        match self.lsp.hover(&abs_path, position).await {
            Ok(Some(info)) => ToolResult::text(info.contents),
            Ok(None) => ToolResult::text("No hover information"),
            Err(err) => ToolResult::error(err.to_string()),
        }
    }
}

lsp_tool!(
    LspDocumentSymbolsTool,
    "lsp_document_symbols",
    "List the document symbol tree for a file"
);

#[async_trait]
impl Tool for LspDocumentSymbolsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("lsp_document_symbols", "List the document symbol tree for a file")
            .with_param("path", "workspace-relative file path", true)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(abs_path) = resolve_path(arguments, &self.workspace_root) else {
            return ToolResult::error("lsp_document_symbols requires a `path` argument");
        };
        match self.lsp.document_symbols(&abs_path).await {
            Ok(symbols) if symbols.is_empty() => ToolResult::text("No symbols found"),
            Ok(symbols) => ToolResult::text(format_document_symbols(&symbols, 0)),
            Err(err) => ToolResult::error(err.to_string()),
        }
    }
}

lsp_tool!(
    LspDiagnosticsTool,
    "lsp_diagnostics",
    "Fetch cached or freshly-published diagnostics for a file"
);

#[async_trait]
impl Tool for LspDiagnosticsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("lsp_diagnostics", "Fetch cached or freshly-published diagnostics for a file")
            .with_param("path", "workspace-relative file path", true)
            .with_param("timeout_ms", "how long to wait for a fresh publish (default 2000)", false)
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(abs_path) = resolve_path(arguments, &self.workspace_root) else {
            return ToolResult::error("lsp_diagnostics requires a `path` argument");
        };
        let timeout_ms = arguments
            .get("timeout_ms")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_DIAGNOSTICS_TIMEOUT_MS);

        match self.lsp.diagnostics(&abs_path, timeout_ms).await {
            Ok(diagnostics) if diagnostics.is_empty() => ToolResult::text("No diagnostics"),
            Ok(diagnostics) => {
                let lines: Vec<String> = diagnostics
                    .iter()
                    .map(|d| {
                        format!(
                            "{}:{} [{}] {}",
                            d.range.start.line + 1,
                            d.range.start.character + 1,
                            severity_name(d.severity),
                            d.message
                        )
                    })
                    .collect();
                ToolResult::text(lines.join("\n"))
            }
            Err(err) => ToolResult::error(err.to_string()),
        }
    }
}

fn severity_name(severity: i32) -> &'static str {
    match severity {
        1 => "error",
        2 => "warning",
        3 => "info",
        4 => "hint",
        _ => "unknown",
    }
}

fn format_locations(locations: &[photon_core::lsp::Location]) -> String {
    locations
        .iter()
        .map(|loc| {
            format!(
                "{}:{}:{}",
                loc.uri,
                loc.range.start.line + 1,
                loc.range.start.character + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_document_symbols(symbols: &[photon_core::lsp::DocumentSymbol], depth: usize) -> String {
    let mut out = String::new();
    for symbol in symbols {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} (line {})\n", symbol.name, symbol.range.start.line + 1));
        if !symbol.children.is_empty() {
            out.push_str(&format_document_symbols(&symbol.children, depth + 1));
        }
    }
    out
}
