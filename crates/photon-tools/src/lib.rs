//! Concrete `photon_core::tools::Tool` implementors for the Photon tool
//! gateway, grounded in `sage-tools`' `file_ops`/`code_intelligence` tools
//! but narrowed to the closed set the gateway's state machine enforces.

mod authorize;
mod grep;
mod list_files;
mod lsp;
mod read;
mod skill_read;
mod symbol_search;
mod write;

pub use authorize::AuthorizeTool;
pub use grep::GrepSearchTool;
pub use list_files::ListFilesTool;
pub use lsp::{
    LspDefinitionTool, LspDiagnosticsTool, LspDocumentSymbolsTool, LspHoverTool, LspReferencesTool,
};
pub use read::ReadTool;
pub use skill_read::SkillReadTool;
pub use symbol_search::SymbolSearchTool;
pub use write::WriteTool;

/// Registers every concrete tool this crate provides onto `gateway`, under
/// the tool names `photon_core::tools::gateway::ToolGateway`'s precondition
/// table expects.
pub fn register_all(
    gateway: &mut photon_core::tools::ToolGateway,
    index: std::sync::Arc<photon_core::symbols::SymbolIndex>,
    skills: std::sync::Arc<photon_core::skills::SkillManager>,
    lsp: Option<std::sync::Arc<photon_core::lsp::LspSessionManager>>,
) {
    let root = gateway.workspace_root().to_path_buf();

    gateway.register("grep_search", Box::new(GrepSearchTool::new(root.clone())));
    gateway.register("read", Box::new(ReadTool::new(root.clone())));
    gateway.register("write", Box::new(WriteTool::new(root.clone())));
    gateway.register("authorize", Box::new(AuthorizeTool));
    gateway.register("list_files", Box::new(ListFilesTool::new(root.clone())));
    gateway.register(
        "symbol_search",
        Box::new(SymbolSearchTool::new(index.clone())),
    );
    gateway.register("skill_read", Box::new(SkillReadTool::new(skills.clone())));

    if let Some(lsp) = lsp {
        gateway.register(
            "lsp_definition",
            Box::new(LspDefinitionTool::new(root.clone(), lsp.clone())),
        );
        gateway.register(
            "lsp_references",
            Box::new(LspReferencesTool::new(root.clone(), lsp.clone())),
        );
        gateway.register(
            "lsp_hover",
            Box::new(LspHoverTool::new(root.clone(), lsp.clone())),
        );
        gateway.register(
            "lsp_document_symbols",
            Box::new(LspDocumentSymbolsTool::new(root.clone(), lsp.clone())),
        );
        gateway.register(
            "lsp_diagnostics",
            Box::new(LspDiagnosticsTool::new(root, lsp)),
        );
    }
}
