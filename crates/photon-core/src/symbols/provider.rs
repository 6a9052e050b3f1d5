//! Symbol value type and the pluggable extraction trait.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Function,
    Struct,
    Method,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolSource {
    NativeParser,
    Regex,
    Lsp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub source: SymbolSource,
    /// Workspace-relative path, forward-slash separated.
    pub path: String,
    /// 1-based start line.
    pub line: usize,
    /// 0 means unknown.
    pub end_line: usize,
    pub signature: String,
}

/// A pluggable, stateless symbol extractor for one language/family.
///
/// Extraction must be pure: given the same `content`, the same symbols come
/// out every time. An empty result is not an error — it just means this
/// file had nothing this provider recognized.
pub trait SymbolProvider: Send + Sync {
    fn supports_extension(&self, ext: &str) -> bool;

    fn extract_symbols(&self, content: &str, rel_path: &str) -> Vec<Symbol>;
}
