use once_cell::sync::Lazy;
use regex::Regex;

use super::provider::{Symbol, SymbolKind, SymbolProvider, SymbolSource};

/// Loose, language-agnostic fallback: `word(` call-like declarations and
/// top-level `word = ` assignments. Only consulted when
/// `symbol_fallback_on_empty` is set and the preferred provider found
/// nothing for the file's extension.
static CALL_LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]\w{2,})\s*\(").unwrap());
static ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*[:=]\s*[^=]").unwrap());

pub struct GenericRegexSymbolProvider;

impl SymbolProvider for GenericRegexSymbolProvider {
    fn supports_extension(&self, _ext: &str) -> bool {
        true
    }

    fn extract_symbols(&self, content: &str, rel_path: &str) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            if let Some(caps) = CALL_LIKE_RE.captures(line) {
                symbols.push(Symbol {
                    name: caps[1].to_string(),
                    kind: SymbolKind::Other,
                    source: SymbolSource::Regex,
                    path: rel_path.to_string(),
                    line: line_no,
                    end_line: 0,
                    signature: line.trim().to_string(),
                });
            } else if let Some(caps) = ASSIGN_RE.captures(line) {
                symbols.push(Symbol {
                    name: caps[1].to_string(),
                    kind: SymbolKind::Other,
                    source: SymbolSource::Regex,
                    path: rel_path.to_string(),
                    line: line_no,
                    end_line: 0,
                    signature: line.trim().to_string(),
                });
            }
        }
        symbols
    }
}
