use once_cell::sync::Lazy;
use regex::Regex;

use super::provider::{Symbol, SymbolKind, SymbolProvider, SymbolSource};

static DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)").unwrap());
static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*class\s+([A-Za-z_]\w*)").unwrap());

pub struct PySymbolProvider;

impl SymbolProvider for PySymbolProvider {
    fn supports_extension(&self, ext: &str) -> bool {
        ext == "py"
    }

    fn extract_symbols(&self, content: &str, rel_path: &str) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            if let Some(caps) = DEF_RE.captures(line) {
                symbols.push(Symbol {
                    name: caps[1].to_string(),
                    kind: SymbolKind::Function,
                    source: SymbolSource::Regex,
                    path: rel_path.to_string(),
                    line: line_no,
                    end_line: 0,
                    signature: line.trim().to_string(),
                });
            } else if let Some(caps) = CLASS_RE.captures(line) {
                symbols.push(Symbol {
                    name: caps[1].to_string(),
                    kind: SymbolKind::Class,
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
