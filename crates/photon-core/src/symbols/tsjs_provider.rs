use once_cell::sync::Lazy;
use regex::Regex;

use super::provider::{Symbol, SymbolKind, SymbolProvider, SymbolSource};

static FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s+([A-Za-z_$]\w*)").unwrap());
static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?class\s+([A-Za-z_$]\w*)").unwrap());
static INTERFACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:export\s+)?interface\s+([A-Za-z_$]\w*)").unwrap());
static CONST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*export\s+(?:const|let|var)\s+([A-Za-z_$]\w*)").unwrap()
});

pub struct TsJsSymbolProvider;

impl SymbolProvider for TsJsSymbolProvider {
    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext, "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs")
    }

    fn extract_symbols(&self, content: &str, rel_path: &str) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let push = |name: &str, kind: SymbolKind, symbols: &mut Vec<Symbol>| {
                symbols.push(Symbol {
                    name: name.to_string(),
                    kind,
                    source: SymbolSource::Regex,
                    path: rel_path.to_string(),
                    line: line_no,
                    end_line: 0,
                    signature: line.trim().to_string(),
                });
            };

            if let Some(caps) = FUNCTION_RE.captures(line) {
                push(&caps[1], SymbolKind::Function, &mut symbols);
            } else if let Some(caps) = CLASS_RE.captures(line) {
                push(&caps[1], SymbolKind::Class, &mut symbols);
            } else if let Some(caps) = INTERFACE_RE.captures(line) {
                push(&caps[1], SymbolKind::Class, &mut symbols);
            } else if let Some(caps) = CONST_RE.captures(line) {
                push(&caps[1], SymbolKind::Other, &mut symbols);
            }
        }
        symbols
    }
}
