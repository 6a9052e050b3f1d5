use once_cell::sync::Lazy;
use regex::Regex;

use super::provider::{Symbol, SymbolKind, SymbolProvider, SymbolSource};

static FN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+([A-Za-z_]\w*)").unwrap());
static STRUCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z_]\w*)").unwrap());
static ENUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?enum\s+([A-Za-z_]\w*)").unwrap());
static TRAIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?trait\s+([A-Za-z_]\w*)").unwrap());
static IMPL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*impl(?:<[^>]*>)?\s+(?:[A-Za-z_][\w:<>, ]*\s+for\s+)?([A-Za-z_]\w*)").unwrap()
});
static MOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+([A-Za-z_]\w*)").unwrap());

pub struct RustSymbolProvider;

impl SymbolProvider for RustSymbolProvider {
    fn supports_extension(&self, ext: &str) -> bool {
        ext == "rs"
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

            if let Some(caps) = FN_RE.captures(line) {
                push(&caps[1], SymbolKind::Function, &mut symbols);
            } else if let Some(caps) = STRUCT_RE.captures(line) {
                push(&caps[1], SymbolKind::Struct, &mut symbols);
            } else if let Some(caps) = ENUM_RE.captures(line) {
                push(&caps[1], SymbolKind::Class, &mut symbols);
            } else if let Some(caps) = TRAIT_RE.captures(line) {
                push(&caps[1], SymbolKind::Class, &mut symbols);
            } else if let Some(caps) = IMPL_RE.captures(line) {
                push(&caps[1], SymbolKind::Method, &mut symbols);
            } else if let Some(caps) = MOD_RE.captures(line) {
                push(&caps[1], SymbolKind::Other, &mut symbols);
            }
        }
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_functions_and_structs() {
        let provider = RustSymbolProvider;
        let content = "pub struct Foo;\n\nimpl Foo {\n    pub fn bar(&self) {}\n}\n";
        let symbols = provider.extract_symbols(content, "src/foo.rs");
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Foo"));
        assert!(names.contains(&"bar"));
    }
}
