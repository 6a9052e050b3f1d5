//! Scan-ignore rules shared by the symbol index and `list_files`.
//!
//! Any path segment beginning with `.` is always ignored (built in, not
//! configurable). Beyond that, a path is ignored if its forward-slash
//! generic form matches any of the configured regexes. Invalid regexes are
//! dropped at construction rather than failing the whole rule set, matching
//! the original's try/catch-per-pattern behavior.

use regex::Regex;

const DEFAULT_PATTERNS: &[&str] = &["node_modules", "build", r"\.venv", "dist"];

pub struct ScanIgnoreRules {
    patterns: Vec<Regex>,
}

impl ScanIgnoreRules {
    pub fn new(patterns: &[String]) -> Self {
        let source: Vec<&str> = if patterns.is_empty() {
            DEFAULT_PATTERNS.to_vec()
        } else {
            patterns.iter().map(String::as_str).collect()
        };

        let compiled = source
            .into_iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self { patterns: compiled }
    }

    /// `rel_path` is a workspace-relative path; it may use either separator,
    /// it is normalized to `/` before matching.
    pub fn should_ignore(&self, rel_path: &str) -> bool {
        if rel_path
            .split(['/', '\\'])
            .any(|segment| segment.starts_with('.') && segment != "." && segment != "..")
        {
            return true;
        }

        let generic = rel_path.replace('\\', "/");
        self.patterns.iter().any(|re| re.is_match(&generic))
    }
}

impl Default for ScanIgnoreRules {
    fn default() -> Self {
        Self::new(&[])
    }
}
