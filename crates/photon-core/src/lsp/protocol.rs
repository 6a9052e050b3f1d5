//! LSP wire types and the `file://` URI conversion helpers.
//!
//! `path_to_uri`/`uri_to_path` are hand-rolled rather than built on the
//! `url` crate: the round-trip must be exact for arbitrary workspace paths,
//! including Windows drive letters, and percent-encoding edge cases in
//! general-purpose URL crates are not guaranteed to invert losslessly for
//! every path this index will see.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationLink {
    #[serde(rename = "targetUri")]
    pub target_uri: String,
    #[serde(rename = "targetRange")]
    pub target_range: Range,
    #[serde(rename = "targetSelectionRange")]
    pub target_selection_range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: i32,
    pub range: Range,
    #[serde(rename = "selectionRange")]
    pub selection_range: Range,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub children: Vec<DocumentSymbol>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    #[serde(default)]
    pub severity: i32,
    pub message: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverInfo {
    pub contents: String,
    pub range: Option<Range>,
}

/// Build a `file://` URI from an absolute path.
pub fn path_to_uri(absolute_path: &str) -> String {
    let normalized = absolute_path.replace('\\', "/");
    if normalized.len() >= 2 && normalized.as_bytes()[1] == b':' {
        // Windows drive letter: file:///C:/foo/bar
        format!("file:///{normalized}")
    } else if let Some(stripped) = normalized.strip_prefix('/') {
        format!("file:///{stripped}")
    } else {
        format!("file:///{normalized}")
    }
}

/// Inverse of [`path_to_uri`].
pub fn uri_to_path(uri: &str) -> String {
    let stripped = uri.strip_prefix("file://").unwrap_or(uri);
    let stripped = stripped.strip_prefix('/').unwrap_or(stripped);
    if stripped.len() >= 2 && stripped.as_bytes()[1] == b':' {
        stripped.to_string()
    } else {
        format!("/{stripped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_path_round_trips() {
        let uri = path_to_uri("/home/user/project/src/lib.rs");
        assert_eq!(uri, "file:///home/user/project/src/lib.rs");
        assert_eq!(uri_to_path(&uri), "/home/user/project/src/lib.rs");
    }

    #[test]
    fn windows_path_round_trips() {
        let uri = path_to_uri(r"C:\Users\dev\project\src\lib.rs");
        assert_eq!(uri, "file:///C:/Users/dev/project/src/lib.rs");
        assert_eq!(uri_to_path(&uri), "C:/Users/dev/project/src/lib.rs");
    }
}
