//! Typed configuration document.
//!
//! Schema and defaults follow the original `ConfigManager` one-to-one:
//! required `llm.*` and `agent.context_threshold`/`agent.file_extensions`
//! fail the load eagerly, everything else defaults the way the original
//! constructor does (`value("key", default)`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PhotonError, PhotonResult, ResultExt};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_role: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LspServerConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeSitterLanguageConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub library_path: String,
    #[serde(default)]
    pub symbol: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub context_threshold: usize,
    pub file_extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub use_builtin_tools: bool,
    #[serde(default)]
    pub search_api_key: String,
    #[serde(default)]
    pub skill_roots: Vec<String>,
    #[serde(default)]
    pub enable_tree_sitter: bool,
    #[serde(default)]
    pub symbol_fallback_on_empty: bool,
    #[serde(default = "default_true")]
    pub enable_lsp: bool,
    #[serde(default)]
    pub enable_debug: bool,
    #[serde(default)]
    pub lsp_server_path: String,
    #[serde(default)]
    pub lsp_root_uri: String,
    #[serde(default)]
    pub lsp_servers: Vec<LspServerConfig>,
    #[serde(default)]
    pub tree_sitter_languages: Vec<TreeSitterLanguageConfig>,
    #[serde(default)]
    pub symbol_ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotonConfig {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    #[serde(default)]
    pub mcp_servers: Vec<McpServerConfig>,
}

impl PhotonConfig {
    /// Load and validate the config document at `path`.
    ///
    /// Entries with an empty `command`/`extensions` are dropped the same
    /// way the original constructor skips them while building
    /// `lspServers`/`treeSitterLanguages`.
    pub fn load(path: impl AsRef<Path>) -> PhotonResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .io_context(format!("reading config file {}", path.display()))?;

        let mut cfg: PhotonConfig = serde_json::from_str(&content).map_err(|source| {
            PhotonError::Config {
                path: path.to_path_buf(),
                source,
            }
        })?;

        cfg.agent
            .lsp_servers
            .retain(|server| !server.command.is_empty());
        cfg.agent
            .tree_sitter_languages
            .retain(|lang| !lang.name.is_empty() && !lang.extensions.is_empty());

        Ok(cfg)
    }
}

/// Fixed rule text rewritten into `<project>/.photon/rules` at startup.
pub const PHOTON_RULES: &str = "\
# PhotonRule v1.0
1. MIN_IO: No full-file reads >500 lines.
2. PATCH_ONLY: No full-file overwrites.
3. SEARCH_FIRST: Map symbols before reading.
4. DECOUPLE: Split files >1000 lines.
5. JSON_STRICT: Validate schemas.
6. ASYNC_SAFE: Respect async flows.
";

/// Ensures `<project>/.photon/rules` exists with the fixed content,
/// overwriting any prior copy.
pub fn ensure_photon_rules(project_root: impl AsRef<Path>) -> PhotonResult<()> {
    let photon_dir = project_root.as_ref().join(".photon");
    std::fs::create_dir_all(&photon_dir)
        .io_context(format!("creating {}", photon_dir.display()))?;
    let rules_path = photon_dir.join("rules");
    std::fs::write(&rules_path, PHOTON_RULES)
        .io_context(format!("writing {}", rules_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "llm": {"api_key": "k", "base_url": "https://x", "model": "m", "system_role": "s"},
                "agent": {"context_threshold": 1000, "file_extensions": [".rs"]}
            }"#,
        )
        .unwrap();

        let cfg = PhotonConfig::load(&path).unwrap();
        assert!(cfg.agent.use_builtin_tools);
        assert!(cfg.agent.enable_lsp);
        assert!(!cfg.agent.enable_debug);
        assert_eq!(cfg.agent.search_api_key, "");
    }

    #[test]
    fn load_drops_lsp_servers_with_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "llm": {"api_key": "k", "base_url": "https://x", "model": "m", "system_role": "s"},
                "agent": {
                    "context_threshold": 1000,
                    "file_extensions": [".rs"],
                    "lsp_servers": [
                        {"name": "rust", "command": "rust-analyzer", "extensions": [".rs"]},
                        {"name": "empty", "command": "", "extensions": []}
                    ]
                }
            }"#,
        )
        .unwrap();

        let cfg = PhotonConfig::load(&path).unwrap();
        assert_eq!(cfg.agent.lsp_servers.len(), 1);
        assert_eq!(cfg.agent.lsp_servers[0].name, "rust");
    }

    #[test]
    fn ensure_rules_writes_fixed_content() {
        let dir = tempfile::tempdir().unwrap();
        ensure_photon_rules(dir.path()).unwrap();
        let content = std::fs::read_to_string(dir.path().join(".photon/rules")).unwrap();
        assert_eq!(content, PHOTON_RULES);
    }
}
