//! Routes navigation/diagnostic queries to the right [`LspSession`] by file
//! extension, lazily spawning and `initialize`-ing one session per
//! configured logical server name — grounded in the pack's `LspManager`
//! pattern (one client per language, lazily created and cached by name)
//! rather than one session per file.

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::LspServerConfig;
use crate::error::{PhotonError, PhotonResult};
use crate::lsp::protocol::{path_to_uri, Position};
use crate::lsp::session::LspSession;
use crate::lsp::{Diagnostic, DocumentSymbol, HoverInfo, Location};

/// One entry in the extension routing table: an extension (without the
/// leading dot) mapped to the logical server name that handles it.
struct Route {
    extension: String,
    server_name: String,
}

pub struct LspSessionManager {
    root_uri: String,
    servers: HashMap<String, String>,
    routes: Vec<Route>,
    sessions: Mutex<HashMap<String, std::sync::Arc<LspSession>>>,
}

impl LspSessionManager {
    pub fn new(root_uri: impl Into<String>, servers: &[LspServerConfig]) -> Self {
        let mut command_by_name = HashMap::new();
        let mut routes = Vec::new();
        for server in servers {
            command_by_name.insert(server.name.clone(), server.command.clone());
            for ext in &server.extensions {
                routes.push(Route {
                    extension: ext.trim_start_matches('.').to_string(),
                    server_name: server.name.clone(),
                });
            }
        }
        Self {
            root_uri: root_uri.into(),
            servers: command_by_name,
            routes,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn server_name_for_extension(&self, ext: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|route| route.extension == ext)
            .map(|route| route.server_name.as_str())
    }

    async fn session_for_path(&self, abs_path: &Path) -> PhotonResult<std::sync::Arc<LspSession>> {
        let ext = abs_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let server_name = self
            .server_name_for_extension(ext)
            .ok_or_else(|| PhotonError::lsp(format!("no LSP server configured for extension `{ext}`")))?
            .to_string();

        {
            let sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get(&server_name) {
                return Ok(session.clone());
            }
        }

        let command = self
            .servers
            .get(&server_name)
            .ok_or_else(|| PhotonError::lsp(format!("unknown LSP server `{server_name}`")))?
            .clone();

        info!("spawning LSP server `{server_name}`: {command}");
        let session = LspSession::spawn(&command, &self.root_uri).await?;
        if !session.initialize().await {
            warn!("LSP server `{server_name}` failed to initialize");
        }

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(server_name).or_insert(session).clone();
        Ok(session)
    }

    pub async fn go_to_definition(&self, abs_path: &Path, pos: Position) -> PhotonResult<Vec<Location>> {
        let session = self.session_for_path(abs_path).await?;
        let uri = path_to_uri(&abs_path.to_string_lossy());
        session.go_to_definition(&uri, pos).await
    }

    pub async fn find_references(&self, abs_path: &Path, pos: Position) -> PhotonResult<Vec<Location>> {
        let session = self.session_for_path(abs_path).await?;
        let uri = path_to_uri(&abs_path.to_string_lossy());
        session.find_references(&uri, pos).await
    }

    pub async fn hover(&self, abs_path: &Path, pos: Position) -> PhotonResult<Option<HoverInfo>> {
        let session = self.session_for_path(abs_path).await?;
        let uri = path_to_uri(&abs_path.to_string_lossy());
        session.hover(&uri, pos).await
    }

    pub async fn document_symbols(&self, abs_path: &Path) -> PhotonResult<Vec<DocumentSymbol>> {
        let session = self.session_for_path(abs_path).await?;
        let uri = path_to_uri(&abs_path.to_string_lossy());
        session.document_symbols(&uri).await
    }

    pub async fn diagnostics(&self, abs_path: &Path, timeout_ms: u64) -> PhotonResult<Vec<Diagnostic>> {
        let session = self.session_for_path(abs_path).await?;
        let uri = path_to_uri(&abs_path.to_string_lossy());
        session.get_diagnostics_for_file(&uri, timeout_ms).await
    }

    pub async fn shutdown_all(&self) {
        let mut sessions = self.sessions.lock().await;
        for (_, session) in sessions.drain() {
            session.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(name: &str, command: &str, exts: &[&str]) -> LspServerConfig {
        LspServerConfig {
            name: name.to_string(),
            command: command.to_string(),
            extensions: exts.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn routes_by_extension() {
        let manager = LspSessionManager::new(
            "file:///workspace",
            &[cfg("rust", "rust-analyzer", &[".rs"]), cfg("py", "pyright", &[".py"])],
        );
        assert_eq!(manager.server_name_for_extension("rs"), Some("rust"));
        assert_eq!(manager.server_name_for_extension("py"), Some("py"));
        assert_eq!(manager.server_name_for_extension("go"), None);
    }
}
