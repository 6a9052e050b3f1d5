//! A single language-server subprocess session over Content-Length-framed
//! JSON-RPC on stdio.
//!
//! One background task owns `ChildStdout` exclusively and demultiplexes
//! incoming messages: a message with an `id` and no `method` is a response
//! routed to whichever caller is waiting on that id via a `oneshot`
//! channel; a message with a `method` and no `id` is a server
//! notification (`textDocument/publishDiagnostics` is the only one this
//! session currently understands). The pending-request table holds an
//! entry exactly as long as a caller is awaiting it (spec invariant I4):
//! `send_request` inserts before writing the request and the reader task
//! (or a timeout) always removes it.

use std::collections::{HashMap, HashSet};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::{oneshot, Mutex, Notify};
use tracing::{debug, warn};

use crate::error::{PhotonError, PhotonResult};
use crate::lsp::protocol::{Diagnostic, DocumentSymbol, HoverInfo, Location, LocationLink, Position};

const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

struct PendingTable {
    senders: Mutex<HashMap<i64, oneshot::Sender<Value>>>,
}

pub struct LspSession {
    child: Mutex<Option<Child>>,
    stdin: Mutex<ChildStdin>,
    request_id: AtomicI64,
    pending: Arc<PendingTable>,
    opened_documents: Mutex<HashSet<String>>,
    diagnostics: DashMap<String, Vec<Diagnostic>>,
    diagnostics_notify: DashMap<String, Arc<Notify>>,
    reader_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    last_request_timed_out: AtomicBool,
    initialized: AtomicBool,
    root_uri: String,
}

impl LspSession {
    /// Spawns the server command line and starts the background reader
    /// task. Does not perform the `initialize` handshake — call
    /// [`LspSession::initialize`] for that.
    pub async fn spawn(command: &str, root_uri: &str) -> PhotonResult<Arc<Self>> {
        let mut parts = shell_words_split(command);
        if parts.is_empty() {
            return Err(PhotonError::lsp("empty LSP server command"));
        }
        let program = parts.remove(0);

        let mut child = tokio::process::Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PhotonError::lsp(format!("failed to spawn LSP server: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PhotonError::lsp("child had no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PhotonError::lsp("child had no stdout"))?;
        let stderr = child.stderr.take();

        if let Some(stderr) = stderr {
            tokio::task::spawn(async move {
                let mut reader = BufReader::new(stderr);
                let mut line = String::new();
                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => debug!("lsp stderr: {}", line.trim_end()),
                    }
                }
            });
        }

        let pending = Arc::new(PendingTable {
            senders: Mutex::new(HashMap::new()),
        });

        let session = Arc::new(Self {
            child: Mutex::new(Some(child)),
            stdin: Mutex::new(stdin),
            request_id: AtomicI64::new(0),
            pending: pending.clone(),
            opened_documents: Mutex::new(HashSet::new()),
            diagnostics: DashMap::new(),
            diagnostics_notify: DashMap::new(),
            reader_handle: Mutex::new(None),
            last_request_timed_out: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            root_uri: root_uri.to_string(),
        });

        let reader_session = session.clone();
        let handle = tokio::task::spawn(async move {
            reader_session.reader_loop(stdout).await;
        });
        *session.reader_handle.lock().await = Some(handle);

        Ok(session)
    }

    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout) {
        let mut reader = BufReader::new(stdout);
        loop {
            match read_message(&mut reader).await {
                Ok(Some(value)) => self.dispatch_message(value).await,
                Ok(None) => break,
                Err(err) => {
                    warn!("lsp reader terminating: {err}");
                    break;
                }
            }
        }
    }

    async fn dispatch_message(&self, value: Value) {
        if let Some(id) = value.get("id").and_then(|v| v.as_i64()) {
            if value.get("method").is_none() {
                let mut senders = self.pending.senders.lock().await;
                if let Some(sender) = senders.remove(&id) {
                    let result = value.get("result").cloned().unwrap_or(Value::Null);
                    let _ = sender.send(result);
                }
                return;
            }
        }

        if value.get("method").and_then(|m| m.as_str()) == Some("textDocument/publishDiagnostics") {
            if let Some(params) = value.get("params") {
                self.handle_publish_diagnostics(params);
            }
        }
    }

    fn handle_publish_diagnostics(&self, params: &Value) {
        let Some(uri) = params.get("uri").and_then(|v| v.as_str()) else {
            return;
        };
        let diagnostics: Vec<Diagnostic> = params
            .get("diagnostics")
            .and_then(|d| serde_json::from_value(d.clone()).ok())
            .unwrap_or_default();
        self.diagnostics.insert(uri.to_string(), diagnostics);
        if let Some(notify) = self.diagnostics_notify.get(uri) {
            notify.notify_waiters();
        }
    }

    fn next_id(&self) -> i64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn write_frame(&self, value: &Value) -> PhotonResult<()> {
        let body = serde_json::to_string(value)
            .map_err(|e| PhotonError::lsp(format!("failed to serialize message: {e}")))?;
        let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| PhotonError::lsp(format!("failed to write to LSP server: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| PhotonError::lsp(format!("failed to flush LSP server stdin: {e}")))
    }

    async fn send_request(&self, method: &str, params: Value) -> PhotonResult<Value> {
        self.send_request_timeout(method, params, DEFAULT_REQUEST_TIMEOUT)
            .await
    }

    async fn send_request_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> PhotonResult<Value> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.senders.lock().await.insert(id, tx);

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        if let Err(err) = self.write_frame(&request).await {
            self.pending.senders.lock().await.remove(&id);
            return Err(err);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(value)) => {
                self.last_request_timed_out.store(false, Ordering::SeqCst);
                Ok(value)
            }
            Ok(Err(_)) => Err(PhotonError::lsp("LSP response channel closed")),
            Err(_) => {
                self.pending.senders.lock().await.remove(&id);
                self.last_request_timed_out.store(true, Ordering::SeqCst);
                Ok(Value::Null)
            }
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> PhotonResult<()> {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        self.write_frame(&notification).await
    }

    pub fn last_request_timed_out(&self) -> bool {
        self.last_request_timed_out.load(Ordering::SeqCst)
    }

    pub async fn initialize(&self) -> bool {
        let params = json!({
            "processId": std::process::id(),
            "rootUri": self.root_uri,
            "workspaceFolders": [{"uri": self.root_uri, "name": "workspace"}],
            "capabilities": {
                "textDocument": {
                    "documentSymbol": {"hierarchicalDocumentSymbolSupport": true},
                    "publishDiagnostics": {},
                },
            },
        });
        let result = self
            .send_request_timeout("initialize", params, DEFAULT_INITIALIZE_TIMEOUT)
            .await;
        match result {
            Ok(Value::Null) => false,
            Ok(_) => {
                let _ = self.send_notification("initialized", json!({})).await;
                self.initialized.store(true, Ordering::SeqCst);
                true
            }
            Err(err) => {
                warn!("lsp initialize failed: {err}");
                false
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn ensure_document_open(&self, uri: &str) -> PhotonResult<()> {
        let mut opened = self.opened_documents.lock().await;
        if opened.contains(uri) {
            return Ok(());
        }
        let path = crate::lsp::protocol::uri_to_path(uri);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PhotonError::lsp(format!("failed to read {path} for LSP open: {e}")))?;
        let language_id = language_id_for_path(&path);
        self.send_notification(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": language_id,
                    "version": 1,
                    "text": content,
                }
            }),
        )
        .await?;
        opened.insert(uri.to_string());
        self.diagnostics_notify
            .entry(uri.to_string())
            .or_insert_with(|| Arc::new(Notify::new()));
        Ok(())
    }

    pub async fn go_to_definition(&self, uri: &str, position: Position) -> PhotonResult<Vec<Location>> {
        self.ensure_document_open(uri).await?;
        let result = self
            .send_request(
                "textDocument/definition",
                json!({"textDocument": {"uri": uri}, "position": position}),
            )
            .await?;
        Ok(parse_locations(&result))
    }

    pub async fn find_references(&self, uri: &str, position: Position) -> PhotonResult<Vec<Location>> {
        self.ensure_document_open(uri).await?;
        let result = self
            .send_request(
                "textDocument/references",
                json!({
                    "textDocument": {"uri": uri},
                    "position": position,
                    "context": {"includeDeclaration": true},
                }),
            )
            .await?;
        Ok(parse_locations(&result))
    }

    pub async fn hover(&self, uri: &str, position: Position) -> PhotonResult<Option<HoverInfo>> {
        self.ensure_document_open(uri).await?;
        let result = self
            .send_request(
                "textDocument/hover",
                json!({"textDocument": {"uri": uri}, "position": position}),
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let contents = result
            .get("contents")
            .map(render_hover_contents)
            .unwrap_or_default();
        let range = result
            .get("range")
            .and_then(|r| serde_json::from_value(r.clone()).ok());
        Ok(Some(HoverInfo { contents, range }))
    }

    pub async fn document_symbols(&self, uri: &str) -> PhotonResult<Vec<DocumentSymbol>> {
        self.ensure_document_open(uri).await?;
        let result = self
            .send_request(
                "textDocument/documentSymbol",
                json!({"textDocument": {"uri": uri}}),
            )
            .await?;
        Ok(serde_json::from_value(result).unwrap_or_default())
    }

    pub async fn workspace_symbols(&self, query: &str) -> PhotonResult<Vec<DocumentSymbol>> {
        let result = self
            .send_request("workspace/symbol", json!({"query": query}))
            .await?;
        Ok(serde_json::from_value(result).unwrap_or_default())
    }

    pub fn get_diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        self.diagnostics
            .get(uri)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub async fn get_diagnostics_for_file(&self, uri: &str, timeout_ms: u64) -> PhotonResult<Vec<Diagnostic>> {
        self.ensure_document_open(uri).await?;
        let notify = self
            .diagnostics_notify
            .entry(uri.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone();
        let _ = tokio::time::timeout(Duration::from_millis(timeout_ms), notify.notified()).await;
        Ok(self.get_diagnostics(uri))
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.reader_handle.lock().await.take() {
            handle.abort();
        }
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}

fn language_id_for_path(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "py" => "python",
        "go" => "go",
        _ => "plaintext",
    }
}

fn render_hover_contents(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("value")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_default(),
        Value::Array(items) => items
            .iter()
            .map(render_hover_contents)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Normalizes the three shapes `textDocument/definition` and
/// `textDocument/references` may return (single `Location`, `Location[]`,
/// `LocationLink[]`) into one `Vec<Location>`.
fn parse_locations(result: &Value) -> Vec<Location> {
    if result.is_null() {
        return Vec::new();
    }
    if let Ok(location) = serde_json::from_value::<Location>(result.clone()) {
        return vec![location];
    }
    if let Ok(locations) = serde_json::from_value::<Vec<Location>>(result.clone()) {
        return locations;
    }
    if let Ok(links) = serde_json::from_value::<Vec<LocationLink>>(result.clone()) {
        return links
            .into_iter()
            .map(|link| Location {
                uri: link.target_uri,
                range: link.target_range,
            })
            .collect();
    }
    Vec::new()
}

async fn read_message(reader: &mut BufReader<ChildStdout>) -> PhotonResult<Option<Value>> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| PhotonError::lsp(format!("failed to read LSP header: {e}")))?;
        if bytes_read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            content_length = value.trim().parse().ok();
        }
    }

    let length = content_length
        .ok_or_else(|| PhotonError::lsp("LSP message had no Content-Length header"))?;
    let mut buf = vec![0u8; length];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|e| PhotonError::lsp(format!("failed to read LSP body: {e}")))?;
    let value = serde_json::from_slice(&buf)
        .map_err(|e| PhotonError::lsp(format!("failed to parse LSP message: {e}")))?;
    Ok(Some(value))
}

fn shell_words_split(command: &str) -> Vec<String> {
    command
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_location() {
        let value = json!({"uri": "file:///a.rs", "range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 1}}});
        let locations = parse_locations(&value);
        assert_eq!(locations.len(), 1);
    }

    #[test]
    fn parses_location_link_array() {
        let value = json!([{
            "targetUri": "file:///a.rs",
            "targetRange": {"start": {"line": 1, "character": 0}, "end": {"line": 1, "character": 2}},
            "targetSelectionRange": {"start": {"line": 1, "character": 0}, "end": {"line": 1, "character": 2}},
        }]);
        let locations = parse_locations(&value);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri, "file:///a.rs");
    }

    #[test]
    fn language_id_maps_rust() {
        assert_eq!(language_id_for_path("/x/y/lib.rs"), "rust");
        assert_eq!(language_id_for_path("/x/y/app.py"), "python");
    }
}
