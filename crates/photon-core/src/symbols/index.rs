//! Background-scanned, incrementally-updated symbol index.
//!
//! Each file's metadata (`size`, `mtime`, `hash`) is tracked so an
//! incremental pass can skip files that have not changed. The index holds
//! two sharded maps (`DashMap`) rather than one big mutex-guarded
//! `HashMap`, so a rescan only contends on the handful of keys it touches
//! at a time instead of blocking concurrent `search`/`get_file_symbols`
//! calls for the whole index.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PhotonResult;
use crate::symbols::provider::{Symbol, SymbolProvider};
use crate::workspace::ScanIgnoreRules;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub size: u64,
    pub mtime: u64,
    pub hash: String,
}

#[derive(Serialize, Deserialize, Default)]
struct PersistedIndex {
    files: Vec<(PathBuf, FileMeta)>,
    symbols: Vec<(PathBuf, Vec<Symbol>)>,
}

struct Inner {
    root: PathBuf,
    providers: Vec<Box<dyn SymbolProvider>>,
    fallback_on_empty: bool,
    ignore: ScanIgnoreRules,
    files: DashMap<PathBuf, FileMeta>,
    symbols: DashMap<PathBuf, Vec<Symbol>>,
    scanning: AtomicBool,
    stop_watch: AtomicBool,
}

pub struct SymbolIndex {
    inner: Arc<Inner>,
    watch_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl SymbolIndex {
    pub fn new(root: impl Into<PathBuf>, ignore: ScanIgnoreRules, fallback_on_empty: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                providers: Vec::new(),
                fallback_on_empty,
                ignore,
                files: DashMap::new(),
                symbols: DashMap::new(),
                scanning: AtomicBool::new(false),
                stop_watch: AtomicBool::new(false),
            }),
            watch_handle: parking_lot::Mutex::new(None),
        }
    }

    /// Providers are tried in registration order; call this before the
    /// first scan starts.
    pub fn register_provider(&mut self, provider: Box<dyn SymbolProvider>) {
        Arc::get_mut(&mut self.inner)
            .expect("register_provider must run before any scan/watch task is spawned")
            .providers
            .push(provider);
    }

    pub fn index_path(&self) -> PathBuf {
        self.inner.root.join(".photon").join("index.json")
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.scanning.load(Ordering::SeqCst)
    }

    pub fn get_symbol_count(&self) -> usize {
        self.inner.symbols.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn get_file_symbols(&self, rel_path: &str) -> Vec<Symbol> {
        self.inner
            .symbols
            .get(Path::new(rel_path))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn search(&self, query: &str) -> Vec<Symbol> {
        let needle = query.to_lowercase();
        let mut results = Vec::new();
        for entry in self.inner.symbols.iter() {
            for symbol in entry.value() {
                if symbol.name.to_lowercase().contains(&needle) {
                    results.push(symbol.clone());
                }
            }
        }
        results
    }

    /// Corrupt or missing persisted index files are treated as an empty
    /// index rather than a fatal error.
    pub fn load_persisted(&self) {
        let path = self.index_path();
        let Ok(content) = std::fs::read_to_string(&path) else {
            return;
        };
        match serde_json::from_str::<PersistedIndex>(&content) {
            Ok(persisted) => {
                for (path, meta) in persisted.files {
                    self.inner.files.insert(path, meta);
                }
                for (path, symbols) in persisted.symbols {
                    self.inner.symbols.insert(path, symbols);
                }
            }
            Err(err) => warn!("discarding corrupt symbol index at {:?}: {err}", path),
        }
    }

    fn save_persisted(&self) -> PhotonResult<()> {
        save_persisted(&self.inner)
    }

    /// No-op if a scan is already running.
    pub fn start_async_scan(&self) {
        if self.inner.scanning.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            full_scan(&inner);
            if let Err(err) = save_persisted(&inner) {
                warn!("failed to persist symbol index: {err}");
            }
            inner.scanning.store(false, Ordering::SeqCst);
        });
    }

    pub fn start_watching(&self, interval_seconds: u64) {
        self.inner.stop_watch.store(false, Ordering::SeqCst);
        let inner = self.inner.clone();
        let handle = tokio::task::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
            loop {
                ticker.tick().await;
                if inner.stop_watch.load(Ordering::SeqCst) {
                    break;
                }
                check_file_changes(&inner);
            }
        });
        *self.watch_handle.lock() = Some(handle);
    }

    pub fn stop_watching(&self) {
        self.inner.stop_watch.store(true, Ordering::SeqCst);
        if let Some(handle) = self.watch_handle.lock().take() {
            handle.abort();
        }
    }

    pub fn update_file(&self, rel_path: &str) {
        update_single_file(&self.inner, Path::new(rel_path));
        let _ = self.save_persisted();
    }
}

fn save_persisted(inner: &Inner) -> PhotonResult<()> {
    let path = inner.root.join(".photon").join("index.json");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|source| crate::error::PhotonError::io("creating .photon dir", source))?;
    }
    let persisted = PersistedIndex {
        files: inner
            .files
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect(),
        symbols: inner
            .symbols
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect(),
    };
    let content = serde_json::to_string(&persisted)
        .map_err(|e| crate::error::PhotonError::index(e.to_string()))?;
    std::fs::write(&path, content)
        .map_err(|source| crate::error::PhotonError::io("writing symbol index", source))?;
    Ok(())
}

fn hash_contents(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn file_meta(path: &Path) -> Option<FileMeta> {
    let metadata = std::fs::metadata(path).ok()?;
    let bytes = std::fs::read(path).ok()?;
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Some(FileMeta {
        size: metadata.len(),
        mtime,
        hash: hash_contents(&bytes),
    })
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string()
}

/// §4.3: a file is only recorded "if the extension is claimed by some
/// provider" — this is the same membership test `full_scan`/incremental
/// rescans use to decide whether a file belongs in the index at all.
fn extension_is_claimed(inner: &Inner, ext: &str) -> bool {
    inner.providers.iter().any(|p| p.supports_extension(ext))
}

/// Reads and extracts symbols for a file whose extension is already known
/// to be claimed by some provider. Returns `None` if the file could not be
/// read, in which case the caller leaves any prior entry untouched.
fn scan_file(inner: &Inner, abs_path: &Path, rel_path: &Path, ext: &str) -> Option<Vec<Symbol>> {
    let content = match std::fs::read_to_string(abs_path) {
        Ok(content) => content,
        Err(err) => {
            debug!("skipping unreadable file {:?}: {err}", abs_path);
            return None;
        }
    };
    let rel_str = rel_path.to_string_lossy().replace('\\', "/");

    let mut symbols = Vec::new();
    for provider in &inner.providers {
        if provider.supports_extension(ext) {
            symbols = provider.extract_symbols(&content, &rel_str);
            break;
        }
    }
    if symbols.is_empty() && inner.fallback_on_empty {
        let fallback = crate::symbols::generic_provider::GenericRegexSymbolProvider;
        symbols = fallback.extract_symbols(&content, &rel_str);
    }
    Some(symbols)
}

fn update_single_file(inner: &Inner, rel_path: &Path) {
    let abs_path = inner.root.join(rel_path);
    let ext = extension_of(rel_path);

    if !extension_is_claimed(inner, &ext) {
        // No provider claims this extension; it never belongs in the
        // index, regardless of whether the file itself still exists.
        inner.files.remove(rel_path);
        inner.symbols.remove(rel_path);
        return;
    }

    match file_meta(&abs_path) {
        Some(meta) => {
            if let Some(symbols) = scan_file(inner, &abs_path, rel_path, &ext) {
                inner.files.insert(rel_path.to_path_buf(), meta);
                inner.symbols.insert(rel_path.to_path_buf(), symbols);
            }
        }
        None => {
            inner.files.remove(rel_path);
            inner.symbols.remove(rel_path);
        }
    }
}

fn walk(inner: &Inner, dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if inner.ignore.should_ignore(&rel_str) {
            continue;
        }
        if path.is_dir() {
            walk(inner, &path, root, out);
        } else {
            out.push(rel.to_path_buf());
        }
    }
}

fn full_scan(inner: &Inner) {
    let mut files = Vec::new();
    walk(inner, &inner.root, &inner.root, &mut files);
    let current: std::collections::HashSet<PathBuf> = files.iter().cloned().collect();
    for rel_path in &files {
        update_single_file(inner, rel_path);
    }

    let stale: Vec<PathBuf> = inner
        .files
        .iter()
        .map(|e| e.key().clone())
        .filter(|p| !current.contains(p))
        .collect();
    for path in stale {
        inner.files.remove(&path);
        inner.symbols.remove(&path);
    }
}

fn check_file_changes(inner: &Inner) {
    let mut files = Vec::new();
    walk(inner, &inner.root, &inner.root, &mut files);

    for rel_path in &files {
        let abs_path = inner.root.join(rel_path);
        let Some(meta) = file_meta(&abs_path) else {
            continue;
        };
        let changed = inner
            .files
            .get(rel_path)
            .map(|existing| *existing.value() != meta)
            .unwrap_or(true);
        if changed {
            update_single_file(inner, rel_path);
        }
    }

    let current: std::collections::HashSet<PathBuf> = files.into_iter().collect();
    let stale: Vec<PathBuf> = inner
        .files
        .iter()
        .map(|e| e.key().clone())
        .filter(|p| !current.contains(p))
        .collect();
    for path in stale {
        inner.files.remove(&path);
        inner.symbols.remove(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::rust_provider::RustSymbolProvider;

    fn new_index(root: &Path) -> SymbolIndex {
        let mut index = SymbolIndex::new(root.to_path_buf(), ScanIgnoreRules::default(), false);
        index.register_provider(Box::new(RustSymbolProvider));
        index
    }

    #[tokio::test]
    async fn full_scan_finds_symbols() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.rs"), "pub fn hello() {}\n").unwrap();
        let index = new_index(dir.path());
        index.start_async_scan();
        for _ in 0..50 {
            if !index.is_scanning() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(index.get_symbol_count(), 1);
        assert_eq!(index.search("hello").len(), 1);
    }

    /// §4.3: files are only recorded "if the extension is claimed by some
    /// provider" — a `.txt` file alongside an indexed `.rs` file should
    /// never gain a `FileMeta`/symbols entry, even an empty one.
    #[tokio::test]
    async fn full_scan_skips_files_with_no_claiming_provider() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.rs"), "pub fn hello() {}\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "just some notes\n").unwrap();
        let index = new_index(dir.path());
        index.start_async_scan();
        for _ in 0..50 {
            if !index.is_scanning() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(index.get_symbol_count(), 1);
        assert!(index.get_file_symbols("notes.txt").is_empty());
        assert!(!index.inner.files.contains_key(Path::new("notes.txt")));
    }

    #[test]
    fn update_file_removes_deleted_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.rs");
        std::fs::write(&file, "pub fn a() {}\n").unwrap();
        let index = new_index(dir.path());
        index.update_file("a.rs");
        assert_eq!(index.get_file_symbols("a.rs").len(), 1);

        std::fs::remove_file(&file).unwrap();
        index.update_file("a.rs");
        assert_eq!(index.get_file_symbols("a.rs").len(), 0);
    }
}
