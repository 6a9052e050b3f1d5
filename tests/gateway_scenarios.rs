//! End-to-end tool-gateway scenarios against real tool implementations and
//! a real temp workspace (S1-S6).

use std::sync::Arc;

use photon_core::skills::SkillManager;
use photon_core::symbols::rust_provider::RustSymbolProvider;
use photon_core::symbols::SymbolIndex;
use photon_core::tools::{ToolCall, ToolGateway};
use photon_core::workspace::ScanIgnoreRules;
use serde_json::json;

fn gateway(root: &std::path::Path) -> ToolGateway {
    let mut gw = ToolGateway::new(root.to_path_buf());
    let index = Arc::new(SymbolIndex::new(root.to_path_buf(), ScanIgnoreRules::default(), false));
    let skills = Arc::new(SkillManager::new(root.to_path_buf()));
    photon_tools::register_all(&mut gw, index, skills, None);
    gw
}

/// S1: a read before any grep is rejected naming `grep_search`; after a
/// grep the same read succeeds and returns the file content; a second
/// read immediately after is rejected again.
#[tokio::test]
async fn s1_read_without_grep() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sample.txt"), "line1\n").unwrap();
    let mut gw = gateway(dir.path());

    let rejected = gw
        .call(&ToolCall {
            name: "read".into(),
            arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
        })
        .await;
    assert!(rejected.content[0].text.contains("grep_search"));

    gw.call(&ToolCall {
        name: "grep_search".into(),
        arguments: json!({"pattern": "line1"}),
    })
    .await;

    let allowed = gw
        .call(&ToolCall {
            name: "read".into(),
            arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
        })
        .await;
    assert!(allowed.content[0].text.contains("line1"));

    let rejected_again = gw
        .call(&ToolCall {
            name: "read".into(),
            arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
        })
        .await;
    assert!(rejected_again.content[0].text.contains("grep_search"));
}

/// S2: a write with no prior `authorize` asks for confirmation.
#[tokio::test]
async fn s2_write_without_authorize() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sample.txt"), "line1\n").unwrap();
    let mut gw = gateway(dir.path());

    let result = gw
        .call(&ToolCall {
            name: "write".into(),
            arguments: json!({
                "path": "sample.txt",
                "operation": "replace",
                "start_line": 1,
                "end_line": 1,
                "content": "updated",
            }),
        })
        .await;
    assert_eq!(result.status.as_deref(), Some("requires_confirmation"));
}

/// S3: authorized but never read is rejected naming the missing read.
#[tokio::test]
async fn s3_write_after_authorize_but_before_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sample.txt"), "line1\n").unwrap();
    let mut gw = gateway(dir.path());

    gw.call(&ToolCall { name: "authorize".into(), arguments: json!({}) }).await;

    let result = gw
        .call(&ToolCall {
            name: "write".into(),
            arguments: json!({
                "path": "sample.txt",
                "operation": "replace",
                "start_line": 1,
                "end_line": 1,
                "content": "updated",
            }),
        })
        .await;
    assert!(result.content[0].text.contains("写入前请先 read"));
}

/// S4: authorize, grep, read, then the write succeeds and lands on disk.
#[tokio::test]
async fn s4_successful_partial_write() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sample.txt"), "line1\n").unwrap();
    let mut gw = gateway(dir.path());

    gw.call(&ToolCall { name: "authorize".into(), arguments: json!({}) }).await;
    gw.call(&ToolCall { name: "grep_search".into(), arguments: json!({"pattern": "line1"}) }).await;
    gw.call(&ToolCall {
        name: "read".into(),
        arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
    })
    .await;

    let result = gw
        .call(&ToolCall {
            name: "write".into(),
            arguments: json!({
                "path": "sample.txt",
                "operation": "replace",
                "start_line": 1,
                "end_line": 1,
                "content": "updated",
            }),
        })
        .await;
    assert!(result.content[0].text.contains("Replaced"));
    let on_disk = std::fs::read_to_string(dir.path().join("sample.txt")).unwrap();
    assert!(on_disk.contains("updated"));
}

/// S5: even fully authorized, a full-file overwrite of an existing file
/// is always forbidden.
#[tokio::test]
async fn s5_full_overwrite_of_existing_file_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sample.txt"), "line1\n").unwrap();
    let mut gw = gateway(dir.path());

    gw.call(&ToolCall { name: "authorize".into(), arguments: json!({}) }).await;
    gw.call(&ToolCall { name: "grep_search".into(), arguments: json!({"pattern": "line1"}) }).await;
    gw.call(&ToolCall {
        name: "read".into(),
        arguments: json!({"path": "sample.txt", "start_line": 1, "end_line": 1}),
    })
    .await;

    let result = gw
        .call(&ToolCall {
            name: "write".into(),
            arguments: json!({"path": "sample.txt", "content": "all new"}),
        })
        .await;
    assert!(result.content[0].text.contains("禁止对已存在文件进行整文件覆写"));
}

/// S6: rewriting a file to declare a different symbol is picked up by the
/// incremental watcher within one interval.
#[tokio::test]
async fn s6_symbol_index_after_incremental_change() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lib.rs"), "pub fn foo() {}\n").unwrap();

    let mut index = SymbolIndex::new(dir.path().to_path_buf(), ScanIgnoreRules::default(), false);
    index.register_provider(Box::new(RustSymbolProvider));
    index.start_async_scan();
    for _ in 0..100 {
        if !index.is_scanning() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(index.search("foo").len(), 1);

    index.start_watching(1);
    std::fs::write(dir.path().join("lib.rs"), "pub fn bar() {}\n").unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    index.stop_watching();

    assert_eq!(index.search("foo").len(), 0);
    assert_eq!(index.search("bar").len(), 1);
}
