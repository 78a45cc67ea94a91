mod common;

use std::sync::Arc;

use common::{ScriptedRunner, fail, ok};
use fsim_mcp::server::{Content, McpServer};
use serde_json::json;

const DEVICE: &str = "ABCD-1";

fn healthy_toolchain() -> ScriptedRunner {
    ScriptedRunner::new(|program, args| match (program, args.first().copied()) {
        ("flutter", Some("build")) => ok("Xcode build done."),
        ("/usr/libexec/PlistBuddy", _) => ok("com.example.demo\n"),
        ("xcrun", Some("simctl")) => match args.get(1).copied() {
            Some("list") => ok(&format!("    iPhone 15 Pro ({DEVICE}) (Booted)\n")),
            Some("get_app_container") => ok("/containers/Runner.app\n"),
            Some("io") => {
                std::fs::write(args.last().unwrap(), b"\x89PNG\r\n\x1a\nfake").unwrap();
                ok("")
            }
            _ => ok(""),
        },
        _ => ok(""),
    })
}

#[tokio::test]
async fn full_workflow_returns_narrative_and_png() {
    let dir = tempfile::tempdir().unwrap();
    let shot = dir.path().join("out.png");
    let server = McpServer::new(Arc::new(healthy_toolchain()));

    let response = server
        .call_tool(
            "full_workflow",
            json!({
                "device_id": DEVICE,
                "screenshot_name": shot.to_string_lossy()
            }),
        )
        .await;

    assert!(!response.is_error);
    assert_eq!(response.content.len(), 2);
    match &response.content[0] {
        Content::Text { text } => {
            assert!(text.ends_with("✓ Screenshot captured"));
            assert!(text.contains(&format!("✓ Using device {DEVICE} (provided)")));
            assert!(text.contains("✓ App already installed"));
        }
        other => panic!("expected narrative text, got {other:?}"),
    }
    match &response.content[1] {
        Content::Image { mime_type, .. } => assert_eq!(mime_type, "image/png"),
        other => panic!("expected image block, got {other:?}"),
    }
}

#[tokio::test]
async fn full_workflow_failure_carries_step_and_partial_log() {
    let server = McpServer::new(Arc::new(ScriptedRunner::new(|program, args| {
        if program == "flutter" && args.first() == Some(&"build") {
            fail("flutter build ios --simulator")
        } else {
            ok("")
        }
    })));

    let response = server
        .call_tool("full_workflow", json!({"device_id": DEVICE}))
        .await;

    assert!(response.is_error);
    match &response.content[0] {
        Content::Text { text } => {
            assert!(text.contains("Workflow failed at: Building Flutter app..."));
            assert!(text.contains("scripted failure"));
            assert!(text.contains("Completed steps: none"));
        }
        other => panic!("expected failure narrative, got {other:?}"),
    }
}
