mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use common::{ScriptedRunner, fail, ok};
use fsim_core::Error;
use fsim_core::simctl::{BOOT_POLL_ATTEMPTS, BOOT_POLL_INTERVAL, SimulatorControl};

const DEVICE: &str = "3828E2BF-3B5A-4A49-B481-26F6B4F1F7E7";

fn booted_listing() -> String {
    format!("    iPhone 15 Pro ({DEVICE}) (Booted)\n")
}

fn shutdown_listing() -> String {
    format!("    iPhone 15 Pro ({DEVICE}) (Shutdown)\n")
}

fn is_list(args: &[&str]) -> bool {
    args.first() == Some(&"simctl") && args.get(1) == Some(&"list")
}

#[tokio::test(start_paused = true)]
async fn already_booted_device_succeeds_on_first_poll() {
    let runner = Arc::new(ScriptedRunner::new(|_, args| {
        if is_list(args) {
            ok(&booted_listing())
        } else {
            ok("")
        }
    }));
    let simulator = SimulatorControl::new(runner.clone());

    let started = tokio::time::Instant::now();
    simulator.ensure_booted(DEVICE).await.unwrap();

    // First check hit, so no poll interval was awaited.
    assert!(started.elapsed() < BOOT_POLL_INTERVAL);
    let lists = runner.calls().iter().filter(|c| c.contains("simctl list")).count();
    assert_eq!(lists, 1);
}

#[tokio::test(start_paused = true)]
async fn never_booted_device_times_out_after_full_budget() {
    let runner = Arc::new(ScriptedRunner::new(|_, args| {
        if is_list(args) {
            ok(&shutdown_listing())
        } else {
            ok("")
        }
    }));
    let simulator = SimulatorControl::new(runner.clone());

    let started = tokio::time::Instant::now();
    let err = simulator.ensure_booted(DEVICE).await.unwrap_err();
    let elapsed = started.elapsed();

    match err {
        Error::BootTimeout { device_id } => assert_eq!(device_id, DEVICE),
        other => panic!("expected boot timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_secs(58), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_secs(62), "elapsed {elapsed:?}");
    let lists = runner.calls().iter().filter(|c| c.contains("simctl list")).count();
    assert_eq!(lists, BOOT_POLL_ATTEMPTS as usize);
}

#[tokio::test(start_paused = true)]
async fn transient_listing_failures_do_not_abort_the_poll() {
    let failures = Arc::new(AtomicU32::new(3));
    let remaining = failures.clone();
    let runner = Arc::new(ScriptedRunner::new(move |_, args| {
        if is_list(args) {
            if remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                fail("xcrun simctl list devices")
            } else {
                ok(&booted_listing())
            }
        } else {
            ok("")
        }
    }));
    let simulator = SimulatorControl::new(runner);

    let started = tokio::time::Instant::now();
    simulator.ensure_booted(DEVICE).await.unwrap();
    assert_eq!(started.elapsed(), BOOT_POLL_INTERVAL * 3);
}

#[tokio::test(start_paused = true)]
async fn boot_initiation_failures_are_not_fatal() {
    let runner = Arc::new(ScriptedRunner::new(|program, args| {
        if program == "open" || (args.first() == Some(&"simctl") && args.get(1) == Some(&"boot")) {
            fail("boot initiation")
        } else if is_list(args) {
            ok(&booted_listing())
        } else {
            ok("")
        }
    }));
    let simulator = SimulatorControl::new(runner);

    simulator.ensure_booted(DEVICE).await.unwrap();
}

#[tokio::test]
async fn probe_reports_installed_for_nonempty_container() {
    let runner = Arc::new(ScriptedRunner::new(|_, _| {
        ok("/Users/dev/Library/Developer/CoreSimulator/.../Runner.app\n")
    }));
    let simulator = SimulatorControl::new(runner);
    assert!(simulator.is_app_installed(DEVICE, "com.example.demo").await);
}

#[tokio::test]
async fn probe_reports_absent_for_whitespace_output() {
    let runner = Arc::new(ScriptedRunner::new(|_, _| ok("  \n")));
    let simulator = SimulatorControl::new(runner);
    assert!(!simulator.is_app_installed(DEVICE, "com.example.demo").await);
}

#[tokio::test]
async fn probe_swallows_query_errors_into_false() {
    let runner = Arc::new(ScriptedRunner::new(|_, _| fail("simctl get_app_container")));
    let simulator = SimulatorControl::new(runner);
    assert!(!simulator.is_app_installed(DEVICE, "com.example.demo").await);
}

#[tokio::test]
async fn screenshot_returns_captured_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");
    let runner = Arc::new(ScriptedRunner::new(|_, args| {
        if args.contains(&"screenshot") {
            let target = args.last().unwrap();
            std::fs::write(target, b"\x89PNG\r\n\x1a\nfake").unwrap();
        }
        ok("")
    }));
    let simulator = SimulatorControl::new(runner);

    let bytes = simulator.screenshot(&path).await.unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
}
