use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::exec::{CommandRunner, ExecOutput};
use crate::{Error, Result};

/// How many times the boot poller checks `simctl list` before giving up.
pub const BOOT_POLL_ATTEMPTS: u32 = 30;
/// Pause between boot polls.
pub const BOOT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Simulator lifecycle operations over `xcrun simctl`.
pub struct SimulatorControl {
    runner: Arc<dyn CommandRunner>,
}

impl SimulatorControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Boots a simulator and waits for it to report `Booted`.
    ///
    /// Boot initiation is best-effort: opening Simulator.app and `simctl boot`
    /// are both no-ops on an already-booted device, and `simctl boot` fails
    /// with "Unable to boot device in current state: Booted" in that case.
    /// Neither failure aborts the wait; the poll loop is the authority on
    /// whether the device came up.
    pub async fn ensure_booted(&self, device_id: &str) -> Result<()> {
        if let Err(e) = self.runner.run("open", &["-a", "Simulator"], None).await {
            tracing::warn!(error = %e, "could not open Simulator.app");
        }
        if let Err(e) = self
            .runner
            .run("xcrun", &["simctl", "boot", device_id], None)
            .await
        {
            tracing::debug!(error = %e, device_id, "simctl boot did not start a new boot");
        }

        for attempt in 1..=BOOT_POLL_ATTEMPTS {
            match self
                .runner
                .run("xcrun", &["simctl", "list", "devices"], None)
                .await
            {
                Ok(output) if device_is_booted(&output.stdout, device_id) => {
                    tracing::debug!(device_id, attempt, "simulator is booted");
                    return Ok(());
                }
                Ok(_) => {}
                // A transient listing failure counts as "not booted yet".
                Err(e) => tracing::debug!(error = %e, attempt, "device listing failed, retrying"),
            }
            sleep(BOOT_POLL_INTERVAL).await;
        }

        Err(Error::BootTimeout {
            device_id: device_id.to_string(),
        })
    }

    /// Whether `bundle_id` is installed on the device.
    ///
    /// Never fails: any error from the underlying query reads as "not
    /// installed". The distinguishable cause is logged before collapsing.
    pub async fn is_app_installed(&self, device_id: &str, bundle_id: &str) -> bool {
        match self.app_container(device_id, bundle_id).await {
            Ok(container) => !container.trim().is_empty(),
            Err(e) => {
                tracing::debug!(error = %e, bundle_id, "app container query failed");
                false
            }
        }
    }

    async fn app_container(&self, device_id: &str, bundle_id: &str) -> Result<String> {
        let output = self
            .runner
            .run(
                "xcrun",
                &["simctl", "get_app_container", device_id, bundle_id, "app"],
                None,
            )
            .await?;
        Ok(output.stdout)
    }

    /// Installs a built `.app` bundle onto the device.
    pub async fn install(&self, device_id: &str, app_path: &Path) -> Result<ExecOutput> {
        let app = app_path.to_string_lossy().into_owned();
        self.runner
            .run("xcrun", &["simctl", "install", device_id, &app], None)
            .await
    }

    /// Launches an installed app by bundle identifier.
    pub async fn launch(&self, device_id: &str, bundle_id: &str) -> Result<ExecOutput> {
        self.runner
            .run("xcrun", &["simctl", "launch", device_id, bundle_id], None)
            .await
    }

    /// Captures a PNG screenshot of the booted simulator to `path` and
    /// returns the image bytes.
    pub async fn screenshot(&self, path: &Path) -> Result<Vec<u8>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let target = path.to_string_lossy().into_owned();
        self.runner
            .run(
                "xcrun",
                &["simctl", "io", "booted", "screenshot", &target],
                None,
            )
            .await?;
        Ok(tokio::fs::read(path).await?)
    }
}

/// Timestamped default filename for screenshots.
pub fn default_screenshot_name() -> String {
    format!(
        "screenshot_{}.png",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Whether `simctl list devices` output reports `device_id` as booted.
///
/// The listing prints one device per line, state in parentheses:
/// `    iPhone 15 Pro (3828E2BF-...) (Booted)`.
pub fn device_is_booted(listing: &str, device_id: &str) -> bool {
    listing
        .lines()
        .any(|line| line.contains(device_id) && line.contains("(Booted)"))
}
