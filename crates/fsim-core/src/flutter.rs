use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

use crate::exec::{CommandRunner, ExecOutput, project_dir};
use crate::{Error, Result};

const PLIST_BUDDY: &str = "/usr/libexec/PlistBuddy";

/// Wrapper around the `flutter` CLI and the build artifacts it produces.
pub struct FlutterCli {
    runner: Arc<dyn CommandRunner>,
}

impl FlutterCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `flutter build ios --simulator` in the project directory.
    pub async fn build(&self, project_path: Option<&Path>) -> Result<ExecOutput> {
        let dir = project_dir(project_path);
        self.runner
            .run("flutter", &["build", "ios", "--simulator"], Some(&dir))
            .await
    }

    /// Raw `flutter devices` listing.
    pub async fn list_devices(&self) -> Result<String> {
        let output = self.runner.run("flutter", &["devices"], None).await?;
        Ok(output.stdout)
    }

    /// Discovers the first iOS simulator in `flutter devices` output.
    pub async fn find_simulator(&self) -> Result<String> {
        let listing = self.list_devices().await?;
        extract_simulator_id(&listing).ok_or(Error::NoDeviceFound)
    }

    /// Path of the simulator app bundle produced by [`FlutterCli::build`].
    pub fn app_bundle_path(project_path: Option<&Path>) -> PathBuf {
        project_dir(project_path).join("build/ios/iphonesimulator/Runner.app")
    }

    /// Reads `CFBundleIdentifier` out of the built app bundle with PlistBuddy.
    pub async fn bundle_id(&self, project_path: Option<&Path>) -> Result<String> {
        let plist = Self::app_bundle_path(project_path).join("Info.plist");
        let plist = plist.to_string_lossy().into_owned();
        let output = self
            .runner
            .run(PLIST_BUDDY, &["-c", "Print :CFBundleIdentifier", &plist], None)
            .await?;
        let id = output.stdout.trim().to_string();
        if id.is_empty() {
            return Err(Error::Precondition(format!(
                "no CFBundleIdentifier in {plist}; has the app been built?"
            )));
        }
        Ok(id)
    }
}

/// Extracts the identifier of the first iOS simulator entry from `flutter
/// devices` free text.
///
/// This is a parsing boundary over an external interface: `flutter devices`
/// prints one bullet-separated line per device, e.g.
///
/// ```text
/// iPhone 15 Pro (mobile) • 3828E2BF-3B5A-4A49-B481-26F6B4F1F7E7 • ios • iOS 17.2 (simulator)
/// ```
///
/// The contract matched here is `• <id> • ios •` on a line that ends in
/// `(simulator)`; the second bullet field is the identifier.
pub fn extract_simulator_id(listing: &str) -> Option<String> {
    let re = Regex::new(r"•\s*([0-9A-Za-z][0-9A-Za-z-]*)\s*•\s*ios\s*•[^\n]*\(simulator\)").ok()?;
    re.captures(listing)
        .map(|captures| captures[1].to_string())
}
