//! Hands the challenge image to the platform's default viewer.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use rushbuy_core::ChallengeNotifier;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENER: &str = "xdg-open";

/// Opens the image without waiting for the viewer to exit.
#[derive(Debug)]
pub struct SystemViewer {
    opener: &'static str,
}

impl Default for SystemViewer {
    fn default() -> Self {
        Self { opener: OPENER }
    }
}

impl ChallengeNotifier for SystemViewer {
    fn challenge_ready(&self, path: &Path) {
        info!(path = %path.display(), "challenge code saved");
        if let Err(e) = open_detached(self.opener, path) {
            warn!(
                opener = self.opener,
                error = %e,
                "could not open the challenge image, open it manually"
            );
        }
    }
}

/// Starts `opener` on `path` and reaps it on the blocking pool.
fn open_detached(opener: &'static str, path: &Path) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = Command::new(opener).arg(path).spawn()?;
    debug!(opener, pid = child.id(), "viewer started");
    Ok(tokio::task::spawn_blocking(move || {
        let status = child.wait();
        match &status {
            Ok(status) => debug!(opener, %status, "viewer exited"),
            Err(e) => debug!(opener, error = %e, "viewer wait failed"),
        }
        status
    }))
}
