//! Challenge image storage and delivery.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::AuthError;
use crate::config::ChallengeConfig;

/// Receives the path of a freshly written challenge image.
///
/// Displaying the image is the receiver's business; the handshake only
/// announces it and moves on to polling.
pub trait ChallengeNotifier: Send + Sync {
    /// Called once per login attempt, after the image is on disk.
    fn challenge_ready(&self, path: &Path);
}

/// Maps a challenge response content type to a file extension.
///
/// Unknown or missing types fall back to `.png`, the format the storefront
/// actually serves.
pub(crate) fn image_extension(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|value| value.split(';').next())
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        _ => ".png",
    }
}

/// Writes the challenge image and returns its path.
pub(crate) fn write_challenge_image(
    config: &ChallengeConfig,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<PathBuf, AuthError> {
    let file_name = format!("{}{}", config.file_stem, image_extension(content_type));
    let path = config.dir.join(file_name);

    if !config.dir.as_os_str().is_empty() && !config.dir.exists() {
        std::fs::create_dir_all(&config.dir)
            .map_err(|e| AuthError::challenge_image(&path, e))?;
    }
    std::fs::write(&path, bytes).map_err(|e| AuthError::challenge_image(&path, e))?;

    debug!(path = %path.display(), bytes = bytes.len(), "challenge image written");
    Ok(path)
}
