//! File-backed session persistence.
//!
//! The jar is written as a JSON cookie list with owner-only permissions.
//! A missing file loads as an empty session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::jar::unix_now;
use super::{Cookie, SessionError, SessionJar, SessionStore};

/// Session store persisted to a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    jar: Arc<SessionJar>,
}

impl FileSessionStore {
    /// Creates a store for `path` with an empty jar. Nothing is read until
    /// [`SessionStore::load`] is called.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            jar: Arc::new(SessionJar::new()),
        }
    }

    /// The jar to install as the HTTP client's cookie provider.
    #[must_use]
    pub fn jar(&self) -> Arc<SessionJar> {
        Arc::clone(&self.jar)
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<(), SessionError> {
        if !self.path.exists() {
            debug!("no stored session");
            self.jar.clean();
            return Ok(());
        }

        let bytes = fs::read(&self.path).map_err(|e| SessionError::io(&self.path, e))?;
        let cookies = serde_json::from_slice::<Vec<Cookie>>(&bytes)
            .map_err(|e| SessionError::format(&self.path, e))?;
        let stored = cookies.len();
        self.jar.replace_all(cookies);
        info!(stored, live = self.jar.len(), "loaded stored session");
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn persist(&self) -> Result<(), SessionError> {
        let now = unix_now();
        let cookies: Vec<Cookie> = self
            .jar
            .snapshot()
            .into_iter()
            .filter(|cookie| !cookie.is_expired_at(now))
            .collect();
        let payload = serde_json::to_vec_pretty(&cookies)
            .map_err(|e| SessionError::format(&self.path, e))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| SessionError::io(parent, e))?;
        }

        // Write-then-rename so an interrupted persist never truncates the old session.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, payload).map_err(|e| SessionError::io(&staging, e))?;
        set_owner_only_permissions(&staging)?;
        fs::rename(&staging, &self.path).map_err(|e| SessionError::io(&self.path, e))?;

        debug!(cookies = cookies.len(), "persisted session");
        Ok(())
    }

    fn clean(&self) {
        self.jar.clean();
    }

    fn cookies(&self, filter: &dyn Fn(&Cookie) -> bool) -> Vec<Cookie> {
        SessionStore::cookies(self.jar.as_ref(), filter)
    }

    fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name)
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), SessionError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| SessionError::io(path, e))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), SessionError> {
    Ok(())
}
