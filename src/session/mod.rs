//! Session state shared by every outbound request.
//!
//! The [`SessionJar`] is installed as the HTTP client's cookie provider, so
//! cookies written by the login handshake are visible to every later catalog,
//! cart, and order request. [`FileSessionStore`] adds load/persist of that
//! jar to a file so a session survives between runs.

mod file;
mod jar;

pub use file::FileSessionStore;
pub use jar::{Cookie, SessionJar};

use std::path::PathBuf;

/// Errors for session load/persist operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("session file {path}: {source}")]
    Io {
        /// The session file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The session file does not contain a valid cookie list.
    #[error("session file {path} is not a valid cookie list: {source}")]
    Format {
        /// The session file path.
        path: PathBuf,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Creates an IO error for a session file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a format error for a session file.
    pub fn format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Format {
            path: path.into(),
            source,
        }
    }
}

/// Cookie/session store the core reads from and resets.
///
/// The serialization format behind `load`/`persist` is opaque to callers.
pub trait SessionStore: Send + Sync {
    /// Replaces the in-memory session with the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the backing storage cannot be read.
    fn load(&self) -> Result<(), SessionError>;

    /// Writes the in-memory session to the backing storage.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the backing storage cannot be written.
    fn persist(&self) -> Result<(), SessionError>;

    /// Drops every cookie.
    fn clean(&self);

    /// Returns the live cookies accepted by `filter`.
    fn cookies(&self, filter: &dyn Fn(&Cookie) -> bool) -> Vec<Cookie>;

    /// Returns the value of the first live cookie named `name`.
    fn get(&self, name: &str) -> Option<String>;
}
