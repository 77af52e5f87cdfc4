//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;
use std::sync::Arc;

use encoding_rs::GBK;
use rushbuy_core::{Endpoints, FileSessionStore, HttpSettings, Transport};
use wiremock::MockServer;

/// A file-backed session and a transport sharing its jar.
pub struct Harness {
    pub store: Arc<FileSessionStore>,
    pub transport: Transport,
    pub endpoints: Endpoints,
}

/// Builds a session store under `dir` and a transport pointed at `server`.
pub fn harness(server: &MockServer, dir: &Path) -> Harness {
    let store = Arc::new(FileSessionStore::new(dir.join("jd.cookies")));
    let transport = Transport::new(store.jar(), &HttpSettings::default()).unwrap();
    Harness {
        store,
        transport,
        endpoints: Endpoints::rooted_at(&server.uri()),
    }
}

/// Encodes `text` the way the storefront's legacy pages are served.
pub fn gbk(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = GBK.encode(text);
    assert!(!had_errors, "text not representable in GBK: {text}");
    bytes.into_owned()
}
