#![cfg(test)]

//! End-to-end facade tests against the scripted in-memory backend.
//!
//! The backend is registered once per test binary and shared by every test, so
//! each test mounts its scenario on its own path.

mod fixtures;

use monoreq_backend_memory::{MemoryBackend, Script};

/// Registers the backend on first use and mounts `script` at `path`.
fn mount(path: &str, script: Script) -> MemoryBackend {
    let backend = monoreq_backend_memory::install();
    backend.mount(path, script);
    backend
}

fn url(path: &str) -> String {
    format!("http://mem.test{path}")
}
