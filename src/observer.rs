//! Event sinks injected into every engine.
//!
//! Engines never reach for a global logger: callers hand them an
//! `Arc<dyn Observer>`, and engines built without one use [`NullObserver`].
//! The CLI passes a [`TracingObserver`]; tests use [`MemoryObserver`].

use std::sync::{Arc, Mutex};

/// Receiver for selection, transformation and diagnostic events.
pub trait Observer: Send + Sync {
    fn on_selection(&self, _description: &str, _node_text: &str) {}

    fn on_transformation(&self, _description: &str, _old_text: &str, _new_text: &str) {}

    fn on_error(&self, _message: &str, _cause: Option<&dyn std::error::Error>) {}

    fn on_info(&self, _message: &str) {}

    fn on_debug(&self, _message: &str) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

pub fn null() -> Arc<dyn Observer> {
    Arc::new(NullObserver)
}

/// Captures events as prefixed lines, for assertions in tests.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    lines: Mutex<Vec<String>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    /// Snapshot of all captured lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Captured lines starting with `prefix` (e.g. `"SELECTION"`).
    pub fn lines_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with(prefix))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl Observer for MemoryObserver {
    fn on_selection(&self, description: &str, node_text: &str) {
        self.push(format!("SELECTION: {description} - {node_text}"));
    }

    fn on_transformation(&self, description: &str, old_text: &str, new_text: &str) {
        self.push(format!(
            "TRANSFORMATION: {description} ({} -> {} bytes)",
            old_text.len(),
            new_text.len()
        ));
    }

    fn on_error(&self, message: &str, cause: Option<&dyn std::error::Error>) {
        match cause {
            Some(cause) => self.push(format!("ERROR: {message}: {cause}")),
            None => self.push(format!("ERROR: {message}")),
        }
    }

    fn on_info(&self, message: &str) {
        self.push(format!("INFO: {message}"));
    }

    fn on_debug(&self, message: &str) {
        self.push(format!("DEBUG: {message}"));
    }
}

/// Forwards events to the `tracing` subscriber installed by the application.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_selection(&self, description: &str, node_text: &str) {
        tracing::debug!(description, node_text, "selection");
    }

    fn on_transformation(&self, description: &str, old_text: &str, new_text: &str) {
        tracing::info!(
            description,
            old_len = old_text.len(),
            new_len = new_text.len(),
            "transformation"
        );
    }

    fn on_error(&self, message: &str, cause: Option<&dyn std::error::Error>) {
        match cause {
            Some(cause) => tracing::error!(error = %cause, "{message}"),
            None => tracing::error!("{message}"),
        }
    }

    fn on_info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn on_debug(&self, message: &str) {
        tracing::debug!("{message}");
    }
}
