// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Explicit diagnostics sink threaded through every component.
//!
//! Events are recorded so callers (and tests) can inspect what happened
//! during a run, and are forwarded to `tracing` as they are pushed.

#[cfg(test)]
#[path = "./diagnostics_test.rs"]
mod diagnostics_test;

/// Severity of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    /// Stable identifier, e.g. `tfgen::reserved_key_collision`.
    pub code: &'static str,
    pub message: String,
}

/// Collected diagnostics for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<Event>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Severity::Debug, code, message.into());
    }

    pub fn info(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Severity::Info, code, message.into());
    }

    pub fn warn(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Severity::Warning, code, message.into());
    }

    fn push(&mut self, severity: Severity, code: &'static str, message: String) {
        match severity {
            Severity::Debug => tracing::debug!(code, "{message}"),
            Severity::Info => tracing::info!(code, "{message}"),
            Severity::Warning => tracing::warn!(code, "{message}"),
        }
        self.events.push(Event {
            severity,
            code,
            message,
        });
    }

    /// All events in the order they were emitted.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events at warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    /// Check whether any event carries the given code.
    pub fn contains(&self, code: &str) -> bool {
        self.events.iter().any(|e| e.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
