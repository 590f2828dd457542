//! Diagnostics sink seam.
//!
//! The analysis decides whether and where to signal; delivery, formatting
//! and ordering belong to the sink implementation. Sinks are shared across
//! conditions (and possibly threads), so they serialize their own writes.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::frontend::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagSeverity {
    Warning,
    Error,
}

impl std::fmt::Display for DiagSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One emitted signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub severity: DiagSeverity,
    pub message: String,
}

pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, location: &SourceLocation, severity: DiagSeverity, message: &str);
}

/// Sink that accumulates diagnostics in memory, for the driver and tests.
#[derive(Debug, Default)]
pub struct CollectorSink {
    collected: Mutex<Vec<Diagnostic>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        let mut guard = self.collected.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }

    pub fn len(&self) -> usize {
        self.collected.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for CollectorSink {
    fn report(&self, location: &SourceLocation, severity: DiagSeverity, message: &str) {
        self.collected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Diagnostic {
                location: location.clone(),
                severity,
                message: message.to_string(),
            });
    }
}
