//! Warning types and codes for the ordering diagnostics system.

use serde::Serialize;

/// Severity levels for ordering diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; the ordering is unaffected.
    Info,
    /// The ordering is best-effort for the affected tables.
    Warning,
    /// Input could not be processed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic produced while building or sorting a dependency graph.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    /// Warning code (e.g., "CYCLE_DETECTED").
    pub code: &'static str,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Optional object identifier (table or constraint name).
    pub object: Option<String>,
}

impl Warning {
    pub fn new(code: &'static str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            object: None,
        }
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(obj) = &self.object {
            write!(f, "[{}] {}: {}", self.code, obj, self.message)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

// Warning code constants

// Graph construction warnings
pub const RELATIONSHIP_RETRIEVAL_FAILED: &str = "RELATIONSHIP_RETRIEVAL_FAILED";
pub const SELF_REFERENCE: &str = "SELF_REFERENCE";
pub const FK_TARGET_EXTERNAL: &str = "FK_TARGET_EXTERNAL";
pub const DUPLICATE_TABLE: &str = "DUPLICATE_TABLE";

// Sort warnings
pub const CYCLE_DETECTED: &str = "CYCLE_DETECTED";

// DDL front-end warnings
pub const ALTER_TARGET_MISSING: &str = "ALTER_TARGET_MISSING";
pub const PARSE_SKIPPED: &str = "PARSE_SKIPPED";
