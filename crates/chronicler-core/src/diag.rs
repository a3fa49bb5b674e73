use serde::{Deserialize, Serialize};

/// Severity of a collected diagnostic. The core only ever produces
/// warnings; fatal conditions belong to the adapter/glue layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

/// One data-quality finding attributed to a specific event, field, or window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub context: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {} ({})", self.message, self.context),
        }
    }
}

/// Append-only collector returned alongside every pipeline result.
///
/// The core never prints; rendering of diagnostics is the caller's concern.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning attributed to `context`.
    pub fn warn(&mut self, message: impl Into<String>, context: impl Into<String>) {
        self.records.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            context: context.into(),
        });
    }

    /// Fold another collector's records into this one, preserving order.
    pub fn absorb(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.records
    }
}
