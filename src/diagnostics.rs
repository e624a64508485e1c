//! User-visible, non-fatal problems.
//!
//! The form engine and the request preparation step never abort on a bad `$ref`,
//! a malformed override or a protected endpoint without credentials. They collect
//! [`Notice`]s instead and keep going; the front-end decides how to show them.

use std::fmt;

/// Severity level for a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Something was skipped or blocked
    Error,
    /// The result may not be what the user expects
    Warning,
    /// Informational (e.g. which credential was applied)
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single notice raised while walking a form, building a body or preparing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Where the notice was raised (e.g. "body.address.city", "auth", "override")
    pub location: String,
    pub severity: Severity,
    /// Machine-friendly kind (e.g. "unresolved_ref", "invalid_json")
    pub kind: String,
    pub message: String,
}

impl Notice {
    pub fn new(
        location: impl Into<String>,
        severity: Severity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Notice {
            location: location.into(),
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn error(location: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(location, Severity::Error, kind, message)
    }

    pub fn warning(location: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(location, Severity::Warning, kind, message)
    }

    pub fn info(location: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(location, Severity::Info, kind, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.location, self.message)
    }
}

/// Returns true if any notice is an error
pub fn has_errors(notices: &[Notice]) -> bool {
    notices.iter().any(|n| n.severity == Severity::Error)
}

/// Print notices to stderr, most severe first
pub fn print_notices(notices: &[Notice]) {
    let mut sorted: Vec<&Notice> = notices.iter().collect();
    sorted.sort_by_key(|n| n.severity);
    for notice in sorted {
        let icon = match notice.severity {
            Severity::Error => "❌",
            Severity::Warning => "⚠️ ",
            Severity::Info => "ℹ️ ",
        };
        eprintln!("{icon} {notice}");
    }
}
