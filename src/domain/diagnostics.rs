use serde::{Deserialize, Serialize};

use super::tree::{LineIndex, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A finding anchored at a text range, with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: String,
    pub category: String,
    pub severity: Severity,
    pub message: String,
    pub range: TextRange,
    pub line: usize,
    pub column: usize,
    /// Whether the constructor fix would change the flagged code.
    #[serde(default)]
    pub fixable: bool,
}

/// Static part of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub id: &'static str,
    pub category: &'static str,
    pub severity: Severity,
}

impl Rule {
    pub fn at(&self, range: TextRange, lines: &LineIndex, message: String) -> Diagnostic {
        let (line, column) = lines.line_col(range.start);
        Diagnostic {
            id: self.id.to_string(),
            category: self.category.to_string(),
            severity: self.severity,
            message,
            range,
            line,
            column,
            fixable: false,
        }
    }
}
