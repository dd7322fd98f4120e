// Boundaries between the fix engine and the outside world.

use serde::{Deserialize, Serialize};

use crate::application::FileOutcome;
use crate::domain::tree::{SourceTree, TextRange};

/// Result of parsing one source text. Parsing never fails outright; problems
/// are reported alongside a tree that still reproduces the input.
#[derive(Debug, Clone)]
pub struct Parse {
    pub tree: SourceTree,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

pub trait SourceParser: Send + Sync {
    fn parse(&self, text: &str) -> Parse;
}

pub trait OutcomeExporter {
    fn export(&self, outcomes: &[FileOutcome]) -> anyhow::Result<()>;
}
