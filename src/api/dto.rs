use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::FileOutcome;
use crate::domain::diagnostics::Diagnostic;
use crate::domain::fix::{ConstructorReport, MemberPolicy};
use crate::ports::ParseError;

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandReq {
    pub command: String,
    pub params: Option<serde_json::Value>,
}

/// Source selection shared by `ANALYZE` and `FIX`. Inline `text` wins; a
/// `uri` without text refers to a document sent earlier; `path` reads a file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceParams {
    pub uri: Option<String>,
    pub text: Option<String>,
    pub path: Option<PathBuf>,
    pub member_policy: Option<MemberPolicy>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub uri: String,
    pub diagnostics: Vec<Diagnostic>,
    pub parse_errors: Vec<ParseError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FixResponse {
    pub uri: String,
    pub changed: bool,
    pub text: String,
    pub constructors: Vec<ConstructorReport>,
}

impl From<FileOutcome> for AnalyzeResponse {
    fn from(outcome: FileOutcome) -> Self {
        AnalyzeResponse {
            uri: outcome.path.display().to_string(),
            diagnostics: outcome.diagnostics,
            parse_errors: outcome.parse_errors,
        }
    }
}

impl From<FileOutcome> for FixResponse {
    fn from(outcome: FileOutcome) -> Self {
        let changed = outcome.changed();
        let uri = outcome.path.display().to_string();
        let text = match outcome.rewritten {
            Some(text) => text,
            None => outcome.original,
        };
        FixResponse {
            uri,
            changed,
            text,
            constructors: outcome.constructors,
        }
    }
}
