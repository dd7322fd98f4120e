// Application layer: runs the analyzers and the constructor fix over a batch
// of source files.

use std::path::PathBuf;

use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::domain::analyzers::{Analyzer, ConstructorAnalyzer, NoPrimitiveTypesAnalyzer};
use crate::domain::diagnostics::Diagnostic;
use crate::domain::fix::{fix_all, ConstructorReport, FixOptions};
use crate::domain::tree::LineIndex;
use crate::ports::{ParseError, SourceParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Report diagnostics only.
    #[default]
    Analyze,
    /// Report diagnostics and rewrite constructors.
    Fix,
    /// Like `fix`, but only report which files would change.
    Check,
}

impl Mode {
    pub fn fixes(self) -> bool {
        matches!(self, Mode::Fix | Mode::Check)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(skip)]
    pub original: String,
    /// New text when the fix changed the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub constructors: Vec<ConstructorReport>,
    pub parse_errors: Vec<ParseError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    fn failed(file: &SourceFile, error: &anyhow::Error) -> Self {
        Self {
            path: file.path.clone(),
            original: file.text.clone(),
            rewritten: None,
            diagnostics: Vec::new(),
            constructors: Vec::new(),
            parse_errors: Vec::new(),
            error: Some(format!("{error:#}")),
        }
    }

    pub fn changed(&self) -> bool {
        self.rewritten.is_some()
    }

    /// Final text of the file.
    pub fn text(&self) -> &str {
        self.rewritten.as_deref().unwrap_or(&self.original)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub changed: usize,
    pub diagnostics: usize,
    pub failed: usize,
}

impl Summary {
    pub fn of(outcomes: &[FileOutcome]) -> Self {
        outcomes.iter().fold(Summary::default(), |mut s, o| {
            s.files += 1;
            s.changed += usize::from(o.changed());
            s.diagnostics += o.diagnostics.len();
            s.failed += usize::from(o.error.is_some());
            s
        })
    }
}

pub fn analyzers_from(config: &AnalyzerConfig, options: &FixOptions) -> Vec<Box<dyn Analyzer>> {
    let mut analyzers: Vec<Box<dyn Analyzer>> = Vec::new();
    if config.constructor {
        analyzers.push(Box::new(ConstructorAnalyzer {
            options: options.clone(),
        }));
    }
    if config.no_primitive_types {
        analyzers.push(Box::new(NoPrimitiveTypesAnalyzer));
    }
    analyzers
}

pub struct FixUsecase<'a> {
    pub parser: &'a dyn SourceParser,
    pub analyzers: &'a [Box<dyn Analyzer>],
    pub options: FixOptions,
    pub mode: Mode,
}

impl<'a> FixUsecase<'a> {
    /// Processes every file in parallel. Outcomes keep the input order.
    pub fn run(&self, files: &[SourceFile]) -> Vec<FileOutcome> {
        files.par_iter().map(|file| self.process(file)).collect()
    }

    pub fn process(&self, file: &SourceFile) -> FileOutcome {
        match self.try_process(file) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(path = %file.path.display(), "{err:#}");
                FileOutcome::failed(file, &err)
            }
        }
    }

    fn try_process(&self, file: &SourceFile) -> anyhow::Result<FileOutcome> {
        let parse = self.parser.parse(&file.text);
        if !parse.errors.is_empty() {
            tracing::warn!(
                path = %file.path.display(),
                errors = parse.errors.len(),
                "source has syntax errors, unparsed regions are kept verbatim"
            );
        }

        let lines = LineIndex::new(&file.text);
        let mut diagnostics: Vec<Diagnostic> = self
            .analyzers
            .iter()
            .flat_map(|analyzer| analyzer.analyze(&parse.tree, &lines))
            .collect();
        diagnostics.sort_by_key(|d| (d.range.start, d.id.clone()));

        let mut outcome = FileOutcome {
            path: file.path.clone(),
            original: file.text.clone(),
            rewritten: None,
            diagnostics,
            constructors: Vec::new(),
            parse_errors: parse.errors,
            error: None,
        };
        if !self.mode.fixes() {
            return Ok(outcome);
        }

        let fixed = fix_all(&parse.tree, &self.options)
            .with_context(|| format!("failed to fix {}", file.path.display()))?;
        if fixed.changed() {
            let added: usize = fixed.reports.iter().map(|r| r.added.len()).sum();
            tracing::info!(path = %file.path.display(), properties = added, "constructors fixed");
            outcome.rewritten = Some(fixed.tree.text());
        }
        outcome.constructors = fixed.reports;
        Ok(outcome)
    }
}
