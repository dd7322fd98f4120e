//! Outcome exporters: rewritten sources as text, or a JSON report.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::{FileOutcome, Mode, Summary};
use crate::ports::OutcomeExporter;

/// Where the text exporter puts rewritten sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextTarget {
    /// Print diagnostics and the rewritten files.
    Stdout,
    /// Overwrite the input files.
    InPlace,
    /// Mirror the input paths under a directory.
    Directory(PathBuf),
}

pub struct TextExporter {
    pub mode: Mode,
    pub target: TextTarget,
}

impl TextExporter {
    fn write_diagnostics(out: &mut dyn Write, outcome: &FileOutcome) -> io::Result<()> {
        for d in &outcome.diagnostics {
            let fixable = if d.fixable { " (fixable)" } else { "" };
            writeln!(
                out,
                "{}:{}:{}: {:?} {}: {}{}",
                outcome.path.display(),
                d.line,
                d.column,
                d.severity,
                d.id,
                d.message,
                fixable
            )?;
        }
        for skipped in outcome.constructors.iter().flat_map(|c| &c.skipped) {
            writeln!(
                out,
                "{}: skipped parameter '{}': {}",
                outcome.path.display(),
                skipped.parameter,
                skipped.reason
            )?;
        }
        if let Some(error) = &outcome.error {
            writeln!(out, "{}: error: {}", outcome.path.display(), error)?;
        }
        Ok(())
    }

    fn destination(dir: &Path, source: &Path) -> PathBuf {
        let relative: PathBuf = source
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        dir.join(relative)
    }

    fn write_file(path: &Path, text: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote rewritten source");
        Ok(())
    }
}

impl OutcomeExporter for TextExporter {
    fn export(&self, outcomes: &[FileOutcome]) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for outcome in outcomes {
            Self::write_diagnostics(&mut out, outcome)?;
            match self.mode {
                Mode::Analyze => {}
                Mode::Check => {
                    if outcome.changed() {
                        writeln!(out, "would fix {}", outcome.path.display())?;
                    }
                }
                Mode::Fix => match (&self.target, &outcome.rewritten) {
                    (TextTarget::Stdout, Some(text)) => {
                        writeln!(out, "// ---- {}", outcome.path.display())?;
                        out.write_all(text.as_bytes())?;
                        if !text.ends_with('\n') {
                            writeln!(out)?;
                        }
                    }
                    (TextTarget::InPlace, Some(text)) => Self::write_file(&outcome.path, text)?,
                    (TextTarget::Directory(dir), _) => {
                        Self::write_file(&Self::destination(dir, &outcome.path), outcome.text())?
                    }
                    (_, None) => {}
                },
            }
        }
        let summary = Summary::of(outcomes);
        writeln!(
            out,
            "{} file(s), {} diagnostic(s), {} changed, {} failed",
            summary.files, summary.diagnostics, summary.changed, summary.failed
        )?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Report<'a> {
    mode: Mode,
    summary: Summary,
    files: &'a [FileOutcome],
}

/// Writes one JSON document with a summary and per-file results.
pub struct JsonExporter {
    pub mode: Mode,
    /// `None` prints to stdout.
    pub output: Option<PathBuf>,
}

impl JsonExporter {
    pub fn render(&self, outcomes: &[FileOutcome]) -> Result<String> {
        let report = Report {
            mode: self.mode,
            summary: Summary::of(outcomes),
            files: outcomes,
        };
        serde_json::to_string_pretty(&report).context("Failed to serialize report")
    }
}

impl OutcomeExporter for JsonExporter {
    fn export(&self, outcomes: &[FileOutcome]) -> Result<()> {
        let json = self.render(outcomes)?;
        match &self.output {
            Some(path) => {
                fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
