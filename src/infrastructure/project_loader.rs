use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::SourceFile;
use crate::config::InputConfig;

pub struct ProjectLoader {
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl ProjectLoader {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            exclude_dirs: config.exclude_dirs.clone(),
        }
    }

    /// Reads the given files plus every matching file below the given folders.
    /// Explicit files are read regardless of their extension. The result is
    /// sorted by path and free of duplicates.
    pub fn load(&self, inputs: &[PathBuf], folders: &[PathBuf]) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();
        for input in inputs {
            files.push(Self::read(input)?);
        }
        for folder in folders {
            if !folder.is_dir() {
                anyhow::bail!("Input folder not found: {}", folder.display());
            }
            self.collect_recursive(folder, &mut files)?;
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        tracing::info!(files = files.len(), "collected source files");
        Ok(files)
    }

    fn read(path: &Path) -> Result<SourceFile> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "loaded source");
        Ok(SourceFile {
            path: path.to_path_buf(),
            text,
        })
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.exclude_dirs.iter().any(|d| d == name))
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn collect_recursive(&self, dir: &Path, out: &mut Vec<SourceFile>) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to list directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                if !self.is_excluded(&path) {
                    self.collect_recursive(&path, out)?;
                }
            } else if self.has_extension(&path) {
                out.push(Self::read(&path)?);
            }
        }
        Ok(())
    }
}
