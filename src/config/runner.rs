//! Runs a loaded [`RefactorConfig`] over text and files.
//!
//! Transformations run first through a [`CodeEditor`]; property mappings then
//! run over the transformed text. A failing transformation stops the file
//! before any mapping is attempted.

use crate::config::schema::RefactorConfig;
use crate::edit::{write_atomic, EditError};
use crate::mapping::MappingEngine;
use crate::observer::Observer;
use crate::transform::{AsyncWrapReport, CodeEditor};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happened to one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileReport should be checked for failure"]
pub struct FileReport {
    pub original: String,
    pub text: String,
    pub change_log: Vec<String>,
    pub mapping_replacements: usize,
    pub async_reports: Vec<AsyncWrapReport>,
    pub failure: Option<String>,
}

impl FileReport {
    pub fn changed(&self) -> bool {
        self.original != self.text
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub fn run_on_text(config: &RefactorConfig, text: &str, observer: Arc<dyn Observer>) -> FileReport {
    let mut report = FileReport {
        original: text.to_string(),
        text: text.to_string(),
        change_log: Vec::new(),
        mapping_replacements: 0,
        async_reports: Vec::new(),
        failure: None,
    };

    if !config.transformations.is_empty() {
        let operations = match config.operations() {
            Ok(ops) => ops,
            Err(e) => {
                report.failure = Some(e.to_string());
                return report;
            }
        };
        let mut editor = CodeEditor::new(text).with_observer(observer.clone());
        for op in operations {
            editor.add_operation(op);
        }
        let outcome = editor.apply();
        report.text = outcome.text().to_string();
        report.change_log = outcome.change_log().to_vec();
        report.async_reports = editor.async_reports().to_vec();
        if !outcome.is_success() {
            report.failure = outcome.error_message();
            return report;
        }
    }

    if let Some(section) = config.mapping.as_ref().filter(|m| !m.rules.is_empty()) {
        let mut engine = MappingEngine::new()
            .with_options(section.options())
            .with_observer(observer);
        if let Err(e) = engine.add_rules(section.rules.iter().cloned()) {
            report.failure = Some(format!("invalid mapping rule: {e}"));
            return report;
        }
        let outcome = engine.transform(&report.text);
        if !outcome.success {
            report.failure = outcome.error;
            return report;
        }
        report.text = outcome.text;
        report.mapping_replacements = outcome.replacements;
        report.change_log.extend(outcome.changes);
    }

    report
}

#[derive(Debug)]
pub enum RunError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Write(EditError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            RunError::Write(e) => write!(f, "write failed: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Io { source, .. } => Some(source),
            RunError::Write(e) => Some(e),
        }
    }
}

impl From<EditError> for RunError {
    fn from(e: EditError) -> Self {
        RunError::Write(e)
    }
}

/// Where the rewritten `path` is written: beside it, or under `output_dir`
/// keeping its path relative to `root`.
pub fn output_path(config: &RefactorConfig, root: &Path, path: &Path) -> PathBuf {
    match &config.output_dir {
        Some(dir) => {
            let relative = path.strip_prefix(root).unwrap_or(path);
            let relative = if relative.as_os_str().is_empty() {
                path.file_name().map(Path::new).unwrap_or(path)
            } else {
                relative
            };
            dir.join(relative)
        }
        None => path.to_path_buf(),
    }
}

/// Read, rewrite and (unless `dry_run`) write one file.
///
/// Only successful, changed files are written. In-place writes keep a
/// `.bak` copy when `backup` is set.
pub fn run_on_file(
    config: &RefactorConfig,
    root: &Path,
    path: &Path,
    dry_run: bool,
    observer: Arc<dyn Observer>,
) -> Result<FileReport, RunError> {
    let text = fs::read_to_string(path).map_err(|source| RunError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let report = run_on_text(config, &text, observer.clone());

    if dry_run || !report.is_success() || !report.changed() {
        return Ok(report);
    }

    let target = output_path(config, root, path);
    if target == path && config.backup {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        fs::copy(path, PathBuf::from(&backup)).map_err(|source| RunError::Io {
            path: PathBuf::from(backup),
            source,
        })?;
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RunError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_atomic(&target, &report.text)?;
    observer.on_info(&format!("Wrote refactored file {}", target.display()));
    Ok(report)
}
