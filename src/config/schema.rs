use crate::mapping::{MappingMode, MappingOptions, MappingRule};
use crate::transform::{
    AsyncReturnOperation, AsyncStyle, BlockSelector, BlockWrapOperation, ControlFlow,
    EditOperation, InputError, RenameKind, RenameOperation, ReplaceOperation, WrapKind,
    WrapOperation,
};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

fn default_files() -> Vec<String> {
    vec!["*.cs".to_string()]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefactorConfig {
    #[serde(default)]
    pub meta: Metadata,
    /// File-name patterns; `*` matches any prefix.
    #[serde(default = "default_files")]
    pub files: Vec<String>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    #[serde(default)]
    pub mapping: Option<MappingSection>,
}

impl Default for RefactorConfig {
    fn default() -> Self {
        Self {
            meta: Metadata::default(),
            files: default_files(),
            output_dir: None,
            backup: false,
            transformations: Vec::new(),
            mapping: None,
        }
    }
}

impl RefactorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let rule_count = self.mapping.as_ref().map_or(0, |m| m.rules.len());
        if self.transformations.is_empty() && rule_count == 0 {
            issues.push(ValidationIssue::Empty);
        }

        for pattern in &self.files {
            if pattern.trim().is_empty() {
                issues.push(ValidationIssue::InvalidPattern(pattern.clone()));
            }
        }

        for (index, transformation) in self.transformations.iter().enumerate() {
            if let Err(source) = transformation.to_operation() {
                issues.push(ValidationIssue::Transformation { index, source });
            }
        }

        if let Some(mapping) = &self.mapping {
            for (index, rule) in mapping.rules.iter().enumerate() {
                if rule.property_name.trim().is_empty() {
                    issues.push(ValidationIssue::MissingRuleField {
                        index,
                        field: "from",
                    });
                }
                if rule.target_path.trim().is_empty() {
                    issues.push(ValidationIssue::MissingRuleField { index, field: "to" });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Whether the file name of `path` matches one of the `files` patterns.
    ///
    /// A pattern is an exact file name or `*` followed by a suffix; a bare
    /// `*` matches every file.
    pub fn matches_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.files.iter().map(|p| p.trim()).any(|pattern| match pattern.strip_prefix('*') {
            Some(suffix) => name.ends_with(suffix),
            None => name == pattern,
        })
    }

    /// Edit operations in configuration order.
    pub fn operations(&self) -> Result<Vec<Box<dyn EditOperation>>, InputError> {
        self.transformations
            .iter()
            .map(Transformation::to_operation)
            .collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Transformation {
    Rename {
        kind: RenameKind,
        from: String,
        to: String,
    },
    Wrap {
        method: String,
        wrapper: WrapKind,
        /// Handler for try-catch, inserted statement otherwise.
        #[serde(default)]
        code: Option<String>,
    },
    Replace {
        old: String,
        #[serde(default)]
        new: String,
    },
    WrapReturnsInAsyncResult {
        method: String,
        #[serde(default)]
        style: AsyncStyle,
    },
    WrapBlock {
        method: String,
        select: BlockSelector,
        with: ControlFlow,
    },
}

impl Transformation {
    pub fn to_operation(&self) -> Result<Box<dyn EditOperation>, InputError> {
        Ok(match self {
            Transformation::Rename { kind, from, to } => {
                Box::new(RenameOperation::new(*kind, from, to)?)
            }
            Transformation::Wrap {
                method,
                wrapper: WrapKind::TryCatch,
                code,
            } => Box::new(WrapOperation::try_catch(method, code.as_deref())?),
            Transformation::Wrap {
                method,
                wrapper,
                code,
            } => Box::new(WrapOperation::new(
                *wrapper,
                method,
                code.as_deref().unwrap_or_default(),
            )?),
            Transformation::Replace { old, new } => Box::new(ReplaceOperation::new(old, new)?),
            Transformation::WrapReturnsInAsyncResult { method, style } => {
                Box::new(AsyncReturnOperation::new(method, *style)?)
            }
            Transformation::WrapBlock {
                method,
                select,
                with,
            } => Box::new(BlockWrapOperation::new(
                method,
                select.clone(),
                with.clone(),
            )?),
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MappingSection {
    #[serde(default)]
    pub mode: MappingMode,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    #[serde(default)]
    pub strict_context: bool,
    #[serde(default)]
    pub rules: Vec<MappingRule>,
}

impl MappingSection {
    pub fn options(&self) -> MappingOptions {
        MappingOptions {
            mode: self.mode,
            case_sensitive: self.case_sensitive,
            strict_context: self.strict_context,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Empty,
    InvalidPattern(String),
    Transformation { index: usize, source: InputError },
    MissingRuleField { index: usize, field: &'static str },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Empty => {
                write!(f, "config defines no transformations and no mapping rules")
            }
            ValidationIssue::InvalidPattern(p) => write!(f, "invalid file pattern '{p}'"),
            ValidationIssue::Transformation { index, source } => {
                write!(f, "transformation #{} is invalid: {source}", index + 1)
            }
            ValidationIssue::MissingRuleField { index, field } => {
                write!(f, "mapping rule #{} missing required field '{field}'", index + 1)
            }
        }
    }
}
