use crate::config::schema::{RefactorConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = Some(path.to_path_buf());
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml { path, source },
            ConfigError::Json { path: None, source } => ConfigError::Json { path, source },
            ConfigError::Validation { path: None, source } => {
                ConfigError::Validation { path, source }
            }
            other => other,
        }
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "failed to parse config TOML{}: {}", location(path), source)
            }
            ConfigError::Json { path, source } => {
                write!(f, "failed to parse config JSON{}: {}", location(path), source)
            }
            ConfigError::Validation { path, source } => {
                write!(f, "invalid config{}: {}", location(path), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

fn validated(config: RefactorConfig) -> Result<RefactorConfig, ConfigError> {
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_str(input: &str) -> Result<RefactorConfig, ConfigError> {
    let config: RefactorConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    validated(config)
}

pub fn load_json_from_str(input: &str) -> Result<RefactorConfig, ConfigError> {
    let config: RefactorConfig = serde_json::from_str(input)
        .map_err(|source| ConfigError::Json { path: None, source })?;
    validated(config)
}

/// Load a `.json` or TOML config file, chosen by extension.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RefactorConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let loaded = if is_json {
        load_json_from_str(&contents)
    } else {
        load_from_str(&contents)
    };
    loaded.map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Transformation, ValidationIssue};
    use crate::mapping::MappingMode;
    use crate::transform::{
        AsyncStyle, BlockSelector, ControlFlow, InputError, RenameKind, WrapKind,
    };

    const CONFIG: &str = r#"
files = ["*.cs", "Legacy.cshtml"]
backup = true

[meta]
name = "order-migration"

[[transformations]]
type = "rename"
kind = "method"
from = "GetData"
to = "FetchData"

[[transformations]]
type = "wrap"
method = "Save"
wrapper = "try-catch"

[[transformations]]
type = "wrap-returns-in-async-result"
method = "Load"
style = "await-wrap"

[mapping]
mode = "tree-aware"

[[mapping.rules]]
from = "CreatedDate"
to = "Metadata.CreatedAt"
parent_type = "Order"
"#;

    #[test]
    fn loads_block_wrap() {
        let config = load_from_str(
            r#"
[[transformations]]
type = "wrap-block"
method = "Sync"
select = { by = "between-comments", start = "begin", end = "end" }
with = { primitive = "lock", target = "_gate" }
"#,
        )
        .unwrap();
        assert_eq!(
            config.transformations[0],
            Transformation::WrapBlock {
                method: "Sync".into(),
                select: BlockSelector::BetweenComments {
                    start: "begin".into(),
                    end: "end".into(),
                },
                with: ControlFlow::Lock {
                    target: "_gate".into(),
                },
            }
        );
        assert_eq!(
            config.operations().unwrap()[0].description(),
            "Wrap statements between comments 'begin' and 'end' in method 'Sync' with lock"
        );
    }

    #[test]
    fn invalid_block_wrap_is_reported() {
        let err = load_from_str(
            r#"
[[transformations]]
type = "wrap-block"
method = "Sync"
select = { by = "between-indices", start = 4, end = 1 }
with = { primitive = "checked" }
"#,
        )
        .unwrap_err();
        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error");
        };
        assert!(matches!(
            source.issues[0],
            ValidationIssue::Transformation {
                index: 0,
                source: InputError::InvalidRange { start: 4, end: 1 },
            }
        ));
    }

    #[test]
    fn loads_toml() {
        let config = load_from_str(CONFIG).unwrap();
        assert_eq!(config.meta.name, "order-migration");
        assert!(config.backup);
        assert_eq!(config.transformations.len(), 3);
        assert_eq!(
            config.transformations[0],
            Transformation::Rename {
                kind: RenameKind::Method,
                from: "GetData".into(),
                to: "FetchData".into()
            }
        );
        assert!(matches!(
            config.transformations[1],
            Transformation::Wrap {
                wrapper: WrapKind::TryCatch,
                code: None,
                ..
            }
        ));
        assert!(matches!(
            config.transformations[2],
            Transformation::WrapReturnsInAsyncResult {
                style: AsyncStyle::AwaitWrap,
                ..
            }
        ));

        let mapping = config.mapping.unwrap();
        assert_eq!(mapping.mode, MappingMode::TreeAware);
        assert!(mapping.case_sensitive);
        assert_eq!(mapping.rules[0].parent_type.as_deref(), Some("Order"));
    }

    #[test]
    fn loads_json() {
        let json = r#"{
            "transformations": [{"type": "replace", "old": "DateTime.Now", "new": "clock.Now"}]
        }"#;
        let config = load_json_from_str(json).unwrap();
        assert_eq!(config.files, vec!["*.cs"]);
        assert_eq!(config.operations().unwrap().len(), 1);
    }

    #[test]
    fn validation_collects_every_issue() {
        let input = r#"
files = [""]

[[transformations]]
type = "rename"
kind = "class"
from = ""
to = "B"

[[transformations]]
type = "wrap"
method = "Save"
wrapper = "logging"
"#;
        let err = load_from_str(input).unwrap_err();
        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(source.issues.len(), 3);
        assert!(matches!(source.issues[0], ValidationIssue::InvalidPattern(_)));
        assert!(matches!(
            source.issues[1],
            ValidationIssue::Transformation { index: 0, .. }
        ));
        assert!(source.to_string().contains("transformation #2 is invalid"));
    }

    #[test]
    fn empty_config_rejected() {
        assert!(matches!(
            load_from_str("").unwrap_err(),
            ConfigError::Validation { .. }
        ));
    }

    #[test]
    fn unknown_transformation_type_is_a_parse_error() {
        let input = "[[transformations]]\ntype = \"explode\"\n";
        assert!(matches!(
            load_from_str(input).unwrap_err(),
            ConfigError::Toml { .. }
        ));
    }

    #[test]
    fn path_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn file_patterns() {
        let config = load_from_str(CONFIG).unwrap();
        assert!(config.matches_file(Path::new("src/Order.cs")));
        assert!(config.matches_file(Path::new("Legacy.cshtml")));
        assert!(!config.matches_file(Path::new("Other.cshtml")));
        assert!(!config.matches_file(Path::new("readme.md")));
    }
}
