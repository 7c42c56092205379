//! Integration tests for refactoring configs
//!
//! Tests loading TOML and JSON configs from disk and running them over
//! files, including output directories, backups and failures.

use csharp_refactor::config::{
    load_from_path, load_from_str, output_path, run_on_file, run_on_text, ConfigError,
    Transformation, ValidationIssue,
};
use csharp_refactor::mapping::MappingMode;
use csharp_refactor::observer::{self, MemoryObserver};
use csharp_refactor::transform::RenameKind;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const ORDER_SERVICE: &str = r#"namespace Shop
{
    public class OrderService
    {
        public Order GetData(int id)
        {
            var order = repository.Find(id);
            Audit(order.CreatedDate);
            return order;
        }

        public void Save(Order order)
        {
            repository.Save(order);
        }
    }
}
"#;

const MIGRATION: &str = r#"
files = ["*.cs"]
backup = true

[meta]
name = "order-migration"
description = "Move order timestamps under Metadata"

[[transformations]]
type = "rename"
kind = "method"
from = "GetData"
to = "FetchOrder"

[[transformations]]
type = "wrap"
method = "Save"
wrapper = "try-catch"

[[transformations]]
type = "wrap-returns-in-async-result"
method = "FetchOrder"
style = "value-wrap"

[mapping]
mode = "tree-aware"

[[mapping.rules]]
from = "CreatedDate"
to = "Metadata.CreatedAt"
"#;

/// Helper to create a temp dir with a config and a small source tree
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src/Orders")).unwrap();
    fs::write(dir.path().join("src/Orders/OrderService.cs"), ORDER_SERVICE).unwrap();
    fs::write(dir.path().join("src/notes.txt"), "GetData").unwrap();
    fs::write(dir.path().join("migration.toml"), MIGRATION).unwrap();
    dir
}

#[test]
fn test_load_config_from_path() {
    let dir = setup_test_workspace();
    let config = load_from_path(dir.path().join("migration.toml")).unwrap();

    assert_eq!(config.meta.name, "order-migration");
    assert_eq!(
        config.meta.description.as_deref(),
        Some("Move order timestamps under Metadata")
    );
    assert_eq!(config.transformations.len(), 3);
    assert_eq!(
        config.transformations[0],
        Transformation::Rename {
            kind: RenameKind::Method,
            from: "GetData".into(),
            to: "FetchOrder".into(),
        }
    );
    let mapping = config.mapping.as_ref().unwrap();
    assert_eq!(mapping.mode, MappingMode::TreeAware);
    assert_eq!(mapping.rules.len(), 1);
    assert!(config.matches_file(Path::new("src/Orders/OrderService.cs")));
    assert!(!config.matches_file(Path::new("src/notes.txt")));
}

#[test]
fn test_load_json_config_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rename.json");
    fs::write(
        &path,
        r#"{
            "meta": {"name": "json"},
            "transformations": [
                {"type": "rename", "kind": "class", "from": "OrderService", "to": "OrderManager"}
            ],
            "mapping": {
                "mode": "text-fallback",
                "case_sensitive": false,
                "rules": [{"from": "createddate", "to": "Metadata.CreatedAt"}]
            }
        }"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    let report = run_on_text(&config, ORDER_SERVICE, observer::null());

    assert!(report.is_success());
    assert!(report.text.contains("public class OrderManager"));
    assert!(report.text.contains("Audit(order.Metadata.CreatedAt);"));
}

#[test]
fn test_full_pipeline_on_text() {
    let config = load_from_str(MIGRATION).unwrap();
    let obs = Arc::new(MemoryObserver::new());
    let report = run_on_text(&config, ORDER_SERVICE, obs.clone());

    assert!(report.is_success(), "{:?}", report.failure);
    assert!(report
        .text
        .contains("public async Task<Order> FetchOrder(int id)"));
    assert!(report.text.contains("return Task.FromResult(order);"));
    assert!(report.text.contains("catch (Exception ex)"));
    assert!(report.text.contains("Audit(order.Metadata.CreatedAt);"));
    assert_eq!(report.mapping_replacements, 1);
    assert_eq!(report.async_reports.len(), 1);
    assert_eq!(report.async_reports[0].original_return_type, "Order");
    assert_eq!(report.change_log.len(), 4);
    assert_eq!(obs.lines_with_prefix("TRANSFORMATION").len(), 4);
}

#[test]
fn test_run_on_file_in_place_with_backup() {
    let dir = setup_test_workspace();
    let config = load_from_path(dir.path().join("migration.toml")).unwrap();
    let root = dir.path().join("src");
    let file = root.join("Orders/OrderService.cs");

    let report = run_on_file(&config, &root, &file, false, observer::null()).unwrap();

    assert!(report.changed());
    let written = fs::read_to_string(&file).unwrap();
    assert_eq!(written, report.text);
    assert!(written.contains("FetchOrder"));
    assert_eq!(
        fs::read_to_string(root.join("Orders/OrderService.cs.bak")).unwrap(),
        ORDER_SERVICE
    );
}

#[test]
fn test_run_on_file_to_output_dir() {
    let dir = setup_test_workspace();
    let mut config = load_from_path(dir.path().join("migration.toml")).unwrap();
    config.output_dir = Some(dir.path().join("out"));
    let root = dir.path().join("src");
    let file = root.join("Orders/OrderService.cs");

    let target = output_path(&config, &root, &file);
    assert_eq!(target, dir.path().join("out/Orders/OrderService.cs"));

    run_on_file(&config, &root, &file, false, observer::null()).unwrap();
    assert!(fs::read_to_string(&target).unwrap().contains("FetchOrder"));
    assert_eq!(fs::read_to_string(&file).unwrap(), ORDER_SERVICE);
    assert!(!root.join("Orders/OrderService.cs.bak").exists());
}

#[test]
fn test_failed_file_is_not_written() {
    let dir = setup_test_workspace();
    let config = load_from_str(
        r#"
[[transformations]]
type = "rename"
kind = "class"
from = "OrderService"
to = "OrderManager"

[[transformations]]
type = "wrap"
method = "Missing"
wrapper = "logging"
code = "Trace()"
"#,
    )
    .unwrap();
    let root = dir.path().join("src");
    let file = root.join("Orders/OrderService.cs");

    let report = run_on_file(&config, &root, &file, false, observer::null()).unwrap();

    assert!(!report.is_success());
    assert!(report.text.contains("OrderManager"));
    assert_eq!(report.change_log.len(), 1);
    assert_eq!(fs::read_to_string(&file).unwrap(), ORDER_SERVICE);
}

#[test]
fn test_unchanged_file_is_not_written() {
    let dir = setup_test_workspace();
    let config = load_from_str(
        r#"
backup = true

[mapping]
[[mapping.rules]]
from = "ShippedDate"
to = "Metadata.ShippedAt"
"#,
    )
    .unwrap();
    let root = dir.path().join("src");
    let file = root.join("Orders/OrderService.cs");

    let report = run_on_file(&config, &root, &file, false, observer::null()).unwrap();

    assert!(report.is_success());
    assert!(!report.changed());
    assert!(!root.join("Orders/OrderService.cs.bak").exists());
}

#[test]
fn test_validation_reports_every_issue() {
    let input = r#"
files = ["  "]

[[transformations]]
type = "replace"
old = ""
new = "x"

[mapping]
[[mapping.rules]]
from = "A"
to = ""
"#;
    let err = load_from_str(input).unwrap_err();
    let ConfigError::Validation { source, .. } = err else {
        panic!("expected validation error, got {err}");
    };
    assert_eq!(source.issues.len(), 3);
    assert!(source
        .issues
        .iter()
        .any(|i| matches!(i, ValidationIssue::MissingRuleField { index: 0, field: "to" })));
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let err = load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}
