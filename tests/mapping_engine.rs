//! Integration tests for property-path mapping
//!
//! Tree-aware rewriting over a realistic file, rule priority, the text
//! fallback mode and rule-set validation.

use csharp_refactor::mapping::{
    AccessContext, MappingEngine, MappingMode, MappingOptions, MappingRule, ValidationIssue,
};
use csharp_refactor::observer::MemoryObserver;
use std::sync::Arc;

const REPORTING: &str = r#"namespace Reports
{
    public class Order
    {
        public DateTime CreatedDate { get; set; }
        public Customer Customer { get; set; }
    }

    public class Customer
    {
        public string Name { get; set; }
    }

    public class Supplier
    {
        public string Name { get; set; }
    }

    public class OrderReport
    {
        public string Render(Order order, Supplier supplier)
        {
            var header = order.CreatedDate.ToString("d");
            var footer = order?.CreatedDate;
            var buyer = order.Customer.Name;
            var vendor = supplier.Name;
            return header + buyer + vendor;
        }
    }
}
"#;

fn engine_with(rules: Vec<MappingRule>) -> MappingEngine {
    let mut engine = MappingEngine::new();
    engine.add_rules(rules).unwrap();
    engine
}

#[test]
fn created_date_scenario() {
    let source = r#"class Audit
{
    void Print(Order order, Order previous)
    {
        Log(order.CreatedDate);
        Log(previous.CreatedDate);
    }
}
"#;
    let mut engine = MappingEngine::new();
    engine
        .add_mapping("CreatedDate", "Metadata.CreatedAt")
        .unwrap();

    let outcome = engine.transform(source);
    assert!(outcome.is_success());
    assert_eq!(outcome.text.matches(".Metadata.CreatedAt").count(), 2);
    assert!(!outcome.text.contains("CreatedDate"));
    assert_eq!(outcome.replacements, 2);
    assert_eq!(
        outcome.changes,
        vec!["Mapped 'CreatedDate' → 'Metadata.CreatedAt' (2 occurrence(s))"]
    );
}

#[test]
fn declarations_and_invocations_are_left_alone() {
    let mut engine = MappingEngine::new();
    engine
        .add_mapping("CreatedDate", "Metadata.CreatedAt")
        .unwrap();

    let outcome = engine.transform(REPORTING);
    assert!(outcome.is_success());
    assert!(outcome
        .text
        .contains("public DateTime CreatedDate { get; set; }"));
    assert!(outcome
        .text
        .contains("order.Metadata.CreatedAt.ToString(\"d\")"));
    assert!(outcome.text.contains("order?.Metadata.CreatedAt;"));
    assert_eq!(outcome.replacements, 2);
}

#[test]
fn owner_type_selects_rule() {
    let engine = engine_with(vec![
        MappingRule::new("Name", "Profile.DisplayName").with_parent_type("Customer"),
        MappingRule::new("Name", "Company.LegalName").with_parent_type("Supplier"),
    ]);

    let outcome = engine.transform(REPORTING);
    assert!(outcome.is_success());
    assert!(outcome
        .text
        .contains("var buyer = order.Customer.Profile.DisplayName;"));
    assert!(outcome
        .text
        .contains("var vendor = supplier.Company.LegalName;"));
    assert_eq!(outcome.changes.len(), 2);
}

#[test]
fn type_path_outranks_parent_type() {
    let engine = engine_with(vec![
        MappingRule::new("Name", "Label"),
        MappingRule::new("Name", "Person.FullName").with_parent_type("Customer"),
        MappingRule::new("Name", "Buyer.FullName").with_type_path("Order.Customer"),
    ]);

    let outcome = engine.transform(REPORTING);
    assert!(outcome.text.contains("order.Customer.Buyer.FullName"));
    assert!(outcome.text.contains("supplier.Label"));
}

#[test]
fn find_best_mapping_priority() {
    let r1 = MappingRule::new("Total", "Amounts.Gross");
    let r2 = MappingRule::new("Total", "Invoice.Amount").with_parent_type("Invoice");
    let r3 = MappingRule::new("Total", "Billing.Invoice.Amount").with_type_path("Billing.Invoice");
    assert!(r3.priority() > r2.priority());
    assert!(r2.priority() > r1.priority());

    let engine = engine_with(vec![r1, r2, r3]);

    let full = AccessContext::new("Total")
        .with_parent_type("Invoice")
        .with_owner_path(["Billing", "Invoice"]);
    assert_eq!(
        engine.find_best_mapping(&full).unwrap().target_path,
        "Billing.Invoice.Amount"
    );

    let parent_only = AccessContext::new("Total")
        .with_parent_type("Invoice")
        .with_owner_path(["invoice"]);
    assert_eq!(
        engine.find_best_mapping(&parent_only).unwrap().target_path,
        "Invoice.Amount"
    );

    let bare = AccessContext::new("Total");
    assert_eq!(
        engine.find_best_mapping(&bare).unwrap().target_path,
        "Amounts.Gross"
    );
}

#[test]
fn strict_context_disables_name_fallback() {
    let mut engine = MappingEngine::new().with_options(MappingOptions {
        strict_context: true,
        ..MappingOptions::default()
    });
    engine
        .add_rule(MappingRule::new("Name", "Profile.DisplayName").with_parent_type("Customer"))
        .unwrap();

    let outcome = engine.transform(REPORTING);
    assert!(outcome.text.contains("order.Customer.Profile.DisplayName"));
    assert!(outcome.text.contains("var vendor = supplier.Name;"));
    assert_eq!(outcome.replacements, 1);
}

#[test]
fn text_fallback_logs_every_occurrence() {
    let source = "var a = x.CreatedDate;\nvar b = y.CreatedDate;\n// CreatedDateTime stays\n";
    let mut engine = MappingEngine::new().with_options(MappingOptions {
        mode: MappingMode::TextFallback,
        ..MappingOptions::default()
    });
    engine
        .add_mapping("CreatedDate", "Metadata.CreatedAt")
        .unwrap();

    let outcome = engine.transform(source);
    assert!(outcome.is_success());
    assert_eq!(
        outcome.text,
        "var a = x.Metadata.CreatedAt;\nvar b = y.Metadata.CreatedAt;\n// CreatedDateTime stays\n"
    );
    assert_eq!(outcome.replacements, 2);
    assert_eq!(
        outcome.changes,
        vec![
            "Mapped 'CreatedDate' → 'Metadata.CreatedAt' (line 1)",
            "Mapped 'CreatedDate' → 'Metadata.CreatedAt' (line 2)",
        ]
    );
}

#[test]
fn empty_rule_set_is_not_an_error() {
    let observer = Arc::new(MemoryObserver::new());
    let engine = MappingEngine::new().with_observer(observer.clone());

    let outcome = engine.transform(REPORTING);
    assert!(outcome.is_success());
    assert_eq!(outcome.text, REPORTING);
    assert_eq!(outcome.changes, vec!["No mappings defined"]);
    assert_eq!(outcome.replacements, 0);
    assert_eq!(
        observer.lines_with_prefix("INFO"),
        vec!["INFO: No mappings defined"]
    );
}

#[test]
fn malformed_input_returns_failure() {
    let mut engine = MappingEngine::new();
    engine.add_mapping("A", "B.C").unwrap();

    let outcome = engine.transform("class { (");
    assert!(!outcome.is_success());
    assert_eq!(outcome.text, "class { (");
    assert!(outcome.error.unwrap().starts_with("Failed to parse input"));

    let empty = engine.transform("");
    assert!(!empty.success);
    assert_eq!(empty.error.as_deref(), Some("Code cannot be empty"));
}

#[test]
fn validation_flags_problems() {
    let engine = engine_with(vec![
        MappingRule::new("Status", "State"),
        MappingRule::new("Status", "Workflow.State"),
        MappingRule::new("Price", "Pricing.Price"),
        MappingRule::new("Quantity", "Lines.Count")
            .with_property_type("int")
            .with_new_type("string"),
        MappingRule::new("Weight", "Shipping.Mass")
            .with_property_type("int")
            .with_new_type("double?"),
    ]);

    let issues = engine.validate();
    assert!(issues.contains(&ValidationIssue::DuplicateKey {
        property_name: "Status".into(),
        count: 2
    }));
    assert!(issues
        .iter()
        .any(|i| matches!(i, ValidationIssue::PossibleCycle { property_name, .. } if property_name == "Price")));
    assert!(issues
        .iter()
        .any(|i| matches!(i, ValidationIssue::IncompatibleTypes { property_name, .. } if property_name == "Quantity")));
    assert!(!issues
        .iter()
        .any(|i| matches!(i, ValidationIssue::IncompatibleTypes { property_name, .. } if property_name == "Weight")));
    assert_eq!(issues.len(), 3);

    let report = engine.report();
    assert!(report.contains("Property Mapping Report"));
    assert!(report.contains("Validation Issues:"));
}

#[test]
fn rules_deserialize_from_config_aliases() {
    let rule: MappingRule = serde_json::from_str(
        r#"{"from": "CreatedDate", "to": "Metadata.CreatedAt", "parent_type": "Order"}"#,
    )
    .unwrap();
    assert_eq!(rule.property_name, "CreatedDate");
    assert_eq!(rule.target_path, "Metadata.CreatedAt");
    assert_eq!(rule.priority(), 60);
    assert!(rule.is_nested());
    assert_eq!(rule.mapped_object_name(), Some("Metadata"));
}
