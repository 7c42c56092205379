use crate::mapping::rule::{same_type, MappingRule};
use std::collections::BTreeMap;
use std::fmt;

const NUMERIC_TYPES: [&str; 11] = [
    "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float", "double", "decimal",
];

const NUMERIC_SYSTEM_TYPES: [&str; 11] = [
    "Byte", "SByte", "Int16", "UInt16", "Int32", "UInt32", "Int64", "UInt64", "Single", "Double",
    "Decimal",
];

/// One problem found in a rule set. Validation never rewrites anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Several rules share a name and none of them carries context.
    DuplicateKey { property_name: String, count: usize },
    /// The target path contains the source name.
    PossibleCycle {
        property_name: String,
        target_path: String,
    },
    IncompatibleTypes {
        property_name: String,
        old_type: String,
        new_type: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DuplicateKey {
                property_name,
                count,
            } => write!(
                f,
                "Duplicate mapping for '{property_name}' without context ({count} rules)"
            ),
            ValidationIssue::PossibleCycle {
                property_name,
                target_path,
            } => write!(
                f,
                "Potential cycle: '{property_name}' maps to '{target_path}'"
            ),
            ValidationIssue::IncompatibleTypes {
                property_name,
                old_type,
                new_type,
            } => write!(
                f,
                "Incompatible types for '{property_name}': {old_type} → {new_type}"
            ),
        }
    }
}

fn strip_system(ty: &str) -> &str {
    ty.strip_prefix("System.").unwrap_or(ty)
}

fn is_numeric(ty: &str) -> bool {
    let ty = strip_system(ty);
    NUMERIC_TYPES.contains(&ty) || NUMERIC_SYSTEM_TYPES.contains(&ty)
}

/// `T` for `T?` or `Nullable<T>`.
fn underlying(ty: &str) -> &str {
    let ty = ty.trim();
    if let Some(inner) = ty.strip_suffix('?') {
        return inner.trim();
    }
    strip_system(ty)
        .strip_prefix("Nullable<")
        .and_then(|t| t.strip_suffix('>'))
        .map(str::trim)
        .unwrap_or(ty)
}

/// Equal, both numeric, or nullable variants of one another.
pub fn types_compatible(old: &str, new: &str) -> bool {
    let (old_base, new_base) = (underlying(old), underlying(new));
    same_type(old, new)
        || same_type(old_base, new_base)
        || (is_numeric(old_base) && is_numeric(new_base))
}

pub fn validate_rules(rules: &[MappingRule]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut by_name: BTreeMap<&str, Vec<&MappingRule>> = BTreeMap::new();
    for rule in rules {
        by_name.entry(rule.property_name.as_str()).or_default().push(rule);
    }
    for (name, group) in &by_name {
        let without_context = group.iter().filter(|r| !r.has_context()).count();
        if without_context > 1 {
            issues.push(ValidationIssue::DuplicateKey {
                property_name: name.to_string(),
                count: without_context,
            });
        }
    }

    for rule in rules {
        if rule.target_path.contains(&rule.property_name) {
            issues.push(ValidationIssue::PossibleCycle {
                property_name: rule.property_name.clone(),
                target_path: rule.target_path.clone(),
            });
        }
    }

    for rule in rules {
        if let (Some(old), Some(new)) = (&rule.property_type, &rule.new_type) {
            if !types_compatible(old, new) {
                issues.push(ValidationIssue::IncompatibleTypes {
                    property_name: rule.property_name.clone(),
                    old_type: old.clone(),
                    new_type: new.clone(),
                });
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_without_context() {
        let rules = vec![
            MappingRule::new("Name", "Person.Name"),
            MappingRule::new("Name", "Employee.FullName"),
        ];
        let issues = validate_rules(&rules);
        assert!(issues.contains(&ValidationIssue::DuplicateKey {
            property_name: "Name".into(),
            count: 2
        }));
        assert!(issues[0].to_string().contains("Duplicate"));
    }

    #[test]
    fn duplicates_with_context_are_fine() {
        let rules = vec![
            MappingRule::new("Name", "Employee.Label").with_parent_type("Employee"),
            MappingRule::new("Name", "Company.Title").with_parent_type("Company"),
            MappingRule::new("Name", "Caption"),
        ];
        assert!(validate_rules(&rules).is_empty());
    }

    #[test]
    fn cycle_detected() {
        let rules = vec![MappingRule::new("Name", "Name.First")];
        assert_eq!(
            validate_rules(&rules),
            vec![ValidationIssue::PossibleCycle {
                property_name: "Name".into(),
                target_path: "Name.First".into()
            }]
        );
    }

    #[test]
    fn type_compatibility() {
        assert!(types_compatible("int", "decimal"));
        assert!(types_compatible("System.Int32", "long"));
        assert!(types_compatible("DateTime", "DateTime?"));
        assert!(types_compatible("Nullable<int>", "int"));
        assert!(types_compatible("int?", "double"));
        assert!(!types_compatible("string", "int"));
        assert!(!types_compatible("DateTime", "string"));
    }

    #[test]
    fn incompatible_types_flagged() {
        let rules = vec![MappingRule::new("Age", "YearsText")
            .with_property_type("int")
            .with_new_type("string")];
        assert_eq!(
            validate_rules(&rules)[0].to_string(),
            "Incompatible types for 'Age': int → string"
        );
    }
}
