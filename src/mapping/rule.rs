use crate::mapping::context::AccessContext;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TYPE_PATH_WEIGHT: u32 = 100;
pub const PARENT_TYPE_WEIGHT: u32 = 50;
pub const PROPERTY_TYPE_WEIGHT: u32 = 25;
pub const NAME_WEIGHT: u32 = 10;

/// Maps one legacy property name to a (possibly dotted) target path.
///
/// The optional fields narrow where the rule applies. A rule is more
/// specific, and wins over its siblings, the more of them it sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(alias = "from")]
    pub property_name: String,
    #[serde(alias = "to")]
    pub target_path: String,
    /// Declared type of the legacy property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    /// Type that owns the property, i.e. the type of the qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    /// Dotted owner chain, compared by suffix (`Order.Customer`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MappingRule {
    pub fn new(property_name: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            target_path: target_path.into(),
            property_type: None,
            parent_type: None,
            type_path: None,
            new_type: None,
            description: None,
        }
    }

    pub fn with_property_type(mut self, ty: impl Into<String>) -> Self {
        self.property_type = Some(ty.into());
        self
    }

    pub fn with_parent_type(mut self, ty: impl Into<String>) -> Self {
        self.parent_type = Some(ty.into());
        self
    }

    pub fn with_type_path(mut self, path: impl Into<String>) -> Self {
        self.type_path = Some(path.into());
        self
    }

    pub fn with_new_type(mut self, ty: impl Into<String>) -> Self {
        self.new_type = Some(ty.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sum of the weights of the fields that are set.
    pub fn priority(&self) -> u32 {
        let mut priority = NAME_WEIGHT;
        if self.type_path.is_some() {
            priority += TYPE_PATH_WEIGHT;
        }
        if self.parent_type.is_some() {
            priority += PARENT_TYPE_WEIGHT;
        }
        if self.property_type.is_some() {
            priority += PROPERTY_TYPE_WEIGHT;
        }
        priority
    }

    pub fn is_nested(&self) -> bool {
        self.target_path.contains('.')
    }

    /// First segment of a nested target (`Consignee` for `Consignee.Name`).
    pub fn mapped_object_name(&self) -> Option<&str> {
        if self.is_nested() {
            self.target_path.split('.').next()
        } else {
            None
        }
    }

    /// Rules without parent or type-path context match any owner.
    pub fn has_context(&self) -> bool {
        self.parent_type.is_some() || self.type_path.is_some()
    }

    /// Whether every field this rule sets agrees with `ctx`.
    pub fn matches(&self, ctx: &AccessContext) -> bool {
        if self.property_name != ctx.property_name {
            return false;
        }
        if let Some(parent) = &self.parent_type {
            if !ctx.parent_type.as_deref().is_some_and(|p| same_type(p, parent)) {
                return false;
            }
        }
        if let Some(ty) = &self.property_type {
            if !ctx.property_type.as_deref().is_some_and(|p| same_type(p, ty)) {
                return false;
            }
        }
        if let Some(path) = &self.type_path {
            if !ctx.matches_type_path(path) {
                return false;
            }
        }
        true
    }
}

/// Textual type equality, ignoring whitespace and namespace qualification.
pub(crate) fn same_type(a: &str, b: &str) -> bool {
    let a: String = a.split_whitespace().collect();
    let b: String = b.split_whitespace().collect();
    a == b || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}

impl fmt::Display for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.property_name, self.target_path)?;
        if let Some(old) = &self.property_type {
            write!(f, " ({old} → {})", self.new_type.as_deref().unwrap_or(old))?;
        }
        Ok(())
    }
}
