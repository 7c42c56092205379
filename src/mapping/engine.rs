use crate::mapping::context::{
    bare_identifier_context, initializer_context, member_access_context, AccessContext, TypeIndex,
};
use crate::mapping::errors::{require_path, MappingError};
use crate::mapping::rule::MappingRule;
use crate::mapping::validate::{validate_rules, ValidationIssue};
use crate::observer::{self, Observer};
use crate::syntax::{Rewrite, Rewriter, SyntaxNode, SyntaxTree};
use regex::{NoExpand, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingMode {
    /// Rewrites member accesses and identifiers found in the syntax tree.
    #[default]
    TreeAware,
    /// Whole-word regex substitution. Cannot tell owners apart.
    TextFallback,
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingMode::TreeAware => "tree-aware",
            MappingMode::TextFallback => "text-fallback",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    pub mode: MappingMode,
    /// Only consulted by [`MappingMode::TextFallback`].
    pub case_sensitive: bool,
    /// Disable the plain-name fallback when no contextual rule matches.
    pub strict_context: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            mode: MappingMode::TreeAware,
            case_sensitive: true,
            strict_context: false,
        }
    }
}

/// Result of [`MappingEngine::transform`]. Failures carry the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingOutcome {
    pub success: bool,
    pub text: String,
    pub changes: Vec<String>,
    pub replacements: usize,
    pub error: Option<String>,
}

impl MappingOutcome {
    fn success(text: String, changes: Vec<String>, replacements: usize) -> Self {
        Self {
            success: true,
            text,
            changes,
            replacements,
            error: None,
        }
    }

    fn failure(text: &str, error: String) -> Self {
        Self {
            success: false,
            text: text.to_string(),
            changes: Vec::new(),
            replacements: 0,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

fn change_line(rule: &MappingRule) -> String {
    format!("Mapped '{}' → '{}'", rule.property_name, rule.target_path)
}

/// Rewrites legacy property accesses to their new paths.
///
/// ```
/// use csharp_refactor::mapping::MappingEngine;
///
/// let mut engine = MappingEngine::new();
/// engine.add_mapping("CreatedDate", "Metadata.CreatedAt").unwrap();
/// let out = engine.transform("class R { void P(Order o) { var d = o.CreatedDate; } }");
/// assert_eq!(out.text, "class R { void P(Order o) { var d = o.Metadata.CreatedAt; } }");
/// assert_eq!(out.replacements, 1);
/// ```
pub struct MappingEngine {
    rules: Vec<MappingRule>,
    options: MappingOptions,
    observer: Arc<dyn Observer>,
}

impl Default for MappingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MappingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingEngine")
            .field("rules", &self.rules)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MappingEngine {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            options: MappingOptions::default(),
            observer: observer::null(),
        }
    }

    pub fn with_options(mut self, options: MappingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> MappingOptions {
        self.options
    }

    pub fn add_rule(&mut self, rule: MappingRule) -> Result<&mut Self, MappingError> {
        require_path("property name", &rule.property_name)?;
        if rule.property_name.contains('.') {
            return Err(MappingError::InvalidPath {
                field: "property name",
                path: rule.property_name,
            });
        }
        require_path("target path", &rule.target_path)?;
        if let Some(path) = &rule.type_path {
            require_path("type path", path)?;
        }
        if rule.parent_type.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(MappingError::EmptyField {
                field: "parent type",
            });
        }
        self.rules.push(rule);
        Ok(self)
    }

    pub fn add_rules<I>(&mut self, rules: I) -> Result<&mut Self, MappingError>
    where
        I: IntoIterator<Item = MappingRule>,
    {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(self)
    }

    pub fn add_mapping(&mut self, old_name: &str, new_path: &str) -> Result<&mut Self, MappingError> {
        self.add_rule(MappingRule::new(old_name, new_path))
    }

    /// First rule added for `name`.
    pub fn find_mapping(&self, name: &str) -> Option<&MappingRule> {
        self.rules.iter().find(|r| r.property_name == name)
    }

    pub fn find_mappings(&self, name: &str) -> Vec<&MappingRule> {
        self.rules
            .iter()
            .filter(|r| r.property_name == name)
            .collect()
    }

    /// Remove the first rule for `name`.
    pub fn remove_mapping(&mut self, name: &str) -> bool {
        match self.rules.iter().position(|r| r.property_name == name) {
            Some(i) => {
                self.rules.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate_rules(&self.rules)
    }

    fn best_index(&self, ctx: &AccessContext) -> Option<usize> {
        let best = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches(ctx))
            .max_by_key(|(i, r)| {
                (
                    r.priority(),
                    r.type_path.is_some(),
                    r.parent_type.is_some(),
                    Reverse(*i),
                )
            })
            .map(|(i, _)| i);

        if best.is_some() || self.options.strict_context {
            return best;
        }
        self.rules
            .iter()
            .position(|r| r.property_name == ctx.property_name)
    }

    /// Highest-priority rule agreeing with `ctx`, falling back to a plain
    /// name match unless `strict_context` is set.
    pub fn find_best_mapping(&self, ctx: &AccessContext) -> Option<&MappingRule> {
        self.best_index(ctx).map(|i| &self.rules[i])
    }

    /// Apply every rule to `text`. Never returns an error; failures are
    /// reported through [`MappingOutcome::success`].
    pub fn transform(&self, text: &str) -> MappingOutcome {
        if text.trim().is_empty() {
            let outcome = MappingOutcome::failure(text, "Code cannot be empty".to_string());
            self.observer.on_error("Code cannot be empty", None);
            return outcome;
        }
        if self.rules.is_empty() {
            self.observer.on_info("No mappings defined");
            return MappingOutcome::success(
                text.to_string(),
                vec!["No mappings defined".to_string()],
                0,
            );
        }

        self.observer.on_info(&format!(
            "Applying {} mapping rule(s) ({})",
            self.rules.len(),
            self.options.mode
        ));
        let outcome = match self.options.mode {
            MappingMode::TreeAware => self.transform_tree(text),
            MappingMode::TextFallback => self.transform_text(text),
        };

        if outcome.success {
            if outcome.replacements > 0 {
                self.observer
                    .on_transformation("Apply property mappings", text, &outcome.text);
            }
            self.observer.on_info(&format!(
                "Mapping complete: {} replacement(s)",
                outcome.replacements
            ));
        }
        outcome
    }

    fn transform_tree(&self, text: &str) -> MappingOutcome {
        let tree = match SyntaxTree::parse(text) {
            Ok(tree) => tree,
            Err(e) => {
                self.observer.on_error("Failed to parse input", Some(&e));
                return MappingOutcome::failure(text, format!("Failed to parse input: {e}"));
            }
        };

        let mut rewriter = MappingRewriter {
            engine: self,
            index: TypeIndex::build(&tree),
            names: self.rules.iter().map(|r| r.property_name.as_str()).collect(),
            counts: vec![0; self.rules.len()],
        };
        let rewritten = match tree.rewrite(&mut rewriter) {
            Ok(r) => r,
            Err(e) => {
                self.observer.on_error("Mapping rewrite failed", Some(&e));
                return MappingOutcome::failure(
                    text,
                    format!("Error during mapping transformation: {e}"),
                );
            }
        };

        let changes = self
            .rules
            .iter()
            .zip(&rewriter.counts)
            .filter(|(_, n)| **n > 0)
            .map(|(rule, n)| format!("{} ({n} occurrence(s))", change_line(rule)))
            .collect();
        MappingOutcome::success(rewritten.text, changes, rewritten.replacements)
    }

    fn transform_text(&self, text: &str) -> MappingOutcome {
        let mut result = text.to_string();
        let mut changes = Vec::new();
        let mut replacements = 0;
        let mut seen = HashSet::new();

        for rule in &self.rules {
            let key = if self.options.case_sensitive {
                rule.property_name.clone()
            } else {
                rule.property_name.to_lowercase()
            };
            // First rule for a name wins; later ones would re-match its output
            if !seen.insert(key) {
                continue;
            }

            let pattern = format!(r"\b{}\b", regex::escape(&rule.property_name));
            let re = match RegexBuilder::new(&pattern)
                .case_insensitive(!self.options.case_sensitive)
                .build()
            {
                Ok(re) => re,
                Err(e) => {
                    self.observer.on_error("Invalid mapping pattern", Some(&e));
                    return MappingOutcome::failure(
                        text,
                        format!("Error during mapping transformation: {e}"),
                    );
                }
            };

            let mut hits = 0;
            for m in re.find_iter(&result) {
                let line = result[..m.start()].matches('\n').count() + 1;
                changes.push(format!("{} (line {line})", change_line(rule)));
                hits += 1;
            }
            if hits > 0 {
                self.observer.on_debug(&format!(
                    "Text mapping '{}' matched {hits} time(s)",
                    rule.property_name
                ));
                result = re
                    .replace_all(&result, NoExpand(&rule.target_path))
                    .into_owned();
                replacements += hits;
            }
        }

        MappingOutcome::success(result, changes, replacements)
    }

    /// Human-readable summary of the rule set, including validation issues.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Property Mapping Report");
        let _ = writeln!(out, "=======================");
        let _ = writeln!(out, "Total Mappings: {}", self.rules.len());
        let _ = writeln!(out, "Mode: {}", self.options.mode);
        let _ = writeln!(out);

        if self.rules.is_empty() {
            let _ = writeln!(out, "No mappings defined.");
            return out;
        }

        let mut sorted: Vec<&MappingRule> = self.rules.iter().collect();
        sorted.sort_by(|a, b| a.property_name.cmp(&b.property_name));

        let _ = writeln!(out, "Mappings:");
        for rule in sorted {
            let _ = writeln!(out, "  • {rule} [priority {}]", rule.priority());
            if let Some(parent) = &rule.parent_type {
                let _ = writeln!(out, "    Parent type: {parent}");
            }
            if let Some(path) = &rule.type_path {
                let _ = writeln!(out, "    Type path: {path}");
            }
            if let Some(description) = &rule.description {
                let _ = writeln!(out, "    Description: {description}");
            }
        }

        let issues = self.validate();
        if !issues.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Validation Issues:");
            for issue in issues {
                let _ = writeln!(out, "  ! {issue}");
            }
        }
        out
    }
}

fn is_invoked(expr: SyntaxNode<'_>) -> bool {
    expr.parent().is_some_and(|p| {
        p.ts_kind() == "invocation_expression" && p.field("function") == Some(expr)
    })
}

/// Identifiers in type, declaration or label positions never name a property use.
fn is_bare_use(id: SyntaxNode<'_>, parent: SyntaxNode<'_>) -> bool {
    if parent.name_node() == Some(id)
        || parent.field("type") == Some(id)
        || parent.field("returns") == Some(id)
        || is_invoked(id)
    {
        return false;
    }
    if parent.ts_kind() == "foreach_statement" && parent.field("left") == Some(id) {
        return false;
    }
    !matches!(
        parent.ts_kind(),
        "qualified_name"
            | "generic_name"
            | "using_directive"
            | "attribute"
            | "base_list"
            | "type_argument_list"
            | "type_parameter"
            | "type_parameter_constraints_clause"
            | "name_colon"
            | "name_equals"
            | "labeled_statement"
            | "goto_statement"
            | "nullable_type"
            | "array_type"
            | "pointer_type"
            | "explicit_interface_specifier"
            | "enum_member_declaration"
            | "catch_declaration"
            | "tuple_element"
    )
}

/// Context of one identifier, and whether only flat targets may replace it.
fn access_context(id: SyntaxNode<'_>, index: &TypeIndex) -> Option<(AccessContext, bool)> {
    let parent = id.parent()?;
    let name = id.text();
    match parent.ts_kind() {
        "member_access_expression" if parent.field("name") == Some(id) => {
            if is_invoked(parent) {
                return None;
            }
            let qualifier = parent.field("expression")?;
            Some((member_access_context(qualifier, name, index), false))
        }
        "member_binding_expression" => {
            if parent.field("name") != Some(id) || is_invoked(parent) {
                return None;
            }
            let qualifier = parent
                .ancestors()
                .find(|a| a.ts_kind() == "conditional_access_expression")
                .and_then(|c| c.field("condition").or_else(|| c.first_named_child()));
            let ctx = match qualifier {
                Some(q) => member_access_context(q, name, index),
                None => AccessContext::new(name),
            };
            Some((ctx, false))
        }
        "assignment_expression" if parent.field("left") == Some(id) => {
            let creation = parent
                .parent()
                .filter(|p| p.ts_kind() == "initializer_expression")
                .and_then(|p| p.parent())
                .filter(|p| p.ts_kind() == "object_creation_expression");
            match creation {
                Some(creation) => Some((initializer_context(creation, name, index), true)),
                None => Some((bare_identifier_context(id, index), false)),
            }
        }
        _ if is_bare_use(id, parent) => Some((bare_identifier_context(id, index), false)),
        _ => None,
    }
}

struct MappingRewriter<'e> {
    engine: &'e MappingEngine,
    index: TypeIndex,
    names: HashSet<&'e str>,
    counts: Vec<usize>,
}

impl Rewriter for MappingRewriter<'_> {
    fn visit(&mut self, node: SyntaxNode<'_>) -> Rewrite {
        if node.ts_kind() != "identifier" || !self.names.contains(node.text()) {
            return Rewrite::Descend;
        }
        let Some((ctx, flat_only)) = access_context(node, &self.index) else {
            return Rewrite::Descend;
        };
        let Some(i) = self.engine.best_index(&ctx) else {
            return Rewrite::Descend;
        };
        let rule = &self.engine.rules[i];
        if flat_only && rule.is_nested() {
            return Rewrite::Descend;
        }

        self.counts[i] += 1;
        self.engine.observer.on_debug(&format!(
            "Mapped '{}' at line {} using rule priority {}",
            rule.property_name,
            node.line(),
            rule.priority()
        ));
        Rewrite::Replace(rule.target_path.clone())
    }
}
