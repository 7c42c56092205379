//! Heuristic rule suggestions from a legacy/new code pair.

use crate::mapping::rule::MappingRule;
use crate::observer::{self, Observer};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use strsim::jaro_winkler;

/// Minimum similarity for a suggestion to be kept.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

fn declared_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*(?:=[^=>]|;|\{\s*get)")
            .unwrap_or_else(|e| unreachable!("static regex: {e}"))
    })
}

fn dotted_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\b")
            .unwrap_or_else(|e| unreachable!("static regex: {e}"))
    })
}

/// Lowercase, without underscores and dots, so `Consignee.Name` meets `consignee_name`.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    jaro_winkler(&a, &b)
}

/// Proposes [`MappingRule`]s by pairing names declared in the legacy code
/// with the most similar dotted path used in the new code.
#[derive(Clone)]
pub struct MappingDetector {
    threshold: f64,
    observer: Arc<dyn Observer>,
}

impl Default for MappingDetector {
    fn default() -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
            observer: observer::null(),
        }
    }
}

impl std::fmt::Debug for MappingDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingDetector")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl MappingDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn suggest(&self, old_code: &str, new_code: &str) -> Vec<MappingRule> {
        if old_code.trim().is_empty() || new_code.trim().is_empty() {
            return Vec::new();
        }

        let old_names: BTreeSet<&str> = declared_name_re()
            .captures_iter(old_code)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();
        let new_paths: BTreeSet<&str> = dotted_path_re()
            .captures_iter(new_code)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();

        let mut rules = Vec::new();
        for old in old_names {
            // An unchanged name needs no mapping
            if new_paths.contains(old) {
                continue;
            }
            let best = new_paths
                .iter()
                .filter(|p| p.contains('.') || !old_code.contains(*p))
                .map(|p| (*p, similarity(old, p)))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((path, score)) = best {
                if score > self.threshold {
                    self.observer.on_debug(&format!(
                        "Suggested mapping: {old} -> {path} (score {score:.2})"
                    ));
                    rules.push(
                        MappingRule::new(old, path)
                            .with_description(format!("Suggested mapping (similarity: {:.0}%)", score * 100.0)),
                    );
                }
            }
        }
        self.observer
            .on_info(&format!("Mapping detection found {} suggestion(s)", rules.len()));
        rules
    }
}
