//! Tenant variable substitution.
//!
//! Each variable is recognised in three spellings, tried longest first at
//! every position of the template:
//!
//! - the stored marker form `#{name}#`
//! - the raw upstream form `${name}$`
//! - the bare name itself
//!
//! Substitution is a single left-to-right pass, so a substituted value is
//! never scanned again. Anything that matches no variable is copied through
//! unchanged.

use std::collections::BTreeMap;

use crate::parser::{MARKER_CLOSE, MARKER_OPEN, RAW_CLOSE, RAW_OPEN};

/// Variable name to value, iterated in name order.
pub type TenantVariables = BTreeMap<String, String>;

/// Precompiled substitution table for one set of tenant variables.
#[derive(Debug, Clone)]
pub struct VariableExpander {
    /// `(pattern, value)` ordered longest pattern first, then by pattern text.
    patterns: Vec<(String, String)>,
}

impl VariableExpander {
    pub fn new(variables: &TenantVariables) -> Self {
        let mut patterns = Vec::with_capacity(variables.len() * 3);
        for (name, value) in variables {
            if name.is_empty() {
                continue;
            }
            patterns.push((format!("{MARKER_OPEN}{name}{MARKER_CLOSE}"), value.clone()));
            patterns.push((format!("{RAW_OPEN}{name}{RAW_CLOSE}"), value.clone()));
            patterns.push((name.clone(), value.clone()));
        }
        patterns.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        patterns.dedup_by(|(a, _), (b, _)| a == b);
        Self { patterns }
    }

    pub fn expand(&self, template: &str) -> String {
        if self.patterns.is_empty() {
            return template.to_string();
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while !rest.is_empty() {
            if let Some((pattern, value)) = self
                .patterns
                .iter()
                .find(|(pattern, _)| rest.starts_with(pattern.as_str()))
            {
                out.push_str(value);
                rest = &rest[pattern.len()..];
                continue;
            }
            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                out.push(ch);
            }
            rest = chars.as_str();
        }
        out
    }
}

/// One-shot convenience over [`VariableExpander`].
pub fn expand(template: &str, variables: &TenantVariables) -> String {
    VariableExpander::new(variables).expand(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::normalize_placeholders;

    fn vars(pairs: &[(&str, &str)]) -> TenantVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn raw_placeholder() {
        assert_eq!(
            expand("prefix ${X}$ suffix", &vars(&[("X", "val")])),
            "prefix val suffix"
        );
    }

    #[test]
    fn normalized_placeholder() {
        let stored = normalize_placeholders("prefix ${X}$ suffix");
        assert_eq!(expand(&stored, &vars(&[("X", "val")])), "prefix val suffix");
    }

    #[test]
    fn bare_name() {
        assert_eq!(
            expand("SELECT * FROM tenantSchema.users", &vars(&[("tenantSchema", "acme")])),
            "SELECT * FROM acme.users"
        );
    }

    #[test]
    fn unknown_placeholder_passes_through() {
        assert_eq!(expand("${UNKNOWN}$", &TenantVariables::new()), "${UNKNOWN}$");
        assert_eq!(
            expand("#{UNKNOWN}# and ${X}$", &vars(&[("X", "1")])),
            "#{UNKNOWN}# and 1"
        );
    }

    #[test]
    fn every_occurrence_is_replaced() {
        assert_eq!(
            expand("#{db}#.a, #{db}#.b, ${db}$.c", &vars(&[("db", "mart")])),
            "mart.a, mart.b, mart.c"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let v = vars(&[("A", "${B}$"), ("B", "never")]);
        assert_eq!(expand("${A}$", &v), "${B}$");
    }

    #[test]
    fn longer_name_wins_over_its_prefix() {
        let v = vars(&[("src", "S"), ("srcDB", "core")]);
        assert_eq!(expand("#{srcDB}# #{src}# srcDB", &v), "core S core");
    }

    #[test]
    fn output_is_stable_for_fixed_input() {
        let v = vars(&[("b", "2"), ("a", "1"), ("ab", "X")]);
        let first = expand("ab a b #{ab}#", &v);
        for _ in 0..5 {
            assert_eq!(expand("ab a b #{ab}#", &v), first);
        }
        assert_eq!(first, "X 1 2 X");
    }

    #[test]
    fn multibyte_text_is_preserved() {
        assert_eq!(
            expand("SELECT 'héllo' || '#{who}#'", &vars(&[("who", "wörld")])),
            "SELECT 'héllo' || 'wörld'"
        );
    }

    #[test]
    fn empty_names_are_ignored() {
        let v = vars(&[("", "boom")]);
        assert!(VariableExpander::new(&v).patterns.is_empty());
        assert_eq!(expand("SELECT 1", &v), "SELECT 1");
    }
}
