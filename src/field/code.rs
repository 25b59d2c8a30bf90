//! Code domains - fixed label/code sets for code-domain fields.
//!
//! A code-domain field stores an index into its [`CodeDomain`]. The user
//! types a label (or a prefix of one); [`CodeDomain::resolve`] decides
//! whether the text names exactly one entry, none, or several.

use super::value::Value;
use super::quote_sql;

/// The codes behind a domain's labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeValues {
    Boolean(Vec<bool>),
    Integer(Vec<i64>),
    String(Vec<String>),
}

impl CodeValues {
    fn len(&self) -> usize {
        match self {
            CodeValues::Boolean(v) => v.len(),
            CodeValues::Integer(v) => v.len(),
            CodeValues::String(v) => v.len(),
        }
    }
}

/// Outcome of matching typed text against the labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeMatch {
    /// Nothing typed.
    Empty,
    /// Exactly one label fits.
    Unique(usize),
    /// No label starts with the text.
    NoMatch,
    /// Several labels start with the text and none equals it.
    Ambiguous(Vec<usize>),
}

/// A label/code table.
///
/// # Invariant
/// `labels.len() == codes.len()`, checked at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeDomain {
    labels: Vec<String>,
    codes: CodeValues,
}

impl CodeDomain {
    /// Integer codes, e.g. `[("Mon", 1), ("Tue", 2)]`.
    pub fn integer(entries: &[(&str, i64)]) -> Self {
        Self {
            labels: entries.iter().map(|(l, _)| l.to_string()).collect(),
            codes: CodeValues::Integer(entries.iter().map(|(_, c)| *c).collect()),
        }
    }

    /// String codes, e.g. `[("Active", "A"), ("Closed", "C")]`.
    pub fn string(entries: &[(&str, &str)]) -> Self {
        Self {
            labels: entries.iter().map(|(l, _)| l.to_string()).collect(),
            codes: CodeValues::String(entries.iter().map(|(_, c)| c.to_string()).collect()),
        }
    }

    /// Two-valued domain; `true_label` maps to `true`.
    pub fn boolean(true_label: &str, false_label: &str) -> Self {
        Self {
            labels: vec![true_label.to_string(), false_label.to_string()],
            codes: CodeValues::Boolean(vec![true, false]),
        }
    }

    /// Build from separate label and code vectors.
    ///
    /// Returns `None` if the lengths differ.
    pub fn from_parts(labels: Vec<String>, codes: CodeValues) -> Option<Self> {
        if labels.len() != codes.len() {
            return None;
        }
        Some(Self { labels, codes })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn codes(&self) -> &CodeValues {
        &self.codes
    }

    /// Label at `index`, if in range.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Short type name used by help output.
    pub fn type_name(&self) -> &'static str {
        match self.codes {
            CodeValues::Boolean(_) => "boolean code",
            CodeValues::Integer(_) => "integer code",
            CodeValues::String(_) => "string code",
        }
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match typed text against the labels (case-insensitive prefix).
    ///
    /// With several prefix matches, a label equal to the whole text wins.
    pub fn resolve(&self, text: &str) -> CodeMatch {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return CodeMatch::Empty;
        }

        let candidates: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.to_lowercase().starts_with(&needle))
            .map(|(i, _)| i)
            .collect();

        match candidates.len() {
            0 => CodeMatch::NoMatch,
            1 => CodeMatch::Unique(candidates[0]),
            _ => match candidates
                .iter()
                .find(|&&i| self.labels[i].to_lowercase() == needle)
            {
                Some(&exact) => CodeMatch::Unique(exact),
                None => CodeMatch::Ambiguous(candidates),
            },
        }
    }

    /// Incremental check while typing: is `candidate` a prefix of some label?
    pub fn accepts_prefix(&self, candidate: &str) -> bool {
        let needle = candidate.trim_start().to_lowercase();
        needle.is_empty()
            || self
                .labels
                .iter()
                .any(|label| label.to_lowercase().starts_with(&needle))
    }

    // ========================================================================
    // Storage mapping
    // ========================================================================

    /// Persisted representation of the entry at `index`.
    ///
    /// Booleans are stored as `1`/`0`.
    pub fn storage_value(&self, index: usize) -> Option<Value> {
        match &self.codes {
            CodeValues::Boolean(v) => v.get(index).map(|b| Value::Int(i64::from(*b))),
            CodeValues::Integer(v) => v.get(index).map(|c| Value::Int(*c)),
            CodeValues::String(v) => v.get(index).map(|c| Value::Str(c.clone())),
        }
    }

    /// Index of the entry whose persisted representation is `stored`.
    pub fn index_of_storage(&self, stored: &Value) -> Option<usize> {
        match (&self.codes, stored) {
            (CodeValues::Boolean(v), Value::Int(i)) => v.iter().position(|b| i64::from(*b) == *i),
            (CodeValues::Integer(v), Value::Int(i)) => v.iter().position(|c| c == i),
            (CodeValues::String(v), Value::Str(s)) => v.iter().position(|c| c == s),
            _ => None,
        }
    }

    /// SQL literal for the entry at `index`.
    pub fn sql_literal(&self, index: usize) -> Option<String> {
        match &self.codes {
            CodeValues::Boolean(v) => v.get(index).map(|b| if *b { "1" } else { "0" }.to_string()),
            CodeValues::Integer(v) => v.get(index).map(|c| c.to_string()),
            CodeValues::String(v) => v.get(index).map(|c| quote_sql(c)),
        }
    }

    /// Index of the boolean code `value`, for boolean domains.
    pub fn index_of_bool(&self, value: bool) -> Option<usize> {
        match &self.codes {
            CodeValues::Boolean(v) => v.iter().position(|b| *b == value),
            _ => None,
        }
    }

    /// Index of the integer code `value`, for integer domains.
    pub fn index_of_int(&self, value: i64) -> Option<usize> {
        match &self.codes {
            CodeValues::Integer(v) => v.iter().position(|c| *c == value),
            _ => None,
        }
    }

    /// Index of the string code `value`, for string domains.
    pub fn index_of_str(&self, value: &str) -> Option<usize> {
        match &self.codes {
            CodeValues::String(v) => v.iter().position(|c| c == value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekdays() -> CodeDomain {
        CodeDomain::integer(&[("Mon", 1), ("Tue", 2), ("Wed", 3), ("Thu", 4)])
    }

    #[test]
    fn test_resolve_unique_prefix() {
        assert_eq!(weekdays().resolve("m"), CodeMatch::Unique(0));
        assert_eq!(weekdays().resolve("WE"), CodeMatch::Unique(2));
    }

    #[test]
    fn test_resolve_no_match() {
        assert_eq!(weekdays().resolve("x"), CodeMatch::NoMatch);
    }

    #[test]
    fn test_resolve_ambiguous() {
        assert_eq!(weekdays().resolve("t"), CodeMatch::Ambiguous(vec![1, 3]));
    }

    #[test]
    fn test_resolve_exact_wins_over_prefix() {
        let domain = CodeDomain::string(&[("Net", "N"), ("Network", "W")]);
        assert_eq!(domain.resolve("net"), CodeMatch::Unique(0));
        assert_eq!(domain.resolve("ne"), CodeMatch::Ambiguous(vec![0, 1]));
    }

    #[test]
    fn test_resolve_empty() {
        assert_eq!(weekdays().resolve("  "), CodeMatch::Empty);
    }

    #[test]
    fn test_accepts_prefix() {
        let domain = weekdays();
        assert!(domain.accepts_prefix(""));
        assert!(domain.accepts_prefix("tu"));
        assert!(!domain.accepts_prefix("tx"));
    }

    #[test]
    fn test_storage_mapping() {
        let domain = weekdays();
        assert_eq!(domain.storage_value(1), Some(Value::Int(2)));
        assert_eq!(domain.index_of_storage(&Value::Int(4)), Some(3));
        assert_eq!(domain.index_of_storage(&Value::Str("4".into())), None);
        assert_eq!(domain.storage_value(9), None);
    }

    #[test]
    fn test_boolean_domain() {
        let domain = CodeDomain::boolean("Yes", "No");
        assert_eq!(domain.sql_literal(0), Some("1".to_string()));
        assert_eq!(domain.index_of_bool(false), Some(1));
        assert_eq!(domain.type_name(), "boolean code");
    }

    #[test]
    fn test_string_sql_literal_quotes() {
        let domain = CodeDomain::string(&[("Owner's", "O'K")]);
        assert_eq!(domain.sql_literal(0), Some("'O''K'".to_string()));
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        let codes = CodeValues::Integer(vec![1, 2]);
        assert!(CodeDomain::from_parts(vec!["a".into()], codes).is_none());
    }
}
