//! Sensitive-data masking
//!
//! Rewrites a message before any sink or hook sees it. Two rule families:
//! regex rules (global replace over the message text) and field-name rules
//! (applied to messages that parse as JSON when structured mode is on).
//! Field rules run before regex rules; within each list insertion order is
//! preserved and the first matching field rule supplies the replacement.

use regex::Regex;
use serde_json::Value;

/// Replacement used when a field rule does not specify one.
pub const DEFAULT_FIELD_REPLACEMENT: &str = "***";

/// Regex masking rule, applied as a global replace.
#[derive(Debug, Clone)]
pub struct RegexRule {
    pub pattern: Regex,
    pub replacement: String,
}

impl RegexRule {
    /// Compile a rule from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error for invalid patterns.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }
}

/// Field-name masking rule for structured messages.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub keys: Vec<String>,
    pub replacement: String,
}

impl FieldRule {
    pub fn new<I, S>(keys: I, replacement: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            replacement: replacement.into(),
        }
    }

    fn matches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// Compile a pattern-to-replacement mapping into regex rules.
///
/// Invalid patterns are skipped with a diagnostic on the error stream.
/// Patterns are compiled in sorted order so the resulting rule list is
/// deterministic for a given mapping.
pub fn compile_patterns<'a, I>(patterns: I) -> Vec<RegexRule>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = patterns.into_iter().collect();
    pairs.sort_by_key(|(pat, _)| *pat);

    let mut rules = Vec::with_capacity(pairs.len());
    for (pattern, replacement) in pairs {
        match RegexRule::new(pattern, replacement) {
            Ok(rule) => rules.push(rule),
            Err(err) => {
                eprintln!("[logger] skipping invalid mask pattern '{}': {}", pattern, err);
            }
        }
    }
    rules
}

/// Apply all masking rules to a message.
///
/// In structured mode the message is first parsed as JSON (numeric text is
/// preserved); on success field rules rewrite matching values recursively
/// and regex rules run over the re-serialized form. On parse failure, or in
/// text mode, only regex rules apply. Pure and deterministic.
pub fn apply_masking(
    message: &str,
    structured: bool,
    regex_rules: &[RegexRule],
    field_rules: &[FieldRule],
) -> String {
    if structured && !field_rules.is_empty() {
        if let Some(masked) = mask_fields(message, field_rules) {
            return mask_regex(&masked, regex_rules);
        }
    }
    mask_regex(message, regex_rules)
}

fn mask_regex(message: &str, rules: &[RegexRule]) -> String {
    let mut masked = message.to_string();
    for rule in rules {
        masked = rule
            .pattern
            .replace_all(&masked, rule.replacement.as_str())
            .into_owned();
    }
    masked
}

/// Parse `message` as JSON and rewrite values whose key matches a field
/// rule. Returns `None` when the message is not valid JSON.
fn mask_fields(message: &str, rules: &[FieldRule]) -> Option<String> {
    let mut value: Value = serde_json::from_str(message).ok()?;
    mask_value(&mut value, rules);
    // Compact serialization, no trailing line terminator. serde_json does
    // not HTML-escape and the arbitrary_precision feature keeps numeric
    // text intact.
    serde_json::to_string(&value).ok()
}

fn mask_value(value: &mut Value, rules: &[FieldRule]) {
    match value {
        Value::Object(map) => {
            for (key, sub) in map.iter_mut() {
                match replacement_for(key, rules) {
                    Some(replacement) => *sub = Value::String(replacement.to_string()),
                    None => mask_value(sub, rules),
                }
            }
        }
        Value::Array(items) => {
            for sub in items.iter_mut() {
                mask_value(sub, rules);
            }
        }
        _ => {}
    }
}

/// First matching rule wins; empty replacements fall back to the default.
fn replacement_for<'a>(key: &str, rules: &'a [FieldRule]) -> Option<&'a str> {
    rules.iter().find(|rule| rule.matches(key)).map(|rule| {
        if rule.replacement.is_empty() {
            DEFAULT_FIELD_REPLACEMENT
        } else {
            rule.replacement.as_str()
        }
    })
}
