use crate::value::Value;
use serde::{Deserialize, Serialize};

///
/// Rule
///
/// One validation rule derived from a field type and its configured
/// parameters. Rules never touch storage; they inspect a candidate value and
/// produce caller-facing messages.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Text length cap, in characters.
    MaxLength(usize),

    /// A value must be present on create.
    Required,

    /// Text must be an absolute slash-separated slug path ending in one of
    /// the permitted extensions (`/dir/file.ext`).
    SlugPath { extensions: Vec<String> },
}

impl Rule {
    /// Check a present value. `Required` is a presence rule and always
    /// passes here; [`check_value`] enforces it against absent values.
    #[must_use]
    pub fn check(&self, value: &Value) -> Option<String> {
        match self {
            Self::Required => None,

            Self::MaxLength(max) => match value {
                Value::Text(s) if s.chars().count() > *max => {
                    Some(format!("cannot exceed {max} characters"))
                }
                _ => None,
            },

            Self::SlugPath { extensions } => match value {
                Value::Text(s) if !is_slug_path(s, extensions) => {
                    Some("path format is invalid".to_string())
                }
                _ => None,
            },
        }
    }
}

/// Run a rule set against a candidate value, collecting every message.
///
/// `value` of `None` means the field was left unset; only `Required`
/// applies then.
#[must_use]
pub fn check_value(rules: &[Rule], value: Option<&Value>) -> Vec<String> {
    match value {
        None => {
            if rules.contains(&Rule::Required) {
                vec!["field is required".to_string()]
            } else {
                Vec::new()
            }
        }
        Some(value) => rules.iter().filter_map(|rule| rule.check(value)).collect(),
    }
}

/// `(/segment)+.ext` where segments are lowercase `[a-z0-9-_]` and the final
/// segment carries one of the permitted extensions.
fn is_slug_path(s: &str, extensions: &[String]) -> bool {
    if !s.starts_with('/') {
        return false;
    }

    let segments: Vec<&str> = s[1..].split('/').collect();
    if segments.is_empty() || segments.iter().any(|seg| seg.is_empty()) {
        return false;
    }

    let (last, dirs) = segments.split_last().expect("segments is non-empty");
    let seg_ok = |seg: &str| {
        seg.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    };
    if !dirs.iter().all(|seg| seg_ok(seg)) {
        return false;
    }

    extensions.iter().any(|ext| {
        last.strip_suffix(ext)
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty() && seg_ok(stem))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn required_only_applies_to_absent_values() {
        let rules = vec![Rule::Required, Rule::MaxLength(5)];

        assert_eq!(check_value(&rules, None), vec!["field is required"]);
        assert!(check_value(&rules, Some(&txt("ok"))).is_empty());
    }

    #[test]
    fn max_length_counts_characters() {
        let rules = vec![Rule::MaxLength(3)];

        assert!(check_value(&rules, Some(&txt("abc"))).is_empty());
        assert_eq!(check_value(&rules, Some(&txt("abcd"))).len(), 1);
    }

    #[test]
    fn slug_path_accepts_permitted_extensions() {
        let rule = Rule::SlugPath {
            extensions: vec!["pdf".into(), "html.twig".into()],
        };

        assert!(rule.check(&txt("/docs/manual.pdf")).is_none());
        assert!(rule.check(&txt("/views/home.html.twig")).is_none());
        assert!(rule.check(&txt("docs/manual.pdf")).is_some());
        assert!(rule.check(&txt("/docs//manual.pdf")).is_some());
        assert!(rule.check(&txt("/docs/manual.exe")).is_some());
        assert!(rule.check(&txt("/Docs/manual.pdf")).is_some());
    }
}
