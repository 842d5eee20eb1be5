//! Fixture shapes.
//!
//! Fixtures are JSON documents of the form
//!
//! ```json
//! {
//!   "valid": ["var x = {a};", { "code": "var x = {a: a};", "options": ["never"] }],
//!   "invalid": [{
//!     "code": "var x = {a: a};",
//!     "output": "var x = {a};",
//!     "errors": [{ "messageId": "expectedPropertyShorthand", "line": 1, "column": 10 }]
//!   }]
//! }
//! ```

use estlint_syntax::ParseOptions;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Valid and invalid cases for one rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCases {
    #[serde(default)]
    pub valid: Vec<ValidCase>,
    #[serde(default)]
    pub invalid: Vec<InvalidCase>,
}

impl TestCases {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Code that must lint clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidCase {
    Code(String),
    Detailed(ValidCaseDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidCaseDetails {
    pub code: String,
    #[serde(default)]
    pub options: Vec<Value>,
    #[serde(default)]
    pub parse_options: Option<ParseOptions>,
    /// Free-form label shown in failures
    #[serde(default)]
    pub name: Option<String>,
}

impl ValidCase {
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Code(code) => code,
            Self::Detailed(details) => &details.code,
        }
    }

    #[must_use]
    pub fn options(&self) -> &[Value] {
        match self {
            Self::Code(_) => &[],
            Self::Detailed(details) => &details.options,
        }
    }

    #[must_use]
    pub fn parse_options(&self) -> Option<ParseOptions> {
        match self {
            Self::Code(_) => None,
            Self::Detailed(details) => details.parse_options,
        }
    }
}

impl From<&str> for ValidCase {
    fn from(code: &str) -> Self {
        Self::Code(code.to_string())
    }
}

/// Code that must produce exactly the listed diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InvalidCase {
    pub code: String,
    #[serde(default)]
    pub options: Vec<Value>,
    #[serde(default)]
    pub parse_options: Option<ParseOptions>,
    #[serde(default)]
    pub name: Option<String>,
    pub errors: ExpectedErrors,
    /// Absent: the rule must not change the code. `null`: same, stated
    /// explicitly. A string: the exact fixed text.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub output: Option<Option<String>>,
    /// Fix passes used to compute `output`
    #[serde(default = "one_pass")]
    pub passes: usize,
}

fn one_pass() -> usize {
    1
}

/// Distinguishes an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl InvalidCase {
    #[must_use]
    pub fn new(code: &str, errors: Vec<ErrorMatcher>) -> Self {
        Self {
            code: code.to_string(),
            options: Vec::new(),
            parse_options: None,
            name: None,
            errors: ExpectedErrors::List(errors),
            output: None,
            passes: 1,
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: Option<&str>) -> Self {
        self.output = Some(output.map(str::to_string));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<Value>) -> Self {
        self.options = options;
        self
    }

    /// Number of diagnostics the case expects.
    #[must_use]
    pub fn expected_count(&self) -> usize {
        match &self.errors {
            ExpectedErrors::Count(count) => *count,
            ExpectedErrors::List(matchers) => matchers.len(),
        }
    }
}

/// Either a bare diagnostic count or one matcher per diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedErrors {
    Count(usize),
    List(Vec<ErrorMatcher>),
}

/// Expected properties of one diagnostic; absent fields are not checked.
///
/// A bare string is shorthand for `{ "message": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "MatcherRepr")]
pub struct ErrorMatcher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    /// Node or token type the diagnostic is attached to
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<SuggestionMatcher>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MatcherRepr {
    Message(String),
    Detailed(DetailedMatcher),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DetailedMatcher {
    message_id: Option<String>,
    message: Option<String>,
    data: Option<BTreeMap<String, Value>>,
    #[serde(rename = "type")]
    node_type: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
    end_line: Option<u32>,
    end_column: Option<u32>,
    suggestions: Option<Vec<SuggestionMatcher>>,
}

/// Data values may be written as numbers or booleans; they compare by
/// their string form.
fn data_strings(data: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    data.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

impl From<MatcherRepr> for ErrorMatcher {
    fn from(repr: MatcherRepr) -> Self {
        match repr {
            MatcherRepr::Message(message) => Self {
                message: Some(message),
                ..Self::default()
            },
            MatcherRepr::Detailed(matcher) => Self {
                message_id: matcher.message_id,
                message: matcher.message,
                data: matcher.data.map(data_strings),
                node_type: matcher.node_type,
                line: matcher.line,
                column: matcher.column,
                end_line: matcher.end_line,
                end_column: matcher.end_column,
                suggestions: matcher.suggestions,
            },
        }
    }
}

impl ErrorMatcher {
    #[must_use]
    pub fn message_id(message_id: &str) -> Self {
        Self {
            message_id: Some(message_id.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    #[must_use]
    pub fn end(mut self, line: u32, column: u32) -> Self {
        self.end_line = Some(line);
        self.end_column = Some(column);
        self
    }

    #[must_use]
    pub fn data(mut self, key: &str, value: &str) -> Self {
        self.data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn node_type(mut self, node_type: &str) -> Self {
        self.node_type = Some(node_type.to_string());
        self
    }
}

/// Expected suggestion of a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SuggestionMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    /// The code after applying only this suggestion
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_case_forms() {
        let cases = TestCases::from_json(
            r#"{
                "valid": [
                    "foo();",
                    { "code": "bar();", "options": ["never"], "parseOptions": { "ecmaVersion": 6 } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cases.valid[0], ValidCase::Code("foo();".to_string()));
        assert_eq!(cases.valid[1].code(), "bar();");
        assert_eq!(cases.valid[1].options(), [json!("never")]);
        assert_eq!(cases.valid[1].parse_options(), Some(ParseOptions::new(6)));
        assert!(cases.invalid.is_empty());
    }

    #[test]
    fn test_output_absent_null_and_text() {
        let cases = TestCases::from_json(
            r#"{
                "invalid": [
                    { "code": "a", "errors": 1 },
                    { "code": "b", "errors": 1, "output": null },
                    { "code": "c", "errors": 1, "output": "d", "passes": 2 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cases.invalid[0].output, None);
        assert_eq!(cases.invalid[0].passes, 1);
        assert_eq!(cases.invalid[1].output, Some(None));
        assert_eq!(cases.invalid[2].output, Some(Some("d".to_string())));
        assert_eq!(cases.invalid[2].passes, 2);
    }

    #[test]
    fn test_error_matcher_forms() {
        let case: InvalidCase = serde_json::from_value(json!({
            "code": "x",
            "errors": [
                "Bare message.",
                { "messageId": "mutable", "data": { "name": "foo", "count": 2 }, "type": "CatchClause", "line": 1, "column": 5, "endLine": 1, "endColumn": 9 }
            ]
        }))
        .unwrap();
        let ExpectedErrors::List(matchers) = &case.errors else {
            panic!("expected matchers");
        };
        assert_eq!(matchers[0].message.as_deref(), Some("Bare message."));
        assert_eq!(
            matchers[1],
            ErrorMatcher::message_id("mutable")
                .data("count", "2")
                .data("name", "foo")
                .node_type("CatchClause")
                .at(1, 5)
                .end(1, 9)
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = TestCases::from_json(r#"{ "invalid": [{ "code": "x", "errors": 1, "ouptut": "y" }] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("ouptut"));
    }
}
