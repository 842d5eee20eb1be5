//! The rule contract: metadata, options schema and listener setup.
//!
//! A rule is a stateless value in the registry. For every pass the linter
//! calls [`Rule::create`] with the configured options and gets back a fresh
//! set of [`Listeners`], so per-pass state lives in the listener closures
//! and never leaks into the next pass.

use crate::context::RuleContext;
use crate::error::{ConfigError, RuleError};
use estlint_syntax::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of problem a rule reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Code that is likely a bug
    Problem,
    /// A better way of doing something
    Suggestion,
    /// Whitespace and formatting
    Layout,
}

/// What a fixable rule's fixes may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixKind {
    Code,
    Whitespace,
}

/// Static description of a rule.
#[derive(Debug)]
pub struct RuleMeta {
    /// Rule id used in configs and diagnostics (e.g. `"no-ex-assign"`)
    pub name: &'static str,
    pub kind: RuleKind,
    pub description: &'static str,
    /// Enabled (as an error) by the `recommended` preset
    pub recommended: bool,
    /// `None` when the rule never proposes fixes
    pub fixable: Option<FixKind>,
    pub has_suggestions: bool,
    /// Message catalog: `(message id, template)` pairs
    pub messages: &'static [(&'static str, &'static str)],
}

impl RuleMeta {
    /// Template for a message id.
    #[must_use]
    pub fn message(&self, message_id: &str) -> Option<&'static str> {
        self.messages
            .iter()
            .find_map(|(id, template)| (*id == message_id).then_some(*template))
    }
}

/// Shape of the options a rule accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsSchema {
    /// The rule takes no options
    None,
    /// One schema per positional option
    Positional(Vec<Value>),
    /// A schema for the whole options array
    Full(Value),
}

impl OptionsSchema {
    /// The draft-07 schema the options array is validated against.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::None => serde_json::json!({
                "type": "array",
                "minItems": 0,
                "maxItems": 0,
            }),
            Self::Positional(items) => serde_json::json!({
                "type": "array",
                "items": items,
                "minItems": 0,
                "maxItems": items.len(),
            }),
            Self::Full(schema) => schema.clone(),
        }
    }

    /// Compile the schema, failing when the rule ships a broken one.
    pub fn compile(&self, rule_id: &str) -> Result<jsonschema::Validator, ConfigError> {
        jsonschema::draft7::new(&self.to_json_schema()).map_err(|err| {
            ConfigError::InvalidSchema {
                rule_id: rule_id.to_string(),
                message: err.to_string(),
            }
        })
    }

    /// Check configured options against the schema.
    pub fn validate(&self, rule_id: &str, options: &RuleOptions) -> Result<(), ConfigError> {
        let validator = self.compile(rule_id)?;
        let instance = options.to_value();
        let errors: Vec<String> = validator
            .iter_errors(&instance)
            .map(|err| err.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::InvalidOptions {
                rule_id: rule_id.to_string(),
                errors,
            })
        }
    }
}

/// The positional options configured for a rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOptions(Vec<Value>);

impl RuleOptions {
    #[must_use]
    pub const fn new(options: Vec<Value>) -> Self {
        Self(options)
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// A string option, `None` when absent or not a string.
    #[must_use]
    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Deserialize one option into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(
        &self,
        index: usize,
    ) -> Result<Option<T>, RuleError> {
        self.get(index)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|err| RuleError::InvalidOptions(err.to_string()))
            })
            .transpose()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// The options as a JSON array.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.clone())
    }
}

impl From<Vec<Value>> for RuleOptions {
    fn from(options: Vec<Value>) -> Self {
        Self(options)
    }
}

/// A listener callback.
pub type Listener = Box<dyn Fn(Node<'_>, &mut RuleContext<'_>) -> Result<(), RuleError>>;

/// Selector-keyed listeners produced by [`Rule::create`], in declaration
/// order.
///
/// A key ending in `:exit` fires when the traversal leaves a matching node.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(String, Listener)>,
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for nodes matching `selector`.
    #[must_use]
    pub fn on<F>(mut self, selector: &str, listener: F) -> Self
    where
        F: Fn(Node<'_>, &mut RuleContext<'_>) -> Result<(), RuleError> + 'static,
    {
        self.entries.push((selector.to_string(), Box::new(listener)));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Listener)> {
        self.entries
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(selector, _)| selector))
            .finish()
    }
}

/// A lint rule.
pub trait Rule: Send + Sync {
    fn meta(&self) -> &'static RuleMeta;

    /// Options accepted by the rule; none by default.
    fn schema(&self) -> OptionsSchema {
        OptionsSchema::None
    }

    /// Build this pass's listeners from validated options.
    fn create(&self, options: &RuleOptions) -> Result<Listeners, RuleError>;

    fn name(&self) -> &'static str {
        self.meta().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_message_lookup() {
        static META: RuleMeta = RuleMeta {
            name: "test-rule",
            kind: RuleKind::Problem,
            description: "test",
            recommended: false,
            fixable: None,
            has_suggestions: false,
            messages: &[("a", "Message A."), ("b", "Message {{ b }}.")],
        };
        assert_eq!(META.message("b"), Some("Message {{ b }}."));
        assert_eq!(META.message("c"), None);
    }

    #[test]
    fn test_no_options_schema_rejects_options() {
        let schema = OptionsSchema::None;
        assert!(schema.validate("r", &RuleOptions::empty()).is_ok());
        let err = schema
            .validate("r", &RuleOptions::new(vec![json!("always")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOptions { ref rule_id, .. } if rule_id == "r"));
    }

    #[test]
    fn test_positional_schema() {
        let schema = OptionsSchema::Positional(vec![json!({"enum": ["always", "never"]})]);
        assert!(schema.validate("r", &RuleOptions::empty()).is_ok());
        assert!(schema
            .validate("r", &RuleOptions::new(vec![json!("never")]))
            .is_ok());
        assert!(schema
            .validate("r", &RuleOptions::new(vec![json!("sometimes")]))
            .is_err());
        assert!(schema
            .validate("r", &RuleOptions::new(vec![json!("never"), json!(1)]))
            .is_err());
    }

    #[test]
    fn test_broken_schema_is_reported() {
        let schema = OptionsSchema::Full(json!({"type": "array", "pattern": "("}));
        let err = schema.validate("r", &RuleOptions::empty()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSchema { .. }));
    }

    #[test]
    fn test_options_accessors() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Extra {
            flag: bool,
        }

        let options = RuleOptions::new(vec![json!("always"), json!({"flag": true})]);
        assert_eq!(options.str(0), Some("always"));
        assert_eq!(options.str(1), None);
        assert_eq!(
            options.deserialize::<Extra>(1).unwrap(),
            Some(Extra { flag: true })
        );
        assert_eq!(options.deserialize::<Extra>(2).unwrap(), None);
        assert!(options.deserialize::<Extra>(0).is_err());
        assert_eq!(options.to_value(), json!(["always", {"flag": true}]));
    }

    #[test]
    fn test_listeners_keep_declaration_order() {
        let listeners = Listeners::new()
            .on("Identifier", |_, _| Ok(()))
            .on("Program:exit", |_, _| Ok(()));
        assert_eq!(listeners.len(), 2);
        assert_eq!(format!("{listeners:?}"), r#"["Identifier", "Program:exit"]"#);
    }
}
