use crate::error::ConfigError;
use crate::registry;
use crate::rule::{Rule, RuleOptions};
use estlint_types::Severity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

/// Presets accepted by `extends`.
pub const PRESETS: &[&str] = &["recommended"];

/// Configuration for a single lint rule
///
/// Supports multiple formats:
/// ```yaml
/// # Simple severity, as a name or a number
/// no-ex-assign: error
/// no-unsafe-finally: 1
///
/// # ESLint-style array: [severity, ...options]
/// object-shorthand: [warn, always, { avoidQuotes: true }]
///
/// # Object style with options
/// object-shorthand:
///   severity: warn
///   options: [methods]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LintRuleConfig {
    /// Just a severity level (simple case)
    Severity(Severity),

    /// Severity with positional options
    Detailed {
        severity: Severity,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        options: Vec<Value>,
    },
}

impl LintRuleConfig {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Severity(s) | Self::Detailed { severity: s, .. } => *s,
        }
    }

    /// The positional options; empty for the simple form.
    #[must_use]
    pub fn options(&self) -> &[Value] {
        match self {
            Self::Severity(_) => &[],
            Self::Detailed { options, .. } => options,
        }
    }
}

fn severity_from_str<E: serde::de::Error>(value: &str) -> Result<Severity, E> {
    Severity::from_str(value).map_err(E::custom)
}

fn severity_from_number<E: serde::de::Error>(value: u64) -> Result<Severity, E> {
    Severity::from_number(value)
        .ok_or_else(|| E::custom(format!("unknown severity: {value} (expected 0, 1 or 2)")))
}

/// A severity written as a name or as `0`, `1`, `2`.
struct SeverityValue(Severity);

impl<'de> Deserialize<'de> for SeverityValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct SeverityVisitor;

        impl Visitor<'_> for SeverityVisitor {
            type Value = SeverityValue;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a severity ('off', 'warn', 'error' or 0, 1, 2)")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                severity_from_str(value).map(SeverityValue)
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                severity_from_number(value).map(SeverityValue)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                let value = u64::try_from(value)
                    .map_err(|_| E::custom(format!("unknown severity: {value}")))?;
                self.visit_u64(value)
            }
        }

        deserializer.deserialize_any(SeverityVisitor)
    }
}

/// Custom deserializer for `LintRuleConfig` to handle ESLint-style array syntax
impl<'de> Deserialize<'de> for LintRuleConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, SeqAccess, Visitor};

        struct LintRuleConfigVisitor;

        impl<'de> Visitor<'de> for LintRuleConfigVisitor {
            type Value = LintRuleConfig;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str(
                    "a severity ('off', 'warn', 'error' or 0, 1, 2), \
                     an array [severity, ...options], \
                     or an object { severity, options }",
                )
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                severity_from_str(value).map(LintRuleConfig::Severity)
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                severity_from_number(value).map(LintRuleConfig::Severity)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                let value = u64::try_from(value)
                    .map_err(|_| E::custom(format!("unknown severity: {value}")))?;
                self.visit_u64(value)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                // ESLint-style: [severity, ...options]
                let SeverityValue(severity) = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &"array with severity"))?;

                let mut options = Vec::new();
                while let Some(option) = seq.next_element::<Value>()? {
                    options.push(option);
                }

                Ok(LintRuleConfig::Detailed { severity, options })
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                // Object style: { severity, options }
                #[derive(Deserialize)]
                #[serde(deny_unknown_fields)]
                struct DetailedConfig {
                    severity: SeverityValue,
                    #[serde(default)]
                    options: Option<Value>,
                }

                let config =
                    DetailedConfig::deserialize(de::value::MapAccessDeserializer::new(map))?;
                let options = match config.options {
                    None => Vec::new(),
                    Some(Value::Array(options)) => options,
                    Some(option) => vec![option],
                };
                Ok(LintRuleConfig::Detailed {
                    severity: config.severity.0,
                    options,
                })
            }
        }

        deserializer.deserialize_any(LintRuleConfigVisitor)
    }
}

/// Extends configuration - can be a single preset or multiple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtendsConfig {
    /// Single preset: `extends: recommended`
    Single(String),
    /// Multiple presets: `extends: [recommended]`
    Multiple(Vec<String>),
}

impl ExtendsConfig {
    /// Get all presets as a vector (normalizes single to vec)
    #[must_use]
    pub fn presets(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Multiple(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Full lint configuration struct with extends and rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FullLintConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<ExtendsConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, LintRuleConfig>,
}

/// Overall lint configuration
///
/// Supports multiple formats:
///
/// ```yaml
/// # Just the recommended preset
/// recommended
///
/// # Fine-grained rules only (no presets)
/// rules:
///   no-ex-assign: error
///   object-shorthand: [warn, methods]
///
/// # Preset with overrides
/// extends: recommended
/// rules:
///   no-unsafe-finally: "off"
/// ```
///
/// Rules that are not configured, directly or through a preset, are off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LintConfig {
    /// Preset(s): `recommended` or `[recommended]`
    Preset(ExtendsConfig),

    /// Full configuration with optional extends and rules
    Full(FullLintConfig),
}

impl Default for LintConfig {
    fn default() -> Self {
        Self::Full(FullLintConfig {
            extends: None,
            rules: BTreeMap::new(),
        })
    }
}

impl LintConfig {
    /// Read a config from JSON.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| ConfigError::Deserialize(err.to_string()))
    }

    /// Read a config from YAML.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(text).map_err(|err| ConfigError::Deserialize(err.to_string()))
    }

    /// Get recommended configuration
    #[must_use]
    pub fn recommended() -> Self {
        Self::Preset(ExtendsConfig::Single("recommended".to_string()))
    }

    /// Set one rule, keeping presets and other rules.
    #[must_use]
    pub fn with_rule(self, name: &str, rule: LintRuleConfig) -> Self {
        let mut full = match self {
            Self::Preset(presets) => FullLintConfig {
                extends: Some(presets),
                rules: BTreeMap::new(),
            },
            Self::Full(full) => full,
        };
        full.rules.insert(name.to_string(), rule);
        Self::Full(full)
    }

    /// Validate the config against the given rules.
    ///
    /// Presets must exist, every configured rule must be one of `rules`, and
    /// configured options must satisfy the rule's schema.
    pub fn validate(&self, rules: &[Arc<dyn Rule>]) -> Result<(), ConfigError> {
        let (extends, configured) = match self {
            Self::Preset(presets) => (Some(presets), None),
            Self::Full(FullLintConfig { extends, rules }) => (extends.as_ref(), Some(rules)),
        };

        if let Some(extends) = extends {
            for preset in extends.presets() {
                if !PRESETS.contains(&preset) {
                    return Err(ConfigError::UnknownPreset(preset.to_string()));
                }
            }
        }

        for (name, config) in configured.into_iter().flatten() {
            let Some(rule) = rules.iter().find(|rule| rule.name() == name) else {
                return Err(ConfigError::UnknownRule {
                    name: name.clone(),
                    suggestion: closest_rule_name(name, rules),
                });
            };
            rule.schema()
                .validate(name, &RuleOptions::new(config.options().to_vec()))?;
        }
        Ok(())
    }

    /// Severity for a rule, considering presets and overrides. Rules that
    /// are not configured are off.
    #[must_use]
    pub fn severity_of(&self, rule_name: &str) -> Severity {
        match self {
            Self::Preset(presets) => Self::severity_from_presets(presets, rule_name),
            Self::Full(FullLintConfig { extends, rules }) => rules
                .get(rule_name)
                .map(LintRuleConfig::severity)
                .or_else(|| {
                    extends
                        .as_ref()
                        .map(|ext| Self::severity_from_presets(ext, rule_name))
                })
                .unwrap_or(Severity::Off),
        }
    }

    /// Options configured for a rule; empty when none are given.
    #[must_use]
    pub fn options_of(&self, rule_name: &str) -> RuleOptions {
        match self {
            Self::Preset(_) => RuleOptions::empty(),
            Self::Full(FullLintConfig { rules, .. }) => rules
                .get(rule_name)
                .map(|rule| RuleOptions::new(rule.options().to_vec()))
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self, rule_name: &str) -> bool {
        self.severity_of(rule_name).is_enabled()
    }

    /// Get severity from a list of presets (later presets override earlier)
    fn severity_from_presets(presets: &ExtendsConfig, rule_name: &str) -> Severity {
        let mut severity = Severity::Off;
        for preset in presets.presets() {
            if preset == "recommended"
                && registry::find_rule(rule_name).is_some_and(|rule| rule.meta().recommended)
            {
                severity = Severity::Error;
            }
        }
        severity
    }

    /// Merge another config into this one; the override wins per rule.
    #[must_use]
    pub fn merge(&self, override_config: &Self) -> Self {
        match (self, override_config) {
            // If override is a preset, use it directly
            (_, Self::Preset(name)) => Self::Preset(name.clone()),

            // If override is empty Full config, keep base
            (
                base,
                Self::Full(FullLintConfig {
                    extends: None,
                    rules,
                }),
            ) if rules.is_empty() => base.clone(),

            (
                Self::Full(FullLintConfig {
                    extends: base_ext,
                    rules: base_rules,
                }),
                Self::Full(FullLintConfig {
                    extends: override_ext,
                    rules: override_rules,
                }),
            ) => {
                let mut merged_rules = base_rules.clone();
                merged_rules.extend(override_rules.clone());
                Self::Full(FullLintConfig {
                    extends: override_ext.clone().or_else(|| base_ext.clone()),
                    rules: merged_rules,
                })
            }

            // Preset + Full override: convert preset to extends and merge
            (
                Self::Preset(presets),
                Self::Full(FullLintConfig {
                    extends: override_ext,
                    rules: override_rules,
                }),
            ) => Self::Full(FullLintConfig {
                extends: override_ext.clone().or_else(|| Some(presets.clone())),
                rules: override_rules.clone(),
            }),
        }
    }
}

/// Closest known rule name, if any is within a few edits.
fn closest_rule_name(name: &str, rules: &[Arc<dyn Rule>]) -> Option<String> {
    rules
        .iter()
        .map(|rule| (strsim::levenshtein(name, rule.name()), rule.name()))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(text: &str) -> LintConfig {
        LintConfig::from_yaml(text).unwrap()
    }

    #[test]
    fn test_simple_preset() {
        let config = yaml("recommended");
        assert!(matches!(
            config,
            LintConfig::Preset(ExtendsConfig::Single(ref s)) if s == "recommended"
        ));
        assert!(config.is_enabled("no-ex-assign"));
        assert!(config.is_enabled("no-unsafe-finally"));
        assert!(!config.is_enabled("object-shorthand"));
    }

    #[test]
    fn test_preset_list() {
        let config = yaml("[recommended]");
        assert!(matches!(config, LintConfig::Preset(ExtendsConfig::Multiple(_))));
        assert_eq!(config.severity_of("no-async-promise-executor"), Severity::Error);
    }

    #[test]
    fn test_rules_only() {
        let config = yaml(
            r"
rules:
  no-ex-assign: error
  object-shorthand: warn
",
        );
        assert_eq!(config.severity_of("no-ex-assign"), Severity::Error);
        assert_eq!(config.severity_of("object-shorthand"), Severity::Warn);
        assert_eq!(config.severity_of("no-unsafe-finally"), Severity::Off);
    }

    #[test]
    fn test_numeric_severities() {
        let config = yaml(
            r"
rules:
  no-ex-assign: 2
  object-shorthand: [1, never]
  no-catch-shadow: 0
",
        );
        assert_eq!(config.severity_of("no-ex-assign"), Severity::Error);
        assert_eq!(config.severity_of("object-shorthand"), Severity::Warn);
        assert_eq!(config.severity_of("no-catch-shadow"), Severity::Off);
        assert_eq!(config.options_of("object-shorthand").str(0), Some("never"));
    }

    #[test]
    fn test_extends_with_override() {
        let config = yaml(
            r#"
extends: recommended
rules:
  no-unsafe-finally: "off"
  no-ex-assign: warn
"#,
        );
        assert_eq!(config.severity_of("no-unsafe-finally"), Severity::Off);
        assert_eq!(config.severity_of("no-ex-assign"), Severity::Warn);
        assert_eq!(config.severity_of("no-async-promise-executor"), Severity::Error);
    }

    #[test]
    fn test_merge_preset_with_rules() {
        let base = LintConfig::recommended();
        let override_config = yaml(
            r"
rules:
  object-shorthand: error
",
        );
        let merged = base.merge(&override_config);
        assert!(merged.is_enabled("no-ex-assign"));
        assert!(merged.is_enabled("object-shorthand"));
    }

    #[test]
    fn test_merge_full_configs() {
        let base = yaml(
            r"
extends: recommended
rules:
  object-shorthand: [warn, methods]
",
        );
        let override_config = yaml(
            r#"
rules:
  no-ex-assign: "off"
"#,
        );
        let merged = base.merge(&override_config);
        assert!(!merged.is_enabled("no-ex-assign"));
        assert_eq!(merged.options_of("object-shorthand").str(0), Some("methods"));
        assert!(merged.is_enabled("no-unsafe-finally"));
    }

    #[test]
    fn test_eslint_array_style() {
        let config = yaml(
            r"
rules:
  object-shorthand: [warn, always, { avoidQuotes: true }]
",
        );
        assert_eq!(config.severity_of("object-shorthand"), Severity::Warn);
        let options = config.options_of("object-shorthand");
        assert_eq!(options.as_slice(), [json!("always"), json!({ "avoidQuotes": true })]);
    }

    #[test]
    fn test_object_style_with_options() {
        let config = yaml(
            r"
rules:
  object-shorthand:
    severity: error
    options: [properties]
  no-catch-shadow:
    severity: warn
",
        );
        assert_eq!(config.severity_of("object-shorthand"), Severity::Error);
        assert_eq!(config.options_of("object-shorthand").str(0), Some("properties"));
        assert!(config.options_of("no-catch-shadow").is_empty());
    }

    #[test]
    fn test_object_style_single_option_is_wrapped() {
        let config = LintConfig::from_json(
            r#"{"rules": {"object-shorthand": {"severity": "warn", "options": "never"}}}"#,
        )
        .unwrap();
        assert_eq!(config.options_of("object-shorthand").as_slice(), [json!("never")]);
    }

    #[test]
    fn test_json_config() {
        let config = LintConfig::from_json(
            r#"{"extends": ["recommended"], "rules": {"object-shorthand": ["error", "consistent"]}}"#,
        )
        .unwrap();
        assert!(config.is_enabled("no-ex-assign"));
        assert_eq!(config.severity_of("object-shorthand"), Severity::Error);
        assert!(config.validate(registry::all_rules()).is_ok());
    }

    #[test]
    fn test_invalid_severity() {
        let err = LintConfig::from_json(r#"{"rules": {"no-ex-assign": "fatal"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
        let err = LintConfig::from_json(r#"{"rules": {"no-ex-assign": 3}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
    }

    #[test]
    fn test_validate_invalid_preset() {
        let config = LintConfig::Preset(ExtendsConfig::Single("strict".to_string()));
        assert_eq!(
            config.validate(registry::all_rules()),
            Err(ConfigError::UnknownPreset("strict".to_string()))
        );
    }

    #[test]
    fn test_validate_unknown_rule_with_suggestion() {
        let config = yaml(
            r"
rules:
  object-shorthnd: error
",
        );
        assert_eq!(
            config.validate(registry::all_rules()),
            Err(ConfigError::UnknownRule {
                name: "object-shorthnd".to_string(),
                suggestion: Some("object-shorthand".to_string()),
            })
        );

        let config = yaml(
            r"
rules:
  semi: error
",
        );
        assert_eq!(
            config.validate(registry::all_rules()),
            Err(ConfigError::UnknownRule {
                name: "semi".to_string(),
                suggestion: None,
            })
        );
    }

    #[test]
    fn test_validate_options_against_schema() {
        let config = yaml(
            r"
rules:
  object-shorthand: [error, sometimes]
",
        );
        let err = config.validate(registry::all_rules()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOptions { ref rule_id, .. } if rule_id == "object-shorthand"
        ));

        let config = yaml(
            r"
rules:
  no-ex-assign: [error, true]
",
        );
        assert!(matches!(
            config.validate(registry::all_rules()),
            Err(ConfigError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_default_no_rules_enabled() {
        let config = LintConfig::default();
        for name in registry::all_rule_names() {
            assert!(!config.is_enabled(name));
        }
    }

    #[test]
    fn test_with_rule_keeps_preset() {
        let config = LintConfig::recommended()
            .with_rule("object-shorthand", LintRuleConfig::Severity(Severity::Warn));
        assert!(config.is_enabled("no-ex-assign"));
        assert_eq!(config.severity_of("object-shorthand"), Severity::Warn);
    }

    #[test]
    fn test_serialize_roundtrip_shape() {
        let config = yaml(
            r"
extends: recommended
rules:
  no-ex-assign: warn
  object-shorthand: [error, never]
",
        );
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "extends": "recommended",
                "rules": {
                    "no-ex-assign": "warn",
                    "object-shorthand": { "severity": "error", "options": ["never"] }
                }
            })
        );
    }
}
