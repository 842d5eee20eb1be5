use crate::context::{Report, RuleContext, RuleFixer};
use crate::error::RuleError;
use crate::rule::{FixKind, Listeners, OptionsSchema, Rule, RuleKind, RuleMeta, RuleOptions};
use crate::rules::utils::{is_string_literal, static_property_name};
use crate::source_code::SourceCode;
use estlint_syntax::{Node, NodeId, NodeKind, Token};
use estlint_types::{Fix, OffsetRange};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

static META: RuleMeta = RuleMeta {
    name: "object-shorthand",
    kind: RuleKind::Suggestion,
    description: "Require or disallow method and property shorthand syntax for object literals",
    recommended: false,
    fixable: Some(FixKind::Code),
    has_suggestions: false,
    messages: &[
        (
            "expectedAllPropertiesShorthanded",
            "Expected shorthand for all properties.",
        ),
        (
            "expectedLiteralMethodLongform",
            "Expected longform method syntax for string literal keys.",
        ),
        ("expectedPropertyShorthand", "Expected property shorthand."),
        ("expectedPropertyLongform", "Expected longform property syntax."),
        ("expectedMethodShorthand", "Expected method shorthand."),
        ("expectedMethodLongform", "Expected longform method syntax."),
        (
            "unexpectedMix",
            "Unexpected mix of shorthand and non-shorthand properties.",
        ),
    ],
};

/// Lint rule that enforces (or forbids) `{x}` and `{x() {}}` shorthand in
/// object literals
///
/// # Options
///
/// The first option selects the mode: `"always"` (default), `"methods"`,
/// `"properties"`, `"never"`, `"consistent"` or `"consistent-as-needed"`.
/// The second is an object with `avoidQuotes`, `ignoreConstructors`,
/// `methodsIgnorePattern` and `avoidExplicitReturnArrows`.
pub struct ObjectShorthand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Mode {
    #[default]
    Always,
    Methods,
    Properties,
    Never,
    Consistent,
    ConsistentAsNeeded,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModeOptions {
    avoid_quotes: bool,
    ignore_constructors: bool,
    methods_ignore_pattern: Option<String>,
    avoid_explicit_return_arrows: bool,
}

#[derive(Debug)]
struct Settings {
    mode: Mode,
    avoid_quotes: bool,
    ignore_constructors: bool,
    methods_ignore_pattern: Option<Regex>,
    avoid_explicit_return_arrows: bool,
}

impl Settings {
    fn from_options(options: &RuleOptions) -> Result<Self, RuleError> {
        let mode = options.deserialize::<Mode>(0)?.unwrap_or_default();
        let extra = options.deserialize::<ModeOptions>(1)?.unwrap_or_default();
        let methods_ignore_pattern = extra
            .methods_ignore_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|err| RuleError::InvalidOptions(err.to_string()))?;
        Ok(Self {
            mode,
            avoid_quotes: extra.avoid_quotes,
            ignore_constructors: extra.ignore_constructors,
            methods_ignore_pattern,
            avoid_explicit_return_arrows: extra.avoid_explicit_return_arrows,
        })
    }

    fn applies_to_methods(&self) -> bool {
        matches!(self.mode, Mode::Always | Mode::Methods)
    }

    fn applies_to_properties(&self) -> bool {
        matches!(self.mode, Mode::Always | Mode::Properties)
    }

    fn ignores_method_name(&self, property: Node<'_>) -> bool {
        self.methods_ignore_pattern.as_ref().is_some_and(|pattern| {
            static_property_name(property).is_some_and(|name| pattern.is_match(&name))
        })
    }
}

/// Arrow functions of the current function scope, and the ones found to use
/// `this`, `super`, `arguments` or `new.target`.
///
/// Such arrows cannot become methods without changing behavior.
#[derive(Debug, Default)]
struct ArrowScopes {
    stack: Vec<Vec<NodeId>>,
    lexical: HashSet<NodeId>,
}

impl ArrowScopes {
    fn enter_function(&mut self) {
        self.stack.push(Vec::new());
    }

    fn exit_function(&mut self) {
        self.stack.pop();
    }

    fn enter_arrow(&mut self, arrow: NodeId) {
        if let Some(arrows) = self.stack.last_mut() {
            arrows.push(arrow);
        }
    }

    fn exit_arrow(&mut self, arrow: NodeId) {
        if let Some(arrows) = self.stack.last_mut() {
            arrows.retain(|id| *id != arrow);
        }
    }

    fn mark_lexical(&mut self) {
        if let Some(arrows) = self.stack.last() {
            self.lexical.extend(arrows.iter().copied());
        }
    }

    fn is_lexical(&self, arrow: NodeId) -> bool {
        self.lexical.contains(&arrow)
    }
}

/// Whether `name` looks like a constructor: its first character after any
/// leading `_`, `$` or digits is uppercase.
fn is_constructor(name: &str) -> bool {
    name.chars()
        .find(|c| !matches!(c, '_' | '$' | '0'..='9'))
        .is_some_and(|c| c.to_uppercase().eq(std::iter::once(c)))
}

/// Whether an `arguments` identifier reads the binding rather than naming a
/// property or label.
fn is_reference(identifier: Node<'_>) -> bool {
    let Some(parent) = identifier.parent() else {
        return true;
    };
    let field = identifier.field_name_in_parent();
    match parent.kind() {
        NodeKind::MemberExpression => field != Some("property") || parent.flag("computed"),
        NodeKind::Property | NodeKind::MethodDefinition => {
            field != Some("key") || parent.flag("computed")
        }
        NodeKind::MetaProperty
        | NodeKind::LabeledStatement
        | NodeKind::BreakStatement
        | NodeKind::ContinueStatement => false,
        _ => true,
    }
}

fn is_function_value(value: Node<'_>) -> bool {
    matches!(
        value.kind(),
        NodeKind::FunctionExpression | NodeKind::ArrowFunctionExpression
    )
}

/// First and last token of a property key, brackets included when the key
/// is computed.
fn key_tokens<'s>(source: &SourceCode<'s>, property: Node<'_>) -> Option<(&'s Token, &'s Token)> {
    let key = property.child("key")?;
    if property.flag("computed") {
        let value = property.child("value")?;
        let open = source.token_before_by(key, |token| token.is_punctuator("["))?;
        let close = source.first_token_between_by(key, value, |token| token.is_punctuator("]"))?;
        Some((open, close))
    } else {
        Some((source.first_token(key)?, source.last_token(key)?))
    }
}

/// Source of the parameters and body of a function value, as they appear
/// after the key of a method.
fn method_tail(source: &SourceCode<'_>, value: Node<'_>) -> Option<String> {
    if value.is(NodeKind::FunctionExpression) {
        let function = source.first_token_by(value, |token| token.is_keyword("function"))?;
        let before_params = if value.flag("generator") {
            source.token_after(function)?
        } else {
            function
        };
        return Some(
            source
                .text_of(OffsetRange::new(before_params.range.end, value.range().end))
                .to_string(),
        );
    }

    let body = value.child("body")?;
    let arrow = source.token_before_by(body, |token| token.is_punctuator("=>"))?;
    let body_text = source.text_of(OffsetRange::new(arrow.range.end, value.range().end));
    let params = value.children("params");
    let before_params = match params.first() {
        Some(first) => source.token_before(*first)?,
        None => source.first_token_by(value, |token| token.is_punctuator("("))?,
    };
    let wrap = params.len() == 1
        && !(before_params.is_punctuator("(") && before_params.range.start >= value.range().start);
    let start = if wrap {
        params[0].range().start
    } else {
        before_params.range.start
    };
    let last_param = source.token_before(arrow)?;
    let params_text = source.text_of(OffsetRange::new(start, last_param.range.end));
    Some(if wrap {
        format!("({params_text}){body_text}")
    } else {
        format!("{params_text}{body_text}")
    })
}

/// `key: function() {}` to `key() {}`.
fn function_shorthand(fixer: &RuleFixer, source: &SourceCode<'_>, property: Node<'_>) -> Vec<Fix> {
    let Some(value) = property.child("value") else {
        return Vec::new();
    };
    let Some((first, last)) = key_tokens(source, property) else {
        return Vec::new();
    };
    if source.comments_exist_between(last, value) {
        return Vec::new();
    }
    let Some(tail) = method_tail(source, value) else {
        return Vec::new();
    };

    let key_text = source.text_of(OffsetRange::new(first.range.start, last.range.end));
    let mut prefix = String::new();
    if value.flag("async") {
        prefix.push_str("async ");
    }
    if value.flag("generator") {
        prefix.push('*');
    }
    vec![fixer.replace_text_range(
        OffsetRange::new(first.range.start, property.range().end),
        format!("{prefix}{key_text}{tail}"),
    )]
}

/// `key() {}` to `key: function() {}`.
fn function_longform(fixer: &RuleFixer, source: &SourceCode<'_>, property: Node<'_>) -> Vec<Fix> {
    let (Some(value), Some((first, last))) = (property.child("value"), key_tokens(source, property))
    else {
        return Vec::new();
    };

    let key_text = source.text_of(OffsetRange::new(first.range.start, last.range.end));
    let mut header = String::new();
    if value.flag("async") {
        header.push_str("async ");
    }
    header.push_str("function");
    if value.flag("generator") {
        header.push('*');
    }
    vec![fixer.replace_text_range(
        OffsetRange::new(property.range().start, last.range.end),
        format!("{key_text}: {header}"),
    )]
}

fn is_redundant(property: Node<'_>) -> bool {
    let Some(value) = property.child("value") else {
        return false;
    };
    match value.kind() {
        NodeKind::FunctionExpression => value.child("id").is_none(),
        NodeKind::Identifier => static_property_name(property).as_deref() == value.name(),
        _ => false,
    }
}

fn check_consistency(
    object: Node<'_>,
    ctx: &mut RuleContext<'_>,
    settings: &Settings,
) -> Result<(), RuleError> {
    let check_redundancy = match settings.mode {
        Mode::Consistent => false,
        Mode::ConsistentAsNeeded => true,
        _ => return Ok(()),
    };

    let properties: Vec<Node<'_>> = object
        .children("properties")
        .into_iter()
        .filter(|property| {
            property.is(NodeKind::Property) && !matches!(property.str("kind"), Some("get" | "set"))
        })
        .collect();
    let concise = properties
        .iter()
        .filter(|property| property.flag("shorthand") || property.flag("method"))
        .count();
    if properties.is_empty() || concise == properties.len() {
        return Ok(());
    }

    if concise > 0 {
        ctx.report(Report::node("unexpectedMix", object))
    } else if check_redundancy && properties.iter().all(|property| is_redundant(*property)) {
        ctx.report(Report::node("expectedAllPropertiesShorthanded", object))
    } else {
        Ok(())
    }
}

fn check_property(
    property: Node<'_>,
    ctx: &mut RuleContext<'_>,
    settings: &Settings,
    scopes: &RefCell<ArrowScopes>,
) -> Result<(), RuleError> {
    if property.parent().is_some_and(|parent| parent.is(NodeKind::ObjectPattern))
        || matches!(property.str("kind"), Some("get" | "set"))
    {
        return Ok(());
    }
    let (Some(key), Some(value)) = (property.child("key"), property.child("value")) else {
        return Ok(());
    };
    if property.flag("computed") && !is_function_value(value) {
        return Ok(());
    }
    let source = ctx.source();

    if property.flag("method") || property.flag("shorthand") {
        if property.flag("method")
            && (settings.mode == Mode::Never || (settings.avoid_quotes && is_string_literal(key)))
        {
            let message_id = if settings.mode == Mode::Never {
                "expectedMethodLongform"
            } else {
                "expectedLiteralMethodLongform"
            };
            ctx.report(
                Report::node(message_id, property)
                    .fix(move |fixer| function_longform(fixer, source, property)),
            )?;
        } else if settings.mode == Mode::Never {
            ctx.report(Report::node("expectedPropertyLongform", property).fix(move |fixer| {
                vec![fixer.insert_text_after(key, format!(": {}", source.text_of(key)))]
            }))?;
        }
        return Ok(());
    }

    if settings.applies_to_methods() && value.child("id").is_none() && is_function_value(value) {
        if settings.ignore_constructors
            && key.is(NodeKind::Identifier)
            && key.name().is_some_and(is_constructor)
        {
            return Ok(());
        }
        if settings.ignores_method_name(property)
            || (settings.avoid_quotes && is_string_literal(key))
        {
            return Ok(());
        }

        let convertible = value.is(NodeKind::FunctionExpression)
            || (settings.avoid_explicit_return_arrows
                && value
                    .child("body")
                    .is_some_and(|body| body.is(NodeKind::BlockStatement))
                && !scopes.borrow().is_lexical(value.id()));
        if convertible {
            ctx.report(
                Report::node("expectedMethodShorthand", property)
                    .fix(move |fixer| function_shorthand(fixer, source, property)),
            )?;
        }
        return Ok(());
    }

    if !settings.applies_to_properties() || !value.is(NodeKind::Identifier) {
        return Ok(());
    }
    let Some(name) = value.name() else {
        return Ok(());
    };
    let same_identifier = key.is(NodeKind::Identifier) && key.name() == Some(name);
    let same_literal = key.is(NodeKind::Literal) && key.str("value") == Some(name);
    if same_identifier || (same_literal && !settings.avoid_quotes) {
        ctx.report(
            Report::node("expectedPropertyShorthand", property).fix(move |fixer| {
                if source.comments_inside(property).is_empty() {
                    vec![fixer.replace_text(property, name)]
                } else {
                    Vec::new()
                }
            }),
        )?;
    }
    Ok(())
}

impl Rule for ObjectShorthand {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn schema(&self) -> OptionsSchema {
        let boolean = json!({ "type": "boolean" });
        OptionsSchema::Full(json!({
            "anyOf": [
                {
                    "type": "array",
                    "items": [{
                        "enum": ["always", "methods", "properties", "never", "consistent", "consistent-as-needed"]
                    }],
                    "minItems": 0,
                    "maxItems": 1
                },
                {
                    "type": "array",
                    "items": [
                        { "enum": ["always", "methods", "properties"] },
                        {
                            "type": "object",
                            "properties": { "avoidQuotes": boolean },
                            "additionalProperties": false
                        }
                    ],
                    "minItems": 0,
                    "maxItems": 2
                },
                {
                    "type": "array",
                    "items": [
                        { "enum": ["always", "methods"] },
                        {
                            "type": "object",
                            "properties": {
                                "ignoreConstructors": boolean,
                                "methodsIgnorePattern": { "type": "string" },
                                "avoidQuotes": boolean,
                                "avoidExplicitReturnArrows": boolean
                            },
                            "additionalProperties": false
                        }
                    ],
                    "minItems": 0,
                    "maxItems": 2
                }
            ]
        }))
    }

    fn create(&self, options: &RuleOptions) -> Result<Listeners, RuleError> {
        let settings = Rc::new(Settings::from_options(options)?);
        let scopes = Rc::new(RefCell::new(ArrowScopes::default()));

        let mut listeners = Listeners::new();
        for function in ["Program", "FunctionDeclaration", "FunctionExpression"] {
            let enter = Rc::clone(&scopes);
            let exit = Rc::clone(&scopes);
            listeners = listeners
                .on(function, move |_, _| {
                    enter.borrow_mut().enter_function();
                    Ok(())
                })
                .on(&format!("{function}:exit"), move |_, _| {
                    exit.borrow_mut().exit_function();
                    Ok(())
                });
        }

        let enter = Rc::clone(&scopes);
        let exit = Rc::clone(&scopes);
        listeners = listeners
            .on("ArrowFunctionExpression", move |node, _| {
                enter.borrow_mut().enter_arrow(node.id());
                Ok(())
            })
            .on("ArrowFunctionExpression:exit", move |node, _| {
                exit.borrow_mut().exit_arrow(node.id());
                Ok(())
            });

        for lexical in [
            "ThisExpression",
            "Super",
            "MetaProperty[meta.name='new'][property.name='target']",
        ] {
            let scopes = Rc::clone(&scopes);
            listeners = listeners.on(lexical, move |_, _| {
                scopes.borrow_mut().mark_lexical();
                Ok(())
            });
        }
        let arguments = Rc::clone(&scopes);
        listeners = listeners.on("Identifier[name='arguments']", move |node, _| {
            if is_reference(node) {
                arguments.borrow_mut().mark_lexical();
            }
            Ok(())
        });

        let object_settings = Rc::clone(&settings);
        Ok(listeners
            .on("ObjectExpression", move |node, ctx| {
                check_consistency(node, ctx, &object_settings)
            })
            .on("Property:exit", move |node, ctx| {
                check_property(node, ctx, &settings, &scopes)
            }))
    }
}
