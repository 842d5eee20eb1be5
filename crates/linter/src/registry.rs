//! Registry of all built-in rules

use crate::rule::Rule;
use crate::rules::{
    NoAsyncPromiseExecutor, NoCatchShadow, NoExAssign, NoUnsafeFinally, ObjectShorthand,
};
use std::sync::{Arc, LazyLock};

/// Built-in rules in registration order.
/// Rules are created once and reused across all lint runs.
static RULES: LazyLock<Vec<Arc<dyn Rule>>> = LazyLock::new(|| {
    vec![
        Arc::new(NoAsyncPromiseExecutor),
        Arc::new(NoCatchShadow),
        Arc::new(NoExAssign),
        Arc::new(NoUnsafeFinally),
        Arc::new(ObjectShorthand),
    ]
});

#[must_use]
pub fn all_rules() -> &'static [Arc<dyn Rule>] {
    &RULES
}

/// Look a rule up by id.
#[must_use]
pub fn find_rule(name: &str) -> Option<&'static Arc<dyn Rule>> {
    all_rules().iter().find(|rule| rule.name() == name)
}

#[must_use]
pub fn all_rule_names() -> Vec<&'static str> {
    let mut names: Vec<_> = all_rules().iter().map(|rule| rule.name()).collect();
    names.sort_unstable();
    names
}
