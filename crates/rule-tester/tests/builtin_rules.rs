use estlint_linter::{all_rule_names, find_rule};
use estlint_rule_tester::{ErrorMatcher, InvalidCase, RuleTester, TestCases};
use std::sync::Arc;

const FIXTURES: &[(&str, &str)] = &[
    (
        "no-async-promise-executor",
        include_str!("fixtures/no-async-promise-executor.json"),
    ),
    ("no-catch-shadow", include_str!("fixtures/no-catch-shadow.json")),
    ("no-ex-assign", include_str!("fixtures/no-ex-assign.json")),
    ("no-unsafe-finally", include_str!("fixtures/no-unsafe-finally.json")),
    ("object-shorthand", include_str!("fixtures/object-shorthand.json")),
];

fn tester(name: &str) -> RuleTester {
    let rule = find_rule(name).unwrap_or_else(|| panic!("rule {name} is not registered"));
    RuleTester::new(Arc::clone(rule))
}

fn run_fixture(name: &str) {
    let (_, fixture) = FIXTURES
        .iter()
        .find(|(rule, _)| *rule == name)
        .unwrap_or_else(|| panic!("no fixture for {name}"));
    tester(name).run_json(fixture);
}

#[test]
fn no_async_promise_executor() {
    run_fixture("no-async-promise-executor");
}

#[test]
fn no_catch_shadow() {
    run_fixture("no-catch-shadow");
}

#[test]
fn no_ex_assign() {
    run_fixture("no-ex-assign");
}

#[test]
fn no_unsafe_finally() {
    run_fixture("no-unsafe-finally");
}

#[test]
fn object_shorthand() {
    run_fixture("object-shorthand");
}

#[test]
fn every_registered_rule_has_a_fixture() {
    let mut with_fixture: Vec<&str> = FIXTURES.iter().map(|(name, _)| *name).collect();
    let mut registered = all_rule_names();
    with_fixture.sort_unstable();
    registered.sort_unstable();
    assert_eq!(registered, with_fixture);
}

#[test]
fn cases_built_in_code() {
    tester("no-ex-assign").run(&TestCases {
        valid: vec!["try {} catch (e) { x = e; }".into()],
        invalid: vec![InvalidCase::new(
            "try {} catch (e) { e = 1; }",
            vec![ErrorMatcher::message_id("unexpected")
                .node_type("Identifier")
                .at(1, 20)
                .end(1, 21)],
        )],
    });
}

#[test]
fn property_shorthand_converges_over_passes() {
    tester("object-shorthand").run_json(
        r#"{
            "invalid": [{
                "code": "var x = {a: function() { return {b: b}; }}",
                "output": "var x = {a() { return {b}; }}",
                "errors": [
                    { "messageId": "expectedMethodShorthand", "column": 10 },
                    { "messageId": "expectedPropertyShorthand", "column": 34 }
                ],
                "passes": 2
            }]
        }"#,
    );
}
