use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use minfold_core::{
    DatabaseAdapter, DiffConfig, DiffEngine, Dialect, EquivalencePolicy, Expr, ParseError, Renderer,
    Result, SchemaObject, SourceLocation, build_ddl_plan,
};

const TESTCASE_SOURCE_LABEL: &str = "yaml testcase";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCase {
    pub current: String,
    pub desired: String,
    pub up: Option<String>,
    pub down: Option<String>,
    pub error: Option<String>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub flavor: Option<String>,
    /// `None` resolves to `false` at execution time.
    pub enable_drop: Option<bool>,
    pub offline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_test_cases_from_str(yaml: &str) -> Result<BTreeMap<String, TestCase>> {
    serde_yaml::from_str(yaml).map_err(|source| parse_yaml_error(yaml, source))
}

pub fn matches_flavor(requirement: Option<&str>, current_flavor: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    if let Some(excluded_flavor) = requirement.strip_prefix('!') {
        return excluded_flavor != current_flavor;
    }

    requirement == current_flavor
}

pub fn run_offline_test(dialect: &dyn Dialect, test: &TestCase) -> TestResult {
    run_with_flavor_expectation(test, dialect.name(), || {
        run_offline_test_impl(dialect, test)
    })
}

pub fn run_online_test(
    dialect: &dyn Dialect,
    adapter: &mut dyn DatabaseAdapter,
    test: &TestCase,
) -> TestResult {
    run_with_flavor_expectation(test, dialect.name(), || {
        run_online_test_impl(dialect, adapter, test)
    })
}

fn run_with_flavor_expectation(
    test: &TestCase,
    current_flavor: &str,
    execute: impl FnOnce() -> Result<()>,
) -> TestResult {
    let flavor_requirement = test.flavor.as_deref();
    let expect_failure = !matches_flavor(flavor_requirement, current_flavor);
    let execution_result = execute();

    if expect_failure {
        return match execution_result {
            Err(_) => TestResult::Skipped(format!(
                "Correctly fails on non-matching flavor (requires '{}', running on '{}')",
                flavor_requirement.unwrap_or_default(),
                current_flavor
            )),
            Ok(()) => TestResult::Failed(format!(
                "Test passed but flavor '{}' does not match current flavor '{}'",
                flavor_requirement.unwrap_or_default(),
                current_flavor
            )),
        };
    }

    match (&test.error, execution_result) {
        (None, Ok(())) => TestResult::Passed,
        (None, Err(error)) => TestResult::Failed(error.to_string()),
        (Some(expected), Err(error)) if error.to_string() == *expected => TestResult::Passed,
        (Some(expected), Err(error)) => TestResult::Failed(format!(
            "expected error `{expected}`, got `{error}`"
        )),
        (Some(expected), Ok(())) => TestResult::Failed(format!(
            "expected error `{expected}` but execution succeeded"
        )),
    }
}

fn run_offline_test_impl(dialect: &dyn Dialect, test: &TestCase) -> Result<()> {
    let enable_drop = test.enable_drop.unwrap_or(false);

    let current = parse_and_normalize(dialect, &test.current)?;
    let desired = parse_and_normalize(dialect, &test.desired)?;

    let up_sql = render_migration(dialect, &current, &desired, enable_drop)?;
    assert_matches("up", test.up.as_deref(), &up_sql)?;

    let down_sql = render_migration(dialect, &desired, &current, enable_drop)?;
    assert_matches("down", test.down.as_deref(), &down_sql)?;

    Ok(())
}

fn run_online_test_impl(
    dialect: &dyn Dialect,
    adapter: &mut dyn DatabaseAdapter,
    test: &TestCase,
) -> Result<()> {
    let _ = adapter.server_version()?;
    run_offline_test_impl(dialect, test)
}

fn parse_and_normalize(dialect: &dyn Dialect, sql: &str) -> Result<Vec<SchemaObject>> {
    let mut objects = dialect.parse(sql)?;
    for object in &mut objects {
        dialect.normalize(object);
    }
    Ok(objects)
}

/// Runs one direction of the diff → plan → generate → render pipeline, the
/// same shape `Orchestrator::run` uses for a real dry run, but against
/// bare `SchemaObject` snapshots rather than a live connection.
fn render_migration(
    dialect: &dyn Dialect,
    current: &[SchemaObject],
    desired: &[SchemaObject],
    enable_drop: bool,
) -> Result<String> {
    let diff_config = DiffConfig::new(
        enable_drop,
        Vec::new(),
        Arc::new(DelegatingEquivalencePolicy {
            inner: dialect.equivalence_policy(),
        }),
    );
    let diff_engine = DiffEngine::new(&diff_config);
    let diff_outcome = diff_engine.diff_with_diagnostics(current, desired)?;
    let ordered_ops = build_ddl_plan(diff_outcome.ops).into_ops();
    let statements = dialect.generate_ddl(&ordered_ops)?;

    let renderer = Renderer::new(dialect);
    Ok(renderer.render(&statements))
}

fn assert_matches(direction: &str, expected: Option<&str>, actual: &str) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    if expected.trim() == actual.trim() {
        return Ok(());
    }

    Err(minfold_core::DiffError::ObjectComparison {
        target: direction.to_string(),
        operation: format!("expected:\n{}\n\ngot:\n{}", expected.trim(), actual.trim()),
    }
    .into())
}

struct DelegatingEquivalencePolicy {
    inner: &'static dyn EquivalencePolicy,
}

impl EquivalencePolicy for DelegatingEquivalencePolicy {
    fn is_equivalent_expr(&self, left: &Expr, right: &Expr) -> bool {
        self.inner.is_equivalent_expr(left, right)
    }

    fn is_equivalent_custom_type(&self, left: &str, right: &str) -> bool {
        self.inner.is_equivalent_custom_type(left, right)
    }
}

fn parse_yaml_error(yaml: &str, source: serde_yaml::Error) -> minfold_core::Error {
    let source_location = source.location().map(|location| SourceLocation {
        line: location.line(),
        column: Some(location.column()),
    });

    ParseError::StatementConversion {
        statement_index: 0,
        source_sql: source_sql_excerpt(yaml),
        source_location,
        source: Box::new(source),
    }
    .into()
}

fn source_sql_excerpt(yaml: &str) -> String {
    let trimmed = yaml.trim();
    if trimmed.is_empty() {
        return TESTCASE_SOURCE_LABEL.to_string();
    }

    const MAX_CHARS: usize = 256;
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }

    let mut excerpt: String = trimmed.chars().take(MAX_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}
