use minfold_core::{SchemaObject, Table};

mod yaml_runner;

pub use yaml_runner::{
    TestCase, TestResult, load_test_cases_from_str, matches_flavor, run_offline_test,
    run_online_test,
};

/// A single-table schema snapshot, for tests that only care about table
/// presence/absence rather than column shape.
pub fn single_table_fixture(name: &str) -> Vec<SchemaObject> {
    vec![SchemaObject::Table(Table::named(name))]
}
