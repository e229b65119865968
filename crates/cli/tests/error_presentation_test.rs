use std::process::Command;

fn run_minfold(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_minfold"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run minfold: {error}"))
}

#[test]
fn missing_desired_schema_file_keeps_typed_io_category_with_cli_context() {
    let output = run_minfold(&["mydb", "--file", "/nonexistent-minfold-schema.sql"]);

    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[io]"),
        "stderr must preserve typed io category, got: {stderr}",
    );
    assert!(
        stderr.contains("while reading desired schema file"),
        "stderr must include CLI context, got: {stderr}",
    );
}
