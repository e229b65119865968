use std::{io, path::PathBuf};

use anyhow::Context;
use miette::Report;

const ORCHESTRATOR_CONTEXT: &str = "while running orchestrator";
const FILE_READ_CONTEXT: &str = "while reading desired schema file";
const STDIN_READ_CONTEXT: &str = "while reading desired schema from stdin";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    MissingDesiredSchemaInput,
    ConflictingModes,
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },
    ReadStdin(io::Error),
    Core(minfold_core::Error),
}

impl From<minfold_core::Error> for CliError {
    fn from(value: minfold_core::Error) -> Self {
        Self::Core(value)
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::MissingDesiredSchemaInput => {
            format!("[usage] {}", missing_desired_schema_message())
        }
        CliError::ConflictingModes => {
            "[usage] --apply and --export cannot be used together".to_string()
        }
        CliError::ReadFile { path, source } => {
            let context = format!("{FILE_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
        CliError::ReadStdin(source) => {
            let report = report_with_context(source, STDIN_READ_CONTEXT);
            format!("[io] {report}")
        }
        CliError::Core(source) => {
            let category = core_category(&source);
            let report = report_with_context(source, ORCHESTRATOR_CONTEXT);
            format!("[{category}] {report}")
        }
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let context = context.into();
    let anyhow_error = std::result::Result::<(), E>::Err(source)
        .context(context)
        .expect_err("context wrapping must produce an error");
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &minfold_core::Error) -> &'static str {
    match error {
        minfold_core::Error::Parse(_) => "parse",
        minfold_core::Error::Diff(_) => "diff",
        minfold_core::Error::Generate(_) => "generate",
        minfold_core::Error::Execute(_) => "execute",
        minfold_core::Error::Loader(_) => "load",
        minfold_core::Error::Io(_) => "io",
        minfold_core::Error::NoChangesToMigrate => "up-to-date",
    }
}

fn missing_desired_schema_message() -> &'static str {
    "missing desired schema SQL: pass --file <PATH> or pipe SQL via stdin"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_category_covers_every_error_variant() {
        assert_eq!(
            core_category(&minfold_core::Error::NoChangesToMigrate),
            "up-to-date"
        );
    }

    #[test]
    fn missing_desired_schema_renders_as_usage_category() {
        let rendered = render_runtime_error(CliError::MissingDesiredSchemaInput);
        assert!(rendered.starts_with("[usage]"));
    }
}
