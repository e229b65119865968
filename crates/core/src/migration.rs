use std::path::Path;

use crate::{Dialect, DiffConfig, DiffEngine, Error, IoFailure, Renderer, Result, SchemaObject};
use crate::ordering::{Phase, group_by_phase};

/// The two scripts a migration run produces: forward (`up`) and its
/// reverse (`down`), rendered independently from two directed diffs so
/// `down` is never just `up`'s statements replayed backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub up_sql: String,
    pub down_sql: String,
}

impl MigrationScript {
    /// Writes both scripts to disk. Each file is written to a sibling temp
    /// path and renamed into place, so a crash or a failing second write
    /// never leaves a half-written `up.sql`/`down.sql` at the target path.
    pub fn write_to(&self, up_path: &Path, down_path: &Path) -> Result<()> {
        write_atomic(up_path, &self.up_sql)?;
        write_atomic(down_path, &self.down_sql)?;
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| format!(".{}.tmp", name.to_string_lossy()))
        .unwrap_or_else(|| ".minfold-migration.tmp".to_string());
    let tmp_path = path.with_file_name(file_name);

    std::fs::write(&tmp_path, contents)
        .map_err(|source| IoFailure::new("write", tmp_path.clone(), source))?;
    std::fs::rename(&tmp_path, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp_path);
        IoFailure::new("rename", path, source)
    })?;
    Ok(())
}

const HEADER: &str = "-- Generated using Minfold, do not edit manually\nSET XACT_ABORT ON;\n";

/// Parses and normalizes both snapshots, diffs them in both directions, and
/// renders each direction into a phase-headered script. Returns
/// [`Error::NoChangesToMigrate`] when the forward diff is empty; callers
/// should treat that as a successful no-op rather than a failure, and must
/// not write any files in that case.
pub fn generate_migration(
    dialect: &dyn Dialect,
    current_sql: &str,
    desired_sql: &str,
    diff_config: &DiffConfig,
) -> Result<MigrationScript> {
    let current = parse_and_normalize(dialect, current_sql)?;
    let desired = parse_and_normalize(dialect, desired_sql)?;

    let up_engine = DiffEngine::new(diff_config);
    let up_outcome = up_engine.diff_with_diagnostics(&current, &desired)?;
    if up_outcome.ops.is_empty() {
        diff_config
            .log_sink
            .log(crate::LogEvent::info("no changes to migrate"));
        return Err(Error::NoChangesToMigrate);
    }

    let down_engine = DiffEngine::new(diff_config);
    let down_outcome = down_engine.diff_with_diagnostics(&desired, &current)?;

    let up_sql = render_phased_script(dialect, up_outcome.ops)?;
    let down_sql = render_phased_script(dialect, down_outcome.ops)?;

    diff_config.log_sink.log(crate::LogEvent::info(&format!(
        "generated migration: {} up bytes, {} down bytes",
        up_sql.len(),
        down_sql.len()
    )));

    Ok(MigrationScript { up_sql, down_sql })
}

fn parse_and_normalize(dialect: &dyn Dialect, sql: &str) -> Result<Vec<SchemaObject>> {
    let mut objects = dialect.parse(sql)?;
    for object in &mut objects {
        dialect.normalize(object);
    }
    Ok(objects)
}

fn render_phased_script(dialect: &dyn Dialect, ops: Vec<crate::DiffOp>) -> Result<String> {
    let renderer = Renderer::new(dialect);
    let phases = group_by_phase(ops);

    let mut script = String::from(HEADER);
    for (number, (phase, phase_ops)) in phases.into_iter().enumerate() {
        let statements = dialect.generate_ddl(&phase_ops)?;
        if statements.is_empty() {
            continue;
        }

        script.push('\n');
        script.push_str(&phase_header(number + 1, phase));
        script.push('\n');
        script.push_str(&renderer.render(&statements));
    }

    Ok(script)
}

fn phase_header(number: usize, phase: Phase) -> String {
    format!("-- ============ Phase {number}: {} ============", phase.title())
}
