use crate::{Result, Version};

/// Connection-lifecycle contract a dialect's `connect` returns. Schema
/// introspection, statement execution, and transaction scoping all go
/// through this seam so the executor never touches a driver directly.
pub trait DatabaseAdapter {
    fn export_schema(&self) -> Result<String>;
    fn execute(&self, sql: &str) -> Result<()>;
    fn begin(&mut self) -> Result<Transaction<'_>>;
    fn schema_search_path(&self) -> Vec<String>;
    fn server_version(&self) -> Result<Version>;
}

/// RAII transaction handle. Dropping without calling [`commit`](Self::commit)
/// best-effort rolls back.
pub struct Transaction<'a> {
    adapter: &'a mut dyn DatabaseAdapter,
    committed: bool,
}

impl<'a> Transaction<'a> {
    #[must_use]
    pub fn new(adapter: &'a mut dyn DatabaseAdapter) -> Self {
        Self {
            adapter,
            committed: false,
        }
    }

    pub fn execute(&mut self, sql: &str) -> Result<()> {
        self.adapter.execute(sql)
    }

    pub fn commit(mut self) -> Result<()> {
        self.adapter.execute("COMMIT TRANSACTION;")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.adapter.execute("ROLLBACK TRANSACTION;");
        }
    }
}
