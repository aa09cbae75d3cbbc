use crate::{Executor, Result, SqlWriter, TableDescriptor};
use std::future::Future;

/// Dialect of one database family: how SQL is written and how table schemas are discovered.
pub trait Driver: Default + Clone + Send + Sync + 'static {
    type SqlWriter: SqlWriter;

    /// Name used in configurations and DSNs (`mysql`).
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// Queries the live database for the columns and the primary key of `table`.
    ///
    /// When more than one column is flagged as primary key the first one wins, composite keys are
    /// not supported.
    fn describe_table<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
    ) -> impl Future<Output = Result<TableDescriptor>> + Send;
}
