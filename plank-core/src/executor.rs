use crate::{Cursor, Driver, QueryBuilder, Result, RowLabeled, SqlWriter, Value, ValueMap};
use std::future::Future;

/// Runs parameterized SQL and returns the materialized result.
///
/// The provided methods build the statements the object mapper needs on top of [`Executor::run`].
pub trait Executor: Send {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Prepares `sql`, binds `params` in order and executes it.
    fn run(
        &mut self,
        sql: String,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Cursor>> + Send;

    /// Execute the query and returns the rows.
    fn fetch_all(
        &mut self,
        sql: String,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        async move { Ok(self.run(sql, params).await?.fetch_all()) }
    }

    /// `INSERT INTO table (columns) VALUES(?, ...)` binding the values in order.
    fn insert_values(
        &mut self,
        table: &str,
        values: &ValueMap,
    ) -> impl Future<Output = Result<Cursor>> + Send {
        let mut query = QueryBuilder::<()>::new();
        let sql = {
            let writer = self.driver().sql_writer();
            query.insert(writer.quote_identifier(table));
            for column in values.keys() {
                query.set_value(writer.quote_identifier(column), "?");
            }
            query.sql_with(writer.as_dyn())
        };
        let params = values.values().cloned().collect();
        self.run(sql, params)
    }

    /// `UPDATE table SET column = ?, ... WHERE condition`, the values are bound before `params`.
    fn update_values(
        &mut self,
        table: &str,
        values: &ValueMap,
        condition: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Cursor>> + Send {
        let mut query = QueryBuilder::<()>::new();
        let sql = {
            let writer = self.driver().sql_writer();
            query.update(writer.quote_identifier(table), "");
            for column in values.keys() {
                query.set(writer.quote_identifier(column), "?");
            }
            query.where_(condition);
            query.sql_with(writer.as_dyn())
        };
        let params = values.values().cloned().chain(params).collect();
        self.run(sql, params)
    }

    /// `DELETE FROM table WHERE condition`.
    fn delete_where(
        &mut self,
        table: &str,
        condition: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Cursor>> + Send {
        let mut query = QueryBuilder::<()>::new();
        let sql = {
            let writer = self.driver().sql_writer();
            query.delete(writer.quote_identifier(table), "");
            query.where_(condition);
            query.sql_with(writer.as_dyn())
        };
        self.run(sql, params)
    }
}
