use crate::{Config, Cursor, Driver, Result, SqlWriter, Value};
use std::{fmt::Display, future::Future};

/// A statement prepared by the transport, parameters are bound positionally.
///
/// Methods return `&mut Self` for fluent chaining:
/// ```rust,ignore
/// prepared.bind(42)?.bind("hello")?;
/// ```
pub trait Prepared: Send + Display {
    /// Append a parameter value.
    fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self>;
    /// Remove all the previously bound values.
    fn clear_bindings(&mut self) -> Result<&mut Self>;
    fn sql(&self) -> &str;
    fn parameters(&self) -> &[Value];
}

/// Live link to the database server.
///
/// This is the only component talking to the network, everything else goes through a
/// transport. A transport handles one logical flow at a time.
pub trait Transport: Send + Sized {
    type Driver: Driver;
    type Prepared: Prepared;

    fn connect(config: &Config) -> impl Future<Output = Result<Self>> + Send;

    fn driver(&self) -> &Self::Driver;

    fn prepare(&mut self, sql: String) -> impl Future<Output = Result<Self::Prepared>> + Send;

    /// Runs a prepared statement with its bound parameters and materializes the result.
    fn execute(&mut self, prepared: Self::Prepared)
    -> impl Future<Output = Result<Cursor>> + Send;

    /// Key generated by the last insert on this transport.
    fn last_insert_id(&self) -> Option<Value>;

    fn in_transaction(&self) -> bool;

    fn begin(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Value as a SQL literal in the transport's dialect.
    fn quote(&self, value: &Value) -> String {
        let mut out = String::new();
        self.driver().sql_writer().write_value(&mut out, value);
        out
    }

    /// Description of the last error reported by the server, if any.
    fn error_info(&self) -> Option<String>;
}
