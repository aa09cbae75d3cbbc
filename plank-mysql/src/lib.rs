mod driver;
mod prepared;
mod sql_writer;
mod transport;
mod value_wrap;

pub use driver::*;
pub use prepared::*;
pub use sql_writer::*;
pub use transport::*;
pub(crate) use value_wrap::*;

/// Connection talking to a MySQL server.
pub type MySqlConnection = plank_core::Connection<MySqlTransport>;
