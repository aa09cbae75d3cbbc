mod accessor;
mod as_value;
mod config;
mod connection;
mod cursor;
mod driver;
mod events;
mod executor;
mod model;
mod predicate;
mod query_builder;
mod repository;
mod schema_cache;
mod sql_writer;
mod statement;
mod table;
mod table_ref;
mod transport;
mod util;
mod value;

pub use ::anyhow::Context;
pub use accessor::*;
pub use as_value::*;
pub use config::*;
pub use connection::*;
pub use cursor::*;
pub use driver::*;
pub use events::*;
pub use executor::*;
pub use model::*;
pub use predicate::*;
pub use query_builder::*;
pub use repository::*;
pub use schema_cache::*;
pub use sql_writer::*;
pub use statement::*;
pub use table::*;
pub use table_ref::*;
pub use transport::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;
pub use ::indexmap;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
