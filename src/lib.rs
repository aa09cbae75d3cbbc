//! Plank maps plain structs to table rows.
//!
//! A [`Connection`] hands out [`Repository`] objects, saves and removes [`Model`] instances inside
//! an implicit transaction and tells registered [`Listener`]s about every step. Table layouts are
//! discovered once through the driver and kept by a [`SchemaCache`], optionally as JSON files on
//! disk.
//!
//! ```rust,ignore
//! use plank::{Config, Model};
//! use plank_mysql::MySqlConnection;
//!
//! #[derive(Model, Default)]
//! #[plank(table = "users")]
//! struct User {
//!     id: i64,
//!     pub name: String,
//! }
//!
//! let mut connection = MySqlConnection::new(Config::new("mysql").dbname("app"))?;
//! let mut user = User { name: "Ann".into(), ..Default::default() };
//! connection.save(&mut user).await?;
//! connection.flush().await?;
//! ```
pub use plank_core::*;
pub use plank_macros::*;
