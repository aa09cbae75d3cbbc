mod lifecycle;
mod memory;
mod recorder;
mod users;

pub use lifecycle::*;
pub use memory::*;
pub use recorder::*;
pub use users::*;

use log::LevelFilter;
use plank::{Connection, Transport};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every scenario, the connection must reach an empty `users` table (see [`users_table`]).
pub async fn execute_tests<T: Transport>(connection: &mut Connection<T>) {
    users(connection).await;
    lifecycle(connection).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
