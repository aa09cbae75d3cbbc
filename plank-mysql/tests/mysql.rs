#[cfg(test)]
mod tests {
    use indoc::indoc;
    use plank::Config;
    use plank_mysql::MySqlConnection;
    use plank_tests::{execute_tests, init_logs};
    use std::env;
    use tokio::sync::Mutex;

    static MUTEX: Mutex<()> = Mutex::const_new(());

    /// Configuration of the live server, `PLANK_MYSQL_TEST` holds it as JSON:
    /// `{"driver": "mysql", "host": "127.0.0.1", "dbname": "plank", "username": "root", "password": ""}`
    fn config() -> Option<Config> {
        let json = env::var("PLANK_MYSQL_TEST").ok()?;
        Some(Config::from_json(&json).expect("PLANK_MYSQL_TEST is not a valid configuration"))
    }

    #[tokio::test]
    async fn mysql() {
        init_logs();
        let Some(config) = config() else {
            log::warn!("PLANK_MYSQL_TEST is not set, skipping the MySQL test");
            return;
        };
        let _guard = MUTEX.lock().await;
        let mut connection =
            MySqlConnection::new(config.debug(true)).expect("Invalid MySQL configuration");
        connection
            .create_query("DROP TABLE IF EXISTS `users`", Vec::new())
            .await
            .expect("Failed to drop the users table");
        connection
            .create_query(
                indoc! {"
                    CREATE TABLE `users` (
                        `id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                        `name` VARCHAR(64) NOT NULL,
                        `email` VARCHAR(128) NOT NULL
                    )
                "},
                Vec::new(),
            )
            .await
            .expect("Failed to create the users table");
        let table = connection
            .get_table("users")
            .await
            .expect("Failed to describe the users table");
        assert_eq!(table.columns, ["id", "name", "email"]);
        assert_eq!(table.primary_key.as_deref(), Some("id"));
        assert!(table.auto_increment);
        execute_tests(&mut connection).await;
    }
}
