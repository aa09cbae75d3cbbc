#[cfg(test)]
mod tests {
    use plank::{Config, Connection, Value};
    use plank_tests::{
        MemoryDatabase, MemoryTransport, User, execute_tests, init_logs, silent_logs, users_table,
    };

    fn connect(database: &MemoryDatabase) -> Connection<MemoryTransport> {
        database.create_table(users_table());
        database
            .connect(Config::new("mysql").dbname("crud"))
            .expect("Could not connect to the memory database")
    }

    #[tokio::test]
    async fn scenarios() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        execute_tests(&mut connection).await;
        assert_eq!(database.rows("users").len(), 1);
    }

    #[tokio::test]
    async fn insert_leaves_the_key_to_the_database() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        let mut ann = User::new("Ann", "ann@example.com");
        connection.save(&mut ann).await.expect("Failed to insert");
        assert_eq!(ann.id(), 1);
        let log = database.log();
        let (sql, params) = log
            .iter()
            .find(|(sql, _)| sql.starts_with("INSERT"))
            .expect("No insert was issued");
        assert_eq!(sql, "INSERT INTO `users` (`name`, `email`) VALUES(?, ?)");
        assert_eq!(
            params,
            &[
                Value::Varchar("Ann".into()),
                Value::Varchar("ann@example.com".into())
            ]
        );
        assert_eq!(
            database.statements()[..2],
            ["START TRANSACTION", "DESCRIBE `users`"]
        );
        assert_eq!(connection.last_insert_id(), Some(Value::UInt64(1)));
    }

    #[tokio::test]
    async fn update_writes_only_changed_columns() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        let mut ann = User::new("Ann", "ann@example.com");
        connection.save(&mut ann).await.expect("Failed to insert");
        connection.flush().await.expect("Failed to flush");
        database.clear_log();

        ann.email = "ann@example.org".into();
        connection.save(&mut ann).await.expect("Failed to update");
        let log = database.log();
        let (sql, params) = log
            .iter()
            .find(|(sql, _)| sql.starts_with("UPDATE"))
            .expect("No update was issued");
        assert_eq!(sql, "UPDATE `users` SET `email` = ? WHERE `id` = ?");
        assert_eq!(
            params,
            &[Value::Varchar("ann@example.org".into()), Value::Int64(1)]
        );
        assert_eq!(
            database.statements().first().map(String::as_str),
            Some("START TRANSACTION")
        );
    }

    #[tokio::test]
    async fn row_changed_behind_the_mapper() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        database
            .insert_row(
                "users",
                [
                    ("id", Value::Int64(7)),
                    ("name", Value::Varchar("Eve".into())),
                    ("email", Value::Varchar("eve@example.com".into())),
                ],
            )
            .expect("Failed to store the row");
        let mut eve = connection
            .find::<User>(7)
            .await
            .expect("Failed to query")
            .expect("Eve was not found");
        assert_eq!(eve.name, "Eve");
        eve.name = "Eva".into();
        connection.save(&mut eve).await.expect("Failed to update");
        connection.flush().await.expect("Failed to flush");
        assert_eq!(
            database.rows("users")[0]["name"],
            Value::Varchar("Eva".into())
        );
    }

    #[tokio::test]
    async fn rollback_discards_pending_changes() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        let mut ann = User::new("Ann", "ann@example.com");
        connection.save(&mut ann).await.expect("Failed to insert");
        assert!(connection.in_transaction());
        connection.rollback().await.expect("Failed to roll back");
        assert!(!connection.in_transaction());
        assert!(database.rows("users").is_empty());
        // Nothing left to commit
        connection.flush().await.expect("Flush without a transaction");
        assert_eq!(
            database.statements().last().map(String::as_str),
            Some("ROLLBACK")
        );
    }

    #[tokio::test]
    async fn failing_statement() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        database.fail_on("INSERT");
        silent_logs! {
            let mut ann = User::new("Ann", "ann@example.com");
            let error = connection
                .save(&mut ann)
                .await
                .expect_err("The insert was expected to fail");
            let message = format!("{:#}", error);
            assert!(message.contains("While saving"), "{}", message);
            assert!(message.contains("Injected failure"), "{}", message);
        }
        assert!(
            connection
                .error_info()
                .is_some_and(|e| e.contains("Injected failure"))
        );
        connection.rollback().await.expect("Failed to roll back");
        assert!(database.rows("users").is_empty());

        database.fail_on("nowhere");
        let query = format!("SELECT {}é FROM nowhere", "x".repeat(489));
        silent_logs! {
            let error = connection
                .create_query(query, Vec::new())
                .await
                .expect_err("The query was expected to fail");
            let message = format!("{:#}", error);
            assert!(message.contains("While running the query"), "{}", message);
            assert!(message.contains("Injected failure"), "{}", message);
        }
    }

    #[tokio::test]
    async fn remove_requires_a_key() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        silent_logs! {
            let mut unsaved = User::new("Ann", "ann@example.com");
            assert!(connection.remove(&mut unsaved).await.is_err());
        }
        assert!(
            !database
                .statements()
                .iter()
                .any(|sql| sql.starts_with("DELETE"))
        );
    }

    #[tokio::test]
    async fn raw_queries() {
        init_logs();
        let database = MemoryDatabase::new();
        let mut connection = connect(&database);
        connection
            .create_query(
                "INSERT INTO `users` (`name`, `email`) VALUES(?, ?)",
                [Value::from("Ann"), Value::from("ann@example.com")],
            )
            .await
            .expect("Failed to insert");
        let mut cursor = connection
            .create_query(
                "SELECT * FROM `users` WHERE `name` = ?",
                [Value::from("Ann")],
            )
            .await
            .expect("Failed to select");
        let row = cursor.fetch().expect("No row returned");
        assert_eq!(
            row.get_column("email"),
            Some(&Value::Varchar("ann@example.com".into()))
        );
        assert_eq!(
            connection.quote(&Value::Varchar("it's".into())),
            "'it''s'"
        );
    }
}
