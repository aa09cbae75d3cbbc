#[cfg(test)]
mod tests {
    use plank::{Config, Connection, SchemaCache, TableDescriptor};
    use plank_tests::{
        MemoryDatabase, MemoryTransport, User, init_logs, silent_logs, users_table,
    };
    use std::{fs, path::Path, sync::Arc};

    fn connect(
        database: &MemoryDatabase,
        cache: &Path,
        debug: bool,
    ) -> Connection<MemoryTransport> {
        database
            .connect(
                Config::new("mysql")
                    .dbname("schema")
                    .cache(cache)
                    .debug(debug),
            )
            .expect("Could not connect to the memory database")
    }

    #[tokio::test]
    async fn artifacts_spare_the_discovery() {
        init_logs();
        let dir = tempfile::tempdir().expect("Could not create a temporary directory");
        let database = MemoryDatabase::new();
        database.create_table(users_table());

        let mut connection = connect(&database, dir.path(), false);
        let table = connection.get_table("users").await.expect("No users table");
        assert_eq!(table.columns, ["id", "name", "email"]);
        assert_eq!(database.describe_count(), 1);
        let artifact = dir.path().join("orm").join("users");
        assert!(artifact.is_file());

        // Resolved once per process
        connection.get_table("users").await.expect("No users table");
        assert_eq!(database.describe_count(), 1);

        let mut connection = connect(&database, dir.path(), false);
        let table = connection.get_table("users").await.expect("No users table");
        assert_eq!(table.primary_key.as_deref(), Some("id"));
        assert!(table.auto_increment);
        assert_eq!(database.describe_count(), 1);

        let mut connection = connect(&database, dir.path(), true);
        connection.get_table("users").await.expect("No users table");
        assert_eq!(database.describe_count(), 2);
    }

    #[tokio::test]
    async fn stale_artifact_is_trusted_without_debug() {
        init_logs();
        let dir = tempfile::tempdir().expect("Could not create a temporary directory");
        let database = MemoryDatabase::new();
        database.create_table(users_table());
        let artifact = dir.path().join("orm").join("users");
        fs::create_dir_all(artifact.parent().expect("No parent")).expect("Could not create orm");
        let stale = TableDescriptor::new("users")
            .column("id")
            .column("name")
            .primary_key("id", true);
        fs::write(
            &artifact,
            serde_json::to_string(&stale).expect("Could not serialize"),
        )
        .expect("Could not write the artifact");

        let mut connection = connect(&database, dir.path(), false);
        let mut ann = User::new("Ann", "ann@example.com");
        connection.save(&mut ann).await.expect("Failed to insert");
        assert_eq!(database.describe_count(), 0);
        assert!(
            database
                .statements()
                .contains(&"INSERT INTO `users` (`name`) VALUES(?)".to_string())
        );

        // Debug mode rediscovers and rewrites the artifact
        let mut connection = connect(&database, dir.path(), true);
        let table = connection.get_table("users").await.expect("No users table");
        assert_eq!(table.columns, ["id", "name", "email"]);
        let written: TableDescriptor = serde_json::from_str(
            &fs::read_to_string(&artifact).expect("Could not read the artifact"),
        )
        .expect("Invalid artifact");
        assert_eq!(written, *table);
    }

    #[tokio::test]
    async fn artifact_of_another_table() {
        init_logs();
        let dir = tempfile::tempdir().expect("Could not create a temporary directory");
        let database = MemoryDatabase::new();
        database.create_table(users_table());
        let artifact = dir.path().join("orm").join("users");
        fs::create_dir_all(artifact.parent().expect("No parent")).expect("Could not create orm");
        let other = TableDescriptor::new("people").column("id").primary_key("id", true);
        fs::write(
            &artifact,
            serde_json::to_string(&other).expect("Could not serialize"),
        )
        .expect("Could not write the artifact");

        let mut connection = connect(&database, dir.path(), false);
        silent_logs! {
            assert!(connection.get_table("users").await.is_err());
        }
        assert!(connection.schema_cache().is_empty());
        assert_eq!(database.describe_count(), 0);

        // Debug mode replaces it with the discovered table
        let mut connection = connect(&database, dir.path(), true);
        let table = connection.get_table("users").await.expect("No users table");
        assert_eq!(table.name, "users");
        assert_eq!(connection.schema_cache().cached("users"), Some(table));
    }

    #[tokio::test]
    async fn shared_cache() {
        init_logs();
        let database = MemoryDatabase::new();
        database.create_table(users_table());
        let cache = Arc::new(SchemaCache::new(None, true));
        let config = Config::new("mysql").dbname("schema");
        let mut first = database
            .connect(config.clone())
            .expect("Could not connect")
            .with_schema_cache(cache.clone());
        let mut second = database
            .connect(config)
            .expect("Could not connect")
            .with_schema_cache(cache.clone());
        first.table::<User>().await.expect("No users table");
        second.table::<User>().await.expect("No users table");
        assert_eq!(database.describe_count(), 1);
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(first.schema_cache(), second.schema_cache()));
    }

    #[tokio::test]
    async fn invalid_tables() {
        init_logs();
        let dir = tempfile::tempdir().expect("Could not create a temporary directory");
        let database = MemoryDatabase::new();
        let mut connection = connect(&database, dir.path(), false);
        silent_logs! {
            assert!(connection.get_table("../users").await.is_err());
            assert!(connection.get_table("").await.is_err());
            assert!(connection.get_table("missing").await.is_err());
        }
        assert!(!dir.path().join("orm").join("missing").exists());
        assert!(connection.schema_cache().is_empty());
    }
}
