use crate::{Config, Driver, Error, Executor, Result, TableDescriptor};
use anyhow::Context;
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tempfile::NamedTempFile;

/// Table descriptors known to a connection, discovered on first use.
///
/// When a directory is configured every descriptor is also stored as a JSON artifact under
/// `<directory>/orm/<table>`. With `debug` disabled an existing artifact is trusted and the
/// database is not queried, with `debug` enabled the table is discovered again on the first use
/// in the process and the artifact rewritten.
///
/// Without a directory the descriptors live in memory only and `debug` is always on.
#[derive(Debug)]
pub struct SchemaCache {
    directory: Option<PathBuf>,
    debug: bool,
    tables: RwLock<HashMap<String, Arc<TableDescriptor>>>,
}

impl SchemaCache {
    pub fn new(directory: Option<PathBuf>, debug: bool) -> Self {
        Self {
            debug: debug || directory.is_none(),
            directory,
            tables: Default::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache.clone(), config.debug)
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Where the artifact of `table` is stored, if persistence is enabled.
    pub fn artifact_path(&self, table: &str) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join("orm").join(table))
    }

    /// Descriptor already resolved in this process.
    pub fn cached(&self, table: &str) -> Option<Arc<TableDescriptor>> {
        self.tables.read().get(table).cloned()
    }

    /// Registers a descriptor without querying the database.
    pub fn insert(&self, descriptor: TableDescriptor) -> Arc<TableDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.tables
            .write()
            .insert(descriptor.name.clone(), descriptor.clone());
        descriptor
    }

    /// Forgets the resolved descriptors, the artifacts on disk are kept.
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Descriptor of `table`, discovered through `executor` when needed.
    pub async fn get_table<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
    ) -> Result<Arc<TableDescriptor>> {
        if let Some(descriptor) = self.cached(table) {
            return Ok(descriptor);
        }
        check_table_name(table)?;
        let descriptor = match self.artifact_path(table) {
            None => discover(executor, table).await?,
            Some(path) => {
                let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
                if !exists || self.debug {
                    let descriptor = discover(executor, table).await?;
                    let target = path.clone();
                    tokio::task::spawn_blocking(move || write_artifact(&target, &descriptor))
                        .await??;
                }
                let descriptor =
                    tokio::task::spawn_blocking(move || read_artifact(&path)).await??;
                if descriptor.name != table {
                    let error = Error::msg(format!(
                        "The schema artifact of `{}` describes the table `{}`",
                        table, descriptor.name
                    ));
                    log::error!("{:#}", error);
                    return Err(error);
                }
                descriptor
            }
        };
        Ok(self.insert(descriptor))
    }
}

fn check_table_name(table: &str) -> Result<()> {
    if table.is_empty()
        || table.contains(['/', '\\', '\0'])
        || table.contains("..")
    {
        let error = Error::msg(format!("`{}` is not a valid table name", table));
        log::error!("{:#}", error);
        return Err(error);
    }
    Ok(())
}

async fn discover<E: Executor>(executor: &mut E, table: &str) -> Result<TableDescriptor> {
    log::info!("Discovering the schema of table `{}`", table);
    let driver = executor.driver().clone();
    let descriptor = driver
        .describe_table(executor, table)
        .await
        .with_context(|| format!("While discovering the schema of table `{}`", table))?;
    descriptor.validate()?;
    Ok(descriptor)
}

fn write_artifact(path: &Path, descriptor: &TableDescriptor) -> Result<()> {
    let directory = path
        .parent()
        .ok_or_else(|| Error::msg(format!("Invalid schema artifact path {}", path.display())))?;
    fs::create_dir_all(directory).with_context(|| {
        format!(
            "Could not create the schema cache directory {}",
            directory.display()
        )
    })?;
    let mut temp = NamedTempFile::new_in(directory).with_context(|| {
        format!(
            "Could not create a temporary file in {}",
            directory.display()
        )
    })?;
    serde_json::to_writer_pretty(&mut temp, descriptor)
        .with_context(|| format!("Could not write the schema artifact {}", path.display()))?;
    if let Err(e) = temp.persist(path) {
        log::warn!(
            "Could not rename the schema artifact into {} ({}), copying it instead",
            path.display(),
            e.error
        );
        fs::copy(e.file.path(), path)
            .with_context(|| format!("Could not write the schema artifact {}", path.display()))?;
    }
    normalize_permissions(path)?;
    Ok(())
}

#[cfg(unix)]
fn normalize_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn normalize_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn read_artifact(path: &Path) -> Result<TableDescriptor> {
    let file = fs::File::open(path)
        .with_context(|| format!("Could not open the schema artifact {}", path.display()))?;
    let descriptor: TableDescriptor = serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Invalid schema artifact {}", path.display()))?;
    descriptor.validate()?;
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::{SchemaCache, read_artifact, write_artifact};
    use crate::TableDescriptor;
    use indoc::indoc;
    use std::{fs, path::PathBuf};

    #[test]
    fn artifact_layout() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SchemaCache::new(Some(dir.path().into()), false);
        let path = cache.artifact_path("users").unwrap();
        assert_eq!(path, dir.path().join("orm").join("users"));
        let descriptor = TableDescriptor::new("users")
            .column("id")
            .column("name")
            .primary_key("id", true);
        write_artifact(&path, &descriptor).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            indoc! {r#"
                {
                  "name": "users",
                  "columns": [
                    "id",
                    "name"
                  ],
                  "primaryKey": "id",
                  "autoIncrement": true
                }"#}
        );
        assert_eq!(read_artifact(&path).unwrap(), descriptor);
        write_artifact(&path, &descriptor.clone().column("email")).unwrap();
        assert_eq!(read_artifact(&path).unwrap().columns.len(), 3);
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn artifact_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orm").join("users");
        write_artifact(&path, &TableDescriptor::new("users").column("id")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn artifact_target_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orm").join("users");
        fs::create_dir_all(&path).unwrap();
        // Neither the rename nor the copy can replace a directory
        assert!(write_artifact(&path, &TableDescriptor::new("users").column("id")).is_err());
        assert!(path.is_dir());
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn memory_only_is_always_debug() {
        let cache = SchemaCache::new(None, false);
        assert!(cache.is_debug());
        assert_eq!(cache.artifact_path("users"), None);
        let cache = SchemaCache::new(Some(PathBuf::from("/tmp")), false);
        assert!(!cache.is_debug());
    }

    #[test]
    fn unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("orm").join("users");
        assert!(write_artifact(&path, &TableDescriptor::new("users")).is_err());
    }

    #[test]
    fn registry() {
        let cache = SchemaCache::new(None, true);
        assert!(cache.is_empty());
        cache.insert(TableDescriptor::new("a").column("x"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.cached("a").unwrap().columns, ["x"]);
        cache.clear();
        assert!(cache.cached("a").is_none());
    }
}
