use indexmap::IndexMap;
use parking_lot::Mutex;
use plank::{
    Config, Connection, Cursor, Driver, Error, Prepared, Result, RowNames, SqlWriter,
    TableDescriptor, Transport, Value,
};
use plank_mysql::MySqlDriver;
use std::{
    collections::HashMap,
    fmt::{self, Display},
    sync::{Arc, LazyLock},
};

pub type MemoryRow = IndexMap<String, Value>;

#[derive(Debug, Clone)]
struct MemoryTable {
    descriptor: TableDescriptor,
    rows: Vec<MemoryRow>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: IndexMap<String, MemoryTable>,
    log: Vec<(String, Vec<Value>)>,
    describes: usize,
    fail_on: Option<String>,
}

static REGISTRY: LazyLock<Mutex<HashMap<String, MemoryDatabase>>> =
    LazyLock::new(Default::default);

/// Database kept in memory, understanding the statements the object mapper emits in the MySQL
/// dialect: `DESCRIBE`, `SELECT` with equality conditions joined by `AND`, `INSERT`, `UPDATE`
/// and `DELETE`.
///
/// Every statement is logged together with its parameters.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared database registered under `name`, [`Transport::connect`] looks it up by `dbname`.
    pub fn named(name: &str) -> Self {
        REGISTRY.lock().entry(name.to_string()).or_default().clone()
    }

    pub fn create_table(&self, descriptor: TableDescriptor) -> &Self {
        self.state.lock().tables.insert(
            descriptor.name.clone(),
            MemoryTable {
                descriptor,
                rows: Vec::new(),
                next_id: 1,
            },
        );
        self
    }

    /// Stores a row directly, without going through a connection.
    pub fn insert_row<I, K, V>(&self, table: &str, row: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut state = self.state.lock();
        let table = table_mut(&mut state, table)?;
        let row = row
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Vec<_>>();
        table.insert(row)?;
        Ok(())
    }

    pub fn rows(&self, table: &str) -> Vec<MemoryRow> {
        self.state
            .lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Executed statements, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().log.iter().map(|(sql, _)| sql.clone()).collect()
    }

    /// Executed statements with their parameters.
    pub fn log(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }

    /// Number of `DESCRIBE` statements executed so far.
    pub fn describe_count(&self) -> usize {
        self.state.lock().describes
    }

    /// The next statement containing `pattern` fails.
    pub fn fail_on(&self, pattern: impl Into<String>) {
        self.state.lock().fail_on = Some(pattern.into());
    }

    pub fn transport(&self) -> MemoryTransport {
        MemoryTransport {
            database: self.clone(),
            driver: MySqlDriver,
            snapshot: None,
            last_insert_id: None,
            last_error: None,
        }
    }

    /// Connection over this database, with the given configuration.
    pub fn connect(&self, config: Config) -> Result<Connection<MemoryTransport>> {
        Connection::with_transport(config, self.transport())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor> {
        let mut state = self.state.lock();
        state.log.push((sql.to_string(), params.to_vec()));
        if let Some(pattern) = &state.fail_on
            && sql.contains(pattern.as_str())
        {
            state.fail_on = None;
            return Err(Error::msg(format!("Injected failure for `{}`", sql)));
        }
        let mut params = params.iter().cloned();
        if let Some(table) = sql.strip_prefix("DESCRIBE ") {
            state.describes += 1;
            return table_mut(&mut state, &unquote(table)).map(|t| t.describe());
        }
        if let Some(rest) = sql.strip_prefix("SELECT ") {
            let (columns, rest) = split_once(rest, " FROM ")?;
            let (table, condition) = split_condition(rest);
            let filter = parse_condition(condition, &mut params)?;
            return table_mut(&mut state, &table)?.select(columns, &filter);
        }
        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            let (table, rest) = split_once(rest, " (")?;
            let (columns, _) = split_once(rest, ") VALUES(")?;
            let row = columns
                .split(", ")
                .map(unquote)
                .zip(params.by_ref())
                .collect::<Vec<_>>();
            let id = table_mut(&mut state, &unquote(table))?.insert(row)?;
            return Ok(Cursor::affected(1, id));
        }
        if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (table, rest) = split_once(rest, " SET ")?;
            let (assignments, condition) = match rest.split_once(" WHERE ") {
                Some((a, c)) => (a, c),
                None => (rest, ""),
            };
            let changes = assignments
                .split(", ")
                .map(|a| {
                    let (column, _) = split_once(a, " = ")?;
                    let value = params
                        .next()
                        .ok_or_else(|| Error::msg("Missing parameter in SET"))?;
                    Ok((unquote(column), value))
                })
                .collect::<Result<Vec<_>>>()?;
            let filter = parse_condition(condition, &mut params)?;
            let table = table_mut(&mut state, &unquote(table))?;
            let mut affected = 0;
            for row in table.rows.iter_mut().filter(|r| matches(r, &filter)) {
                for (column, value) in &changes {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
            return Ok(Cursor::affected(affected, None));
        }
        if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let (table, condition) = split_condition(rest);
            let filter = parse_condition(condition, &mut params)?;
            let table = table_mut(&mut state, &table)?;
            let before = table.rows.len();
            table.rows.retain(|r| !matches(r, &filter));
            return Ok(Cursor::affected((before - table.rows.len()) as u64, None));
        }
        Err(Error::msg(format!("Unsupported statement `{}`", sql)))
    }
}

impl MemoryTable {
    fn describe(&self) -> Cursor {
        let labels: RowNames = ["Field", "Type", "Null", "Key", "Default", "Extra"]
            .map(String::from)
            .into();
        let mut cursor = Cursor::new(labels);
        for column in &self.descriptor.columns {
            let is_pk = self.descriptor.primary_key.as_ref() == Some(column);
            cursor.push(
                [
                    Value::Varchar(column.clone()),
                    Value::Varchar("text".into()),
                    Value::Varchar(if is_pk { "NO" } else { "YES" }.into()),
                    Value::Varchar(if is_pk { "PRI" } else { "" }.into()),
                    Value::Null,
                    Value::Varchar(
                        if is_pk && self.descriptor.auto_increment {
                            "auto_increment"
                        } else {
                            ""
                        }
                        .into(),
                    ),
                ]
                .into(),
            );
        }
        cursor
    }

    fn select(&self, columns: &str, filter: &[(String, Value)]) -> Result<Cursor> {
        let columns: Vec<String> = if columns.trim() == "*" {
            self.descriptor.columns.clone()
        } else {
            columns.split(", ").map(unquote).collect()
        };
        let mut cursor = Cursor::new(columns.clone().into());
        for row in self.rows.iter().filter(|r| matches(r, filter)) {
            cursor.push(
                columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or_default())
                    .collect(),
            );
        }
        Ok(cursor)
    }

    fn insert(&mut self, values: Vec<(String, Value)>) -> Result<Option<u64>> {
        let mut row: MemoryRow = self
            .descriptor
            .columns
            .iter()
            .map(|c| (c.clone(), Value::Null))
            .collect();
        for (column, value) in values {
            if !self.descriptor.has_column(&column) {
                return Err(Error::msg(format!(
                    "Unknown column `{}` in `{}`",
                    column, self.descriptor.name
                )));
            }
            row.insert(column, value);
        }
        let mut generated = None;
        if let Some(pk) = &self.descriptor.primary_key {
            if self.descriptor.auto_increment && row.get(pk).is_none_or(Value::is_empty_key) {
                row.insert(pk.clone(), Value::Int64(self.next_id));
                generated = Some(self.next_id as u64);
            }
            if let Some(Value::Int64(id)) = row.get(pk) {
                self.next_id = self.next_id.max(id + 1);
            }
            let key = row.get(pk).cloned().unwrap_or_default();
            if self.rows.iter().any(|r| r.get(pk).is_some_and(|v| loose_eq(v, &key))) {
                return Err(Error::msg(format!(
                    "Duplicate entry '{}' for key '{}.PRIMARY'",
                    key, self.descriptor.name
                )));
            }
        }
        self.rows.push(row);
        Ok(generated)
    }
}

fn table_mut<'s>(state: &'s mut MemoryState, name: &str) -> Result<&'s mut MemoryTable> {
    state
        .tables
        .get_mut(name)
        .ok_or_else(|| Error::msg(format!("Table '{}' doesn't exist", name)))
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let value = value
        .strip_prefix('`')
        .and_then(|v| v.strip_suffix('`'))
        .unwrap_or(value);
    value.replace("``", "`")
}

fn split_once<'a>(value: &'a str, separator: &str) -> Result<(&'a str, &'a str)> {
    value
        .split_once(separator)
        .ok_or_else(|| Error::msg(format!("Expected `{}` in `{}`", separator.trim(), value)))
}

/// Table name (the alias is dropped) and the condition text, if any. Ordering is ignored.
fn split_condition(value: &str) -> (String, &str) {
    let value = value.split(" ORDER BY ").next().unwrap_or(value);
    let (table, condition) = value.split_once(" WHERE ").unwrap_or((value, ""));
    let table = table.split(" ").next().unwrap_or(table);
    (unquote(table), condition)
}

fn parse_condition(
    condition: &str,
    params: &mut impl Iterator<Item = Value>,
) -> Result<Vec<(String, Value)>> {
    if condition.trim().is_empty() {
        return Ok(Vec::new());
    }
    condition
        .split(" AND ")
        .map(|part| {
            let (column, _) = split_once(part, " = ")?;
            let column = column.rsplit('.').next().unwrap_or(column);
            let value = params
                .next()
                .ok_or_else(|| Error::msg(format!("Missing parameter for `{}`", part)))?;
            Ok((unquote(column), value))
        })
        .collect()
}

fn matches(row: &MemoryRow, filter: &[(String, Value)]) -> bool {
    filter
        .iter()
        .all(|(column, value)| row.get(column).is_some_and(|v| loose_eq(v, value)))
}

/// Equality across the integer representations, like the server compares them.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int64(a), Value::UInt64(b)) | (Value::UInt64(b), Value::Int64(a)) => {
            *a as i128 == *b as i128
        }
        (Value::Null, _) | (_, Value::Null) => false,
        _ => a == b,
    }
}

/// Transport over a [`MemoryDatabase`], transactions restore a snapshot on rollback.
pub struct MemoryTransport {
    database: MemoryDatabase,
    driver: MySqlDriver,
    snapshot: Option<IndexMap<String, MemoryTable>>,
    last_insert_id: Option<u64>,
    last_error: Option<String>,
}

impl MemoryTransport {
    pub fn database(&self) -> &MemoryDatabase {
        &self.database
    }

    fn log_statement(&self, write: fn(&dyn SqlWriter, &mut String)) {
        let mut sql = String::new();
        write(self.driver.sql_writer().as_dyn(), &mut sql);
        self.database.state.lock().log.push((sql, Vec::new()));
    }
}

#[derive(Debug)]
pub struct MemoryPrepared {
    sql: String,
    params: Vec<Value>,
}

impl Prepared for MemoryPrepared {
    fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.params.push(value.into());
        Ok(self)
    }
    fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.params.clear();
        Ok(self)
    }
    fn sql(&self) -> &str {
        &self.sql
    }
    fn parameters(&self) -> &[Value] {
        &self.params
    }
}

impl Display for MemoryPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.sql, self.params)
    }
}

impl Transport for MemoryTransport {
    type Driver = MySqlDriver;
    type Prepared = MemoryPrepared;

    async fn connect(config: &Config) -> Result<Self> {
        Ok(MemoryDatabase::named(&config.dbname).transport())
    }

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    async fn prepare(&mut self, sql: String) -> Result<Self::Prepared> {
        Ok(MemoryPrepared {
            sql,
            params: Vec::new(),
        })
    }

    async fn execute(&mut self, prepared: Self::Prepared) -> Result<Cursor> {
        match self.database.execute(&prepared.sql, &prepared.params) {
            Ok(cursor) => {
                if cursor.last_insert_id.is_some() {
                    self.last_insert_id = cursor.last_insert_id;
                }
                Ok(cursor)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn last_insert_id(&self) -> Option<Value> {
        self.last_insert_id.map(Value::UInt64)
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    async fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(Error::msg("A transaction is already open"));
        }
        self.log_statement(|w, out| w.write_transaction_begin(out));
        self.snapshot = Some(self.database.state.lock().tables.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.snapshot.take().is_none() {
            return Err(Error::msg("No transaction is open"));
        }
        self.log_statement(|w, out| w.write_transaction_commit(out));
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let Some(snapshot) = self.snapshot.take() else {
            return Err(Error::msg("No transaction is open"));
        };
        self.log_statement(|w, out| w.write_transaction_rollback(out));
        self.database.state.lock().tables = snapshot;
        Ok(())
    }

    fn error_info(&self) -> Option<String> {
        self.last_error.clone()
    }
}
