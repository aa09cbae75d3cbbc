use crate::MySqlSqlWriter;
use plank_core::{
    AsValue, Driver, Executor, Result, RowLabeled, SqlWriter, TableDescriptor, Value,
};

#[derive(Default, Clone, Copy, Debug)]
pub struct MySqlDriver;
impl MySqlDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MySqlDriver {
    type SqlWriter = MySqlSqlWriter;

    const NAME: &'static str = "mysql";

    fn sql_writer(&self) -> Self::SqlWriter {
        MySqlSqlWriter::default()
    }

    async fn describe_table<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
    ) -> Result<TableDescriptor> {
        let mut sql = String::new();
        self.sql_writer().write_describe(&mut sql, table);
        let rows = executor.fetch_all(sql, Vec::new()).await?;
        table_from_describe(table, &rows)
    }
}

fn text(row: &RowLabeled, column: &str) -> Result<String> {
    match row.get_column(column) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(v) => String::try_from_value(v.clone()),
    }
}

/// Maps the rows of `DESCRIBE table` (`Field`, `Type`, `Null`, `Key`, `Default`, `Extra`).
pub(crate) fn table_from_describe(table: &str, rows: &[RowLabeled]) -> Result<TableDescriptor> {
    let mut result = TableDescriptor::new(table);
    for row in rows {
        let field = text(row, "Field")?;
        if text(row, "Key")?.eq_ignore_ascii_case("PRI") {
            if let Some(pk) = &result.primary_key {
                log::warn!(
                    "Table `{}` has a composite primary key, using `{}` and ignoring `{}`",
                    table,
                    pk,
                    field
                );
            } else {
                let auto_increment = text(row, "Extra")?
                    .to_ascii_lowercase()
                    .contains("auto_increment");
                result = result.primary_key(field.clone(), auto_increment);
            }
        }
        result.columns.push(field);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{MySqlDriver, table_from_describe};
    use plank_core::{Cursor, Driver, Executor, Result, RowLabeled, RowNames, Value};

    fn describe(rows: &[[&str; 3]]) -> Vec<RowLabeled> {
        let labels: RowNames = ["Field", "Type", "Null", "Key", "Default", "Extra"]
            .map(String::from)
            .into();
        rows.iter()
            .map(|[field, key, extra]| {
                RowLabeled::new(
                    labels.clone(),
                    [
                        Value::Varchar(field.to_string()),
                        Value::Varchar("int".into()),
                        Value::Varchar("NO".into()),
                        Value::Varchar(key.to_string()),
                        Value::Null,
                        Value::Blob(extra.as_bytes().into()),
                    ]
                    .into(),
                )
            })
            .collect()
    }

    #[test]
    fn primary_key_detection() {
        let table = table_from_describe(
            "users",
            &describe(&[
                ["id", "PRI", "auto_increment"],
                ["name", "", ""],
                ["email", "UNI", ""],
            ]),
        )
        .unwrap();
        assert_eq!(table.columns, ["id", "name", "email"]);
        assert_eq!(table.primary_key.as_deref(), Some("id"));
        assert!(table.auto_increment);
    }

    #[test]
    fn first_primary_key_wins() {
        let table = table_from_describe(
            "pairs",
            &describe(&[["a", "PRI", ""], ["b", "PRI", "auto_increment"]]),
        )
        .unwrap();
        assert_eq!(table.primary_key.as_deref(), Some("a"));
        assert!(!table.auto_increment);
        table.validate().unwrap();
    }

    struct Stub {
        driver: MySqlDriver,
        statements: Vec<String>,
    }

    impl Executor for Stub {
        type Driver = MySqlDriver;

        fn driver(&self) -> &MySqlDriver {
            &self.driver
        }

        async fn run(&mut self, sql: String, _params: Vec<Value>) -> Result<Cursor> {
            self.statements.push(sql);
            let rows = describe(&[["code", "PRI", ""], ["label", "", ""]]);
            let mut cursor = Cursor::new(rows[0].labels.clone());
            for row in rows {
                cursor.push(row.values);
            }
            Ok(cursor)
        }
    }

    #[tokio::test]
    async fn describe_statement() {
        let mut stub = Stub {
            driver: MySqlDriver,
            statements: Vec::new(),
        };
        let table = MySqlDriver.describe_table(&mut stub, "codes").await.unwrap();
        assert_eq!(stub.statements, ["DESCRIBE `codes`"]);
        assert_eq!(table.name, "codes");
        assert_eq!(table.primary_key.as_deref(), Some("code"));
        assert!(!table.auto_increment);
    }
}
