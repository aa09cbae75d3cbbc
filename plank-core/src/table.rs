use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Discovered metadata of one table.
///
/// Built once by the driver and shared read only afterwards (see [`SchemaCache`](crate::SchemaCache)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub name: String,
    /// Column names in discovery order.
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Whether the primary key is generated by the database.
    #[serde(default)]
    pub auto_increment: bool,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            auto_increment: false,
        }
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>, auto_increment: bool) -> Self {
        self.primary_key = Some(name.into());
        self.auto_increment = auto_increment;
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Checks that the column names are unique and that the primary key is one of them.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        if let Some(duplicate) = self.columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(Error::msg(format!(
                "Table `{}` declares column `{}` more than once",
                self.name, duplicate
            )));
        }
        if let Some(pk) = &self.primary_key
            && !self.has_column(pk)
        {
            return Err(Error::msg(format!(
                "Primary key `{}` is not a column of table `{}`",
                pk, self.name
            )));
        }
        if self.auto_increment && self.primary_key.is_none() {
            return Err(Error::msg(format!(
                "Table `{}` is marked auto increment but has no primary key",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::TableDescriptor;

    #[test]
    fn validation() {
        let users = TableDescriptor::new("users")
            .column("id")
            .column("name")
            .primary_key("id", true);
        assert!(users.validate().is_ok());
        assert!(
            TableDescriptor::new("t")
                .column("a")
                .column("a")
                .validate()
                .is_err()
        );
        assert!(
            TableDescriptor::new("t")
                .column("a")
                .primary_key("b", false)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn serialized_shape() {
        let users = TableDescriptor::new("users")
            .column("id")
            .column("email")
            .primary_key("id", true);
        let json = serde_json::to_value(&users).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "users",
                "columns": ["id", "email"],
                "primaryKey": "id",
                "autoIncrement": true,
            })
        );
        let back: TableDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, users);
    }
}
