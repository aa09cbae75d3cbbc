use plank_core::SqlWriter;
use std::fmt::Write;

#[derive(Default, Clone, Copy)]
pub struct MySqlSqlWriter {}

impl SqlWriter for MySqlSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("START TRANSACTION");
    }
}

#[cfg(test)]
mod tests {
    use super::MySqlSqlWriter;
    use plank_core::{QueryBuilder, SqlWriter, Value};

    #[test]
    fn dialect() {
        let writer = MySqlSqlWriter::default();
        assert_eq!(writer.quote_identifier("order"), "`order`");
        assert_eq!(writer.quote_identifier("we`ird"), "`we``ird`");
        let mut out = String::new();
        writer.write_value(&mut out, &Value::Varchar(r"it's a\b".into()));
        assert_eq!(out, r"'it''s a\\b'");
        out.clear();
        writer.write_value(&mut out, &Value::Blob([0xCA, 0xFE].into()));
        assert_eq!(out, "X'CAFE'");
        out.clear();
        writer.write_describe(&mut out, "users");
        assert_eq!(out, "DESCRIBE `users`");
        out.clear();
        writer.write_transaction_begin(&mut out);
        assert_eq!(out, "START TRANSACTION");
    }

    #[test]
    fn statements() {
        let writer = MySqlSqlWriter::default();
        let mut query = QueryBuilder::<()>::new();
        query
            .select(["*"])
            .from(writer.quote_identifier("users"), "")
            .where_("`email` = ?")
            .and_where("`active` = ?");
        assert_eq!(
            query.sql_with(writer.as_dyn()),
            "SELECT * FROM `users` WHERE `email` = ? AND `active` = ?"
        );
    }
}
