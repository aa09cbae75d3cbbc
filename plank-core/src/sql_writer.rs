use crate::{
    Composition, DeleteStatement, InsertStatement, JoinPart, JoinType, Predicate, SelectStatement,
    TableRef, UpdateStatement, Value, separated_by,
};
use std::fmt::Write;
use time::{Date, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $out:ident, $value:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        } else {
            log::warn!("Non finite float {} is written as NULL", $value);
            $this.write_value_none($out);
        }
    }};
}

/// Renders statements, literals and identifiers. Every method has a generic default, dialects
/// override the pieces that differ.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn quote_identifier(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        self.write_identifier_quoted(&mut out, value);
        out
    }

    fn write_placeholder(&self, out: &mut String) {
        out.push('?');
    }

    fn write_table_ref(&self, out: &mut String, value: &TableRef) {
        out.push_str(&value.name);
        if let Some(alias) = &value.alias {
            out.push(' ');
            out.push_str(alias);
        }
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null => self.write_value_none(out),
            Value::Boolean(v) => self.write_value_bool(out, *v),
            Value::Int64(v) => write_integer!(out, *v),
            Value::UInt64(v) => write_integer!(out, *v),
            Value::Float64(v) => write_float!(self, out, *v),
            Value::Decimal(v) => drop(write!(out, "{}", v)),
            Value::Varchar(v) => self.write_value_string(out, v),
            Value::Blob(v) => self.write_value_blob(out, v),
            Value::Date(v) => {
                out.push('\'');
                self.write_value_date(out, v);
                out.push('\'');
            }
            Value::Time(v) => {
                out.push('\'');
                self.write_value_time(out, v);
                out.push('\'');
            }
            Value::Timestamp(v) => {
                out.push('\'');
                self.write_value_date(out, &v.date());
                out.push(' ');
                self.write_value_time(out, &v.time());
                out.push('\'');
            }
            Value::Uuid(v) => drop(write!(out, "'{}'", v)),
        }
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push('\'');
        for b in value {
            let _ = write!(out, "\\x{:02X}", b);
        }
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second(),
        );
        let mut subsecond = value.nanosecond();
        if subsecond != 0 {
            let mut width = 9;
            while subsecond % 10 == 0 {
                subsecond /= 10;
                width -= 1;
            }
            let _ = write!(out, ".{:0width$}", subsecond);
        }
    }

    fn write_predicate(&self, out: &mut String, value: &Predicate) {
        match value {
            Predicate::Raw(v) => out.push_str(v),
            Predicate::Composite(_, parts) if parts.len() == 1 => {
                self.write_predicate(out, &parts[0])
            }
            Predicate::Composite(composition, parts) => {
                let separator = match composition {
                    Composition::And => ") AND (",
                    Composition::Or => ") OR (",
                };
                out.push('(');
                separated_by(
                    out,
                    parts.iter().filter(|p| !p.is_empty()),
                    |out, v| self.write_predicate(out, v),
                    separator,
                );
                out.push(')');
            }
        }
    }

    fn write_join_type(&self, out: &mut String, join_type: &JoinType) {
        out.push_str(join_type.as_str());
        out.push_str(" JOIN");
    }

    fn write_join(&self, out: &mut String, join: &JoinPart) {
        self.write_join_type(out, &join.join);
        out.push(' ');
        self.write_table_ref(out, &join.table);
        out.push_str(" ON ");
        out.push_str(&join.condition);
    }

    fn write_where(&self, out: &mut String, condition: Option<&Predicate>) {
        if let Some(condition) = condition.filter(|v| !v.is_empty()) {
            out.push_str(" WHERE ");
            self.write_predicate(out, condition);
        }
    }

    fn write_select(&self, out: &mut String, value: &SelectStatement) {
        out.push_str("SELECT ");
        if value.columns.is_empty() {
            out.push('*');
        } else {
            separated_by(out, value.columns, |out, v| out.push_str(v), ", ");
        }
        out.push_str(" FROM ");
        separated_by(
            out,
            value.from,
            |out, v| self.write_table_ref(out, v),
            ", ",
        );
        for join in value.joins {
            out.push(' ');
            self.write_join(out, join);
        }
        self.write_where(out, value.condition);
        if !value.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            separated_by(out, value.group_by, |out, v| out.push_str(v), ", ");
        }
        if let Some(having) = value.having.filter(|v| !v.is_empty()) {
            out.push_str(" HAVING ");
            self.write_predicate(out, having);
        }
        if !value.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            separated_by(
                out,
                value.order_by,
                |out, v| {
                    out.push_str(&v.sort);
                    out.push(' ');
                    out.push_str(&v.direction);
                },
                ", ",
            );
        }
    }

    fn write_insert(&self, out: &mut String, value: &InsertStatement) {
        out.push_str("INSERT INTO ");
        if let Some(table) = value.table {
            out.push_str(&table.name);
        }
        out.push_str(" (");
        separated_by(out, value.values.keys(), |out, v| out.push_str(v), ", ");
        out.push_str(") VALUES(");
        separated_by(out, value.values.values(), |out, v| out.push_str(v), ", ");
        out.push(')');
    }

    fn write_update(&self, out: &mut String, value: &UpdateStatement) {
        out.push_str("UPDATE ");
        if let Some(table) = value.table {
            self.write_table_ref(out, table);
        }
        out.push_str(" SET ");
        separated_by(
            out,
            value.set,
            |out, (column, v)| {
                out.push_str(column);
                out.push_str(" = ");
                out.push_str(v);
            },
            ", ",
        );
        self.write_where(out, value.condition);
    }

    fn write_delete(&self, out: &mut String, value: &DeleteStatement) {
        out.push_str("DELETE FROM ");
        if let Some(table) = value.table {
            self.write_table_ref(out, table);
        }
        self.write_where(out, value.condition);
    }

    /// Metadata query listing the columns of a table.
    fn write_describe(&self, out: &mut String, table: &str) {
        out.push_str("DESCRIBE ");
        self.write_identifier_quoted(out, table);
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }
}

#[derive(Default, Clone, Copy)]
pub struct GenericSqlWriter;
impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}
impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
