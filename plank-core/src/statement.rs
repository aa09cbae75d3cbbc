use crate::{JoinPart, OrderBy, Predicate, SqlWriter, TableRef};
use indexmap::IndexMap;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

/// Borrowed view over the query parts that matter to a `SELECT`.
#[derive(Debug, Clone, Copy)]
pub struct SelectStatement<'a> {
    pub columns: &'a [String],
    pub from: &'a [TableRef],
    pub joins: &'a [JoinPart],
    pub condition: Option<&'a Predicate>,
    pub group_by: &'a [String],
    pub having: Option<&'a Predicate>,
    pub order_by: &'a [OrderBy],
}

/// `INSERT` view, values map a column to its value fragment (usually a placeholder).
#[derive(Debug, Clone, Copy)]
pub struct InsertStatement<'a> {
    pub table: Option<&'a TableRef>,
    pub values: &'a IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateStatement<'a> {
    pub table: Option<&'a TableRef>,
    pub set: &'a IndexMap<String, String>,
    pub condition: Option<&'a Predicate>,
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteStatement<'a> {
    pub table: Option<&'a TableRef>,
    pub condition: Option<&'a Predicate>,
}

/// One statement ready to be written, only the parts relevant to its kind are reachable.
#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    Select(SelectStatement<'a>),
    Insert(InsertStatement<'a>),
    Update(UpdateStatement<'a>),
    Delete(DeleteStatement<'a>),
}

impl<'a> Statement<'a> {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Select(..) => StatementKind::Select,
            Statement::Insert(..) => StatementKind::Insert,
            Statement::Update(..) => StatementKind::Update,
            Statement::Delete(..) => StatementKind::Delete,
        }
    }

    /// Target table of a modifying statement.
    pub fn table(&self) -> Option<&'a TableRef> {
        match self {
            Statement::Select(s) => s.from.first(),
            Statement::Insert(s) => s.table,
            Statement::Update(s) => s.table,
            Statement::Delete(s) => s.table,
        }
    }

    pub fn write(&self, writer: &dyn SqlWriter, out: &mut String) {
        match self {
            Statement::Select(s) => writer.write_select(out, s),
            Statement::Insert(s) => writer.write_insert(out, s),
            Statement::Update(s) => writer.write_update(out, s),
            Statement::Delete(s) => writer.write_delete(out, s),
        }
    }
}
