use crate::{
    Composition, Cursor, DeleteStatement, Driver, Error, Executor, GenericSqlWriter, InsertStatement,
    JoinPart, JoinType, Model, OrderBy, Predicate, Result, SelectStatement, SqlWriter, Statement,
    StatementKind, TableRef, UpdateStatement, Value, truncate_long,
};
use indexmap::IndexMap;
use std::{
    fmt::{self, Display},
    marker::PhantomData,
};

/// Named fragments accumulated by a [`QueryBuilder`].
#[derive(Default, Debug, Clone, PartialEq)]
pub struct QueryParts {
    pub select: Vec<String>,
    pub from: Vec<TableRef>,
    pub join: Vec<JoinPart>,
    pub set: IndexMap<String, String>,
    pub condition: Option<Predicate>,
    pub group_by: Vec<String>,
    pub having: Option<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub values: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPart {
    Select,
    From,
    Join,
    Set,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Values,
}

impl QueryPart {
    pub const ALL: [QueryPart; 9] = [
        QueryPart::Select,
        QueryPart::From,
        QueryPart::Join,
        QueryPart::Set,
        QueryPart::Where,
        QueryPart::GroupBy,
        QueryPart::Having,
        QueryPart::OrderBy,
        QueryPart::Values,
    ];
}

/// Mutable SQL accumulator rendering one of `SELECT`, `INSERT`, `UPDATE` or `DELETE`.
///
/// Fragments are stored verbatim and parameters are positional: they must be supplied in the
/// left to right order of the placeholders in the rendered SQL (for `UPDATE` the `SET` values
/// come before the `WHERE` ones).
///
/// Switching the statement kind keeps every part, only the parts meaningful to the current kind
/// are rendered.
///
/// ```rust
/// use plank_core::QueryBuilder;
/// let mut query = QueryBuilder::<()>::new();
/// query
///     .select(["u.id", "u.name"])
///     .from("users", "u")
///     .where_("u.name = ?")
///     .and_where("u.active = ?")
///     .order_by("u.id", "DESC");
/// assert_eq!(
///     query.sql(),
///     "SELECT u.id, u.name FROM users u WHERE u.name = ? AND u.active = ? ORDER BY u.id DESC"
/// );
/// ```
pub struct QueryBuilder<M = ()> {
    kind: StatementKind,
    parts: QueryParts,
    parameters: Vec<Value>,
    _model: PhantomData<fn() -> M>,
}

impl<M> QueryBuilder<M> {
    pub fn new() -> Self {
        Self {
            kind: StatementKind::Select,
            parts: Default::default(),
            parameters: Vec::new(),
            _model: PhantomData,
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: StatementKind) -> &mut Self {
        self.kind = kind;
        self
    }

    pub fn parts(&self) -> &QueryParts {
        &self.parts
    }

    /// Replaces the selected columns and switches to `SELECT`.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = StatementKind::Select;
        self.parts.select = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = StatementKind::Select;
        self.parts.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Switches to `INSERT` into `table`.
    pub fn insert(&mut self, table: impl Into<String>) -> &mut Self {
        self.kind = StatementKind::Insert;
        self.parts.from = vec![TableRef::new(table, None)];
        self
    }

    /// Switches to `UPDATE`, an empty alias means no alias.
    pub fn update(&mut self, table: impl Into<String>, alias: &str) -> &mut Self {
        self.kind = StatementKind::Update;
        self.parts.from = vec![TableRef::new(table, Some(alias.into()))];
        self
    }

    /// Switches to `DELETE`, an empty alias means no alias.
    pub fn delete(&mut self, table: impl Into<String>, alias: &str) -> &mut Self {
        self.kind = StatementKind::Delete;
        self.parts.from = vec![TableRef::new(table, Some(alias.into()))];
        self
    }

    /// Adds a table to the `FROM` list. More than one entry produces a cartesian product.
    pub fn from(&mut self, table: impl Into<String>, alias: &str) -> &mut Self {
        self.parts.from.push(TableRef::new(table, Some(alias.into())));
        self
    }

    pub fn join(
        &mut self,
        join: JoinType,
        table: impl Into<String>,
        alias: &str,
        condition: impl Into<String>,
    ) -> &mut Self {
        self.parts.join.push(JoinPart {
            join,
            table: TableRef::new(table, Some(alias.into())),
            condition: condition.into(),
        });
        self
    }

    pub fn inner_join(
        &mut self,
        table: impl Into<String>,
        alias: &str,
        condition: impl Into<String>,
    ) -> &mut Self {
        self.join(JoinType::Inner, table, alias, condition)
    }

    pub fn left_join(
        &mut self,
        table: impl Into<String>,
        alias: &str,
        condition: impl Into<String>,
    ) -> &mut Self {
        self.join(JoinType::Left, table, alias, condition)
    }

    pub fn right_join(
        &mut self,
        table: impl Into<String>,
        alias: &str,
        condition: impl Into<String>,
    ) -> &mut Self {
        self.join(JoinType::Right, table, alias, condition)
    }

    /// `UPDATE` assignment: `column = value`, the value is a SQL fragment (usually `?`).
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parts.set.insert(column.into(), value.into());
        self
    }

    /// `INSERT` column and its value fragment.
    pub fn set_value(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parts.values.insert(column.into(), value.into());
        self
    }

    /// Replaces all the `INSERT` values.
    pub fn values<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parts.values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Replaces the condition.
    pub fn where_(&mut self, condition: impl Into<Predicate>) -> &mut Self {
        self.parts.condition = Some(condition.into());
        self
    }

    /// Appends ` AND condition` to the current condition, no parentheses are added.
    pub fn and_where(&mut self, condition: impl Into<Predicate>) -> &mut Self {
        self.append_where(Composition::And, condition.into())
    }

    /// Appends ` OR condition` to the current condition, no parentheses are added.
    pub fn or_where(&mut self, condition: impl Into<Predicate>) -> &mut Self {
        self.append_where(Composition::Or, condition.into())
    }

    fn append_where(&mut self, composition: Composition, condition: Predicate) -> &mut Self {
        self.parts.condition = Some(match self.parts.condition.take() {
            Some(current) if !current.is_empty() => current.append(composition, condition),
            _ => condition,
        });
        self
    }

    pub fn group_by(&mut self, column: impl Into<String>) -> &mut Self {
        self.parts.group_by = vec![column.into()];
        self
    }

    pub fn add_group_by(&mut self, column: impl Into<String>) -> &mut Self {
        self.parts.group_by.push(column.into());
        self
    }

    pub fn having(&mut self, condition: impl Into<Predicate>) -> &mut Self {
        self.parts.having = Some(condition.into());
        self
    }

    pub fn and_having(&mut self, condition: impl Into<Predicate>) -> &mut Self {
        self.compose_having(Composition::And, condition.into())
    }

    pub fn or_having(&mut self, condition: impl Into<Predicate>) -> &mut Self {
        self.compose_having(Composition::Or, condition.into())
    }

    fn compose_having(&mut self, composition: Composition, condition: Predicate) -> &mut Self {
        self.parts.having = Some(match self.parts.having.take() {
            Some(current) if !current.is_empty() => current.compose(composition, condition),
            _ => condition,
        });
        self
    }

    /// Replaces the ordering, an empty direction means `ASC`.
    pub fn order_by(&mut self, sort: impl Into<String>, direction: &str) -> &mut Self {
        self.parts.order_by.clear();
        self.add_order_by(sort, direction)
    }

    pub fn add_order_by(&mut self, sort: impl Into<String>, direction: &str) -> &mut Self {
        self.parts.order_by.push(OrderBy {
            sort: sort.into(),
            direction: if direction.is_empty() {
                "ASC".into()
            } else {
                direction.into()
            },
        });
        self
    }

    /// Sets the parameter at `index` (from 0), missing positions before it are filled with NULL.
    pub fn set_parameter(&mut self, index: usize, value: impl Into<Value>) -> &mut Self {
        if self.parameters.len() <= index {
            self.parameters.resize(index + 1, Value::Null);
        }
        self.parameters[index] = value.into();
        self
    }

    /// Replaces all the parameters.
    pub fn set_parameters<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.parameters = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_parameter(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parameters.push(value.into());
        self
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    pub fn parameter(&self, index: usize) -> Option<&Value> {
        self.parameters.get(index)
    }

    pub fn reset_part(&mut self, part: QueryPart) -> &mut Self {
        let parts = &mut self.parts;
        match part {
            QueryPart::Select => parts.select.clear(),
            QueryPart::From => parts.from.clear(),
            QueryPart::Join => parts.join.clear(),
            QueryPart::Set => parts.set.clear(),
            QueryPart::Where => parts.condition = None,
            QueryPart::GroupBy => parts.group_by.clear(),
            QueryPart::Having => parts.having = None,
            QueryPart::OrderBy => parts.order_by.clear(),
            QueryPart::Values => parts.values.clear(),
        }
        self
    }

    pub fn reset_parts(&mut self, parts: impl IntoIterator<Item = QueryPart>) -> &mut Self {
        for part in parts {
            self.reset_part(part);
        }
        self
    }

    /// Projects the parts relevant to the current kind.
    pub fn statement(&self) -> Statement<'_> {
        let parts = &self.parts;
        match self.kind {
            StatementKind::Select => Statement::Select(SelectStatement {
                columns: &parts.select,
                from: &parts.from,
                joins: &parts.join,
                condition: parts.condition.as_ref(),
                group_by: &parts.group_by,
                having: parts.having.as_ref(),
                order_by: &parts.order_by,
            }),
            StatementKind::Insert => Statement::Insert(InsertStatement {
                table: parts.from.first(),
                values: &parts.values,
            }),
            StatementKind::Update => Statement::Update(UpdateStatement {
                table: parts.from.first(),
                set: &parts.set,
                condition: parts.condition.as_ref(),
            }),
            StatementKind::Delete => Statement::Delete(DeleteStatement {
                table: parts.from.first(),
                condition: parts.condition.as_ref(),
            }),
        }
    }

    pub fn sql(&self) -> String {
        self.sql_with(&GenericSqlWriter::new())
    }

    pub fn sql_with(&self, writer: &dyn SqlWriter) -> String {
        let mut out = String::with_capacity(128);
        self.statement().write(writer, &mut out);
        out
    }

    fn validate(&self) -> Result<()> {
        let statement = self.statement();
        if statement.table().is_none() {
            return Err(Error::msg(format!(
                "The {:?} statement has no table",
                statement.kind()
            )));
        }
        if let Statement::Insert(InsertStatement { values, .. }) = statement
            && values.is_empty()
        {
            return Err(Error::msg("The Insert statement has no values"));
        }
        if let Statement::Update(UpdateStatement { set, .. }) = statement
            && set.is_empty()
        {
            return Err(Error::msg("The Update statement has no assignments"));
        }
        Ok(())
    }

    /// Renders with the executor's dialect and runs the statement with the bound parameters.
    pub async fn execute<E: Executor>(&self, executor: &mut E) -> Result<Cursor> {
        if let Err(e) = self.validate() {
            let e = e.context(format!("While executing the query:\n{}", truncate_long!(self.sql())));
            log::error!("{:#}", e);
            return Err(e);
        }
        let sql = self.sql_with(executor.driver().sql_writer().as_dyn());
        executor.run(sql, self.parameters.clone()).await
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Builder bound to the model table, an empty alias means no alias.
    pub fn for_model(alias: &str) -> Self {
        let mut result = Self::new();
        result.from(M::table_name(), alias);
        result
    }

    /// Executes and hydrates every returned row.
    pub async fn fetch_all<E: Executor>(&self, executor: &mut E) -> Result<Vec<M>> {
        self.execute(executor).await?.fetch_all_models::<M>()
    }

    /// Executes and hydrates the first returned row.
    pub async fn fetch_one<E: Executor>(&self, executor: &mut E) -> Result<Option<M>> {
        self.execute(executor).await?.fetch_model::<M>()
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            parts: self.parts.clone(),
            parameters: self.parameters.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for QueryBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("kind", &self.kind)
            .field("parts", &self.parts)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl<M> Display for QueryBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}
