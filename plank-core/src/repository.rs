use crate::{
    Connection, Driver, Error, Executor, Model, QueryBuilder, Result, RowLabeled, SqlWriter,
    Transport, Value,
};
use convert_case::{Case, Casing};
use std::marker::PhantomData;

/// Result of [`Repository::find_by_property`].
#[derive(Debug)]
pub enum Found<M> {
    /// `findBy<Property>`
    One(Option<M>),
    /// `findAllBy<Property>`
    All(Vec<M>),
}

impl<M> Found<M> {
    pub fn into_vec(self) -> Vec<M> {
        match self {
            Found::One(v) => v.into_iter().collect(),
            Found::All(v) => v,
        }
    }
}

/// Lookups of `M` objects by primary key or by column values.
pub struct Repository<'c, T: Transport, M: Model> {
    connection: &'c mut Connection<T>,
    _model: PhantomData<fn() -> M>,
}

impl<'c, T: Transport, M: Model> Repository<'c, T, M> {
    pub fn new(connection: &'c mut Connection<T>) -> Self {
        Self {
            connection,
            _model: PhantomData,
        }
    }

    pub fn connection(&mut self) -> &mut Connection<T> {
        self.connection
    }

    /// Builder selecting every column of the table, an empty alias means no alias.
    pub fn create_query_builder(&self, alias: &str) -> QueryBuilder<M> {
        self.connection.create_query_builder::<M>(alias)
    }

    /// Stored row whose primary key equals `id`.
    pub async fn find_row(&mut self, id: impl Into<Value>) -> Result<Option<RowLabeled>> {
        let table = self.connection.table::<M>().await?;
        let Some(pk) = table.primary_key.as_deref() else {
            let error = Error::msg(format!(
                "Cannot find by id in `{}`, the table has no primary key",
                table.name
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        self.connection
            .fetch_by_key(&table.name, pk, id.into())
            .await
    }

    pub async fn find(&mut self, id: impl Into<Value>) -> Result<Option<M>> {
        self.find_row(id)
            .await?
            .map(|row| M::accessors().hydrate(&row))
            .transpose()
    }

    /// First object whose columns equal every criterion.
    pub async fn find_by<I, K, V>(&mut self, criteria: I) -> Result<Option<M>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.criteria_query(criteria);
        query.fetch_one(&mut *self.connection).await
    }

    /// Every object whose columns equal every criterion.
    pub async fn find_all<I, K, V>(&mut self, criteria: I) -> Result<Vec<M>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = self.criteria_query(criteria);
        query.fetch_all(&mut *self.connection).await
    }

    /// Dispatches a `findBy<Property>` or `findAllBy<Property>` style call, the property is
    /// converted to its snake case column (`findByEmailAddress` looks up `email_address`).
    ///
    /// The whole name is snake cased, not only its first letter lowercased: a camel case column
    /// such as `emailAddress` cannot be reached this way, use [`Repository::find_by`] for it.
    pub async fn find_by_property(&mut self, method: &str, value: impl Into<Value>) -> Result<Found<M>> {
        if let Some(property) = method.strip_prefix("findAllBy")
            && !property.is_empty()
        {
            let column = property.to_case(Case::Snake);
            return Ok(Found::All(self.find_all([(column, value)]).await?));
        }
        if let Some(property) = method.strip_prefix("findBy")
            && !property.is_empty()
        {
            let column = property.to_case(Case::Snake);
            return Ok(Found::One(self.find_by([(column, value)]).await?));
        }
        let error = Error::msg(format!(
            "Unknown method `{}` on the repository of `{}`, expected findBy<Property> or findAllBy<Property>",
            method,
            M::table_name()
        ));
        log::error!("{:#}", error);
        Err(error)
    }

    fn criteria_query<I, K, V>(&self, criteria: I) -> QueryBuilder<M>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let writer = self.connection.driver().sql_writer();
        let mut query = self.create_query_builder("");
        for (i, (column, value)) in criteria.into_iter().enumerate() {
            let condition = format!("{} = ?", writer.quote_identifier(&column.into()));
            if i == 0 {
                query.where_(condition);
            } else {
                query.and_where(condition);
            }
            query.add_parameter(value);
        }
        query
    }
}
