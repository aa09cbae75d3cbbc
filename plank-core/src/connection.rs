use crate::{
    Config, ConnectEvent, Context, Cursor, DeleteEvent, Driver, Error, EventDispatcher, EventKind,
    Executor, InsertEvent, Model, Prepared, QueryBuilder, QueryEvent, Repository, Result,
    RowLabeled, SchemaCache, SqlWriter, TableDescriptor, Transport, UpdateEvent, Value, ValueMap,
    truncate_long,
};
use std::{any, sync::Arc};

/// Result of [`Connection::save`] and [`Connection::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Updated,
    /// The object matches the stored row, no statement was issued.
    Unchanged,
    Deleted,
    /// A listener aborted the operation.
    Cancelled,
}

/// Entry point of the object mapper.
///
/// Owns the transport (opened lazily on first use), the event dispatcher and the schema cache.
/// `save` and `remove` implicitly open a transaction that stays open until [`Connection::flush`],
/// [`Connection::commit`] or [`Connection::rollback`].
pub struct Connection<T: Transport> {
    config: Config,
    driver: T::Driver,
    transport: Option<T>,
    events: EventDispatcher,
    tables: Arc<SchemaCache>,
}

impl<T: Transport> Connection<T> {
    pub fn new(config: Config) -> Result<Self> {
        config.validate(T::Driver::NAME).map_err(|e| {
            log::error!("{:#}", e);
            e
        })?;
        Ok(Self {
            tables: Arc::new(SchemaCache::from_config(&config)),
            config,
            driver: Default::default(),
            transport: None,
            events: EventDispatcher::new(),
        })
    }

    /// Connection over an already established transport.
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        let mut result = Self::new(config)?;
        result.driver = transport.driver().clone();
        result.transport = Some(transport);
        Ok(result)
    }

    /// Shares the descriptors with other connections.
    pub fn with_schema_cache(mut self, tables: Arc<SchemaCache>) -> Self {
        self.tables = tables;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventDispatcher {
        &mut self.events
    }

    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.tables
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// The transport, connecting first if needed.
    pub async fn connect(&mut self) -> Result<&mut T> {
        if self.transport.is_none() {
            let dsn = self.config.dsn();
            let transport = T::connect(&self.config).await.map_err(|e| {
                let e = e.context(format!("While trying to connect to `{}`", dsn));
                log::error!("{:#}", e);
                e
            })?;
            log::debug!("Connected to `{}`", dsn);
            self.driver = transport.driver().clone();
            self.transport = Some(transport);
            let event = ConnectEvent {
                driver: T::Driver::NAME,
                dsn,
            };
            self.events
                .notify(EventKind::Connect, |l| l.on_connect(&event));
        }
        self.transport
            .as_mut()
            .ok_or_else(|| Error::msg("The connection has no transport"))
    }

    /// Descriptor of the table of `M`.
    pub async fn table<M: Model>(&mut self) -> Result<Arc<TableDescriptor>> {
        let tables = self.tables.clone();
        tables.get_table(self, &M::table_name()).await
    }

    pub async fn get_table(&mut self, name: &str) -> Result<Arc<TableDescriptor>> {
        let tables = self.tables.clone();
        tables.get_table(self, name).await
    }

    /// Inserts `model` when its primary key is empty, otherwise updates the changed columns.
    pub async fn save<M: Model>(&mut self, model: &mut M) -> Result<Outcome> {
        self.ensure_transaction().await?;
        let table = self.table::<M>().await?;
        let result = match M::accessors().primary_key(model, &table) {
            Some(key) if !key.is_empty_key() => self.update_model(model, &table, key).await,
            _ => self.insert_model(model, &table).await,
        };
        result.with_context(|| format!("While saving {}", any::type_name::<M>()))
    }

    async fn insert_model<M: Model>(
        &mut self,
        model: &mut M,
        table: &TableDescriptor,
    ) -> Result<Outcome> {
        let flow = {
            let mut event = InsertEvent::new(&mut *model, ValueMap::new());
            self.events
                .cancellable(EventKind::PreInsert, |l| l.pre_insert(&mut event))
        };
        if flow.is_abort() {
            return Ok(Outcome::Cancelled);
        }
        let mut values = M::accessors().values(model, table);
        if let Some(pk) = &table.primary_key {
            values.shift_remove(pk);
        }
        let (flow, values) = {
            let mut event = InsertEvent::new(&mut *model, values);
            let flow = self
                .events
                .cancellable(EventKind::Insert, |l| l.insert(&mut event));
            (flow, event.into_values())
        };
        if flow.is_abort() {
            return Ok(Outcome::Cancelled);
        }
        let cursor = self.insert_values(&table.name, &values).await?;
        if let Some(pk) = &table.primary_key
            && table.auto_increment
        {
            // A key supplied by a listener wins, otherwise only this statement's key is trusted
            let id = values
                .get(pk)
                .filter(|v| !v.is_empty_key())
                .cloned()
                .or(cursor.last_insert_id.map(Value::UInt64));
            match id {
                Some(id) => {
                    M::accessors().set_primary_key(model, table, id)?;
                }
                None => log::warn!(
                    "No generated key was reported for the insert into `{}`",
                    table.name
                ),
            }
        }
        let mut event = InsertEvent::new(&mut *model, values);
        self.events
            .notify(EventKind::PostInsert, |l| l.post_insert(&mut event));
        Ok(Outcome::Inserted)
    }

    async fn update_model<M: Model>(
        &mut self,
        model: &mut M,
        table: &TableDescriptor,
        key: Value,
    ) -> Result<Outcome> {
        let flow = {
            let mut event = UpdateEvent::new(&mut *model, ValueMap::new(), ValueMap::new());
            self.events
                .cancellable(EventKind::PreUpdate, |l| l.pre_update(&mut event))
        };
        if flow.is_abort() {
            return Ok(Outcome::Cancelled);
        }
        let Some(pk) = table.primary_key.as_deref() else {
            return Err(Error::msg(format!("Table `{}` has no primary key", table.name)));
        };
        let accessors = M::accessors();
        let mut changed = accessors.values(model, table);
        // Stored values go through the fields of `M` so both sides carry the same types
        let original = match self.fetch_by_key(&table.name, pk, key.clone()).await? {
            Some(row) => accessors.values(&accessors.hydrate(&row)?, table),
            None => {
                log::warn!(
                    "No row of `{}` has {} = {}, every column will be written",
                    table.name,
                    pk,
                    key
                );
                ValueMap::new()
            }
        };
        changed.retain(|column, value| original.get(column) != Some(value));
        if changed.is_empty() {
            log::debug!("Nothing to update in `{}` where {} = {}", table.name, pk, key);
            return Ok(Outcome::Unchanged);
        }
        let (flow, changed, original) = {
            let mut event = UpdateEvent::new(&mut *model, changed, original);
            let flow = self
                .events
                .cancellable(EventKind::Update, |l| l.update(&mut event));
            let (changed, original) = event.into_values();
            (flow, changed, original)
        };
        if flow.is_abort() {
            return Ok(Outcome::Cancelled);
        }
        if changed.is_empty() {
            return Ok(Outcome::Unchanged);
        }
        let condition = self.key_condition(pk);
        self.update_values(&table.name, &changed, &condition, vec![key])
            .await?;
        let mut event = UpdateEvent::new(&mut *model, changed, original);
        self.events
            .notify(EventKind::PostUpdate, |l| l.post_update(&mut event));
        Ok(Outcome::Updated)
    }

    /// Deletes the row of `model`, identified by its primary key.
    pub async fn remove<M: Model>(&mut self, model: &mut M) -> Result<Outcome> {
        self.ensure_transaction().await?;
        let table = self.table::<M>().await?;
        let flow = {
            let mut event = DeleteEvent::new(&mut *model);
            self.events
                .cancellable(EventKind::PreDelete, |l| l.pre_delete(&mut event))
        };
        if flow.is_abort() {
            return Ok(Outcome::Cancelled);
        }
        let Some(pk) = table.primary_key.as_deref() else {
            let error = Error::msg(format!(
                "Cannot remove from `{}`, the table has no primary key",
                table.name
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let key = M::accessors()
            .primary_key(model, &table)
            .filter(|v| !v.is_empty_key());
        let Some(key) = key else {
            let error = Error::msg(format!(
                "Cannot remove {} from `{}`, its primary key `{}` is empty",
                any::type_name::<M>(),
                table.name,
                pk
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let condition = self.key_condition(pk);
        self.delete_where(&table.name, &condition, vec![key]).await?;
        let mut event = DeleteEvent::new(&mut *model);
        self.events
            .notify(EventKind::PostDelete, |l| l.post_delete(&mut event));
        Ok(Outcome::Deleted)
    }

    fn key_condition(&self, pk: &str) -> String {
        format!("{} = ?", self.driver.sql_writer().quote_identifier(pk))
    }

    /// Stored row of `table` whose `pk` column equals `key`.
    pub async fn fetch_by_key(
        &mut self,
        table: &str,
        pk: &str,
        key: Value,
    ) -> Result<Option<RowLabeled>> {
        let mut query = QueryBuilder::<()>::new();
        {
            let writer = self.driver.sql_writer();
            query
                .select(["*"])
                .from(writer.quote_identifier(table), "")
                .where_(self.key_condition(pk))
                .set_parameter(0, key);
        }
        Ok(query.execute(self).await?.fetch())
    }

    async fn ensure_transaction(&mut self) -> Result<()> {
        if !self.connect().await?.in_transaction() {
            self.begin_transaction().await?;
        }
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.transport
            .as_ref()
            .map(Transport::in_transaction)
            .unwrap_or(false)
    }

    pub async fn begin_transaction(&mut self) -> Result<()> {
        log::debug!("Beginning a transaction on `{}`", self.config.dbname);
        self.connect().await?.begin().await.map_err(|e| {
            let e = e.context("While beginning a transaction");
            log::error!("{:#}", e);
            e
        })
    }

    pub async fn commit(&mut self) -> Result<()> {
        log::debug!("Committing on `{}`", self.config.dbname);
        self.connect().await?.commit().await.map_err(|e| {
            let e = e.context("While committing the transaction");
            log::error!("{:#}", e);
            e
        })
    }

    pub async fn rollback(&mut self) -> Result<()> {
        log::debug!("Rolling back on `{}`", self.config.dbname);
        self.connect().await?.rollback().await.map_err(|e| {
            let e = e.context("While rolling back the transaction");
            log::error!("{:#}", e);
            e
        })
    }

    /// Commits the pending changes, does nothing when no transaction is open.
    pub async fn flush(&mut self) -> Result<()> {
        if !self.in_transaction() {
            log::debug!("Nothing to flush, no transaction is open");
            return Ok(());
        }
        self.commit().await
    }

    pub fn repository<M: Model>(&mut self) -> Repository<'_, T, M> {
        Repository::new(self)
    }

    pub async fn find<M: Model>(&mut self, id: impl Into<Value>) -> Result<Option<M>> {
        self.repository::<M>().find(id).await
    }

    pub async fn find_by<M, I, K, V>(&mut self, criteria: I) -> Result<Option<M>>
    where
        M: Model,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.repository::<M>().find_by(criteria).await
    }

    pub async fn find_all<M, I, K, V>(&mut self, criteria: I) -> Result<Vec<M>>
    where
        M: Model,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.repository::<M>().find_all(criteria).await
    }

    /// Runs raw SQL with positional parameters.
    pub async fn create_query(
        &mut self,
        sql: impl Into<String>,
        params: impl IntoIterator<Item = Value>,
    ) -> Result<Cursor> {
        self.run(sql.into(), params.into_iter().collect()).await
    }

    /// Query builder selecting every column of the table of `M`.
    pub fn create_query_builder<M: Model>(&self, alias: &str) -> QueryBuilder<M> {
        let mut result = QueryBuilder::new();
        result.select(["*"]).from(
            self.driver
                .sql_writer()
                .quote_identifier(&M::table_name()),
            alias,
        );
        result
    }

    /// Key generated by the last insert.
    pub fn last_insert_id(&self) -> Option<Value> {
        self.transport.as_ref().and_then(Transport::last_insert_id)
    }

    pub fn quote(&self, value: &Value) -> String {
        match &self.transport {
            Some(transport) => transport.quote(value),
            None => {
                let mut out = String::new();
                self.driver.sql_writer().write_value(&mut out, value);
                out
            }
        }
    }

    pub fn error_info(&self) -> Option<String> {
        self.transport.as_ref().and_then(Transport::error_info)
    }
}

impl<T: Transport> Executor for Connection<T> {
    type Driver = T::Driver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    async fn run(&mut self, sql: String, params: Vec<Value>) -> Result<Cursor> {
        let context = || format!("While running the query:\n{}", truncate_long!(sql));
        let transport = self.connect().await?;
        let result = async {
            let mut prepared = transport.prepare(sql.clone()).await?;
            for value in &params {
                prepared.bind(value.clone())?;
            }
            log::debug!("{}", prepared);
            transport.execute(prepared).await
        }
        .await;
        let cursor = match result {
            Ok(cursor) => cursor,
            Err(e) => {
                let e = e.context(context());
                log::error!("{:#}", e);
                return Err(e);
            }
        };
        let event = QueryEvent {
            sql,
            params,
            rows_affected: cursor.rows_affected,
        };
        self.events.notify(EventKind::Query, |l| l.on_query(&event));
        Ok(cursor)
    }
}
