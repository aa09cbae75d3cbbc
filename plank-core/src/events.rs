use crate::{Persistent, Value, ValueMap};
use std::{fmt, sync::Arc};

/// Outcome of a cancellable hook.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Continue,
    /// Stops the remaining listeners and cancels the operation.
    Abort,
}

impl Flow {
    pub fn is_abort(&self) -> bool {
        *self == Flow::Abort
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Query,
    PreInsert,
    Insert,
    PostInsert,
    PreUpdate,
    Update,
    PostUpdate,
    PreDelete,
    PostDelete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connect => "orm.connect",
            EventKind::Query => "orm.query",
            EventKind::PreInsert => "orm.pre_insert",
            EventKind::Insert => "orm.insert",
            EventKind::PostInsert => "orm.post_insert",
            EventKind::PreUpdate => "orm.pre_update",
            EventKind::Update => "orm.update",
            EventKind::PostUpdate => "orm.post_update",
            EventKind::PreDelete => "orm.pre_delete",
            EventKind::PostDelete => "orm.post_delete",
        }
    }

    /// Whether a listener can cancel the operation by returning [`Flow::Abort`].
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            EventKind::PreInsert
                | EventKind::Insert
                | EventKind::PreUpdate
                | EventKind::Update
                | EventKind::PreDelete
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ConnectEvent {
    pub driver: &'static str,
    pub dsn: String,
}

#[derive(Debug, Clone)]
pub struct QueryEvent {
    pub sql: String,
    pub params: Vec<Value>,
    pub rows_affected: u64,
}

/// Carries the object being inserted and, from `orm.insert` on, the values about to be written.
pub struct InsertEvent<'a> {
    model: &'a mut dyn Persistent,
    values: ValueMap,
}

impl<'a> InsertEvent<'a> {
    pub fn new(model: &'a mut dyn Persistent, values: ValueMap) -> Self {
        Self { model, values }
    }
    pub fn model(&self) -> &dyn Persistent {
        &*self.model
    }
    pub fn model_mut(&mut self) -> &mut dyn Persistent {
        &mut *self.model
    }
    pub fn values(&self) -> &ValueMap {
        &self.values
    }
    pub fn values_mut(&mut self) -> &mut ValueMap {
        &mut self.values
    }
    /// Replaces the values that will be written.
    pub fn set_values(&mut self, values: ValueMap) {
        self.values = values;
    }
    pub fn into_values(self) -> ValueMap {
        self.values
    }
}

/// Carries the object being updated, the changed columns and their stored values.
pub struct UpdateEvent<'a> {
    model: &'a mut dyn Persistent,
    changed: ValueMap,
    original: ValueMap,
}

impl<'a> UpdateEvent<'a> {
    pub fn new(model: &'a mut dyn Persistent, changed: ValueMap, original: ValueMap) -> Self {
        Self {
            model,
            changed,
            original,
        }
    }
    pub fn model(&self) -> &dyn Persistent {
        &*self.model
    }
    pub fn model_mut(&mut self) -> &mut dyn Persistent {
        &mut *self.model
    }
    pub fn changed_values(&self) -> &ValueMap {
        &self.changed
    }
    pub fn changed_values_mut(&mut self) -> &mut ValueMap {
        &mut self.changed
    }
    pub fn original_values(&self) -> &ValueMap {
        &self.original
    }
    pub fn is_changed(&self, column: &str) -> bool {
        self.changed.contains_key(column)
    }
    /// Drops `column` from the update, the stored value is kept.
    pub fn restore(&mut self, column: &str) -> Option<Value> {
        self.changed.shift_remove(column)
    }
    /// Changed and original values.
    pub fn into_values(self) -> (ValueMap, ValueMap) {
        (self.changed, self.original)
    }
}

pub struct DeleteEvent<'a> {
    model: &'a mut dyn Persistent,
}

impl<'a> DeleteEvent<'a> {
    pub fn new(model: &'a mut dyn Persistent) -> Self {
        Self { model }
    }
    pub fn model(&self) -> &dyn Persistent {
        &*self.model
    }
    pub fn model_mut(&mut self) -> &mut dyn Persistent {
        &mut *self.model
    }
}

/// Observer of the connection activity. Every hook defaults to doing nothing.
pub trait Listener: Send + Sync {
    fn on_connect(&self, _event: &ConnectEvent) {}
    fn on_query(&self, _event: &QueryEvent) {}
    fn pre_insert(&self, _event: &mut InsertEvent<'_>) -> Flow {
        Flow::Continue
    }
    fn insert(&self, _event: &mut InsertEvent<'_>) -> Flow {
        Flow::Continue
    }
    fn post_insert(&self, _event: &mut InsertEvent<'_>) {}
    fn pre_update(&self, _event: &mut UpdateEvent<'_>) -> Flow {
        Flow::Continue
    }
    fn update(&self, _event: &mut UpdateEvent<'_>) -> Flow {
        Flow::Continue
    }
    fn post_update(&self, _event: &mut UpdateEvent<'_>) {}
    fn pre_delete(&self, _event: &mut DeleteEvent<'_>) -> Flow {
        Flow::Continue
    }
    fn post_delete(&self, _event: &mut DeleteEvent<'_>) {}
}

/// Ordered list of listeners, higher priorities are notified first.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    listeners: Vec<(i32, Arc<dyn Listener>)>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, priority: i32, listener: impl Listener + 'static) -> &mut Self {
        self.add_shared(priority, Arc::new(listener))
    }

    /// Listeners with the same priority keep their registration order.
    pub fn add_shared(&mut self, priority: i32, listener: Arc<dyn Listener>) -> &mut Self {
        let index = self
            .listeners
            .iter()
            .position(|(p, _)| *p < priority)
            .unwrap_or(self.listeners.len());
        self.listeners.insert(index, (priority, listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Calls `hook` on each listener until one aborts.
    pub fn cancellable(
        &self,
        kind: EventKind,
        mut hook: impl FnMut(&dyn Listener) -> Flow,
    ) -> Flow {
        for (priority, listener) in &self.listeners {
            if hook(listener.as_ref()).is_abort() {
                log::debug!("{} aborted by the listener with priority {}", kind, priority);
                return Flow::Abort;
            }
        }
        Flow::Continue
    }

    pub fn notify(&self, kind: EventKind, mut hook: impl FnMut(&dyn Listener)) {
        log::trace!("Dispatching {} to {} listeners", kind, self.listeners.len());
        for (_, listener) in &self.listeners {
            hook(listener.as_ref());
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field(
                "priorities",
                &self.listeners.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Forwards the lifecycle events to the [`Callbacks`](crate::Callbacks) of the object itself.
///
/// Not registered by default:
/// ```rust,ignore
/// connection.events_mut().add_listener(0, ModelCallbacks);
/// ```
#[derive(Default, Debug, Clone, Copy)]
pub struct ModelCallbacks;

impl Listener for ModelCallbacks {
    fn pre_insert(&self, event: &mut InsertEvent<'_>) -> Flow {
        event.model_mut().callback(EventKind::PreInsert)
    }
    fn post_insert(&self, event: &mut InsertEvent<'_>) {
        event.model_mut().callback(EventKind::PostInsert);
    }
    fn pre_update(&self, event: &mut UpdateEvent<'_>) -> Flow {
        event.model_mut().callback(EventKind::PreUpdate)
    }
    fn post_update(&self, event: &mut UpdateEvent<'_>) {
        event.model_mut().callback(EventKind::PostUpdate);
    }
    fn pre_delete(&self, event: &mut DeleteEvent<'_>) -> Flow {
        event.model_mut().callback(EventKind::PreDelete)
    }
    fn post_delete(&self, event: &mut DeleteEvent<'_>) {
        event.model_mut().callback(EventKind::PostDelete);
    }
}
