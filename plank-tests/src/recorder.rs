use parking_lot::Mutex;
use plank::{
    ConnectEvent, DeleteEvent, EventKind, Flow, InsertEvent, Listener, QueryEvent, UpdateEvent,
};
use std::{collections::HashSet, sync::Arc};

/// Listener remembering the events it receives, optionally aborting some of them.
///
/// Clones share the same record.
#[derive(Default, Clone)]
pub struct EventRecorder {
    name: &'static str,
    events: Arc<Mutex<Vec<String>>>,
    abort: Arc<HashSet<EventKind>>,
}

impl EventRecorder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Records into the same list as `other`.
    pub fn sharing(name: &'static str, other: &EventRecorder) -> Self {
        Self {
            name,
            events: other.events.clone(),
            abort: Default::default(),
        }
    }

    pub fn abort_on(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.abort = Arc::new(kinds.into_iter().collect());
        self
    }

    /// Recorded entries: `<name> <event>` followed by the columns carried, if any.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Recorded event names, without the listener name and the columns.
    pub fn kinds(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| e.split(' ').nth(1).map(str::to_string))
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, kind: EventKind, columns: Option<Vec<&str>>) -> Flow {
        let mut entry = format!("{} {}", self.name, kind);
        if let Some(columns) = columns {
            entry.push(' ');
            entry.push_str(&columns.join(","));
        }
        self.events.lock().push(entry);
        if self.abort.contains(&kind) {
            Flow::Abort
        } else {
            Flow::Continue
        }
    }
}

impl Listener for EventRecorder {
    fn on_connect(&self, _event: &ConnectEvent) {
        self.record(EventKind::Connect, None);
    }
    fn on_query(&self, _event: &QueryEvent) {
        self.record(EventKind::Query, None);
    }
    fn pre_insert(&self, _event: &mut InsertEvent<'_>) -> Flow {
        self.record(EventKind::PreInsert, None)
    }
    fn insert(&self, event: &mut InsertEvent<'_>) -> Flow {
        let columns = event.values().keys().map(String::as_str).collect();
        self.record(EventKind::Insert, Some(columns))
    }
    fn post_insert(&self, _event: &mut InsertEvent<'_>) {
        self.record(EventKind::PostInsert, None);
    }
    fn pre_update(&self, _event: &mut UpdateEvent<'_>) -> Flow {
        self.record(EventKind::PreUpdate, None)
    }
    fn update(&self, event: &mut UpdateEvent<'_>) -> Flow {
        let columns = event.changed_values().keys().map(String::as_str).collect();
        self.record(EventKind::Update, Some(columns))
    }
    fn post_update(&self, _event: &mut UpdateEvent<'_>) {
        self.record(EventKind::PostUpdate, None);
    }
    fn pre_delete(&self, _event: &mut DeleteEvent<'_>) -> Flow {
        self.record(EventKind::PreDelete, None)
    }
    fn post_delete(&self, _event: &mut DeleteEvent<'_>) {
        self.record(EventKind::PostDelete, None);
    }
}
