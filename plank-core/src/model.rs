use crate::{Accessors, EventKind, Flow, Result, Value, table_name_of};
use std::{
    any::{self, Any},
    borrow::Cow,
};

/// Object persisted as one row of a table.
///
/// Usually implemented with `#[derive(Model)]`, which builds the accessor table from the struct
/// fields. The table name defaults to the snake case of the type name.
pub trait Model: Callbacks + Default + Send + 'static {
    fn table_name() -> Cow<'static, str> {
        table_name_of(any::type_name::<Self>()).into()
    }

    fn accessors() -> &'static Accessors<Self>;
}

/// Hooks invoked on the object itself around its own persistence, once the
/// [`ModelCallbacks`](crate::ModelCallbacks) listener is registered.
///
/// Returning [`Flow::Abort`] from a `pre_*` hook cancels the operation.
pub trait Callbacks {
    fn pre_insert(&mut self) -> Flow {
        Flow::Continue
    }
    fn post_insert(&mut self) {}
    fn pre_update(&mut self) -> Flow {
        Flow::Continue
    }
    fn post_update(&mut self) {}
    fn pre_delete(&mut self) -> Flow {
        Flow::Continue
    }
    fn post_delete(&mut self) {}
}

/// Type erased view of a [`Model`], carried by the lifecycle events.
pub trait Persistent: Any + Send {
    fn table_name(&self) -> Cow<'static, str>;
    fn get(&self, name: &str) -> Option<Value>;
    fn set(&mut self, name: &str, value: Value) -> Result<bool>;
    /// Runs the object's own hook for `kind`, informational kinds always continue.
    fn callback(&mut self, kind: EventKind) -> Flow;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<M: Model> Persistent for M {
    fn table_name(&self) -> Cow<'static, str> {
        <M as Model>::table_name()
    }
    fn get(&self, name: &str) -> Option<Value> {
        M::accessors().read(self, name)
    }
    fn set(&mut self, name: &str, value: Value) -> Result<bool> {
        M::accessors().set(self, name, value)
    }
    fn callback(&mut self, kind: EventKind) -> Flow {
        match kind {
            EventKind::PreInsert => self.pre_insert(),
            EventKind::PostInsert => {
                self.post_insert();
                Flow::Continue
            }
            EventKind::PreUpdate => self.pre_update(),
            EventKind::PostUpdate => {
                self.post_update();
                Flow::Continue
            }
            EventKind::PreDelete => self.pre_delete(),
            EventKind::PostDelete => {
                self.post_delete();
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Persistent {
    pub fn downcast_ref<M: Model>(&self) -> Option<&M> {
        self.as_any().downcast_ref()
    }
    pub fn downcast_mut<M: Model>(&mut self) -> Option<&mut M> {
        self.as_any_mut().downcast_mut()
    }
}
