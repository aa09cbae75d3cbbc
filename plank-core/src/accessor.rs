use crate::{Result, RowLabeled, TableDescriptor, Value, method_key};
use indexmap::IndexMap;
use std::{any, collections::HashMap, fmt};

/// Column name to value, in column order.
pub type ValueMap = IndexMap<String, Value>;

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;
type DynamicGetter<T> = Box<dyn Fn(&T, &str) -> Option<Value> + Send + Sync>;

struct FieldAccess<T> {
    get: Getter<T>,
    set: Setter<T>,
}

/// Registration table bridging the fields of `T` to column names.
///
/// Reading a column tries, in order: a visible field with that name, a method with that name,
/// `get<Name>`, `is<Name>` and finally the dynamic getter. Writing tries a visible field,
/// `set<Name>` and then forces the write on a hidden field. Method names are matched ignoring
/// case and underscores, so `getFullName` and `get_full_name` both serve the column
/// `full_name`.
///
/// A miss is not an error: the column is simply not populated.
///
/// ```rust
/// use plank_core::{Accessors, AsValue, Value};
///
/// #[derive(Default)]
/// struct User {
///     name: String,
///     active: bool,
/// }
///
/// let accessors = Accessors::<User>::new()
///     .hidden(
///         "name",
///         |u| u.name.clone().as_value(),
///         |u, v| Ok(u.name = String::try_from_value(v)?),
///     )
///     .method("isActive", |u| u.active.as_value());
/// let user = User { name: "Ann".into(), active: true };
/// assert_eq!(accessors.get(&user, "active"), Some(Value::Boolean(true)));
/// assert_eq!(accessors.get(&user, "name"), None);
/// ```
pub struct Accessors<T> {
    fields: HashMap<String, FieldAccess<T>>,
    hidden: HashMap<String, FieldAccess<T>>,
    methods: HashMap<String, Getter<T>>,
    setters: HashMap<String, Setter<T>>,
    dynamic: Option<DynamicGetter<T>>,
}

impl<T> Accessors<T> {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
            hidden: HashMap::new(),
            methods: HashMap::new(),
            setters: HashMap::new(),
            dynamic: None,
        }
    }

    /// Field reachable directly.
    pub fn field(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldAccess {
                get: Box::new(get),
                set: Box::new(set),
            },
        );
        self
    }

    /// Field reachable only by forcing the write (and by primary key reads).
    pub fn hidden(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.hidden.insert(
            name.into(),
            FieldAccess {
                get: Box::new(get),
                set: Box::new(set),
            },
        );
        self
    }

    /// Zero argument method, `name` is the full method name (`fullName`, `getEmail`, `is_active`).
    pub fn method(
        mut self,
        name: &str,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.methods.insert(method_key(name), Box::new(get));
        self
    }

    /// Setter method, `name` is the full method name (`setEmail`, `set_email`).
    pub fn setter(
        mut self,
        name: &str,
        set: impl Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.setters.insert(method_key(name), Box::new(set));
        self
    }

    /// Catch-all getter consulted when nothing else matches.
    pub fn dynamic(mut self, get: impl Fn(&T, &str) -> Option<Value> + Send + Sync + 'static) -> Self {
        self.dynamic = Some(Box::new(get));
        self
    }

    pub fn get(&self, object: &T, name: &str) -> Option<Value> {
        if let Some(field) = self.fields.get(name) {
            return Some((field.get)(object));
        }
        let key = method_key(name);
        if let Some(method) = self
            .methods
            .get(&key)
            .or_else(|| self.methods.get(&format!("get{key}")))
            .or_else(|| self.methods.get(&format!("is{key}")))
        {
            return Some(method(object));
        }
        self.dynamic.as_ref().and_then(|f| f(object, name))
    }

    /// Returns `Ok(false)` when no field or setter matches, conversion failures are errors.
    pub fn set(&self, object: &mut T, name: &str, value: Value) -> Result<bool> {
        let set = if let Some(field) = self.fields.get(name) {
            &field.set
        } else if let Some(setter) = self.setters.get(&format!("set{}", method_key(name))) {
            setter
        } else if let Some(field) = self.hidden.get(name) {
            &field.set
        } else {
            return Ok(false);
        };
        set(object, value).map_err(|e| {
            e.context(format!(
                "While setting `{}` on {}",
                name,
                any::type_name::<T>()
            ))
        })?;
        Ok(true)
    }

    /// Like [`Accessors::get`] but falls back to reading a hidden field.
    pub fn read(&self, object: &T, name: &str) -> Option<Value> {
        self.get(object, name)
            .or_else(|| self.hidden.get(name).map(|field| (field.get)(object)))
    }

    /// Values of all the columns of `table` that can be read from `object`.
    pub fn values(&self, object: &T, table: &TableDescriptor) -> ValueMap {
        table
            .columns
            .iter()
            .filter_map(|column| Some((column.clone(), self.get(object, column)?)))
            .collect()
    }

    pub fn primary_key(&self, object: &T, table: &TableDescriptor) -> Option<Value> {
        table
            .primary_key
            .as_deref()
            .and_then(|pk| self.read(object, pk))
    }

    /// Writes a generated key back, only for tables whose key is generated by the database.
    pub fn set_primary_key(&self, object: &mut T, table: &TableDescriptor, value: Value) -> Result<bool> {
        match &table.primary_key {
            Some(pk) if table.auto_increment => self.set(object, pk, value),
            _ => Ok(false),
        }
    }

    /// New object populated from the row, columns that cannot be written are skipped.
    pub fn hydrate(&self, row: &RowLabeled) -> Result<T>
    where
        T: Default,
    {
        let mut result = T::default();
        for (name, value) in row.iter() {
            if !self.set(&mut result, name, value.clone())? {
                log::trace!("Column `{}` is not mapped on {}", name, any::type_name::<T>());
            }
        }
        Ok(result)
    }
}

impl<T> Default for Accessors<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Accessors<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessors")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("hidden", &self.hidden.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .field("dynamic", &self.dynamic.is_some())
            .finish()
    }
}
