use crate::ValueWrap;
use plank_core::{Prepared, Result, Value, truncate_long};
use std::{
    fmt::{self, Display},
    mem,
};

/// Statement text with its positional parameters, executed through the binary protocol when
/// parameters are bound.
#[derive(Debug, Clone)]
pub struct MySqlPrepared {
    pub(crate) sql: String,
    pub(crate) params: Vec<Value>,
}

impl MySqlPrepared {
    pub(crate) fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    pub(crate) fn take_params(&mut self) -> Result<Vec<mysql_async::Value>> {
        mem::take(&mut self.params)
            .into_iter()
            .map(|v| ValueWrap(v).try_into())
            .collect()
    }
}

impl Prepared for MySqlPrepared {
    fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.params.push(value.into());
        Ok(self)
    }
    fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.params.clear();
        Ok(self)
    }
    fn sql(&self) -> &str {
        &self.sql
    }
    fn parameters(&self) -> &[Value] {
        &self.params
    }
}

impl Display for MySqlPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))?;
        if !self.params.is_empty() {
            write!(f, " {:?}", self.params)?;
        }
        Ok(())
    }
}
