use std::fmt::{self, Display};

/// A table fragment with an optional alias, as it appears after `FROM` or `UPDATE`.
///
/// The name is written verbatim: it can be an already quoted identifier or any expression the
/// database accepts in that position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.filter(|v| !v.is_empty()),
        }
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " {}", alias)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPart {
    pub join: JoinType,
    pub table: TableRef,
    pub condition: String,
}

/// Sort fragment, the direction is written as given (`ASC` when not specified).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub sort: String,
    pub direction: String,
}
