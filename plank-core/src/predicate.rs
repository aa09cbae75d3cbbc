use crate::{GenericSqlWriter, SqlWriter};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    And,
    Or,
}

impl Composition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Composition::And => "AND",
            Composition::Or => "OR",
        }
    }
}

/// Condition of a `WHERE` or `HAVING` clause.
///
/// A `Composite` with more than one part renders each part inside parentheses, a `Raw`
/// predicate is written verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Raw(String),
    Composite(Composition, Vec<Predicate>),
}

impl Predicate {
    pub fn raw(condition: impl Into<String>) -> Self {
        Predicate::Raw(condition.into())
    }

    pub fn all(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Composite(Composition::And, parts.into_iter().collect())
    }

    pub fn any(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Composite(Composition::Or, parts.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Predicate::Raw(v) => v.trim().is_empty(),
            Predicate::Composite(_, parts) => parts.iter().all(Predicate::is_empty),
        }
    }

    /// Appends `other` as flat text: `self AND other`. Nothing is parenthesized, mixing `AND`
    /// and `OR` follows the SQL operator precedence.
    pub fn append(self, composition: Composition, other: Predicate) -> Predicate {
        Predicate::Raw(format!("{} {} {}", self, composition.as_str(), other))
    }

    /// Adds `other` to the composite when it has the same composition, otherwise wraps both
    /// predicates in a new composite.
    pub fn compose(self, composition: Composition, other: Predicate) -> Predicate {
        match self {
            Predicate::Composite(current, mut parts) if current == composition => {
                parts.push(other);
                Predicate::Composite(current, parts)
            }
            current => Predicate::Composite(composition, vec![current, other]),
        }
    }
}

impl From<&str> for Predicate {
    fn from(value: &str) -> Self {
        Predicate::Raw(value.into())
    }
}

impl From<String> for Predicate {
    fn from(value: String) -> Self {
        Predicate::Raw(value)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        GenericSqlWriter::new().write_predicate(&mut out, self);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::{Composition, Predicate};

    #[test]
    fn flat_append() {
        let p = Predicate::raw("a = ?")
            .append(Composition::And, "b = ?".into())
            .append(Composition::Or, "c = ?".into());
        assert_eq!(p.to_string(), "a = ? AND b = ? OR c = ?");
    }

    #[test]
    fn composites() {
        let p = Predicate::raw("COUNT(*) > 1")
            .compose(Composition::And, "SUM(x) < 10".into())
            .compose(Composition::And, "MAX(y) = 3".into());
        assert_eq!(
            p.to_string(),
            "(COUNT(*) > 1) AND (SUM(x) < 10) AND (MAX(y) = 3)"
        );
        let p = p.compose(Composition::Or, "z".into());
        assert_eq!(
            p.to_string(),
            "((COUNT(*) > 1) AND (SUM(x) < 10) AND (MAX(y) = 3)) OR (z)"
        );
        assert_eq!(Predicate::all([Predicate::raw("a")]).to_string(), "a");
        assert!(Predicate::all([]).is_empty());
    }
}
