use convert_case::{Case, Casing};
use std::fmt;

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Table name derived from a Rust type name: the last path segment, without generic arguments,
/// in snake case (`app::model::UserAccount<T>` becomes `user_account`).
pub fn table_name_of(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    let name = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics);
    let mut name = name.to_case(Case::Snake);
    if name.starts_with('_') {
        name.remove(0);
    }
    name
}

/// Key used to match method names regardless of case and of the naming convention: `getFullName`,
/// `get_full_name` and `GETFULLNAME` all map to `getfullname`.
pub fn method_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Query text shortened to at most 497 bytes (cut on a character boundary) for messages.
pub struct TruncateLong<'a>(&'a str);

impl<'a> TruncateLong<'a> {
    pub const LIMIT: usize = 497;

    pub fn new(text: &'a str) -> Self {
        Self(text)
    }
}

impl fmt::Display for TruncateLong<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0;
        if text.len() <= Self::LIMIT {
            return f.write_str(text);
        }
        let mut end = Self::LIMIT;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        write!(f, "{}...", text[..end].trim_end())
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::TruncateLong::new(::std::convert::AsRef::<str>::as_ref(&$query))
    };
}

#[cfg(test)]
mod tests {
    use super::{method_key, separated_by, table_name_of};
    use crate::truncate_long;

    #[test]
    fn table_names() {
        assert_eq!(table_name_of("User"), "user");
        assert_eq!(table_name_of("app::model::UserAccount"), "user_account");
        assert_eq!(table_name_of("app::Wrapper<app::Inner>"), "wrapper");
        assert_eq!(table_name_of("_Hidden"), "hidden");
    }

    #[test]
    fn method_keys() {
        assert_eq!(method_key("getFullName"), "getfullname");
        assert_eq!(method_key("get_full_name"), "getfullname");
        assert_eq!(method_key("is_active"), method_key("isActive"));
    }

    #[test]
    fn separated() {
        let mut out = String::from("(");
        separated_by(&mut out, ["a", "", "b"], |out, v| out.push_str(v), ", ");
        assert_eq!(out, "(a, b");
    }

    #[test]
    fn truncated_on_char_boundary() {
        let short = "SELECT 1";
        assert_eq!(truncate_long!(short).to_string(), short);
        let query = format!("SELECT {}é FROM nowhere", "x".repeat(489));
        assert!(!query.is_char_boundary(497));
        let truncated = truncate_long!(query).to_string();
        assert_eq!(truncated, format!("SELECT {}...", "x".repeat(489)));
        let exact = "y".repeat(497);
        assert_eq!(truncate_long!(exact).to_string(), exact);
    }
}
