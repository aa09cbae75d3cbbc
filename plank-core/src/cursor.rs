use crate::{Model, Result, Value, stream::{self, Stream}};
use std::{collections::VecDeque, sync::Arc};

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Materialized result of one statement.
///
/// Rows are consumed front to back by the `fetch*` methods. Modifying statements report the
/// number of rows affected and, for inserts into tables with a generated key, the new key.
#[derive(Default, Debug, Clone)]
pub struct Cursor {
    labels: RowNames,
    rows: VecDeque<Row>,
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

impl Cursor {
    pub fn new(labels: RowNames) -> Self {
        Self {
            labels,
            rows: VecDeque::new(),
            rows_affected: 0,
            last_insert_id: None,
        }
    }

    /// Result of a statement that returns no rows.
    pub fn affected(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
            ..Default::default()
        }
    }

    pub fn labels(&self) -> &RowNames {
        &self.labels
    }

    /// Appends a row, its length must match the labels.
    pub fn push(&mut self, row: Row) {
        debug_assert_eq!(row.len(), self.labels.len());
        self.rows.push_back(row);
    }

    /// Number of rows still to be fetched.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn fetch(&mut self) -> Option<RowLabeled> {
        self.rows
            .pop_front()
            .map(|values| RowLabeled::new(self.labels.clone(), values))
    }

    pub fn fetch_all(&mut self) -> Vec<RowLabeled> {
        let labels = &self.labels;
        self.rows
            .drain(..)
            .map(|values| RowLabeled::new(labels.clone(), values))
            .collect()
    }

    /// Hydrates the next row into a new `M`.
    pub fn fetch_model<M: Model>(&mut self) -> Result<Option<M>> {
        self.fetch()
            .map(|row| M::accessors().hydrate(&row))
            .transpose()
    }

    pub fn fetch_all_models<M: Model>(&mut self) -> Result<Vec<M>> {
        self.fetch_all()
            .iter()
            .map(|row| M::accessors().hydrate(row))
            .collect()
    }

    pub fn into_stream(mut self) -> impl Stream<Item = RowLabeled> + Send {
        stream::iter(self.fetch_all())
    }
}

impl Iterator for Cursor {
    type Item = RowLabeled;

    fn next(&mut self) -> Option<Self::Item> {
        self.fetch()
    }
}
