//! In-process record store
//!
//! Holds every table as a vector of JSON rows in insertion order. It honors
//! the full [`RecordStore`] contract, enforces the response ledger's
//! one-answer-per-question constraint the way a unique index would, and can
//! be told to fail specific requests so error paths can be exercised.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use itertools::Itertools;
use serde_json::Value;
use uuid::Uuid;

use super::{Direction, Embed, Filter, Operation, Query, RecordStore, Row, StoreError, Table};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<Table, Vec<Row>>,
    failing: HashSet<(Table, Operation)>,
}

/// A [`RecordStore`] backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

/// Columns that must be unique together, per table, besides `id`
fn unique_columns(table: Table) -> &'static [&'static str] {
    match table {
        Table::ChallengeResponses => &["challenge_id", "user_id", "question_id"],
        Table::QuizCompletions => &["user_id", "question_set"],
        Table::Profiles | Table::QuizQuestions | Table::Challenges => &[],
    }
}

/// Total order over JSON scalars: null, booleans, numbers, strings
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&b.as_f64().unwrap_or_default()),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every subsequent `operation` on `table` fail
    pub fn fail(&self, table: Table, operation: Operation) {
        self.lock().failing.insert((table, operation));
    }

    /// Undoes a previous [`fail`](Self::fail)
    pub fn recover(&self, table: Table, operation: Operation) {
        self.lock().failing.remove(&(table, operation));
    }

    /// Returns a copy of every row in `table`, in insertion order
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.lock().rows.get(&table).cloned().unwrap_or_default()
    }

    fn check(tables: &Tables, table: Table, operation: Operation) -> Result<(), StoreError> {
        if tables.failing.contains(&(table, operation)) {
            Err(StoreError::Unavailable(format!("{operation} on {table} failed")))
        } else {
            Ok(())
        }
    }

    fn embed(tables: &Tables, row: &Row, embed: &Embed) -> Value {
        let Some(key) = row.get(embed.column).filter(|v| !v.is_null()) else {
            return Value::Null;
        };

        tables
            .rows
            .get(&embed.table)
            .and_then(|rows| rows.iter().find(|r| r.get("id") == Some(key)))
            .map_or(Value::Null, |related| {
                Value::Object(
                    embed
                        .fields
                        .iter()
                        .filter_map(|f| related.get(*f).map(|v| ((*f).to_string(), v.clone())))
                        .collect(),
                )
            })
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let tables = self.lock();
        Self::check(&tables, query.table, Operation::Select)?;

        let matching = tables
            .rows
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .collect_vec()
            })
            .unwrap_or_default();

        let ordered = match &query.order {
            None => matching,
            Some(order) => {
                let key = |row: &Row| row.get(order.column).cloned().unwrap_or(Value::Null);
                matching
                    .into_iter()
                    .sorted_by(|a, b| {
                        let ordering = compare_values(&key(a), &key(b));
                        match order.direction {
                            Direction::Ascending => ordering,
                            Direction::Descending => ordering.reverse(),
                        }
                    })
                    .collect_vec()
            }
        };

        Ok(ordered
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|row| {
                let mut row = row.clone();
                for embed in &query.embeds {
                    let related = Self::embed(&tables, &row, embed);
                    row.insert(embed.alias.to_string(), related);
                }
                row
            })
            .collect())
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        let mut tables = self.lock();
        Self::check(&tables, table, Operation::Insert)?;

        if !row.get("id").is_some_and(|id| !id.is_null()) {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        let rows = tables.rows.entry(table).or_default();

        if rows.iter().any(|r| r.get("id") == row.get("id")) {
            return Err(StoreError::Rejected(format!("duplicate id in {table}")));
        }

        let unique = unique_columns(table);
        if !unique.is_empty()
            && rows
                .iter()
                .any(|r| unique.iter().all(|c| r.get(*c) == row.get(*c)))
        {
            return Err(StoreError::Rejected(format!(
                "duplicate ({}) in {table}",
                unique.join(", ")
            )));
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.lock();
        Self::check(&tables, table, Operation::Update)?;

        Ok(tables
            .rows
            .entry(table)
            .or_default()
            .iter_mut()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .map(|row| {
                row.extend(patch.clone());
                row.clone()
            })
            .collect())
    }
}
