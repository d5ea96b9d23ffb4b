//! Generic record store contract
//!
//! The application never talks to a storage engine directly. It issues
//! per-table `select`, `insert` and `update` requests with simple equality
//! filters, ordering, limits and relation embedding, and gets rows of JSON
//! back. Any backend that can honor this contract (a hosted REST data API,
//! or the in-process [`MemoryStore`]) can drive the flows in this crate.

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;

pub use memory::MemoryStore;

/// A single record as exchanged with the store
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Tables the application reads and writes
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// User profiles
    #[display("profiles")]
    Profiles,
    /// Question source
    #[display("quiz_questions")]
    QuizQuestions,
    /// Challenge records
    #[display("challenges")]
    Challenges,
    /// Response ledger
    #[display("challenge_responses")]
    ChallengeResponses,
    /// Solo quiz award log
    #[display("quiz_completions")]
    QuizCompletions,
}

/// The kind of request, used for diagnostics and failure injection
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read rows
    #[display("select")]
    Select,
    /// Create a row
    #[display("insert")]
    Insert,
    /// Modify rows
    #[display("update")]
    Update,
}

/// Errors reported by a record store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or timed out
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store refused the request (constraint, permission, bad filter)
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// A row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals the value
    Eq(&'static str, serde_json::Value),
    /// Column differs from the value
    Neq(&'static str, serde_json::Value),
    /// At least one of the inner filters holds
    Any(Vec<Filter>),
}

impl Filter {
    /// Column equals `value`
    pub fn eq(column: &'static str, value: impl Into<serde_json::Value>) -> Self {
        Self::Eq(column, value.into())
    }

    /// Column differs from `value`
    pub fn neq(column: &'static str, value: impl Into<serde_json::Value>) -> Self {
        Self::Neq(column, value.into())
    }

    /// Whether `row` satisfies this filter
    ///
    /// A missing column compares as `null`.
    pub fn matches(&self, row: &Row) -> bool {
        let column_value =
            |column: &str| row.get(column).unwrap_or(&serde_json::Value::Null);
        match self {
            Self::Eq(column, value) => column_value(column) == value,
            Self::Neq(column, value) => column_value(column) != value,
            Self::Any(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// Ordering applied to a select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort by
    pub column: &'static str,
    /// Sort direction
    pub direction: Direction,
}

/// Embeds a related record, resolved through a foreign key column
///
/// The related row from `table` whose `id` equals the row's `column` value is
/// attached under `alias`, restricted to `fields`. A dangling or null key
/// embeds `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    /// Key under which the related record is attached
    pub alias: &'static str,
    /// Foreign key column on the selected table
    pub column: &'static str,
    /// Table holding the related record
    pub table: Table,
    /// Columns of the related record to include
    pub fields: &'static [&'static str],
}

/// A select request
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Table to read from
    pub table: Table,
    /// Conjunctive filters
    pub filters: Vec<Filter>,
    /// Optional ordering
    pub order: Option<Order>,
    /// Optional maximum number of rows
    pub limit: Option<usize>,
    /// Related records to attach
    pub embeds: Vec<Embed>,
}

impl Query {
    /// Selects every row of `table`
    pub fn from(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
            embeds: Vec::new(),
        }
    }

    /// Adds an equality filter
    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl Into<serde_json::Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Adds an inequality filter
    #[must_use]
    pub fn neq(mut self, column: &'static str, value: impl Into<serde_json::Value>) -> Self {
        self.filters.push(Filter::neq(column, value));
        self
    }

    /// Adds a disjunction of filters
    #[must_use]
    pub fn any(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::Any(filters));
        self
    }

    /// Orders the result
    #[must_use]
    pub fn order(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some(Order { column, direction });
        self
    }

    /// Limits the number of rows returned
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attaches a related record to each row
    #[must_use]
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }
}

/// A remote (or local) record store
///
/// Every call either returns data or a [`StoreError`]; there are no retries,
/// timeouts or cancellation at this layer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads rows matching `query`
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Inserts `row` into `table` and returns the stored row
    ///
    /// The store assigns an `id` when the row has none.
    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    /// Applies `patch` to every row of `table` matching all `filters`
    ///
    /// Returns the updated rows; an empty result means nothing matched.
    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError>;
}
