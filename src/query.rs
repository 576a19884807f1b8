//! Executing statements and reading rows back by column name.
use std::sync::Arc;

use async_trait::async_trait;

use crate::cells::{Cell, FromCell};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::masking::mask_sensitive;

/// Outcome of a statement that returns no rows of interest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub message: String,
    pub rows_affected: usize,
}

/// Anything that can run SQL against Snowflake.
///
/// [`crate::Connection`] talks to the SQL REST API; tests substitute their own.
/// Dropping a returned future cancels the statement on the client side.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a statement that is not expected to return rows.
    async fn exec(&self, sql: &str) -> SnowflakeResult<ExecResult>;

    /// Run a statement and return every row it produced.
    async fn query(&self, sql: &str) -> SnowflakeResult<Rows>;
}

/// Reject empty statements and log the (masked) SQL under the calling function.
pub(crate) fn log_statement(function: &str, sql: &str) -> SnowflakeResult<()> {
    if sql.trim().is_empty() {
        return Err(SnowflakeError::EmptySql);
    }
    log::debug!("[{function}] sql: {}", mask_sensitive(sql));
    Ok(())
}

/// A result set with named columns.
#[derive(Clone, Debug, Default)]
pub struct Rows {
    columns: Arc<[String]>,
    rows: Vec<Vec<Cell>>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            columns: columns.into(),
            rows,
        }
    }

    /// Build a result set of text cells, as SHOW commands mostly return.
    pub fn from_text(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        Self::new(
            columns.iter().map(|c| (*c).to_owned()).collect(),
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|v| v.map_or(Cell::Null, |v| Cell::Varchar(v.to_owned())))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().map(|cells| Row {
            columns: self.columns.clone(),
            cells: cells.clone(),
        })
    }

    /// Decode every row.
    pub fn decode<T: FromRow>(&self) -> SnowflakeResult<Vec<T>> {
        self.iter().map(|row| T::from_row(&row)).collect()
    }
}

/// One row of a result set.
#[derive(Clone, Debug)]
pub struct Row {
    columns: Arc<[String]>,
    cells: Vec<Cell>,
}

impl Row {
    fn index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(column)))
    }

    pub fn cell(&self, column: &str) -> Option<&Cell> {
        self.index(column).and_then(|i| self.cells.get(i))
    }

    /// Read a column; NULL and absent columns are both `None`.
    pub fn get<T: FromCell>(&self, column: &str) -> SnowflakeResult<Option<T>> {
        match self.cell(column) {
            None | Some(Cell::Null) => Ok(None),
            Some(cell) => T::from_cell(cell.clone())
                .map(Some)
                .map_err(|message| SnowflakeError::decoding(column, message)),
        }
    }
}

/// Decoding of a row into a struct by column name.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> SnowflakeResult<Self>;
}

/// Implement [`FromRow`] for a struct of `Option` fields; a field reads the
/// column of the same name unless a column name is given.
macro_rules! impl_from_row {
    ($ty: ident { $($field: ident $(= $column: literal)?),* $(,)? }) => {
        impl $crate::query::FromRow for $ty {
            fn from_row(row: &$crate::query::Row) -> $crate::errors::SnowflakeResult<Self> {
                Ok(Self {
                    $($field: row.get($crate::query::impl_from_row!(@column $field $(, $column)?))?,)*
                })
            }
        }
    };
    (@column $field: ident) => { stringify!($field) };
    (@column $field: ident, $column: literal) => { $column };
}
pub(crate) use impl_from_row;

pub(crate) async fn exec(executor: &dyn Executor, sql: &str) -> SnowflakeResult<()> {
    executor.exec(sql).await.map(|_| ())
}

pub(crate) async fn query_all<T: FromRow>(executor: &dyn Executor, sql: &str) -> SnowflakeResult<Vec<T>> {
    executor.query(sql).await?.decode()
}

/// The first row, or [`SnowflakeError::ObjectNotFound`] when there is none.
pub(crate) async fn query_one<T: FromRow>(executor: &dyn Executor, sql: &str) -> SnowflakeResult<T> {
    let rows = executor.query(sql).await?;
    let first = match rows.iter().next() {
        Some(row) => T::from_row(&row),
        None => Err(SnowflakeError::ObjectNotFound),
    };
    first
}
