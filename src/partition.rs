use std::sync::Arc;

use crate::cells::Cell;
use crate::errors::SnowflakeResult;
use crate::query::Rows;
use crate::statement::WireStatementMetaData;

pub type StringTable = Vec<Vec<Option<String>>>;

/// One chunk of a result set, as delivered by the SQL API.
#[derive(Debug)]
pub struct Partition {
    pub(crate) meta_data: WireStatementMetaData,
    pub(crate) data: Arc<StringTable>,
    pub(crate) index: usize,
}

impl Partition {
    /// Get the index of this partition
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the number of rows in just this partition
    /// This is obtained from data.len() rather than the metadata
    /// because this partition may have been constructed by concatenating
    pub fn num_rows(&self) -> usize {
        self.data.len()
    }

    /// Get the cells in this partition as strings just as they were returned from Snowflake
    pub fn raw_cells(&self) -> &[Vec<Option<String>>] {
        self.data.as_ref()
    }

    /// Convert the response into `Cell`s in a list of lists format
    pub fn cells(&self) -> SnowflakeResult<Vec<Vec<Cell>>> {
        self.data
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.meta_data.row_type)
                    .map(|(value, column)| column.data_type.to_cell(value))
                    .collect()
            })
            .collect()
    }

    /// Convert into named rows for decoding.
    pub fn into_rows(self) -> SnowflakeResult<Rows> {
        let cells = self.cells()?;
        let columns = self
            .meta_data
            .row_type
            .into_iter()
            .map(|column| column.name)
            .collect();
        Ok(Rows::new(columns, cells))
    }
}
