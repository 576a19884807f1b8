use std::collections::HashMap;
use std::sync::Arc;

use futures::{StreamExt, TryStream, TryStreamExt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cells::RawCell;
use crate::connection::Connection;
use crate::errors::{SnowflakeError, SnowflakeResult, SnowflakeWireResult};
use crate::partition::{Partition, StringTable};
use crate::query::ExecResult;

/// A single request to the SQL API (created by [`Connection::prepare`])
#[derive(Debug, Clone)]
pub struct Statement<'c> {
    wire: WireStatement,
    uuid: uuid::Uuid,
    connection: &'c Connection,
}

impl<'c> Statement<'c> {
    /// Usually you will want to use [`Connection::prepare`] instead of this method
    /// but the difference is merely ergonomic.
    pub fn new(sql: &str, connection: &'c Connection) -> Statement<'c> {
        let session = connection.session();
        Statement {
            wire: WireStatement {
                statement: sql.to_owned(),
                timeout: Some(session.timeout),
                database: session.database.clone(),
                schema: session.schema.clone(),
                warehouse: session.warehouse.clone(),
                role: session.role.clone(),
                parameters: session.parameters.clone(),
            },
            uuid: uuid::Uuid::new_v4(),
            connection,
        }
    }

    /// Set the Snowflake-side timeout for the statement
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Statement<'c> {
        self.wire.timeout = Some(timeout_seconds);
        self
    }

    async fn send(&self) -> SnowflakeResult<reqwest::Response> {
        log::trace!("request {} for statement with timeout {:?}", self.uuid, self.wire.timeout);
        let (token, token_type) = self.connection.authorization()?;
        Ok(self
            .connection
            .http()
            .post(format!(
                "{}/api/v2/statements?nullable=true&requestId={}",
                self.connection.base_url(),
                self.uuid
            ))
            .bearer_auth(token)
            .header("X-Snowflake-Authorization-Token-Type", token_type)
            .json(&self.wire)
            .send()
            .await?)
    }

    /// Execute SQL that returns a result set
    ///
    /// This supports multiple partitions, which are fetched lazily
    /// but the first partition is buffered immediately.
    pub async fn query(&self) -> SnowflakeResult<QueryResponse<'c>> {
        let response: WireQueryResponse = receive(self.send().await?).await?;
        Ok(response.hydrate(self.clone()))
    }

    /// Execute SQL that does not return a result set
    ///
    /// DDL reports its outcome as a one-cell result set; DML reports row counts.
    pub async fn exec(&self) -> SnowflakeResult<ExecResult> {
        let response: WireExecResponse = receive(self.send().await?).await?;
        let message = response
            .data
            .as_ref()
            .and_then(|data| data.first())
            .and_then(|row| row.first())
            .and_then(|cell| cell.clone())
            .unwrap_or(response.message);
        let rows_affected = response.stats.map_or(0, |stats| {
            stats.rows_inserted + stats.rows_deleted + stats.rows_updated
        });
        Ok(ExecResult {
            message,
            rows_affected,
        })
    }
}

/// Decode a SQL API response body, turning error payloads into [`SnowflakeError::ServerError`].
async fn receive<T: DeserializeOwned>(response: reqwest::Response) -> SnowflakeResult<T> {
    let status = response.status();
    if status == StatusCode::ACCEPTED {
        // The statement outlived the synchronous window and is still running.
        return Err(SnowflakeError::UnsupportedFeature(
            "statements that are still running when the request returns",
        ));
    }
    let body = response.bytes().await?;
    if status.is_success() {
        return serde_json::from_slice::<SnowflakeWireResult<T>>(&body)?.into_result();
    }
    match serde_json::from_slice::<WireError>(&body) {
        Ok(error) => Err(SnowflakeError::ServerError {
            code: error.code,
            message: error.message,
        }),
        Err(_) => Err(SnowflakeError::ServerError {
            code: status.as_u16().to_string(),
            message: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

/// The result of SQL that returns rows
///
/// The first partition is included immediately,
/// but additional partitions are fetched lazily and incur additional IO.
#[derive(Debug)]
pub struct QueryResponse<'c> {
    result_set_meta_data: WireStatementMetaData,
    data: Arc<StringTable>,
    statement_status_url: String,
    statement: Statement<'c>,
}

impl QueryResponse<'_> {
    /// Get the number of rows across all partitions
    pub fn num_rows(&self) -> usize {
        self.result_set_meta_data.num_rows
    }

    pub fn num_partitions(&self) -> usize {
        self.result_set_meta_data.partition_info.len().max(1)
    }

    /// Column types in the result set
    pub fn column_types(&self) -> &[ColumnType] {
        &self.result_set_meta_data.row_type
    }

    /// Assert that there is only one partition and return it
    ///
    /// This never causes IO and can only error with [`SnowflakeError::MultiplePartitions`]
    pub fn only_partition(self) -> SnowflakeResult<Partition> {
        if self.num_partitions() != 1 {
            Err(SnowflakeError::MultiplePartitions)
        } else {
            Ok(Partition {
                index: 0,
                meta_data: self.result_set_meta_data.clone(),
                data: self.data.clone(),
            })
        }
    }

    /// Get a single partition from the response
    ///
    /// If this is the first partition, you get it immediately,
    /// otherwise it will incur an additional request to get the partition
    pub async fn partition(&self, index: usize) -> SnowflakeResult<Option<Partition>> {
        if index == 0 {
            Ok(Some(Partition {
                index,
                meta_data: self.result_set_meta_data.clone(),
                data: self.data.clone(),
            }))
        } else if index >= self.num_partitions() {
            Ok(None)
        } else {
            let connection = self.statement.connection;
            let url = connection.base_url().to_owned() + &self.statement_status_url;
            let (token, token_type) = connection.authorization()?;
            let response = connection
                .http()
                .get(&url)
                .query(&[("partition", index)])
                .bearer_auth(token)
                .header("X-Snowflake-Authorization-Token-Type", token_type)
                .send()
                .await?;
            let response: WirePartitionResponse = receive(response).await?;

            Ok(Some(Partition {
                index,
                meta_data: self.result_set_meta_data.clone(),
                data: response.data,
            }))
        }
    }

    /// Stream over all partitions in the response
    ///
    /// One partition is buffered, so one can be in flight while another is processed.
    pub fn partitions(&self) -> impl TryStream<Ok = Partition, Error = SnowflakeError> + '_ {
        let partition_futures = (0..self.num_partitions()).map(|index| self.partition(index));
        futures::stream::iter(partition_futures)
            .buffered(1)
            .map(|partition| {
                partition?.ok_or(SnowflakeError::UnsupportedFeature("missing result partition"))
            })
    }

    /// Concatenate all partitions into a single partition
    ///
    /// This could use an unbounded amount of memory.
    pub async fn concat_partitions(&self) -> SnowflakeResult<Partition> {
        if self.num_partitions() == 1 {
            return Ok(Partition {
                index: 0,
                meta_data: self.result_set_meta_data.clone(),
                data: self.data.clone(),
            });
        }
        let mut cells = Vec::with_capacity(self.num_rows());
        for partition in self.partitions().try_collect::<Vec<_>>().await? {
            cells.extend(partition.data.iter().cloned());
        }
        Ok(Partition {
            index: 0,
            meta_data: self.result_set_meta_data.clone(),
            data: Arc::new(cells),
        })
    }
}

//
// Wire types
//

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireStatementMetaData {
    #[serde(default)]
    pub num_rows: usize,
    pub row_type: Vec<ColumnType>,
    // Only the number of partitions matters
    #[serde(default)]
    pub partition_info: Vec<WirePartitionInfo>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct WirePartitionInfo {}

/// The type of a column in the result set
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ColumnType {
    /// The name of the column
    pub name: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    pub precision: Option<u32>,
    /// The length of the column in bytes
    pub byte_length: Option<usize>,
    #[serde(rename = "type")]
    /// The format used when serializing the type to String before returning it
    pub data_type: RawCell,
    pub scale: Option<i32>,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Deserialize, Debug)]
struct WireChanges {
    #[serde(rename = "numRowsInserted", default)]
    rows_inserted: usize,
    #[serde(rename = "numRowsDeleted", default)]
    rows_deleted: usize,
    #[serde(rename = "numRowsUpdated", default)]
    rows_updated: usize,
}

#[derive(Deserialize, Debug)]
struct WireExecResponse {
    message: String,
    stats: Option<WireChanges>,
    data: Option<StringTable>,
}

#[derive(Deserialize, Debug)]
struct WireError {
    code: String,
    message: String,
}

impl WireQueryResponse {
    fn hydrate(self, statement: Statement<'_>) -> QueryResponse<'_> {
        QueryResponse {
            result_set_meta_data: self.result_set_meta_data,
            data: self.data,
            statement_status_url: self.statement_status_url,
            statement,
        }
    }
}

#[derive(Deserialize, Debug)]
struct WirePartitionResponse {
    data: Arc<StringTable>,
}

#[derive(Serialize, Debug, Clone)]
struct WireStatement {
    statement: String,
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    parameters: HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WireQueryResponse {
    result_set_meta_data: WireStatementMetaData,
    #[serde(default)]
    data: Arc<StringTable>,
    statement_status_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_carry_the_session() {
        let wire = WireStatement {
            statement: "SHOW DATABASES".into(),
            timeout: Some(60),
            database: Some("DB".into()),
            schema: None,
            warehouse: Some("WH".into()),
            role: None,
            parameters: HashMap::from([("QUERY_TAG".to_owned(), "sdk".to_owned())]),
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["database"], "DB");
        assert_eq!(json["parameters"]["QUERY_TAG"], "sdk");
        assert!(json.get("schema").is_none());
        assert!(json.get("role").is_none());
    }

    #[test]
    fn result_metadata_tolerates_missing_fields() {
        let meta: WireStatementMetaData = serde_json::from_str(
            r#"{"numRows": 1, "rowType": [{"name": "status", "type": "text", "nullable": true},
                                           {"name": "shape", "type": "geography"}]}"#,
        )
        .unwrap();
        assert_eq!(meta.row_type[0].data_type, RawCell::Text);
        assert_eq!(meta.row_type[1].data_type, RawCell::Other);
        assert!(meta.partition_info.is_empty());
    }
}
