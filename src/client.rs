//! The entry point: one connection shared by a client per object kind.
use std::fmt;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::errors::SnowflakeResult;
use crate::objects::database::Databases;
use crate::objects::database_role::DatabaseRoles;
use crate::objects::dynamic_table::DynamicTables;
use crate::objects::file_format::FileFormats;
use crate::objects::function::Functions;
use crate::objects::masking_policy::MaskingPolicies;
use crate::objects::network_policy::NetworkPolicies;
use crate::objects::pipe::Pipes;
use crate::objects::replication_connection::ReplicationConnections;
use crate::objects::resource_monitor::ResourceMonitors;
use crate::objects::role::Roles;
use crate::objects::row_access_policy::RowAccessPolicies;
use crate::objects::schema::Schemas;
use crate::objects::stream::Streams;
use crate::objects::tag::Tags;
use crate::objects::user::Users;
use crate::objects::warehouse::Warehouses;
use crate::query::{impl_from_row, query_one, ExecResult, Executor, Rows};

/// A Snowflake session plus typed clients for each object kind.
///
/// ```rust,no_run
/// use light_snowflake_sdk::{AccountObjectIdentifier, Client, SnowflakeError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), SnowflakeError> {
///     // Reads ~/.snowflake/config and SNOWFLAKE_* variables.
///     let client = Client::new(None)?;
///     let warehouse = client
///         .warehouses()
///         .show_by_id(&AccountObjectIdentifier::new("COMPUTE_WH"))
///         .await?;
///     println!("{} is {:?}", warehouse.name, warehouse.state);
///     client.close().await
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    executor: Arc<dyn Executor>,
    config: ClientConfig,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("account", &self.config.account_locator().ok())
            .field("user", &self.config.user)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct ContextRow {
    value: Option<String>,
}
impl_from_row!(ContextRow { value });

impl Client {
    /// Open a client. `None` reads the configuration from the credentials file
    /// and environment; explicit values take precedence over both.
    pub fn new(config: Option<ClientConfig>) -> SnowflakeResult<Client> {
        let config = ClientConfig::resolve(config)?;
        let connection = Connection::open(&config)?;
        Ok(Client {
            executor: Arc::new(connection),
            config,
        })
    }

    /// Run every statement through `executor` instead of a live connection.
    pub fn with_executor(executor: Arc<dyn Executor>) -> Client {
        Client {
            executor,
            config: ClientConfig::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn exec(&self, sql: &str) -> SnowflakeResult<ExecResult> {
        self.executor.exec(sql).await
    }

    pub async fn query(&self, sql: &str) -> SnowflakeResult<Rows> {
        self.executor.query(sql).await
    }

    async fn context_function(&self, function: &str) -> SnowflakeResult<String> {
        let sql = format!(r#"SELECT {function}() AS "value""#);
        let row: ContextRow = query_one(self.executor.as_ref(), &sql).await?;
        Ok(row.value.unwrap_or_default())
    }

    pub async fn current_account(&self) -> SnowflakeResult<String> {
        self.context_function("CURRENT_ACCOUNT").await
    }

    pub async fn current_role(&self) -> SnowflakeResult<String> {
        self.context_function("CURRENT_ROLE").await
    }

    pub async fn current_user(&self) -> SnowflakeResult<String> {
        self.context_function("CURRENT_USER").await
    }

    pub async fn current_database(&self) -> SnowflakeResult<String> {
        self.context_function("CURRENT_DATABASE").await
    }

    pub async fn current_schema(&self) -> SnowflakeResult<String> {
        self.context_function("CURRENT_SCHEMA").await
    }

    pub async fn current_warehouse(&self) -> SnowflakeResult<String> {
        self.context_function("CURRENT_WAREHOUSE").await
    }

    /// Release the connection. Clones of this client keep their own handle.
    pub async fn close(self) -> SnowflakeResult<()> {
        log::debug!("closing client");
        drop(self.executor);
        Ok(())
    }

    pub fn databases(&self) -> Databases<'_> {
        Databases::new(self.executor.as_ref())
    }

    pub fn database_roles(&self) -> DatabaseRoles<'_> {
        DatabaseRoles::new(self.executor.as_ref())
    }

    pub fn dynamic_tables(&self) -> DynamicTables<'_> {
        DynamicTables::new(self.executor.as_ref())
    }

    pub fn file_formats(&self) -> FileFormats<'_> {
        FileFormats::new(self.executor.as_ref())
    }

    pub fn functions(&self) -> Functions<'_> {
        Functions::new(self.executor.as_ref())
    }

    pub fn masking_policies(&self) -> MaskingPolicies<'_> {
        MaskingPolicies::new(self.executor.as_ref())
    }

    pub fn network_policies(&self) -> NetworkPolicies<'_> {
        NetworkPolicies::new(self.executor.as_ref())
    }

    pub fn pipes(&self) -> Pipes<'_> {
        Pipes::new(self.executor.as_ref())
    }

    pub fn replication_connections(&self) -> ReplicationConnections<'_> {
        ReplicationConnections::new(self.executor.as_ref())
    }

    pub fn resource_monitors(&self) -> ResourceMonitors<'_> {
        ResourceMonitors::new(self.executor.as_ref())
    }

    pub fn roles(&self) -> Roles<'_> {
        Roles::new(self.executor.as_ref())
    }

    pub fn row_access_policies(&self) -> RowAccessPolicies<'_> {
        RowAccessPolicies::new(self.executor.as_ref())
    }

    pub fn schemas(&self) -> Schemas<'_> {
        Schemas::new(self.executor.as_ref())
    }

    pub fn streams(&self) -> Streams<'_> {
        Streams::new(self.executor.as_ref())
    }

    pub fn tags(&self) -> Tags<'_> {
        Tags::new(self.executor.as_ref())
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self.executor.as_ref())
    }

    pub fn warehouses(&self) -> Warehouses<'_> {
        Warehouses::new(self.executor.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SnowflakeError;
    use crate::identifiers::AccountObjectIdentifier;
    use crate::testing::RecordingExecutor;

    #[tokio::test]
    async fn object_clients_share_the_executor() {
        let executor = Arc::new(RecordingExecutor::new());
        let client = Client::with_executor(executor.clone());
        client
            .databases()
            .drop(&AccountObjectIdentifier::new("db1"), None)
            .await
            .unwrap();
        client
            .roles()
            .use_role(&AccountObjectIdentifier::new("ANALYST"))
            .await
            .unwrap();
        assert_eq!(
            executor.statements(),
            vec![r#"DROP DATABASE "db1""#.to_owned(), r#"USE ROLE "ANALYST""#.to_owned()]
        );
    }

    #[tokio::test]
    async fn context_functions() {
        let executor = Arc::new(
            RecordingExecutor::new().respond(Rows::from_text(&["value"], vec![vec![Some("ACCOUNTADMIN")]])),
        );
        let client = Client::with_executor(executor.clone());
        assert_eq!(client.current_role().await.unwrap(), "ACCOUNTADMIN");
        assert_eq!(executor.last(), r#"SELECT CURRENT_ROLE() AS "value""#);
    }

    #[tokio::test]
    async fn context_function_without_rows_is_not_found() {
        let executor = Arc::new(RecordingExecutor::new().respond(Rows::from_text(&["value"], vec![])));
        let client = Client::with_executor(executor.clone());
        let err = client.current_role().await.unwrap_err();
        assert!(matches!(err, SnowflakeError::ObjectNotFound));
        assert_eq!(executor.last(), r#"SELECT CURRENT_ROLE() AS "value""#);
    }

    #[tokio::test]
    async fn empty_sql_is_refused() {
        let client = Client::with_executor(Arc::new(RecordingExecutor::new()));
        assert!(matches!(client.exec("  ").await, Err(SnowflakeError::EmptySql)));
        assert!(matches!(client.query("").await, Err(SnowflakeError::EmptySql)));
    }

    #[tokio::test]
    async fn close_consumes_the_client() {
        let client = Client::with_executor(Arc::new(RecordingExecutor::new()));
        client.close().await.unwrap();
    }
}
