//! A typed SDK for managing Snowflake objects over the SQL REST API.
//!
//! Callers describe the object they want with an identifier and an options record;
//! the SDK validates the record, renders it to DDL in field order and runs it on a
//! single shared [`Connection`]. Reads decode `SHOW` and `DESCRIBE` output into
//! entities.
//!
//! Example usage:
//!
//! ```rust,no_run
//! use light_snowflake_sdk::objects::warehouse::{CreateWarehouseOptions, WarehouseSize};
//! use light_snowflake_sdk::{AccountObjectIdentifier, Client, ClientConfig, SnowflakeError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SnowflakeError> {
//!     let config = ClientConfig {
//!         account: Some("ORG-ACCOUNT".into()),
//!         user: Some("USER".into()),
//!         private_key: Some(std::fs::read_to_string("rsa_key.p8")?),
//!         ..ClientConfig::default()
//!     };
//!     let client = Client::new(Some(config))?;
//!
//!     let id = AccountObjectIdentifier::new("REPORTING_WH");
//!     let opts = CreateWarehouseOptions {
//!         if_not_exists: true,
//!         warehouse_size: Some(WarehouseSize::XSmall),
//!         auto_suspend: Some(60),
//!         ..CreateWarehouseOptions::default()
//!     };
//!     client.warehouses().create(&id, Some(&opts)).await?;
//!
//!     let warehouse = client.warehouses().show_by_id(&id).await?;
//!     println!("{} is {:?}", warehouse.name, warehouse.size);
//!
//!     client.close().await
//! }
//! ```
//!
//! Every executed statement is logged at debug level through the `log` facade,
//! with secrets masked.
pub mod builder;
mod cells;
mod client;
mod config;
mod connection;
mod data_types;
mod errors;
pub mod identifiers;
mod jwt;
#[cfg(test)]
#[cfg(feature = "live-tests")]
mod live_tests;
mod masking;
pub mod objects;
mod partition;
mod query;
mod statement;
#[cfg(test)]
mod testing;
pub mod validation;

pub use cells::{Cell, FromCell};
pub use client::Client;
pub use config::{Authenticator, ClientConfig};
pub use connection::{Connection, DEFAULT_STATEMENT_TIMEOUT_SECS};
pub use data_types::DataType;
pub use errors::{SnowflakeError, SnowflakeResult};
pub use identifiers::{
    AccountIdentifier, AccountObjectIdentifier, AnyObjectIdentifier, DatabaseObjectIdentifier,
    ExternalObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier,
    SchemaObjectIdentifierWithArguments,
};
pub use jwt_simple;
pub use masking::mask_sensitive;
pub use partition::Partition;
pub use query::{ExecResult, Executor, FromRow, Row, Rows};
pub use statement::{ColumnType, QueryResponse, Statement};
