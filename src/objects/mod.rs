//! One module per Snowflake object kind. Each exposes its option records, the
//! entity decoded from `SHOW`, and a client borrowed from [`crate::Client`].
pub mod common;

pub mod database;
pub mod database_role;
pub mod dynamic_table;
pub mod file_format;
pub mod function;
pub mod masking_policy;
pub mod network_policy;
pub mod pipe;
pub mod replication_connection;
pub mod resource_monitor;
pub mod role;
pub mod row_access_policy;
pub mod schema;
pub mod stream;
pub mod tag;
pub mod user;
pub mod warehouse;
