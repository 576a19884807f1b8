use chrono::{Datelike, Timelike};
use futures::TryStreamExt;

use crate::objects::database::{AlterDatabaseOptions, CreateDatabaseOptions, DatabaseSet, DropDatabaseOptions};
use crate::objects::warehouse::{CreateWarehouseOptions, WarehouseSize};
use crate::{AccountObjectIdentifier, Cell, Client, ClientConfig, Connection, SnowflakeResult};

/// Credentials come from the usual profile file and `SNOWFLAKE_*` variables, plus
/// a key pair read from `SNOWFLAKE_PRIVATE_KEY_PATH`.
fn live_config() -> ClientConfig {
    let _ = env_logger::try_init();
    let private_key = std::env::var("SNOWFLAKE_PRIVATE_KEY_PATH")
        .ok()
        .map(|path| std::fs::read_to_string(path).expect("failed to read key file"));
    ClientConfig::resolve(Some(ClientConfig {
        private_key,
        ..ClientConfig::default()
    }))
    .expect("invalid live test configuration")
}

fn live_client() -> Client {
    Client::new(Some(live_config())).expect("failed to open client")
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple()).to_uppercase()
}

#[tokio::test]
async fn can_login() -> SnowflakeResult<()> {
    let client = live_client();
    let rows = client.query("SELECT 1 AS ONE").await?;
    assert_eq!(rows.len(), 1);
    let row = rows.iter().next().expect("one row");
    assert_eq!(row.get::<i64>("ONE")?, Some(1));
    assert!(!client.current_role().await?.is_empty());
    client.close().await
}

#[tokio::test]
async fn can_query_many_types() -> SnowflakeResult<()> {
    let connection = Connection::open(&live_config())?;
    let result = connection
        .prepare(
            "SELECT 1,
            'foo',
            true,
            NULL,
            1.1,
            '666f6f'::binary,
            '2023-01-01 01:01:01'::timestamp_ntz,
            '2023-01-01'::date,
            '01:01:01'::time",
        )
        .query()
        .await?;
    let cells = result.only_partition()?.cells()?;
    assert_eq!(cells.len(), 1);
    assert!(matches!(cells[0][0], Cell::Int(1)));
    assert!(matches!(cells[0][1], Cell::Varchar(ref x) if x == "foo"));
    assert!(matches!(cells[0][2], Cell::Boolean(true)));
    assert!(matches!(cells[0][3], Cell::Null));
    assert!(matches!(cells[0][4], Cell::Float(x) if x > 1.0 && x < 1.2));
    assert!(matches!(cells[0][5], Cell::Binary(ref x) if x == b"foo"));
    assert!(matches!(cells[0][6],
        Cell::TimestampNtz(ref x)
        if x.year() == 2023 && x.hour() == 1 && x.second() == 1
    ));
    assert!(matches!(cells[0][7], Cell::Date(ref x) if x.day() == 1));
    assert!(matches!(cells[0][8], Cell::Time(ref x) if x.minute() == 1));
    Ok(())
}

#[tokio::test]
async fn can_stream_partitions() -> SnowflakeResult<()> {
    let connection = Connection::open(&live_config())?;
    let response = connection
        .prepare("SELECT seq4() AS ix FROM table(generator(rowcount => 100000))")
        .query()
        .await?;
    assert_eq!(response.num_rows(), 100000);
    assert!(response.num_partitions() > 1);
    let rows = response.concat_partitions().await?.into_rows()?;
    for (ix, row) in rows.iter().enumerate() {
        assert_eq!(row.get::<i64>("IX")?, Some(ix as i64));
    }
    response
        .partitions()
        .try_for_each(|partition| async move {
            assert!(partition.num_rows() > 0);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn database_lifecycle() -> SnowflakeResult<()> {
    let client = live_client();
    let id = AccountObjectIdentifier::new(unique_name("SDK_TEST_DB"));
    let databases = client.databases();
    databases
        .create(
            &id,
            Some(&CreateDatabaseOptions {
                transient: true,
                comment: Some("created by live tests".into()),
                ..CreateDatabaseOptions::default()
            }),
        )
        .await?;
    let database = databases.show_by_id(&id).await?;
    assert_eq!(database.comment, "created by live tests");

    databases
        .alter(
            &id,
            Some(&AlterDatabaseOptions {
                set: Some(DatabaseSet {
                    comment: Some("altered".into()),
                    ..DatabaseSet::default()
                }),
                ..AlterDatabaseOptions::default()
            }),
        )
        .await?;
    assert_eq!(databases.show_by_id(&id).await?.comment, "altered");

    databases
        .drop(
            &id,
            Some(&DropDatabaseOptions {
                if_exists: true,
                ..DropDatabaseOptions::default()
            }),
        )
        .await?;
    let err = databases.show_by_id(&id).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn warehouse_lifecycle() -> SnowflakeResult<()> {
    let client = live_client();
    let id = AccountObjectIdentifier::new(unique_name("SDK_TEST_WH"));
    let warehouses = client.warehouses();
    warehouses
        .create(
            &id,
            Some(&CreateWarehouseOptions {
                warehouse_size: Some(WarehouseSize::XSmall),
                initially_suspended: Some(true),
                auto_suspend: Some(60),
                ..CreateWarehouseOptions::default()
            }),
        )
        .await?;
    let warehouse = warehouses.show_by_id(&id).await?;
    assert_eq!(warehouse.size, Some(WarehouseSize::XSmall));
    assert_eq!(warehouse.auto_suspend, Some(60));
    warehouses.drop(&id, None).await
}
