use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::builder::{Clause, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, parse_enum, sql_enum, starts_with, validate_filters, Identified, In, Like, LimitFrom,
};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

sql_enum!(RefreshMode {
    Auto => "AUTO",
    Incremental => "INCREMENTAL",
    Full => "FULL",
});

sql_enum!(Initialize {
    OnCreate => "ON_CREATE",
    OnSchedule => "ON_SCHEDULE",
});

sql_enum!(SchedulingState {
    Running => "RUNNING",
    Suspended => "SUSPENDED",
});

const TARGET_LAG_UNITS: &[&str] = &[
    "second", "seconds", "minute", "minutes", "hour", "hours", "day", "days",
];

/// How stale a dynamic table may get: `<n> <unit>` or `DOWNSTREAM`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetLag {
    Downstream,
    Lag { amount: u64, unit: String },
}

impl TargetLag {
    pub fn new(amount: u64, unit: impl Into<String>) -> Self {
        TargetLag::Lag {
            amount,
            unit: unit.into(),
        }
    }

    /// The value as written after `TARGET_LAG =`.
    fn to_sql(&self) -> String {
        match self {
            TargetLag::Downstream => "DOWNSTREAM".to_owned(),
            TargetLag::Lag { .. } => format!("'{self}'"),
        }
    }

    fn validate(&self) -> SnowflakeResult<()> {
        match self {
            TargetLag::Downstream => Ok(()),
            TargetLag::Lag { unit, .. } => {
                if TARGET_LAG_UNITS.contains(&unit.to_ascii_lowercase().as_str()) {
                    Ok(())
                } else {
                    Err(SnowflakeError::InvalidTargetLag("The unit is invalid"))
                }
            }
        }
    }
}

impl fmt::Display for TargetLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLag::Downstream => f.write_str("DOWNSTREAM"),
            TargetLag::Lag { amount, unit } => write!(f, "{amount} {unit}"),
        }
    }
}

impl FromStr for TargetLag {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("DOWNSTREAM") {
            return Ok(TargetLag::Downstream);
        }
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [amount, unit] = parts.as_slice() else {
            return Err(SnowflakeError::InvalidTargetLag("The string format is invalid"));
        };
        let amount = amount
            .parse()
            .map_err(|_| SnowflakeError::InvalidTargetLag("The number value is invalid"))?;
        let lag = TargetLag::new(amount, *unit);
        lag.validate()?;
        Ok(lag)
    }
}

#[derive(Clone, Debug)]
pub struct CreateDynamicTableOptions {
    pub or_replace: bool,
    pub target_lag: TargetLag,
    pub refresh_mode: Option<RefreshMode>,
    pub initialize: Option<Initialize>,
    pub warehouse: AccountObjectIdentifier,
    pub query: String,
    pub comment: Option<String>,
}

impl CreateDynamicTableOptions {
    pub fn new(target_lag: TargetLag, warehouse: AccountObjectIdentifier, query: impl Into<String>) -> Self {
        Self {
            or_replace: false,
            target_lag,
            refresh_mode: None,
            initialize: None,
            warehouse,
            query: query.into(),
            comment: None,
        }
    }
}

impl SqlStatement for CreateDynamicTableOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier(&self.warehouse)
            .nested(self.target_lag.validate())
            .check(self.query.trim().is_empty(), || {
                SnowflakeError::invalid_option("Query", "a query is required")
            });
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("DYNAMIC TABLE")
            .identifier(id)
            .number("TARGET_LAG", Some(self.target_lag.to_sql()))
            .enumeration("REFRESH_MODE", self.refresh_mode)
            .enumeration("INITIALIZE", self.initialize)
            .identifier_equals("WAREHOUSE", Some(&self.warehouse))
            .keyword("AS")
            .raw(&self.query)
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct DynamicTableSet {
    pub target_lag: Option<TargetLag>,
    pub warehouse: Option<AccountObjectIdentifier>,
}

impl Clause for DynamicTableSet {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.number("TARGET_LAG", self.target_lag.as_ref().map(TargetLag::to_sql))
            .identifier_equals("WAREHOUSE", self.warehouse.as_ref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterDynamicTableOptions {
    pub if_exists: bool,
    pub suspend: bool,
    pub resume: bool,
    pub refresh: bool,
    pub set: Option<DynamicTableSet>,
}

impl SqlStatement for AlterDynamicTableOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).exactly_one_of(&[
            ("Suspend", self.suspend),
            ("Resume", self.resume),
            ("Refresh", self.refresh),
            ("Set", self.set.is_some()),
        ]);
        if let Some(set) = &self.set {
            validator
                .identifier_opt(set.warehouse.as_ref())
                .at_least_one_of(&[
                    ("TargetLag", set.target_lag.is_some()),
                    ("Warehouse", set.warehouse.is_some()),
                ]);
            if let Some(lag) = &set.target_lag {
                validator.nested(lag.validate());
            }
        }
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER DYNAMIC TABLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .keyword_if(self.suspend, "SUSPEND")
            .keyword_if(self.resume, "RESUME")
            .keyword_if(self.refresh, "REFRESH")
            .nested(Some("SET"), self.set.as_ref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropDynamicTableOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropDynamicTableOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP DYNAMIC TABLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowDynamicTableOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
    pub starts_with: Option<String>,
    pub limit: Option<LimitFrom>,
}

impl SqlStatement for ShowDynamicTableOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW DYNAMIC TABLES")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
        starts_with(sql, self.starts_with.as_deref());
        sql.nested(None, self.limit.as_ref());
    }
}

#[derive(Debug, Default)]
struct DynamicTableRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    database_name: Option<String>,
    schema_name: Option<String>,
    cluster_by: Option<String>,
    rows: Option<i64>,
    bytes: Option<i64>,
    owner: Option<String>,
    target_lag: Option<String>,
    refresh_mode: Option<String>,
    refresh_mode_reason: Option<String>,
    warehouse: Option<String>,
    comment: Option<String>,
    text: Option<String>,
    automatic_clustering: Option<String>,
    scheduling_state: Option<String>,
    last_suspended_on: Option<DateTime<Utc>>,
    is_clone: Option<bool>,
    is_replica: Option<bool>,
    data_timestamp: Option<DateTime<Utc>>,
    owner_role_type: Option<String>,
}
impl_from_row!(DynamicTableRow {
    created_on,
    name,
    database_name,
    schema_name,
    cluster_by,
    rows,
    bytes,
    owner,
    target_lag,
    refresh_mode,
    refresh_mode_reason,
    warehouse,
    comment,
    text,
    automatic_clustering,
    scheduling_state,
    last_suspended_on,
    is_clone,
    is_replica,
    data_timestamp,
    owner_role_type,
});

/// A row of `SHOW DYNAMIC TABLES`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicTable {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub cluster_by: String,
    pub rows: i64,
    pub bytes: i64,
    pub owner: String,
    pub target_lag: Option<TargetLag>,
    pub refresh_mode: Option<RefreshMode>,
    pub refresh_mode_reason: String,
    pub warehouse: String,
    pub comment: String,
    pub text: String,
    pub automatic_clustering: bool,
    pub scheduling_state: Option<SchedulingState>,
    pub last_suspended_on: Option<DateTime<Utc>>,
    pub is_clone: bool,
    pub is_replica: bool,
    pub data_timestamp: Option<DateTime<Utc>>,
    pub owner_role_type: String,
}

impl TryFrom<DynamicTableRow> for DynamicTable {
    type Error = SnowflakeError;

    fn try_from(row: DynamicTableRow) -> SnowflakeResult<Self> {
        let target_lag = match row.target_lag.as_deref() {
            None | Some("") => None,
            Some(lag) => Some(lag.parse::<TargetLag>().map_err(|e: SnowflakeError| {
                SnowflakeError::decoding("target_lag", format!("{lag:?}: {e}"))
            })?),
        };
        Ok(DynamicTable {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            cluster_by: row.cluster_by.unwrap_or_default(),
            rows: row.rows.unwrap_or_default(),
            bytes: row.bytes.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            target_lag,
            refresh_mode: parse_enum("refresh_mode", row.refresh_mode)?,
            refresh_mode_reason: row.refresh_mode_reason.unwrap_or_default(),
            warehouse: row.warehouse.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            text: row.text.unwrap_or_default(),
            automatic_clustering: row
                .automatic_clustering
                .is_some_and(|value| value.eq_ignore_ascii_case("ON")),
            scheduling_state: parse_enum("scheduling_state", row.scheduling_state)?,
            last_suspended_on: row.last_suspended_on,
            is_clone: row.is_clone.unwrap_or_default(),
            is_replica: row.is_replica.unwrap_or_default(),
            data_timestamp: row.data_timestamp,
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        })
    }
}

impl Identified for DynamicTable {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Debug, Default)]
struct ColumnRow {
    name: Option<String>,
    kind_type: Option<String>,
    kind: Option<String>,
    nullable: Option<bool>,
    default: Option<String>,
    primary_key: Option<bool>,
    unique_key: Option<bool>,
    check: Option<String>,
    expression: Option<String>,
    comment: Option<String>,
    policy_name: Option<String>,
}
impl_from_row!(ColumnRow {
    name,
    kind_type = "type",
    kind,
    nullable = "null?",
    default,
    primary_key = "primary key",
    unique_key = "unique key",
    check,
    expression,
    comment,
    policy_name = "policy name",
});

/// One column of `DESCRIBE DYNAMIC TABLE`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicTableColumn {
    pub name: String,
    pub data_type: String,
    pub kind: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
    pub unique_key: bool,
    pub check: Option<String>,
    pub expression: Option<String>,
    pub comment: Option<String>,
    pub policy_name: Option<String>,
}

impl From<ColumnRow> for DynamicTableColumn {
    fn from(row: ColumnRow) -> Self {
        DynamicTableColumn {
            name: row.name.unwrap_or_default(),
            data_type: row.kind_type.unwrap_or_default(),
            kind: row.kind.unwrap_or_default(),
            nullable: row.nullable.unwrap_or_default(),
            default: row.default,
            primary_key: row.primary_key.unwrap_or_default(),
            unique_key: row.unique_key.unwrap_or_default(),
            check: row.check,
            expression: row.expression,
            comment: row.comment,
            policy_name: row.policy_name,
        }
    }
}

pub struct DynamicTables<'a> {
    executor: &'a dyn Executor,
}

impl<'a> DynamicTables<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&CreateDynamicTableOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&AlterDynamicTableOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&DropDynamicTableOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropDynamicTableOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowDynamicTableOptions>) -> SnowflakeResult<Vec<DynamicTable>> {
        let default = ShowDynamicTableOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<DynamicTableRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(DynamicTable::try_from).collect()
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<DynamicTable> {
        let tables = self
            .show(Some(&ShowDynamicTableOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
                ..ShowDynamicTableOptions::default()
            }))
            .await?;
        find_by_id(tables, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Vec<DynamicTableColumn>> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE DYNAMIC TABLE {}", id.fully_qualified_name());
        let rows: Vec<ColumnRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(DynamicTableColumn::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("db", "schema", "dynamic-table")
    }

    #[test]
    fn create_puts_the_comment_after_the_query() {
        let opts = CreateDynamicTableOptions {
            or_replace: true,
            comment: Some("c".into()),
            ..CreateDynamicTableOptions::new(
                TargetLag::new(1, "minutes"),
                AccountObjectIdentifier::new("warehouse_name"),
                "SELECT product_id, product_name FROM staging_table",
            )
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE DYNAMIC TABLE "db"."schema"."dynamic-table" TARGET_LAG = '1 minutes' WAREHOUSE = "warehouse_name" AS SELECT product_id, product_name FROM staging_table COMMENT = 'c'"#
        );
    }

    #[test]
    fn downstream_lag_is_unquoted() {
        let opts = CreateDynamicTableOptions {
            refresh_mode: Some(RefreshMode::Incremental),
            initialize: Some(Initialize::OnSchedule),
            ..CreateDynamicTableOptions::new(
                TargetLag::Downstream,
                AccountObjectIdentifier::new("wh"),
                "SELECT 1",
            )
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE DYNAMIC TABLE "db"."schema"."dynamic-table" TARGET_LAG = DOWNSTREAM REFRESH_MODE = INCREMENTAL INITIALIZE = ON_SCHEDULE WAREHOUSE = "wh" AS SELECT 1"#
        );
    }

    #[test]
    fn alter_allows_exactly_one_action() {
        let opts = AlterDynamicTableOptions {
            suspend: true,
            resume: true,
            ..AlterDynamicTableOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap_err().to_string(),
            "exactly one of Suspend, Resume, Refresh, Set must be set"
        );
        let set = AlterDynamicTableOptions {
            set: Some(DynamicTableSet {
                target_lag: Some(TargetLag::new(5, "minutes")),
                warehouse: Some(AccountObjectIdentifier::new("wh2")),
            }),
            ..AlterDynamicTableOptions::default()
        };
        assert_eq!(
            set.to_sql(&id()).unwrap(),
            r#"ALTER DYNAMIC TABLE "db"."schema"."dynamic-table" SET TARGET_LAG = '5 minutes' WAREHOUSE = "wh2""#
        );
    }

    #[test]
    fn target_lag_validation() {
        assert_eq!("1 minutes".parse::<TargetLag>().unwrap(), TargetLag::new(1, "minutes"));
        assert_eq!("DOWNSTREAM".parse::<TargetLag>().unwrap(), TargetLag::Downstream);
        let message = |s: &str| s.parse::<TargetLag>().unwrap_err().to_string();
        assert_eq!(message("1minutes"), "The string format is invalid");
        assert_eq!(message("no minutes"), "The number value is invalid");
        assert_eq!(message("1 year"), "The unit is invalid");
    }

    #[tokio::test]
    async fn show_by_id_decodes_states() {
        let rows = Rows::from_text(
            &[
                "name",
                "database_name",
                "schema_name",
                "target_lag",
                "refresh_mode",
                "scheduling_state",
                "automatic_clustering",
            ],
            vec![vec![
                Some("dynamic-table"),
                Some("db"),
                Some("schema"),
                Some("1 minute"),
                Some("INCREMENTAL"),
                Some("SUSPENDED"),
                Some("OFF"),
            ]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let table = DynamicTables::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(
            executor.last(),
            r#"SHOW DYNAMIC TABLES LIKE 'dynamic-table' IN SCHEMA "db"."schema""#
        );
        assert_eq!(table.target_lag, Some(TargetLag::new(1, "minute")));
        assert_eq!(table.refresh_mode, Some(RefreshMode::Incremental));
        assert_eq!(table.scheduling_state, Some(SchedulingState::Suspended));
        assert!(!table.automatic_clustering);
    }

    #[tokio::test]
    async fn unknown_refresh_mode_is_a_decoding_error() {
        let rows = Rows::from_text(&["name", "refresh_mode"], vec![vec![Some("t"), Some("LAZY")]]);
        let executor = RecordingExecutor::new().respond(rows);
        let err = DynamicTables::new(&executor).show(None).await.unwrap_err();
        assert!(matches!(err, SnowflakeError::Decoding { ref column, .. } if column == "refresh_mode"));
    }

    #[tokio::test]
    async fn describe_reads_columns() {
        let rows = Rows::from_text(
            &["name", "type", "kind", "null?", "primary key", "unique key", "default"],
            vec![vec![
                Some("PRODUCT_ID"),
                Some("NUMBER(38,0)"),
                Some("COLUMN"),
                Some("Y"),
                Some("N"),
                Some("N"),
                None,
            ]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let columns = DynamicTables::new(&executor).describe(&id()).await.unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].data_type, "NUMBER(38,0)");
        assert!(columns[0].nullable);
        assert!(!columns[0].primary_key);
        assert_eq!(columns[0].default, None);
    }
}
