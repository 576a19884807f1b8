use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::builder::{Assignment, Clause, Quotes, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, parse_enum, set_tags, sql_enum, unset_tags, validate_filters, validate_tags,
    with_tags, Identified, Like, TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, query_one, Executor};
use crate::validation::{require, validate_identifier, Validator};

sql_enum!(WarehouseType {
    Standard => "STANDARD",
    SnowparkOptimized => "SNOWPARK-OPTIMIZED",
});

sql_enum!(ScalingPolicy {
    Standard => "STANDARD",
    Economy => "ECONOMY",
});

sql_enum!(WarehouseState {
    Started => "STARTED",
    Suspended => "SUSPENDED",
    Resizing => "RESIZING",
    Suspending => "SUSPENDING",
});

/// Warehouse sizes. SHOW reports them as `X-Small`, `2X-Large`, ... while DDL uses `XSMALL`, `XXLARGE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarehouseSize {
    XSmall,
    Small,
    Medium,
    Large,
    XLarge,
    XXLarge,
    XXXLarge,
    X4Large,
    X5Large,
    X6Large,
}

impl WarehouseSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseSize::XSmall => "XSMALL",
            WarehouseSize::Small => "SMALL",
            WarehouseSize::Medium => "MEDIUM",
            WarehouseSize::Large => "LARGE",
            WarehouseSize::XLarge => "XLARGE",
            WarehouseSize::XXLarge => "XXLARGE",
            WarehouseSize::XXXLarge => "XXXLARGE",
            WarehouseSize::X4Large => "X4LARGE",
            WarehouseSize::X5Large => "X5LARGE",
            WarehouseSize::X6Large => "X6LARGE",
        }
    }
}

impl AsRef<str> for WarehouseSize {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WarehouseSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WarehouseSize {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();
        Ok(match normalized.as_str() {
            "XSMALL" => WarehouseSize::XSmall,
            "SMALL" => WarehouseSize::Small,
            "MEDIUM" => WarehouseSize::Medium,
            "LARGE" => WarehouseSize::Large,
            "XLARGE" => WarehouseSize::XLarge,
            "XXLARGE" | "2XLARGE" | "X2LARGE" => WarehouseSize::XXLarge,
            "XXXLARGE" | "3XLARGE" | "X3LARGE" => WarehouseSize::XXXLarge,
            "X4LARGE" | "4XLARGE" => WarehouseSize::X4Large,
            "X5LARGE" | "5XLARGE" => WarehouseSize::X5Large,
            "X6LARGE" | "6XLARGE" => WarehouseSize::X6Large,
            _ => {
                return Err(SnowflakeError::invalid_option(
                    "WarehouseSize",
                    format!("unknown value {s:?}"),
                ))
            }
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct CreateWarehouseOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub warehouse_type: Option<WarehouseType>,
    pub warehouse_size: Option<WarehouseSize>,
    pub max_cluster_count: Option<i64>,
    pub min_cluster_count: Option<i64>,
    pub scaling_policy: Option<ScalingPolicy>,
    pub auto_suspend: Option<i64>,
    pub auto_resume: Option<bool>,
    pub initially_suspended: Option<bool>,
    pub resource_monitor: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
    pub enable_query_acceleration: Option<bool>,
    pub query_acceleration_max_scale_factor: Option<i64>,
    pub max_concurrency_level: Option<i64>,
    pub statement_queued_timeout_in_seconds: Option<i64>,
    pub statement_timeout_in_seconds: Option<i64>,
    pub tag: Vec<TagAssociation>,
}

fn validate_sizing(
    validator: &mut Validator,
    min_cluster_count: Option<i64>,
    max_cluster_count: Option<i64>,
    query_acceleration_max_scale_factor: Option<i64>,
) {
    validator
        .in_range("MinClusterCount", min_cluster_count, 1, 10)
        .in_range("MaxClusterCount", max_cluster_count, 1, 10)
        .in_range("QueryAccelerationMaxScaleFactor", query_acceleration_max_scale_factor, 0, 100);
    if let (Some(min), Some(max)) = (min_cluster_count, max_cluster_count) {
        validator.check(min > max, || {
            SnowflakeError::invalid_option("MinClusterCount", "must not exceed MaxClusterCount")
        });
    }
}

impl SqlStatement for CreateWarehouseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.resource_monitor.as_ref())
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validate_sizing(
            &mut validator,
            self.min_cluster_count,
            self.max_cluster_count,
            self.query_acceleration_max_scale_factor,
        );
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("WAREHOUSE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .parameter("WAREHOUSE_TYPE", self.warehouse_type, Quotes::Single, Assignment::Equals)
            .enumeration("WAREHOUSE_SIZE", self.warehouse_size)
            .number("MAX_CLUSTER_COUNT", self.max_cluster_count)
            .number("MIN_CLUSTER_COUNT", self.min_cluster_count)
            .enumeration("SCALING_POLICY", self.scaling_policy)
            .number("AUTO_SUSPEND", self.auto_suspend)
            .boolean("AUTO_RESUME", self.auto_resume)
            .boolean("INITIALLY_SUSPENDED", self.initially_suspended)
            .identifier_equals("RESOURCE_MONITOR", self.resource_monitor.as_ref())
            .text("COMMENT", self.comment.as_deref())
            .boolean("ENABLE_QUERY_ACCELERATION", self.enable_query_acceleration)
            .number(
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor,
            )
            .number("MAX_CONCURRENCY_LEVEL", self.max_concurrency_level)
            .number(
                "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS",
                self.statement_queued_timeout_in_seconds,
            )
            .number("STATEMENT_TIMEOUT_IN_SECONDS", self.statement_timeout_in_seconds);
        with_tags(sql, &self.tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct WarehouseSet {
    pub warehouse_type: Option<WarehouseType>,
    pub warehouse_size: Option<WarehouseSize>,
    pub wait_for_completion: Option<bool>,
    pub max_cluster_count: Option<i64>,
    pub min_cluster_count: Option<i64>,
    pub scaling_policy: Option<ScalingPolicy>,
    pub auto_suspend: Option<i64>,
    pub auto_resume: Option<bool>,
    pub resource_monitor: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
    pub enable_query_acceleration: Option<bool>,
    pub query_acceleration_max_scale_factor: Option<i64>,
    pub max_concurrency_level: Option<i64>,
    pub statement_queued_timeout_in_seconds: Option<i64>,
    pub statement_timeout_in_seconds: Option<i64>,
}

impl WarehouseSet {
    fn validate(&self) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier_opt(self.resource_monitor.as_ref())
            .at_least_one_of(&[
                ("WarehouseType", self.warehouse_type.is_some()),
                ("WarehouseSize", self.warehouse_size.is_some()),
                ("MaxClusterCount", self.max_cluster_count.is_some()),
                ("MinClusterCount", self.min_cluster_count.is_some()),
                ("ScalingPolicy", self.scaling_policy.is_some()),
                ("AutoSuspend", self.auto_suspend.is_some()),
                ("AutoResume", self.auto_resume.is_some()),
                ("ResourceMonitor", self.resource_monitor.is_some()),
                ("Comment", self.comment.is_some()),
                ("EnableQueryAcceleration", self.enable_query_acceleration.is_some()),
                (
                    "QueryAccelerationMaxScaleFactor",
                    self.query_acceleration_max_scale_factor.is_some(),
                ),
                ("MaxConcurrencyLevel", self.max_concurrency_level.is_some()),
                (
                    "StatementQueuedTimeoutInSeconds",
                    self.statement_queued_timeout_in_seconds.is_some(),
                ),
                ("StatementTimeoutInSeconds", self.statement_timeout_in_seconds.is_some()),
            ])
            .check(
                self.wait_for_completion.is_some() && self.warehouse_size.is_none(),
                || SnowflakeError::invalid_option("WaitForCompletion", "only applies when resizing"),
            );
        validate_sizing(
            &mut validator,
            self.min_cluster_count,
            self.max_cluster_count,
            self.query_acceleration_max_scale_factor,
        );
        validator.finish()
    }
}

impl Clause for WarehouseSet {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.parameter("WAREHOUSE_TYPE", self.warehouse_type, Quotes::Single, Assignment::Equals)
            .enumeration("WAREHOUSE_SIZE", self.warehouse_size)
            .boolean("WAIT_FOR_COMPLETION", self.wait_for_completion)
            .number("MAX_CLUSTER_COUNT", self.max_cluster_count)
            .number("MIN_CLUSTER_COUNT", self.min_cluster_count)
            .enumeration("SCALING_POLICY", self.scaling_policy)
            .number("AUTO_SUSPEND", self.auto_suspend)
            .boolean("AUTO_RESUME", self.auto_resume)
            .identifier_equals("RESOURCE_MONITOR", self.resource_monitor.as_ref())
            .text("COMMENT", self.comment.as_deref())
            .boolean("ENABLE_QUERY_ACCELERATION", self.enable_query_acceleration)
            .number(
                "QUERY_ACCELERATION_MAX_SCALE_FACTOR",
                self.query_acceleration_max_scale_factor,
            )
            .number("MAX_CONCURRENCY_LEVEL", self.max_concurrency_level)
            .number(
                "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS",
                self.statement_queued_timeout_in_seconds,
            )
            .number("STATEMENT_TIMEOUT_IN_SECONDS", self.statement_timeout_in_seconds);
    }
}

#[derive(Clone, Debug, Default)]
pub struct WarehouseUnset {
    pub warehouse_type: bool,
    pub warehouse_size: bool,
    pub max_cluster_count: bool,
    pub min_cluster_count: bool,
    pub scaling_policy: bool,
    pub auto_suspend: bool,
    pub auto_resume: bool,
    pub resource_monitor: bool,
    pub comment: bool,
    pub enable_query_acceleration: bool,
    pub query_acceleration_max_scale_factor: bool,
    pub max_concurrency_level: bool,
    pub statement_queued_timeout_in_seconds: bool,
    pub statement_timeout_in_seconds: bool,
}

impl WarehouseUnset {
    fn fields(&self) -> Vec<&'static str> {
        [
            (self.warehouse_type, "WAREHOUSE_TYPE"),
            (self.warehouse_size, "WAREHOUSE_SIZE"),
            (self.max_cluster_count, "MAX_CLUSTER_COUNT"),
            (self.min_cluster_count, "MIN_CLUSTER_COUNT"),
            (self.scaling_policy, "SCALING_POLICY"),
            (self.auto_suspend, "AUTO_SUSPEND"),
            (self.auto_resume, "AUTO_RESUME"),
            (self.resource_monitor, "RESOURCE_MONITOR"),
            (self.comment, "COMMENT"),
            (self.enable_query_acceleration, "ENABLE_QUERY_ACCELERATION"),
            (self.query_acceleration_max_scale_factor, "QUERY_ACCELERATION_MAX_SCALE_FACTOR"),
            (self.max_concurrency_level, "MAX_CONCURRENCY_LEVEL"),
            (self.statement_queued_timeout_in_seconds, "STATEMENT_QUEUED_TIMEOUT_IN_SECONDS"),
            (self.statement_timeout_in_seconds, "STATEMENT_TIMEOUT_IN_SECONDS"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

impl Clause for WarehouseUnset {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.comma_separated("UNSET", &self.fields());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterWarehouseOptions {
    pub if_exists: bool,
    pub suspend: bool,
    pub resume: bool,
    pub if_suspended: bool,
    pub abort_all_queries: bool,
    pub new_name: Option<AccountObjectIdentifier>,
    pub set: Option<WarehouseSet>,
    pub unset: Option<WarehouseUnset>,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
}

impl SqlStatement for AlterWarehouseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("Suspend", self.suspend),
                ("Resume", self.resume),
                ("AbortAllQueries", self.abort_all_queries),
                ("NewName", self.new_name.is_some()),
                ("Set", self.set.is_some()),
                ("Unset", self.unset.is_some()),
                ("SetTag", !self.set_tag.is_empty()),
                ("UnsetTag", !self.unset_tag.is_empty()),
            ])
            .check(self.if_suspended && !self.resume, || {
                SnowflakeError::invalid_option("IfSuspended", "only applies to Resume")
            });
        if let Some(set) = &self.set {
            validator.nested(set.validate());
        }
        if let Some(unset) = &self.unset {
            validator.check(unset.fields().is_empty(), || SnowflakeError::AtLeastOneOf {
                fields: vec!["Unset"],
            });
        }
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER WAREHOUSE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .keyword_if(self.suspend, "SUSPEND")
            .keyword_if(self.resume, "RESUME")
            .keyword_if(self.if_suspended, "IF SUSPENDED")
            .keyword_if(self.abort_all_queries, "ABORT ALL QUERIES")
            .identifier_after("RENAME TO", self.new_name.as_ref())
            .nested(Some("SET"), self.set.as_ref())
            .nested(None, self.unset.as_ref());
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropWarehouseOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropWarehouseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP WAREHOUSE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowWarehouseOptions {
    pub like: Option<Like>,
}

impl SqlStatement for ShowWarehouseOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), None)
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW WAREHOUSES").nested(None, self.like.as_ref());
    }
}

#[derive(Debug, Default)]
struct WarehouseRow {
    name: Option<String>,
    state: Option<String>,
    kind: Option<String>,
    size: Option<String>,
    min_cluster_count: Option<i64>,
    max_cluster_count: Option<i64>,
    started_clusters: Option<i64>,
    running: Option<i64>,
    queued: Option<i64>,
    is_default: Option<bool>,
    is_current: Option<bool>,
    auto_suspend: Option<i64>,
    auto_resume: Option<bool>,
    available: Option<f64>,
    provisioning: Option<f64>,
    quiescing: Option<f64>,
    other: Option<f64>,
    created_on: Option<DateTime<Utc>>,
    resumed_on: Option<DateTime<Utc>>,
    updated_on: Option<DateTime<Utc>>,
    owner: Option<String>,
    comment: Option<String>,
    enable_query_acceleration: Option<bool>,
    query_acceleration_max_scale_factor: Option<i64>,
    resource_monitor: Option<String>,
    scaling_policy: Option<String>,
    owner_role_type: Option<String>,
}
impl_from_row!(WarehouseRow {
    name,
    state,
    kind = "type",
    size,
    min_cluster_count,
    max_cluster_count,
    started_clusters,
    running,
    queued,
    is_default,
    is_current,
    auto_suspend,
    auto_resume,
    available,
    provisioning,
    quiescing,
    other,
    created_on,
    resumed_on,
    updated_on,
    owner,
    comment,
    enable_query_acceleration,
    query_acceleration_max_scale_factor,
    resource_monitor,
    scaling_policy,
    owner_role_type,
});

/// A row of `SHOW WAREHOUSES`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Warehouse {
    pub name: String,
    pub state: Option<WarehouseState>,
    pub warehouse_type: Option<WarehouseType>,
    pub size: Option<WarehouseSize>,
    pub min_cluster_count: i64,
    pub max_cluster_count: i64,
    pub started_clusters: i64,
    pub running: i64,
    pub queued: i64,
    pub is_default: bool,
    pub is_current: bool,
    /// `None` when the warehouse never suspends.
    pub auto_suspend: Option<i64>,
    pub auto_resume: bool,
    pub available: f64,
    pub provisioning: f64,
    pub quiescing: f64,
    pub other: f64,
    pub created_on: Option<DateTime<Utc>>,
    pub resumed_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub owner: String,
    pub comment: String,
    pub enable_query_acceleration: bool,
    pub query_acceleration_max_scale_factor: i64,
    pub resource_monitor: Option<AccountObjectIdentifier>,
    pub scaling_policy: Option<ScalingPolicy>,
    pub owner_role_type: String,
}

impl TryFrom<WarehouseRow> for Warehouse {
    type Error = SnowflakeError;

    fn try_from(row: WarehouseRow) -> SnowflakeResult<Self> {
        Ok(Warehouse {
            name: row.name.unwrap_or_default(),
            state: parse_enum("state", row.state)?,
            warehouse_type: parse_enum("type", row.kind)?,
            size: parse_enum("size", row.size)?,
            min_cluster_count: row.min_cluster_count.unwrap_or_default(),
            max_cluster_count: row.max_cluster_count.unwrap_or_default(),
            started_clusters: row.started_clusters.unwrap_or_default(),
            running: row.running.unwrap_or_default(),
            queued: row.queued.unwrap_or_default(),
            is_default: row.is_default.unwrap_or_default(),
            is_current: row.is_current.unwrap_or_default(),
            auto_suspend: row.auto_suspend,
            auto_resume: row.auto_resume.unwrap_or_default(),
            available: row.available.unwrap_or_default(),
            provisioning: row.provisioning.unwrap_or_default(),
            quiescing: row.quiescing.unwrap_or_default(),
            other: row.other.unwrap_or_default(),
            created_on: row.created_on,
            resumed_on: row.resumed_on,
            updated_on: row.updated_on,
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            enable_query_acceleration: row.enable_query_acceleration.unwrap_or_default(),
            query_acceleration_max_scale_factor: row
                .query_acceleration_max_scale_factor
                .unwrap_or_default(),
            resource_monitor: row
                .resource_monitor
                .filter(|monitor| !monitor.is_empty() && monitor != "null")
                .map(AccountObjectIdentifier::new),
            scaling_policy: parse_enum("scaling_policy", row.scaling_policy)?,
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        })
    }
}

impl Identified for Warehouse {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

/// A row of `DESCRIBE WAREHOUSE`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WarehouseDetails {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Default)]
struct WarehouseDetailsRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    kind: Option<String>,
}
impl_from_row!(WarehouseDetailsRow {
    created_on,
    name,
    kind,
});

pub struct Warehouses<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Warehouses<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&CreateWarehouseOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateWarehouseOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterWarehouseOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&DropWarehouseOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropWarehouseOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowWarehouseOptions>) -> SnowflakeResult<Vec<Warehouse>> {
        let default = ShowWarehouseOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<WarehouseRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(Warehouse::try_from).collect()
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Warehouse> {
        let warehouses = self
            .show(Some(&ShowWarehouseOptions {
                like: Some(Like::new(id.name())),
            }))
            .await?;
        find_by_id(warehouses, id)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<WarehouseDetails> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE WAREHOUSE {}", id.fully_qualified_name());
        let row: WarehouseDetailsRow = query_one(self.executor, &sql).await?;
        Ok(WarehouseDetails {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            kind: row.kind.unwrap_or_default(),
        })
    }

    pub async fn use_warehouse(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)?;
        exec(self.executor, &format!("USE WAREHOUSE {}", id.fully_qualified_name())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> AccountObjectIdentifier {
        AccountObjectIdentifier::new("wh")
    }

    #[test]
    fn create_renders_in_declaration_order() {
        let opts = CreateWarehouseOptions {
            or_replace: true,
            warehouse_type: Some(WarehouseType::SnowparkOptimized),
            warehouse_size: Some(WarehouseSize::Medium),
            max_cluster_count: Some(3),
            min_cluster_count: Some(1),
            scaling_policy: Some(ScalingPolicy::Economy),
            auto_suspend: Some(60),
            auto_resume: Some(true),
            initially_suspended: Some(true),
            resource_monitor: Some(AccountObjectIdentifier::new("rm")),
            comment: Some("c".into()),
            ..CreateWarehouseOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE WAREHOUSE "wh" WAREHOUSE_TYPE = 'SNOWPARK-OPTIMIZED' WAREHOUSE_SIZE = MEDIUM MAX_CLUSTER_COUNT = 3 MIN_CLUSTER_COUNT = 1 SCALING_POLICY = ECONOMY AUTO_SUSPEND = 60 AUTO_RESUME = true INITIALLY_SUSPENDED = true RESOURCE_MONITOR = "rm" COMMENT = 'c'"#
        );
    }

    #[test]
    fn cluster_counts_are_checked() {
        let opts = CreateWarehouseOptions {
            min_cluster_count: Some(4),
            max_cluster_count: Some(2),
            ..CreateWarehouseOptions::default()
        };
        assert!(matches!(opts.to_sql(&id()), Err(SnowflakeError::InvalidOption { .. })));
        let opts = CreateWarehouseOptions {
            max_cluster_count: Some(11),
            ..CreateWarehouseOptions::default()
        };
        assert!(opts.to_sql(&id()).is_err());
    }

    #[test]
    fn alter_resume_and_set() {
        let resume = AlterWarehouseOptions {
            resume: true,
            if_suspended: true,
            ..AlterWarehouseOptions::default()
        };
        assert_eq!(
            resume.to_sql(&id()).unwrap(),
            r#"ALTER WAREHOUSE "wh" RESUME IF SUSPENDED"#
        );
        let resize = AlterWarehouseOptions {
            set: Some(WarehouseSet {
                warehouse_size: Some(WarehouseSize::XXLarge),
                wait_for_completion: Some(true),
                ..WarehouseSet::default()
            }),
            ..AlterWarehouseOptions::default()
        };
        assert_eq!(
            resize.to_sql(&id()).unwrap(),
            r#"ALTER WAREHOUSE "wh" SET WAREHOUSE_SIZE = XXLARGE WAIT_FOR_COMPLETION = true"#
        );
        let unset = AlterWarehouseOptions {
            unset: Some(WarehouseUnset {
                auto_suspend: true,
                comment: true,
                ..WarehouseUnset::default()
            }),
            ..AlterWarehouseOptions::default()
        };
        assert_eq!(
            unset.to_sql(&id()).unwrap(),
            r#"ALTER WAREHOUSE "wh" UNSET AUTO_SUSPEND, COMMENT"#
        );
    }

    #[test]
    fn if_suspended_needs_resume() {
        let opts = AlterWarehouseOptions {
            suspend: true,
            if_suspended: true,
            ..AlterWarehouseOptions::default()
        };
        assert!(matches!(opts.to_sql(&id()), Err(SnowflakeError::InvalidOption { .. })));
    }

    #[test]
    fn sizes_parse_from_show_output() {
        assert_eq!("X-Small".parse::<WarehouseSize>().unwrap(), WarehouseSize::XSmall);
        assert_eq!("2X-Large".parse::<WarehouseSize>().unwrap(), WarehouseSize::XXLarge);
        assert_eq!("4X-Large".parse::<WarehouseSize>().unwrap(), WarehouseSize::X4Large);
        assert!("Huge".parse::<WarehouseSize>().is_err());
    }

    #[tokio::test]
    async fn show_decodes_enums() {
        let rows = Rows::from_text(
            &["name", "state", "type", "size", "auto_suspend", "scaling_policy", "resource_monitor"],
            vec![vec![
                Some("wh"),
                Some("SUSPENDED"),
                Some("STANDARD"),
                Some("X-Small"),
                None,
                Some("STANDARD"),
                Some("null"),
            ]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let warehouse = Warehouses::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(warehouse.state, Some(WarehouseState::Suspended));
        assert_eq!(warehouse.size, Some(WarehouseSize::XSmall));
        assert_eq!(warehouse.auto_suspend, None);
        assert_eq!(warehouse.resource_monitor, None);
    }

    #[tokio::test]
    async fn unknown_enum_values_fail_decoding() {
        let rows = Rows::from_text(&["name", "state"], vec![vec![Some("wh"), Some("MELTING")]]);
        let executor = RecordingExecutor::new().respond(rows);
        let err = Warehouses::new(&executor).show(None).await.unwrap_err();
        assert!(matches!(err, SnowflakeError::Decoding { ref column, .. } if column == "state"));
    }
}
