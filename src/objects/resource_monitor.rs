use std::fmt;

use chrono::{DateTime, Utc};

use crate::builder::{quote_string, Assignment, Clause, Quotes, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier};
use crate::objects::common::{
    find_by_id, parse_comma_separated, parse_enum, sql_enum, validate_filters, Identified, Like,
};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

sql_enum!(Frequency {
    Monthly => "MONTHLY",
    Daily => "DAILY",
    Weekly => "WEEKLY",
    Yearly => "YEARLY",
    Never => "NEVER",
});

sql_enum!(TriggerAction {
    Suspend => "SUSPEND",
    SuspendImmediate => "SUSPEND_IMMEDIATE",
    Notify => "NOTIFY",
});

/// `ON <threshold> PERCENT DO <action>`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub threshold: u32,
    pub action: TriggerAction,
}

impl Trigger {
    pub fn new(threshold: u32, action: TriggerAction) -> Self {
        Self { threshold, action }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ON {} PERCENT DO {}", self.threshold, self.action)
    }
}

/// When the monitor starts counting credits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartTimestamp {
    Immediately,
    At(String),
}

impl fmt::Display for StartTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartTimestamp::Immediately => f.write_str("IMMEDIATELY"),
            StartTimestamp::At(timestamp) => f.write_str(&quote_string(timestamp)),
        }
    }
}

/// The monitor properties shared by CREATE ... WITH and ALTER ... SET.
#[derive(Clone, Debug, Default)]
pub struct ResourceMonitorProperties {
    pub credit_quota: Option<u64>,
    pub frequency: Option<Frequency>,
    pub start_timestamp: Option<StartTimestamp>,
    pub end_timestamp: Option<String>,
    pub notify_users: Option<Vec<String>>,
}

impl ResourceMonitorProperties {
    fn is_empty(&self) -> bool {
        self.credit_quota.is_none()
            && self.frequency.is_none()
            && self.start_timestamp.is_none()
            && self.end_timestamp.is_none()
            && self.notify_users.is_none()
    }

    fn validate(&self, validator: &mut Validator) {
        validator.required_together(&[
            ("Frequency", self.frequency.is_some()),
            ("StartTimestamp", self.start_timestamp.is_some()),
        ]);
    }
}

impl Clause for ResourceMonitorProperties {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.number("CREDIT_QUOTA", self.credit_quota)
            .enumeration("FREQUENCY", self.frequency)
            .parameter(
                "START_TIMESTAMP",
                self.start_timestamp.as_ref(),
                Quotes::None,
                Assignment::Equals,
            )
            .text("END_TIMESTAMP", self.end_timestamp.as_deref())
            .list(
                "NOTIFY_USERS",
                self.notify_users.as_deref(),
                Quotes::Double,
                Assignment::Equals,
            );
    }
}

fn render_triggers(sql: &mut SqlBuilder, triggers: &[Trigger]) {
    if !triggers.is_empty() {
        let rendered = triggers
            .iter()
            .map(Trigger::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        sql.raw(&format!("TRIGGERS {rendered}"));
    }
}

fn validate_triggers(validator: &mut Validator, triggers: &[Trigger]) {
    let suspends = |action| triggers.iter().filter(|t| t.action == action).count();
    validator
        .check(suspends(TriggerAction::Suspend) > 1, || {
            SnowflakeError::invalid_option("Triggers", "at most one SUSPEND trigger is allowed")
        })
        .check(suspends(TriggerAction::SuspendImmediate) > 1, || {
            SnowflakeError::invalid_option(
                "Triggers",
                "at most one SUSPEND_IMMEDIATE trigger is allowed",
            )
        });
}

#[derive(Clone, Debug, Default)]
pub struct CreateResourceMonitorOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub with: Option<ResourceMonitorProperties>,
    pub triggers: Vec<Trigger>,
}

impl SqlStatement for CreateResourceMonitorOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        if let Some(with) = &self.with {
            with.validate(&mut validator);
        }
        validate_triggers(&mut validator, &self.triggers);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("RESOURCE MONITOR")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .nested(Some("WITH"), self.with.as_ref());
        render_triggers(sql, &self.triggers);
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterResourceMonitorOptions {
    pub if_exists: bool,
    pub set: Option<ResourceMonitorProperties>,
    pub triggers: Vec<Trigger>,
}

impl SqlStatement for AlterResourceMonitorOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).at_least_one_of(&[
            ("Set", self.set.as_ref().is_some_and(|set| !set.is_empty())),
            ("Triggers", !self.triggers.is_empty()),
        ]);
        if let Some(set) = &self.set {
            set.validate(&mut validator);
        }
        validate_triggers(&mut validator, &self.triggers);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER RESOURCE MONITOR")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .nested(Some("SET"), self.set.as_ref());
        render_triggers(sql, &self.triggers);
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropResourceMonitorOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropResourceMonitorOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP RESOURCE MONITOR")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowResourceMonitorOptions {
    pub like: Option<Like>,
}

impl SqlStatement for ShowResourceMonitorOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), None)
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW RESOURCE MONITORS").nested(None, self.like.as_ref());
    }
}

#[derive(Debug, Default)]
struct ResourceMonitorRow {
    name: Option<String>,
    credit_quota: Option<f64>,
    used_credits: Option<f64>,
    remaining_credits: Option<f64>,
    level: Option<String>,
    frequency: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    notify_at: Option<String>,
    suspend_at: Option<String>,
    suspend_immediately_at: Option<String>,
    created_on: Option<DateTime<Utc>>,
    owner: Option<String>,
    comment: Option<String>,
    notify_users: Option<String>,
}
impl_from_row!(ResourceMonitorRow {
    name,
    credit_quota,
    used_credits,
    remaining_credits,
    level,
    frequency,
    start_time,
    end_time,
    notify_at,
    suspend_at,
    suspend_immediately_at,
    created_on,
    owner,
    comment,
    notify_users,
});

/// A row of `SHOW RESOURCE MONITORS`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceMonitor {
    pub name: String,
    pub credit_quota: Option<f64>,
    pub used_credits: f64,
    pub remaining_credits: f64,
    pub level: String,
    pub frequency: Option<Frequency>,
    pub start_time: String,
    pub end_time: String,
    /// Thresholds rebuilt from the `notify_at`, `suspend_at` and `suspend_immediately_at` columns.
    pub triggers: Vec<Trigger>,
    pub created_on: Option<DateTime<Utc>>,
    pub owner: String,
    pub comment: String,
    pub notify_users: Vec<String>,
}

/// `50%,75%` → `[50, 75]`
fn parse_thresholds(column: &str, value: Option<&str>) -> SnowflakeResult<Vec<u32>> {
    value
        .map(parse_comma_separated)
        .unwrap_or_default()
        .iter()
        .map(|threshold| {
            threshold
                .trim_end_matches('%')
                .parse()
                .map_err(|_| SnowflakeError::decoding(column, format!("unexpected threshold {threshold:?}")))
        })
        .collect()
}

impl TryFrom<ResourceMonitorRow> for ResourceMonitor {
    type Error = SnowflakeError;

    fn try_from(row: ResourceMonitorRow) -> SnowflakeResult<Self> {
        let mut triggers = Vec::new();
        for (column, value, action) in [
            ("notify_at", &row.notify_at, TriggerAction::Notify),
            ("suspend_at", &row.suspend_at, TriggerAction::Suspend),
            (
                "suspend_immediately_at",
                &row.suspend_immediately_at,
                TriggerAction::SuspendImmediate,
            ),
        ] {
            for threshold in parse_thresholds(column, value.as_deref())? {
                triggers.push(Trigger::new(threshold, action));
            }
        }
        Ok(ResourceMonitor {
            name: row.name.unwrap_or_default(),
            credit_quota: row.credit_quota,
            used_credits: row.used_credits.unwrap_or_default(),
            remaining_credits: row.remaining_credits.unwrap_or_default(),
            level: row.level.unwrap_or_default(),
            frequency: parse_enum("frequency", row.frequency)?,
            start_time: row.start_time.unwrap_or_default(),
            end_time: row.end_time.unwrap_or_default(),
            triggers,
            created_on: row.created_on,
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            notify_users: row
                .notify_users
                .as_deref()
                .map(parse_comma_separated)
                .unwrap_or_default(),
        })
    }
}

impl Identified for ResourceMonitor {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

pub struct ResourceMonitors<'a> {
    executor: &'a dyn Executor,
}

impl<'a> ResourceMonitors<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&CreateResourceMonitorOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateResourceMonitorOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterResourceMonitorOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&DropResourceMonitorOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropResourceMonitorOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowResourceMonitorOptions>) -> SnowflakeResult<Vec<ResourceMonitor>> {
        let default = ShowResourceMonitorOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<ResourceMonitorRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(ResourceMonitor::try_from).collect()
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<ResourceMonitor> {
        let monitors = self
            .show(Some(&ShowResourceMonitorOptions {
                like: Some(Like::new(id.name())),
            }))
            .await?;
        find_by_id(monitors, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> AccountObjectIdentifier {
        AccountObjectIdentifier::new("monthly")
    }

    #[test]
    fn create_with_triggers() {
        let opts = CreateResourceMonitorOptions {
            or_replace: true,
            with: Some(ResourceMonitorProperties {
                credit_quota: Some(100),
                frequency: Some(Frequency::Monthly),
                start_timestamp: Some(StartTimestamp::Immediately),
                notify_users: Some(vec!["ALICE".into(), "BOB".into()]),
                ..ResourceMonitorProperties::default()
            }),
            triggers: vec![
                Trigger::new(50, TriggerAction::Notify),
                Trigger::new(100, TriggerAction::Suspend),
                Trigger::new(110, TriggerAction::SuspendImmediate),
            ],
            ..CreateResourceMonitorOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE RESOURCE MONITOR "monthly" WITH CREDIT_QUOTA = 100 FREQUENCY = MONTHLY START_TIMESTAMP = IMMEDIATELY NOTIFY_USERS = ("ALICE", "BOB") TRIGGERS ON 50 PERCENT DO NOTIFY ON 100 PERCENT DO SUSPEND ON 110 PERCENT DO SUSPEND_IMMEDIATE"#
        );
    }

    #[test]
    fn frequency_needs_a_start() {
        let opts = CreateResourceMonitorOptions {
            with: Some(ResourceMonitorProperties {
                frequency: Some(Frequency::Weekly),
                ..ResourceMonitorProperties::default()
            }),
            ..CreateResourceMonitorOptions::default()
        };
        assert!(matches!(opts.to_sql(&id()), Err(SnowflakeError::RequiredTogether { .. })));
    }

    #[test]
    fn alter_sets_quota_and_timestamps() {
        let opts = AlterResourceMonitorOptions {
            set: Some(ResourceMonitorProperties {
                credit_quota: Some(10),
                frequency: Some(Frequency::Daily),
                start_timestamp: Some(StartTimestamp::At("2030-01-01 00:00".into())),
                end_timestamp: Some("2031-01-01 00:00".into()),
                ..ResourceMonitorProperties::default()
            }),
            ..AlterResourceMonitorOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"ALTER RESOURCE MONITOR "monthly" SET CREDIT_QUOTA = 10 FREQUENCY = DAILY START_TIMESTAMP = '2030-01-01 00:00' END_TIMESTAMP = '2031-01-01 00:00'"#
        );
        assert!(matches!(
            AlterResourceMonitorOptions::default().to_sql(&id()),
            Err(SnowflakeError::AtLeastOneOf { .. })
        ));
    }

    #[test]
    fn duplicate_suspend_triggers_are_rejected() {
        let opts = AlterResourceMonitorOptions {
            triggers: vec![
                Trigger::new(90, TriggerAction::Suspend),
                Trigger::new(100, TriggerAction::Suspend),
            ],
            ..AlterResourceMonitorOptions::default()
        };
        assert!(matches!(opts.to_sql(&id()), Err(SnowflakeError::InvalidOption { .. })));
    }

    #[tokio::test]
    async fn show_rebuilds_triggers() {
        let rows = Rows::from_text(
            &[
                "name",
                "credit_quota",
                "frequency",
                "notify_at",
                "suspend_at",
                "suspend_immediately_at",
                "notify_users",
            ],
            vec![vec![
                Some("monthly"),
                Some("100.00"),
                Some("MONTHLY"),
                Some("50%,75%"),
                Some("100%"),
                None,
                Some("ALICE, BOB"),
            ]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let monitor = ResourceMonitors::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(monitor.credit_quota, Some(100.0));
        assert_eq!(monitor.frequency, Some(Frequency::Monthly));
        assert_eq!(
            monitor.triggers,
            vec![
                Trigger::new(50, TriggerAction::Notify),
                Trigger::new(75, TriggerAction::Notify),
                Trigger::new(100, TriggerAction::Suspend),
            ]
        );
        assert_eq!(monitor.notify_users, vec!["ALICE", "BOB"]);
    }
}
