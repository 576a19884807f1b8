use chrono::{DateTime, Utc};

use crate::builder::{Clause, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{
    AccountIdentifier, AccountObjectIdentifier, ExternalObjectIdentifier, ObjectIdentifier,
    SchemaObjectIdentifier,
};
use crate::objects::common::{
    find_by_id, set_tags, starts_with, unset_tags, validate_filters, validate_tags, with_tags,
    Identified, LimitFrom, Like, TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

#[derive(Clone, Debug, Default)]
pub struct CreateDatabaseOptions {
    pub or_replace: bool,
    pub transient: bool,
    pub if_not_exists: bool,
    pub clone: Option<AccountObjectIdentifier>,
    pub data_retention_time_in_days: Option<i64>,
    pub max_data_extension_time_in_days: Option<i64>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
    pub tag: Vec<TagAssociation>,
}

impl SqlStatement for CreateDatabaseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.clone.as_ref())
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.transient, "TRANSIENT")
            .keyword("DATABASE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .identifier_after("CLONE", self.clone.as_ref())
            .number("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .number("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .text("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .text("COMMENT", self.comment.as_deref());
        with_tags(sql, &self.tag);
    }
}

/// `CREATE DATABASE ... FROM SHARE <provider>.<share>`
#[derive(Clone, Debug)]
pub struct CreateSharedDatabaseOptions {
    pub or_replace: bool,
    pub transient: bool,
    pub if_not_exists: bool,
    pub from_share: ExternalObjectIdentifier,
    pub comment: Option<String>,
    pub tag: Vec<TagAssociation>,
}

impl CreateSharedDatabaseOptions {
    pub fn new(from_share: ExternalObjectIdentifier) -> Self {
        Self {
            or_replace: false,
            transient: false,
            if_not_exists: false,
            from_share,
            comment: None,
            tag: Vec::new(),
        }
    }
}

impl SqlStatement for CreateSharedDatabaseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier(&self.from_share)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.transient, "TRANSIENT")
            .keyword("DATABASE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .identifier_after("FROM SHARE", Some(&self.from_share))
            .text("COMMENT", self.comment.as_deref());
        with_tags(sql, &self.tag);
    }
}

/// `CREATE DATABASE ... AS REPLICA OF <org>.<account>.<database>`
#[derive(Clone, Debug)]
pub struct CreateSecondaryDatabaseOptions {
    pub or_replace: bool,
    pub transient: bool,
    pub if_not_exists: bool,
    pub as_replica_of: ExternalObjectIdentifier,
    pub data_retention_time_in_days: Option<i64>,
    pub max_data_extension_time_in_days: Option<i64>,
    pub comment: Option<String>,
}

impl CreateSecondaryDatabaseOptions {
    pub fn new(as_replica_of: ExternalObjectIdentifier) -> Self {
        Self {
            or_replace: false,
            transient: false,
            if_not_exists: false,
            as_replica_of,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            comment: None,
        }
    }
}

impl SqlStatement for CreateSecondaryDatabaseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier(&self.as_replica_of)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.transient, "TRANSIENT")
            .keyword("DATABASE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .identifier_after("AS REPLICA OF", Some(&self.as_replica_of))
            .number("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .number("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct DatabaseSet {
    pub data_retention_time_in_days: Option<i64>,
    pub max_data_extension_time_in_days: Option<i64>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
}

impl DatabaseSet {
    fn validate(&self) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.at_least_one_of(&[
            ("DataRetentionTimeInDays", self.data_retention_time_in_days.is_some()),
            ("MaxDataExtensionTimeInDays", self.max_data_extension_time_in_days.is_some()),
            ("DefaultDDLCollation", self.default_ddl_collation.is_some()),
            ("Comment", self.comment.is_some()),
        ]);
        validator.finish()
    }
}

impl Clause for DatabaseSet {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.number("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .number("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .text("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct DatabaseUnset {
    pub data_retention_time_in_days: bool,
    pub max_data_extension_time_in_days: bool,
    pub default_ddl_collation: bool,
    pub comment: bool,
}

impl DatabaseUnset {
    fn validate(&self) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.at_least_one_of(&[
            ("DataRetentionTimeInDays", self.data_retention_time_in_days),
            ("MaxDataExtensionTimeInDays", self.max_data_extension_time_in_days),
            ("DefaultDDLCollation", self.default_ddl_collation),
            ("Comment", self.comment),
        ]);
        validator.finish()
    }

    fn fields(&self) -> Vec<&'static str> {
        [
            (self.data_retention_time_in_days, "DATA_RETENTION_TIME_IN_DAYS"),
            (self.max_data_extension_time_in_days, "MAX_DATA_EXTENSION_TIME_IN_DAYS"),
            (self.default_ddl_collation, "DEFAULT_DDL_COLLATION"),
            (self.comment, "COMMENT"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

impl Clause for DatabaseUnset {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.comma_separated("UNSET", &self.fields());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterDatabaseOptions {
    pub if_exists: bool,
    pub new_name: Option<AccountObjectIdentifier>,
    pub swap_with: Option<AccountObjectIdentifier>,
    pub set: Option<DatabaseSet>,
    pub unset: Option<DatabaseUnset>,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
}

impl SqlStatement for AlterDatabaseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .identifier_opt(self.swap_with.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("SwapWith", self.swap_with.is_some()),
                ("Set", self.set.is_some()),
                ("Unset", self.unset.is_some()),
                ("SetTag", !self.set_tag.is_empty()),
                ("UnsetTag", !self.unset_tag.is_empty()),
            ]);
        if let Some(set) = &self.set {
            validator.nested(set.validate());
        }
        if let Some(unset) = &self.unset {
            validator.nested(unset.validate());
        }
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER DATABASE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref())
            .identifier_after("SWAP WITH", self.swap_with.as_ref())
            .nested(Some("SET"), self.set.as_ref())
            .nested(None, self.unset.as_ref());
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct EnableReplication {
    pub to_accounts: Vec<AccountIdentifier>,
    pub ignore_edition_check: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AlterDatabaseReplicationOptions {
    pub enable_replication: Option<EnableReplication>,
    pub disable_replication: Option<Vec<AccountIdentifier>>,
    pub refresh: bool,
}

impl SqlStatement for AlterDatabaseReplicationOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).exactly_one_of(&[
            ("EnableReplication", self.enable_replication.is_some()),
            ("DisableReplication", self.disable_replication.is_some()),
            ("Refresh", self.refresh),
        ]);
        if let Some(enable) = &self.enable_replication {
            validator
                .check(enable.to_accounts.is_empty(), || {
                    SnowflakeError::invalid_option("ToAccounts", "at least one account is required")
                })
                .identifiers(&enable.to_accounts);
        }
        if let Some(accounts) = &self.disable_replication {
            validator.identifiers(accounts);
        }
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER DATABASE").identifier(id);
        if let Some(enable) = &self.enable_replication {
            sql.identifier_list("ENABLE REPLICATION TO ACCOUNTS", Some(&enable.to_accounts[..]))
                .keyword_if(enable.ignore_edition_check, "IGNORE EDITION CHECK");
        }
        if let Some(accounts) = &self.disable_replication {
            sql.keyword("DISABLE REPLICATION");
            if !accounts.is_empty() {
                sql.identifier_list("TO ACCOUNTS", Some(&accounts[..]));
            }
        }
        sql.keyword_if(self.refresh, "REFRESH");
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterDatabaseFailoverOptions {
    pub enable_failover: Option<Vec<AccountIdentifier>>,
    pub disable_failover: Option<Vec<AccountIdentifier>>,
    pub primary: bool,
}

impl SqlStatement for AlterDatabaseFailoverOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).exactly_one_of(&[
            ("EnableFailover", self.enable_failover.is_some()),
            ("DisableFailover", self.disable_failover.is_some()),
            ("Primary", self.primary),
        ]);
        if let Some(accounts) = &self.enable_failover {
            validator.identifiers(accounts).check(accounts.is_empty(), || {
                SnowflakeError::invalid_option("ToAccounts", "at least one account is required")
            });
        }
        if let Some(accounts) = &self.disable_failover {
            validator.identifiers(accounts);
        }
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER DATABASE")
            .identifier(id)
            .identifier_list("ENABLE FAILOVER TO ACCOUNTS", self.enable_failover.as_deref());
        if let Some(accounts) = &self.disable_failover {
            sql.keyword("DISABLE FAILOVER");
            if !accounts.is_empty() {
                sql.identifier_list("TO ACCOUNTS", Some(&accounts[..]));
            }
        }
        sql.keyword_if(self.primary, "PRIMARY");
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropDatabaseOptions {
    pub if_exists: bool,
    pub cascade: bool,
    pub restrict: bool,
}

impl SqlStatement for DropDatabaseOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("Cascade", self.cascade), ("Restrict", self.restrict)]);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP DATABASE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .keyword_if(self.cascade, "CASCADE")
            .keyword_if(self.restrict, "RESTRICT");
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowDatabaseOptions {
    pub terse: bool,
    pub history: bool,
    pub like: Option<Like>,
    pub starts_with: Option<String>,
    pub limit: Option<LimitFrom>,
}

impl SqlStatement for ShowDatabaseOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), None)
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW")
            .keyword_if(self.terse, "TERSE")
            .keyword("DATABASES")
            .keyword_if(self.history, "HISTORY")
            .nested(None, self.like.as_ref());
        starts_with(sql, self.starts_with.as_deref());
        sql.nested(None, self.limit.as_ref());
    }
}

#[derive(Debug, Default)]
struct DatabaseRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    is_default: Option<bool>,
    is_current: Option<bool>,
    origin: Option<String>,
    owner: Option<String>,
    comment: Option<String>,
    options: Option<String>,
    retention_time: Option<i64>,
    kind: Option<String>,
    resource_group: Option<String>,
    dropped_on: Option<DateTime<Utc>>,
    owner_role_type: Option<String>,
}
impl_from_row!(DatabaseRow {
    created_on,
    name,
    is_default,
    is_current,
    origin,
    owner,
    comment,
    options,
    retention_time,
    kind,
    resource_group,
    dropped_on,
    owner_role_type,
});

/// A row of `SHOW DATABASES`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Database {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub origin: String,
    pub owner: String,
    pub comment: String,
    pub options: String,
    pub retention_time: i64,
    pub kind: String,
    pub resource_group: String,
    pub dropped_on: Option<DateTime<Utc>>,
    pub owner_role_type: String,
    pub transient: bool,
}

impl From<DatabaseRow> for Database {
    fn from(row: DatabaseRow) -> Self {
        let options = row.options.unwrap_or_default();
        let kind = row.kind.unwrap_or_default();
        Database {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            is_default: row.is_default.unwrap_or_default(),
            is_current: row.is_current.unwrap_or_default(),
            origin: row.origin.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            transient: options.contains("TRANSIENT") || kind == "TRANSIENT",
            options,
            retention_time: row.retention_time.unwrap_or_default(),
            kind,
            resource_group: row.resource_group.unwrap_or_default(),
            dropped_on: row.dropped_on,
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        }
    }
}

impl Identified for Database {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

/// A row of `DESCRIBE DATABASE`: one per schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatabaseDetails {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Default)]
struct DatabaseDetailsRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    kind: Option<String>,
}
impl_from_row!(DatabaseDetailsRow {
    created_on,
    name,
    kind,
});

pub struct Databases<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Databases<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&CreateDatabaseOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateDatabaseOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn create_shared(
        &self,
        id: &AccountObjectIdentifier,
        opts: &CreateSharedDatabaseOptions,
    ) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn create_secondary(
        &self,
        id: &AccountObjectIdentifier,
        opts: &CreateSecondaryDatabaseOptions,
    ) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn alter(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterDatabaseOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter_replication(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterDatabaseReplicationOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter_failover(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterDatabaseFailoverOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&DropDatabaseOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropDatabaseOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn undrop(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)?;
        exec(self.executor, &format!("UNDROP DATABASE {}", id.fully_qualified_name())).await
    }

    pub async fn show(&self, opts: Option<&ShowDatabaseOptions>) -> SnowflakeResult<Vec<Database>> {
        let default = ShowDatabaseOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<DatabaseRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(Database::from).collect())
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Database> {
        let databases = self
            .show(Some(&ShowDatabaseOptions {
                like: Some(Like::new(id.name())),
                ..ShowDatabaseOptions::default()
            }))
            .await?;
        find_by_id(databases, id)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Vec<DatabaseDetails>> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE DATABASE {}", id.fully_qualified_name());
        let rows: Vec<DatabaseDetailsRow> = query_all(self.executor, &sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| DatabaseDetails {
                created_on: row.created_on,
                name: row.name.unwrap_or_default(),
                kind: row.kind.unwrap_or_default(),
            })
            .collect())
    }

    pub async fn use_database(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)?;
        exec(self.executor, &format!("USE DATABASE {}", id.fully_qualified_name())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> AccountObjectIdentifier {
        AccountObjectIdentifier::new("db1")
    }

    #[test]
    fn create_renders_every_option_in_order() {
        let opts = CreateDatabaseOptions {
            or_replace: true,
            transient: true,
            data_retention_time_in_days: Some(1),
            max_data_extension_time_in_days: Some(1),
            comment: Some("c".into()),
            tag: vec![TagAssociation::new(
                SchemaObjectIdentifier::new("db1", "schema1", "tag1"),
                "v1",
            )],
            ..CreateDatabaseOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE TRANSIENT DATABASE "db1" DATA_RETENTION_TIME_IN_DAYS = 1 MAX_DATA_EXTENSION_TIME_IN_DAYS = 1 COMMENT = 'c' TAG ("db1"."schema1"."tag1" = 'v1')"#
        );
    }

    #[test]
    fn or_replace_excludes_if_not_exists() {
        let opts = CreateDatabaseOptions {
            or_replace: true,
            if_not_exists: true,
            ..CreateDatabaseOptions::default()
        };
        assert!(matches!(
            opts.to_sql(&id()),
            Err(SnowflakeError::MoreThanOneOf { .. })
        ));
    }

    #[test]
    fn shared_and_secondary_databases_name_their_source() {
        let source = "org.acc.share1".parse::<ExternalObjectIdentifier>().unwrap();
        assert_eq!(
            CreateSharedDatabaseOptions::new(source).to_sql(&id()).unwrap(),
            r#"CREATE DATABASE "db1" FROM SHARE "org"."acc"."share1""#
        );
        let replica = CreateSecondaryDatabaseOptions {
            data_retention_time_in_days: Some(2),
            ..CreateSecondaryDatabaseOptions::new("org.acc.db0".parse().unwrap())
        };
        assert_eq!(
            replica.to_sql(&id()).unwrap(),
            r#"CREATE DATABASE "db1" AS REPLICA OF "org"."acc"."db0" DATA_RETENTION_TIME_IN_DAYS = 2"#
        );
    }

    #[test]
    fn alter_renames() {
        let opts = AlterDatabaseOptions {
            if_exists: true,
            new_name: Some(AccountObjectIdentifier::new("db2")),
            ..AlterDatabaseOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"ALTER DATABASE IF EXISTS "db1" RENAME TO "db2""#
        );
    }

    #[test]
    fn alter_sets_and_unsets() {
        let set = AlterDatabaseOptions {
            set: Some(DatabaseSet {
                data_retention_time_in_days: Some(3),
                comment: Some("it's".into()),
                ..DatabaseSet::default()
            }),
            ..AlterDatabaseOptions::default()
        };
        assert_eq!(
            set.to_sql(&id()).unwrap(),
            r#"ALTER DATABASE "db1" SET DATA_RETENTION_TIME_IN_DAYS = 3 COMMENT = 'it''s'"#
        );
        let unset = AlterDatabaseOptions {
            unset: Some(DatabaseUnset {
                data_retention_time_in_days: true,
                comment: true,
                ..DatabaseUnset::default()
            }),
            ..AlterDatabaseOptions::default()
        };
        assert_eq!(
            unset.to_sql(&id()).unwrap(),
            r#"ALTER DATABASE "db1" UNSET DATA_RETENTION_TIME_IN_DAYS, COMMENT"#
        );
    }

    #[test]
    fn alter_needs_exactly_one_action() {
        let err = AlterDatabaseOptions::default().to_sql(&id()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "exactly one of NewName, SwapWith, Set, Unset, SetTag, UnsetTag must be set"
        );
        let empty_set = AlterDatabaseOptions {
            set: Some(DatabaseSet::default()),
            ..AlterDatabaseOptions::default()
        };
        assert!(matches!(
            empty_set.to_sql(&id()),
            Err(SnowflakeError::AtLeastOneOf { .. })
        ));
    }

    #[test]
    fn replication_and_failover() {
        let accounts = vec![AccountIdentifier::new("org", "acc1"), AccountIdentifier::new("org", "acc2")];
        let enable = AlterDatabaseReplicationOptions {
            enable_replication: Some(EnableReplication {
                to_accounts: accounts.clone(),
                ignore_edition_check: true,
            }),
            ..AlterDatabaseReplicationOptions::default()
        };
        assert_eq!(
            enable.to_sql(&id()).unwrap(),
            r#"ALTER DATABASE "db1" ENABLE REPLICATION TO ACCOUNTS "org"."acc1", "org"."acc2" IGNORE EDITION CHECK"#
        );
        let refresh = AlterDatabaseReplicationOptions {
            refresh: true,
            ..AlterDatabaseReplicationOptions::default()
        };
        assert_eq!(refresh.to_sql(&id()).unwrap(), r#"ALTER DATABASE "db1" REFRESH"#);

        let failover = AlterDatabaseFailoverOptions {
            disable_failover: Some(Vec::new()),
            ..AlterDatabaseFailoverOptions::default()
        };
        assert_eq!(failover.to_sql(&id()).unwrap(), r#"ALTER DATABASE "db1" DISABLE FAILOVER"#);
        let primary = AlterDatabaseFailoverOptions {
            primary: true,
            ..AlterDatabaseFailoverOptions::default()
        };
        assert_eq!(primary.to_sql(&id()).unwrap(), r#"ALTER DATABASE "db1" PRIMARY"#);
    }

    #[test]
    fn failover_accounts_must_be_complete() {
        let enable = AlterDatabaseFailoverOptions {
            enable_failover: Some(vec![AccountIdentifier::new("org", "")]),
            ..AlterDatabaseFailoverOptions::default()
        };
        assert!(matches!(
            enable.to_sql(&id()),
            Err(SnowflakeError::InvalidObjectIdentifier(_))
        ));
        let disable = AlterDatabaseFailoverOptions {
            disable_failover: Some(vec![AccountIdentifier::new("", "acc")]),
            ..AlterDatabaseFailoverOptions::default()
        };
        assert!(matches!(
            disable.to_sql(&id()),
            Err(SnowflakeError::InvalidObjectIdentifier(_))
        ));
        let valid = AlterDatabaseFailoverOptions {
            enable_failover: Some(vec![AccountIdentifier::new("org", "acc1")]),
            ..AlterDatabaseFailoverOptions::default()
        };
        assert_eq!(
            valid.to_sql(&id()).unwrap(),
            r#"ALTER DATABASE "db1" ENABLE FAILOVER TO ACCOUNTS "org"."acc1""#
        );
    }

    #[test]
    fn drop_and_show() {
        let drop = DropDatabaseOptions {
            if_exists: true,
            cascade: true,
            ..DropDatabaseOptions::default()
        };
        assert_eq!(drop.to_sql(&id()).unwrap(), r#"DROP DATABASE IF EXISTS "db1" CASCADE"#);
        let show = ShowDatabaseOptions {
            terse: true,
            history: true,
            like: Some(Like::new("db%")),
            starts_with: Some("d".into()),
            limit: Some(LimitFrom::new(5)),
        };
        assert_eq!(
            show.to_sql(&()).unwrap(),
            "SHOW TERSE DATABASES HISTORY LIKE 'db%' STARTS WITH 'd' LIMIT 5"
        );
    }

    #[tokio::test]
    async fn alter_without_options_is_refused() {
        let executor = RecordingExecutor::new();
        let err = Databases::new(&executor).alter(&id(), None).await.unwrap_err();
        assert!(matches!(err, SnowflakeError::NilOptions));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn show_by_id_picks_the_exact_row() {
        let rows = Rows::from_text(
            &["created_on", "name", "is_default", "owner", "options", "retention_time", "comment"],
            vec![
                vec![Some("2024-01-01T00:00:00Z"), Some("DB1"), Some("N"), Some("SYSADMIN"), Some(""), Some("1"), None],
                vec![Some("2024-01-02T00:00:00Z"), Some("db1"), Some("N"), Some("SYSADMIN"), Some("TRANSIENT"), Some("0"), Some("hi")],
            ],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let database = Databases::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(executor.last(), "SHOW DATABASES LIKE 'db1'");
        assert_eq!(database.name, "db1");
        assert!(database.transient);
        assert_eq!(database.comment, "hi");
        assert_eq!(database.retention_time, 0);
    }

    #[tokio::test]
    async fn show_by_id_without_rows_is_not_found() {
        let executor = RecordingExecutor::new();
        let err = Databases::new(&executor).show_by_id(&id()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn simple_statements() {
        let executor = RecordingExecutor::new();
        let databases = Databases::new(&executor);
        databases.undrop(&id()).await.unwrap();
        databases.use_database(&id()).await.unwrap();
        databases.describe(&id()).await.unwrap();
        databases.drop(&id(), None).await.unwrap();
        assert_eq!(
            executor.statements(),
            vec![
                r#"UNDROP DATABASE "db1""#,
                r#"USE DATABASE "db1""#,
                r#"DESCRIBE DATABASE "db1""#,
                r#"DROP DATABASE "db1""#,
            ]
        );
    }
}
