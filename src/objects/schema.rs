use chrono::{DateTime, Utc};

use crate::builder::{Clause, SqlBuilder, SqlStatement};
use crate::errors::SnowflakeResult;
use crate::identifiers::{DatabaseObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, set_tags, starts_with, unset_tags, validate_filters, validate_tags, with_tags,
    Identified, In, LimitFrom, Like, TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

#[derive(Clone, Debug, Default)]
pub struct CreateSchemaOptions {
    pub or_replace: bool,
    pub transient: bool,
    pub if_not_exists: bool,
    pub clone: Option<DatabaseObjectIdentifier>,
    pub with_managed_access: bool,
    pub data_retention_time_in_days: Option<i64>,
    pub max_data_extension_time_in_days: Option<i64>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
    pub tag: Vec<TagAssociation>,
}

impl SqlStatement for CreateSchemaOptions {
    type Target = DatabaseObjectIdentifier;

    fn validate(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.clone.as_ref())
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &DatabaseObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.transient, "TRANSIENT")
            .keyword("SCHEMA")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .identifier_after("CLONE", self.clone.as_ref())
            .keyword_if(self.with_managed_access, "WITH MANAGED ACCESS")
            .number("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .number("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .text("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .text("COMMENT", self.comment.as_deref());
        with_tags(sql, &self.tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    pub data_retention_time_in_days: Option<i64>,
    pub max_data_extension_time_in_days: Option<i64>,
    pub default_ddl_collation: Option<String>,
    pub comment: Option<String>,
}

impl Clause for SchemaSet {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.number("DATA_RETENTION_TIME_IN_DAYS", self.data_retention_time_in_days)
            .number("MAX_DATA_EXTENSION_TIME_IN_DAYS", self.max_data_extension_time_in_days)
            .text("DEFAULT_DDL_COLLATION", self.default_ddl_collation.as_deref())
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct SchemaUnset {
    pub data_retention_time_in_days: bool,
    pub max_data_extension_time_in_days: bool,
    pub default_ddl_collation: bool,
    pub comment: bool,
}

impl SchemaUnset {
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

impl Clause for SchemaUnset {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.comma_separated("UNSET", &self.fields());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterSchemaOptions {
    pub if_exists: bool,
    pub new_name: Option<DatabaseObjectIdentifier>,
    pub swap_with: Option<DatabaseObjectIdentifier>,
    pub set: Option<SchemaSet>,
    pub unset: Option<SchemaUnset>,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
    pub enable_managed_access: bool,
    pub disable_managed_access: bool,
}

impl SqlStatement for AlterSchemaOptions {
    type Target = DatabaseObjectIdentifier;

    fn validate(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
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
                ("EnableManagedAccess", self.enable_managed_access),
                ("DisableManagedAccess", self.disable_managed_access),
            ]);
        if let Some(set) = &self.set {
            validator.at_least_one_of(&[
                ("DataRetentionTimeInDays", set.data_retention_time_in_days.is_some()),
                ("MaxDataExtensionTimeInDays", set.max_data_extension_time_in_days.is_some()),
                ("DefaultDDLCollation", set.default_ddl_collation.is_some()),
                ("Comment", set.comment.is_some()),
            ]);
        }
        if let Some(unset) = &self.unset {
            validator.at_least_one_of(&[
                ("DataRetentionTimeInDays", unset.data_retention_time_in_days),
                ("MaxDataExtensionTimeInDays", unset.max_data_extension_time_in_days),
                ("DefaultDDLCollation", unset.default_ddl_collation),
                ("Comment", unset.comment),
            ]);
        }
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &DatabaseObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER SCHEMA")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref())
            .identifier_after("SWAP WITH", self.swap_with.as_ref())
            .nested(Some("SET"), self.set.as_ref())
            .nested(None, self.unset.as_ref());
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
        sql.keyword_if(self.enable_managed_access, "ENABLE MANAGED ACCESS")
            .keyword_if(self.disable_managed_access, "DISABLE MANAGED ACCESS");
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropSchemaOptions {
    pub if_exists: bool,
    pub cascade: bool,
    pub restrict: bool,
}

impl SqlStatement for DropSchemaOptions {
    type Target = DatabaseObjectIdentifier;

    fn validate(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("Cascade", self.cascade), ("Restrict", self.restrict)]);
        validator.finish()
    }

    fn render(&self, id: &DatabaseObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP SCHEMA")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .keyword_if(self.cascade, "CASCADE")
            .keyword_if(self.restrict, "RESTRICT");
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowSchemaOptions {
    pub terse: bool,
    pub history: bool,
    pub like: Option<Like>,
    pub scope: Option<In>,
    pub starts_with: Option<String>,
    pub limit: Option<LimitFrom>,
}

impl SqlStatement for ShowSchemaOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW")
            .keyword_if(self.terse, "TERSE")
            .keyword("SCHEMAS")
            .keyword_if(self.history, "HISTORY")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
        starts_with(sql, self.starts_with.as_deref());
        sql.nested(None, self.limit.as_ref());
    }
}

#[derive(Debug, Default)]
struct SchemaRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    is_default: Option<bool>,
    is_current: Option<bool>,
    database_name: Option<String>,
    owner: Option<String>,
    comment: Option<String>,
    options: Option<String>,
    retention_time: Option<i64>,
    owner_role_type: Option<String>,
    dropped_on: Option<DateTime<Utc>>,
}
impl_from_row!(SchemaRow {
    created_on,
    name,
    is_default,
    is_current,
    database_name,
    owner,
    comment,
    options,
    retention_time,
    owner_role_type,
    dropped_on,
});

/// A row of `SHOW SCHEMAS`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub database_name: String,
    pub owner: String,
    pub comment: String,
    pub options: String,
    pub retention_time: i64,
    pub owner_role_type: String,
    pub dropped_on: Option<DateTime<Utc>>,
}

impl Schema {
    pub fn is_transient(&self) -> bool {
        self.options.contains("TRANSIENT")
    }

    pub fn is_managed_access(&self) -> bool {
        self.options.contains("MANAGED ACCESS")
    }
}

impl From<SchemaRow> for Schema {
    fn from(row: SchemaRow) -> Self {
        Schema {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            is_default: row.is_default.unwrap_or_default(),
            is_current: row.is_current.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            options: row.options.unwrap_or_default(),
            retention_time: row.retention_time.unwrap_or_default(),
            owner_role_type: row.owner_role_type.unwrap_or_default(),
            dropped_on: row.dropped_on,
        }
    }
}

impl Identified for Schema {
    type Id = DatabaseObjectIdentifier;

    fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database_name, &self.name)
    }
}

/// A row of `DESCRIBE SCHEMA`: one per object in the schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaDetails {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Default)]
struct SchemaDetailsRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    kind: Option<String>,
}
impl_from_row!(SchemaDetailsRow {
    created_on,
    name,
    kind,
});

pub struct Schemas<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Schemas<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &DatabaseObjectIdentifier,
        opts: Option<&CreateSchemaOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateSchemaOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &DatabaseObjectIdentifier,
        opts: Option<&AlterSchemaOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &DatabaseObjectIdentifier,
        opts: Option<&DropSchemaOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropSchemaOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn undrop(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)?;
        exec(self.executor, &format!("UNDROP SCHEMA {}", id.fully_qualified_name())).await
    }

    pub async fn show(&self, opts: Option<&ShowSchemaOptions>) -> SnowflakeResult<Vec<Schema>> {
        let default = ShowSchemaOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<SchemaRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(Schema::from).collect())
    }

    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<Schema> {
        let schemas = self
            .show(Some(&ShowSchemaOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::database(id.database_id())),
                ..ShowSchemaOptions::default()
            }))
            .await?;
        find_by_id(schemas, id)
    }

    pub async fn describe(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<Vec<SchemaDetails>> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE SCHEMA {}", id.fully_qualified_name());
        let rows: Vec<SchemaDetailsRow> = query_all(self.executor, &sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| SchemaDetails {
                created_on: row.created_on,
                name: row.name.unwrap_or_default(),
                kind: row.kind.unwrap_or_default(),
            })
            .collect())
    }

    pub async fn use_schema(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)?;
        exec(self.executor, &format!("USE SCHEMA {}", id.fully_qualified_name())).await
    }
}
