use chrono::{DateTime, Utc};

use crate::builder::{SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier};
use crate::objects::common::{find_by_id, validate_filters, Identified, Like};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

#[derive(Clone, Debug, Default)]
pub struct CreateDatabaseRoleOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub comment: Option<String>,
}

impl SqlStatement for CreateDatabaseRoleOptions {
    type Target = DatabaseObjectIdentifier;

    fn validate(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validator.finish()
    }

    fn render(&self, id: &DatabaseObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("DATABASE ROLE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterDatabaseRoleOptions {
    pub if_exists: bool,
    /// The new name must stay in the same database.
    pub new_name: Option<DatabaseObjectIdentifier>,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
}

impl SqlStatement for AlterDatabaseRoleOptions {
    type Target = DatabaseObjectIdentifier;

    fn validate(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("SetComment", self.set_comment.is_some()),
                ("UnsetComment", self.unset_comment),
            ]);
        if let Some(new_name) = &self.new_name {
            validator.check(new_name.database_name() != id.database_name(), || {
                SnowflakeError::invalid_option(
                    "NewName",
                    "database roles cannot be moved to another database",
                )
            });
        }
        validator.finish()
    }

    fn render(&self, id: &DatabaseObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER DATABASE ROLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref())
            .keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropDatabaseRoleOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropDatabaseRoleOptions {
    type Target = DatabaseObjectIdentifier;

    fn validate(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &DatabaseObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP DATABASE ROLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

/// `SHOW DATABASE ROLES [LIKE ...] IN DATABASE <database>`; the database is mandatory.
#[derive(Clone, Debug)]
pub struct ShowDatabaseRoleOptions {
    pub like: Option<Like>,
    pub database: AccountObjectIdentifier,
}

impl ShowDatabaseRoleOptions {
    pub fn new(database: AccountObjectIdentifier) -> Self {
        Self { like: None, database }
    }
}

impl SqlStatement for ShowDatabaseRoleOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .nested(validate_filters(self.like.as_ref(), None))
            .identifier(&self.database);
        validator.finish()
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW DATABASE ROLES")
            .nested(None, self.like.as_ref())
            .identifier_after("IN DATABASE", Some(&self.database));
    }
}

#[derive(Debug, Default)]
struct DatabaseRoleRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    is_default: Option<bool>,
    is_current: Option<bool>,
    is_inherited: Option<bool>,
    granted_to_roles: Option<i64>,
    granted_to_database_roles: Option<i64>,
    granted_database_roles: Option<i64>,
    owner: Option<String>,
    comment: Option<String>,
    owner_role_type: Option<String>,
}
impl_from_row!(DatabaseRoleRow {
    created_on,
    name,
    is_default,
    is_current,
    is_inherited,
    granted_to_roles,
    granted_to_database_roles,
    granted_database_roles,
    owner,
    comment,
    owner_role_type,
});

/// A row of `SHOW DATABASE ROLES`, tagged with the database it was listed in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatabaseRole {
    pub created_on: Option<DateTime<Utc>>,
    pub database_name: String,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub is_inherited: bool,
    pub granted_to_roles: i64,
    pub granted_to_database_roles: i64,
    pub granted_database_roles: i64,
    pub owner: String,
    pub comment: String,
    pub owner_role_type: String,
}

impl DatabaseRole {
    fn from_row(database_name: &str, row: DatabaseRoleRow) -> Self {
        DatabaseRole {
            created_on: row.created_on,
            database_name: database_name.to_owned(),
            name: row.name.unwrap_or_default(),
            is_default: row.is_default.unwrap_or_default(),
            is_current: row.is_current.unwrap_or_default(),
            is_inherited: row.is_inherited.unwrap_or_default(),
            granted_to_roles: row.granted_to_roles.unwrap_or_default(),
            granted_to_database_roles: row.granted_to_database_roles.unwrap_or_default(),
            granted_database_roles: row.granted_database_roles.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        }
    }
}

impl Identified for DatabaseRole {
    type Id = DatabaseObjectIdentifier;

    fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database_name, &self.name)
    }
}

pub struct DatabaseRoles<'a> {
    executor: &'a dyn Executor,
}

impl<'a> DatabaseRoles<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &DatabaseObjectIdentifier,
        opts: Option<&CreateDatabaseRoleOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateDatabaseRoleOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &DatabaseObjectIdentifier,
        opts: Option<&AlterDatabaseRoleOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &DatabaseObjectIdentifier,
        opts: Option<&DropDatabaseRoleOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropDatabaseRoleOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowDatabaseRoleOptions>) -> SnowflakeResult<Vec<DatabaseRole>> {
        let opts = require(opts)?;
        let sql = opts.to_sql(&())?;
        let rows: Vec<DatabaseRoleRow> = query_all(self.executor, &sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| DatabaseRole::from_row(opts.database.name(), row))
            .collect())
    }

    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> SnowflakeResult<DatabaseRole> {
        let roles = self
            .show(Some(&ShowDatabaseRoleOptions {
                like: Some(Like::new(id.name())),
                database: id.database_id(),
            }))
            .await?;
        find_by_id(roles, id)
    }
}
