use chrono::{DateTime, Utc};

use crate::builder::{SqlBuilder, SqlStatement};
use crate::errors::SnowflakeResult;
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, set_tags, unset_tags, validate_filters, validate_tags, with_tags, Identified, Like,
    TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

#[derive(Clone, Debug, Default)]
pub struct CreateRoleOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub comment: Option<String>,
    pub tag: Vec<TagAssociation>,
}

impl SqlStatement for CreateRoleOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("ROLE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .text("COMMENT", self.comment.as_deref());
        with_tags(sql, &self.tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterRoleOptions {
    pub if_exists: bool,
    pub new_name: Option<AccountObjectIdentifier>,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
}

impl SqlStatement for AlterRoleOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("SetComment", self.set_comment.is_some()),
                ("UnsetComment", self.unset_comment),
                ("SetTag", !self.set_tag.is_empty()),
                ("UnsetTag", !self.unset_tag.is_empty()),
            ]);
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER ROLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref())
            .keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropRoleOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropRoleOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP ROLE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowRoleOptions {
    pub like: Option<Like>,
    /// `IN CLASS <class>`, e.g. `SNOWFLAKE.CORE.BUDGET`.
    pub in_class: Option<SchemaObjectIdentifier>,
}

impl SqlStatement for ShowRoleOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .nested(validate_filters(self.like.as_ref(), None))
            .identifier_opt(self.in_class.as_ref());
        validator.finish()
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW ROLES")
            .nested(None, self.like.as_ref())
            .identifier_after("IN CLASS", self.in_class.as_ref());
    }
}

/// Who receives (or loses) a role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grantee {
    User(AccountObjectIdentifier),
    Role(AccountObjectIdentifier),
}

impl Grantee {
    fn render(&self) -> String {
        match self {
            Grantee::User(user) => format!("USER {}", user.fully_qualified_name()),
            Grantee::Role(role) => format!("ROLE {}", role.fully_qualified_name()),
        }
    }

    fn id(&self) -> &AccountObjectIdentifier {
        match self {
            Grantee::User(id) | Grantee::Role(id) => id,
        }
    }
}

#[derive(Debug, Default)]
struct RoleRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    is_default: Option<bool>,
    is_current: Option<bool>,
    is_inherited: Option<bool>,
    assigned_to_users: Option<i64>,
    granted_to_roles: Option<i64>,
    granted_roles: Option<i64>,
    owner: Option<String>,
    comment: Option<String>,
}
impl_from_row!(RoleRow {
    created_on,
    name,
    is_default,
    is_current,
    is_inherited,
    assigned_to_users,
    granted_to_roles,
    granted_roles,
    owner,
    comment,
});

/// A row of `SHOW ROLES`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Role {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub is_inherited: bool,
    pub assigned_to_users: i64,
    pub granted_to_roles: i64,
    pub granted_roles: i64,
    pub owner: String,
    pub comment: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            is_default: row.is_default.unwrap_or_default(),
            is_current: row.is_current.unwrap_or_default(),
            is_inherited: row.is_inherited.unwrap_or_default(),
            assigned_to_users: row.assigned_to_users.unwrap_or_default(),
            granted_to_roles: row.granted_to_roles.unwrap_or_default(),
            granted_roles: row.granted_roles.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
        }
    }
}

impl Identified for Role {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

pub struct Roles<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Roles<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&CreateRoleOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateRoleOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterRoleOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&DropRoleOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropRoleOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowRoleOptions>) -> SnowflakeResult<Vec<Role>> {
        let default = ShowRoleOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<RoleRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<Role> {
        let roles = self
            .show(Some(&ShowRoleOptions {
                like: Some(Like::new(id.name())),
                ..ShowRoleOptions::default()
            }))
            .await?;
        find_by_id(roles, id)
    }

    /// `GRANT ROLE <id> TO { USER | ROLE } <grantee>`
    pub async fn grant(&self, id: &AccountObjectIdentifier, to: &Grantee) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).identifier(to.id());
        validator.finish()?;
        let sql = format!("GRANT ROLE {} TO {}", id.fully_qualified_name(), to.render());
        exec(self.executor, &sql).await
    }

    /// `REVOKE ROLE <id> FROM { USER | ROLE } <grantee>`
    pub async fn revoke(&self, id: &AccountObjectIdentifier, from: &Grantee) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).identifier(from.id());
        validator.finish()?;
        let sql = format!("REVOKE ROLE {} FROM {}", id.fully_qualified_name(), from.render());
        exec(self.executor, &sql).await
    }

    pub async fn use_role(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)?;
        exec(self.executor, &format!("USE ROLE {}", id.fully_qualified_name())).await
    }

    /// `USE SECONDARY ROLES ALL` when `all`, otherwise `USE SECONDARY ROLES NONE`.
    pub async fn use_secondary_roles(&self, all: bool) -> SnowflakeResult<()> {
        let sql = if all {
            "USE SECONDARY ROLES ALL"
        } else {
            "USE SECONDARY ROLES NONE"
        };
        exec(self.executor, sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SnowflakeError;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> AccountObjectIdentifier {
        AccountObjectIdentifier::new("analyst")
    }

    #[test]
    fn create_and_alter() {
        let create = CreateRoleOptions {
            or_replace: true,
            comment: Some("read only".into()),
            ..CreateRoleOptions::default()
        };
        assert_eq!(
            create.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE ROLE "analyst" COMMENT = 'read only'"#
        );
        let comment = AlterRoleOptions {
            if_exists: true,
            set_comment: Some("c".into()),
            ..AlterRoleOptions::default()
        };
        assert_eq!(
            comment.to_sql(&id()).unwrap(),
            r#"ALTER ROLE IF EXISTS "analyst" SET COMMENT = 'c'"#
        );
        let both = AlterRoleOptions {
            set_comment: Some("c".into()),
            unset_comment: true,
            ..AlterRoleOptions::default()
        };
        assert!(matches!(both.to_sql(&id()), Err(SnowflakeError::ExactlyOneOf { .. })));
    }

    #[test]
    fn show_in_class() {
        let opts = ShowRoleOptions {
            like: Some(Like::new("BUDGET%")),
            in_class: Some(SchemaObjectIdentifier::new("SNOWFLAKE", "CORE", "BUDGET")),
        };
        assert_eq!(
            opts.to_sql(&()).unwrap(),
            r#"SHOW ROLES LIKE 'BUDGET%' IN CLASS "SNOWFLAKE"."CORE"."BUDGET""#
        );
    }

    #[tokio::test]
    async fn grants_and_revokes() {
        let executor = RecordingExecutor::new();
        let roles = Roles::new(&executor);
        roles
            .grant(&id(), &Grantee::User(AccountObjectIdentifier::new("alice")))
            .await
            .unwrap();
        roles
            .revoke(&id(), &Grantee::Role(AccountObjectIdentifier::new("SYSADMIN")))
            .await
            .unwrap();
        roles.use_role(&id()).await.unwrap();
        roles.use_secondary_roles(true).await.unwrap();
        assert_eq!(
            executor.statements(),
            vec![
                r#"GRANT ROLE "analyst" TO USER "alice""#,
                r#"REVOKE ROLE "analyst" FROM ROLE "SYSADMIN""#,
                r#"USE ROLE "analyst""#,
                "USE SECONDARY ROLES ALL",
            ]
        );
    }

    #[tokio::test]
    async fn grant_to_invalid_grantee_is_refused() {
        let executor = RecordingExecutor::new();
        let err = Roles::new(&executor)
            .grant(&id(), &Grantee::Role(AccountObjectIdentifier::new("")))
            .await
            .unwrap_err();
        assert!(matches!(err, SnowflakeError::InvalidObjectIdentifier(_)));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn show_by_id_decodes_counts() {
        let rows = Rows::from_text(
            &["name", "assigned_to_users", "granted_roles", "owner"],
            vec![vec![Some("analyst"), Some("3"), Some("1"), Some("SECURITYADMIN")]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let role = Roles::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(role.assigned_to_users, 3);
        assert_eq!(role.granted_roles, 1);
        assert_eq!(role.owner, "SECURITYADMIN");
    }
}
