use chrono::{DateTime, Utc};

use crate::builder::{Assignment, Clause, Quotes, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{
    AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier,
};
use crate::objects::common::{
    find_by_id, parse_bracketed_list, set_tags, starts_with, unset_tags, validate_filters,
    validate_tags, with_tags, Identified, Like, LimitFrom, TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

/// `DEFAULT_SECONDARY_ROLES = ('ALL')` is the only accepted value besides `()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecondaryRoles {
    All,
    None,
}

impl SecondaryRoles {
    fn as_list(&self) -> &'static [&'static str] {
        match self {
            SecondaryRoles::All => &["ALL"],
            SecondaryRoles::None => &[],
        }
    }
}

/// User properties shared by CREATE and ALTER ... SET.
#[derive(Clone, Debug, Default)]
pub struct UserProperties {
    pub password: Option<String>,
    pub login_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub must_change_password: Option<bool>,
    pub disabled: Option<bool>,
    pub days_to_expiry: Option<i64>,
    pub mins_to_unlock: Option<i64>,
    pub default_warehouse: Option<AccountObjectIdentifier>,
    pub default_namespace: Option<DatabaseObjectIdentifier>,
    pub default_role: Option<AccountObjectIdentifier>,
    pub default_secondary_roles: Option<SecondaryRoles>,
    pub mins_to_bypass_mfa: Option<i64>,
    pub rsa_public_key: Option<String>,
    pub rsa_public_key_2: Option<String>,
    pub comment: Option<String>,
}

impl UserProperties {
    fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.login_name.is_none()
            && self.display_name.is_none()
            && self.first_name.is_none()
            && self.middle_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.must_change_password.is_none()
            && self.disabled.is_none()
            && self.days_to_expiry.is_none()
            && self.mins_to_unlock.is_none()
            && self.default_warehouse.is_none()
            && self.default_namespace.is_none()
            && self.default_role.is_none()
            && self.default_secondary_roles.is_none()
            && self.mins_to_bypass_mfa.is_none()
            && self.rsa_public_key.is_none()
            && self.rsa_public_key_2.is_none()
            && self.comment.is_none()
    }

    fn validate(&self, validator: &mut Validator) {
        validator
            .identifier_opt(self.default_warehouse.as_ref())
            .identifier_opt(self.default_namespace.as_ref())
            .identifier_opt(self.default_role.as_ref())
            .check(self.days_to_expiry.is_some_and(|days| days < 0), || {
                SnowflakeError::invalid_option("DaysToExpiry", "must not be negative")
            });
    }
}

impl Clause for UserProperties {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.text("PASSWORD", self.password.as_deref())
            .text("LOGIN_NAME", self.login_name.as_deref())
            .text("DISPLAY_NAME", self.display_name.as_deref())
            .text("FIRST_NAME", self.first_name.as_deref())
            .text("MIDDLE_NAME", self.middle_name.as_deref())
            .text("LAST_NAME", self.last_name.as_deref())
            .text("EMAIL", self.email.as_deref())
            .boolean("MUST_CHANGE_PASSWORD", self.must_change_password)
            .boolean("DISABLED", self.disabled)
            .number("DAYS_TO_EXPIRY", self.days_to_expiry)
            .number("MINS_TO_UNLOCK", self.mins_to_unlock)
            .identifier_equals("DEFAULT_WAREHOUSE", self.default_warehouse.as_ref())
            .identifier_equals("DEFAULT_NAMESPACE", self.default_namespace.as_ref())
            .identifier_equals("DEFAULT_ROLE", self.default_role.as_ref())
            .list(
                "DEFAULT_SECONDARY_ROLES",
                self.default_secondary_roles.as_ref().map(SecondaryRoles::as_list),
                Quotes::Single,
                Assignment::Equals,
            )
            .number("MINS_TO_BYPASS_MFA", self.mins_to_bypass_mfa)
            .text("RSA_PUBLIC_KEY", self.rsa_public_key.as_deref())
            .text("RSA_PUBLIC_KEY_2", self.rsa_public_key_2.as_deref())
            .text("COMMENT", self.comment.as_deref());
    }
}

/// Object and session parameters that can be set on a user.
#[derive(Clone, Debug, Default)]
pub struct UserParameters {
    pub enable_unredacted_query_syntax_error: Option<bool>,
    pub network_policy: Option<AccountObjectIdentifier>,
    pub prevent_unload_to_internal_stages: Option<bool>,
    pub autocommit: Option<bool>,
    pub query_tag: Option<String>,
    pub timezone: Option<String>,
    pub statement_timeout_in_seconds: Option<i64>,
    pub lock_timeout: Option<i64>,
}

impl UserParameters {
    fn is_empty(&self) -> bool {
        self.enable_unredacted_query_syntax_error.is_none()
            && self.network_policy.is_none()
            && self.prevent_unload_to_internal_stages.is_none()
            && self.autocommit.is_none()
            && self.query_tag.is_none()
            && self.timezone.is_none()
            && self.statement_timeout_in_seconds.is_none()
            && self.lock_timeout.is_none()
    }
}

impl Clause for UserParameters {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.boolean(
            "ENABLE_UNREDACTED_QUERY_SYNTAX_ERROR",
            self.enable_unredacted_query_syntax_error,
        )
        .identifier_equals("NETWORK_POLICY", self.network_policy.as_ref())
        .boolean(
            "PREVENT_UNLOAD_TO_INTERNAL_STAGES",
            self.prevent_unload_to_internal_stages,
        )
        .boolean("AUTOCOMMIT", self.autocommit)
        .text("QUERY_TAG", self.query_tag.as_deref())
        .text("TIMEZONE", self.timezone.as_deref())
        .number("STATEMENT_TIMEOUT_IN_SECONDS", self.statement_timeout_in_seconds)
        .number("LOCK_TIMEOUT", self.lock_timeout);
    }
}

#[derive(Clone, Debug, Default)]
pub struct CreateUserOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub properties: Option<UserProperties>,
    pub parameters: Option<UserParameters>,
    pub tag: Vec<TagAssociation>,
}

impl SqlStatement for CreateUserOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        if let Some(properties) = &self.properties {
            properties.validate(&mut validator);
        }
        if let Some(parameters) = &self.parameters {
            validator.identifier_opt(parameters.network_policy.as_ref());
        }
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("USER")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .nested(None, self.properties.as_ref())
            .nested(None, self.parameters.as_ref());
        with_tags(sql, &self.tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct UserSet {
    pub properties: Option<UserProperties>,
    pub parameters: Option<UserParameters>,
}

impl Clause for UserSet {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.nested(None, self.properties.as_ref())
            .nested(None, self.parameters.as_ref());
    }
}

/// Property and parameter names to reset to their defaults.
#[derive(Clone, Debug, Default)]
pub struct UserUnset {
    pub password: bool,
    pub login_name: bool,
    pub display_name: bool,
    pub first_name: bool,
    pub middle_name: bool,
    pub last_name: bool,
    pub email: bool,
    pub must_change_password: bool,
    pub disabled: bool,
    pub days_to_expiry: bool,
    pub mins_to_unlock: bool,
    pub default_warehouse: bool,
    pub default_namespace: bool,
    pub default_role: bool,
    pub default_secondary_roles: bool,
    pub mins_to_bypass_mfa: bool,
    pub rsa_public_key: bool,
    pub rsa_public_key_2: bool,
    pub comment: bool,
    pub network_policy: bool,
    pub query_tag: bool,
    pub timezone: bool,
    pub statement_timeout_in_seconds: bool,
}

impl UserUnset {
    fn fields(&self) -> Vec<&'static str> {
        [
            (self.password, "PASSWORD"),
            (self.login_name, "LOGIN_NAME"),
            (self.display_name, "DISPLAY_NAME"),
            (self.first_name, "FIRST_NAME"),
            (self.middle_name, "MIDDLE_NAME"),
            (self.last_name, "LAST_NAME"),
            (self.email, "EMAIL"),
            (self.must_change_password, "MUST_CHANGE_PASSWORD"),
            (self.disabled, "DISABLED"),
            (self.days_to_expiry, "DAYS_TO_EXPIRY"),
            (self.mins_to_unlock, "MINS_TO_UNLOCK"),
            (self.default_warehouse, "DEFAULT_WAREHOUSE"),
            (self.default_namespace, "DEFAULT_NAMESPACE"),
            (self.default_role, "DEFAULT_ROLE"),
            (self.default_secondary_roles, "DEFAULT_SECONDARY_ROLES"),
            (self.mins_to_bypass_mfa, "MINS_TO_BYPASS_MFA"),
            (self.rsa_public_key, "RSA_PUBLIC_KEY"),
            (self.rsa_public_key_2, "RSA_PUBLIC_KEY_2"),
            (self.comment, "COMMENT"),
            (self.network_policy, "NETWORK_POLICY"),
            (self.query_tag, "QUERY_TAG"),
            (self.timezone, "TIMEZONE"),
            (self.statement_timeout_in_seconds, "STATEMENT_TIMEOUT_IN_SECONDS"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

impl Clause for UserUnset {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.comma_separated("UNSET", &self.fields());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterUserOptions {
    pub if_exists: bool,
    pub new_name: Option<AccountObjectIdentifier>,
    pub reset_password: bool,
    pub abort_all_queries: bool,
    pub set: Option<UserSet>,
    pub unset: Option<UserUnset>,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
}

impl SqlStatement for AlterUserOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("ResetPassword", self.reset_password),
                ("AbortAllQueries", self.abort_all_queries),
                ("Set", self.set.is_some()),
                ("Unset", self.unset.is_some()),
                ("SetTag", !self.set_tag.is_empty()),
                ("UnsetTag", !self.unset_tag.is_empty()),
            ]);
        if let Some(set) = &self.set {
            let properties_empty = set.properties.as_ref().map_or(true, UserProperties::is_empty);
            let parameters_empty = set.parameters.as_ref().map_or(true, UserParameters::is_empty);
            validator.check(properties_empty && parameters_empty, || {
                SnowflakeError::AtLeastOneOf {
                    fields: vec!["Properties", "Parameters"],
                }
            });
            if let Some(properties) = &set.properties {
                properties.validate(&mut validator);
            }
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
        sql.keyword("ALTER USER")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref())
            .keyword_if(self.reset_password, "RESET PASSWORD")
            .keyword_if(self.abort_all_queries, "ABORT ALL QUERIES")
            .nested(Some("SET"), self.set.as_ref())
            .nested(None, self.unset.as_ref());
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropUserOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropUserOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP USER")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowUserOptions {
    pub terse: bool,
    pub like: Option<Like>,
    pub starts_with: Option<String>,
    pub limit: Option<LimitFrom>,
}

impl SqlStatement for ShowUserOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), None)
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW")
            .keyword_if(self.terse, "TERSE")
            .keyword("USERS")
            .nested(None, self.like.as_ref());
        starts_with(sql, self.starts_with.as_deref());
        sql.nested(None, self.limit.as_ref());
    }
}

#[derive(Debug, Default)]
struct UserRow {
    name: Option<String>,
    created_on: Option<DateTime<Utc>>,
    login_name: Option<String>,
    display_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    mins_to_unlock: Option<String>,
    days_to_expiry: Option<String>,
    comment: Option<String>,
    disabled: Option<bool>,
    must_change_password: Option<bool>,
    snowflake_lock: Option<bool>,
    default_warehouse: Option<String>,
    default_namespace: Option<String>,
    default_role: Option<String>,
    default_secondary_roles: Option<String>,
    ext_authn_duo: Option<bool>,
    ext_authn_uid: Option<String>,
    mins_to_bypass_mfa: Option<String>,
    owner: Option<String>,
    last_success_login: Option<DateTime<Utc>>,
    expires_at_time: Option<DateTime<Utc>>,
    locked_until_time: Option<DateTime<Utc>>,
    has_password: Option<bool>,
    has_rsa_public_key: Option<bool>,
}
impl_from_row!(UserRow {
    name,
    created_on,
    login_name,
    display_name,
    first_name,
    last_name,
    email,
    mins_to_unlock,
    days_to_expiry,
    comment,
    disabled,
    must_change_password,
    snowflake_lock,
    default_warehouse,
    default_namespace,
    default_role,
    default_secondary_roles,
    ext_authn_duo,
    ext_authn_uid,
    mins_to_bypass_mfa,
    owner,
    last_success_login,
    expires_at_time,
    locked_until_time,
    has_password,
    has_rsa_public_key,
});

/// A row of `SHOW USERS`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub name: String,
    pub created_on: Option<DateTime<Utc>>,
    pub login_name: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mins_to_unlock: String,
    pub days_to_expiry: String,
    pub comment: String,
    pub disabled: bool,
    pub must_change_password: bool,
    pub snowflake_lock: bool,
    pub default_warehouse: String,
    pub default_namespace: String,
    pub default_role: String,
    pub default_secondary_roles: Vec<String>,
    pub ext_authn_duo: bool,
    pub ext_authn_uid: String,
    pub mins_to_bypass_mfa: String,
    pub owner: String,
    pub last_success_login: Option<DateTime<Utc>>,
    pub expires_at_time: Option<DateTime<Utc>>,
    pub locked_until_time: Option<DateTime<Utc>>,
    pub has_password: bool,
    pub has_rsa_public_key: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            name: row.name.unwrap_or_default(),
            created_on: row.created_on,
            login_name: row.login_name.unwrap_or_default(),
            display_name: row.display_name.unwrap_or_default(),
            first_name: row.first_name.unwrap_or_default(),
            last_name: row.last_name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            mins_to_unlock: row.mins_to_unlock.unwrap_or_default(),
            days_to_expiry: row.days_to_expiry.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            disabled: row.disabled.unwrap_or_default(),
            must_change_password: row.must_change_password.unwrap_or_default(),
            snowflake_lock: row.snowflake_lock.unwrap_or_default(),
            default_warehouse: row.default_warehouse.unwrap_or_default(),
            default_namespace: row.default_namespace.unwrap_or_default(),
            default_role: row.default_role.unwrap_or_default(),
            default_secondary_roles: row
                .default_secondary_roles
                .as_deref()
                .map(parse_bracketed_list)
                .unwrap_or_default(),
            ext_authn_duo: row.ext_authn_duo.unwrap_or_default(),
            ext_authn_uid: row.ext_authn_uid.unwrap_or_default(),
            mins_to_bypass_mfa: row.mins_to_bypass_mfa.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            last_success_login: row.last_success_login,
            expires_at_time: row.expires_at_time,
            locked_until_time: row.locked_until_time,
            has_password: row.has_password.unwrap_or_default(),
            has_rsa_public_key: row.has_rsa_public_key.unwrap_or_default(),
        }
    }
}

impl Identified for User {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

#[derive(Debug, Default)]
struct UserPropertyRow {
    property: Option<String>,
    value: Option<String>,
}
impl_from_row!(UserPropertyRow { property, value });

/// The result of `DESCRIBE USER`, one field per reported property.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserDetails {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub display_name: Option<String>,
    pub login_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub must_change_password: Option<bool>,
    pub disabled: Option<bool>,
    pub snowflake_lock: Option<bool>,
    pub snowflake_support: Option<bool>,
    pub days_to_expiry: Option<f64>,
    pub mins_to_unlock: Option<i64>,
    pub default_warehouse: Option<String>,
    pub default_namespace: Option<String>,
    pub default_role: Option<String>,
    pub default_secondary_roles: Option<Vec<String>>,
    pub ext_authn_duo: Option<bool>,
    pub ext_authn_uid: Option<String>,
    pub mins_to_bypass_mfa: Option<i64>,
    pub mins_to_bypass_network_policy: Option<i64>,
    pub rsa_public_key_fp: Option<String>,
    pub rsa_public_key_2_fp: Option<String>,
}

fn property_value<T: std::str::FromStr>(property: &str, value: &str) -> SnowflakeResult<T> {
    value
        .parse()
        .map_err(|_| SnowflakeError::decoding(property, format!("unexpected value {value:?}")))
}

impl UserDetails {
    fn from_properties(rows: Vec<UserPropertyRow>) -> SnowflakeResult<Self> {
        let mut details = UserDetails::default();
        for row in rows {
            let (Some(property), Some(value)) = (row.property, row.value) else {
                continue;
            };
            if value == "null" {
                continue;
            }
            let text = || Some(value.clone());
            let flag = || property_value::<bool>(&property, &value.to_ascii_lowercase()).map(Some);
            let number = || property_value::<i64>(&property, &value).map(Some);
            match property.as_str() {
                "NAME" => details.name = text(),
                "COMMENT" => details.comment = text(),
                "DISPLAY_NAME" => details.display_name = text(),
                "LOGIN_NAME" => details.login_name = text(),
                "FIRST_NAME" => details.first_name = text(),
                "MIDDLE_NAME" => details.middle_name = text(),
                "LAST_NAME" => details.last_name = text(),
                "EMAIL" => details.email = text(),
                "PASSWORD" => details.password = text(),
                "MUST_CHANGE_PASSWORD" => details.must_change_password = flag()?,
                "DISABLED" => details.disabled = flag()?,
                "SNOWFLAKE_LOCK" => details.snowflake_lock = flag()?,
                "SNOWFLAKE_SUPPORT" => details.snowflake_support = flag()?,
                "DAYS_TO_EXPIRY" => details.days_to_expiry = Some(property_value(&property, &value)?),
                "MINS_TO_UNLOCK" => details.mins_to_unlock = number()?,
                "DEFAULT_WAREHOUSE" => details.default_warehouse = text(),
                "DEFAULT_NAMESPACE" => details.default_namespace = text(),
                "DEFAULT_ROLE" => details.default_role = text(),
                "DEFAULT_SECONDARY_ROLES" => {
                    details.default_secondary_roles = Some(parse_bracketed_list(&value))
                }
                "EXT_AUTHN_DUO" => details.ext_authn_duo = flag()?,
                "EXT_AUTHN_UID" => details.ext_authn_uid = text(),
                "MINS_TO_BYPASS_MFA" => details.mins_to_bypass_mfa = number()?,
                "MINS_TO_BYPASS_NETWORK_POLICY" => details.mins_to_bypass_network_policy = number()?,
                "RSA_PUBLIC_KEY_FP" => details.rsa_public_key_fp = text(),
                "RSA_PUBLIC_KEY_2_FP" => details.rsa_public_key_2_fp = text(),
                other => log::debug!("ignoring user property {other}"),
            }
        }
        Ok(details)
    }
}

pub struct Users<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Users<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&CreateUserOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateUserOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterUserOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&DropUserOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropUserOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowUserOptions>) -> SnowflakeResult<Vec<User>> {
        let default = ShowUserOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<UserRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<User> {
        let users = self
            .show(Some(&ShowUserOptions {
                like: Some(Like::new(id.name())),
                ..ShowUserOptions::default()
            }))
            .await?;
        find_by_id(users, id)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<UserDetails> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE USER {}", id.fully_qualified_name());
        let rows: Vec<UserPropertyRow> = query_all(self.executor, &sql).await?;
        UserDetails::from_properties(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> AccountObjectIdentifier {
        AccountObjectIdentifier::new("alice")
    }

    #[test]
    fn create_with_properties_and_parameters() {
        let opts = CreateUserOptions {
            if_not_exists: true,
            properties: Some(UserProperties {
                login_name: Some("alice@example.com".into()),
                must_change_password: Some(true),
                default_role: Some(AccountObjectIdentifier::new("analyst")),
                default_secondary_roles: Some(SecondaryRoles::All),
                ..UserProperties::default()
            }),
            parameters: Some(UserParameters {
                timezone: Some("UTC".into()),
                ..UserParameters::default()
            }),
            tag: vec![TagAssociation::new(SchemaObjectIdentifier::new("db", "sc", "pii"), "no")],
            ..CreateUserOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE USER IF NOT EXISTS "alice" LOGIN_NAME = 'alice@example.com' MUST_CHANGE_PASSWORD = true DEFAULT_ROLE = "analyst" DEFAULT_SECONDARY_ROLES = ('ALL') TIMEZONE = 'UTC' TAG ("db"."sc"."pii" = 'no')"#
        );
    }

    #[test]
    fn alter_actions() {
        let reset = AlterUserOptions {
            if_exists: true,
            reset_password: true,
            ..AlterUserOptions::default()
        };
        assert_eq!(
            reset.to_sql(&id()).unwrap(),
            r#"ALTER USER IF EXISTS "alice" RESET PASSWORD"#
        );
        let set = AlterUserOptions {
            set: Some(UserSet {
                properties: Some(UserProperties {
                    disabled: Some(true),
                    default_secondary_roles: Some(SecondaryRoles::None),
                    ..UserProperties::default()
                }),
                parameters: None,
            }),
            ..AlterUserOptions::default()
        };
        assert_eq!(
            set.to_sql(&id()).unwrap(),
            r#"ALTER USER "alice" SET DISABLED = true DEFAULT_SECONDARY_ROLES = ()"#
        );
        let unset = AlterUserOptions {
            unset: Some(UserUnset {
                email: true,
                network_policy: true,
                ..UserUnset::default()
            }),
            ..AlterUserOptions::default()
        };
        assert_eq!(
            unset.to_sql(&id()).unwrap(),
            r#"ALTER USER "alice" UNSET EMAIL, NETWORK_POLICY"#
        );
    }

    #[test]
    fn empty_set_is_rejected() {
        let opts = AlterUserOptions {
            set: Some(UserSet::default()),
            ..AlterUserOptions::default()
        };
        assert!(matches!(opts.to_sql(&id()), Err(SnowflakeError::AtLeastOneOf { .. })));
    }

    #[test]
    fn show_filters() {
        let opts = ShowUserOptions {
            terse: true,
            like: Some(Like::new("al%")),
            starts_with: Some("a".into()),
            limit: Some(LimitFrom::new(5)),
        };
        assert_eq!(
            opts.to_sql(&()).unwrap(),
            "SHOW TERSE USERS LIKE 'al%' STARTS WITH 'a' LIMIT 5"
        );
    }

    #[tokio::test]
    async fn show_by_id_parses_secondary_roles() {
        let rows = Rows::from_text(
            &["name", "disabled", "default_secondary_roles"],
            vec![vec![Some("alice"), Some("false"), Some(r#"["ALL"]"#)]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let user = Users::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(executor.last(), "SHOW USERS LIKE 'alice'");
        assert_eq!(user.default_secondary_roles, vec!["ALL"]);
        assert!(!user.disabled);
    }

    #[tokio::test]
    async fn describe_reads_properties() {
        let rows = Rows::from_text(
            &["property", "value", "default", "description"],
            vec![
                vec![Some("NAME"), Some("ALICE"), Some("null"), None],
                vec![Some("DISABLED"), Some("true"), Some("false"), None],
                vec![Some("MINS_TO_UNLOCK"), Some("null"), Some("null"), None],
                vec![Some("DAYS_TO_EXPIRY"), Some("29.99"), Some("null"), None],
                vec![Some("DEFAULT_SECONDARY_ROLES"), Some(r#"["ALL"]"#), None, None],
            ],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let details = Users::new(&executor).describe(&id()).await.unwrap();
        assert_eq!(executor.last(), r#"DESCRIBE USER "alice""#);
        assert_eq!(details.name.as_deref(), Some("ALICE"));
        assert_eq!(details.disabled, Some(true));
        assert_eq!(details.mins_to_unlock, None);
        assert_eq!(details.days_to_expiry, Some(29.99));
        assert_eq!(details.default_secondary_roles, Some(vec!["ALL".to_owned()]));
    }

    #[tokio::test]
    async fn alter_without_options_is_refused() {
        let executor = RecordingExecutor::new();
        let err = Users::new(&executor).alter(&id(), None).await.unwrap_err();
        assert!(matches!(err, SnowflakeError::NilOptions));
        assert!(executor.statements().is_empty());
    }
}
