//! Client redirect connections (`CREATE CONNECTION`), replicated across accounts
//! for failover.
use chrono::{DateTime, Utc};

use crate::builder::{SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountIdentifier, AccountObjectIdentifier, ExternalObjectIdentifier, ObjectIdentifier};
use crate::objects::common::{find_by_id, parse_comma_separated, validate_filters, Identified, Like};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

/// `CREATE CONNECTION [IF NOT EXISTS] <name> [AS REPLICA OF <org>.<account>.<name>]`
#[derive(Clone, Debug, Default)]
pub struct CreateConnectionOptions {
    pub if_not_exists: bool,
    /// Set to create a secondary connection.
    pub as_replica_of: Option<ExternalObjectIdentifier>,
    pub comment: Option<String>,
}

impl SqlStatement for CreateConnectionOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.as_replica_of.as_ref());
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE CONNECTION")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .identifier_after("AS REPLICA OF", self.as_replica_of.as_ref())
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnableFailover {
    pub to_accounts: Vec<AccountIdentifier>,
    pub ignore_edition_check: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AlterConnectionOptions {
    pub enable_failover: Option<EnableFailover>,
    /// `DISABLE FAILOVER [TO ACCOUNTS ...]`; an empty list disables failover to all accounts.
    pub disable_failover: Option<Vec<AccountIdentifier>>,
    pub primary: bool,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
}

impl SqlStatement for AlterConnectionOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).exactly_one_of(&[
            ("EnableFailover", self.enable_failover.is_some()),
            ("DisableFailover", self.disable_failover.is_some()),
            ("Primary", self.primary),
            ("SetComment", self.set_comment.is_some()),
            ("UnsetComment", self.unset_comment),
        ]);
        if let Some(enable) = &self.enable_failover {
            validator
                .identifiers(&enable.to_accounts)
                .check(enable.to_accounts.is_empty(), || {
                    SnowflakeError::invalid_option("EnableFailover", "at least one account is required")
                });
        }
        if let Some(accounts) = &self.disable_failover {
            validator.identifiers(accounts);
        }
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER CONNECTION").identifier(id);
        if let Some(enable) = &self.enable_failover {
            sql.identifier_list("ENABLE FAILOVER TO ACCOUNTS", Some(&enable.to_accounts[..]))
                .keyword_if(enable.ignore_edition_check, "IGNORE EDITION CHECK");
        }
        if let Some(accounts) = &self.disable_failover {
            sql.keyword("DISABLE FAILOVER");
            if !accounts.is_empty() {
                sql.identifier_list("TO ACCOUNTS", Some(&accounts[..]));
            }
        }
        sql.keyword_if(self.primary, "PRIMARY")
            .keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropConnectionOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropConnectionOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP CONNECTION")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowConnectionOptions {
    pub like: Option<Like>,
}

impl SqlStatement for ShowConnectionOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), None)
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW CONNECTIONS").nested(None, self.like.as_ref());
    }
}

#[derive(Debug, Default)]
struct ConnectionRow {
    snowflake_region: Option<String>,
    created_on: Option<DateTime<Utc>>,
    account_name: Option<String>,
    name: Option<String>,
    comment: Option<String>,
    is_primary: Option<bool>,
    primary: Option<String>,
    failover_allowed_to_accounts: Option<String>,
    connection_url: Option<String>,
    organization_name: Option<String>,
    account_locator: Option<String>,
}
impl_from_row!(ConnectionRow {
    snowflake_region,
    created_on,
    account_name,
    name,
    comment,
    is_primary,
    primary,
    failover_allowed_to_accounts,
    connection_url,
    organization_name,
    account_locator,
});

/// A row of `SHOW CONNECTIONS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationConnection {
    pub snowflake_region: String,
    pub created_on: Option<DateTime<Utc>>,
    pub account_name: String,
    pub name: String,
    pub comment: Option<String>,
    pub is_primary: bool,
    /// The primary connection, `<org>.<account>.<name>`.
    pub primary: Option<ExternalObjectIdentifier>,
    pub failover_allowed_to_accounts: Vec<AccountIdentifier>,
    pub connection_url: String,
    pub organization_name: String,
    pub account_locator: String,
}

/// Accounts are listed as `ORG.ACCOUNT`, sometimes prefixed with the region group.
fn parse_account(value: &str) -> SnowflakeResult<AccountIdentifier> {
    let parts: Vec<&str> = value.split('.').map(str::trim).collect();
    match parts.as_slice() {
        [.., organization, account] if !organization.is_empty() && !account.is_empty() => {
            Ok(AccountIdentifier::new(*organization, *account))
        }
        _ => Err(SnowflakeError::decoding(
            "failover_allowed_to_accounts",
            format!("{value:?} is not an account identifier"),
        )),
    }
}

impl TryFrom<ConnectionRow> for ReplicationConnection {
    type Error = SnowflakeError;

    fn try_from(row: ConnectionRow) -> SnowflakeResult<Self> {
        let primary = match row.primary.as_deref().map(str::trim) {
            Some(primary) if !primary.is_empty() => Some(
                primary
                    .parse::<ExternalObjectIdentifier>()
                    .map_err(|e| SnowflakeError::decoding("primary", e))?,
            ),
            _ => None,
        };
        let failover_allowed_to_accounts = parse_comma_separated(
            row.failover_allowed_to_accounts.as_deref().unwrap_or_default(),
        )
        .iter()
        .map(|account| parse_account(account))
        .collect::<SnowflakeResult<Vec<_>>>()?;
        Ok(ReplicationConnection {
            snowflake_region: row.snowflake_region.unwrap_or_default(),
            created_on: row.created_on,
            account_name: row.account_name.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            comment: row.comment.filter(|c| !c.is_empty()),
            is_primary: row.is_primary.unwrap_or_default(),
            primary,
            failover_allowed_to_accounts,
            connection_url: row.connection_url.unwrap_or_default(),
            organization_name: row.organization_name.unwrap_or_default(),
            account_locator: row.account_locator.unwrap_or_default(),
        })
    }
}

impl Identified for ReplicationConnection {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

pub struct ReplicationConnections<'a> {
    executor: &'a dyn Executor,
}

impl<'a> ReplicationConnections<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&CreateConnectionOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateConnectionOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterConnectionOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&DropConnectionOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropConnectionOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowConnectionOptions>) -> SnowflakeResult<Vec<ReplicationConnection>> {
        let default = ShowConnectionOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<ConnectionRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(ReplicationConnection::try_from).collect()
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<ReplicationConnection> {
        let connections = self
            .show(Some(&ShowConnectionOptions {
                like: Some(Like::new(id.name())),
            }))
            .await?;
        find_by_id(connections, id)
    }
}
