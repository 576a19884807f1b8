use chrono::{DateTime, Utc};

use crate::builder::{Assignment, Clause, Quotes, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier};
use crate::objects::common::{find_by_id, validate_filters, Identified, Like};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

fn ip_list(sql: &mut SqlBuilder, name: &str, ips: Option<&Vec<String>>) {
    sql.list(name, ips.map(Vec::as_slice), Quotes::Single, Assignment::Equals);
}

#[derive(Clone, Debug, Default)]
pub struct CreateNetworkPolicyOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub allowed_ip_list: Option<Vec<String>>,
    pub blocked_ip_list: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl SqlStatement for CreateNetworkPolicyOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("NETWORK POLICY")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id);
        ip_list(sql, "ALLOWED_IP_LIST", self.allowed_ip_list.as_ref());
        ip_list(sql, "BLOCKED_IP_LIST", self.blocked_ip_list.as_ref());
        sql.text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct NetworkPolicySet {
    pub allowed_ip_list: Option<Vec<String>>,
    pub blocked_ip_list: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl Clause for NetworkPolicySet {
    fn render(&self, sql: &mut SqlBuilder) {
        ip_list(sql, "ALLOWED_IP_LIST", self.allowed_ip_list.as_ref());
        ip_list(sql, "BLOCKED_IP_LIST", self.blocked_ip_list.as_ref());
        sql.text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterNetworkPolicyOptions {
    pub if_exists: bool,
    pub set: Option<NetworkPolicySet>,
    pub unset_comment: bool,
    pub new_name: Option<AccountObjectIdentifier>,
}

impl SqlStatement for AlterNetworkPolicyOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("Set", self.set.is_some()),
                ("UnsetComment", self.unset_comment),
                ("NewName", self.new_name.is_some()),
            ]);
        if let Some(set) = &self.set {
            validator.at_least_one_of(&[
                ("AllowedIpList", set.allowed_ip_list.is_some()),
                ("BlockedIpList", set.blocked_ip_list.is_some()),
                ("Comment", set.comment.is_some()),
            ]);
        }
        validator.finish()
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER NETWORK POLICY")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .nested(Some("SET"), self.set.as_ref())
            .keyword_if(self.unset_comment, "UNSET COMMENT")
            .identifier_after("RENAME TO", self.new_name.as_ref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropNetworkPolicyOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropNetworkPolicyOptions {
    type Target = AccountObjectIdentifier;

    fn validate(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &AccountObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP NETWORK POLICY")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowNetworkPolicyOptions {
    pub like: Option<Like>,
}

impl SqlStatement for ShowNetworkPolicyOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), None)
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW NETWORK POLICIES").nested(None, self.like.as_ref());
    }
}

#[derive(Debug, Default)]
struct NetworkPolicyRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    comment: Option<String>,
    entries_in_allowed_ip_list: Option<i64>,
    entries_in_blocked_ip_list: Option<i64>,
    entries_in_allowed_network_rules: Option<i64>,
    entries_in_blocked_network_rules: Option<i64>,
}
impl_from_row!(NetworkPolicyRow {
    created_on,
    name,
    comment,
    entries_in_allowed_ip_list,
    entries_in_blocked_ip_list,
    entries_in_allowed_network_rules,
    entries_in_blocked_network_rules,
});

/// A row of `SHOW NETWORK POLICIES`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkPolicy {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub comment: String,
    pub entries_in_allowed_ip_list: i64,
    pub entries_in_blocked_ip_list: i64,
    pub entries_in_allowed_network_rules: i64,
    pub entries_in_blocked_network_rules: i64,
}

impl From<NetworkPolicyRow> for NetworkPolicy {
    fn from(row: NetworkPolicyRow) -> Self {
        NetworkPolicy {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            entries_in_allowed_ip_list: row.entries_in_allowed_ip_list.unwrap_or_default(),
            entries_in_blocked_ip_list: row.entries_in_blocked_ip_list.unwrap_or_default(),
            entries_in_allowed_network_rules: row
                .entries_in_allowed_network_rules
                .unwrap_or_default(),
            entries_in_blocked_network_rules: row
                .entries_in_blocked_network_rules
                .unwrap_or_default(),
        }
    }
}

impl Identified for NetworkPolicy {
    type Id = AccountObjectIdentifier;

    fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

#[derive(Debug, Default)]
struct NetworkPolicyPropertyRow {
    name: Option<String>,
    value: Option<String>,
}
impl_from_row!(NetworkPolicyPropertyRow { name, value });

/// The lists reported by `DESCRIBE NETWORK POLICY`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkPolicyDetails {
    pub allowed_ip_list: Vec<String>,
    pub blocked_ip_list: Vec<String>,
}

fn split_ips(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned)
        .collect()
}

pub struct NetworkPolicies<'a> {
    executor: &'a dyn Executor,
}

impl<'a> NetworkPolicies<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&CreateNetworkPolicyOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateNetworkPolicyOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&AlterNetworkPolicyOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &AccountObjectIdentifier,
        opts: Option<&DropNetworkPolicyOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropNetworkPolicyOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowNetworkPolicyOptions>) -> SnowflakeResult<Vec<NetworkPolicy>> {
        let default = ShowNetworkPolicyOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<NetworkPolicyRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(NetworkPolicy::from).collect())
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<NetworkPolicy> {
        let policies = self
            .show(Some(&ShowNetworkPolicyOptions {
                like: Some(Like::new(id.name())),
            }))
            .await?;
        find_by_id(policies, id)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> SnowflakeResult<NetworkPolicyDetails> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE NETWORK POLICY {}", id.fully_qualified_name());
        let rows: Vec<NetworkPolicyPropertyRow> = query_all(self.executor, &sql).await?;
        let mut details = NetworkPolicyDetails::default();
        for row in rows {
            let value = row.value.unwrap_or_default();
            match row.name.as_deref() {
                Some("ALLOWED_IP_LIST") => details.allowed_ip_list = split_ips(&value),
                Some("BLOCKED_IP_LIST") => details.blocked_ip_list = split_ips(&value),
                Some(other) => log::debug!("ignoring network policy property {other}"),
                None => {
                    return Err(SnowflakeError::decoding("name", "property name is missing"))
                }
            }
        }
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> AccountObjectIdentifier {
        AccountObjectIdentifier::new("office")
    }

    #[test]
    fn create_lists_ips() {
        let opts = CreateNetworkPolicyOptions {
            or_replace: true,
            allowed_ip_list: Some(vec!["192.168.0.0/24".into(), "10.0.0.1".into()]),
            blocked_ip_list: Some(vec![]),
            comment: Some("office".into()),
            ..CreateNetworkPolicyOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE NETWORK POLICY "office" ALLOWED_IP_LIST = ('192.168.0.0/24', '10.0.0.1') BLOCKED_IP_LIST = () COMMENT = 'office'"#
        );
    }

    #[test]
    fn alter_set_and_rename() {
        let set = AlterNetworkPolicyOptions {
            set: Some(NetworkPolicySet {
                blocked_ip_list: Some(vec!["1.1.1.1".into()]),
                ..NetworkPolicySet::default()
            }),
            ..AlterNetworkPolicyOptions::default()
        };
        assert_eq!(
            set.to_sql(&id()).unwrap(),
            r#"ALTER NETWORK POLICY "office" SET BLOCKED_IP_LIST = ('1.1.1.1')"#
        );
        let rename = AlterNetworkPolicyOptions {
            if_exists: true,
            new_name: Some(AccountObjectIdentifier::new("home")),
            ..AlterNetworkPolicyOptions::default()
        };
        assert_eq!(
            rename.to_sql(&id()).unwrap(),
            r#"ALTER NETWORK POLICY IF EXISTS "office" RENAME TO "home""#
        );
        let empty = AlterNetworkPolicyOptions {
            set: Some(NetworkPolicySet::default()),
            ..AlterNetworkPolicyOptions::default()
        };
        assert!(matches!(empty.to_sql(&id()), Err(SnowflakeError::AtLeastOneOf { .. })));
    }

    #[tokio::test]
    async fn describe_splits_lists() {
        let rows = Rows::from_text(
            &["name", "value"],
            vec![
                vec![Some("ALLOWED_IP_LIST"), Some("192.168.0.0/24,10.0.0.1")],
                vec![Some("BLOCKED_IP_LIST"), Some("")],
            ],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let details = NetworkPolicies::new(&executor).describe(&id()).await.unwrap();
        assert_eq!(executor.last(), r#"DESCRIBE NETWORK POLICY "office""#);
        assert_eq!(details.allowed_ip_list, vec!["192.168.0.0/24", "10.0.0.1"]);
        assert!(details.blocked_ip_list.is_empty());
    }

    #[tokio::test]
    async fn show_by_id_without_rows_is_not_found() {
        let executor = RecordingExecutor::new();
        let err = NetworkPolicies::new(&executor).show_by_id(&id()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(executor.last(), "SHOW NETWORK POLICIES LIKE 'office'");
    }
}
