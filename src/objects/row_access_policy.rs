use chrono::{DateTime, Utc};

use crate::builder::{SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, set_tags, unset_tags, validate_filters, validate_tags, Identified, In, Like,
    TagAssociation,
};
use crate::objects::masking_policy::{
    parse_signature, render_signature, validate_signature, PolicyArgument, PolicyDescriptionRow,
};
use crate::query::{exec, impl_from_row, query_all, query_one, Executor};
use crate::validation::{require, validate_identifier, Validator};

#[derive(Clone, Debug)]
pub struct CreateRowAccessPolicyOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub signature: Vec<PolicyArgument>,
    /// Boolean SQL expression after `->`.
    pub body: String,
    pub comment: Option<String>,
}

impl CreateRowAccessPolicyOptions {
    pub fn new(signature: Vec<PolicyArgument>, body: impl Into<String>) -> Self {
        Self {
            or_replace: false,
            if_not_exists: false,
            signature,
            body: body.into(),
            comment: None,
        }
    }
}

impl SqlStatement for CreateRowAccessPolicyOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)])
            .check(self.body.trim().is_empty(), || {
                SnowflakeError::invalid_option("Body", "a policy body is required")
            });
        validate_signature(&mut validator, &self.signature);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("ROW ACCESS POLICY")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .raw(&render_signature(&self.signature))
            .raw(&format!("RETURNS BOOLEAN -> {}", self.body))
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterRowAccessPolicyOptions {
    pub new_name: Option<SchemaObjectIdentifier>,
    pub set_body: Option<String>,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
}

impl SqlStatement for AlterRowAccessPolicyOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("SetBody", self.set_body.is_some()),
                ("SetTag", !self.set_tag.is_empty()),
                ("UnsetTag", !self.unset_tag.is_empty()),
                ("SetComment", self.set_comment.is_some()),
                ("UnsetComment", self.unset_comment),
            ]);
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER ROW ACCESS POLICY")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref());
        if let Some(body) = &self.set_body {
            sql.raw(&format!("SET BODY -> {body}"));
        }
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
        sql.keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropRowAccessPolicyOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropRowAccessPolicyOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP ROW ACCESS POLICY")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowRowAccessPolicyOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
}

impl SqlStatement for ShowRowAccessPolicyOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW ROW ACCESS POLICIES")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
    }
}

#[derive(Debug, Default)]
struct RowAccessPolicyRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    database_name: Option<String>,
    schema_name: Option<String>,
    kind: Option<String>,
    owner: Option<String>,
    comment: Option<String>,
    options: Option<String>,
    owner_role_type: Option<String>,
}
impl_from_row!(RowAccessPolicyRow {
    created_on,
    name,
    database_name,
    schema_name,
    kind,
    owner,
    comment,
    options,
    owner_role_type,
});

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowAccessPolicy {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub kind: String,
    pub owner: String,
    pub comment: String,
    pub options: String,
    pub owner_role_type: String,
}

impl From<RowAccessPolicyRow> for RowAccessPolicy {
    fn from(row: RowAccessPolicyRow) -> Self {
        RowAccessPolicy {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            kind: row.kind.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            options: row.options.unwrap_or_default(),
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        }
    }
}

impl Identified for RowAccessPolicy {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

/// Output of `DESCRIBE ROW ACCESS POLICY`; the return type is always BOOLEAN.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowAccessPolicyDetails {
    pub name: String,
    pub signature: Vec<PolicyArgument>,
    pub return_type: String,
    pub body: String,
}

impl TryFrom<PolicyDescriptionRow> for RowAccessPolicyDetails {
    type Error = SnowflakeError;

    fn try_from(row: PolicyDescriptionRow) -> SnowflakeResult<Self> {
        Ok(RowAccessPolicyDetails {
            name: row.name.unwrap_or_default(),
            signature: parse_signature(row.signature.as_deref().unwrap_or("()"))?,
            return_type: row.return_type.unwrap_or_default(),
            body: row.body.unwrap_or_default(),
        })
    }
}

pub struct RowAccessPolicies<'a> {
    executor: &'a dyn Executor,
}

impl<'a> RowAccessPolicies<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &SchemaObjectIdentifier,
        opts: &CreateRowAccessPolicyOptions,
    ) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&AlterRowAccessPolicyOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&DropRowAccessPolicyOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropRowAccessPolicyOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(
        &self,
        opts: Option<&ShowRowAccessPolicyOptions>,
    ) -> SnowflakeResult<Vec<RowAccessPolicy>> {
        let default = ShowRowAccessPolicyOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<RowAccessPolicyRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(RowAccessPolicy::from).collect())
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<RowAccessPolicy> {
        let policies = self
            .show(Some(&ShowRowAccessPolicyOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
            }))
            .await?;
        find_by_id(policies, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<RowAccessPolicyDetails> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE ROW ACCESS POLICY {}", id.fully_qualified_name());
        let row: PolicyDescriptionRow = query_one(self.executor, &sql).await?;
        RowAccessPolicyDetails::try_from(row)
    }
}
