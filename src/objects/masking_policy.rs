use chrono::{DateTime, Utc};

use crate::builder::{SqlBuilder, SqlStatement};
use crate::data_types::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{split_top_level, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, set_tags, unset_tags, validate_filters, validate_tags, Identified, In, Like,
    LimitFrom, TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, query_one, Executor};
use crate::validation::{require, validate_identifier, Validator};

/// One `<name> <type>` entry of a policy signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyArgument {
    pub name: String,
    pub data_type: DataType,
}

impl PolicyArgument {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// `AS (VAL VARCHAR, ...)`
pub(crate) fn render_signature(arguments: &[PolicyArgument]) -> String {
    let rendered = arguments
        .iter()
        .map(|arg| format!("{} {}", arg.name, arg.data_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("AS ({rendered})")
}

pub(crate) fn validate_signature(validator: &mut Validator, arguments: &[PolicyArgument]) {
    validator.check(arguments.is_empty(), || {
        SnowflakeError::invalid_option("Signature", "at least one argument is required")
    });
    for argument in arguments {
        validator.check(argument.name.trim().is_empty(), || {
            SnowflakeError::invalid_option("Signature", "argument names cannot be empty")
        });
    }
}

/// Parse the `signature` column of DESCRIBE, e.g. `(VAL VARCHAR, N NUMBER(38,0))`.
pub(crate) fn parse_signature(value: &str) -> SnowflakeResult<Vec<PolicyArgument>> {
    let inner = value
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| SnowflakeError::decoding("signature", format!("{value:?} is not parenthesized")))?;
    split_top_level(inner, ',')
        .iter()
        .map(|argument| {
            let (name, data_type) = argument
                .split_once(char::is_whitespace)
                .ok_or_else(|| SnowflakeError::decoding("signature", format!("{argument:?} has no type")))?;
            Ok(PolicyArgument::new(name, DataType::parse(data_type)?))
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct CreateMaskingPolicyOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub signature: Vec<PolicyArgument>,
    pub returns: DataType,
    /// SQL expression after `->`.
    pub body: String,
    pub comment: Option<String>,
    pub exempt_other_policies: Option<bool>,
}

impl CreateMaskingPolicyOptions {
    pub fn new(signature: Vec<PolicyArgument>, returns: DataType, body: impl Into<String>) -> Self {
        Self {
            or_replace: false,
            if_not_exists: false,
            signature,
            returns,
            body: body.into(),
            comment: None,
            exempt_other_policies: None,
        }
    }
}

impl SqlStatement for CreateMaskingPolicyOptions {
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
            .keyword("MASKING POLICY")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .raw(&render_signature(&self.signature))
            .raw(&format!("RETURNS {} -> {}", self.returns, self.body))
            .text("COMMENT", self.comment.as_deref())
            .boolean("EXEMPT_OTHER_POLICIES", self.exempt_other_policies);
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterMaskingPolicyOptions {
    pub if_exists: bool,
    pub new_name: Option<SchemaObjectIdentifier>,
    pub set_body: Option<String>,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
}

impl SqlStatement for AlterMaskingPolicyOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("SetBody", self.set_body.is_some()),
                ("SetComment", self.set_comment.is_some()),
                ("UnsetComment", self.unset_comment),
                ("SetTag", !self.set_tag.is_empty()),
                ("UnsetTag", !self.unset_tag.is_empty()),
            ]);
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER MASKING POLICY")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref());
        if let Some(body) = &self.set_body {
            sql.raw(&format!("SET BODY -> {body}"));
        }
        sql.keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropMaskingPolicyOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropMaskingPolicyOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP MASKING POLICY")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowMaskingPolicyOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
    pub limit: Option<LimitFrom>,
}

impl SqlStatement for ShowMaskingPolicyOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW MASKING POLICIES")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref())
            .nested(None, self.limit.as_ref());
    }
}

#[derive(Debug, Default)]
struct MaskingPolicyRow {
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
impl_from_row!(MaskingPolicyRow {
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

/// A row of `SHOW MASKING POLICIES`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskingPolicy {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub kind: String,
    pub owner: String,
    pub comment: String,
    pub exempt_other_policies: bool,
    pub owner_role_type: String,
}

/// `options` holds a JSON object such as `{"EXEMPT_OTHER_POLICIES": "true"}`.
fn exempt_other_policies(options: Option<&str>) -> SnowflakeResult<bool> {
    let Some(options) = options.filter(|o| !o.trim().is_empty()) else {
        return Ok(false);
    };
    let value: serde_json::Value = serde_json::from_str(options)
        .map_err(|e| SnowflakeError::decoding("options", e))?;
    Ok(match value.get("EXEMPT_OTHER_POLICIES") {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

impl TryFrom<MaskingPolicyRow> for MaskingPolicy {
    type Error = SnowflakeError;

    fn try_from(row: MaskingPolicyRow) -> SnowflakeResult<Self> {
        Ok(MaskingPolicy {
            created_on: row.created_on,
            exempt_other_policies: exempt_other_policies(row.options.as_deref())?,
            name: row.name.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            kind: row.kind.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        })
    }
}

impl Identified for MaskingPolicy {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Debug, Default)]
pub(crate) struct PolicyDescriptionRow {
    pub(crate) name: Option<String>,
    pub(crate) signature: Option<String>,
    pub(crate) return_type: Option<String>,
    pub(crate) body: Option<String>,
}
impl_from_row!(PolicyDescriptionRow {
    name,
    signature,
    return_type,
    body,
});

/// Output of `DESCRIBE MASKING POLICY`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskingPolicyDetails {
    pub name: String,
    pub signature: Vec<PolicyArgument>,
    pub return_type: DataType,
    pub body: String,
}

impl TryFrom<PolicyDescriptionRow> for MaskingPolicyDetails {
    type Error = SnowflakeError;

    fn try_from(row: PolicyDescriptionRow) -> SnowflakeResult<Self> {
        let return_type = row
            .return_type
            .as_deref()
            .ok_or_else(|| SnowflakeError::decoding("return_type", "missing"))?;
        Ok(MaskingPolicyDetails {
            name: row.name.unwrap_or_default(),
            signature: parse_signature(row.signature.as_deref().unwrap_or("()"))?,
            return_type: DataType::parse(return_type)?,
            body: row.body.unwrap_or_default(),
        })
    }
}

pub struct MaskingPolicies<'a> {
    executor: &'a dyn Executor,
}

impl<'a> MaskingPolicies<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &SchemaObjectIdentifier,
        opts: &CreateMaskingPolicyOptions,
    ) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&AlterMaskingPolicyOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&DropMaskingPolicyOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropMaskingPolicyOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowMaskingPolicyOptions>) -> SnowflakeResult<Vec<MaskingPolicy>> {
        let default = ShowMaskingPolicyOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<MaskingPolicyRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(MaskingPolicy::try_from).collect()
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<MaskingPolicy> {
        let policies = self
            .show(Some(&ShowMaskingPolicyOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
                limit: None,
            }))
            .await?;
        find_by_id(policies, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<MaskingPolicyDetails> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE MASKING POLICY {}", id.fully_qualified_name());
        let row: PolicyDescriptionRow = query_one(self.executor, &sql).await?;
        MaskingPolicyDetails::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("db", "sc", "mask_email")
    }

    #[test]
    fn create_renders_signature_and_body() {
        let opts = CreateMaskingPolicyOptions {
            or_replace: true,
            comment: Some("emails".into()),
            exempt_other_policies: Some(true),
            ..CreateMaskingPolicyOptions::new(
                vec![PolicyArgument::new("val", DataType::Varchar)],
                DataType::Varchar,
                "CASE WHEN current_role() = 'ADMIN' THEN val ELSE '***' END",
            )
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE MASKING POLICY "db"."sc"."mask_email" AS (val VARCHAR) RETURNS VARCHAR -> CASE WHEN current_role() = 'ADMIN' THEN val ELSE '***' END COMMENT = 'emails' EXEMPT_OTHER_POLICIES = true"#
        );
    }

    #[test]
    fn create_requires_signature_and_body() {
        let opts = CreateMaskingPolicyOptions::new(vec![], DataType::Varchar, " ");
        match opts.to_sql(&id()) {
            Err(SnowflakeError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn alter_set_body() {
        let opts = AlterMaskingPolicyOptions {
            set_body: Some("'***'".into()),
            ..AlterMaskingPolicyOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"ALTER MASKING POLICY "db"."sc"."mask_email" SET BODY -> '***'"#
        );
    }

    #[test]
    fn options_column_decodes_exemption() {
        assert!(exempt_other_policies(Some(r#"{"EXEMPT_OTHER_POLICIES": "true"}"#)).unwrap());
        assert!(!exempt_other_policies(Some("")).unwrap());
        assert!(!exempt_other_policies(None).unwrap());
        assert!(exempt_other_policies(Some("{broken")).is_err());
    }

    #[tokio::test]
    async fn describe_parses_signature() {
        let rows = Rows::from_text(
            &["name", "signature", "return_type", "body"],
            vec![vec![
                Some("MASK_EMAIL"),
                Some("(VAL VARCHAR, N NUMBER(38,0))"),
                Some("VARCHAR(16777216)"),
                Some("'***'"),
            ]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let details = MaskingPolicies::new(&executor).describe(&id()).await.unwrap();
        assert_eq!(executor.last(), r#"DESCRIBE MASKING POLICY "db"."sc"."mask_email""#);
        assert_eq!(
            details.signature,
            vec![
                PolicyArgument::new("VAL", DataType::Varchar),
                PolicyArgument::new("N", DataType::Number),
            ]
        );
        assert_eq!(details.return_type, DataType::Varchar);
    }

    #[tokio::test]
    async fn show_by_id_scopes_to_schema() {
        let rows = Rows::from_text(
            &["name", "database_name", "schema_name", "options"],
            vec![vec![Some("mask_email"), Some("db"), Some("sc"), None]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let policy = MaskingPolicies::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(
            executor.last(),
            r#"SHOW MASKING POLICIES LIKE 'mask_email' IN SCHEMA "db"."sc""#
        );
        assert!(!policy.exempt_other_policies);
    }
}
