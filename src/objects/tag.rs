use chrono::{DateTime, Utc};

use crate::builder::{quote_string, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, parse_bracketed_list, validate_filters, Identified, In, Like,
};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

/// A tag accepts at most this many allowed values.
pub const MAX_ALLOWED_VALUES: usize = 300;

/// `<keyword> 'a', 'b'`, unparenthesized.
fn allowed_values(sql: &mut SqlBuilder, keyword: &str, values: Option<&Vec<String>>) {
    if let Some(values) = values {
        let rendered = values
            .iter()
            .map(|value| quote_string(value))
            .collect::<Vec<_>>()
            .join(", ");
        sql.raw(&format!("{keyword} {rendered}"));
    }
}

fn validate_allowed_values(validator: &mut Validator, field: &'static str, values: Option<&Vec<String>>) {
    if let Some(values) = values {
        validator
            .check(values.is_empty(), || {
                SnowflakeError::invalid_option(field, "at least one value is required")
            })
            .check(values.len() > MAX_ALLOWED_VALUES, || {
                SnowflakeError::invalid_option(
                    field,
                    format!("at most {MAX_ALLOWED_VALUES} values are allowed"),
                )
            });
    }
}

#[derive(Clone, Debug, Default)]
pub struct CreateTagOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub allowed_values: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl SqlStatement for CreateTagOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        validate_allowed_values(&mut validator, "AllowedValues", self.allowed_values.as_ref());
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("TAG")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id);
        allowed_values(sql, "ALLOWED_VALUES", self.allowed_values.as_ref());
        sql.text("COMMENT", self.comment.as_deref());
    }
}

/// `SET MASKING POLICY <p>, ... [FORCE]`
#[derive(Clone, Debug, Default)]
pub struct SetMaskingPolicies {
    pub policies: Vec<SchemaObjectIdentifier>,
    pub force: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AlterTagOptions {
    pub if_exists: bool,
    pub add_allowed_values: Option<Vec<String>>,
    pub drop_allowed_values: Option<Vec<String>>,
    pub unset_allowed_values: bool,
    pub new_name: Option<SchemaObjectIdentifier>,
    pub set_masking_policies: Option<SetMaskingPolicies>,
    pub unset_masking_policies: Option<Vec<SchemaObjectIdentifier>>,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
}

impl SqlStatement for AlterTagOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("AddAllowedValues", self.add_allowed_values.is_some()),
                ("DropAllowedValues", self.drop_allowed_values.is_some()),
                ("UnsetAllowedValues", self.unset_allowed_values),
                ("NewName", self.new_name.is_some()),
                ("SetMaskingPolicies", self.set_masking_policies.is_some()),
                ("UnsetMaskingPolicies", self.unset_masking_policies.is_some()),
                ("SetComment", self.set_comment.is_some()),
                ("UnsetComment", self.unset_comment),
            ]);
        validate_allowed_values(&mut validator, "AddAllowedValues", self.add_allowed_values.as_ref());
        validate_allowed_values(&mut validator, "DropAllowedValues", self.drop_allowed_values.as_ref());
        if let Some(set) = &self.set_masking_policies {
            validator.identifiers(&set.policies).check(set.policies.is_empty(), || {
                SnowflakeError::invalid_option("SetMaskingPolicies", "at least one policy is required")
            });
        }
        if let Some(unset) = &self.unset_masking_policies {
            validator.identifiers(unset).check(unset.is_empty(), || {
                SnowflakeError::invalid_option("UnsetMaskingPolicies", "at least one policy is required")
            });
        }
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER TAG")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
        allowed_values(sql, "ADD ALLOWED_VALUES", self.add_allowed_values.as_ref());
        allowed_values(sql, "DROP ALLOWED_VALUES", self.drop_allowed_values.as_ref());
        sql.keyword_if(self.unset_allowed_values, "UNSET ALLOWED_VALUES")
            .identifier_after("RENAME TO", self.new_name.as_ref());
        if let Some(set) = &self.set_masking_policies {
            sql.identifier_list("SET MASKING POLICY", Some(&set.policies))
                .keyword_if(set.force, "FORCE");
        }
        sql.identifier_list("UNSET MASKING POLICY", self.unset_masking_policies.as_deref())
            .keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropTagOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropTagOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP TAG")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowTagOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
}

impl SqlStatement for ShowTagOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW TAGS")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
    }
}

#[derive(Debug, Default)]
struct TagRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    database_name: Option<String>,
    schema_name: Option<String>,
    owner: Option<String>,
    comment: Option<String>,
    allowed_values: Option<String>,
    owner_role_type: Option<String>,
}
impl_from_row!(TagRow {
    created_on,
    name,
    database_name,
    schema_name,
    owner,
    comment,
    allowed_values,
    owner_role_type,
});

/// A row of `SHOW TAGS`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: String,
    pub comment: String,
    /// `None` when any value is allowed.
    pub allowed_values: Option<Vec<String>>,
    pub owner_role_type: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            allowed_values: row.allowed_values.as_deref().map(parse_bracketed_list),
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        }
    }
}

impl Identified for Tag {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

pub struct Tags<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Tags<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&CreateTagOptions>,
    ) -> SnowflakeResult<()> {
        let default = CreateTagOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&AlterTagOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&DropTagOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropTagOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn undrop(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)?;
        exec(self.executor, &format!("UNDROP TAG {}", id.fully_qualified_name())).await
    }

    pub async fn show(&self, opts: Option<&ShowTagOptions>) -> SnowflakeResult<Vec<Tag>> {
        let default = ShowTagOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<TagRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Tag> {
        let tags = self
            .show(Some(&ShowTagOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
            }))
            .await?;
        find_by_id(tags, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("db", "sc", "cost_center")
    }

    #[test]
    fn create_with_allowed_values() {
        let opts = CreateTagOptions {
            or_replace: true,
            allowed_values: Some(vec!["finance".into(), "it's".into()]),
            comment: Some("c".into()),
            ..CreateTagOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE TAG "db"."sc"."cost_center" ALLOWED_VALUES 'finance', 'it''s' COMMENT = 'c'"#
        );
    }

    #[test]
    fn alter_masking_policies_and_values() {
        let set = AlterTagOptions {
            set_masking_policies: Some(SetMaskingPolicies {
                policies: vec![
                    SchemaObjectIdentifier::new("db", "sc", "p1"),
                    SchemaObjectIdentifier::new("db", "sc", "p2"),
                ],
                force: true,
            }),
            ..AlterTagOptions::default()
        };
        assert_eq!(
            set.to_sql(&id()).unwrap(),
            r#"ALTER TAG "db"."sc"."cost_center" SET MASKING POLICY "db"."sc"."p1", "db"."sc"."p2" FORCE"#
        );
        let add = AlterTagOptions {
            if_exists: true,
            add_allowed_values: Some(vec!["hr".into()]),
            ..AlterTagOptions::default()
        };
        assert_eq!(
            add.to_sql(&id()).unwrap(),
            r#"ALTER TAG IF EXISTS "db"."sc"."cost_center" ADD ALLOWED_VALUES 'hr'"#
        );
        let empty = AlterTagOptions {
            drop_allowed_values: Some(vec![]),
            ..AlterTagOptions::default()
        };
        assert!(matches!(
            empty.to_sql(&id()),
            Err(SnowflakeError::InvalidOption { field: "DropAllowedValues", .. })
        ));
    }

    #[tokio::test]
    async fn show_by_id_reads_allowed_values() {
        let rows = Rows::from_text(
            &["name", "database_name", "schema_name", "allowed_values"],
            vec![
                vec![Some("cost_center"), Some("db"), Some("sc"), Some(r#"["finance","hr"]"#)],
                vec![Some("cost_center"), Some("db"), Some("other"), None],
            ],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let tag = Tags::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(
            executor.last(),
            r#"SHOW TAGS LIKE 'cost_center' IN SCHEMA "db"."sc""#
        );
        assert_eq!(tag.allowed_values, Some(vec!["finance".to_owned(), "hr".to_owned()]));
    }

    #[tokio::test]
    async fn undrop_names_the_tag() {
        let executor = RecordingExecutor::new();
        Tags::new(&executor).undrop(&id()).await.unwrap();
        assert_eq!(executor.last(), r#"UNDROP TAG "db"."sc"."cost_center""#);
    }
}
