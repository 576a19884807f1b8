use chrono::{DateTime, Utc};

use crate::builder::{Clause, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{AccountObjectIdentifier, ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, set_tags, unset_tags, validate_filters, validate_tags, with_tags, Identified, In,
    Like, TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, query_one, Executor};
use crate::validation::{require, validate_identifier, Validator};

/// `CREATE [OR REPLACE] PIPE [IF NOT EXISTS] <id> ... AS <copy statement>`
#[derive(Clone, Debug)]
pub struct CreatePipeOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub auto_ingest: Option<bool>,
    pub error_integration: Option<AccountObjectIdentifier>,
    pub aws_sns_topic: Option<String>,
    pub integration: Option<String>,
    pub comment: Option<String>,
    pub tag: Vec<TagAssociation>,
    pub copy_statement: String,
}

impl CreatePipeOptions {
    pub fn new(copy_statement: impl Into<String>) -> Self {
        Self {
            or_replace: false,
            if_not_exists: false,
            auto_ingest: None,
            error_integration: None,
            aws_sns_topic: None,
            integration: None,
            comment: None,
            tag: Vec::new(),
            copy_statement: copy_statement.into(),
        }
    }
}

impl SqlStatement for CreatePipeOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.error_integration.as_ref())
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)])
            .check(self.copy_statement.trim().is_empty(), || {
                SnowflakeError::invalid_option("CopyStatement", "a COPY INTO statement is required")
            });
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("PIPE")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .boolean("AUTO_INGEST", self.auto_ingest)
            .identifier_equals("ERROR_INTEGRATION", self.error_integration.as_ref())
            .text("AWS_SNS_TOPIC", self.aws_sns_topic.as_deref())
            .text("INTEGRATION", self.integration.as_deref())
            .text("COMMENT", self.comment.as_deref());
        with_tags(sql, &self.tag);
        sql.keyword("AS").raw(&self.copy_statement);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipeSet {
    pub error_integration: Option<AccountObjectIdentifier>,
    pub pipe_execution_paused: Option<bool>,
    pub comment: Option<String>,
}

impl Clause for PipeSet {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.identifier_equals("ERROR_INTEGRATION", self.error_integration.as_ref())
            .boolean("PIPE_EXECUTION_PAUSED", self.pipe_execution_paused)
            .text("COMMENT", self.comment.as_deref());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipeUnset {
    pub pipe_execution_paused: bool,
    pub comment: bool,
}

impl Clause for PipeUnset {
    fn render(&self, sql: &mut SqlBuilder) {
        let mut names = Vec::new();
        if self.pipe_execution_paused {
            names.push("PIPE_EXECUTION_PAUSED");
        }
        if self.comment {
            names.push("COMMENT");
        }
        sql.comma_separated("UNSET", &names);
    }
}

/// `REFRESH [PREFIX = '...'] [MODIFIED_AFTER = '...']`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipeRefresh {
    pub prefix: Option<String>,
    pub modified_after: Option<String>,
}

impl Clause for PipeRefresh {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.keyword("REFRESH")
            .text("PREFIX", self.prefix.as_deref())
            .text("MODIFIED_AFTER", self.modified_after.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterPipeOptions {
    pub if_exists: bool,
    pub set: Option<PipeSet>,
    pub unset: Option<PipeUnset>,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
    pub refresh: Option<PipeRefresh>,
}

impl SqlStatement for AlterPipeOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).exactly_one_of(&[
            ("Set", self.set.is_some()),
            ("Unset", self.unset.is_some()),
            ("SetTag", !self.set_tag.is_empty()),
            ("UnsetTag", !self.unset_tag.is_empty()),
            ("Refresh", self.refresh.is_some()),
        ]);
        if let Some(set) = &self.set {
            validator
                .identifier_opt(set.error_integration.as_ref())
                .at_least_one_of(&[
                    ("ErrorIntegration", set.error_integration.is_some()),
                    ("PipeExecutionPaused", set.pipe_execution_paused.is_some()),
                    ("Comment", set.comment.is_some()),
                ]);
        }
        if let Some(unset) = &self.unset {
            validator.at_least_one_of(&[
                ("PipeExecutionPaused", unset.pipe_execution_paused),
                ("Comment", unset.comment),
            ]);
        }
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER PIPE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .nested(Some("SET"), self.set.as_ref())
            .nested(None, self.unset.as_ref());
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
        sql.nested(None, self.refresh.as_ref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropPipeOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropPipeOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP PIPE")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowPipeOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
}

impl SqlStatement for ShowPipeOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW PIPES")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
    }
}

#[derive(Debug, Default)]
struct PipeRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    database_name: Option<String>,
    schema_name: Option<String>,
    definition: Option<String>,
    owner: Option<String>,
    notification_channel: Option<String>,
    comment: Option<String>,
    integration: Option<String>,
    pattern: Option<String>,
    error_integration: Option<String>,
    owner_role_type: Option<String>,
    invalid_reason: Option<String>,
}
impl_from_row!(PipeRow {
    created_on,
    name,
    database_name,
    schema_name,
    definition,
    owner,
    notification_channel,
    comment,
    integration,
    pattern,
    error_integration,
    owner_role_type,
    invalid_reason,
});

/// A row of `SHOW PIPES`; `DESCRIBE PIPE` returns the same columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pipe {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub definition: String,
    pub owner: String,
    pub notification_channel: Option<String>,
    pub comment: String,
    pub integration: Option<String>,
    pub pattern: Option<String>,
    pub error_integration: Option<String>,
    pub owner_role_type: String,
    pub invalid_reason: Option<String>,
}

fn non_null(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

impl From<PipeRow> for Pipe {
    fn from(row: PipeRow) -> Self {
        Pipe {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            definition: row.definition.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            notification_channel: non_null(row.notification_channel),
            comment: row.comment.unwrap_or_default(),
            integration: non_null(row.integration),
            pattern: non_null(row.pattern),
            error_integration: non_null(row.error_integration),
            owner_role_type: row.owner_role_type.unwrap_or_default(),
            invalid_reason: non_null(row.invalid_reason),
        }
    }
}

impl Identified for Pipe {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

pub struct Pipes<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Pipes<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(&self, id: &SchemaObjectIdentifier, opts: &CreatePipeOptions) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&AlterPipeOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&DropPipeOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropPipeOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowPipeOptions>) -> SnowflakeResult<Vec<Pipe>> {
        let default = ShowPipeOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<PipeRow> = query_all(self.executor, &sql).await?;
        Ok(rows.into_iter().map(Pipe::from).collect())
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Pipe> {
        let pipes = self
            .show(Some(&ShowPipeOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
            }))
            .await?;
        find_by_id(pipes, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Pipe> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE PIPE {}", id.fully_qualified_name());
        let row: PipeRow = query_one(self.executor, &sql).await?;
        Ok(Pipe::from(row))
    }
}
