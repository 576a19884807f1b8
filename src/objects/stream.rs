use chrono::{DateTime, Utc};

use crate::builder::{quote_string, Clause, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{
    find_by_id, parse_comma_separated, parse_enum, set_tags, sql_enum, starts_with, unset_tags,
    validate_filters, validate_tags, with_tags, Identified, In, Like, LimitFrom, TagAssociation,
};
use crate::query::{exec, impl_from_row, query_all, query_one, Executor};
use crate::validation::{require, validate_identifier, Validator};

sql_enum!(StreamMode {
    Default => "DEFAULT",
    AppendOnly => "APPEND_ONLY",
    InsertOnly => "INSERT_ONLY",
});

sql_enum!(StreamSourceType {
    Table => "TABLE",
    ExternalTable => "EXTERNAL TABLE",
    View => "VIEW",
    Stage => "STAGE",
});

/// The object a stream records changes of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSource {
    Table(SchemaObjectIdentifier),
    ExternalTable(SchemaObjectIdentifier),
    Stage(SchemaObjectIdentifier),
    View(SchemaObjectIdentifier),
}

impl StreamSource {
    fn keyword(&self) -> &'static str {
        match self {
            StreamSource::Table(_) => "ON TABLE",
            StreamSource::ExternalTable(_) => "ON EXTERNAL TABLE",
            StreamSource::Stage(_) => "ON STAGE",
            StreamSource::View(_) => "ON VIEW",
        }
    }

    fn id(&self) -> &SchemaObjectIdentifier {
        match self {
            StreamSource::Table(id)
            | StreamSource::ExternalTable(id)
            | StreamSource::Stage(id)
            | StreamSource::View(id) => id,
        }
    }
}

/// The point in time for `AT (...)` / `BEFORE (...)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeTravel {
    Timestamp(String),
    Offset(i64),
    Statement(String),
    Stream(String),
}

/// `AT (...)` or `BEFORE (...)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnStream {
    pub before: bool,
    pub point: TimeTravel,
}

impl Clause for OnStream {
    fn render(&self, sql: &mut SqlBuilder) {
        let point = match &self.point {
            TimeTravel::Timestamp(ts) => format!("TIMESTAMP => {}", quote_string(ts)),
            TimeTravel::Offset(offset) => format!("OFFSET => {offset}"),
            TimeTravel::Statement(id) => format!("STATEMENT => {}", quote_string(id)),
            TimeTravel::Stream(name) => format!("STREAM => {}", quote_string(name)),
        };
        let keyword = if self.before { "BEFORE" } else { "AT" };
        sql.raw(&format!("{keyword} ({point})"));
    }
}

#[derive(Clone, Debug)]
pub struct CreateStreamOptions {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub tag: Vec<TagAssociation>,
    pub copy_grants: bool,
    pub source: StreamSource,
    pub on: Option<OnStream>,
    pub append_only: Option<bool>,
    pub insert_only: Option<bool>,
    pub show_initial_rows: Option<bool>,
    pub comment: Option<String>,
}

impl CreateStreamOptions {
    pub fn new(source: StreamSource) -> Self {
        Self {
            or_replace: false,
            if_not_exists: false,
            tag: Vec::new(),
            copy_grants: false,
            source,
            on: None,
            append_only: None,
            insert_only: None,
            show_initial_rows: None,
            comment: None,
        }
    }
}

impl SqlStatement for CreateStreamOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier(self.source.id())
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)]);
        let (table_like, external, stage) = match &self.source {
            StreamSource::Table(_) | StreamSource::View(_) => (true, false, false),
            StreamSource::ExternalTable(_) => (false, true, false),
            StreamSource::Stage(_) => (false, false, true),
        };
        validator
            .check(self.append_only.is_some() && !table_like, || {
                SnowflakeError::invalid_option("AppendOnly", "only applies to tables and views")
            })
            .check(self.insert_only.is_some() && !external, || {
                SnowflakeError::invalid_option("InsertOnly", "only applies to external tables")
            })
            .check(stage && (self.on.is_some() || self.show_initial_rows.is_some()), || {
                SnowflakeError::invalid_option("Source", "stage streams take no time travel options")
            });
        validate_tags(&mut validator, &self.tag);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("STREAM")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id);
        with_tags(sql, &self.tag);
        sql.keyword_if(self.copy_grants, "COPY GRANTS")
            .identifier_after(self.source.keyword(), Some(self.source.id()))
            .nested(None, self.on.as_ref())
            .boolean("APPEND_ONLY", self.append_only)
            .boolean("INSERT_ONLY", self.insert_only)
            .boolean("SHOW_INITIAL_ROWS", self.show_initial_rows)
            .text("COMMENT", self.comment.as_deref());
    }
}

/// `CREATE [OR REPLACE] STREAM <id> CLONE <source> [COPY GRANTS]`
#[derive(Clone, Debug)]
pub struct CloneStreamOptions {
    pub or_replace: bool,
    pub source: SchemaObjectIdentifier,
    pub copy_grants: bool,
}

impl CloneStreamOptions {
    pub fn new(source: SchemaObjectIdentifier) -> Self {
        Self {
            or_replace: false,
            source,
            copy_grants: false,
        }
    }
}

impl SqlStatement for CloneStreamOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).identifier(&self.source);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword("STREAM")
            .identifier(id)
            .identifier_after("CLONE", Some(&self.source))
            .keyword_if(self.copy_grants, "COPY GRANTS");
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterStreamOptions {
    pub if_exists: bool,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
    pub set_tag: Vec<TagAssociation>,
    pub unset_tag: Vec<SchemaObjectIdentifier>,
}

impl SqlStatement for AlterStreamOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator.identifier(id).exactly_one_of(&[
            ("SetComment", self.set_comment.is_some()),
            ("UnsetComment", self.unset_comment),
            ("SetTag", !self.set_tag.is_empty()),
            ("UnsetTag", !self.unset_tag.is_empty()),
        ]);
        validate_tags(&mut validator, &self.set_tag);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER STREAM")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
        set_tags(sql, &self.set_tag);
        unset_tags(sql, &self.unset_tag);
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropStreamOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropStreamOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP STREAM")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowStreamOptions {
    pub terse: bool,
    pub like: Option<Like>,
    pub scope: Option<In>,
    pub starts_with: Option<String>,
    pub limit: Option<LimitFrom>,
}

impl SqlStatement for ShowStreamOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW")
            .keyword_if(self.terse, "TERSE")
            .keyword("STREAMS")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
        starts_with(sql, self.starts_with.as_deref());
        sql.nested(None, self.limit.as_ref());
    }
}

#[derive(Debug, Default)]
struct StreamRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    database_name: Option<String>,
    schema_name: Option<String>,
    owner: Option<String>,
    comment: Option<String>,
    table_name: Option<String>,
    source_type: Option<String>,
    base_tables: Option<String>,
    kind: Option<String>,
    stale: Option<bool>,
    mode: Option<String>,
    stale_after: Option<DateTime<Utc>>,
    invalid_reason: Option<String>,
    owner_role_type: Option<String>,
}
impl_from_row!(StreamRow {
    created_on,
    name,
    database_name,
    schema_name,
    owner,
    comment,
    table_name,
    source_type,
    base_tables,
    kind = "type",
    stale,
    mode,
    stale_after,
    invalid_reason,
    owner_role_type,
});

/// A row of `SHOW STREAMS` or `DESCRIBE STREAM`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stream {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: String,
    pub comment: String,
    pub table_name: String,
    pub source_type: Option<StreamSourceType>,
    pub base_tables: Vec<SchemaObjectIdentifier>,
    pub kind: String,
    pub stale: bool,
    pub mode: Option<StreamMode>,
    pub stale_after: Option<DateTime<Utc>>,
    pub invalid_reason: String,
    pub owner_role_type: String,
}

fn parse_base_tables(value: Option<&str>) -> SnowflakeResult<Vec<SchemaObjectIdentifier>> {
    value
        .map(parse_comma_separated)
        .unwrap_or_default()
        .iter()
        .map(|table| {
            table
                .parse::<SchemaObjectIdentifier>()
                .map_err(|e| SnowflakeError::decoding("base_tables", format!("{table:?}: {e}")))
        })
        .collect()
}

impl TryFrom<StreamRow> for Stream {
    type Error = SnowflakeError;

    fn try_from(row: StreamRow) -> SnowflakeResult<Self> {
        Ok(Stream {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            table_name: row.table_name.unwrap_or_default(),
            source_type: parse_enum("source_type", row.source_type)?,
            base_tables: parse_base_tables(row.base_tables.as_deref())?,
            kind: row.kind.unwrap_or_default(),
            stale: row.stale.unwrap_or_default(),
            mode: parse_enum("mode", row.mode)?,
            stale_after: row.stale_after,
            invalid_reason: row.invalid_reason.unwrap_or_default(),
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        })
    }
}

impl Identified for Stream {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

pub struct Streams<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Streams<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&CreateStreamOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn clone_stream(
        &self,
        id: &SchemaObjectIdentifier,
        opts: &CloneStreamOptions,
    ) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&AlterStreamOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&DropStreamOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropStreamOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowStreamOptions>) -> SnowflakeResult<Vec<Stream>> {
        let default = ShowStreamOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<StreamRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(Stream::try_from).collect()
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Stream> {
        let streams = self
            .show(Some(&ShowStreamOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
                ..ShowStreamOptions::default()
            }))
            .await?;
        find_by_id(streams, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<Stream> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE STREAM {}", id.fully_qualified_name());
        let row: StreamRow = query_one(self.executor, &sql).await?;
        Stream::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("db", "sc", "changes")
    }

    fn table() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("db", "sc", "orders")
    }

    #[test]
    fn create_on_table() {
        let opts = CreateStreamOptions {
            or_replace: true,
            copy_grants: true,
            on: Some(OnStream {
                before: true,
                point: TimeTravel::Offset(-60),
            }),
            append_only: Some(true),
            show_initial_rows: Some(false),
            comment: Some("c".into()),
            ..CreateStreamOptions::new(StreamSource::Table(table()))
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"CREATE OR REPLACE STREAM "db"."sc"."changes" COPY GRANTS ON TABLE "db"."sc"."orders" BEFORE (OFFSET => -60) APPEND_ONLY = true SHOW_INITIAL_ROWS = false COMMENT = 'c'"#
        );
    }

    #[test]
    fn create_on_stage_and_external_table() {
        let stage = CreateStreamOptions {
            if_not_exists: true,
            ..CreateStreamOptions::new(StreamSource::Stage(SchemaObjectIdentifier::new("db", "sc", "st")))
        };
        assert_eq!(
            stage.to_sql(&id()).unwrap(),
            r#"CREATE STREAM IF NOT EXISTS "db"."sc"."changes" ON STAGE "db"."sc"."st""#
        );
        let external = CreateStreamOptions {
            insert_only: Some(true),
            ..CreateStreamOptions::new(StreamSource::ExternalTable(table()))
        };
        assert_eq!(
            external.to_sql(&id()).unwrap(),
            r#"CREATE STREAM "db"."sc"."changes" ON EXTERNAL TABLE "db"."sc"."orders" INSERT_ONLY = true"#
        );
        let misplaced = CreateStreamOptions {
            append_only: Some(true),
            ..CreateStreamOptions::new(StreamSource::ExternalTable(table()))
        };
        assert!(matches!(
            misplaced.to_sql(&id()),
            Err(SnowflakeError::InvalidOption { field: "AppendOnly", .. })
        ));
    }

    #[test]
    fn clone_and_alter() {
        assert_eq!(
            CloneStreamOptions::new(SchemaObjectIdentifier::new("db", "sc", "src"))
                .to_sql(&id())
                .unwrap(),
            r#"CREATE STREAM "db"."sc"."changes" CLONE "db"."sc"."src""#
        );
        let alter = AlterStreamOptions {
            set_comment: Some("new".into()),
            ..AlterStreamOptions::default()
        };
        assert_eq!(
            alter.to_sql(&id()).unwrap(),
            r#"ALTER STREAM "db"."sc"."changes" SET COMMENT = 'new'"#
        );
    }

    #[tokio::test]
    async fn show_by_id_parses_base_tables() {
        let rows = Rows::from_text(
            &["name", "database_name", "schema_name", "source_type", "base_tables", "mode", "stale"],
            vec![vec![
                Some("changes"),
                Some("db"),
                Some("sc"),
                Some("Table"),
                Some(r#"db.sc.orders, "db"."sc"."Order Lines""#),
                Some("APPEND_ONLY"),
                Some("false"),
            ]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let stream = Streams::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(stream.source_type, Some(StreamSourceType::Table));
        assert_eq!(stream.mode, Some(StreamMode::AppendOnly));
        assert_eq!(
            stream.base_tables,
            vec![
                SchemaObjectIdentifier::new("db", "sc", "orders"),
                SchemaObjectIdentifier::new("db", "sc", "Order Lines"),
            ]
        );
    }

    #[tokio::test]
    async fn describe_without_rows_is_not_found() {
        let executor = RecordingExecutor::new();
        let err = Streams::new(&executor).describe(&id()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(executor.last(), r#"DESCRIBE STREAM "db"."sc"."changes""#);
    }
}
