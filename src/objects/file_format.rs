use std::fmt;

use chrono::{DateTime, Utc};

use crate::builder::{quote_string, Assignment, Clause, Quotes, SqlBuilder, SqlStatement};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{ObjectIdentifier, SchemaObjectIdentifier};
use crate::objects::common::{find_by_id, parse_enum, sql_enum, validate_filters, Identified, In, Like};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

sql_enum!(FileFormatType {
    Csv => "CSV",
    Json => "JSON",
    Avro => "AVRO",
    Orc => "ORC",
    Parquet => "PARQUET",
    Xml => "XML",
});

sql_enum!(Compression {
    Auto => "AUTO",
    Gzip => "GZIP",
    Bz2 => "BZ2",
    Brotli => "BROTLI",
    Zstd => "ZSTD",
    Deflate => "DEFLATE",
    RawDeflate => "RAW_DEFLATE",
    Lzo => "LZO",
    Snappy => "SNAPPY",
    None => "NONE",
});

sql_enum!(BinaryFormat {
    Hex => "HEX",
    Base64 => "BASE64",
    Utf8 => "UTF8",
});

/// A single character option that may also be switched off with `NONE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delimiter {
    Value(String),
    None,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Value(value) => f.write_str(&quote_string(value)),
            Delimiter::None => f.write_str("NONE"),
        }
    }
}

fn delimiter(sql: &mut SqlBuilder, name: &str, value: Option<&Delimiter>) {
    sql.parameter(name, value, Quotes::None, Assignment::Equals);
}

fn null_if(sql: &mut SqlBuilder, values: Option<&Vec<String>>) {
    sql.list("NULL_IF", values.map(Vec::as_slice), Quotes::Single, Assignment::Equals);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvOptions {
    pub compression: Option<Compression>,
    pub record_delimiter: Option<Delimiter>,
    pub field_delimiter: Option<Delimiter>,
    pub file_extension: Option<String>,
    pub parse_header: Option<bool>,
    pub skip_header: Option<u32>,
    pub skip_blank_lines: Option<bool>,
    pub date_format: Option<String>,
    pub time_format: Option<String>,
    pub timestamp_format: Option<String>,
    pub binary_format: Option<BinaryFormat>,
    pub escape: Option<Delimiter>,
    pub escape_unenclosed_field: Option<Delimiter>,
    pub trim_space: Option<bool>,
    pub field_optionally_enclosed_by: Option<Delimiter>,
    pub null_if: Option<Vec<String>>,
    pub error_on_column_count_mismatch: Option<bool>,
    pub replace_invalid_characters: Option<bool>,
    pub empty_field_as_null: Option<bool>,
    pub skip_byte_order_mark: Option<bool>,
    pub encoding: Option<String>,
}

impl CsvOptions {
    fn validate(&self, validator: &mut Validator) {
        validator.more_than_one_of(&[
            ("ParseHeader", self.parse_header == Some(true)),
            ("SkipHeader", self.skip_header.is_some()),
        ]);
    }
}

impl Clause for CsvOptions {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.enumeration("COMPRESSION", self.compression);
        delimiter(sql, "RECORD_DELIMITER", self.record_delimiter.as_ref());
        delimiter(sql, "FIELD_DELIMITER", self.field_delimiter.as_ref());
        sql.text("FILE_EXTENSION", self.file_extension.as_deref())
            .boolean("PARSE_HEADER", self.parse_header)
            .number("SKIP_HEADER", self.skip_header)
            .boolean("SKIP_BLANK_LINES", self.skip_blank_lines)
            .text("DATE_FORMAT", self.date_format.as_deref())
            .text("TIME_FORMAT", self.time_format.as_deref())
            .text("TIMESTAMP_FORMAT", self.timestamp_format.as_deref())
            .enumeration("BINARY_FORMAT", self.binary_format);
        delimiter(sql, "ESCAPE", self.escape.as_ref());
        delimiter(sql, "ESCAPE_UNENCLOSED_FIELD", self.escape_unenclosed_field.as_ref());
        sql.boolean("TRIM_SPACE", self.trim_space);
        delimiter(sql, "FIELD_OPTIONALLY_ENCLOSED_BY", self.field_optionally_enclosed_by.as_ref());
        null_if(sql, self.null_if.as_ref());
        sql.boolean("ERROR_ON_COLUMN_COUNT_MISMATCH", self.error_on_column_count_mismatch)
            .boolean("REPLACE_INVALID_CHARACTERS", self.replace_invalid_characters)
            .boolean("EMPTY_FIELD_AS_NULL", self.empty_field_as_null)
            .boolean("SKIP_BYTE_ORDER_MARK", self.skip_byte_order_mark)
            .text("ENCODING", self.encoding.as_deref());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonOptions {
    pub compression: Option<Compression>,
    pub date_format: Option<String>,
    pub time_format: Option<String>,
    pub timestamp_format: Option<String>,
    pub binary_format: Option<BinaryFormat>,
    pub trim_space: Option<bool>,
    pub null_if: Option<Vec<String>>,
    pub file_extension: Option<String>,
    pub enable_octal: Option<bool>,
    pub allow_duplicate: Option<bool>,
    pub strip_outer_array: Option<bool>,
    pub strip_null_values: Option<bool>,
    pub replace_invalid_characters: Option<bool>,
    pub ignore_utf8_errors: Option<bool>,
    pub skip_byte_order_mark: Option<bool>,
}

impl Clause for JsonOptions {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.enumeration("COMPRESSION", self.compression)
            .text("DATE_FORMAT", self.date_format.as_deref())
            .text("TIME_FORMAT", self.time_format.as_deref())
            .text("TIMESTAMP_FORMAT", self.timestamp_format.as_deref())
            .enumeration("BINARY_FORMAT", self.binary_format)
            .boolean("TRIM_SPACE", self.trim_space);
        null_if(sql, self.null_if.as_ref());
        sql.text("FILE_EXTENSION", self.file_extension.as_deref())
            .boolean("ENABLE_OCTAL", self.enable_octal)
            .boolean("ALLOW_DUPLICATE", self.allow_duplicate)
            .boolean("STRIP_OUTER_ARRAY", self.strip_outer_array)
            .boolean("STRIP_NULL_VALUES", self.strip_null_values)
            .boolean("REPLACE_INVALID_CHARACTERS", self.replace_invalid_characters)
            .boolean("IGNORE_UTF8_ERRORS", self.ignore_utf8_errors)
            .boolean("SKIP_BYTE_ORDER_MARK", self.skip_byte_order_mark);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvroOptions {
    pub compression: Option<Compression>,
    pub trim_space: Option<bool>,
    pub replace_invalid_characters: Option<bool>,
    pub null_if: Option<Vec<String>>,
}

impl Clause for AvroOptions {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.enumeration("COMPRESSION", self.compression)
            .boolean("TRIM_SPACE", self.trim_space)
            .boolean("REPLACE_INVALID_CHARACTERS", self.replace_invalid_characters);
        null_if(sql, self.null_if.as_ref());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrcOptions {
    pub trim_space: Option<bool>,
    pub replace_invalid_characters: Option<bool>,
    pub null_if: Option<Vec<String>>,
}

impl Clause for OrcOptions {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.boolean("TRIM_SPACE", self.trim_space)
            .boolean("REPLACE_INVALID_CHARACTERS", self.replace_invalid_characters);
        null_if(sql, self.null_if.as_ref());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParquetOptions {
    pub compression: Option<Compression>,
    pub binary_as_text: Option<bool>,
    pub trim_space: Option<bool>,
    pub replace_invalid_characters: Option<bool>,
    pub null_if: Option<Vec<String>>,
}

impl Clause for ParquetOptions {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.enumeration("COMPRESSION", self.compression)
            .boolean("BINARY_AS_TEXT", self.binary_as_text)
            .boolean("TRIM_SPACE", self.trim_space)
            .boolean("REPLACE_INVALID_CHARACTERS", self.replace_invalid_characters);
        null_if(sql, self.null_if.as_ref());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlOptions {
    pub compression: Option<Compression>,
    pub ignore_utf8_errors: Option<bool>,
    pub preserve_space: Option<bool>,
    pub strip_outer_element: Option<bool>,
    pub disable_snowflake_data: Option<bool>,
    pub disable_auto_convert: Option<bool>,
    pub replace_invalid_characters: Option<bool>,
    pub skip_byte_order_mark: Option<bool>,
}

impl Clause for XmlOptions {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.enumeration("COMPRESSION", self.compression)
            .boolean("IGNORE_UTF8_ERRORS", self.ignore_utf8_errors)
            .boolean("PRESERVE_SPACE", self.preserve_space)
            .boolean("STRIP_OUTER_ELEMENT", self.strip_outer_element)
            .boolean("DISABLE_SNOWFLAKE_DATA", self.disable_snowflake_data)
            .boolean("DISABLE_AUTO_CONVERT", self.disable_auto_convert)
            .boolean("REPLACE_INVALID_CHARACTERS", self.replace_invalid_characters)
            .boolean("SKIP_BYTE_ORDER_MARK", self.skip_byte_order_mark);
    }
}

/// Format specific options; the variant decides `TYPE = ...`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatTypeOptions {
    Csv(CsvOptions),
    Json(JsonOptions),
    Avro(AvroOptions),
    Orc(OrcOptions),
    Parquet(ParquetOptions),
    Xml(XmlOptions),
}

impl FormatTypeOptions {
    pub fn format_type(&self) -> FileFormatType {
        match self {
            FormatTypeOptions::Csv(_) => FileFormatType::Csv,
            FormatTypeOptions::Json(_) => FileFormatType::Json,
            FormatTypeOptions::Avro(_) => FileFormatType::Avro,
            FormatTypeOptions::Orc(_) => FileFormatType::Orc,
            FormatTypeOptions::Parquet(_) => FileFormatType::Parquet,
            FormatTypeOptions::Xml(_) => FileFormatType::Xml,
        }
    }

    /// True when no option of the variant is set.
    pub fn is_empty(&self) -> bool {
        match self {
            FormatTypeOptions::Csv(options) => *options == CsvOptions::default(),
            FormatTypeOptions::Json(options) => *options == JsonOptions::default(),
            FormatTypeOptions::Avro(options) => *options == AvroOptions::default(),
            FormatTypeOptions::Orc(options) => *options == OrcOptions::default(),
            FormatTypeOptions::Parquet(options) => *options == ParquetOptions::default(),
            FormatTypeOptions::Xml(options) => *options == XmlOptions::default(),
        }
    }

    fn validate(&self, validator: &mut Validator) {
        match self {
            FormatTypeOptions::Csv(csv) => csv.validate(validator),
            FormatTypeOptions::Json(json) => {
                validator.more_than_one_of(&[
                    ("ReplaceInvalidCharacters", json.replace_invalid_characters == Some(true)),
                    ("IgnoreUtf8Errors", json.ignore_utf8_errors == Some(true)),
                ]);
            }
            FormatTypeOptions::Xml(xml) => {
                validator.more_than_one_of(&[
                    ("ReplaceInvalidCharacters", xml.replace_invalid_characters == Some(true)),
                    ("IgnoreUtf8Errors", xml.ignore_utf8_errors == Some(true)),
                ]);
            }
            FormatTypeOptions::Avro(_) | FormatTypeOptions::Orc(_) | FormatTypeOptions::Parquet(_) => {}
        }
    }

    /// The options without the leading `TYPE = ...`, as `ALTER ... SET` takes them.
    fn render_options(&self, sql: &mut SqlBuilder) {
        match self {
            FormatTypeOptions::Csv(options) => options.render(sql),
            FormatTypeOptions::Json(options) => options.render(sql),
            FormatTypeOptions::Avro(options) => options.render(sql),
            FormatTypeOptions::Orc(options) => options.render(sql),
            FormatTypeOptions::Parquet(options) => options.render(sql),
            FormatTypeOptions::Xml(options) => options.render(sql),
        }
    }
}

impl Clause for FormatTypeOptions {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.enumeration("TYPE", Some(self.format_type()));
        self.render_options(sql);
    }
}

/// `CREATE [OR REPLACE] [TEMPORARY | VOLATILE] FILE FORMAT [IF NOT EXISTS] ...`
#[derive(Clone, Debug)]
pub struct CreateFileFormatOptions {
    pub or_replace: bool,
    pub temporary: bool,
    pub volatile: bool,
    pub if_not_exists: bool,
    pub format: FormatTypeOptions,
    pub comment: Option<String>,
}

impl CreateFileFormatOptions {
    pub fn new(format: FormatTypeOptions) -> Self {
        Self {
            or_replace: false,
            temporary: false,
            volatile: false,
            if_not_exists: false,
            format,
            comment: None,
        }
    }
}

impl SqlStatement for CreateFileFormatOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("Temporary", self.temporary), ("Volatile", self.volatile)]);
        self.format.validate(&mut validator);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.temporary, "TEMPORARY")
            .keyword_if(self.volatile, "VOLATILE")
            .keyword("FILE FORMAT")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .identifier(id)
            .nested(None, Some(&self.format))
            .text("COMMENT", self.comment.as_deref());
    }
}

/// `SET <format options> [COMMENT = '...']`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFormatSet {
    pub format: FormatTypeOptions,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AlterFileFormatOptions {
    pub if_exists: bool,
    pub new_name: Option<SchemaObjectIdentifier>,
    pub set: Option<FileFormatSet>,
    pub set_comment: Option<String>,
}

impl SqlStatement for AlterFileFormatOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("Set", self.set.is_some()),
                ("SetComment", self.set_comment.is_some()),
            ]);
        if let Some(set) = &self.set {
            validator.at_least_one_of(&[
                ("FormatOptions", !set.format.is_empty()),
                ("Comment", set.comment.is_some()),
            ]);
            set.format.validate(&mut validator);
        }
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("ALTER FILE FORMAT")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref());
        if let Some(set) = &self.set {
            sql.keyword("SET");
            set.format.render_options(sql);
            sql.text("COMMENT", set.comment.as_deref());
        }
        sql.keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref());
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropFileFormatOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropFileFormatOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        sql.keyword("DROP FILE FORMAT")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowFileFormatOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
}

impl SqlStatement for ShowFileFormatOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW FILE FORMATS")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
    }
}

#[derive(Debug, Default)]
struct FileFormatRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    database_name: Option<String>,
    schema_name: Option<String>,
    format_type: Option<String>,
    owner: Option<String>,
    comment: Option<String>,
    format_options: Option<String>,
    owner_role_type: Option<String>,
}
impl_from_row!(FileFormatRow {
    created_on,
    name,
    database_name,
    schema_name,
    format_type = "type",
    owner,
    comment,
    format_options,
    owner_role_type,
});

/// A row of `SHOW FILE FORMATS`. `options` keeps the server's JSON rendering,
/// keyed by upper case option name.
#[derive(Clone, Debug, PartialEq)]
pub struct FileFormat {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub format_type: FileFormatType,
    pub owner: String,
    pub comment: String,
    pub options: serde_json::Map<String, serde_json::Value>,
    pub owner_role_type: String,
}

impl FileFormat {
    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options.get(&name.to_ascii_uppercase())
    }
}

impl TryFrom<FileFormatRow> for FileFormat {
    type Error = SnowflakeError;

    fn try_from(row: FileFormatRow) -> SnowflakeResult<Self> {
        let format_type = parse_enum("type", row.format_type)?
            .ok_or_else(|| SnowflakeError::decoding("type", "missing"))?;
        let options: serde_json::Map<String, serde_json::Value> = match row.format_options.as_deref() {
            Some(text) if !text.trim().is_empty() => serde_json::from_str(text)
                .map_err(|e| SnowflakeError::decoding("format_options", e))?,
            _ => serde_json::Map::new(),
        };
        Ok(FileFormat {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            database_name: row.database_name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            format_type,
            owner: row.owner.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
            options,
            owner_role_type: row.owner_role_type.unwrap_or_default(),
        })
    }
}

impl Identified for FileFormat {
    type Id = SchemaObjectIdentifier;

    fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

#[derive(Debug, Default)]
struct FileFormatPropertyRow {
    property: Option<String>,
    property_type: Option<String>,
    property_value: Option<String>,
    property_default: Option<String>,
}
impl_from_row!(FileFormatPropertyRow {
    property,
    property_type,
    property_value,
    property_default,
});

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileFormatProperty {
    pub name: String,
    pub property_type: String,
    pub value: String,
    pub default: String,
}

/// Output of `DESCRIBE FILE FORMAT`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileFormatDetails {
    pub properties: Vec<FileFormatProperty>,
}

impl FileFormatDetails {
    pub fn get(&self, name: &str) -> Option<&FileFormatProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn format_type(&self) -> SnowflakeResult<Option<FileFormatType>> {
        parse_enum("TYPE", self.get("TYPE").map(|p| p.value.clone()))
    }
}

pub struct FileFormats<'a> {
    executor: &'a dyn Executor,
}

impl<'a> FileFormats<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        id: &SchemaObjectIdentifier,
        opts: &CreateFileFormatOptions,
    ) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&AlterFileFormatOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifier,
        opts: Option<&DropFileFormatOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropFileFormatOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowFileFormatOptions>) -> SnowflakeResult<Vec<FileFormat>> {
        let default = ShowFileFormatOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<FileFormatRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(FileFormat::try_from).collect()
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<FileFormat> {
        let formats = self
            .show(Some(&ShowFileFormatOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
            }))
            .await?;
        find_by_id(formats, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<FileFormatDetails> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE FILE FORMAT {}", id.fully_qualified_name());
        let rows: Vec<FileFormatPropertyRow> = query_all(self.executor, &sql).await?;
        let properties = rows
            .into_iter()
            .map(|row| FileFormatProperty {
                name: row.property.unwrap_or_default(),
                property_type: row.property_type.unwrap_or_default(),
                value: row.property_value.unwrap_or_default(),
                default: row.property_default.unwrap_or_default(),
            })
            .collect();
        Ok(FileFormatDetails { properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::DatabaseObjectIdentifier;
    use crate::query::Rows;
    use crate::testing::RecordingExecutor;

    fn id() -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("db", "schema", "fmt")
    }

    #[test]
    fn show_in_schema() {
        let opts = ShowFileFormatOptions {
            like: Some(Like::new("test")),
            scope: Some(In::schema(DatabaseObjectIdentifier::new("db", "schema"))),
        };
        assert_eq!(
            opts.to_sql(&()).unwrap(),
            r#"SHOW FILE FORMATS LIKE 'test' IN SCHEMA "db"."schema""#
        );
    }

    #[test]
    fn create_csv_keeps_declaration_order() {
        let csv = CsvOptions {
            compression: Some(Compression::Bz2),
            record_delimiter: Some(Delimiter::Value("-".into())),
            field_delimiter: Some(Delimiter::Value(":".into())),
            file_extension: Some("csv".into()),
            parse_header: Some(false),
            skip_header: Some(5),
            skip_blank_lines: Some(true),
            date_format: Some("YYYY-MM-DD".into()),
            time_format: Some("HH:MI:SS".into()),
            timestamp_format: Some("AUTO".into()),
            binary_format: Some(BinaryFormat::Utf8),
            escape: Some(Delimiter::Value("\\\\".into())),
            escape_unenclosed_field: Some(Delimiter::None),
            trim_space: Some(true),
            field_optionally_enclosed_by: Some(Delimiter::Value("\"".into())),
            null_if: Some(vec!["foo".into(), "nil".into()]),
            error_on_column_count_mismatch: Some(true),
            replace_invalid_characters: Some(true),
            empty_field_as_null: Some(false),
            skip_byte_order_mark: Some(true),
            encoding: Some("ISO2022KR".into()),
        };
        let opts = CreateFileFormatOptions {
            or_replace: true,
            temporary: true,
            if_not_exists: true,
            ..CreateFileFormatOptions::new(FormatTypeOptions::Csv(csv))
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            concat!(
                r#"CREATE OR REPLACE TEMPORARY FILE FORMAT IF NOT EXISTS "db"."schema"."fmt" TYPE = CSV"#,
                r#" COMPRESSION = BZ2 RECORD_DELIMITER = '-' FIELD_DELIMITER = ':' FILE_EXTENSION = 'csv'"#,
                r#" PARSE_HEADER = false SKIP_HEADER = 5 SKIP_BLANK_LINES = true DATE_FORMAT = 'YYYY-MM-DD'"#,
                r#" TIME_FORMAT = 'HH:MI:SS' TIMESTAMP_FORMAT = 'AUTO' BINARY_FORMAT = UTF8 ESCAPE = '\\'"#,
                r#" ESCAPE_UNENCLOSED_FIELD = NONE TRIM_SPACE = true FIELD_OPTIONALLY_ENCLOSED_BY = '"'"#,
                r#" NULL_IF = ('foo', 'nil') ERROR_ON_COLUMN_COUNT_MISMATCH = true REPLACE_INVALID_CHARACTERS = true"#,
                r#" EMPTY_FIELD_AS_NULL = false SKIP_BYTE_ORDER_MARK = true ENCODING = 'ISO2022KR'"#,
            )
        );
    }

    #[test]
    fn parse_header_conflicts_with_skip_header() {
        let opts = CreateFileFormatOptions::new(FormatTypeOptions::Csv(CsvOptions {
            parse_header: Some(true),
            skip_header: Some(1),
            ..CsvOptions::default()
        }));
        assert!(matches!(opts.to_sql(&id()), Err(SnowflakeError::MoreThanOneOf { .. })));
    }

    #[test]
    fn create_json_and_parquet() {
        let json = CreateFileFormatOptions::new(FormatTypeOptions::Json(JsonOptions {
            compression: Some(Compression::Gzip),
            strip_outer_array: Some(true),
            null_if: Some(vec![]),
            ..JsonOptions::default()
        }));
        assert_eq!(
            json.to_sql(&id()).unwrap(),
            r#"CREATE FILE FORMAT "db"."schema"."fmt" TYPE = JSON COMPRESSION = GZIP NULL_IF = () STRIP_OUTER_ARRAY = true"#
        );
        let parquet = CreateFileFormatOptions {
            comment: Some("pq".into()),
            ..CreateFileFormatOptions::new(FormatTypeOptions::Parquet(ParquetOptions {
                compression: Some(Compression::Snappy),
                binary_as_text: Some(false),
                ..ParquetOptions::default()
            }))
        };
        assert_eq!(
            parquet.to_sql(&id()).unwrap(),
            r#"CREATE FILE FORMAT "db"."schema"."fmt" TYPE = PARQUET COMPRESSION = SNAPPY BINARY_AS_TEXT = false COMMENT = 'pq'"#
        );
    }

    #[test]
    fn alter_set_omits_type() {
        let opts = AlterFileFormatOptions {
            set: Some(FileFormatSet {
                format: FormatTypeOptions::Xml(XmlOptions {
                    preserve_space: Some(true),
                    ..XmlOptions::default()
                }),
                comment: Some("xml".into()),
            }),
            ..AlterFileFormatOptions::default()
        };
        assert_eq!(
            opts.to_sql(&id()).unwrap(),
            r#"ALTER FILE FORMAT "db"."schema"."fmt" SET PRESERVE_SPACE = true COMMENT = 'xml'"#
        );
        let rename = AlterFileFormatOptions {
            if_exists: true,
            new_name: Some(SchemaObjectIdentifier::new("db", "schema", "fmt2")),
            ..AlterFileFormatOptions::default()
        };
        assert_eq!(
            rename.to_sql(&id()).unwrap(),
            r#"ALTER FILE FORMAT IF EXISTS "db"."schema"."fmt" RENAME TO "db"."schema"."fmt2""#
        );
    }

    #[test]
    fn alter_set_requires_an_option() {
        let empty = AlterFileFormatOptions {
            set: Some(FileFormatSet {
                format: FormatTypeOptions::Csv(CsvOptions::default()),
                comment: None,
            }),
            ..AlterFileFormatOptions::default()
        };
        assert!(matches!(empty.to_sql(&id()), Err(SnowflakeError::AtLeastOneOf { .. })));

        let comment_only = AlterFileFormatOptions {
            set: Some(FileFormatSet {
                format: FormatTypeOptions::Csv(CsvOptions::default()),
                comment: Some("c".into()),
            }),
            ..AlterFileFormatOptions::default()
        };
        assert_eq!(
            comment_only.to_sql(&id()).unwrap(),
            r#"ALTER FILE FORMAT "db"."schema"."fmt" SET COMMENT = 'c'"#
        );
    }

    #[tokio::test]
    async fn show_by_id_decodes_options() {
        let rows = Rows::from_text(
            &["name", "database_name", "schema_name", "type", "format_options"],
            vec![vec![
                Some("fmt"),
                Some("db"),
                Some("schema"),
                Some("CSV"),
                Some(r#"{"TYPE":"CSV","SKIP_HEADER":1,"NULL_IF":["\\N"]}"#),
            ]],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let format = FileFormats::new(&executor).show_by_id(&id()).await.unwrap();
        assert_eq!(
            executor.last(),
            r#"SHOW FILE FORMATS LIKE 'fmt' IN SCHEMA "db"."schema""#
        );
        assert_eq!(format.format_type, FileFormatType::Csv);
        assert_eq!(format.option("skip_header"), Some(&serde_json::json!(1)));
    }

    #[tokio::test]
    async fn describe_lists_properties() {
        let rows = Rows::from_text(
            &["property", "property_type", "property_value", "property_default"],
            vec![
                vec![Some("TYPE"), Some("String"), Some("JSON"), Some("CSV")],
                vec![Some("COMPRESSION"), Some("String"), Some("GZIP"), Some("AUTO")],
            ],
        );
        let executor = RecordingExecutor::new().respond(rows);
        let details = FileFormats::new(&executor).describe(&id()).await.unwrap();
        assert_eq!(details.format_type().unwrap(), Some(FileFormatType::Json));
        assert_eq!(details.get("compression").map(|p| p.value.as_str()), Some("GZIP"));
    }
}
