//! SQL user defined functions. Functions are overloadable, so everything after
//! `create` addresses them by name plus argument types.
use chrono::{DateTime, Utc};

use crate::builder::{quote_string, SqlBuilder, SqlStatement};
use crate::data_types::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{
    split_top_level, ObjectIdentifier, SchemaObjectIdentifier, SchemaObjectIdentifierWithArguments,
};
use crate::objects::common::{find_by_id, sql_enum, validate_filters, Identified, In, Like};
use crate::query::{exec, impl_from_row, query_all, Executor};
use crate::validation::{require, validate_identifier, Validator};

sql_enum!(NullInputBehavior {
    CalledOnNullInput => "CALLED ON NULL INPUT",
    ReturnsNullOnNullInput => "RETURNS NULL ON NULL INPUT",
});

sql_enum!(ReturnResultsBehavior {
    Volatile => "VOLATILE",
    Immutable => "IMMUTABLE",
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionArgument {
    pub name: String,
    pub data_type: DataType,
    /// SQL expression for an optional argument.
    pub default: Option<String>,
}

impl FunctionArgument {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            default: None,
        }
    }

    fn render(&self) -> String {
        match &self.default {
            Some(default) => format!("{} {} DEFAULT {default}", self.name, self.data_type),
            None => format!("{} {}", self.name, self.data_type),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunctionReturns {
    Scalar { data_type: DataType, not_null: bool },
    Table(Vec<(String, DataType)>),
}

impl FunctionReturns {
    fn render(&self) -> String {
        match self {
            FunctionReturns::Scalar { data_type, not_null: false } => format!("RETURNS {data_type}"),
            FunctionReturns::Scalar { data_type, not_null: true } => {
                format!("RETURNS {data_type} NOT NULL")
            }
            FunctionReturns::Table(columns) => {
                let columns = columns
                    .iter()
                    .map(|(name, data_type)| format!("{name} {data_type}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("RETURNS TABLE ({columns})")
            }
        }
    }
}

/// `CREATE [OR REPLACE] [TEMPORARY] [SECURE] FUNCTION ... LANGUAGE SQL ... AS '<body>'`
#[derive(Clone, Debug)]
pub struct CreateFunctionOptions {
    pub or_replace: bool,
    pub temporary: bool,
    pub secure: bool,
    pub if_not_exists: bool,
    pub arguments: Vec<FunctionArgument>,
    pub copy_grants: bool,
    pub returns: FunctionReturns,
    pub null_input_behavior: Option<NullInputBehavior>,
    pub return_results_behavior: Option<ReturnResultsBehavior>,
    pub memoizable: bool,
    pub comment: Option<String>,
    pub body: String,
}

impl CreateFunctionOptions {
    pub fn new(arguments: Vec<FunctionArgument>, returns: FunctionReturns, body: impl Into<String>) -> Self {
        Self {
            or_replace: false,
            temporary: false,
            secure: false,
            if_not_exists: false,
            arguments,
            copy_grants: false,
            returns,
            null_input_behavior: None,
            return_results_behavior: None,
            memoizable: false,
            comment: None,
            body: body.into(),
        }
    }

    /// The identifier the created function is addressed by afterwards.
    pub fn id_with_arguments(&self, id: &SchemaObjectIdentifier) -> SchemaObjectIdentifierWithArguments {
        id.clone()
            .with_arguments(self.arguments.iter().map(|arg| arg.data_type).collect())
    }
}

impl SqlStatement for CreateFunctionOptions {
    type Target = SchemaObjectIdentifier;

    fn validate(&self, id: &SchemaObjectIdentifier) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .more_than_one_of(&[("OrReplace", self.or_replace), ("IfNotExists", self.if_not_exists)])
            .check(self.body.trim().is_empty(), || {
                SnowflakeError::invalid_option("Body", "a function body is required")
            })
            .check(self.arguments.iter().any(|arg| arg.name.trim().is_empty()), || {
                SnowflakeError::invalid_option("Arguments", "argument names cannot be empty")
            });
        if let FunctionReturns::Table(columns) = &self.returns {
            validator.check(columns.is_empty(), || {
                SnowflakeError::invalid_option("Returns", "a table function returns at least one column")
            });
        }
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifier, sql: &mut SqlBuilder) {
        let arguments = self
            .arguments
            .iter()
            .map(FunctionArgument::render)
            .collect::<Vec<_>>()
            .join(", ");
        sql.keyword("CREATE")
            .keyword_if(self.or_replace, "OR REPLACE")
            .keyword_if(self.temporary, "TEMPORARY")
            .keyword_if(self.secure, "SECURE")
            .keyword("FUNCTION")
            .keyword_if(self.if_not_exists, "IF NOT EXISTS")
            .raw(&format!("{}({arguments})", id.fully_qualified_name()))
            .keyword_if(self.copy_grants, "COPY GRANTS")
            .raw(&self.returns.render())
            .keyword("LANGUAGE SQL")
            .raw_opt(self.null_input_behavior.as_ref().map(NullInputBehavior::as_str))
            .raw_opt(self.return_results_behavior.as_ref().map(ReturnResultsBehavior::as_str))
            .keyword_if(self.memoizable, "MEMOIZABLE")
            .text("COMMENT", self.comment.as_deref())
            .raw(&format!("AS {}", quote_string(&self.body)));
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlterFunctionOptions {
    pub if_exists: bool,
    pub new_name: Option<SchemaObjectIdentifier>,
    pub set_secure: bool,
    pub unset_secure: bool,
    pub set_comment: Option<String>,
    pub unset_comment: bool,
}

impl SqlStatement for AlterFunctionOptions {
    type Target = SchemaObjectIdentifierWithArguments;

    fn validate(&self, id: &SchemaObjectIdentifierWithArguments) -> SnowflakeResult<()> {
        let mut validator = Validator::new();
        validator
            .identifier(id)
            .identifier_opt(self.new_name.as_ref())
            .exactly_one_of(&[
                ("NewName", self.new_name.is_some()),
                ("SetSecure", self.set_secure),
                ("UnsetSecure", self.unset_secure),
                ("SetComment", self.set_comment.is_some()),
                ("UnsetComment", self.unset_comment),
            ]);
        validator.finish()
    }

    fn render(&self, id: &SchemaObjectIdentifierWithArguments, sql: &mut SqlBuilder) {
        sql.keyword("ALTER FUNCTION")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id)
            .identifier_after("RENAME TO", self.new_name.as_ref())
            .keyword_if(self.set_secure, "SET SECURE")
            .keyword_if(self.unset_secure, "UNSET SECURE")
            .keyword_some(self.set_comment.as_ref(), "SET")
            .text("COMMENT", self.set_comment.as_deref())
            .keyword_if(self.unset_comment, "UNSET COMMENT");
    }
}

#[derive(Clone, Debug, Default)]
pub struct DropFunctionOptions {
    pub if_exists: bool,
}

impl SqlStatement for DropFunctionOptions {
    type Target = SchemaObjectIdentifierWithArguments;

    fn validate(&self, id: &SchemaObjectIdentifierWithArguments) -> SnowflakeResult<()> {
        validate_identifier(id)
    }

    fn render(&self, id: &SchemaObjectIdentifierWithArguments, sql: &mut SqlBuilder) {
        sql.keyword("DROP FUNCTION")
            .keyword_if(self.if_exists, "IF EXISTS")
            .identifier(id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShowFunctionOptions {
    pub like: Option<Like>,
    pub scope: Option<In>,
}

impl SqlStatement for ShowFunctionOptions {
    type Target = ();

    fn validate(&self, _: &()) -> SnowflakeResult<()> {
        validate_filters(self.like.as_ref(), self.scope.as_ref())
    }

    fn render(&self, _: &(), sql: &mut SqlBuilder) {
        sql.keyword("SHOW USER FUNCTIONS")
            .nested(None, self.like.as_ref())
            .nested(None, self.scope.as_ref());
    }
}

#[derive(Debug, Default)]
struct FunctionRow {
    created_on: Option<DateTime<Utc>>,
    name: Option<String>,
    schema_name: Option<String>,
    is_builtin: Option<bool>,
    is_aggregate: Option<bool>,
    is_ansi: Option<bool>,
    min_num_arguments: Option<i64>,
    max_num_arguments: Option<i64>,
    arguments: Option<String>,
    description: Option<String>,
    catalog_name: Option<String>,
    is_table_function: Option<bool>,
    valid_for_clustering: Option<bool>,
    is_secure: Option<bool>,
    is_external_function: Option<bool>,
    language: Option<String>,
    is_memoizable: Option<bool>,
}
impl_from_row!(FunctionRow {
    created_on,
    name,
    schema_name,
    is_builtin,
    is_aggregate,
    is_ansi,
    min_num_arguments,
    max_num_arguments,
    arguments,
    description,
    catalog_name,
    is_table_function,
    valid_for_clustering,
    is_secure,
    is_external_function,
    language,
    is_memoizable,
});

/// A row of `SHOW USER FUNCTIONS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub created_on: Option<DateTime<Utc>>,
    pub name: String,
    pub schema_name: String,
    pub catalog_name: String,
    pub is_builtin: bool,
    pub is_aggregate: bool,
    pub is_ansi: bool,
    pub min_num_arguments: i64,
    pub max_num_arguments: i64,
    pub argument_types: Vec<DataType>,
    /// Return type as printed after `RETURN`, e.g. `NUMBER` or `TABLE (A NUMBER)`.
    pub return_type: String,
    pub description: String,
    pub is_table_function: bool,
    pub valid_for_clustering: bool,
    pub is_secure: bool,
    pub is_external_function: bool,
    pub language: String,
    pub is_memoizable: bool,
}

/// Split the `arguments` column, e.g. `ADD_ONE(NUMBER, DEFAULT VARCHAR) RETURN NUMBER`.
fn parse_arguments_column(value: &str) -> SnowflakeResult<(Vec<DataType>, String)> {
    let invalid = || SnowflakeError::decoding("arguments", format!("unexpected value {value:?}"));
    let (signature, return_type) = match value.rsplit_once(" RETURN ") {
        Some((signature, return_type)) => (signature, return_type.trim().to_owned()),
        None => (value, String::new()),
    };
    let open = signature.find('(').ok_or_else(invalid)?;
    let list = signature[open..]
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(invalid)?;
    let types = split_top_level(list, ',')
        .iter()
        .map(|arg| {
            let arg = arg.strip_prefix("DEFAULT ").unwrap_or(arg);
            DataType::parse(arg)
        })
        .collect::<SnowflakeResult<Vec<_>>>()?;
    Ok((types, return_type))
}

impl TryFrom<FunctionRow> for Function {
    type Error = SnowflakeError;

    fn try_from(row: FunctionRow) -> SnowflakeResult<Self> {
        let (argument_types, return_type) = match row.arguments.as_deref() {
            Some(arguments) => parse_arguments_column(arguments)?,
            None => (Vec::new(), String::new()),
        };
        Ok(Function {
            created_on: row.created_on,
            name: row.name.unwrap_or_default(),
            schema_name: row.schema_name.unwrap_or_default(),
            catalog_name: row.catalog_name.unwrap_or_default(),
            is_builtin: row.is_builtin.unwrap_or_default(),
            is_aggregate: row.is_aggregate.unwrap_or_default(),
            is_ansi: row.is_ansi.unwrap_or_default(),
            min_num_arguments: row.min_num_arguments.unwrap_or_default(),
            max_num_arguments: row.max_num_arguments.unwrap_or_default(),
            argument_types,
            return_type,
            description: row.description.unwrap_or_default(),
            is_table_function: row.is_table_function.unwrap_or_default(),
            valid_for_clustering: row.valid_for_clustering.unwrap_or_default(),
            is_secure: row.is_secure.unwrap_or_default(),
            is_external_function: row.is_external_function.unwrap_or_default(),
            language: row.language.unwrap_or_default(),
            is_memoizable: row.is_memoizable.unwrap_or_default(),
        })
    }
}

impl Identified for Function {
    type Id = SchemaObjectIdentifierWithArguments;

    fn id(&self) -> SchemaObjectIdentifierWithArguments {
        SchemaObjectIdentifierWithArguments::new(
            &self.catalog_name,
            &self.schema_name,
            &self.name,
            self.argument_types.clone(),
        )
    }
}

#[derive(Debug, Default)]
struct FunctionPropertyRow {
    property: Option<String>,
    value: Option<String>,
}
impl_from_row!(FunctionPropertyRow { property, value });

/// Output of `DESCRIBE FUNCTION`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunctionDetails {
    pub signature: String,
    pub returns: String,
    pub language: String,
    pub null_handling: Option<String>,
    pub volatility: Option<String>,
    pub body: String,
}

impl FunctionDetails {
    fn from_properties(rows: Vec<FunctionPropertyRow>) -> Self {
        let mut details = FunctionDetails::default();
        for row in rows {
            let (Some(property), Some(value)) = (row.property, row.value) else {
                continue;
            };
            match property.to_ascii_lowercase().as_str() {
                "signature" => details.signature = value,
                "returns" => details.returns = value,
                "language" => details.language = value,
                "null handling" => details.null_handling = Some(value),
                "volatility" => details.volatility = Some(value),
                "body" => details.body = value,
                _ => {}
            }
        }
        details
    }
}

pub struct Functions<'a> {
    executor: &'a dyn Executor,
}

impl<'a> Functions<'a> {
    pub(crate) fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    pub async fn create(&self, id: &SchemaObjectIdentifier, opts: &CreateFunctionOptions) -> SnowflakeResult<()> {
        exec(self.executor, &opts.to_sql(id)?).await
    }

    pub async fn alter(
        &self,
        id: &SchemaObjectIdentifierWithArguments,
        opts: Option<&AlterFunctionOptions>,
    ) -> SnowflakeResult<()> {
        let sql = require(opts)?.to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn drop(
        &self,
        id: &SchemaObjectIdentifierWithArguments,
        opts: Option<&DropFunctionOptions>,
    ) -> SnowflakeResult<()> {
        let default = DropFunctionOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(id)?;
        exec(self.executor, &sql).await
    }

    pub async fn show(&self, opts: Option<&ShowFunctionOptions>) -> SnowflakeResult<Vec<Function>> {
        let default = ShowFunctionOptions::default();
        let sql = opts.unwrap_or(&default).to_sql(&())?;
        let rows: Vec<FunctionRow> = query_all(self.executor, &sql).await?;
        rows.into_iter().map(Function::try_from).collect()
    }

    /// Overloads share a name; the match is on name and argument types.
    pub async fn show_by_id(&self, id: &SchemaObjectIdentifierWithArguments) -> SnowflakeResult<Function> {
        let functions = self
            .show(Some(&ShowFunctionOptions {
                like: Some(Like::new(id.name())),
                scope: Some(In::schema(id.schema_id())),
            }))
            .await?;
        find_by_id(functions, id)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifierWithArguments) -> SnowflakeResult<FunctionDetails> {
        validate_identifier(id)?;
        let sql = format!("DESCRIBE FUNCTION {}", id.fully_qualified_name());
        let rows: Vec<FunctionPropertyRow> = query_all(self.executor, &sql).await?;
        if rows.is_empty() {
            return Err(SnowflakeError::ObjectNotFound);
        }
        Ok(FunctionDetails::from_properties(rows))
    }
}
