//! Typed names for Snowflake objects.
//!
//! Every identifier renders its fully qualified name with each part double quoted,
//! so the case of a name is preserved exactly as it was given. Parsing accepts both
//! quoted and unquoted parts and is the only place where identifiers are read from
//! free-form strings.
use std::fmt;
use std::str::FromStr;

use crate::data_types::DataType;
use crate::errors::{SnowflakeError, SnowflakeResult};

/// Behaviour shared by every identifier variant.
pub trait ObjectIdentifier: fmt::Debug + Send + Sync {
    /// The object's own (unqualified, unquoted) name.
    fn name(&self) -> &str;
    /// Every part double quoted and joined by dots.
    fn fully_qualified_name(&self) -> String;
    /// True when every required part is non-empty.
    fn is_valid(&self) -> bool;
}

/// Double quote an identifier part, doubling embedded quotes.
pub fn quote_identifier(part: &str) -> String {
    format!("\"{}\"", part.replace('"', "\"\""))
}

fn join_quoted(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| quote_identifier(p))
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a dotted name into its parts, honouring double quotes and `""` escapes.
pub(crate) fn split_identifier_parts(input: &str) -> SnowflakeResult<Vec<String>> {
    let invalid = || SnowflakeError::InvalidObjectIdentifier(input.to_owned());
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.trim().chars().peekable();
    let mut in_quotes = false;
    let mut part_was_quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => {
                if !current.is_empty() || part_was_quoted {
                    return Err(invalid());
                }
                in_quotes = true;
                part_was_quoted = true;
            }
            '.' if !in_quotes => {
                parts.push(std::mem::take(&mut current));
                part_was_quoted = false;
            }
            _ if part_was_quoted && !in_quotes => return Err(invalid()),
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(invalid());
    }
    parts.push(current);
    Ok(parts)
}

fn parse_exact<const N: usize>(input: &str) -> SnowflakeResult<[String; N]> {
    let parts = split_identifier_parts(input)?;
    let parts: [String; N] = parts
        .try_into()
        .map_err(|_| SnowflakeError::InvalidObjectIdentifier(input.to_owned()))?;
    if parts.iter().any(|p| p.is_empty()) {
        return Err(SnowflakeError::InvalidObjectIdentifier(input.to_owned()));
    }
    Ok(parts)
}

/// Objects living directly in the account: databases, warehouses, users, roles, ...
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountObjectIdentifier {
    name: String,
}

impl AccountObjectIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ObjectIdentifier for AccountObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fully_qualified_name(&self) -> String {
        quote_identifier(&self.name)
    }

    fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }
}

impl FromStr for AccountObjectIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [name] = parse_exact::<1>(s)?;
        Ok(Self { name })
    }
}

/// Objects living in a database: schemas, database roles, ...
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DatabaseObjectIdentifier {
    database: String,
    name: String,
}

impl DatabaseObjectIdentifier {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.database.clone())
    }
}

impl ObjectIdentifier for DatabaseObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fully_qualified_name(&self) -> String {
        join_quoted(&[&self.database, &self.name])
    }

    fn is_valid(&self) -> bool {
        !self.database.is_empty() && !self.name.is_empty()
    }
}

impl FromStr for DatabaseObjectIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [database, name] = parse_exact::<2>(s)?;
        Ok(Self { database, name })
    }
}

/// Objects living in a schema: tables, views, streams, policies, tags, ...
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaObjectIdentifier {
    database: String,
    schema: String,
    name: String,
}

impl SchemaObjectIdentifier {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// An identifier for `name` in the same schema as `schema`.
    pub fn in_schema(schema: &DatabaseObjectIdentifier, name: impl Into<String>) -> Self {
        Self::new(schema.database_name(), schema.name(), name)
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(self.database.clone())
    }

    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(self.database.clone(), self.schema.clone())
    }

    pub fn with_arguments(self, arguments: Vec<DataType>) -> SchemaObjectIdentifierWithArguments {
        SchemaObjectIdentifierWithArguments {
            id: self,
            arguments,
        }
    }
}

impl ObjectIdentifier for SchemaObjectIdentifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fully_qualified_name(&self) -> String {
        join_quoted(&[&self.database, &self.schema, &self.name])
    }

    fn is_valid(&self) -> bool {
        !self.database.is_empty() && !self.schema.is_empty() && !self.name.is_empty()
    }
}

impl FromStr for SchemaObjectIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [database, schema, name] = parse_exact::<3>(s)?;
        Ok(Self {
            database,
            schema,
            name,
        })
    }
}

/// A schema object plus its argument types, for overloaded functions and procedures.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaObjectIdentifierWithArguments {
    id: SchemaObjectIdentifier,
    arguments: Vec<DataType>,
}

impl SchemaObjectIdentifierWithArguments {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
        arguments: Vec<DataType>,
    ) -> Self {
        SchemaObjectIdentifier::new(database, schema, name).with_arguments(arguments)
    }

    pub fn database_name(&self) -> &str {
        self.id.database_name()
    }

    pub fn schema_name(&self) -> &str {
        self.id.schema_name()
    }

    pub fn arguments(&self) -> &[DataType] {
        &self.arguments
    }

    pub fn schema_object_id(&self) -> &SchemaObjectIdentifier {
        &self.id
    }

    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        self.id.schema_id()
    }

    /// The `(NUMBER, VARCHAR)` suffix of the fully qualified name.
    pub fn arguments_signature(&self) -> String {
        format!(
            "({})",
            self.arguments
                .iter()
                .map(DataType::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl ObjectIdentifier for SchemaObjectIdentifierWithArguments {
    fn name(&self) -> &str {
        self.id.name()
    }

    fn fully_qualified_name(&self) -> String {
        format!("{}{}", self.id.fully_qualified_name(), self.arguments_signature())
    }

    fn is_valid(&self) -> bool {
        self.id.is_valid()
    }
}

/// Split `a, b(1, 2), c` on top level commas.
pub(crate) fn split_top_level(input: &str, separator: char) -> Vec<String> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in input.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 && !in_quotes => {
                parts.push(std::mem::take(&mut current).trim().to_owned());
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_owned());
    }
    parts
}

/// Parse a `(TYPE, TYPE)` argument list.
pub(crate) fn parse_argument_types(list: &str) -> SnowflakeResult<Vec<DataType>> {
    let inner = list
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| SnowflakeError::InvalidObjectIdentifier(list.to_owned()))?;
    split_top_level(inner, ',')
        .iter()
        .map(|arg| DataType::parse(arg))
        .collect()
}

/// Byte offset of the first `(` outside double quotes.
fn arguments_start(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    s.char_indices()
        .find(|&(_, c)| {
            if c == '"' {
                in_quotes = !in_quotes;
            }
            c == '(' && !in_quotes
        })
        .map(|(i, _)| i)
}

impl FromStr for SchemaObjectIdentifierWithArguments {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let open = arguments_start(s)
            .ok_or_else(|| SnowflakeError::InvalidObjectIdentifier(s.to_owned()))?;
        let id: SchemaObjectIdentifier = s[..open].parse()?;
        let arguments = parse_argument_types(&s[open..])?;
        Ok(id.with_arguments(arguments))
    }
}

/// A Snowflake account, either `organization.account` or a legacy account locator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AccountIdentifier {
    Name {
        organization: String,
        account: String,
    },
    Locator(String),
}

impl AccountIdentifier {
    pub fn new(organization: impl Into<String>, account: impl Into<String>) -> Self {
        AccountIdentifier::Name {
            organization: organization.into(),
            account: account.into(),
        }
    }

    pub fn from_locator(locator: impl Into<String>) -> Self {
        AccountIdentifier::Locator(locator.into())
    }

    pub fn organization_name(&self) -> Option<&str> {
        match self {
            AccountIdentifier::Name { organization, .. } => Some(organization),
            AccountIdentifier::Locator(_) => None,
        }
    }

    pub fn account_name(&self) -> &str {
        match self {
            AccountIdentifier::Name { account, .. } => account,
            AccountIdentifier::Locator(locator) => locator,
        }
    }

    /// The `ORG-ACCOUNT` form used in hostnames and key pair JWT claims.
    pub fn hostname_prefix(&self) -> String {
        match self {
            AccountIdentifier::Name {
                organization,
                account,
            } => format!("{organization}-{account}"),
            AccountIdentifier::Locator(locator) => locator.clone(),
        }
    }
}

impl ObjectIdentifier for AccountIdentifier {
    fn name(&self) -> &str {
        self.account_name()
    }

    fn fully_qualified_name(&self) -> String {
        match self {
            AccountIdentifier::Name {
                organization,
                account,
            } => join_quoted(&[organization, account]),
            AccountIdentifier::Locator(locator) => quote_identifier(locator),
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            AccountIdentifier::Name {
                organization,
                account,
            } => !organization.is_empty() && !account.is_empty(),
            AccountIdentifier::Locator(locator) => !locator.is_empty(),
        }
    }
}

impl FromStr for AccountIdentifier {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_identifier_parts(s)?;
        if parts.iter().any(|p| p.is_empty()) {
            return Err(SnowflakeError::InvalidObjectIdentifier(s.to_owned()));
        }
        match <[String; 2]>::try_from(parts) {
            Ok([organization, account]) => Ok(AccountIdentifier::Name {
                organization,
                account,
            }),
            Err(parts) => match <[String; 1]>::try_from(parts) {
                Ok([locator]) => Ok(AccountIdentifier::Locator(locator)),
                Err(_) => Err(SnowflakeError::InvalidObjectIdentifier(s.to_owned())),
            },
        }
    }
}

/// Any identifier, tagged by its nesting level.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnyObjectIdentifier {
    Account(AccountObjectIdentifier),
    Database(DatabaseObjectIdentifier),
    Schema(SchemaObjectIdentifier),
    SchemaWithArguments(SchemaObjectIdentifierWithArguments),
}

impl AnyObjectIdentifier {
    fn as_dyn(&self) -> &dyn ObjectIdentifier {
        match self {
            AnyObjectIdentifier::Account(id) => id,
            AnyObjectIdentifier::Database(id) => id,
            AnyObjectIdentifier::Schema(id) => id,
            AnyObjectIdentifier::SchemaWithArguments(id) => id,
        }
    }
}

impl ObjectIdentifier for AnyObjectIdentifier {
    fn name(&self) -> &str {
        self.as_dyn().name()
    }

    fn fully_qualified_name(&self) -> String {
        self.as_dyn().fully_qualified_name()
    }

    fn is_valid(&self) -> bool {
        self.as_dyn().is_valid()
    }
}

impl From<AccountObjectIdentifier> for AnyObjectIdentifier {
    fn from(id: AccountObjectIdentifier) -> Self {
        AnyObjectIdentifier::Account(id)
    }
}

impl From<DatabaseObjectIdentifier> for AnyObjectIdentifier {
    fn from(id: DatabaseObjectIdentifier) -> Self {
        AnyObjectIdentifier::Database(id)
    }
}

impl From<SchemaObjectIdentifier> for AnyObjectIdentifier {
    fn from(id: SchemaObjectIdentifier) -> Self {
        AnyObjectIdentifier::Schema(id)
    }
}

impl From<SchemaObjectIdentifierWithArguments> for AnyObjectIdentifier {
    fn from(id: SchemaObjectIdentifierWithArguments) -> Self {
        AnyObjectIdentifier::SchemaWithArguments(id)
    }
}

/// An object owned by another account, e.g. the primary of a replicated database.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExternalObjectIdentifier {
    account: AccountIdentifier,
    inner: AnyObjectIdentifier,
}

impl ExternalObjectIdentifier {
    pub fn new(account: AccountIdentifier, inner: impl Into<AnyObjectIdentifier>) -> Self {
        Self {
            account,
            inner: inner.into(),
        }
    }

    pub fn account(&self) -> &AccountIdentifier {
        &self.account
    }

    pub fn inner(&self) -> &AnyObjectIdentifier {
        &self.inner
    }
}

impl ObjectIdentifier for ExternalObjectIdentifier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fully_qualified_name(&self) -> String {
        format!(
            "{}.{}",
            self.account.fully_qualified_name(),
            self.inner.fully_qualified_name()
        )
    }

    fn is_valid(&self) -> bool {
        self.account.is_valid() && self.inner.is_valid()
    }
}

impl FromStr for ExternalObjectIdentifier {
    type Err = SnowflakeError;

    /// The account prefix is read as `org.account` whenever the part count allows
    /// it, so a locator prefix only parses back in front of a single account
    /// object name or a function signature: `loc.name`, `loc.db.schema.fn(...)`.
    /// `loc.db.name` reads as `org.account.name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SnowflakeError::InvalidObjectIdentifier(s.to_owned());
        let (path, arguments) = match arguments_start(s) {
            Some(open) => (&s[..open], Some(parse_argument_types(&s[open..])?)),
            None => (s, None),
        };
        let parts = split_identifier_parts(path)?;
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }
        let account_parts = match (parts.len(), arguments.is_some()) {
            (2, false) | (4, true) => 1,
            (3..=5, false) | (5, true) => 2,
            _ => return Err(invalid()),
        };
        let mut parts = parts.into_iter();
        let account = if account_parts == 1 {
            AccountIdentifier::Locator(parts.next().ok_or_else(invalid)?)
        } else {
            let (Some(organization), Some(account)) = (parts.next(), parts.next()) else {
                return Err(invalid());
            };
            AccountIdentifier::new(organization, account)
        };
        let rest: Vec<String> = parts.collect();
        let inner: AnyObjectIdentifier = match (rest.as_slice(), arguments) {
            ([name], None) => AccountObjectIdentifier::new(name.clone()).into(),
            ([database, name], None) => {
                DatabaseObjectIdentifier::new(database.clone(), name.clone()).into()
            }
            ([database, schema, name], None) => {
                SchemaObjectIdentifier::new(database.clone(), schema.clone(), name.clone()).into()
            }
            ([database, schema, name], Some(arguments)) => {
                SchemaObjectIdentifierWithArguments::new(
                    database.clone(),
                    schema.clone(),
                    name.clone(),
                    arguments,
                )
                .into()
            }
            _ => return Err(invalid()),
        };
        Ok(Self::new(account, inner))
    }
}

macro_rules! impl_display_fqn {
    ($($ty: ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.fully_qualified_name())
                }
            }
        )*
    };
}
impl_display_fqn!(
    AccountObjectIdentifier,
    DatabaseObjectIdentifier,
    SchemaObjectIdentifier,
    SchemaObjectIdentifierWithArguments,
    AccountIdentifier,
    AnyObjectIdentifier,
    ExternalObjectIdentifier
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_qualified_names_quote_every_part() {
        assert_eq!(
            AccountObjectIdentifier::new("db1").fully_qualified_name(),
            r#""db1""#
        );
        assert_eq!(
            DatabaseObjectIdentifier::new("db", "schema").fully_qualified_name(),
            r#""db"."schema""#
        );
        assert_eq!(
            SchemaObjectIdentifier::new("db", "schema", "My Table").fully_qualified_name(),
            r#""db"."schema"."My Table""#
        );
        assert_eq!(
            SchemaObjectIdentifier::new("db", "schema", r#"a"b"#).fully_qualified_name(),
            r#""db"."schema"."a""b""#
        );
    }

    #[test]
    fn arguments_render_in_declared_order() {
        let id = SchemaObjectIdentifierWithArguments::new(
            "db",
            "schema",
            "fn",
            vec![DataType::Number, DataType::Varchar],
        );
        assert_eq!(
            id.fully_qualified_name(),
            r#""db"."schema"."fn"(NUMBER, VARCHAR)"#
        );
        let none = SchemaObjectIdentifierWithArguments::new("db", "schema", "fn", vec![]);
        assert_eq!(none.fully_qualified_name(), r#""db"."schema"."fn"()"#);
    }

    #[test]
    fn parsing_round_trips() {
        let account = AccountObjectIdentifier::new("warehouse.with.dots");
        assert_eq!(account.fully_qualified_name().parse::<AccountObjectIdentifier>().unwrap(), account);

        let database = DatabaseObjectIdentifier::new("db", "Mixed Case");
        assert_eq!(database.to_string().parse::<DatabaseObjectIdentifier>().unwrap(), database);

        let schema = SchemaObjectIdentifier::new("db", "sc", r#"quo"ted"#);
        assert_eq!(schema.to_string().parse::<SchemaObjectIdentifier>().unwrap(), schema);

        let function = SchemaObjectIdentifierWithArguments::new(
            "db",
            "sc",
            "fn(x)",
            vec![DataType::Float, DataType::TimestampTz],
        );
        assert_eq!(
            function.to_string().parse::<SchemaObjectIdentifierWithArguments>().unwrap(),
            function
        );

        let account_id = AccountIdentifier::new("org", "acc");
        assert_eq!(account_id.to_string().parse::<AccountIdentifier>().unwrap(), account_id);

        let external = ExternalObjectIdentifier::new(
            AccountIdentifier::new("org", "acc"),
            DatabaseObjectIdentifier::new("db", "sc"),
        );
        assert_eq!(external.to_string().parse::<ExternalObjectIdentifier>().unwrap(), external);

        let on_locator = ExternalObjectIdentifier::new(
            AccountIdentifier::from_locator("ab12345"),
            AccountObjectIdentifier::new("db"),
        );
        assert_eq!(on_locator.to_string(), r#""ab12345"."db""#);
        assert_eq!(on_locator.to_string().parse::<ExternalObjectIdentifier>().unwrap(), on_locator);

        for account in [AccountIdentifier::new("org", "acc"), AccountIdentifier::from_locator("ab12345")] {
            let function = ExternalObjectIdentifier::new(
                account,
                SchemaObjectIdentifierWithArguments::new("db", "sc", "fn", vec![DataType::Number]),
            );
            assert_eq!(function.to_string().parse::<ExternalObjectIdentifier>().unwrap(), function);
        }
    }

    #[test]
    fn external_prefix_prefers_organization_and_account() {
        let id: ExternalObjectIdentifier = "loc.db.name".parse().unwrap();
        assert_eq!(id.account(), &AccountIdentifier::new("loc", "db"));
        assert_eq!(id.inner(), &AnyObjectIdentifier::Account(AccountObjectIdentifier::new("name")));
    }

    #[test]
    fn parsing_accepts_unquoted_parts() {
        let id: SchemaObjectIdentifier = "db.schema.table".parse().unwrap();
        assert_eq!(id, SchemaObjectIdentifier::new("db", "schema", "table"));
        let id: SchemaObjectIdentifierWithArguments =
            "db.schema.fn(number(38, 0), varchar)".parse().unwrap();
        assert_eq!(id.arguments(), &[DataType::Number, DataType::Varchar]);
    }

    #[test]
    fn parsing_rejects_wrong_arity_and_empty_parts() {
        assert!("a.b".parse::<AccountObjectIdentifier>().is_err());
        assert!("a".parse::<DatabaseObjectIdentifier>().is_err());
        assert!("a.b.c.d".parse::<SchemaObjectIdentifier>().is_err());
        assert!("a..c".parse::<SchemaObjectIdentifier>().is_err());
        assert!(r#""unterminated"#.parse::<AccountObjectIdentifier>().is_err());
        assert!("db.schema.fn".parse::<SchemaObjectIdentifierWithArguments>().is_err());
        assert!("org".parse::<ExternalObjectIdentifier>().is_err());
        assert!("a.b.c.d.e.f".parse::<ExternalObjectIdentifier>().is_err());
        assert!("org.acc.fn(NUMBER)".parse::<ExternalObjectIdentifier>().is_err());
    }

    #[test]
    fn validity_requires_every_part() {
        assert!(AccountObjectIdentifier::new("a").is_valid());
        assert!(!AccountObjectIdentifier::new("").is_valid());
        assert!(!DatabaseObjectIdentifier::new("", "b").is_valid());
        assert!(!SchemaObjectIdentifier::new("a", "", "c").is_valid());
        assert!(!AccountIdentifier::new("org", "").is_valid());
        assert!(!ExternalObjectIdentifier::new(
            AccountIdentifier::new("org", "acc"),
            AccountObjectIdentifier::new("")
        )
        .is_valid());
    }

    #[test]
    fn equality_is_case_sensitive() {
        assert_ne!(
            AccountObjectIdentifier::new("DB"),
            AccountObjectIdentifier::new("db")
        );
    }

    #[test]
    fn top_level_split_ignores_nested_commas() {
        assert_eq!(
            split_top_level("NUMBER(38, 0), VARCHAR", ','),
            vec!["NUMBER(38, 0)".to_owned(), "VARCHAR".to_owned()]
        );
        assert!(split_top_level("", ',').is_empty());
    }
}
