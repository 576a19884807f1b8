//! Clauses and helpers shared by the object clients.
use crate::builder::{Assignment, Clause, Quotes, SqlBuilder};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::{
    split_top_level, AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier,
    SchemaObjectIdentifier,
};
use crate::validation::Validator;

/// `LIKE '<pattern>'`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Like {
    pub pattern: String,
}

impl Like {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn validate(&self) -> SnowflakeResult<()> {
        if self.pattern.is_empty() {
            return Err(SnowflakeError::PatternRequiredForLike);
        }
        Ok(())
    }
}

impl Clause for Like {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.parameter("LIKE", Some(&self.pattern), Quotes::Single, Assignment::NoEquals);
    }
}

/// `IN ACCOUNT | IN DATABASE <db> | IN SCHEMA <db>.<schema>`; exactly one scope is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct In {
    pub account: bool,
    pub database: Option<AccountObjectIdentifier>,
    pub schema: Option<DatabaseObjectIdentifier>,
}

impl In {
    pub fn account() -> Self {
        Self {
            account: true,
            ..Self::default()
        }
    }

    pub fn database(database: AccountObjectIdentifier) -> Self {
        Self {
            database: Some(database),
            ..Self::default()
        }
    }

    pub fn schema(schema: DatabaseObjectIdentifier) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SnowflakeResult<()> {
        let scopes = [self.account, self.database.is_some(), self.schema.is_some()];
        if scopes.iter().filter(|set| **set).count() != 1 {
            return Err(SnowflakeError::ScopeRequiredForIn);
        }
        let mut validator = Validator::new();
        validator
            .identifier_opt(self.database.as_ref())
            .identifier_opt(self.schema.as_ref());
        validator.finish()
    }
}

impl Clause for In {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.keyword("IN")
            .keyword_if(self.account, "ACCOUNT")
            .identifier_after("DATABASE", self.database.as_ref())
            .identifier_after("SCHEMA", self.schema.as_ref());
    }
}

/// `LIMIT <rows> [FROM '<name>']`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LimitFrom {
    pub rows: u64,
    pub from: Option<String>,
}

impl LimitFrom {
    pub fn new(rows: u64) -> Self {
        Self { rows, from: None }
    }
}

impl Clause for LimitFrom {
    fn render(&self, sql: &mut SqlBuilder) {
        sql.parameter("LIMIT", Some(self.rows), Quotes::None, Assignment::NoEquals)
            .parameter("FROM", self.from.as_deref(), Quotes::Single, Assignment::NoEquals);
    }
}

/// `STARTS WITH '<prefix>'`
pub(crate) fn starts_with(sql: &mut SqlBuilder, prefix: Option<&str>) {
    sql.parameter("STARTS WITH", prefix, Quotes::Single, Assignment::NoEquals);
}

/// Validate the usual SHOW filters.
pub(crate) fn validate_filters(like: Option<&Like>, scope: Option<&In>) -> SnowflakeResult<()> {
    let mut validator = Validator::new();
    if let Some(like) = like {
        validator.nested(like.validate());
    }
    if let Some(scope) = scope {
        validator.nested(scope.validate());
    }
    validator.finish()
}

/// A tag and the value it is set to on an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagAssociation {
    pub name: SchemaObjectIdentifier,
    pub value: String,
}

impl TagAssociation {
    pub fn new(name: SchemaObjectIdentifier, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "{} = {}",
            self.name.fully_qualified_name(),
            crate::builder::quote_string(&self.value)
        )
    }
}

fn render_tag_list(tags: &[TagAssociation]) -> String {
    tags.iter()
        .map(TagAssociation::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `TAG (<tag> = '<value>', ...)` in CREATE statements; nothing when empty.
pub(crate) fn with_tags(sql: &mut SqlBuilder, tags: &[TagAssociation]) {
    if !tags.is_empty() {
        sql.raw(&format!("TAG ({})", render_tag_list(tags)));
    }
}

/// `SET TAG <tag> = '<value>', ...`
pub(crate) fn set_tags(sql: &mut SqlBuilder, tags: &[TagAssociation]) {
    if !tags.is_empty() {
        sql.raw(&format!("SET TAG {}", render_tag_list(tags)));
    }
}

/// `UNSET TAG <tag>, ...`
pub(crate) fn unset_tags(sql: &mut SqlBuilder, tags: &[SchemaObjectIdentifier]) {
    if !tags.is_empty() {
        let names = tags
            .iter()
            .map(ObjectIdentifier::fully_qualified_name)
            .collect::<Vec<_>>()
            .join(", ");
        sql.raw(&format!("UNSET TAG {names}"));
    }
}

pub(crate) fn validate_tags(validator: &mut Validator, tags: &[TagAssociation]) {
    for tag in tags {
        validator.identifier(&tag.name);
    }
}

/// An entity that knows its own identifier.
pub trait Identified {
    type Id: ObjectIdentifier;

    fn id(&self) -> Self::Id;
}

/// Pick the entity whose fully qualified name equals `id`'s; SHOW ... LIKE also
/// matches wildcards and is case-insensitive, so several rows may come back.
pub(crate) fn find_by_id<E, I>(entities: Vec<E>, id: &I) -> SnowflakeResult<E>
where
    E: Identified,
    I: ObjectIdentifier + ?Sized,
{
    let wanted = id.fully_qualified_name();
    entities
        .into_iter()
        .find(|entity| entity.id().fully_qualified_name() == wanted)
        .ok_or(SnowflakeError::ObjectNotFound)
}

/// `["A", "B"]` or `[A, B]` as returned in SHOW output.
pub(crate) fn parse_bracketed_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(trimmed);
    parse_comma_separated(inner)
        .into_iter()
        .map(|item| item.trim_matches('"').to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

/// `a, b, c`, respecting quotes and parentheses.
pub(crate) fn parse_comma_separated(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(value, ',')
        .into_iter()
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse a keyword column (e.g. `refresh_mode`) into an enum.
pub(crate) fn parse_enum<T: std::str::FromStr>(column: &str, value: Option<String>) -> SnowflakeResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| SnowflakeError::decoding(column, format!("unexpected value {value:?}"))),
    }
}

/// `enum` ⇄ SQL keyword, with case-insensitive parsing.
macro_rules! sql_enum {
    ($(#[$meta: meta])* $name: ident { $($variant: ident => $keyword: literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $keyword),+
                }
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::SnowflakeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().replace(['-', ' '], "_");
                $(
                    if normalized.eq_ignore_ascii_case(&$keyword.replace(['-', ' '], "_")) {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::errors::SnowflakeError::invalid_option(
                    stringify!($name),
                    format!("unknown value {s:?}"),
                ))
            }
        }
    };
}
pub(crate) use sql_enum;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named(AccountObjectIdentifier);

    impl Identified for Named {
        type Id = AccountObjectIdentifier;

        fn id(&self) -> AccountObjectIdentifier {
            self.0.clone()
        }
    }

    #[test]
    fn scope_requires_exactly_one_target() {
        assert!(matches!(
            In::default().validate(),
            Err(SnowflakeError::ScopeRequiredForIn)
        ));
        let both = In {
            account: true,
            database: Some(AccountObjectIdentifier::new("db")),
            schema: None,
        };
        assert!(matches!(both.validate(), Err(SnowflakeError::ScopeRequiredForIn)));
        assert!(In::schema(DatabaseObjectIdentifier::new("db", "schema")).validate().is_ok());
    }

    #[test]
    fn like_requires_a_pattern() {
        assert!(matches!(
            Like::default().validate(),
            Err(SnowflakeError::PatternRequiredForLike)
        ));
    }

    #[test]
    fn show_filters_render() {
        let mut sql = SqlBuilder::new();
        sql.keyword("SHOW FILE FORMATS")
            .nested(None, Some(&Like::new("test")))
            .nested(None, Some(&In::schema(DatabaseObjectIdentifier::new("db", "schema"))));
        starts_with(&mut sql, Some("te"));
        sql.nested(
            None,
            Some(&LimitFrom {
                rows: 10,
                from: Some("a".into()),
            }),
        );
        assert_eq!(
            sql.finish().unwrap(),
            r#"SHOW FILE FORMATS LIKE 'test' IN SCHEMA "db"."schema" STARTS WITH 'te' LIMIT 10 FROM 'a'"#
        );
    }

    #[test]
    fn tags_render_for_create_and_alter() {
        let tag = TagAssociation::new(SchemaObjectIdentifier::new("db1", "schema1", "tag1"), "v1");
        let mut sql = SqlBuilder::new();
        with_tags(&mut sql, std::slice::from_ref(&tag));
        set_tags(&mut sql, std::slice::from_ref(&tag));
        unset_tags(&mut sql, &[tag.name.clone()]);
        assert_eq!(
            sql.finish().unwrap(),
            r#"TAG ("db1"."schema1"."tag1" = 'v1') SET TAG "db1"."schema1"."tag1" = 'v1' UNSET TAG "db1"."schema1"."tag1""#
        );
    }

    #[test]
    fn find_by_id_requires_an_exact_match() {
        let rows = vec![
            Named(AccountObjectIdentifier::new("DB_1")),
            Named(AccountObjectIdentifier::new("db_1")),
        ];
        let found = find_by_id(rows, &AccountObjectIdentifier::new("db_1")).unwrap();
        assert_eq!(found.0.name(), "db_1");

        let err = find_by_id(Vec::<Named>::new(), &AccountObjectIdentifier::new("x")).unwrap_err();
        assert!(err.is_not_found());
        let err = find_by_id(
            vec![Named(AccountObjectIdentifier::new("DBX1"))],
            &AccountObjectIdentifier::new("DB_1"),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn structured_columns_parse() {
        assert_eq!(parse_bracketed_list(r#"["ALL"]"#), vec!["ALL"]);
        assert_eq!(parse_bracketed_list("[]"), Vec::<String>::new());
        assert_eq!(
            parse_comma_separated(r#""db"."sc"."t1", DB.SC.T2"#),
            vec![r#""db"."sc"."t1""#, "DB.SC.T2"]
        );
    }

    sql_enum!(Shade {
        Light => "X-SMALL",
        Dark => "SNOWPARK-OPTIMIZED",
    });

    #[test]
    fn enums_parse_loosely() {
        assert_eq!("x-small".parse::<Shade>().unwrap(), Shade::Light);
        assert_eq!("X_SMALL".parse::<Shade>().unwrap(), Shade::Light);
        assert_eq!("Snowpark-Optimized".parse::<Shade>().unwrap(), Shade::Dark);
        assert!("big".parse::<Shade>().is_err());
    }
}
