//! Renders option records into a single SQL statement.
//!
//! Option records call the builder once per field, in field declaration order, so
//! the emitted clause order is exactly the declaration order. The builder only
//! quotes values; it never interprets or reorders them.
use std::fmt::Display;

use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::identifiers::ObjectIdentifier;

/// How a parameter value is quoted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quotes {
    None,
    Single,
    Double,
}

/// Whether a parameter is written as `NAME = value` or `NAME value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assignment {
    Equals,
    NoEquals,
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote(value: &str, quotes: Quotes) -> String {
    match quotes {
        Quotes::None => value.to_owned(),
        Quotes::Single => quote_string(value),
        Quotes::Double => format!("\"{}\"", value.replace('"', "\"\"")),
    }
}

/// A group of clauses rendered inside a parent statement (`SET ...`, `UNSET ...`, ...).
pub trait Clause {
    fn render(&self, sql: &mut SqlBuilder);
}

/// A full statement: validated, then rendered against its target identifier.
pub trait SqlStatement {
    /// What the statement acts on; `()` for statements without an identifier.
    type Target: ?Sized;

    fn validate(&self, target: &Self::Target) -> SnowflakeResult<()>;

    fn render(&self, target: &Self::Target, sql: &mut SqlBuilder);

    /// Validate and render. No SQL is produced when validation fails.
    fn to_sql(&self, target: &Self::Target) -> SnowflakeResult<String> {
        self.validate(target)?;
        let mut sql = SqlBuilder::new();
        self.render(target, &mut sql);
        sql.finish()
    }
}

#[derive(Debug, Default)]
pub struct SqlBuilder {
    clauses: Vec<String>,
    error: Option<SnowflakeError>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, clause: String) -> &mut Self {
        if !clause.is_empty() {
            self.clauses.push(clause);
        }
        self
    }

    /// Record a failure; only the first one is reported by [`SqlBuilder::finish`].
    pub fn fail(&mut self, error: SnowflakeError) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    /// A keyword that is always emitted.
    pub fn keyword(&mut self, keyword: &str) -> &mut Self {
        self.push(keyword.to_owned())
    }

    /// A keyword emitted only when the flag is set.
    pub fn keyword_if(&mut self, set: bool, keyword: &str) -> &mut Self {
        if set {
            self.keyword(keyword);
        }
        self
    }

    /// A keyword emitted when an optional value is present, whatever the value.
    pub fn keyword_some<T>(&mut self, value: Option<T>, keyword: &str) -> &mut Self {
        self.keyword_if(value.is_some(), keyword)
    }

    /// Verbatim SQL, e.g. a query or a policy body.
    pub fn raw(&mut self, fragment: &str) -> &mut Self {
        self.push(fragment.to_owned())
    }

    pub fn raw_opt(&mut self, fragment: Option<&str>) -> &mut Self {
        if let Some(fragment) = fragment {
            self.raw(fragment);
        }
        self
    }

    pub fn identifier<I: ObjectIdentifier + ?Sized>(&mut self, id: &I) -> &mut Self {
        self.push(id.fully_qualified_name())
    }

    pub fn identifier_opt<I: ObjectIdentifier>(&mut self, id: Option<&I>) -> &mut Self {
        if let Some(id) = id {
            self.identifier(id);
        }
        self
    }

    /// `NAME = "db"."schema"."object"`
    pub fn identifier_equals<I: ObjectIdentifier>(&mut self, name: &str, id: Option<&I>) -> &mut Self {
        if let Some(id) = id {
            self.push(format!("{name} = {}", id.fully_qualified_name()));
        }
        self
    }

    /// `KEYWORD "db"."schema"."object"`, e.g. `RENAME TO` or `SWAP WITH`.
    pub fn identifier_after<I: ObjectIdentifier>(&mut self, keyword: &str, id: Option<&I>) -> &mut Self {
        if let Some(id) = id {
            self.push(format!("{keyword} {}", id.fully_qualified_name()));
        }
        self
    }

    pub fn parameter<V: Display>(
        &mut self,
        name: &str,
        value: Option<V>,
        quotes: Quotes,
        assignment: Assignment,
    ) -> &mut Self {
        if let Some(value) = value {
            let value = quote(&value.to_string(), quotes);
            match assignment {
                Assignment::Equals => self.push(format!("{name} = {value}")),
                Assignment::NoEquals => self.push(format!("{name} {value}")),
            };
        }
        self
    }

    /// `NAME = 'value'`
    pub fn text(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        self.parameter(name, value, Quotes::Single, Assignment::Equals)
    }

    /// `NAME = value`
    pub fn number<V: Display>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        self.parameter(name, value, Quotes::None, Assignment::Equals)
    }

    /// `NAME = true`
    pub fn boolean(&mut self, name: &str, value: Option<bool>) -> &mut Self {
        self.parameter(name, value, Quotes::None, Assignment::Equals)
    }

    /// `NAME = VALUE` for enumerated values.
    pub fn enumeration<V: AsRef<str>>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        let value: Option<&str> = value.as_ref().map(|v| v.as_ref());
        self.parameter(name, value, Quotes::None, Assignment::Equals)
    }

    /// `NAME = ('a', 'b')`; an empty list renders `NAME = ()`.
    pub fn list<V: Display>(
        &mut self,
        name: &str,
        items: Option<&[V]>,
        quotes: Quotes,
        assignment: Assignment,
    ) -> &mut Self {
        if let Some(items) = items {
            let rendered = items
                .iter()
                .map(|item| quote(&item.to_string(), quotes))
                .collect::<Vec<_>>()
                .join(", ");
            match assignment {
                Assignment::Equals => self.push(format!("{name} = ({rendered})")),
                Assignment::NoEquals => self.push(format!("{name} ({rendered})")),
            };
        }
        self
    }

    /// `PREFIX "a", "b"` without parentheses, as used by `ENABLE REPLICATION TO ACCOUNTS`.
    pub fn identifier_list<I: ObjectIdentifier>(&mut self, prefix: &str, ids: Option<&[I]>) -> &mut Self {
        if let Some(ids) = ids {
            let rendered = ids
                .iter()
                .map(ObjectIdentifier::fully_qualified_name)
                .collect::<Vec<_>>()
                .join(", ");
            self.push(format!("{prefix} {rendered}"));
        }
        self
    }

    /// `KEYWORD A, B, C`, as used by `UNSET`.
    pub fn comma_separated(&mut self, keyword: &str, names: &[&str]) -> &mut Self {
        if !names.is_empty() {
            self.push(format!("{keyword} {}", names.join(", ")));
        }
        self
    }

    /// A nested clause group following an optional prefix keyword.
    pub fn nested<C: Clause>(&mut self, prefix: Option<&str>, clause: Option<&C>) -> &mut Self {
        if let Some(clause) = clause {
            if let Some(prefix) = prefix {
                self.keyword(prefix);
            }
            clause.render(self);
        }
        self
    }

    /// A nested clause group rendered inside parentheses: `PREFIX (...)`.
    pub fn parenthesized<C: Clause>(&mut self, prefix: Option<&str>, clause: Option<&C>) -> &mut Self {
        if let Some(clause) = clause {
            let mut inner = SqlBuilder::new();
            clause.render(&mut inner);
            if let Some(error) = inner.error.take() {
                self.fail(error);
            }
            let body = format!("({})", inner.clauses.join(" "));
            match prefix {
                Some(prefix) => self.push(format!("{prefix} {body}")),
                None => self.push(body),
            };
        }
        self
    }

    /// Report a missing required value, naming the field, instead of emitting broken SQL.
    pub fn required<'a, T: ?Sized>(&mut self, field: &'static str, value: Option<&'a T>) -> Option<&'a T> {
        if value.is_none() {
            self.fail(SnowflakeError::invalid_option(field, "a value is required"));
        }
        value
    }

    /// Like [`SqlBuilder::required`] for strings that must also be non-empty.
    pub fn required_text<'a>(&mut self, field: &'static str, value: &'a str) -> Option<&'a str> {
        if value.trim().is_empty() {
            self.fail(SnowflakeError::invalid_option(field, "a value is required"));
            return None;
        }
        Some(value)
    }

    pub fn finish(self) -> SnowflakeResult<String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.clauses.join(" ")),
        }
    }
}
