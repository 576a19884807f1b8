use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum SnowflakeError {
    #[error(transparent)]
    Token(#[from] jwt_simple::Error),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Snowflake server error: {code}: {message}")]
    ServerError { code: String, message: String },
    #[error(transparent)]
    JSONError(#[from] serde_json::Error),
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(&'static str),
    #[error("Response contains multiple partitions")]
    MultiplePartitions,
    #[error(transparent)]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("object does not exist")]
    ObjectNotFound,
    #[error("invalid object identifier: {0}")]
    InvalidObjectIdentifier(String),
    #[error("options cannot be nil")]
    NilOptions,
    #[error("pattern must be specified for like clause")]
    PatternRequiredForLike,
    #[error("exactly one scope must be specified for in clause")]
    ScopeRequiredForIn,
    #[error("invalid value for {field}: {reason}")]
    InvalidOption { field: &'static str, reason: String },
    #[error("exactly one of {} must be set", FieldList(.fields))]
    ExactlyOneOf { fields: Vec<&'static str> },
    #[error("at least one of {} must be set", FieldList(.fields))]
    AtLeastOneOf { fields: Vec<&'static str> },
    #[error("fields {} are incompatible and cannot be set at the same time", FieldList(.fields))]
    MoreThanOneOf { fields: Vec<&'static str> },
    #[error("fields {} must be set together", FieldList(.fields))]
    RequiredTogether { fields: Vec<&'static str> },
    #[error("{0}")]
    InvalidTargetLag(&'static str),
    #[error("invalid data type: {0}")]
    InvalidDataType(String),
    #[error("could not decode column {column}: {message}")]
    Decoding { column: String, message: String },
    #[error("sql statement cannot be empty")]
    EmptySql,

    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    ConfigFile(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{}", ErrorList(.0))]
    Multiple(Vec<SnowflakeError>),
}

/// Server error code for "does not exist or not authorized".
pub(crate) const OBJECT_DOES_NOT_EXIST: &str = "002003";

impl SnowflakeError {
    /// Whether this is (or, for joined errors, contains) [`SnowflakeError::ObjectNotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            SnowflakeError::ObjectNotFound => true,
            SnowflakeError::ServerError { code, .. } => code == OBJECT_DOES_NOT_EXIST,
            SnowflakeError::Multiple(errors) => errors.iter().any(|e| e.is_not_found()),
            _ => false,
        }
    }

    pub(crate) fn decoding(column: impl Into<String>, message: impl fmt::Display) -> Self {
        SnowflakeError::Decoding {
            column: column.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_option(field: &'static str, reason: impl Into<String>) -> Self {
        SnowflakeError::InvalidOption {
            field,
            reason: reason.into(),
        }
    }
}

pub type SnowflakeResult<T> = Result<T, SnowflakeError>;

struct FieldList<'a>(&'a [&'static str]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

struct ErrorList<'a>(&'a [SnowflakeError]);

impl fmt::Display for ErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Debug)]
#[serde(untagged)]
pub enum SnowflakeWireResult<T> {
    Ok(T),
    Error { code: String, message: String },
}

impl<T> SnowflakeWireResult<T> {
    /// Convert from the custom wire format to a standard result
    pub fn into_result(self) -> SnowflakeResult<T> {
        match self {
            SnowflakeWireResult::Error { code, message } => {
                Err(SnowflakeError::ServerError { code, message })
            }
            SnowflakeWireResult::Ok(t) => Ok(t),
        }
    }
}
