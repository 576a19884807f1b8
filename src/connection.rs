//! A session against the Snowflake SQL REST API.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Authenticator, ClientConfig};
use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::jwt::{self, RS256KeyPair};
use crate::query::{log_statement, ExecResult, Executor, Rows};
use crate::statement::Statement;

/// Server-side statement timeout when none is configured.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 300;

enum Credentials {
    KeyPair {
        key_pair: RS256KeyPair,
        account: String,
        user: String,
        lifetime_secs: Option<u64>,
    },
    Token {
        token: String,
        token_type: &'static str,
    },
}

/// Session defaults sent with every statement.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub parameters: HashMap<String, String>,
    pub timeout: u64,
}

/// An open connection. Cloning is cheap and clones share the HTTP pool.
#[derive(Clone)]
pub struct Connection {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<Credentials>,
    session: Arc<Session>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn required<'a>(value: &'a Option<String>, what: &str) -> SnowflakeResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| SnowflakeError::Config(format!("{what} is required")))
}

impl Connection {
    /// Validate the configuration and prepare an HTTP client.
    ///
    /// No request is made until the first statement.
    pub fn open(config: &ClientConfig) -> SnowflakeResult<Connection> {
        let credentials = match config.effective_authenticator() {
            Authenticator::SnowflakeJwt => Credentials::KeyPair {
                key_pair: jwt::load_private_key(
                    required(&config.private_key, "a private key")?,
                    config.private_key_passphrase.as_deref(),
                )?,
                account: config.account_locator()?,
                user: required(&config.user, "a user")?.to_owned(),
                lifetime_secs: config.jwt_expire_timeout,
            },
            Authenticator::OAuth => Credentials::Token {
                token: required(&config.token, "an OAuth token")?.to_owned(),
                token_type: "OAUTH",
            },
            Authenticator::ProgrammaticAccessToken => Credentials::Token {
                token: required(&config.token, "a programmatic access token")?.to_owned(),
                token_type: "PROGRAMMATIC_ACCESS_TOKEN",
            },
            Authenticator::Snowflake
            | Authenticator::ExternalBrowser
            | Authenticator::Okta
            | Authenticator::UsernamePasswordMfa => {
                return Err(SnowflakeError::UnsupportedFeature(
                    "authenticators other than key pair (SNOWFLAKE_JWT), OAUTH or programmatic access tokens",
                ))
            }
        };
        let timeout = config.client_timeout.unwrap_or(DEFAULT_STATEMENT_TIMEOUT_SECS);
        let http = Self::http_client(config, timeout)?;
        let base_url = config.base_url()?;
        log::debug!("opening connection to {base_url}");
        Ok(Connection {
            base_url,
            http,
            credentials: Arc::new(credentials),
            session: Arc::new(Session {
                database: config.database.clone(),
                schema: config.schema.clone(),
                warehouse: config.warehouse.clone(),
                role: config.role.clone(),
                parameters: config.params.clone(),
                timeout,
            }),
        })
    }

    fn http_client(config: &ClientConfig, timeout: u64) -> SnowflakeResult<reqwest::Client> {
        use reqwest::header::*;

        let mut headers = HeaderMap::with_capacity(3);
        headers.append(CONTENT_TYPE, "application/json".parse()?);
        headers.append(ACCEPT, "application/json".parse()?);
        headers.append(
            USER_AGENT,
            concat!(env!("CARGO_PKG_NAME"), '/', env!("CARGO_PKG_VERSION")).parse()?,
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(
                config
                    .request_timeout()
                    .unwrap_or(Duration::from_secs(timeout + 15)),
            )
            .danger_accept_invalid_certs(config.insecure_mode.unwrap_or(false));
        if let Some(login_timeout) = config.login_timeout() {
            builder = builder.connect_timeout(login_timeout);
        }
        Ok(builder.build()?)
    }

    pub fn prepare(&self, sql: &str) -> Statement<'_> {
        Statement::new(sql, self)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// The bearer token and its `X-Snowflake-Authorization-Token-Type`.
    pub(crate) fn authorization(&self) -> SnowflakeResult<(String, &'static str)> {
        match self.credentials.as_ref() {
            Credentials::KeyPair {
                key_pair,
                account,
                user,
                lifetime_secs,
            } => Ok((
                jwt::create_token(key_pair, account, user, *lifetime_secs)?,
                "KEYPAIR_JWT",
            )),
            Credentials::Token { token, token_type } => Ok((token.clone(), *token_type)),
        }
    }
}

#[async_trait]
impl Executor for Connection {
    async fn exec(&self, sql: &str) -> SnowflakeResult<ExecResult> {
        log_statement("exec", sql)?;
        self.prepare(sql).exec().await
    }

    async fn query(&self, sql: &str) -> SnowflakeResult<Rows> {
        log_statement("query", sql)?;
        let response = self.prepare(sql).query().await?;
        response.concat_partitions().await?.into_rows()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config_for(server: &MockServer) -> ClientConfig {
        let address = server.address();
        ClientConfig {
            host: Some(address.ip().to_string()),
            port: Some(address.port()),
            protocol: Some("http".into()),
            token: Some("oauth-token".into()),
            warehouse: Some("WH".into()),
            params: HashMap::from([("QUERY_TAG".to_owned(), "sdk".to_owned())]),
            ..ClientConfig::default()
        }
    }

    fn text_columns(names: &[&str]) -> serde_json::Value {
        names
            .iter()
            .map(|name| json!({"name": name, "type": "text", "nullable": true}))
            .collect()
    }

    #[tokio::test]
    async fn query_concatenates_partitions() -> SnowflakeResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/statements"))
            .and(header("Authorization", "Bearer oauth-token"))
            .and(header("X-Snowflake-Authorization-Token-Type", "OAUTH"))
            .and(body_partial_json(json!({
                "statement": "SHOW DATABASES",
                "warehouse": "WH",
                "parameters": {"QUERY_TAG": "sdk"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultSetMetaData": {
                    "numRows": 2,
                    "rowType": text_columns(&["name", "comment"]),
                    "partitionInfo": [{}, {}],
                },
                "data": [["DB1", null]],
                "statementStatusUrl": "/api/v2/statements/handle-1",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/statements/handle-1"))
            .and(query_param("partition", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [["DB2", "second"]],
            })))
            .mount(&server)
            .await;

        let connection = Connection::open(&config_for(&server))?;
        let rows = connection.query("SHOW DATABASES").await?;
        assert_eq!(rows.len(), 2);
        let names: Vec<Option<String>> = rows.iter().map(|r| r.get("name").unwrap()).collect();
        assert_eq!(names, vec![Some("DB1".into()), Some("DB2".into())]);
        Ok(())
    }

    #[tokio::test]
    async fn exec_reports_the_status_message() -> SnowflakeResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/statements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Statement executed successfully.",
                "resultSetMetaData": {"numRows": 1, "rowType": text_columns(&["status"])},
                "data": [["Database DB1 successfully created."]],
                "statementStatusUrl": "/api/v2/statements/handle-2",
            })))
            .mount(&server)
            .await;

        let connection = Connection::open(&config_for(&server))?;
        let result = connection.exec("CREATE DATABASE DB1").await?;
        assert_eq!(result.message, "Database DB1 successfully created.");
        assert_eq!(result.rows_affected, 0);
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_are_surfaced() -> SnowflakeResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/statements"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": "002003",
                "message": "SQL compilation error:\nDatabase 'NOPE' does not exist or not authorized.",
                "sqlState": "02000",
            })))
            .mount(&server)
            .await;

        let connection = Connection::open(&config_for(&server))?;
        let err = connection.query("DESCRIBE DATABASE NOPE").await.unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn empty_statements_never_reach_the_server() -> SnowflakeResult<()> {
        let server = MockServer::start().await;
        let connection = Connection::open(&config_for(&server))?;
        assert!(matches!(connection.exec("   ").await, Err(SnowflakeError::EmptySql)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
        Ok(())
    }

    #[test]
    fn password_authentication_is_unsupported() {
        let config = ClientConfig {
            account: Some("ab12345".into()),
            user: Some("ALICE".into()),
            password: Some("secret".into()),
            ..ClientConfig::default()
        };
        assert!(matches!(
            Connection::open(&config),
            Err(SnowflakeError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn key_pair_sessions_sign_tokens() -> SnowflakeResult<()> {
        let key_pair = RS256KeyPair::generate(2048)?;
        let config = ClientConfig {
            account: Some("ab12345.us-east-1".into()),
            user: Some("alice".into()),
            private_key: Some(key_pair.to_pem()?),
            ..ClientConfig::default()
        };
        let connection = Connection::open(&config)?;
        assert_eq!(connection.base_url(), "https://ab12345.us-east-1.snowflakecomputing.com");
        let (_, token_type) = connection.authorization()?;
        assert_eq!(token_type, "KEYPAIR_JWT");
        Ok(())
    }
}
