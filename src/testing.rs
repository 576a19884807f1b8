//! An in-memory [`Executor`] that records statements and replays canned rows.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::query::{log_statement, ExecResult, Executor, Rows};

#[derive(Default)]
pub(crate) struct RecordingExecutor {
    statements: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<SnowflakeResult<Rows>>>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next `query`.
    pub(crate) fn respond(self, rows: Rows) -> Self {
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub(crate) fn fail_with(self, error: SnowflakeError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> String {
        self.statements().last().cloned().unwrap_or_default()
    }

    fn record(&self, function: &str, sql: &str) -> SnowflakeResult<()> {
        log_statement(function, sql)?;
        self.statements.lock().unwrap().push(sql.to_owned());
        Ok(())
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn exec(&self, sql: &str) -> SnowflakeResult<ExecResult> {
        self.record("exec", sql)?;
        Ok(ExecResult::default())
    }

    async fn query(&self, sql: &str) -> SnowflakeResult<Rows> {
        self.record("query", sql)?;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Rows::default()))
    }
}
