//! Database session management.
//!
//! [`ConnectionManager`] owns exactly one session of a [`Driver`]. It
//! serializes commands (a second command while one is running fails with
//! [`SyncError::Busy`]), reopens the session lazily with the last open
//! parameters, retries commands that failed because the session was lost,
//! and materializes large objects in every result row.

#[cfg(test)]
pub(crate) mod mock;
mod odbc;

pub use odbc::OdbcDriver;

use crate::config::ConnectionConfig;
use crate::core::{materialize_rows, RawRow, Row};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Minimal contract of a database driver.
#[async_trait]
pub trait Driver: Send {
    /// Open a session.
    async fn open(&mut self, params: &ConnectionConfig) -> Result<()>;

    /// Execute one statement and return every row it produced.
    async fn exec(&mut self, sql: &str) -> Result<Vec<RawRow>>;

    /// Drop the session. Never fails.
    async fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Reconnect-and-retry policy for lost sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt.
    pub max_retries: u32,

    /// Delay before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

struct Session<D> {
    driver: D,
    params: Option<ConnectionConfig>,
    init_script: Option<String>,
}

impl<D: Driver> Session<D> {
    async fn ensure_open(&mut self) -> Result<()> {
        if self.driver.is_open() {
            return Ok(());
        }
        let params = self.params.clone().ok_or(SyncError::NotOpened)?;
        self.connect(&params).await
    }

    async fn connect(&mut self, params: &ConnectionConfig) -> Result<()> {
        self.driver.open(params).await?;
        if let Some(script) = &self.init_script {
            debug!("running session init script");
            if let Err(e) = self.driver.exec(script).await {
                self.driver.close().await;
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Owner of the single database session.
pub struct ConnectionManager<D: Driver> {
    session: Mutex<Session<D>>,
    retry: RetryPolicy,
}

impl<D: Driver> ConnectionManager<D> {
    pub fn new(driver: D) -> Self {
        Self::with_retry(driver, RetryPolicy::default())
    }

    pub fn with_retry(driver: D, retry: RetryPolicy) -> Self {
        Self {
            session: Mutex::new(Session {
                driver,
                params: None,
                init_script: None,
            }),
            retry,
        }
    }

    /// Open the session and run the optional init script once.
    ///
    /// The parameters and script are kept for later reconnects. An init
    /// script failure closes the session and fails the open.
    pub async fn open(&self, params: ConnectionConfig, init_script: Option<String>) -> Result<()> {
        let mut session = self.session.try_lock().map_err(|_| SyncError::Busy)?;
        if session.driver.is_open() {
            session.driver.close().await;
        }
        info!("connecting to {} as {}", params.address(), params.login);
        session.init_script = init_script;
        session.connect(&params).await?;
        session.params = Some(params);
        Ok(())
    }

    /// Execute one statement.
    ///
    /// Opens the session first when needed. A lost session is closed,
    /// reopened after `base_delay * attempt` and the statement retried, up
    /// to `max_retries` times. Any other error is returned at once.
    pub async fn exec(&self, sql: &str) -> Result<Vec<Row>> {
        let mut session = self.session.try_lock().map_err(|_| SyncError::Busy)?;
        debug!(sql, "exec");

        let mut attempt = 0u32;
        loop {
            let result = match session.ensure_open().await {
                Ok(()) => session.driver.exec(sql).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(rows) => return materialize_rows(rows),
                Err(e) if e.is_connection_lost() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.base_delay * attempt;
                    warn!(
                        "connection lost, retry {}/{} in {:?}: {}",
                        attempt, self.retry.max_retries, delay, e
                    );
                    session.driver.close().await;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Close the session. Parameters are kept, so a later `exec` reopens it.
    pub async fn close(&self) -> Result<()> {
        let mut session = self.session.try_lock().map_err(|_| SyncError::Busy)?;
        if session.driver.is_open() {
            session.driver.close().await;
            debug!("connection closed");
        }
        Ok(())
    }
}
