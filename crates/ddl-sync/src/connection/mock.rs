//! Scripted in-memory driver for tests.

use super::Driver;
use crate::config::ConnectionConfig;
use crate::core::{RawRow, RawValue};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&str) -> Result<Vec<RawRow>> + Send + Sync;

/// Record of everything a [`MockDriver`] was asked to do.
#[derive(Clone, Default)]
pub struct MockLog {
    inner: Arc<Mutex<MockLogInner>>,
}

#[derive(Default)]
struct MockLogInner {
    statements: Vec<String>,
    opens: usize,
}

impl MockLog {
    /// Every executed statement, in order.
    pub fn statements(&self) -> Vec<String> {
        self.inner.lock().unwrap().statements.clone()
    }

    /// Number of successful opens.
    pub fn opens(&self) -> usize {
        self.inner.lock().unwrap().opens
    }
}

/// Driver answering every statement through a closure.
pub struct MockDriver {
    responder: Box<Responder>,
    log: MockLog,
    open: bool,
}

impl MockDriver {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<RawRow>> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            log: MockLog::default(),
            open: false,
        }
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn open(&mut self, _params: &ConnectionConfig) -> Result<()> {
        self.open = true;
        self.log.inner.lock().unwrap().opens += 1;
        Ok(())
    }

    async fn exec(&mut self, sql: &str) -> Result<Vec<RawRow>> {
        self.log.inner.lock().unwrap().statements.push(sql.to_string());
        (self.responder)(sql)
    }

    async fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Row of text columns.
pub fn text_row(columns: &[(&str, &str)]) -> RawRow {
    columns
        .iter()
        .map(|(name, value)| (name.to_string(), RawValue::Text(value.to_string())))
        .collect()
}
