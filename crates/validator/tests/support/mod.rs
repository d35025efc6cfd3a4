//! An in-memory session factory that answers queries from a script and
//! records what the validator did with it.

#![allow(dead_code)]

use async_trait::async_trait;
use core_types::Row;
use database::{DbError, QueryExecutor, SessionFactory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;

#[derive(Debug, Clone)]
pub enum Reply {
    Rows(Vec<Row>),
    Error(&'static str),
    Hang,
}

#[derive(Debug, Default)]
pub struct Journal {
    pub opened: usize,
    pub queries: Vec<String>,
    pub commits: usize,
    pub rollbacks: usize,
}

#[derive(Default)]
pub struct ScriptedDatabase {
    replies: Arc<HashMap<String, Reply>>,
    journal: Arc<Mutex<Journal>>,
    refuse_connections: bool,
}

impl ScriptedDatabase {
    pub fn new(replies: impl IntoIterator<Item = (String, Reply)>) -> Self {
        Self {
            replies: Arc::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse_connections: true,
            ..Self::default()
        }
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }
}

pub fn driver_error(message: &str) -> DbError {
    DbError::ConnectionError(sqlx::Error::Protocol(message.to_string()))
}

#[async_trait]
impl SessionFactory for ScriptedDatabase {
    async fn open(&self) -> Result<Box<dyn QueryExecutor>, DbError> {
        if self.refuse_connections {
            return Err(driver_error("connection refused"));
        }
        self.journal.lock().unwrap().opened += 1;
        Ok(Box::new(ScriptedSession {
            replies: Arc::clone(&self.replies),
            journal: Arc::clone(&self.journal),
        }))
    }
}

struct ScriptedSession {
    replies: Arc<HashMap<String, Reply>>,
    journal: Arc<Mutex<Journal>>,
}

#[async_trait]
impl QueryExecutor for ScriptedSession {
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.journal.lock().unwrap().queries.push(sql.to_string());
        match self.replies.get(sql).cloned().unwrap_or(Reply::Rows(Vec::new())) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Error(message) => Err(driver_error(message)),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.journal.lock().unwrap().commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DbError> {
        self.journal.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}

/// Collects formatted log lines written while it is installed.
#[derive(Clone, Default)]
pub struct LogCapture {
    logs: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    /// Installs a capturing subscriber for the current thread.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn text(&self) -> String {
        self.logs.lock().unwrap().concat()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(buf).to_string());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
