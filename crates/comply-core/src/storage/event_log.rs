//! Generic relational log stub. Rows are counted and persisted; the event
//! text itself goes to the structured log.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::EventLog;

const LOG_FILE: &str = "event_log.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogState {
    rows: usize,
}

pub struct LocalEventLog {
    path: PathBuf,
    state: RwLock<LogState>,
}

impl LocalEventLog {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(LOG_FILE),
            state: RwLock::new(LogState::default()),
        }
    }

    fn persist(&self, state: &LogState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl EventLog for LocalEventLog {
    async fn open(&self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            let state: LogState =
                serde_json::from_str(&content).context("Failed to parse event log state")?;
            *self.state.write() = state;
        }
        Ok(())
    }

    async fn append(&self, event: &str) -> Result<()> {
        let mut state = self.state.write();
        state.rows += 1;
        self.persist(&state)?;
        tracing::info!(row = state.rows, event = %event, "event row inserted");
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.state.read().rows
    }

    async fn close(&self) -> Result<()> {
        let state = self.state.read();
        self.persist(&state)
    }
}
