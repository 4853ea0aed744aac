//! Discovered agent registry
//!
//! The hub's GET_AGENT_LIST reply is decoded into an [`AgentList`] and
//! persisted as JSON so later invocations can address an agent by its
//! 1-based position without re-running discovery.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::protocol::AgentUuid;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to access agent list file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse agent list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No agent at index {index}; list has {count} entries (1-based)")]
    NoSuchAgent { index: usize, count: usize },

    #[error("Agent list is empty; run discovery first")]
    EmptyList,
}

pub type AgentResult<T> = Result<T, AgentError>;

/// One discovered agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_uuid: AgentUuid,
}

/// Ordered list of agents as returned by the hub
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentList {
    pub agent_uuid_list: Vec<AgentRecord>,
}

impl AgentList {
    pub fn new(uuids: Vec<AgentUuid>) -> Self {
        Self {
            agent_uuid_list: uuids
                .into_iter()
                .map(|agent_uuid| AgentRecord { agent_uuid })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.agent_uuid_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agent_uuid_list.is_empty()
    }

    /// Look up an agent by its 1-based position.
    pub fn get(&self, index: usize) -> AgentResult<&AgentUuid> {
        if self.agent_uuid_list.is_empty() {
            return Err(AgentError::EmptyList);
        }
        self.agent_uuid_list
            .get(index.wrapping_sub(1))
            .map(|r| &r.agent_uuid)
            .ok_or(AgentError::NoSuchAgent {
                index,
                count: self.agent_uuid_list.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentUuid> {
        self.agent_uuid_list.iter().map(|r| &r.agent_uuid)
    }
}

/// On-disk persistence for the discovered agent list
#[derive(Debug, Clone)]
pub struct AgentStore {
    path: PathBuf,
}

impl AgentStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted list; a missing file is an empty list.
    pub fn load(&self) -> AgentResult<AgentList> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No agent list file, starting empty");
            return Ok(AgentList::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let list: AgentList = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), count = list.len(), "Loaded agent list");
        Ok(list)
    }

    /// Overwrite the persisted list with a fresh discovery result.
    pub fn save(&self, list: &AgentList) -> AgentResult<()> {
        let contents = serde_json::to_string_pretty(list)?;
        std::fs::write(&self.path, contents)?;
        info!(path = %self.path.display(), count = list.len(), "Saved agent list");
        Ok(())
    }
}
