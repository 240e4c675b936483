use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Message, MessageRole};

/// Resolved surroundings of an agent invocation: the session's owning chain
/// plus the conversation so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub project_id: String,
    pub project_path: PathBuf,
    pub feature_id: String,
    pub session_id: String,
    pub history: Vec<ChatTurn>,
}

impl AgentContext {
    pub fn new(
        project_id: impl Into<String>,
        project_path: impl Into<PathBuf>,
        feature_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            project_path: project_path.into(),
            feature_id: feature_id.into(),
            session_id: session_id.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

/// One prior conversation entry, detached from its stored row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}
