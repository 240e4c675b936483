use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, EntityKind};
use crate::error::LaneError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub feature_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub agent_role: AgentRole,
    pub session_id: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        feature_id: impl Into<String>,
        title: impl Into<String>,
        agent_role: AgentRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(EntityKind::Task),
            feature_id: feature_id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::Pending,
            agent_role,
            session_id: None,
            output: None,
            error: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Move the task into `Running`. started_at is stamped on the first
    /// entry only; repeated calls leave the original stamp intact.
    pub fn mark_running(&mut self) {
        self.status = TaskStatus::Running;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self, output: impl Into<String>) {
        self.output = Some(output.into());
        self.enter_terminal(TaskStatus::Completed);
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.enter_terminal(TaskStatus::Failed);
    }

    pub fn mark_cancelled(&mut self) {
        self.enter_terminal(TaskStatus::Cancelled);
    }

    /// completed_at is stamped on the first entry into any terminal state
    /// and never overwritten afterwards.
    fn enter_terminal(&mut self, status: TaskStatus) {
        self.status = status;
        if self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => Self::Queued,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Pm,
    Architect,
    Frontend,
    Backend,
    Qa,
    Devops,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pm => "pm",
            Self::Architect => "architect",
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Qa => "qa",
            Self::Devops => "devops",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pm" => Some(Self::Pm),
            "architect" => Some(Self::Architect),
            "frontend" => Some(Self::Frontend),
            "backend" => Some(Self::Backend),
            "qa" => Some(Self::Qa),
            "devops" => Some(Self::Devops),
            _ => None,
        }
    }

    /// Roles the PM agent can delegate to.
    pub fn specialists() -> [Self; 5] {
        [
            Self::Architect,
            Self::Frontend,
            Self::Backend,
            Self::Qa,
            Self::Devops,
        ]
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = LaneError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(&s.to_lowercase()).ok_or_else(|| LaneError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_defaults() {
        let task = Task::new("feat_abc", "Implement API endpoints", AgentRole::Backend);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());
        assert!(task.id.starts_with("task_"));
    }

    #[test]
    fn test_started_at_stamped_once() {
        let mut task = Task::new("feat_abc", "Build UI components", AgentRole::Frontend);

        task.mark_running();
        let first = task.started_at.expect("started_at set on first run");

        task.mark_running();
        assert_eq!(task.started_at, Some(first));
    }

    #[test]
    fn test_completed_at_stamped_once_across_terminal_states() {
        let mut task = Task::new("feat_abc", "Run test suite", AgentRole::Qa);

        task.mark_running();
        task.mark_failed("flaky network");
        let first = task.completed_at.expect("completed_at set on failure");
        assert_eq!(task.status, TaskStatus::Failed);

        // A later overwrite to completed must not re-stamp.
        task.mark_completed("all green");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(first));
    }

    #[test]
    fn test_failed_records_error() {
        let mut task = Task::new("feat_abc", "Deploy", AgentRole::Devops);
        task.mark_running();
        task.mark_failed("boom");
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_status_predicates() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(TaskStatus::Running.is_active());
        assert!(!TaskStatus::Pending.is_active());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(AgentRole::parse("qa"), Some(AgentRole::Qa));
        assert_eq!(AgentRole::parse("intern"), None);
        assert!("Architect".parse::<AgentRole>().is_ok());
    }
}
