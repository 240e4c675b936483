use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, EntityKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: FeatureStatus,
    pub priority: FeaturePriority,
    pub worktree_path: Option<PathBuf>,
    pub branch_name: Option<String>,
    /// Sort key within the project. Not enforced unique.
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feature {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(EntityKind::Feature),
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            status: FeatureStatus::Backlog,
            priority: FeaturePriority::Medium,
            worktree_path: None,
            branch_name: None,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: FeaturePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    #[default]
    Backlog,
    Ready,
    InProgress,
    Review,
    Done,
    Archived,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ready" => Self::Ready,
            "in_progress" => Self::InProgress,
            "review" => Self::Review,
            "done" => Self::Done,
            "archived" => Self::Archived,
            _ => Self::Backlog,
        }
    }
}

impl std::fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl FeaturePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for FeaturePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FeaturePriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_builders() {
        let feature = Feature::new("proj_abc", "Online booking")
            .with_priority(FeaturePriority::High)
            .with_order(3);

        assert_eq!(feature.project_id, "proj_abc");
        assert_eq!(feature.status, FeatureStatus::Backlog);
        assert_eq!(feature.priority, FeaturePriority::High);
        assert_eq!(feature.order, 3);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            FeatureStatus::Backlog,
            FeatureStatus::Ready,
            FeatureStatus::InProgress,
            FeatureStatus::Review,
            FeatureStatus::Done,
            FeatureStatus::Archived,
        ] {
            assert_eq!(FeatureStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("critical".parse::<FeaturePriority>(), Ok(FeaturePriority::Critical));
        assert!("urgent".parse::<FeaturePriority>().is_err());
    }
}
