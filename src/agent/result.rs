//! Result types for agent invocations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::AgentRole;

/// Outcome of a single agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub output: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub next_steps: Vec<NextStep>,
    pub error: Option<String>,
}

impl AgentResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            artifacts: vec![],
            next_steps: vec![],
            error: None,
        }
    }

    /// Non-throwing failure: empty output, callers check `success`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            artifacts: vec![],
            next_steps: vec![],
            error: Some(error.into()),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_next_steps(mut self, next_steps: Vec<NextStep>) -> Self {
        self.next_steps = next_steps;
        self
    }
}

/// Generated text payload destined for durable placement by the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_type: ArtifactType,
    pub path: PathBuf,
    pub content: String,
}

impl Artifact {
    pub fn new(
        artifact_type: ArtifactType,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            artifact_type,
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn prd(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(ArtifactType::Prd, path, content)
    }

    pub fn schema(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(ArtifactType::Schema, path, content)
    }

    pub fn code(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(ArtifactType::Code, path, content)
    }

    pub fn test(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(ArtifactType::Test, path, content)
    }

    pub fn config(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(ArtifactType::Config, path, content)
    }

    pub fn doc(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(ArtifactType::Doc, path, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Prd,
    Schema,
    Code,
    Test,
    Config,
    Doc,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prd => "prd",
            Self::Schema => "schema",
            Self::Code => "code",
            Self::Test => "test",
            Self::Config => "config",
            Self::Doc => "doc",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Queued unit of follow-up work. Priority is informational only; the queue
/// drains in strict FIFO order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextStep {
    pub role: AgentRole,
    pub task: String,
    pub priority: u32,
}

impl NextStep {
    pub fn new(role: AgentRole, task: impl Into<String>, priority: u32) -> Self {
        Self {
            role,
            task: task.into(),
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_builders() {
        let ok = AgentResult::success("Done");
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = AgentResult::failure("Session not found");
        assert!(!failed.success);
        assert_eq!(failed.output, "");
        assert_eq!(failed.error.as_deref(), Some("Session not found"));
    }

    #[test]
    fn test_artifact_constructors() {
        let prd = Artifact::prd(".worklane/prd.md", "# PRD");
        assert_eq!(prd.artifact_type, ArtifactType::Prd);

        let test = Artifact::test("tests/feature_test.rs", "content");
        assert_eq!(test.artifact_type, ArtifactType::Test);
    }
}
