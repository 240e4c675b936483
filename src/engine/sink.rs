use async_trait::async_trait;
use tracing::info;

use crate::agent::Artifact;
use crate::error::Result;

/// Outbound destination for generated artifacts. Implementations own
/// durable placement; the engine only relays.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn store(&self, project_id: &str, feature_id: &str, artifact: &Artifact) -> Result<()>;
}

/// Reference sink: records the artifact in the log and nothing else.
/// Real file placement belongs to an outer layer.
pub struct LogSink;

#[async_trait]
impl ArtifactSink for LogSink {
    async fn store(&self, project_id: &str, feature_id: &str, artifact: &Artifact) -> Result<()> {
        info!(
            project_id,
            feature_id,
            artifact_type = %artifact.artifact_type,
            path = %artifact.path.display(),
            bytes = artifact.content.len(),
            "Storing artifact"
        );
        Ok(())
    }
}
