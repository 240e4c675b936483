use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::sink::ArtifactSink;
use crate::agent::{AgentContext, AgentResult, AgentRunner, ChatTurn, NextStep};
use crate::domain::{AgentRole, Message, MessageRole, Task, TaskStatus};
use crate::error::{LaneError, Result};
use crate::store::RecordStore;

/// Read-only view of the work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    pub pending: usize,
    pub draining: bool,
}

/// Orchestrates agent execution against the record store.
///
/// Follow-up steps are persisted as `queued` task rows, so pending work
/// survives a restart; the only in-memory state is the draining flag, which
/// keeps two drains from running at once.
pub struct ExecutionEngine {
    store: Arc<RecordStore>,
    agents: Arc<dyn AgentRunner>,
    sink: Arc<dyn ArtifactSink>,
    draining: AtomicBool,
}

impl ExecutionEngine {
    pub fn new(
        store: Arc<RecordStore>,
        agents: Arc<dyn AgentRunner>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            store,
            agents,
            sink,
            draining: AtomicBool::new(false),
        }
    }

    /// Resolve the session -> feature -> project chain and load the
    /// conversation so far.
    pub fn resolve_context(&self, session_id: &str, feature_id: &str) -> Result<AgentContext> {
        let session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| LaneError::SessionNotFound(session_id.to_string()))?;

        let feature = self
            .store
            .get_feature(feature_id)?
            .ok_or_else(|| LaneError::FeatureNotFound(feature_id.to_string()))?;

        let project = self
            .store
            .get_project(&feature.project_id)?
            .ok_or_else(|| LaneError::ProjectNotFound(feature.project_id.clone()))?;

        let history: Vec<ChatTurn> = self
            .store
            .list_messages(&session.id)?
            .iter()
            .map(ChatTurn::from)
            .collect();

        Ok(AgentContext::new(project.id, project.path, feature.id, session.id)
            .with_history(history))
    }

    /// Run an inbound chat message through the PM agent.
    ///
    /// A missing link in the session/feature/project chain is reported as a
    /// `success: false` result rather than an error, so callers check
    /// `success`. History is loaded before the inbound message is persisted:
    /// first contact classifies against an empty conversation.
    pub async fn execute_user_message(
        &self,
        session_id: &str,
        feature_id: &str,
        message: &str,
    ) -> Result<AgentResult> {
        let context = match self.resolve_context(session_id, feature_id) {
            Ok(context) => context,
            Err(LaneError::SessionNotFound(_)) => {
                return Ok(AgentResult::failure("Session not found"))
            }
            Err(LaneError::FeatureNotFound(_)) => {
                return Ok(AgentResult::failure("Feature not found"))
            }
            Err(LaneError::ProjectNotFound(_)) => {
                return Ok(AgentResult::failure("Project not found"))
            }
            Err(e) => return Err(e),
        };

        let result = self.agents.run(AgentRole::Pm, &context, message).await?;

        self.store
            .insert_message(&Message::new(session_id, MessageRole::User, message))?;
        self.store.insert_message(&Message::new(
            session_id,
            MessageRole::Assistant,
            &result.output,
        ))?;

        for step in &result.next_steps {
            self.enqueue_step(&context, step)?;
        }

        self.relay_artifacts(&context, &result).await;

        Ok(result)
    }

    /// Drain the queue to exhaustion, one step at a time in FIFO order.
    ///
    /// A second call while a drain is in flight returns immediately. A step
    /// whose agent fails is recorded as a failed task; the drain continues
    /// with the next step. Steps may fan out by returning further steps.
    pub async fn process_queue(&self, context: &AgentContext) -> Result<()> {
        if self.store.count_queued_tasks()? == 0 {
            return Ok(());
        }

        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Drain already in progress");
            return Ok(());
        }
        let _guard = DrainGuard::new(&self.draining);

        while let Some(mut task) = self.store.next_queued_task()? {
            task.mark_running();
            self.store.update_task(&task)?;
            info!(task_id = %task.id, role = %task.agent_role, "Step started");

            match self.agents.run(task.agent_role, context, &task.title).await {
                Ok(result) => {
                    if result.success {
                        task.mark_completed(result.output.clone());
                    } else {
                        task.output = Some(result.output.clone());
                        task.mark_failed(
                            result
                                .error
                                .clone()
                                .unwrap_or_else(|| "agent reported failure".to_string()),
                        );
                    }
                    self.store.update_task(&task)?;

                    for step in &result.next_steps {
                        self.enqueue_step(context, step)?;
                    }
                    self.relay_artifacts(context, &result).await;

                    info!(task_id = %task.id, status = %task.status, "Step finished");
                }
                Err(e) => {
                    // Per-step isolation: record the failure, keep draining.
                    task.mark_failed(e.to_string());
                    self.store.update_task(&task)?;
                    warn!(task_id = %task.id, error = %e, "Step failed");
                }
            }
        }

        Ok(())
    }

    pub fn queue_status(&self) -> Result<QueueStatus> {
        Ok(QueueStatus {
            pending: self.store.count_queued_tasks()?,
            draining: self.draining.load(Ordering::SeqCst),
        })
    }

    /// Discard all pending steps. Running and terminal tasks are untouched.
    pub fn clear_queue(&self) -> Result<usize> {
        self.store.cancel_queued_tasks()
    }

    fn enqueue_step(&self, context: &AgentContext, step: &NextStep) -> Result<Task> {
        let task = Task::new(&context.feature_id, &step.task, step.role)
            .with_session(&context.session_id)
            .with_status(TaskStatus::Queued);
        self.store.insert_task(&task)?;
        debug!(
            task_id = %task.id,
            role = %step.role,
            priority = step.priority,
            "Step queued"
        );
        Ok(task)
    }

    /// Sink failures are recoverable: logged, never rolled back into task
    /// state.
    async fn relay_artifacts(&self, context: &AgentContext, result: &AgentResult) {
        for artifact in &result.artifacts {
            if let Err(e) = self
                .sink
                .store(&context.project_id, &context.feature_id, artifact)
                .await
            {
                warn!(
                    path = %artifact.path.display(),
                    error = %e,
                    "Artifact relay failed"
                );
            }
        }
    }
}

/// Clears the draining flag however the drain loop exits.
struct DrainGuard<'a> {
    draining: &'a AtomicBool,
}

impl<'a> DrainGuard<'a> {
    fn new(draining: &'a AtomicBool) -> Self {
        Self { draining }
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.draining.store(false, Ordering::SeqCst);
    }
}
