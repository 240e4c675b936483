//! Shared fixtures: seeded stores and scripted agent runners.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use worklane::agent::{AgentContext, AgentResult, AgentRoster, AgentRunner, Artifact, NextStep};
use worklane::domain::{AgentRole, Feature, Project, Session};
use worklane::engine::{ArtifactSink, ExecutionEngine};
use worklane::error::{LaneError, Result};
use worklane::{PmAgent, RecordStore};

pub fn seed(store: &RecordStore) -> (Project, Feature, Session) {
    let project = Project::new("Salon booking", "/tmp/salon");
    store.insert_project(&project).unwrap();
    let feature = Feature::new(&project.id, "Online booking");
    store.insert_feature(&feature).unwrap();
    let session = Session::new(&feature.id);
    store.insert_session(&session).unwrap();
    (project, feature, session)
}

pub fn engine_with(
    store: Arc<RecordStore>,
    runner: Arc<dyn AgentRunner>,
) -> (ExecutionEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let engine = ExecutionEngine::new(store, runner, sink.clone());
    (engine, sink)
}

pub fn default_engine(store: Arc<RecordStore>) -> (ExecutionEngine, Arc<RecordingSink>) {
    engine_with(store, Arc::new(AgentRoster::new(PmAgent::new())))
}

/// Sink that keeps every relayed artifact for assertions.
#[derive(Default)]
pub struct RecordingSink {
    artifacts: Mutex<Vec<Artifact>>,
}

impl RecordingSink {
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().clone()
    }
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn store(&self, _project_id: &str, _feature_id: &str, artifact: &Artifact) -> Result<()> {
        self.artifacts.lock().push(artifact.clone());
        Ok(())
    }
}

/// Delegates to the real roster but records the order roles were invoked in.
pub struct RecordingRunner {
    inner: AgentRoster,
    pub invoked: Mutex<Vec<AgentRole>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            inner: AgentRoster::new(PmAgent::new()),
            invoked: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<AgentRole> {
        self.invoked.lock().clone()
    }
}

#[async_trait]
impl AgentRunner for RecordingRunner {
    async fn run(
        &self,
        role: AgentRole,
        context: &AgentContext,
        task: &str,
    ) -> Result<AgentResult> {
        self.invoked.lock().push(role);
        self.inner.run(role, context, task).await
    }
}

/// Fails with a bare message for one role; every other role runs normally.
pub struct FailingRunner {
    inner: AgentRoster,
    fail_role: AgentRole,
    error: String,
}

impl FailingRunner {
    pub fn new(fail_role: AgentRole, error: impl Into<String>) -> Self {
        Self {
            inner: AgentRoster::new(PmAgent::new()),
            fail_role,
            error: error.into(),
        }
    }
}

#[async_trait]
impl AgentRunner for FailingRunner {
    async fn run(
        &self,
        role: AgentRole,
        context: &AgentContext,
        task: &str,
    ) -> Result<AgentResult> {
        if role == self.fail_role {
            return Err(LaneError::Other(self.error.clone()));
        }
        self.inner.run(role, context, task).await
    }
}

/// Succeeds slowly and counts calls; used to race two drains.
pub struct SlowRunner {
    pub calls: AtomicUsize,
}

impl SlowRunner {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AgentRunner for SlowRunner {
    async fn run(
        &self,
        _role: AgentRole,
        _context: &AgentContext,
        task: &str,
    ) -> Result<AgentResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(AgentResult::success(format!("done: {}", task)))
    }
}

/// The first architect call fans out one extra QA step; everything else
/// succeeds plainly.
pub struct FanOutRunner {
    emitted: AtomicBool,
}

impl FanOutRunner {
    pub fn new() -> Self {
        Self {
            emitted: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AgentRunner for FanOutRunner {
    async fn run(
        &self,
        role: AgentRole,
        _context: &AgentContext,
        _task: &str,
    ) -> Result<AgentResult> {
        if role == AgentRole::Architect
            && self
                .emitted
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Ok(AgentResult::success("design done").with_next_steps(vec![
                NextStep::new(AgentRole::Qa, "Verify the design decisions", 1),
            ]));
        }
        Ok(AgentResult::success("ok"))
    }
}
