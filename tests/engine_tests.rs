mod fixtures;

use std::sync::Arc;

use fixtures::{
    default_engine, engine_with, seed, FailingRunner, FanOutRunner, RecordingRunner, SlowRunner,
};
use worklane::agent::ArtifactType;
use worklane::domain::{AgentRole, MessageRole, Task, TaskStatus};
use worklane::RecordStore;

const SALON_PITCH: &str = "I want a booking app for my salon. Customers should pick a stylist \
                           and a time slot online, pay a deposit, and get reminder texts before \
                           their appointment.";

fn queued_task(feature_id: &str, session_id: &str, title: &str, role: AgentRole) -> Task {
    Task::new(feature_id, title, role)
        .with_session(session_id)
        .with_status(TaskStatus::Queued)
}

#[tokio::test]
async fn missing_session_fails_without_error() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, _) = seed(&store);
    let (engine, _) = default_engine(store);

    let result = engine
        .execute_user_message("sess_missing", &feature.id, "hello")
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.output, "");
    assert_eq!(result.error.as_deref(), Some("Session not found"));
}

#[tokio::test]
async fn missing_feature_and_project_fail_fast() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, _) = default_engine(store.clone());

    let result = engine
        .execute_user_message(&session.id, "feat_missing", "hello")
        .await
        .unwrap();
    assert_eq!(result.error.as_deref(), Some("Feature not found"));

    // A feature whose project row is gone breaks the chain one link later.
    let orphan = worklane::Feature::new("proj_missing", "Orphan");
    store.insert_feature(&orphan).unwrap();
    let orphan_session = worklane::Session::new(&orphan.id);
    store.insert_session(&orphan_session).unwrap();

    let result = engine
        .execute_user_message(&orphan_session.id, &orphan.id, "hello")
        .await
        .unwrap();
    assert_eq!(result.error.as_deref(), Some("Project not found"));
}

#[tokio::test]
async fn first_contact_produces_prd() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, sink) = default_engine(store.clone());

    let result = engine
        .execute_user_message(&session.id, &feature.id, SALON_PITCH)
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.output.contains("Product Requirements Document"));
    assert_eq!(result.artifacts.len(), 1);
    assert_eq!(result.artifacts[0].artifact_type, ArtifactType::Prd);

    // The artifact was relayed to the sink.
    let relayed = sink.artifacts();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].artifact_type, ArtifactType::Prd);
}

#[tokio::test]
async fn chat_persists_user_then_assistant_message() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, _) = default_engine(store.clone());

    engine
        .execute_user_message(&session.id, &feature.id, SALON_PITCH)
        .await
        .unwrap();

    let messages = store.list_messages(&session.id).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, SALON_PITCH);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert!(messages[1].content.contains("Product Requirements Document"));
}

#[tokio::test]
async fn approval_queues_exactly_one_architect_step() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, _) = default_engine(store.clone());

    // Prior turn so history is non-empty.
    engine
        .execute_user_message(&session.id, &feature.id, "a short idea")
        .await
        .unwrap();

    let result = engine
        .execute_user_message(&session.id, &feature.id, "looks good, approve it")
        .await
        .unwrap();

    assert_eq!(result.next_steps.len(), 1);
    assert_eq!(result.next_steps[0].role, AgentRole::Architect);

    let status = engine.queue_status().unwrap();
    assert_eq!(status.pending, 1);
    assert!(!status.draining);

    let tasks = store.list_tasks(&feature.id).unwrap();
    let queued: Vec<_> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Queued)
        .collect();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].agent_role, AgentRole::Architect);
    assert_eq!(queued[0].session_id.as_deref(), Some(session.id.as_str()));
}

#[tokio::test]
async fn planning_drain_runs_steps_in_fifo_order() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let runner = Arc::new(RecordingRunner::new());
    let (engine, _) = engine_with(store.clone(), runner.clone());

    engine
        .execute_user_message(&session.id, &feature.id, "a short idea")
        .await
        .unwrap();
    engine
        .execute_user_message(&session.id, &feature.id, "please update the plan")
        .await
        .unwrap();
    assert_eq!(engine.queue_status().unwrap().pending, 5);

    let context = engine.resolve_context(&session.id, &feature.id).unwrap();
    engine.process_queue(&context).await.unwrap();

    assert_eq!(engine.queue_status().unwrap().pending, 0);

    let tasks = store.list_tasks(&feature.id).unwrap();
    assert_eq!(tasks.len(), 5);
    for task in &tasks {
        assert_eq!(task.status, TaskStatus::Completed, "task {}", task.id);
        assert!(task.output.as_deref().is_some_and(|o| !o.is_empty()));
        assert!(task.started_at.is_some());
        assert!(task.completed_at.is_some());
    }

    // Drain order follows enqueue order: the pm invocations come first,
    // then the five specialists in plan order.
    let specialist_calls: Vec<AgentRole> = runner
        .invocations()
        .into_iter()
        .filter(|r| *r != AgentRole::Pm)
        .collect();
    assert_eq!(
        specialist_calls,
        vec![
            AgentRole::Architect,
            AgentRole::Backend,
            AgentRole::Frontend,
            AgentRole::Qa,
            AgentRole::Devops,
        ]
    );
}

#[tokio::test]
async fn failing_step_is_isolated() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let runner = Arc::new(FailingRunner::new(AgentRole::Frontend, "boom"));
    let (engine, _) = engine_with(store.clone(), runner);

    let frontend = queued_task(&feature.id, &session.id, "Build UI components", AgentRole::Frontend);
    let qa = queued_task(&feature.id, &session.id, "Write and run tests", AgentRole::Qa);
    store.insert_task(&frontend).unwrap();
    store.insert_task(&qa).unwrap();

    let context = engine.resolve_context(&session.id, &feature.id).unwrap();
    engine.process_queue(&context).await.unwrap();

    let failed = store.get_task(&frontend.id).unwrap().unwrap();
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("boom"));
    assert!(failed.completed_at.is_some());

    // The failure did not stop the drain.
    let passed = store.get_task(&qa.id).unwrap().unwrap();
    assert_eq!(passed.status, TaskStatus::Completed);
    assert_eq!(engine.queue_status().unwrap().pending, 0);
}

#[tokio::test]
async fn fanned_out_steps_join_the_same_drain() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, _) = engine_with(store.clone(), Arc::new(FanOutRunner::new()));

    let architect = queued_task(
        &feature.id,
        &session.id,
        "Design system architecture and database schema",
        AgentRole::Architect,
    );
    store.insert_task(&architect).unwrap();

    let context = engine.resolve_context(&session.id, &feature.id).unwrap();
    engine.process_queue(&context).await.unwrap();

    let tasks = store.list_tasks(&feature.id).unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Completed));
    assert!(tasks.iter().any(|t| t.agent_role == AgentRole::Qa));
}

#[tokio::test]
async fn concurrent_drains_never_run_a_step_twice() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let runner = Arc::new(SlowRunner::new());
    let (engine, _) = engine_with(store.clone(), runner.clone());
    let engine = Arc::new(engine);

    for i in 0..4 {
        store
            .insert_task(&queued_task(
                &feature.id,
                &session.id,
                &format!("step {}", i),
                AgentRole::Backend,
            ))
            .unwrap();
    }

    let context = engine.resolve_context(&session.id, &feature.id).unwrap();
    let first = {
        let engine = engine.clone();
        let context = context.clone();
        tokio::spawn(async move { engine.process_queue(&context).await })
    };
    let second = {
        let engine = engine.clone();
        let context = context.clone();
        tokio::spawn(async move { engine.process_queue(&context).await })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // Every step ran exactly once across both drain attempts.
    assert_eq!(runner.calls.load(std::sync::atomic::Ordering::SeqCst), 4);
    let tasks = store.list_tasks(&feature.id).unwrap();
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Completed));
}

#[tokio::test]
async fn drain_on_empty_queue_is_a_noop() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, _) = default_engine(store.clone());

    let context = engine.resolve_context(&session.id, &feature.id).unwrap();
    engine.process_queue(&context).await.unwrap();

    assert!(store.list_tasks(&feature.id).unwrap().is_empty());
}

#[tokio::test]
async fn clear_queue_cancels_pending_only() {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, _) = default_engine(store.clone());

    let queued = queued_task(&feature.id, &session.id, "pending work", AgentRole::Qa);
    store.insert_task(&queued).unwrap();

    let mut done = Task::new(&feature.id, "already done", AgentRole::Backend);
    done.mark_running();
    done.mark_completed("done");
    store.insert_task(&done).unwrap();

    let cancelled = engine.clear_queue().unwrap();
    assert_eq!(cancelled, 1);
    assert_eq!(engine.queue_status().unwrap().pending, 0);

    let queued = store.get_task(&queued.id).unwrap().unwrap();
    assert_eq!(queued.status, TaskStatus::Cancelled);

    let done = store.get_task(&done.id).unwrap().unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.output.as_deref(), Some("done"));
}

#[tokio::test]
async fn queued_steps_survive_an_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("worklane.db");

    let (feature_id, session_id) = {
        let store = Arc::new(RecordStore::open(&db_path).unwrap());
        let (_, feature, session) = seed(&store);
        let (engine, _) = default_engine(store);

        engine
            .execute_user_message(&session.id, &feature.id, "a short idea")
            .await
            .unwrap();
        engine
            .execute_user_message(&session.id, &feature.id, "please update the plan")
            .await
            .unwrap();
        assert_eq!(engine.queue_status().unwrap().pending, 5);
        (feature.id, session.id)
        // Engine and store dropped here; queued rows stay on disk.
    };

    let store = Arc::new(RecordStore::open(&db_path).unwrap());
    let (engine, _) = default_engine(store.clone());
    assert_eq!(engine.queue_status().unwrap().pending, 5);

    let context = engine.resolve_context(&session_id, &feature_id).unwrap();
    engine.process_queue(&context).await.unwrap();

    assert_eq!(engine.queue_status().unwrap().pending, 0);
    let tasks = store.list_tasks(&feature_id).unwrap();
    assert_eq!(tasks.len(), 5);
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Completed));
}

#[tokio::test]
async fn soft_failure_keeps_output_alongside_error() {
    // A specialist returning success=false (rather than erroring) keeps its
    // narrative on the task row alongside the error.
    struct SoftFailRunner;

    #[async_trait::async_trait]
    impl worklane::AgentRunner for SoftFailRunner {
        async fn run(
            &self,
            _role: AgentRole,
            _context: &worklane::AgentContext,
            _task: &str,
        ) -> worklane::Result<worklane::AgentResult> {
            let mut result = worklane::AgentResult::failure("validation failed");
            result.output = "partial narrative".to_string();
            Ok(result)
        }
    }

    let store = Arc::new(RecordStore::in_memory().unwrap());
    let (_, feature, session) = seed(&store);
    let (engine, _) = engine_with(store.clone(), Arc::new(SoftFailRunner));

    let task = queued_task(&feature.id, &session.id, "doomed step", AgentRole::Devops);
    store.insert_task(&task).unwrap();

    let context = engine.resolve_context(&session.id, &feature.id).unwrap();
    engine.process_queue(&context).await.unwrap();

    let task = store.get_task(&task.id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.as_deref(), Some("validation failed"));
    assert_eq!(task.output.as_deref(), Some("partial narrative"));
}
