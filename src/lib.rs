pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod store;

pub use agent::{
    run_specialist, system_prompt, AgentContext, AgentResult, AgentRoster, AgentRunner, Artifact,
    ArtifactType, ChatTurn, NextStep, Phase, PmAgent,
};
pub use config::{EngineConfig, LaneConfig, StoreConfig, WorkspacePaths};
pub use domain::{
    AgentRole, Feature, FeaturePriority, FeatureStatus, Message, MessageRole, Project,
    ProjectStatus, Session, SessionStatus, Task, TaskStatus,
};
pub use engine::{ArtifactSink, ExecutionEngine, LogSink, QueueStatus};
pub use error::{LaneError, Result};
pub use store::RecordStore;
