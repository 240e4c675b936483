//! Agent layer: the PM orchestrator, role-specialized responders, and the
//! static persona table.
//!
//! The PM agent classifies a conversation into a phase and replies with
//! optional follow-up steps; specialists turn a step description into a
//! canned narrative plus generated artifacts. Dispatch is a single match on
//! `AgentRole` behind the `AgentRunner` seam.

mod context;
mod pm;
mod prompt;
mod result;
mod specialist;

pub use context::{AgentContext, ChatTurn};
pub use pm::{Phase, PmAgent};
pub use prompt::{system_prompt, PM_SYSTEM_PROMPT};
pub use result::{AgentResult, Artifact, ArtifactType, NextStep};
pub use specialist::{run_specialist, AgentRoster, AgentRunner};
