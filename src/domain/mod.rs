//! Record types for the project hierarchy.
//!
//! Projects own features; features own tasks and chat sessions; sessions own
//! an append-only message log. Status enums round-trip through the store as
//! snake_case text.

mod feature;
mod ids;
mod project;
mod session;
mod task;

pub use feature::{Feature, FeaturePriority, FeatureStatus};
pub use ids::{generate_id, EntityKind};
pub use project::{Project, ProjectStatus};
pub use session::{Message, MessageRole, Session, SessionStatus};
pub use task::{AgentRole, Task, TaskStatus};
