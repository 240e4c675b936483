//! Configuration types and loading.

mod settings;

pub use settings::{EngineConfig, LaneConfig, StoreConfig, WorkspacePaths};
