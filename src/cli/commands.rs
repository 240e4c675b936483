use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::FeaturePriority;

#[derive(Parser)]
#[command(name = "worklane")]
#[command(author, version, about = "Agent-driven project orchestration", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize worklane in the current directory
    Init,

    /// Create a project
    NewProject {
        /// Project name
        name: String,

        /// Filesystem path of the project being managed
        #[arg(long)]
        path: Option<PathBuf>,

        /// Short description
        #[arg(long)]
        description: Option<String>,
    },

    /// List projects
    Projects,

    /// Create a feature under a project
    NewFeature {
        /// Owning project id
        project_id: String,

        /// Feature title
        title: String,

        /// Short description
        #[arg(long)]
        description: Option<String>,

        /// Priority (low, medium, high, critical)
        #[arg(long)]
        priority: Option<FeaturePriority>,
    },

    /// List features of a project
    Features {
        /// Project id
        project_id: String,
    },

    /// Open a chat session on a feature
    NewSession {
        /// Owning feature id
        feature_id: String,
    },

    /// Send a chat message through the PM agent, then drain queued work
    Chat {
        /// Session id
        session_id: String,

        /// Feature id
        feature_id: String,

        /// Message text
        message: String,
    },

    /// Resume draining queued steps (e.g. after a restart)
    Drain {
        /// Session id providing the execution context
        session_id: String,

        /// Feature id providing the execution context
        feature_id: String,
    },

    /// Show queue status
    Queue,

    /// Discard all pending steps
    ClearQueue,

    /// List tasks of a feature
    Tasks {
        /// Feature id
        feature_id: String,
    },
}
