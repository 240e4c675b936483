use tracing::debug;

use super::context::AgentContext;
use super::prompt::PM_SYSTEM_PROMPT;
use super::result::{AgentResult, Artifact, NextStep};
use crate::domain::{AgentRole, MessageRole};

const DEFAULT_PRD_THRESHOLD_CHARS: usize = 100;

/// Conversational phase as classified from history and the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovery,
    Planning,
    Execution,
    Review,
    /// Written but never produced by `classify`; the fallback is Discovery.
    /// Kept until the intended fallback semantics are settled.
    General,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Discovery => "discovery",
            Self::Planning => "planning",
            Self::Execution => "execution",
            Self::Review => "review",
            Self::General => "general",
        };
        write!(f, "{}", s)
    }
}

/// The orchestrating agent: decides what a user message means for the
/// project and which follow-up steps to hand to the specialists.
pub struct PmAgent {
    system_prompt: &'static str,
    prd_threshold_chars: usize,
}

impl Default for PmAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl PmAgent {
    pub fn new() -> Self {
        Self {
            system_prompt: PM_SYSTEM_PROMPT,
            prd_threshold_chars: DEFAULT_PRD_THRESHOLD_CHARS,
        }
    }

    pub fn with_prd_threshold(mut self, chars: usize) -> Self {
        self.prd_threshold_chars = chars;
        self
    }

    pub fn system_prompt(&self) -> &'static str {
        self.system_prompt
    }

    pub fn process_message(&self, context: &AgentContext, message: &str) -> AgentResult {
        let phase = self.classify(context, message);
        debug!(%phase, history_len = context.history.len(), "Message classified");

        match phase {
            Phase::Discovery => self.handle_discovery(context, message),
            Phase::Planning => self.handle_planning(),
            Phase::Execution => self.handle_execution(),
            Phase::Review => self.handle_review(),
            Phase::General => self.handle_general(),
        }
    }

    /// Phase is a pure function of history length and keyword presence.
    /// Precedence: approval > change request > review request > discovery.
    pub fn classify(&self, context: &AgentContext, message: &str) -> Phase {
        if context.history.is_empty() {
            return Phase::Discovery;
        }

        let lower = message.to_lowercase();

        if ["approve", "looks good", "yes"].iter().any(|k| lower.contains(k)) {
            return Phase::Execution;
        }

        if ["change", "modify", "update"].iter().any(|k| lower.contains(k)) {
            return Phase::Planning;
        }

        if ["review", "check", "test"].iter().any(|k| lower.contains(k)) {
            return Phase::Review;
        }

        // Keep gathering requirements until a keyword moves us on.
        Phase::Discovery
    }

    fn handle_discovery(&self, context: &AgentContext, message: &str) -> AgentResult {
        if self.has_enough_requirements(context, message) {
            let prd = self.build_prd(context, message);
            let output = format!(
                "I've analyzed your requirements and created a Product Requirements Document:\n\n\
                 {}\n\n\
                 Would you like me to proceed with this plan? You can:\n\
                 - [Approve] to start development\n\
                 - [Modify] to make changes\n\
                 - Ask me any questions",
                prd
            );
            return AgentResult::success(output)
                .with_artifacts(vec![Artifact::prd(".worklane/prd.md", prd)]);
        }

        AgentResult::success(clarifying_questions())
    }

    fn handle_planning(&self) -> AgentResult {
        let breakdown = task_breakdown();
        let next_steps: Vec<NextStep> = breakdown
            .iter()
            .enumerate()
            .map(|(i, (role, task))| NextStep::new(*role, *task, i as u32 + 1))
            .collect();

        let listing: Vec<String> = breakdown
            .iter()
            .enumerate()
            .map(|(i, (role, task))| format!("{}. **{}**: {}", i + 1, capitalize(role.as_str()), task))
            .collect();

        let output = format!(
            "Here's the development plan:\n\n{}\n\nShall I start with the first task?",
            listing.join("\n")
        );

        AgentResult::success(output).with_next_steps(next_steps)
    }

    fn handle_execution(&self) -> AgentResult {
        AgentResult::success(
            "Starting development! I'll coordinate the team and keep you updated on progress.\n\n\
             First, I'm assigning the Architect agent to design the system structure...",
        )
        .with_next_steps(vec![NextStep::new(
            AgentRole::Architect,
            "Design system architecture and database schema",
            1,
        )])
    }

    fn handle_review(&self) -> AgentResult {
        AgentResult::success(
            "Initiating review process...\n\n\
             I'll have the QA agent run tests and verify the implementation.",
        )
        .with_next_steps(vec![NextStep::new(
            AgentRole::Qa,
            "Run test suite and generate coverage report",
            1,
        )])
    }

    fn handle_general(&self) -> AgentResult {
        AgentResult::success(
            "I understand. Let me help you with that.\n\n\
             Could you tell me more about what specific aspect you'd like to focus on?",
        )
    }

    /// Requirements are "enough" once the accumulated conversation text
    /// reaches the PRD threshold.
    fn has_enough_requirements(&self, context: &AgentContext, message: &str) -> bool {
        let mut total: String = context
            .history
            .iter()
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        total.push(' ');
        total.push_str(message);

        total.chars().count() >= self.prd_threshold_chars
    }

    fn build_prd(&self, context: &AgentContext, message: &str) -> String {
        let user_content: Vec<&str> = context
            .history
            .iter()
            .filter(|t| t.role == MessageRole::User)
            .map(|t| t.content.as_str())
            .chain(std::iter::once(message))
            .collect();

        let overview = extract_overview(&user_content.join("\n"));

        format!(
            "# Product Requirements Document\n\
             \n\
             ## Project Overview\n\
             {overview}\n\
             \n\
             ## Target Users\n\
             - Primary: End users of the application\n\
             - Secondary: Administrators (if applicable)\n\
             \n\
             ## Core Features\n\
             \n\
             ### P0 - Must Have\n\
             1. User-facing interface\n\
             2. Data management\n\
             3. Core business logic\n\
             \n\
             ### P1 - Should Have\n\
             1. Admin dashboard\n\
             2. Notifications\n\
             3. Search/Filter functionality\n\
             \n\
             ## Technical Requirements\n\
             - **Frontend**: Web client\n\
             - **Backend**: HTTP API\n\
             - **Database**: SQLite (development) / PostgreSQL (production)\n\
             \n\
             ## Success Criteria\n\
             - [ ] Users can complete the primary workflow\n\
             - [ ] Application is responsive (mobile-friendly)\n\
             - [ ] All data is properly validated\n\
             - [ ] Error handling is comprehensive\n\
             \n\
             ## Out of Scope (for MVP)\n\
             - Advanced analytics\n\
             - Third-party integrations\n\
             - Mobile native apps\n\
             \n\
             ## Timeline Estimate\n\
             - Phase 1: Setup & Core (2-3 days)\n\
             - Phase 2: Features (3-5 days)\n\
             - Phase 3: Polish & Deploy (1-2 days)\n"
        )
    }
}

/// Fixed 5-step breakdown used by the planning phase.
fn task_breakdown() -> [(AgentRole, &'static str); 5] {
    [
        (AgentRole::Architect, "Design database schema and API structure"),
        (AgentRole::Backend, "Implement API endpoints"),
        (AgentRole::Frontend, "Build UI components"),
        (AgentRole::Qa, "Write and run tests"),
        (AgentRole::Devops, "Setup deployment pipeline"),
    ]
}

fn clarifying_questions() -> &'static str {
    "Thanks for sharing your idea! To help me create the best solution, I have a few questions:\n\
     \n\
     1. **Target Users**: Who will be using this application? (e.g., customers, employees, general public)\n\
     \n\
     2. **Core Features**: What are the 2-3 most important things users need to do?\n\
     \n\
     3. **Authentication**: Do users need to log in? If so, how? (email, social login, phone)\n\
     \n\
     4. **Data**: What information does the app need to store?\n\
     \n\
     5. **Integrations**: Any external services needed? (payments, SMS, email, etc.)\n\
     \n\
     Feel free to answer as many as you'd like, or just describe more about your vision!"
}

/// First substantial sentence of the gathered requirements.
fn extract_overview(content: &str) -> String {
    content
        .split(['.', '!', '?'])
        .map(str::trim)
        .find(|s| s.chars().count() > 20)
        .map(str::to_string)
        .unwrap_or_else(|| "A web application built with modern technologies.".to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
