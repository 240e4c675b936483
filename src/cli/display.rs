use console::{style, Style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::{Feature, Project, Task, TaskStatus};
use crate::engine::QueueStatus;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_success(&self, text: &str) {
        println!("{} {}", style("✓").green().bold(), text);
    }

    pub fn print_error(&self, text: &str) {
        eprintln!("{} {}", style("✗").red().bold(), text);
    }

    pub fn print_warning(&self, text: &str) {
        println!("{} {}", style("!").yellow().bold(), text);
    }

    pub fn print_info(&self, text: &str) {
        println!("{} {}", style("·").dim(), text);
    }

    pub fn print_agent_reply(&self, output: &str) {
        println!();
        println!("{}", style("PM Agent").bold().magenta());
        println!("{}", output);
        println!();
    }

    pub fn print_projects_table(&self, projects: &[Project]) {
        if projects.is_empty() {
            self.print_info("No projects yet.");
            return;
        }
        for project in projects {
            println!(
                "{}  {}  [{}]",
                style(&project.id).bold(),
                project.name,
                style(project.status).dim()
            );
        }
    }

    pub fn print_features_table(&self, features: &[Feature]) {
        if features.is_empty() {
            self.print_info("No features yet.");
            return;
        }
        for feature in features {
            println!(
                "{}  {}  [{} / {}]",
                style(&feature.id).bold(),
                feature.title,
                style(feature.status).dim(),
                style(feature.priority).dim()
            );
        }
    }

    pub fn print_tasks_table(&self, tasks: &[Task]) {
        if tasks.is_empty() {
            self.print_info("No tasks yet.");
            return;
        }
        for task in tasks {
            let status_style = self.task_status_style(task.status);
            println!(
                "{}  {:<10} {}  {}",
                style(&task.id).bold(),
                status_style.apply_to(task.status.to_string()),
                style(task.agent_role).cyan(),
                task.title
            );
            if let Some(error) = &task.error {
                println!("    {}", style(format!("error: {}", error)).red().dim());
            }
        }
    }

    pub fn print_queue_status(&self, status: &QueueStatus) {
        let state = if status.draining {
            style("draining").yellow()
        } else {
            style("idle").dim()
        };
        println!("Pending steps: {}  ({})", status.pending, state);
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner
    }

    fn task_status_style(&self, status: TaskStatus) -> Style {
        match status {
            TaskStatus::Completed => Style::new().green(),
            TaskStatus::Failed => Style::new().red(),
            TaskStatus::Running => Style::new().yellow(),
            TaskStatus::Queued => Style::new().cyan(),
            TaskStatus::Cancelled => Style::new().dim(),
            TaskStatus::Pending => Style::new().white(),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
