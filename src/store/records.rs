use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::domain::{
    AgentRole, Feature, FeaturePriority, FeatureStatus, Message, MessageRole, Project,
    ProjectStatus, Session, SessionStatus, Task, TaskStatus,
};
use crate::error::{LaneError, Result};

pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LaneError::Store(format!("Failed to create store dir: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| LaneError::Store(format!("Failed to open record store: {}", e)))?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LaneError::Store(format!("Failed to open in-memory store: {}", e)))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                path TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS features (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'backlog',
                priority TEXT NOT NULL DEFAULT 'medium',
                worktree_path TEXT,
                branch_name TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                feature_id TEXT NOT NULL REFERENCES features(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                agent_role TEXT NOT NULL,
                session_id TEXT,
                output TEXT,
                error TEXT,
                started_at TEXT,
                completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                feature_id TEXT NOT NULL REFERENCES features(id) ON DELETE CASCADE,
                task_id TEXT,
                remote_session_id TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                history TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_features_project
                ON features(project_id, sort_order);
            CREATE INDEX IF NOT EXISTS idx_tasks_feature
                ON tasks(feature_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_status
                ON tasks(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_feature
                ON sessions(feature_id);
            CREATE INDEX IF NOT EXISTS idx_messages_session
                ON messages(session_id, timestamp);
            ",
        )
        .map_err(|e| LaneError::Store(format!("Failed to init schema: {}", e)))?;

        Ok(())
    }

    // ----- projects -----

    pub fn insert_project(&self, project: &Project) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO projects (id, name, description, path, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &project.id,
                &project.name,
                &project.description,
                path_text(&project.path),
                project.status.as_str(),
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ],
        )?;
        debug!(project_id = %project.id, "Project inserted");
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn.lock();
        let project = conn
            .query_row(
                "SELECT id, name, description, path, status, created_at, updated_at
                 FROM projects WHERE id = ?1",
                params![id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn update_project(&self, project: &Project) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE projects
             SET name = ?2, description = ?3, path = ?4, status = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                &project.id,
                &project.name,
                &project.description,
                path_text(&project.path),
                project.status.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(LaneError::ProjectNotFound(project.id.clone()));
        }
        Ok(())
    }

    pub fn delete_project(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, path, status, created_at, updated_at
             FROM projects ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], project_from_row)?;
        collect(rows)
    }

    // ----- features -----

    pub fn insert_feature(&self, feature: &Feature) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO features (id, project_id, title, description, status, priority,
                                   worktree_path, branch_name, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &feature.id,
                &feature.project_id,
                &feature.title,
                &feature.description,
                feature.status.as_str(),
                feature.priority.as_str(),
                feature.worktree_path.as_deref().map(path_text),
                &feature.branch_name,
                feature.order,
                feature.created_at.to_rfc3339(),
                feature.updated_at.to_rfc3339(),
            ],
        )?;
        debug!(feature_id = %feature.id, "Feature inserted");
        Ok(())
    }

    pub fn get_feature(&self, id: &str) -> Result<Option<Feature>> {
        let conn = self.conn.lock();
        let feature = conn
            .query_row(
                "SELECT id, project_id, title, description, status, priority,
                        worktree_path, branch_name, sort_order, created_at, updated_at
                 FROM features WHERE id = ?1",
                params![id],
                feature_from_row,
            )
            .optional()?;
        Ok(feature)
    }

    pub fn update_feature(&self, feature: &Feature) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE features
             SET title = ?2, description = ?3, status = ?4, priority = ?5,
                 worktree_path = ?6, branch_name = ?7, sort_order = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                &feature.id,
                &feature.title,
                &feature.description,
                feature.status.as_str(),
                feature.priority.as_str(),
                feature.worktree_path.as_deref().map(path_text),
                &feature.branch_name,
                feature.order,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(LaneError::FeatureNotFound(feature.id.clone()));
        }
        Ok(())
    }

    pub fn delete_feature(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM features WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn list_features(&self, project_id: &str) -> Result<Vec<Feature>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, description, status, priority,
                    worktree_path, branch_name, sort_order, created_at, updated_at
             FROM features WHERE project_id = ?1
             ORDER BY sort_order ASC, created_at ASC",
        )?;
        let rows = stmt.query_map(params![project_id], feature_from_row)?;
        collect(rows)
    }

    // ----- tasks -----

    pub fn insert_task(&self, task: &Task) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tasks (id, feature_id, title, description, status, agent_role,
                                session_id, output, error, started_at, completed_at,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                &task.id,
                &task.feature_id,
                &task.title,
                &task.description,
                task.status.as_str(),
                task.agent_role.as_str(),
                &task.session_id,
                &task.output,
                &task.error,
                task.started_at.map(|t| t.to_rfc3339()),
                task.completed_at.map(|t| t.to_rfc3339()),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ],
        )?;
        debug!(task_id = %task.id, status = %task.status, "Task inserted");
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let conn = self.conn.lock();
        let task = conn
            .query_row(
                "SELECT id, feature_id, title, description, status, agent_role, session_id,
                        output, error, started_at, completed_at, created_at, updated_at
                 FROM tasks WHERE id = ?1",
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    pub fn update_task(&self, task: &Task) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE tasks
             SET title = ?2, description = ?3, status = ?4, session_id = ?5,
                 output = ?6, error = ?7, started_at = ?8, completed_at = ?9, updated_at = ?10
             WHERE id = ?1",
            params![
                &task.id,
                &task.title,
                &task.description,
                task.status.as_str(),
                &task.session_id,
                &task.output,
                &task.error,
                task.started_at.map(|t| t.to_rfc3339()),
                task.completed_at.map(|t| t.to_rfc3339()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(LaneError::TaskNotFound(task.id.clone()));
        }
        Ok(())
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn list_tasks(&self, feature_id: &str) -> Result<Vec<Task>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, feature_id, title, description, status, agent_role, session_id,
                    output, error, started_at, completed_at, created_at, updated_at
             FROM tasks WHERE feature_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![feature_id], task_from_row)?;
        collect(rows)
    }

    /// Oldest queued task, by creation time with id as tiebreaker. This is
    /// the head of the durable work queue.
    pub fn next_queued_task(&self) -> Result<Option<Task>> {
        let conn = self.conn.lock();
        let task = conn
            .query_row(
                "SELECT id, feature_id, title, description, status, agent_role, session_id,
                        output, error, started_at, completed_at, created_at, updated_at
                 FROM tasks WHERE status = 'queued'
                 ORDER BY created_at ASC, id ASC
                 LIMIT 1",
                [],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    pub fn count_queued_tasks(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status = 'queued'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Cancel every queued task in one statement. Tasks already running or
    /// terminal are untouched; completed_at is stamped only where missing.
    pub fn cancel_queued_tasks(&self) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE tasks
             SET status = 'cancelled',
                 completed_at = COALESCE(completed_at, ?1),
                 updated_at = ?1
             WHERE status = 'queued'",
            params![now],
        )?;
        debug!(cancelled = changed, "Queued tasks cancelled");
        Ok(changed)
    }

    // ----- sessions -----

    pub fn insert_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sessions (id, feature_id, task_id, remote_session_id, status,
                                   history, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &session.id,
                &session.feature_id,
                &session.task_id,
                &session.remote_session_id,
                session.status.as_str(),
                &session.history,
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
            ],
        )?;
        debug!(session_id = %session.id, "Session inserted");
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock();
        let session = conn
            .query_row(
                "SELECT id, feature_id, task_id, remote_session_id, status, history,
                        created_at, updated_at
                 FROM sessions WHERE id = ?1",
                params![id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    pub fn update_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE sessions
             SET task_id = ?2, remote_session_id = ?3, status = ?4, history = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                &session.id,
                &session.task_id,
                &session.remote_session_id,
                session.status.as_str(),
                &session.history,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(LaneError::SessionNotFound(session.id.clone()));
        }
        Ok(())
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn list_sessions(&self, feature_id: &str) -> Result<Vec<Session>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, feature_id, task_id, remote_session_id, status, history,
                    created_at, updated_at
             FROM sessions WHERE feature_id = ?1
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![feature_id], session_from_row)?;
        collect(rows)
    }

    // ----- messages (append-only) -----

    pub fn insert_message(&self, message: &Message) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (id, session_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &message.id,
                &message.session_id,
                message.role.as_str(),
                &message.content,
                message.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content, timestamp
             FROM messages WHERE session_id = ?1
             ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![session_id], message_from_row)?;
        collect(rows)
    }
}

fn collect<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn parse_ts(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(idx, v)).transpose()
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        path: PathBuf::from(row.get::<_, String>(3)?),
        status: ProjectStatus::parse(&row.get::<_, String>(4)?),
        created_at: parse_ts(5, row.get(5)?)?,
        updated_at: parse_ts(6, row.get(6)?)?,
    })
}

fn feature_from_row(row: &Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: FeatureStatus::parse(&row.get::<_, String>(4)?),
        priority: FeaturePriority::parse(&row.get::<_, String>(5)?),
        worktree_path: row.get::<_, Option<String>>(6)?.map(PathBuf::from),
        branch_name: row.get(7)?,
        order: row.get(8)?,
        created_at: parse_ts(9, row.get(9)?)?,
        updated_at: parse_ts(10, row.get(10)?)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let role: String = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        feature_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::parse(&row.get::<_, String>(4)?),
        agent_role: AgentRole::parse(&role).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("unknown agent role: {}", role).into(),
            )
        })?,
        session_id: row.get(6)?,
        output: row.get(7)?,
        error: row.get(8)?,
        started_at: parse_opt_ts(9, row.get(9)?)?,
        completed_at: parse_opt_ts(10, row.get(10)?)?,
        created_at: parse_ts(11, row.get(11)?)?,
        updated_at: parse_ts(12, row.get(12)?)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        feature_id: row.get(1)?,
        task_id: row.get(2)?,
        remote_session_id: row.get(3)?,
        status: SessionStatus::parse(&row.get::<_, String>(4)?),
        history: row.get(5)?,
        created_at: parse_ts(6, row.get(6)?)?,
        updated_at: parse_ts(7, row.get(7)?)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role: MessageRole::parse(&row.get::<_, String>(2)?),
        content: row.get(3)?,
        timestamp: parse_ts(4, row.get(4)?)?,
    })
}
