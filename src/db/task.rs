use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub uuid: String,
    pub user_uuid: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    uuid: String,
    user_uuid: String,
    title: String,
    description: String,
    due_date: Option<String>,
    priority: String,
    tags: String,
    completed: i32,
    created_at: String,
    updated_at: String,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            uuid: row.uuid,
            user_uuid: row.user_uuid,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            priority: Priority::from_str(&row.priority),
            // Tags are stored as a JSON array in a TEXT column
            tags: serde_json::from_str(&row.tags).unwrap_or_default(),
            completed: row.completed != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TASK_COLUMNS: &str =
    "uuid, user_uuid, title, description, due_date, priority, tags, completed, created_at, updated_at";

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new task for a user.
    pub async fn create(
        &self,
        uuid: &str,
        user_uuid: &str,
        title: &str,
        description: &str,
        due_date: Option<&str>,
        priority: Priority,
        tags: &[String],
    ) -> Result<(), sqlx::Error> {
        let tags_json = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
        sqlx::query(
            "INSERT INTO tasks (uuid, user_uuid, title, description, due_date, priority, tags)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(user_uuid)
        .bind(title)
        .bind(description)
        .bind(due_date)
        .bind(priority.as_str())
        .bind(tags_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a task by uuid, scoped to its owner.
    pub async fn get_for_user(
        &self,
        uuid: &str,
        user_uuid: &str,
    ) -> Result<Option<Task>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tasks WHERE uuid = ? AND user_uuid = ?",
            TASK_COLUMNS
        ))
        .bind(uuid)
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Task::from))
    }

    /// List all tasks owned by a user.
    pub async fn list_for_user(&self, user_uuid: &str) -> Result<Vec<Task>, sqlx::Error> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tasks WHERE user_uuid = ? ORDER BY created_at",
            TASK_COLUMNS
        ))
        .bind(user_uuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Persist the mutable fields of a task. The owner scope in the WHERE
    /// clause means a task can never be moved between users.
    pub async fn update(&self, task: &Task) -> Result<bool, sqlx::Error> {
        let tags_json = serde_json::to_string(&task.tags).unwrap_or_else(|_| "[]".to_string());
        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, due_date = ?, priority = ?,
             tags = ?, completed = ?, updated_at = datetime('now')
             WHERE uuid = ? AND user_uuid = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.due_date)
        .bind(task.priority.as_str())
        .bind(tags_json)
        .bind(task.completed as i32)
        .bind(&task.uuid)
        .bind(&task.user_uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a task, scoped to its owner.
    pub async fn delete_for_user(&self, uuid: &str, user_uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE uuid = ? AND user_uuid = ?")
            .bind(uuid)
            .bind(user_uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn seed_user(db: &Database, uuid: &str, email: &str) {
        db.users().create(uuid, "Test", email, "hash").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_list_tasks() {
        let db = Database::open(":memory:").await.unwrap();
        seed_user(&db, "u-1", "a@x.com").await;

        db.tasks()
            .create(
                "t-1",
                "u-1",
                "Read chapter 4",
                "",
                Some("2026-03-01T09:00:00Z"),
                Priority::High,
                &["study".to_string()],
            )
            .await
            .unwrap();

        let tasks = db.tasks().list_for_user("u-1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Read chapter 4");
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[0].tags, vec!["study".to_string()]);
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_update_task() {
        let db = Database::open(":memory:").await.unwrap();
        seed_user(&db, "u-1", "a@x.com").await;

        db.tasks()
            .create("t-1", "u-1", "Draft essay", "", None, Priority::Medium, &[])
            .await
            .unwrap();

        let mut task = db.tasks().get_for_user("t-1", "u-1").await.unwrap().unwrap();
        task.completed = true;
        task.title = "Draft essay (final)".to_string();
        assert!(db.tasks().update(&task).await.unwrap());

        let task = db.tasks().get_for_user("t-1", "u-1").await.unwrap().unwrap();
        assert!(task.completed);
        assert_eq!(task.title, "Draft essay (final)");
    }

    #[tokio::test]
    async fn test_tasks_scoped_to_owner() {
        let db = Database::open(":memory:").await.unwrap();
        seed_user(&db, "u-1", "a@x.com").await;
        seed_user(&db, "u-2", "b@x.com").await;

        db.tasks()
            .create("t-1", "u-1", "Mine", "", None, Priority::Low, &[])
            .await
            .unwrap();

        assert!(db.tasks().get_for_user("t-1", "u-2").await.unwrap().is_none());
        assert!(db.tasks().list_for_user("u-2").await.unwrap().is_empty());
        assert!(!db.tasks().delete_for_user("t-1", "u-2").await.unwrap());
        assert!(db.tasks().delete_for_user("t-1", "u-1").await.unwrap());
    }
}
