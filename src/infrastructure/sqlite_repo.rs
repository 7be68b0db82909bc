use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use uuid::Uuid;

use crate::domain::{
    error::{Result, TodoError},
    repository::TodoRepository,
    todo::{NewTodo, PageWindow, Todo, TodoChanges, TodoFilter, TodoId},
};

const COLUMNS: &str = "id, title, description, created_at, updated_at";

// Shared by find_all and count_find_all. ?1 is the escaped keyword.
const KEYWORD_FILTER: &str = "deleted_at IS NULL AND (?1 = '' OR title LIKE '%' || ?1 || '%' ESCAPE '\\')";

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory url opens its own database, so keep exactly one alive.
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };
        Ok(Self { pool })
    }

    pub async fn close(&self) { self.pool.close().await }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_all(&self, filter: &TodoFilter, window: PageWindow) -> Result<Vec<Todo>> {
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE {KEYWORD_FILTER} ORDER BY seq LIMIT ?2 OFFSET ?3");
        let rows = sqlx::query(&sql)
            .bind(escape_like(&filter.keyword))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_todo).collect()
    }

    async fn count_find_all(&self, filter: &TodoFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM todos WHERE {KEYWORD_FILTER}");
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(escape_like(&filter.keyword))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_by_id(&self, id: &TodoId) -> Result<Todo> {
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE id = ?1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_todo).unwrap_or(Err(TodoError::NotFound))
    }

    async fn count_find_by_id(&self, id: &TodoId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todos WHERE id = ?1 AND deleted_at IS NULL")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn store(&self, input: NewTodo) -> Result<Todo> {
        let now = Utc::now().trunc_subsecs(6);
        let id = TodoId::new();
        sqlx::query(
            "INSERT INTO todos (id, title, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(id.to_string())
        .bind(&input.title)
        .bind(&input.description)
        .bind(encode_time(now))
        .execute(&self.pool)
        .await?;
        Ok(Todo { id, title: input.title, description: input.description, created_at: now, updated_at: now })
    }

    async fn update(&self, id: &TodoId, changes: TodoChanges) -> Result<Todo> {
        let now = Utc::now().trunc_subsecs(6);
        // MAX keeps updated_at >= created_at even if the clock steps back.
        let sql = format!(
            "UPDATE todos SET title = ?2, description = ?3, updated_at = MAX(?4, created_at)
             WHERE id = ?1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(encode_time(now))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_todo).unwrap_or(Err(TodoError::NotFound))
    }

    async fn delete(&self, id: &TodoId) -> Result<()> {
        let result = sqlx::query("UPDATE todos SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL")
            .bind(id.to_string())
            .bind(encode_time(Utc::now()))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 { return Err(TodoError::NotFound) }
        Ok(())
    }
}

// Fixed-width UTC form so timestamps compare correctly as text.
fn encode_time(t: DateTime<Utc>) -> String { t.to_rfc3339_opts(SecondsFormat::Micros, true) }

fn decode_time(s: &str) -> Result<DateTime<Utc>> { Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc)) }

fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') { out.push('\\'); }
        out.push(c);
    }
    out
}

fn row_to_todo(row: &SqliteRow) -> Result<Todo> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Todo {
        id: TodoId(Uuid::parse_str(&id)?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: decode_time(&created_at)?,
        updated_at: decode_time(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:", 5).await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    fn new_todo(title: &str) -> NewTodo { NewTodo { title: title.into(), description: format!("{title} description") } }

    fn everything() -> PageWindow { PageWindow { limit: 100, offset: 0 } }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn store_assigns_id_and_equal_timestamps() {
        let repo = repo().await;
        let stored = repo.store(new_todo("milk")).await.unwrap();
        assert_eq!(stored.created_at, stored.updated_at);

        let found = repo.find_by_id(&stored.id).await.unwrap();
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn find_all_pages_in_insertion_order() {
        let repo = repo().await;
        for i in 0..5 { repo.store(new_todo(&format!("item {i}"))).await.unwrap(); }

        let page = repo.find_all(&TodoFilter::default(), PageWindow { limit: 2, offset: 2 }).await.unwrap();
        let titles: Vec<_> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["item 2", "item 3"]);

        let past_end = repo.find_all(&TodoFilter::default(), PageWindow { limit: 2, offset: 10 }).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn keyword_filter_is_shared_by_find_and_count() {
        let repo = repo().await;
        repo.store(new_todo("Buy milk")).await.unwrap();
        repo.store(new_todo("buy bread")).await.unwrap();
        repo.store(new_todo("walk dog")).await.unwrap();
        repo.store(new_todo("100% done")).await.unwrap();

        let filter = TodoFilter::keyword("buy");
        assert_eq!(repo.find_all(&filter, everything()).await.unwrap().len(), 2);
        assert_eq!(repo.count_find_all(&filter).await.unwrap(), 2);

        let literal = TodoFilter::keyword("%");
        assert_eq!(repo.count_find_all(&literal).await.unwrap(), 1);
        assert_eq!(repo.count_find_all(&TodoFilter::default()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_refreshes_timestamp() {
        let repo = repo().await;
        let stored = repo.store(new_todo("old")).await.unwrap();
        let updated = repo
            .update(&stored.id, TodoChanges { title: "new".into(), description: "changed".into() })
            .await
            .unwrap();
        assert_eq!(updated.id, stored.id);
        assert_eq!(updated.title, "new");
        assert_eq!(updated.description, "changed");
        assert_eq!(updated.created_at, stored.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let repo = repo().await;
        let id = TodoId::new();
        assert!(matches!(repo.find_by_id(&id).await, Err(TodoError::NotFound)));
        assert_eq!(repo.count_find_by_id(&id).await.unwrap(), 0);
        let changes = TodoChanges { title: "t".into(), description: "d".into() };
        assert!(matches!(repo.update(&id, changes).await, Err(TodoError::NotFound)));
        assert!(matches!(repo.delete(&id).await, Err(TodoError::NotFound)));
    }

    #[tokio::test]
    async fn soft_deleted_todos_disappear_from_reads() {
        let repo = repo().await;
        let keep = repo.store(new_todo("keep")).await.unwrap();
        let gone = repo.store(new_todo("gone")).await.unwrap();

        repo.delete(&gone.id).await.unwrap();

        assert!(matches!(repo.find_by_id(&gone.id).await, Err(TodoError::NotFound)));
        assert_eq!(repo.count_find_by_id(&gone.id).await.unwrap(), 0);
        assert_eq!(repo.count_find_all(&TodoFilter::default()).await.unwrap(), 1);
        let listed = repo.find_all(&TodoFilter::default(), everything()).await.unwrap();
        assert_eq!(listed, vec![keep]);
        assert!(matches!(repo.delete(&gone.id).await, Err(TodoError::NotFound)));
    }
}
