use async_trait::async_trait;

use crate::domain::error::{Result, TodoError};
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{NewTodo, PageWindow, Todo, TodoChanges, TodoFilter, TodoId};

/// Business operations over todos. Ids arrive as raw strings and are parsed here.
#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    /// One page of matching todos plus the total count across all pages.
    async fn get_all(&self, filter: &TodoFilter, window: PageWindow) -> Result<(Vec<Todo>, i64)>;
    async fn get_by_id(&self, id: &str) -> Result<Todo>;
    async fn create(&self, input: NewTodo) -> Result<Todo>;
    async fn update(&self, id: &str, changes: TodoChanges) -> Result<Todo>;
    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn get_all(&self, filter: &TodoFilter, window: PageWindow) -> Result<(Vec<Todo>, i64)> {
        let items = self.repo.find_all(filter, window).await?;
        let total = self.repo.count_find_all(filter).await?;
        Ok((items, total))
    }

    async fn get_by_id(&self, id: &str) -> Result<Todo> {
        let id: TodoId = id.parse()?;
        self.repo.find_by_id(&id).await
    }

    async fn create(&self, input: NewTodo) -> Result<Todo> {
        let todo = self.repo.store(input).await?;
        tracing::debug!(id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn update(&self, id: &str, changes: TodoChanges) -> Result<Todo> {
        let id: TodoId = id.parse()?;
        // Existence check and write are separate calls; the write is conditional on its own.
        if self.repo.count_find_by_id(&id).await? == 0 {
            return Err(TodoError::NotFound);
        }
        let todo = self.repo.update(&id, changes).await?;
        tracing::debug!(%id, "todo updated");
        Ok(todo)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id: TodoId = id.parse()?;
        self.repo.delete(&id).await?;
        tracing::debug!(%id, "todo deleted");
        Ok(())
    }
}
