use async_trait::async_trait;

use super::error::Result;
use super::todo::{NewTodo, PageWindow, Todo, TodoChanges, TodoFilter, TodoId};

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> Result<()>;
    /// Live todos matching `filter` in insertion order, restricted to `window`.
    async fn find_all(&self, filter: &TodoFilter, window: PageWindow) -> Result<Vec<Todo>>;
    async fn count_find_all(&self, filter: &TodoFilter) -> Result<i64>;
    async fn find_by_id(&self, id: &TodoId) -> Result<Todo>;
    /// Zero when absent; absence is not an error here.
    async fn count_find_by_id(&self, id: &TodoId) -> Result<i64>;
    async fn store(&self, input: NewTodo) -> Result<Todo>;
    async fn update(&self, id: &TodoId, changes: TodoChanges) -> Result<Todo>;
    async fn delete(&self, id: &TodoId) -> Result<()>;
}
