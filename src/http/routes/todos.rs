use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::{
    application::todo_service::TodoService,
    domain::todo::{NewTodo, Todo, TodoChanges, TodoFilter},
    http::{
        pagination::Pagination,
        types::{ApiError, ApiResponse},
        validation::{ListParams, TodoListRequest, TodoRequest},
    },
};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todo", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todo/:id", get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>, query: Result<Query<ListParams>, QueryRejection>) -> ApiResult<Vec<Todo>> {
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = TodoListRequest::parse(params)?;
    let pagination = Pagination::new(request.page, request.per_page);

    let (todos, total) = state.service.get_all(&TodoFilter::keyword(request.q), pagination.window()).await?;
    Ok(ApiResponse::list("Get All Todo", todos, pagination.meta(total)))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<Todo> {
    let todo = state.service.get_by_id(&id).await?;
    Ok(ApiResponse::ok("Get Todo", todo))
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, body: Bytes) -> ApiResult<Todo> {
    let request = TodoRequest::from_body(&body)?;
    let todo = state.service.create(NewTodo { title: request.title, description: request.description }).await?;
    Ok(ApiResponse::created("Create Todo", todo))
}

async fn update_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, body: Bytes) -> ApiResult<Value> {
    let request = TodoRequest::from_body(&body)?;
    state.service.update(&id, TodoChanges { title: request.title, description: request.description }).await?;
    Ok(ApiResponse::ok(format!("Success updated item with id {id}"), json!({ "id": id })))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<Value> {
    state.service.delete(&id).await?;
    Ok(ApiResponse::ok(format!("Success deleted item with id {id}"), json!({ "id": id })))
}
