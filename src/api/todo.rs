use crate::domain::auth::Caller;
use crate::domain::todo::driving_ports::{TodoError, TodoPort};
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use crate::routing_utils::{
    GenericErrorResponse, Json, TodoErrorResponse, ValidationErrorResponse,
};
use crate::{domain, dto, persistence, AppState, SharedData};
use axum::extract::{Path, Query, State};
use axum::response::ErrorResponse;
use axum::routing::{get, patch};
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use uuid::Uuid;
use validator::Validate;

/// Adds todo CRUD routes to the application router
pub fn todo_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/todos",
            get(
                |caller: Caller,
                 State(app_state): AppState,
                 Query(query): Query<dto::ListTodosQuery>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    list_todos(caller, query, &mut ext_cxn, &todo_service).await
                },
            )
            .post(
                |caller: Caller,
                 State(app_state): AppState,
                 Json(new_todo): Json<dto::TodoCreate>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    create_todo(caller, new_todo, &mut ext_cxn, &todo_service).await
                },
            ),
        )
        .route(
            "/todos/:todo_id",
            get(
                |caller: Caller, State(app_state): AppState, Path(todo_id): Path<Uuid>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let todo_service = domain::todo::TodoService {};

                    get_todo(caller, todo_id, &mut ext_cxn, &todo_service).await
                },
            )
            .put(
                |caller: Caller,
                 State(app_state): AppState,
                 Path(todo_id): Path<Uuid>,
                 Json(update): Json<dto::TodoUpdate>| async move {
                    let todo_service = domain::todo::TodoService {};

                    update_todo(caller, todo_id, update, &app_state.ext_cxn, &todo_service).await
                },
            )
            .delete(
                |caller: Caller, State(app_state): AppState, Path(todo_id): Path<Uuid>| async move {
                    let todo_service = domain::todo::TodoService {};

                    delete_todo(caller, todo_id, &app_state.ext_cxn, &todo_service).await
                },
            ),
        )
        .route(
            "/todos/:todo_id/toggle-status",
            patch(
                |caller: Caller, State(app_state): AppState, Path(todo_id): Path<Uuid>| async move {
                    let todo_service = domain::todo::TodoService {};

                    toggle_todo_status(caller, todo_id, &app_state.ext_cxn, &todo_service).await
                },
            ),
        )
}

/// Converts a [TodoError] into the matching API response, logging port failures
fn todo_error_into_response(error: TodoError, action: &str) -> ErrorResponse {
    match error {
        TodoError::NotFound => TodoErrorResponse::NotFound.into(),
        TodoError::NotEnoughPermissions => TodoErrorResponse::NotEnoughPermissions.into(),
        TodoError::PortError(port_err) => {
            error!("Failed to {action} todo: {port_err}");
            GenericErrorResponse(port_err).into()
        }
    }
}

/// Opens a database transaction for handlers which read a todo before writing it
async fn begin_transaction<Cxn: Transactable>(
    txn_cxn: &Cxn,
) -> Result<Cxn::Handle, ErrorResponse> {
    txn_cxn.start_transaction().await.map_err(|err| {
        error!("Failed to start a database transaction: {err}");
        ErrorResponse::from(GenericErrorResponse(err))
    })
}

/// Lists the caller's todos, one page at a time
#[utoipa::path(
    get,
    path = "/todos",
    tag = "todos",
    params(dto::ListTodosQuery),
    responses(
        (status = 200, description = "One page of the caller's todos", body = dto::TodosPublic),
        (status = 401, response = crate::routing_utils::BasicErrorResponse),
        (status = 500, response = crate::routing_utils::BasicErrorResponse),
    ),
)]
async fn list_todos(
    caller: Caller,
    query: dto::ListTodosQuery,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::TodosPublic>, ErrorResponse> {
    info!("Listing todos for user {}", caller.id);
    let todo_reader = persistence::db_todo_driven_ports::DbTodoReader {};

    let page_result = todo_service
        .list_todos(
            &caller,
            &query.filter(),
            &query.pagination(),
            &mut *ext_cxn,
            &todo_reader,
        )
        .await;
    let page = page_result.map_err(|err| {
        error!("Failed to list todos: {err}");
        GenericErrorResponse(err)
    })?;

    Ok(Json(page.into()))
}

/// Fetches a single todo owned by the caller
#[utoipa::path(
    get,
    path = "/todos/{todo_id}",
    tag = "todos",
    params(
        ("todo_id" = Uuid, Path, description = "ID of the todo to fetch"),
    ),
    responses(
        (status = 200, description = "The requested todo", body = dto::TodoPublic),
        (status = 400, response = crate::routing_utils::BasicErrorResponse),
        (status = 401, response = crate::routing_utils::BasicErrorResponse),
        (status = 404, response = crate::routing_utils::BasicErrorResponse),
        (status = 500, response = crate::routing_utils::BasicErrorResponse),
    ),
)]
async fn get_todo(
    caller: Caller,
    todo_id: Uuid,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::TodoPublic>, ErrorResponse> {
    info!("Fetching todo {todo_id}");
    let todo_reader = persistence::db_todo_driven_ports::DbTodoReader {};

    let todo = todo_service
        .todo_by_id(&caller, todo_id, &mut *ext_cxn, &todo_reader)
        .await
        .map_err(|err| todo_error_into_response(err, "fetch"))?;

    Ok(Json(todo.into()))
}

/// Creates a new todo owned by the caller
#[utoipa::path(
    post,
    path = "/todos",
    tag = "todos",
    request_body = dto::TodoCreate,
    responses(
        (status = 200, description = "The newly created todo", body = dto::TodoPublic),
        (status = 401, response = crate::routing_utils::BasicErrorResponse),
        (status = 422, response = crate::routing_utils::BasicErrorResponse),
        (status = 500, response = crate::routing_utils::BasicErrorResponse),
    ),
)]
async fn create_todo(
    caller: Caller,
    new_todo: dto::TodoCreate,
    ext_cxn: &mut impl ExternalConnectivity,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::TodoPublic>, ErrorResponse> {
    info!("Creating a todo for user {}", caller.id);
    new_todo.validate().map_err(ValidationErrorResponse::from)?;

    let domain_new = domain::todo::NewTodo::from(new_todo);
    let todo_writer = persistence::db_todo_driven_ports::DbTodoWriter {};

    let created_todo = todo_service
        .create_todo(&caller, &domain_new, &mut *ext_cxn, &todo_writer)
        .await
        .map_err(|err| {
            error!("Failed to create todo: {err}");
            GenericErrorResponse(err)
        })?;

    Ok(Json(created_todo.into()))
}

/// Applies a partial update to one of the caller's todos
#[utoipa::path(
    put,
    path = "/todos/{todo_id}",
    tag = "todos",
    params(
        ("todo_id" = Uuid, Path, description = "ID of the todo to update"),
    ),
    request_body = dto::TodoUpdate,
    responses(
        (status = 200, description = "The todo after the update", body = dto::TodoPublic),
        (status = 400, response = crate::routing_utils::BasicErrorResponse),
        (status = 401, response = crate::routing_utils::BasicErrorResponse),
        (status = 404, response = crate::routing_utils::BasicErrorResponse),
        (status = 422, response = crate::routing_utils::BasicErrorResponse),
        (status = 500, response = crate::routing_utils::BasicErrorResponse),
    ),
)]
async fn update_todo(
    caller: Caller,
    todo_id: Uuid,
    update: dto::TodoUpdate,
    txn_cxn: &impl Transactable,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::TodoPublic>, ErrorResponse> {
    info!("Updating todo {todo_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let domain_update = domain::todo::UpdateTodo::from(update);
    let todo_reader = persistence::db_todo_driven_ports::DbTodoReader {};
    let todo_writer = persistence::db_todo_driven_ports::DbTodoWriter {};

    let mut txn = begin_transaction(txn_cxn).await?;
    let updated_todo = todo_service
        .update_todo(
            &caller,
            todo_id,
            &domain_update,
            &mut txn,
            &todo_reader,
            &todo_writer,
        )
        .await
        .map_err(|err| todo_error_into_response(err, "update"))?;
    txn.commit().await.map_err(|err| {
        error!("Failed to commit todo update: {err}");
        ErrorResponse::from(GenericErrorResponse(err))
    })?;

    Ok(Json(updated_todo.into()))
}

/// Deletes one of the caller's todos
#[utoipa::path(
    delete,
    path = "/todos/{todo_id}",
    tag = "todos",
    params(
        ("todo_id" = Uuid, Path, description = "ID of the todo to delete"),
    ),
    responses(
        (status = 200, description = "Confirmation that the todo was deleted", body = dto::Message),
        (status = 400, response = crate::routing_utils::BasicErrorResponse),
        (status = 401, response = crate::routing_utils::BasicErrorResponse),
        (status = 404, response = crate::routing_utils::BasicErrorResponse),
        (status = 500, response = crate::routing_utils::BasicErrorResponse),
    ),
)]
async fn delete_todo(
    caller: Caller,
    todo_id: Uuid,
    txn_cxn: &impl Transactable,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::Message>, ErrorResponse> {
    info!("Deleting todo {todo_id}");
    let todo_reader = persistence::db_todo_driven_ports::DbTodoReader {};
    let todo_writer = persistence::db_todo_driven_ports::DbTodoWriter {};

    let mut txn = begin_transaction(txn_cxn).await?;
    todo_service
        .delete_todo(&caller, todo_id, &mut txn, &todo_reader, &todo_writer)
        .await
        .map_err(|err| todo_error_into_response(err, "delete"))?;
    txn.commit().await.map_err(|err| {
        error!("Failed to commit todo deletion: {err}");
        ErrorResponse::from(GenericErrorResponse(err))
    })?;

    Ok(Json(dto::Message {
        message: "Todo deleted successfully".to_owned(),
    }))
}

/// Flips a todo between the completed and pending statuses
#[utoipa::path(
    patch,
    path = "/todos/{todo_id}/toggle-status",
    tag = "todos",
    params(
        ("todo_id" = Uuid, Path, description = "ID of the todo to toggle"),
    ),
    responses(
        (status = 200, description = "The todo after the status flip", body = dto::TodoPublic),
        (status = 400, response = crate::routing_utils::BasicErrorResponse),
        (status = 401, response = crate::routing_utils::BasicErrorResponse),
        (status = 404, response = crate::routing_utils::BasicErrorResponse),
        (status = 500, response = crate::routing_utils::BasicErrorResponse),
    ),
)]
async fn toggle_todo_status(
    caller: Caller,
    todo_id: Uuid,
    txn_cxn: &impl Transactable,
    todo_service: &impl TodoPort,
) -> Result<Json<dto::TodoPublic>, ErrorResponse> {
    info!("Toggling the status of todo {todo_id}");
    let todo_reader = persistence::db_todo_driven_ports::DbTodoReader {};
    let todo_writer = persistence::db_todo_driven_ports::DbTodoWriter {};

    let mut txn = begin_transaction(txn_cxn).await?;
    let toggled_todo = todo_service
        .toggle_todo_status(&caller, todo_id, &mut txn, &todo_reader, &todo_writer)
        .await
        .map_err(|err| todo_error_into_response(err, "toggle the status of"))?;
    txn.commit().await.map_err(|err| {
        error!("Failed to commit todo status toggle: {err}");
        ErrorResponse::from(GenericErrorResponse(err))
    })?;

    Ok(Json(toggled_todo.into()))
}

/// OpenAPI documentation for the todo routes
#[derive(OpenApi)]
#[openapi(
    paths(
        list_todos,
        get_todo,
        create_todo,
        update_todo,
        delete_todo,
        toggle_todo_status,
    )
)]
pub struct TodosApi;
