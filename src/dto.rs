use crate::domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Registers DTO schemas with utoipa so they land in the OpenAPI document
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            TodoCreate,
            TodoUpdate,
            TodoPublic,
            TodosPublic,
            TodoPriority,
            TodoStatus,
            Message,
        ),
        responses(crate::routing_utils::BasicErrorResponse)
    )
)]
pub struct OpenApiSchemas;

/// Priority of a todo as it appears on the wire
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl From<TodoPriority> for domain::todo::Priority {
    fn from(value: TodoPriority) -> Self {
        match value {
            TodoPriority::Low => Self::Low,
            TodoPriority::Medium => Self::Medium,
            TodoPriority::High => Self::High,
            TodoPriority::Urgent => Self::Urgent,
        }
    }
}

impl From<domain::todo::Priority> for TodoPriority {
    fn from(value: domain::todo::Priority) -> Self {
        match value {
            domain::todo::Priority::Low => Self::Low,
            domain::todo::Priority::Medium => Self::Medium,
            domain::todo::Priority::High => Self::High,
            domain::todo::Priority::Urgent => Self::Urgent,
        }
    }
}

/// Lifecycle status of a todo as it appears on the wire
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl From<TodoStatus> for domain::todo::Status {
    fn from(value: TodoStatus) -> Self {
        match value {
            TodoStatus::Pending => Self::Pending,
            TodoStatus::InProgress => Self::InProgress,
            TodoStatus::Completed => Self::Completed,
            TodoStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<domain::todo::Status> for TodoStatus {
    fn from(value: domain::todo::Status) -> Self {
        match value {
            domain::todo::Status::Pending => Self::Pending,
            domain::todo::Status::InProgress => Self::InProgress,
            domain::todo::Status::Completed => Self::Completed,
            domain::todo::Status::Cancelled => Self::Cancelled,
        }
    }
}

/// Request body for creating a todo. Priority and status fall back to their defaults
/// when omitted.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Debug, Serialize, Clone))]
pub struct TodoCreate {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TodoPriority,
    #[serde(default)]
    pub status: TodoStatus,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<TodoCreate> for domain::todo::NewTodo {
    fn from(value: TodoCreate) -> Self {
        domain::todo::NewTodo {
            title: value.title,
            description: value.description,
            priority: value.priority.into(),
            status: value.status.into(),
            due_date: value.due_date,
        }
    }
}

/// Distinguishes an explicit `null` from an absent field on update bodies: a missing
/// field stays [None], a present `null` becomes `Some(None)`.
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Request body for a partial todo update. Omitted fields are left untouched; an
/// explicit `null` clears the nullable description/due_date fields.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct TodoUpdate {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    pub priority: Option<TodoPriority>,
    pub status: Option<TodoStatus>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl From<TodoUpdate> for domain::todo::UpdateTodo {
    fn from(value: TodoUpdate) -> Self {
        domain::todo::UpdateTodo {
            title: value.title,
            description: value.description,
            priority: value.priority.map(Into::into),
            status: value.status.map(Into::into),
            due_date: value.due_date,
        }
    }
}

/// A todo as returned to API consumers
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq, Eq))]
pub struct TodoPublic {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub status: TodoStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
}

impl From<domain::todo::Todo> for TodoPublic {
    fn from(value: domain::todo::Todo) -> Self {
        TodoPublic {
            id: value.id,
            title: value.title,
            description: value.description,
            priority: value.priority.into(),
            status: value.status.into(),
            due_date: value.due_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
            completed_at: value.completed_at,
            owner_id: value.owner_id,
        }
    }
}

/// One page of todos. [count] is the total number of todos matching the request's
/// filters regardless of pagination.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq, Eq))]
pub struct TodosPublic {
    pub data: Vec<TodoPublic>,
    pub count: i64,
}

impl From<domain::todo::TodoPage> for TodosPublic {
    fn from(value: domain::todo::TodoPage) -> Self {
        TodosPublic {
            data: value.todos.into_iter().map(Into::into).collect(),
            count: value.filtered_count,
        }
    }
}

fn default_list_limit() -> i64 {
    100
}

/// Query parameters accepted when listing todos
#[derive(Deserialize, IntoParams)]
#[into_params(style = Form, parameter_in = Query)]
pub struct ListTodosQuery {
    /// Number of records to skip from the start of the result set
    #[serde(default)]
    pub skip: i64,
    /// Maximum number of records to return
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Only return todos with this status
    pub status: Option<TodoStatus>,
    /// Only return todos with this priority
    pub priority: Option<TodoPriority>,
}

impl ListTodosQuery {
    pub fn filter(&self) -> domain::todo::TodoListFilter {
        domain::todo::TodoListFilter {
            status: self.status.map(Into::into),
            priority: self.priority.map(Into::into),
        }
    }

    pub fn pagination(&self) -> domain::todo::Pagination {
        domain::todo::Pagination {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Generic message payload for endpoints which don't return data
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq, Eq))]
pub struct Message {
    pub message: String,
}
