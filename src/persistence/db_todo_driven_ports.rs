use crate::domain;
use crate::domain::todo::{Pagination, Todo, TodoListFilter};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Mirror of the `todo_priority` database enum
#[derive(Clone, Copy, sqlx::Type)]
#[sqlx(type_name = "todo_priority", rename_all = "snake_case")]
enum PriorityRow {
    Low,
    Medium,
    High,
    Urgent,
}

impl From<domain::todo::Priority> for PriorityRow {
    fn from(value: domain::todo::Priority) -> Self {
        match value {
            domain::todo::Priority::Low => Self::Low,
            domain::todo::Priority::Medium => Self::Medium,
            domain::todo::Priority::High => Self::High,
            domain::todo::Priority::Urgent => Self::Urgent,
        }
    }
}

impl From<PriorityRow> for domain::todo::Priority {
    fn from(value: PriorityRow) -> Self {
        match value {
            PriorityRow::Low => Self::Low,
            PriorityRow::Medium => Self::Medium,
            PriorityRow::High => Self::High,
            PriorityRow::Urgent => Self::Urgent,
        }
    }
}

/// Mirror of the `todo_status` database enum
#[derive(Clone, Copy, sqlx::Type)]
#[sqlx(type_name = "todo_status", rename_all = "snake_case")]
enum StatusRow {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl From<domain::todo::Status> for StatusRow {
    fn from(value: domain::todo::Status) -> Self {
        match value {
            domain::todo::Status::Pending => Self::Pending,
            domain::todo::Status::InProgress => Self::InProgress,
            domain::todo::Status::Completed => Self::Completed,
            domain::todo::Status::Cancelled => Self::Cancelled,
        }
    }
}

impl From<StatusRow> for domain::todo::Status {
    fn from(value: StatusRow) -> Self {
        match value {
            StatusRow::Pending => Self::Pending,
            StatusRow::InProgress => Self::InProgress,
            StatusRow::Completed => Self::Completed,
            StatusRow::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    priority: PriorityRow,
    status: StatusRow,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    owner_id: Uuid,
}

impl From<TodoRow> for Todo {
    fn from(value: TodoRow) -> Self {
        Todo {
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

const TODO_COLUMNS: &str =
    "id, title, description, priority, status, due_date, created_at, updated_at, completed_at, owner_id";

/// Appends the optional status/priority predicates to a query already scoped to an
/// owner. Used by both the page query and the count query so the two can never
/// disagree about which rows match.
fn push_filter_clauses(query: &mut QueryBuilder<'_, Postgres>, filter: &TodoListFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(StatusRow::from(status));
    }
    if let Some(priority) = filter.priority {
        query.push(" AND priority = ");
        query.push_bind(PriorityRow::from(priority));
    }
}

pub struct DbTodoReader {}

impl domain::todo::driven_ports::TodoReader for DbTodoReader {
    async fn todos_for_owner(
        &self,
        owner_id: Uuid,
        filter: &TodoListFilter,
        page: &Pagination,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Todo>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let mut query =
            QueryBuilder::new(format!("SELECT {TODO_COLUMNS} FROM todo WHERE owner_id = "));
        query.push_bind(owner_id);
        push_filter_clauses(&mut query, filter);
        query.push(" LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.skip);

        let todos: Vec<TodoRow> = query
            .build_query_as()
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch a page of a user's todos")?;

        Ok(todos.into_iter().map(Todo::from).collect())
    }

    async fn count_for_owner(
        &self,
        owner_id: Uuid,
        filter: &TodoListFilter,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let mut query = QueryBuilder::new("SELECT count(*) FROM todo WHERE owner_id = ");
        query.push_bind(owner_id);
        push_filter_clauses(&mut query, filter);

        let count: i64 = query
            .build_query_scalar()
            .fetch_one(cxn.borrow_connection())
            .await
            .context("trying to count a user's todos")?;

        Ok(count)
    }

    async fn todo_by_id(
        &self,
        todo_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Todo>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql = format!("SELECT {TODO_COLUMNS} FROM todo WHERE id = $1");
        let todo: Option<TodoRow> = sqlx::query_as(&sql)
            .bind(todo_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to fetch a todo by ID")?;

        Ok(todo.map(Todo::from))
    }
}

pub struct DbTodoWriter {}

impl domain::todo::driven_ports::TodoWriter for DbTodoWriter {
    async fn insert_todo(
        &self,
        todo: &Todo,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query(
            "INSERT INTO todo \
                (id, title, description, priority, status, due_date, created_at, updated_at, completed_at, owner_id) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(todo.id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(PriorityRow::from(todo.priority))
        .bind(StatusRow::from(todo.status))
        .bind(todo.due_date)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .bind(todo.completed_at)
        .bind(todo.owner_id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to insert a new todo into the database")?;

        Ok(())
    }

    async fn save_todo(
        &self,
        todo: &Todo,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query(
            "UPDATE todo \
                SET title = $1, description = $2, priority = $3, status = $4, \
                    due_date = $5, updated_at = $6, completed_at = $7 \
                WHERE id = $8",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(PriorityRow::from(todo.priority))
        .bind(StatusRow::from(todo.status))
        .bind(todo.due_date)
        .bind(todo.updated_at)
        .bind(todo.completed_at)
        .bind(todo.id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a todo in the database")?;

        Ok(())
    }

    async fn delete_todo(
        &self,
        todo_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        sqlx::query("DELETE FROM todo WHERE id = $1")
            .bind(todo_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a todo from the database")?;

        Ok(())
    }
}
